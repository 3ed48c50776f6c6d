use lambda_runtime::Error;
use pdf_endpoints::utils::{logger, monitor::RenderMonitor, validation::Validate};
use pdf_endpoints::{build_router, LambdaConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    // 創建Lambda配置
    let config = LambdaConfig::from_env()?;
    if let Err(e) = config.validate() {
        tracing::error!("❌ Lambda configuration invalid: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        return Err(e.into());
    }

    tracing::info!(
        chrome = ?config.chrome_path,
        timeout_secs = config.timeout_secs,
        "PDF endpoints Lambda starting"
    );

    // Lambda 不做系統監控
    let router = build_router(&config, Arc::new(RenderMonitor::new(false)))?;
    lambda_http::run(router).await
}
