use anyhow::Context;
use clap::Parser;
use pdf_endpoints::utils::{logger, monitor::RenderMonitor, validation::Validate};
use pdf_endpoints::{build_router, CliConfig, ServiceConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting pdf-endpoints {}", env!("CARGO_PKG_VERSION"));
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 合併並驗證配置
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(
                "❌ Configuration validation failed: {} (Category: {:?})",
                e,
                e.category()
            );
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let monitor = Arc::new(RenderMonitor::new(cli.monitor));
    if monitor.is_enabled() {
        tracing::info!("🔍 System monitoring enabled");
    }

    let router = build_router(&config, monitor).context("building HTTP router")?;

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {}", address))?;
    tracing::info!("✅ Listening on http://{}", address);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    tracing::info!("Server stopped");
    Ok(())
}

fn load_config(cli: &CliConfig) -> pdf_endpoints::Result<ServiceConfig> {
    let config = cli.resolve()?;
    config.validate()?;
    Ok(config)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("⚠️ Cannot listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("⚠️ Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
