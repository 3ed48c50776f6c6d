use crate::adapters::chrome;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{PdfError, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use futures::StreamExt;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio::time::Instant;

const SHUTDOWN_STEP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
pub struct BrowserSettings {
    pub chrome_path: Option<PathBuf>,
    pub timeout: Duration,
    pub settle_delay: Duration,
    pub extra_args: Vec<String>,
}

impl BrowserSettings {
    pub fn from_config(config: &impl ConfigProvider) -> Self {
        Self {
            chrome_path: config.chrome_path().map(PathBuf::from),
            timeout: config.render_timeout(),
            settle_delay: config.settle_delay(),
            extra_args: config.extra_browser_args().to_vec(),
        }
    }
}

/// Launch flag sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchProfile {
    Standard,
    /// Tuned for constrained sandboxes: no setuid sandbox, no /dev/shm, one process.
    Serverless,
}

impl LaunchProfile {
    pub fn flags(&self) -> &'static [&'static str] {
        match self {
            Self::Standard => &["--no-sandbox", "--disable-gpu", "--hide-scrollbars"],
            Self::Serverless => &[
                "--no-sandbox",
                "--disable-setuid-sandbox",
                "--disable-dev-shm-usage",
                "--disable-gpu",
                "--no-zygote",
                "--single-process",
                "--no-first-run",
                "--hide-scrollbars",
                "--font-render-hinting=none",
            ],
        }
    }
}

/// One headless browser process, owned by a single request.
///
/// The process, its CDP handler task and its throwaway profile directory all
/// live exactly as long as the session; [`BrowserSession::close`] tears them
/// down and never fails.
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    _profile_dir: TempDir,
}

impl BrowserSession {
    pub async fn launch(
        settings: &BrowserSettings,
        profile: LaunchProfile,
        viewport: Option<Viewport>,
    ) -> Result<Self> {
        let executable = chrome::discover(settings.chrome_path.as_deref())?;
        let profile_dir = tempfile::Builder::new()
            .prefix("pdf-endpoints-profile-")
            .tempdir()?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(&executable)
            .user_data_dir(profile_dir.path())
            .request_timeout(settings.timeout)
            .args(profile.flags().iter().copied())
            .args(settings.extra_args.iter().cloned());
        builder = match viewport {
            Some(viewport) => builder
                .window_size(viewport.width, viewport.height)
                .viewport(Some(viewport)),
            None => builder.viewport(None::<Viewport>),
        };
        let config = builder
            .build()
            .map_err(|message| PdfError::BrowserLaunch { message })?;

        tracing::debug!(
            chrome = %executable.display(),
            profile = ?profile,
            "Launching headless browser"
        );
        let (browser, mut handler) =
            Browser::launch(config)
                .await
                .map_err(|e| PdfError::BrowserLaunch {
                    message: e.to_string(),
                })?;

        // The stream ends once the browser connection closes.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("CDP handler event error: {}", e);
                }
            }
        });

        Ok(Self {
            browser,
            handler,
            _profile_dir: profile_dir,
        })
    }

    /// Opens a blank tab, loads `html` into it and waits for the settle delay.
    pub async fn load(&self, html: &str, settle_delay: Duration) -> Result<Page> {
        let page = self.browser.new_page("about:blank").await?;
        page.set_content(html).await?;
        if !settle_delay.is_zero() {
            tokio::time::sleep(settle_delay).await;
        }
        Ok(page)
    }

    /// Best-effort shutdown: graceful close, kill as fallback, then reap.
    pub async fn close(mut self) {
        let closed = match tokio::time::timeout(SHUTDOWN_STEP_TIMEOUT, self.browser.close()).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::warn!("⚠️ Browser close failed, killing process: {}", e);
                false
            }
            Err(_) => {
                tracing::warn!("⚠️ Browser close timed out, killing process");
                false
            }
        };
        if !closed {
            if let Some(Err(e)) = self.browser.kill().await {
                tracing::warn!("⚠️ Browser kill failed: {}", e);
            }
        }

        match tokio::time::timeout(SHUTDOWN_STEP_TIMEOUT, self.browser.wait()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::warn!("⚠️ Waiting for browser exit failed: {}", e),
            Err(_) => tracing::warn!("⚠️ Browser process did not exit in time"),
        }

        match tokio::time::timeout(SHUTDOWN_STEP_TIMEOUT, &mut self.handler).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("⚠️ CDP handler task failed: {}", e),
            Err(_) => {
                tracing::warn!("⚠️ CDP handler did not stop, aborting");
                self.handler.abort();
            }
        }

        tracing::debug!("Browser session closed");
    }
}

/// A single time budget shared by the launch and the render of one request.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    limit: Duration,
    started: Instant,
}

impl Deadline {
    pub fn start(limit: Duration) -> Self {
        Self {
            limit,
            started: Instant::now(),
        }
    }

    pub fn remaining(&self) -> Duration {
        self.limit.saturating_sub(self.started.elapsed())
    }

    pub async fn run<T>(&self, work: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.remaining(), work).await {
            Ok(result) => result,
            Err(_) => Err(PdfError::Timeout {
                seconds: self.limit.as_secs(),
            }),
        }
    }
}

/// Launch → load `html` → work → close, with the close happening on every
/// outcome and the whole sequence bounded by `settings.timeout`.
pub async fn with_session<T, F, Fut>(
    settings: &BrowserSettings,
    profile: LaunchProfile,
    viewport: Option<Viewport>,
    html: &str,
    work: F,
) -> Result<T>
where
    F: FnOnce(Page) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let deadline = Deadline::start(settings.timeout);
    let session = deadline
        .run(BrowserSession::launch(settings, profile, viewport))
        .await?;

    let outcome = deadline
        .run(async {
            let page = session.load(html, settings.settle_delay).await?;
            work(page).await
        })
        .await;

    session.close().await;
    outcome
}
