use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfig, HeadlessMode};
use chromiumoxide::page::Page;
use futures::StreamExt;

use crate::config::Config;

use super::launcher;

/// One CDP browser connection with a single working page. Racing sessions
/// each own one of these; they share nothing below the claimed flag.
pub struct Session {
    browser: Browser,
    handler_task: tokio::task::JoinHandle<()>,
    page: Page,
    // Keeps the per-session profile dir alive until the session drops.
    _profile_dir: Option<tempfile::TempDir>,
}

impl Session {
    /// Launch Chrome and open the working page.
    pub async fn launch(config: &Config) -> Result<Self> {
        let binary = match &config.chrome_binary {
            Some(path) => path.clone(),
            None => launcher::find_chrome_binary(config.chrome_beta)?,
        };

        let mut builder = BrowserConfig::builder()
            .chrome_executable(binary.clone())
            .window_size(1280, 720);

        // BrowserConfig defaults to headless; the claimed reservation has to
        // stay visible so the user can finalize it. The builder owns the
        // headless flag, so no --headless arg is added by hand.
        builder = if config.headless {
            builder.headless_mode(HeadlessMode::New)
        } else {
            builder.with_head()
        };
        for arg in launcher::chrome_args(config.proxy_extension.as_ref()) {
            builder = builder.arg(arg);
        }

        // A proxy extension brings its own profile; otherwise every session
        // needs a private one so parallel launches don't fight over a lock.
        let mut profile_dir = None;
        if config.proxy_extension.is_none() {
            let dir = tempfile::tempdir().context("Failed to create profile dir")?;
            builder = builder.user_data_dir(dir.path());
            profile_dir = Some(dir);
        }

        let browser_config = builder.build().map_err(|e| anyhow::anyhow!("{}", e))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .context("Failed to launch Chrome")?;

        let handler_task = tokio::spawn(async move {
            while let Some(_event) = handler.next().await {}
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("Failed to create page")?;

        tracing::info!(
            "Browser session started (headless: {}, binary: {})",
            config.headless,
            binary.display()
        );

        Ok(Self {
            browser,
            handler_task,
            page,
            _profile_dir: profile_dir,
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Navigate, retrying until the load goes through. The initial page load
    /// races the reservation rush and transient CDP errors are common.
    pub async fn goto_persistent(&self, url: &str) -> Result<()> {
        tracing::info!("Navigating to: {}", url);
        loop {
            match self.page.goto(url).await {
                Ok(_) => return Ok(()),
                Err(e) => {
                    tracing::warn!("Navigation failed ({}), retrying", e);
                    tokio::time::sleep(std::time::Duration::from_millis(250)).await;
                }
            }
        }
    }

    /// Reload the page, swallowing transient CDP errors. Chrome sometimes
    /// drops the response for a reload that actually went through.
    pub async fn refresh(&self) {
        if let Err(e) = self.page.reload().await {
            tracing::debug!("Ignoring refresh error: {}", e);
        }
    }

    pub async fn close(self) -> Result<()> {
        self.handler_task.abort();
        drop(self.browser);
        Ok(())
    }
}
