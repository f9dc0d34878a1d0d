use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::ClearBrowserCookiesParams;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::app::{MonitorError, Result};
use crate::scraper::{BrowserSession, ScraperConfig, SessionLauncher};

/// Launches a dedicated headless Chrome per session via chromiumoxide.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeLauncher;

#[async_trait]
impl SessionLauncher for ChromeLauncher {
    async fn launch(&self, config: &ScraperConfig) -> Result<Box<dyn BrowserSession>> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-software-rasterizer")
            .window_size(config.viewport_width, config.viewport_height)
            .viewport(Viewport {
                width: config.viewport_width,
                height: config.viewport_height,
                ..Default::default()
            })
            .request_timeout(config.navigation_timeout());

        if !config.headless {
            builder = builder.with_head();
        }

        let browser_config = builder
            .build()
            .map_err(|e| MonitorError::Session(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
            MonitorError::Session(format!(
                "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                e
            ))
        })?;

        // Drive the CDP connection until the browser goes away
        let handler_task = tokio::spawn(async move {
            while let Some(_event) = handler.next().await {}
        });

        let mut session = ChromeSession {
            browser,
            page: None,
            handler_task: Some(handler_task),
            poll_interval: config.poll_interval(),
        };

        if let Err(e) = session.open_page(&config.user_agent).await {
            if let Err(close_err) = session.close().await {
                warn!("Failed to close browser after launch error: {}", close_err);
            }
            return Err(e);
        }

        debug!("Browser session launched");
        Ok(Box::new(session))
    }
}

pub struct ChromeSession {
    browser: Browser,
    page: Option<Page>,
    handler_task: Option<JoinHandle<()>>,
    poll_interval: Duration,
}

impl ChromeSession {
    async fn open_page(&mut self, user_agent: &str) -> Result<()> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| MonitorError::Session(format!("Failed to create page: {}", e)))?;

        page.set_user_agent(user_agent)
            .await
            .map_err(|e| MonitorError::Session(format!("Failed to set user agent: {}", e)))?;

        self.page = Some(page);
        Ok(())
    }

    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| MonitorError::Session("Page is not open".to_string()))
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<()> {
        let page = self.page()?;
        tokio::time::timeout(timeout, page.goto(url))
            .await
            .map_err(|_| MonitorError::Timeout(timeout))?
            .map_err(|e| MonitorError::Session(format!("Navigation failed: {}", e)))?;
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<bool> {
        let page = self.page()?;
        let deadline = Instant::now() + timeout;
        loop {
            if page.find_element(selector).await.is_ok() {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn has_element(&mut self, selector: &str) -> Result<bool> {
        Ok(self.page()?.find_element(selector).await.is_ok())
    }

    async fn clear_cookies(&mut self) -> Result<()> {
        self.page()?
            .execute(ClearBrowserCookiesParams::default())
            .await
            .map_err(|e| MonitorError::Session(format!("Failed to clear cookies: {}", e)))?;
        Ok(())
    }

    async fn reload(&mut self, timeout: Duration) -> Result<()> {
        let page = self.page()?;
        tokio::time::timeout(timeout, page.reload())
            .await
            .map_err(|_| MonitorError::Timeout(timeout))?
            .map_err(|e| MonitorError::Session(format!("Reload failed: {}", e)))?;
        Ok(())
    }

    async fn content(&mut self) -> Result<String> {
        self.page()?
            .content()
            .await
            .map_err(|e| MonitorError::Session(format!("Failed to read page content: {}", e)))
    }

    async fn close(&mut self) -> Result<()> {
        let mut first_error = None;

        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                first_error.get_or_insert(MonitorError::Session(format!(
                    "Failed to close page: {}",
                    e
                )));
            }
        }

        if let Err(e) = self.browser.close().await {
            first_error.get_or_insert(MonitorError::Session(format!(
                "Failed to close browser: {}",
                e
            )));
        }
        if let Err(e) = self.browser.wait().await {
            first_error.get_or_insert(MonitorError::Io(e));
        }

        if let Some(task) = self.handler_task.take() {
            task.abort();
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
