use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use scraper::{Html, Selector};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{Backend, Settings};
use crate::error::PortalError;

/// The slice of a browser the lookup needs: load a URL, wait for markup, read it back.
#[async_trait]
pub trait Page: Send {
    async fn navigate(&mut self, url: &str) -> Result<(), PortalError>;

    /// Block until an element matching `selector` exists, or fail after `timeout`.
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), PortalError>;

    /// Current rendered document as HTML.
    async fn content(&mut self) -> Result<String, PortalError>;

    async fn close(&mut self) -> Result<(), PortalError> {
        Ok(())
    }
}

/// Open the backend selected in `settings`.
pub async fn open(settings: &Settings) -> Result<Box<dyn Page>, PortalError> {
    match settings.backend {
        Backend::Chrome => Ok(Box::new(ChromeSession::launch(settings).await?)),
        Backend::Http => Ok(Box::new(HttpPage::new(settings)?)),
    }
}

/// Whether a static document contains at least one match for `selector`.
pub fn document_has(html: &str, selector: &str) -> Result<bool, PortalError> {
    let sel = Selector::parse(selector).map_err(|_| PortalError::Selector(selector.to_string()))?;
    Ok(Html::parse_document(html).select(&sel).next().is_some())
}

// ── Headless Chrome ──

pub struct ChromeSession {
    browser: Browser,
    page: chromiumoxide::Page,
    handler: JoinHandle<()>,
    poll_interval: Duration,
    closed: bool,
}

impl ChromeSession {
    pub async fn launch(settings: &Settings) -> Result<Self, PortalError> {
        info!("Launching Chrome (headless: {})", settings.headless);

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--enable-unsafe-swiftshader")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--log-level=3")
            .arg(format!("--user-agent={}", settings.user_agent));
        if !settings.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(PortalError::Browser)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| PortalError::Browser(format!("Failed to launch Chrome: {}", e)))?;

        // CDP messages only flow while the handler is polled
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler: {}", e);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| PortalError::Browser(format!("Failed to open tab: {}", e)))?;

        Ok(Self {
            browser,
            page,
            handler,
            poll_interval: settings.poll_interval(),
            closed: false,
        })
    }
}

#[async_trait]
impl Page for ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), PortalError> {
        info!("GET {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| PortalError::Browser(format!("Navigation to {} failed: {}", url, e)))?;
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), PortalError> {
        debug!("Waiting for '{}' ({:.1}s)", selector, timeout.as_secs_f64());
        let start = Instant::now();
        loop {
            if self.page.find_element(selector).await.is_ok() {
                debug!("'{}' found after {}ms", selector, start.elapsed().as_millis());
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(PortalError::Timeout {
                    selector: selector.to_string(),
                    waited: timeout,
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn content(&mut self) -> Result<String, PortalError> {
        self.page
            .content()
            .await
            .map_err(|e| PortalError::Browser(format!("Failed to read document: {}", e)))
    }

    async fn close(&mut self) -> Result<(), PortalError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        info!("Shutting down Chrome");
        let result = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            warn!("Chrome did not exit cleanly: {}", e);
        }
        self.handler.abort();
        result
            .map(|_| ())
            .map_err(|e| PortalError::Browser(format!("Failed to close Chrome: {}", e)))
    }
}

// ── Plain HTTP ──

/// Fetches documents without running scripts. Waits only inspect what the server sent.
pub struct HttpPage {
    client: reqwest::Client,
    current: Option<String>,
}

impl HttpPage {
    pub fn new(settings: &Settings) -> Result<Self, PortalError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.timeout())
            .build()?;
        Ok(Self {
            client,
            current: None,
        })
    }
}

#[async_trait]
impl Page for HttpPage {
    async fn navigate(&mut self, url: &str) -> Result<(), PortalError> {
        info!("GET {}", url);
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        self.current = Some(body);
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, _timeout: Duration) -> Result<(), PortalError> {
        let html = self.current.as_deref().ok_or(PortalError::NoPage)?;
        if document_has(html, selector)? {
            Ok(())
        } else {
            Err(PortalError::Timeout {
                selector: selector.to_string(),
                waited: Duration::ZERO,
            })
        }
    }

    async fn content(&mut self) -> Result<String, PortalError> {
        self.current.clone().ok_or(PortalError::NoPage)
    }
}

// ── Fixtures ──
