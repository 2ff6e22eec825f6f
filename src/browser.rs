use std::time::Duration;

use async_trait::async_trait;
use thirtyfour::prelude::*;
use thirtyfour::{ChromeCapabilities, ChromiumLikeCapabilities};
use tokio::process::{Child, Command};

use crate::config::BrowserSettings;
use crate::error::{Error, Result};

/// Scrolls the document to its current bottom so the next batch of rows loads.
pub const SCROLL_TO_BOTTOM: &str =
    "window.scrollTo(0, document.documentElement.scrollHeight);";

const DRIVER_CONNECT_ATTEMPTS: usize = 20;
const DRIVER_CONNECT_INTERVAL: Duration = Duration::from_millis(250);

/// One open browser window. Must be closed explicitly, there is no async drop.
#[async_trait]
pub trait BrowserSession: Send {
    async fn navigate(&mut self, url: &str) -> Result<()>;

    async fn execute_script(&mut self, script: &str) -> Result<()>;

    /// Value of `attribute` for every element matching the CSS `selector`, in document order.
    async fn attribute_values(
        &mut self,
        selector: &str,
        attribute: &str,
    ) -> Result<Vec<Option<String>>>;

    async fn close(self: Box<Self>) -> Result<()>;
}

/// Starts browser sessions.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>>;
}

/// Chrome driven over the WebDriver protocol.
#[derive(Debug, Clone)]
pub struct WebDriverLauncher {
    settings: BrowserSettings,
}

impl WebDriverLauncher {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    fn capabilities(&self) -> Result<ChromeCapabilities> {
        let mut caps = DesiredCapabilities::chrome();
        if self.settings.headless {
            caps.add_arg("--headless")?;
        }
        caps.add_arg("--mute-audio")?;
        caps.add_arg("--no-sandbox")?;
        caps.add_arg("--disable-dev-shm-usage")?;
        caps.add_arg(&format!("user-agent={}", self.settings.user_agent))?;
        Ok(caps)
    }

    fn spawn_chromedriver(&self) -> Result<Option<Child>> {
        let Some(binary) = &self.settings.chromedriver else {
            return Ok(None);
        };

        let port = url::Url::parse(&self.settings.webdriver_url)
            .ok()
            .and_then(|u| u.port_or_known_default())
            .ok_or_else(|| {
                Error::Config(format!(
                    "Cannot determine chromedriver port from {}",
                    self.settings.webdriver_url
                ))
            })?;

        log::debug!("Starting {} on port {}", binary.display(), port);
        let child = Command::new(binary)
            .arg(format!("--port={}", port))
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::Config(format!("Failed to start {}: {}", binary.display(), e))
            })?;
        Ok(Some(child))
    }

    async fn connect(&self, spawned: bool) -> Result<WebDriver> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match WebDriver::new(self.settings.webdriver_url.as_str(), self.capabilities()?).await {
                Ok(driver) => return Ok(driver),
                // A freshly spawned chromedriver needs a moment before it accepts sessions
                Err(e) if spawned && attempt < DRIVER_CONNECT_ATTEMPTS => {
                    log::debug!("WebDriver not ready (attempt {}): {}", attempt, e);
                    tokio::time::sleep(DRIVER_CONNECT_INTERVAL).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[async_trait]
impl BrowserLauncher for WebDriverLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>> {
        let mut chromedriver = self.spawn_chromedriver()?;
        let driver = match self.connect(chromedriver.is_some()).await {
            Ok(driver) => driver,
            Err(e) => {
                if let Some(child) = chromedriver.as_mut() {
                    let _ = child.kill().await;
                }
                return Err(e);
            }
        };
        log::debug!("Browser session opened at {}", self.settings.webdriver_url);

        Ok(Box::new(WebDriverSession {
            driver,
            chromedriver,
        }))
    }
}

struct WebDriverSession {
    driver: WebDriver,
    chromedriver: Option<Child>,
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.driver.goto(url).await?;
        Ok(())
    }

    async fn execute_script(&mut self, script: &str) -> Result<()> {
        self.driver.execute(script, Vec::new()).await?;
        Ok(())
    }

    async fn attribute_values(
        &mut self,
        selector: &str,
        attribute: &str,
    ) -> Result<Vec<Option<String>>> {
        let elements = self.driver.find_all(By::Css(selector)).await?;
        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            values.push(element.attr(attribute).await?);
        }
        Ok(values)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let WebDriverSession {
            driver,
            chromedriver,
        } = *self;

        let quit = driver.quit().await;
        if let Some(mut child) = chromedriver {
            let _ = child.kill().await;
        }
        log::debug!("Browser session closed");
        quit.map_err(Error::from)
    }
}
