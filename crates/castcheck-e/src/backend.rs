use crate::chromedriver::{self, CHROME_BIN_ENV_VAR, ChromeDriverProcess};
use crate::webdriver::WebDriverClient;
use async_trait::async_trait;
use castcheck_common::{Driver, DriverError, LaunchOptions, Locator, NavigationResult};
use fantoccini::Locator as By;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use tracing::info;

fn map_cmd_error(e: CmdError) -> DriverError {
    if e.is_no_such_element() {
        return DriverError::ElementNotFound(e.to_string());
    }
    let message = e.to_string();
    if message.contains("stale element") {
        DriverError::Stale(message)
    } else {
        DriverError::Other(message)
    }
}

pub struct WebDriverDriver {
    client: Option<WebDriverClient>,
    webdriver_url: Option<String>,
    process: Option<ChromeDriverProcess>,
    port: u16,
}

impl WebDriverDriver {
    /// Spawn a local chromedriver on the default port at launch.
    pub fn new() -> Self {
        Self::on_port(chromedriver::DEFAULT_CHROMEDRIVER_PORT)
    }

    /// Spawn a local chromedriver on `port` at launch.
    pub fn on_port(port: u16) -> Self {
        Self {
            client: None,
            webdriver_url: None,
            process: None,
            port,
        }
    }

    /// Connect to an already running WebDriver endpoint.
    pub fn with_url(webdriver_url: impl Into<String>) -> Self {
        Self {
            client: None,
            webdriver_url: Some(webdriver_url.into()),
            process: None,
            port: chromedriver::DEFAULT_CHROMEDRIVER_PORT,
        }
    }

    fn client(&self) -> Result<&fantoccini::Client, DriverError> {
        self.client
            .as_ref()
            .map(|c| &c.client)
            .ok_or(DriverError::NotReady)
    }

    async fn collect(&self, locator: &Locator) -> Result<Vec<Element>, DriverError> {
        let client = self.client()?;
        let mut scope: Option<Element> = None;
        for step in locator.scope() {
            let found = Self::find_in(client, scope.as_ref(), &step.css).await?;
            match found.into_iter().nth(step.position()) {
                Some(element) => scope = Some(element),
                None => return Ok(Vec::new()),
            }
        }
        Self::find_in(client, scope.as_ref(), &locator.target().css).await
    }

    async fn find_in(
        client: &fantoccini::Client,
        scope: Option<&Element>,
        css: &str,
    ) -> Result<Vec<Element>, DriverError> {
        let found = match scope {
            Some(element) => element.find_all(By::Css(css)).await,
            None => client.find_all(By::Css(css)).await,
        };
        found.map_err(map_cmd_error)
    }

    async fn element(&self, locator: &Locator) -> Result<Element, DriverError> {
        self.collect(locator)
            .await?
            .into_iter()
            .nth(locator.position())
            .ok_or_else(|| DriverError::ElementNotFound(locator.to_string()))
    }
}

impl Default for WebDriverDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Driver for WebDriverDriver {
    async fn launch(&mut self, options: &LaunchOptions) -> Result<(), DriverError> {
        let webdriver_url = match &self.webdriver_url {
            Some(url) => {
                info!("Connecting to external WebDriver at {}...", url);
                url.clone()
            }
            None => {
                info!("Launching chromedriver on port {}...", self.port);
                let process = chromedriver::launch_chromedriver(self.port).await?;
                let url = process.webdriver_url();
                self.process = Some(process);
                url
            }
        };

        let capabilities =
            chromedriver::chrome_capabilities(options, std::env::var(CHROME_BIN_ENV_VAR).ok());
        match WebDriverClient::connect(&webdriver_url, capabilities).await {
            Ok(client) => {
                self.client = Some(client);
                Ok(())
            }
            Err(e) => {
                self.process = None;
                Err(e)
            }
        }
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        let closed = match self.client.take() {
            Some(client) => client.close().await,
            None => Ok(()),
        };
        self.process = None;
        closed
    }

    async fn is_ready(&self) -> bool {
        self.client.is_some()
    }

    async fn open(&mut self, url: &str) -> Result<NavigationResult, DriverError> {
        let client = self.client()?;
        info!("Navigating to: {}", url);
        client
            .goto(url)
            .await
            .map_err(|e| DriverError::Navigation(e.to_string()))?;

        let title = client.title().await.unwrap_or_default();
        let url = client
            .current_url()
            .await
            .map(|u| u.to_string())
            .map_err(|e| DriverError::Navigation(e.to_string()))?;
        Ok(NavigationResult { url, title })
    }

    async fn go_back(&mut self) -> Result<(), DriverError> {
        self.client()?
            .back()
            .await
            .map_err(|e| DriverError::Navigation(format!("go_back failed: {}", e)))
    }

    async fn current_url(&mut self) -> Result<String, DriverError> {
        self.client()?
            .current_url()
            .await
            .map(|u| u.to_string())
            .map_err(map_cmd_error)
    }

    async fn count(&mut self, locator: &Locator) -> Result<usize, DriverError> {
        Ok(self.collect(locator).await?.len())
    }

    async fn is_visible(&mut self, locator: &Locator) -> Result<bool, DriverError> {
        match self.collect(locator).await?.into_iter().nth(locator.position()) {
            Some(element) => element.is_displayed().await.map_err(map_cmd_error),
            None => Ok(false),
        }
    }

    async fn text(&mut self, locator: &Locator) -> Result<String, DriverError> {
        self.element(locator)
            .await?
            .text()
            .await
            .map_err(map_cmd_error)
    }

    async fn attribute(
        &mut self,
        locator: &Locator,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        self.element(locator)
            .await?
            .attr(name)
            .await
            .map_err(map_cmd_error)
    }

    async fn set_value(&mut self, locator: &Locator, value: &str) -> Result<(), DriverError> {
        let element = self.element(locator).await?;
        element.clear().await.map_err(map_cmd_error)?;
        element.send_keys(value).await.map_err(map_cmd_error)
    }

    async fn clear(&mut self, locator: &Locator) -> Result<(), DriverError> {
        self.element(locator)
            .await?
            .clear()
            .await
            .map_err(map_cmd_error)
    }

    async fn click(&mut self, locator: &Locator) -> Result<(), DriverError> {
        self.element(locator)
            .await?
            .click()
            .await
            .map_err(map_cmd_error)
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, DriverError> {
        self.client()?
            .screenshot()
            .await
            .map_err(|e| DriverError::Other(format!("Screenshot failed: {}", e)))
    }

    async fn page_source(&mut self) -> Result<String, DriverError> {
        self.client()?.source().await.map_err(map_cmd_error)
    }
}
