use crate::cdp::CdpClient;
use async_trait::async_trait;
use castcheck_common::{Driver, DriverError, LaunchOptions, Locator, NavigationResult};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use tracing::{debug, info};

const IS_VISIBLE_JS: &str = "function() {
    const rect = this.getBoundingClientRect();
    const style = window.getComputedStyle(this);
    return rect.width > 0 && rect.height > 0
        && style.visibility !== 'hidden' && style.display !== 'none';
}";

const CLEAR_VALUE_JS: &str = "function() {
    this.value = '';
    this.dispatchEvent(new Event('input', { bubbles: true }));
}";

/// DevTools errors raised while the document is being replaced.
fn is_context_error(err: &str) -> bool {
    err.contains("Cannot find context")
        || err.contains("Execution context was destroyed")
        || err.contains("Could not find node")
        || err.contains("No node with given id")
        || err.contains("-32000")
}

fn map_cdp_error(e: CdpError) -> DriverError {
    let message = e.to_string();
    if is_context_error(&message) {
        DriverError::Stale(message)
    } else {
        DriverError::Other(message)
    }
}

pub struct ChromiumDriver {
    client: Option<CdpClient>,
}

impl ChromiumDriver {
    pub fn new() -> Self {
        Self { client: None }
    }

    pub fn client(&self) -> Option<&CdpClient> {
        self.client.as_ref()
    }

    fn page(&self) -> Result<&Page, DriverError> {
        self.client
            .as_ref()
            .map(|c| &c.page)
            .ok_or(DriverError::NotReady)
    }

    async fn find_in(
        page: &Page,
        scope: Option<&Element>,
        css: &str,
    ) -> Result<Vec<Element>, DriverError> {
        let found = match scope {
            Some(element) => element.find_elements(css).await,
            None => page.find_elements(css).await,
        };
        found.map_err(map_cdp_error)
    }

    /// Every element in the locator's target collection.
    async fn collect(page: &Page, locator: &Locator) -> Result<Vec<Element>, DriverError> {
        let mut scope: Option<Element> = None;
        for step in locator.scope() {
            let found = Self::find_in(page, scope.as_ref(), &step.css).await?;
            match found.into_iter().nth(step.position()) {
                Some(element) => scope = Some(element),
                None => return Ok(Vec::new()),
            }
        }
        Self::find_in(page, scope.as_ref(), &locator.target().css).await
    }

    async fn element(page: &Page, locator: &Locator) -> Result<Element, DriverError> {
        Self::collect(page, locator)
            .await?
            .into_iter()
            .nth(locator.position())
            .ok_or_else(|| DriverError::ElementNotFound(locator.to_string()))
    }

    async fn navigation_result(page: &Page) -> Result<NavigationResult, DriverError> {
        let title = page
            .get_title()
            .await
            .unwrap_or_default()
            .unwrap_or_default();
        let url = page
            .url()
            .await
            .map_err(|e| DriverError::Navigation(e.to_string()))?
            .unwrap_or_default();
        Ok(NavigationResult { url, title })
    }
}

impl Default for ChromiumDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Driver for ChromiumDriver {
    async fn launch(&mut self, options: &LaunchOptions) -> Result<(), DriverError> {
        info!("Launching Chromium driver...");
        if !options.args.is_empty() {
            debug!("Extra browser args: {}", options.args.join(" "));
        }
        self.client = Some(CdpClient::launch(options).await?);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        if let Some(client) = self.client.take() {
            client.close().await?;
        }
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.client.is_some()
    }

    async fn open(&mut self, url: &str) -> Result<NavigationResult, DriverError> {
        let page = self.page()?;
        info!("Navigating to: {}", url);
        page.goto(url)
            .await
            .map_err(|e| DriverError::Navigation(e.to_string()))?;
        Self::navigation_result(page).await
    }

    async fn go_back(&mut self) -> Result<(), DriverError> {
        self.page()?
            .evaluate("history.back();")
            .await
            .map_err(|e| DriverError::Navigation(format!("go_back failed: {}", e)))?;
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, DriverError> {
        Ok(self
            .page()?
            .url()
            .await
            .map_err(map_cdp_error)?
            .unwrap_or_default())
    }

    async fn count(&mut self, locator: &Locator) -> Result<usize, DriverError> {
        Ok(Self::collect(self.page()?, locator).await?.len())
    }

    async fn is_visible(&mut self, locator: &Locator) -> Result<bool, DriverError> {
        let page = self.page()?;
        let Some(element) = Self::collect(page, locator)
            .await?
            .into_iter()
            .nth(locator.position())
        else {
            return Ok(false);
        };
        let returns = element
            .call_js_fn(IS_VISIBLE_JS, false)
            .await
            .map_err(map_cdp_error)?;
        Ok(returns
            .result
            .value
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }

    async fn text(&mut self, locator: &Locator) -> Result<String, DriverError> {
        let element = Self::element(self.page()?, locator).await?;
        Ok(element
            .inner_text()
            .await
            .map_err(map_cdp_error)?
            .unwrap_or_default())
    }

    async fn attribute(
        &mut self,
        locator: &Locator,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        let element = Self::element(self.page()?, locator).await?;
        element.attribute(name).await.map_err(map_cdp_error)
    }

    async fn set_value(&mut self, locator: &Locator, value: &str) -> Result<(), DriverError> {
        let element = Self::element(self.page()?, locator).await?;
        element.click().await.map_err(map_cdp_error)?;
        element
            .call_js_fn(CLEAR_VALUE_JS, false)
            .await
            .map_err(|e| DriverError::Script(e.to_string()))?;
        element.type_str(value).await.map_err(map_cdp_error)?;
        Ok(())
    }

    async fn clear(&mut self, locator: &Locator) -> Result<(), DriverError> {
        let element = Self::element(self.page()?, locator).await?;
        element
            .call_js_fn(CLEAR_VALUE_JS, false)
            .await
            .map_err(|e| DriverError::Script(e.to_string()))?;
        Ok(())
    }

    async fn click(&mut self, locator: &Locator) -> Result<(), DriverError> {
        let element = Self::element(self.page()?, locator).await?;
        element.click().await.map_err(map_cdp_error)?;
        Ok(())
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, DriverError> {
        self.page()?
            .screenshot(ScreenshotParams::builder().build())
            .await
            .map_err(|e| DriverError::Other(format!("Screenshot failed: {}", e)))
    }

    async fn page_source(&mut self) -> Result<String, DriverError> {
        self.page()?.content().await.map_err(map_cdp_error)
    }
}
