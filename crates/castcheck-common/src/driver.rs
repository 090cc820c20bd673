use crate::error::DriverError;
use crate::launch::LaunchOptions;
use crate::locator::Locator;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationResult {
    pub url: String,
    pub title: String,
}

/// The browser-automation surface every backend implements.
///
/// Single-element operations act on the element at the locator's position
/// and fail with [`DriverError::ElementNotFound`] when it does not exist.
/// None of them wait; waiting is layered on top by [`crate::wait`].
#[async_trait]
pub trait Driver: Send + Sync {
    /// Start the browser with the given options.
    async fn launch(&mut self, options: &LaunchOptions) -> Result<(), DriverError>;

    /// Close the browser and release every resource it holds.
    async fn close(&mut self) -> Result<(), DriverError>;

    async fn is_ready(&self) -> bool;

    /// Navigate to a URL and wait for the load to finish.
    async fn open(&mut self, url: &str) -> Result<NavigationResult, DriverError>;

    /// Navigate back in history. Returns once the command is issued.
    async fn go_back(&mut self) -> Result<(), DriverError>;

    async fn current_url(&mut self) -> Result<String, DriverError>;

    /// Number of elements in the locator's collection.
    async fn count(&mut self, locator: &Locator) -> Result<usize, DriverError>;

    async fn exists(&mut self, locator: &Locator) -> Result<bool, DriverError> {
        Ok(self.count(locator).await? > locator.position())
    }

    /// `false` when the element does not exist.
    async fn is_visible(&mut self, locator: &Locator) -> Result<bool, DriverError>;

    /// Rendered text of the element.
    async fn text(&mut self, locator: &Locator) -> Result<String, DriverError>;

    async fn attribute(
        &mut self,
        locator: &Locator,
        name: &str,
    ) -> Result<Option<String>, DriverError>;

    /// Replace the current value of an input with `value`.
    async fn set_value(&mut self, locator: &Locator, value: &str) -> Result<(), DriverError>;

    async fn clear(&mut self, locator: &Locator) -> Result<(), DriverError>;

    async fn click(&mut self, locator: &Locator) -> Result<(), DriverError>;

    /// PNG bytes of the current viewport.
    async fn screenshot(&mut self) -> Result<Vec<u8>, DriverError> {
        Err(DriverError::NotSupported("screenshot".into()))
    }

    async fn page_source(&mut self) -> Result<String, DriverError> {
        Err(DriverError::NotSupported("page_source".into()))
    }
}
