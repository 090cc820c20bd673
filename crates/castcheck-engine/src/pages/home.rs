use super::PageTiming;
use castcheck_common::wait::{self, Condition};
use castcheck_common::{Driver, DriverError, Locator, NavigationResult};
use tracing::{debug, info, instrument, warn};

pub const SEARCH_INPUT: &str = "#suggestion-search";
pub const SUGGESTION_ITEMS: &str = ".react-autosuggest__suggestions-list li";

/// The landing page and its search box with autosuggest dropdown.
#[derive(Debug, Clone)]
pub struct HomePage {
    base_url: String,
    timing: PageTiming,
}

impl HomePage {
    pub fn new(base_url: impl Into<String>, timing: PageTiming) -> Self {
        Self {
            base_url: base_url.into(),
            timing,
        }
    }

    fn search_input() -> Locator {
        Locator::css(SEARCH_INPUT)
    }

    fn suggestions() -> Locator {
        Locator::css(SUGGESTION_ITEMS)
    }

    #[instrument(name = "Open home page", skip_all, fields(url = %self.base_url))]
    pub async fn open<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
    ) -> Result<NavigationResult, DriverError> {
        let nav = driver.open(&self.base_url).await?;
        wait::visible(driver, &Self::search_input(), self.timing.element).await?;
        Ok(nav)
    }

    #[instrument(name = "Search", skip(self, driver))]
    pub async fn search_for<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
        query: &str,
    ) -> Result<(), DriverError> {
        let input = Self::search_input();
        wait::visible(driver, &input, self.timing.element).await?;
        driver.set_value(&input, query).await?;
        self.await_suggestions(driver).await
    }

    /// Clear the search box and submit the same query again.
    #[instrument(name = "Re-enter search query", skip(self, driver))]
    pub async fn re_search<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
        query: &str,
    ) -> Result<(), DriverError> {
        let input = Self::search_input();
        wait::visible(driver, &input, self.timing.element).await?;
        driver.clear(&input).await?;
        driver.set_value(&input, query).await?;
        self.await_suggestions(driver).await
    }

    /// An empty dropdown after the bound is not an error; the count says so.
    async fn await_suggestions<D: Driver + ?Sized>(&self, driver: &mut D) -> Result<(), DriverError> {
        let appeared = wait::poll(
            driver,
            &Condition::CountAbove(Self::suggestions(), 0),
            self.timing.dropdown,
        )
        .await?;
        if !appeared {
            debug!("No suggestions within {:?}", self.timing.dropdown.timeout);
        }
        Ok(())
    }

    pub async fn suggestion_count<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
    ) -> Result<usize, DriverError> {
        driver.count(&Self::suggestions()).await
    }

    pub async fn suggestion_text<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
        index: usize,
    ) -> Result<String, DriverError> {
        driver.text(&Self::suggestions().nth(index)).await
    }

    /// Click a suggestion and wait for the resulting navigation.
    /// Returns `false` when the URL did not change within the page-load bound.
    #[instrument(name = "Click suggestion", skip(self, driver))]
    pub async fn click_suggestion<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
        index: usize,
    ) -> Result<bool, DriverError> {
        let from = driver.current_url().await?;
        driver.click(&Self::suggestions().nth(index)).await?;
        let navigated =
            wait::poll(driver, &Condition::UrlChanged { from }, self.timing.page_load).await?;
        if navigated {
            info!("Opened {}", driver.current_url().await?);
        } else {
            warn!("Suggestion {} did not navigate away", index);
        }
        Ok(navigated)
    }

    #[instrument(name = "Navigate back", skip_all)]
    pub async fn navigate_back<D: Driver + ?Sized>(&self, driver: &mut D) -> Result<(), DriverError> {
        let from = driver.current_url().await?;
        driver.go_back().await?;
        wait::until(driver, &Condition::UrlChanged { from }, self.timing.page_load).await?;
        wait::visible(driver, &Self::search_input(), self.timing.element).await
    }
}
