use super::profile::ProfilePage;
use super::{HEADING, PageTiming};
use crate::cast::{CastDetector, CastProbe};
use castcheck_common::wait::{self, Condition};
use castcheck_common::{Driver, DriverError, Locator};
use serde::Serialize;
use tracing::{info, instrument};
use url::Url;

/// One cast listing, read positionally from a title page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CastMember {
    pub name: String,
    /// Absolute URL of the member's profile.
    pub profile_url: String,
}

/// A movie/show detail page.
#[derive(Debug, Clone)]
pub struct TitlePage {
    timing: PageTiming,
    detector: CastDetector,
}

impl TitlePage {
    pub fn new(timing: PageTiming) -> Self {
        Self {
            timing,
            detector: CastDetector::standard(),
        }
    }

    /// Wait for the heading, then give the cast section a chance to render.
    /// A page without any cast markup is still considered loaded; a page
    /// whose heading never shows up is not, and yields `false`.
    pub async fn wait_until_loaded<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
    ) -> Result<bool, DriverError> {
        let heading = Condition::Visible(Locator::css(HEADING));
        if !wait::poll(driver, &heading, self.timing.page_load).await? {
            return Ok(false);
        }
        wait::poll(
            driver,
            &Condition::AnyPresent(self.detector.item_locators()),
            self.timing.page_load,
        )
        .await?;
        Ok(true)
    }

    #[instrument(name = "Get page title", skip_all)]
    pub async fn page_title<D: Driver + ?Sized>(&self, driver: &mut D) -> Result<String, DriverError> {
        let heading = Locator::css(HEADING);
        wait::visible(driver, &heading, self.timing.element).await?;
        Ok(driver.text(&heading).await?.trim().to_string())
    }

    #[instrument(name = "Get cast members count", skip_all)]
    pub async fn cast_count<D: Driver + ?Sized>(&self, driver: &mut D) -> Result<usize, DriverError> {
        self.detector.count(driver).await
    }

    pub async fn cast_count_with<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
        detector: &CastDetector,
    ) -> Result<usize, DriverError> {
        detector.count(driver).await
    }

    pub async fn has_cast_members_greater_than<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
        expected: usize,
    ) -> Result<bool, DriverError> {
        Ok(self.cast_count(driver).await? > expected)
    }

    async fn probe<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
        index: usize,
    ) -> Result<CastProbe, DriverError> {
        match self.detector.detect(driver).await? {
            Some((probe, _)) => Ok(probe),
            None => Err(DriverError::ElementNotFound(format!("cast entry {}", index))),
        }
    }

    #[instrument(name = "Get cast member name", skip(self, driver))]
    pub async fn cast_member_name<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
        index: usize,
    ) -> Result<String, DriverError> {
        let probe = self.probe(driver, index).await?;
        Ok(driver.text(&probe.name_locator(index)).await?.trim().to_string())
    }

    #[instrument(name = "Get cast member profile URL", skip(self, driver))]
    pub async fn cast_member_profile_url<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
        index: usize,
    ) -> Result<String, DriverError> {
        let probe = self.probe(driver, index).await?;
        let link = probe.link_locator(index);
        let href = driver
            .attribute(&link, "href")
            .await?
            .ok_or_else(|| DriverError::ElementNotFound(format!("{} (href)", link)))?;
        let base = Url::parse(&driver.current_url().await?)?;
        Ok(base.join(&href)?.to_string())
    }

    pub async fn cast_member<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
        index: usize,
    ) -> Result<CastMember, DriverError> {
        let name = self.cast_member_name(driver, index).await?;
        let profile_url = self.cast_member_profile_url(driver, index).await?;
        info!("Cast member {}: {} ({})", index, name, profile_url);
        Ok(CastMember { name, profile_url })
    }

    #[instrument(name = "Navigate to cast member profile", skip(self, driver))]
    pub async fn navigate_to_profile<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
        profile_url: &str,
    ) -> Result<ProfilePage, DriverError> {
        driver.open(profile_url).await?;
        Ok(ProfilePage::new(self.timing))
    }
}
