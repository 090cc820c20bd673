use super::{HEADING, PageTiming};
use crate::matching::names_match;
use castcheck_common::wait;
use castcheck_common::{Driver, DriverError, Locator};
use tracing::instrument;

const HEADING_SPAN: &str = "h1 span";

/// A person's profile page.
#[derive(Debug, Clone)]
pub struct ProfilePage {
    timing: PageTiming,
}

impl ProfilePage {
    pub fn new(timing: PageTiming) -> Self {
        Self { timing }
    }

    /// Displayed name, or an empty string when no heading variant exists.
    #[instrument(name = "Get profile name", skip_all)]
    pub async fn profile_name<D: Driver + ?Sized>(&self, driver: &mut D) -> Result<String, DriverError> {
        wait::visible(driver, &Locator::css(HEADING), self.timing.element).await?;

        for selector in [HEADING_SPAN, HEADING] {
            let locator = Locator::css(selector);
            if driver.exists(&locator).await? {
                return Ok(driver.text(&locator).await?.trim().to_string());
            }
        }
        Ok(String::new())
    }

    #[instrument(name = "Verify profile name", skip(self, driver))]
    pub async fn verify_profile_name<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
        expected: &str,
    ) -> Result<bool, DriverError> {
        let actual = self.profile_name(driver).await?;
        Ok(names_match(&actual, expected))
    }
}
