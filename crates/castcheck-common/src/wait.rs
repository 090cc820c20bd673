//! Bounded condition polling.
//!
//! Every wait checks its condition immediately, then re-checks at the
//! polling interval until it holds or the timeout elapses. Transient lookup
//! errors (missing or stale elements) count as "not yet".

use crate::driver::Driver;
use crate::error::DriverError;
use crate::locator::Locator;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitSettings {
    pub timeout: Duration,
    pub interval: Duration,
}

impl WaitSettings {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// The element exists.
    Present(Locator),
    /// The element exists and is rendered.
    Visible(Locator),
    /// The collection holds more than `n` elements.
    CountAbove(Locator, usize),
    /// At least one of the collections is non-empty.
    AnyPresent(Vec<Locator>),
    /// The current URL is no longer `from`.
    UrlChanged { from: String },
}

impl Condition {
    async fn holds<D: Driver + ?Sized>(&self, driver: &mut D) -> Result<bool, DriverError> {
        match self {
            Condition::Present(locator) => driver.exists(locator).await,
            Condition::Visible(locator) => driver.is_visible(locator).await,
            Condition::CountAbove(locator, n) => Ok(driver.count(locator).await? > *n),
            Condition::AnyPresent(locators) => {
                for locator in locators {
                    if driver.count(locator).await? > 0 {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Condition::UrlChanged { from } => Ok(driver.current_url().await? != *from),
        }
    }

    fn describe(&self) -> String {
        match self {
            Condition::Present(locator) => format!("presence of {}", locator),
            Condition::Visible(locator) => format!("visibility of {}", locator),
            Condition::CountAbove(locator, n) => format!("more than {} of {}", n, locator),
            Condition::AnyPresent(locators) => {
                let names: Vec<String> = locators.iter().map(|l| l.to_string()).collect();
                format!("any of [{}]", names.join(", "))
            }
            Condition::UrlChanged { from } => format!("URL to change from {}", from),
        }
    }
}

/// Poll until the condition holds. Returns `Ok(false)` on timeout.
pub async fn poll<D: Driver + ?Sized>(
    driver: &mut D,
    condition: &Condition,
    settings: WaitSettings,
) -> Result<bool, DriverError> {
    let deadline = Instant::now() + settings.timeout;
    loop {
        match condition.holds(driver).await {
            Ok(true) => return Ok(true),
            Ok(false) => {}
            Err(e) if e.is_transient() => debug!("Transient error while waiting: {}", e),
            Err(e) => return Err(e),
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(false);
        }
        sleep(settings.interval.min(deadline - now)).await;
    }
}

/// Poll until the condition holds, failing on timeout.
pub async fn until<D: Driver + ?Sized>(
    driver: &mut D,
    condition: &Condition,
    settings: WaitSettings,
) -> Result<(), DriverError> {
    if poll(driver, condition, settings).await? {
        return Ok(());
    }
    Err(match condition {
        Condition::Visible(locator) => DriverError::NotVisible {
            locator: locator.to_string(),
            timeout_ms: settings.timeout_ms(),
        },
        other => DriverError::Timeout {
            what: other.describe(),
            timeout_ms: settings.timeout_ms(),
        },
    })
}

/// Block until the element is visible.
pub async fn visible<D: Driver + ?Sized>(
    driver: &mut D,
    locator: &Locator,
    settings: WaitSettings,
) -> Result<(), DriverError> {
    until(driver, &Condition::Visible(locator.clone()), settings).await
}
