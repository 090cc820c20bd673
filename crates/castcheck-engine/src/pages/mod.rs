//! Page objects. Each holds its locators and wait bounds; the driver is
//! passed into every operation.

mod home;
mod profile;
mod title;

pub use home::HomePage;
pub use profile::ProfilePage;
pub use title::{CastMember, TitlePage};

use castcheck_common::config::SuiteConfig;
use castcheck_common::wait::WaitSettings;

/// Top-level heading shared by title and profile pages.
pub const HEADING: &str = "h1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTiming {
    /// Visibility-gated reads.
    pub element: WaitSettings,
    /// Search suggestions appearing after typing.
    pub dropdown: WaitSettings,
    /// Navigations settling.
    pub page_load: WaitSettings,
}

impl PageTiming {
    pub fn from_config(config: &SuiteConfig) -> Self {
        let element = WaitSettings::new(config.browser.timeout, config.browser.polling_interval);
        Self {
            element,
            dropdown: element.with_timeout(config.dropdown_wait),
            page_load: element.with_timeout(config.page_load_wait),
        }
    }
}
