//! Browser launch options resolved from settings and environment signals.

use crate::config::schema::{BrowserSettings, Viewport};
use crate::wait::WaitSettings;
use std::time::Duration;

/// Set by most CI providers.
pub const CI_ENV_VAR: &str = "CI";
/// Forces CI behaviour locally. Its presence alone counts as a CI signal.
pub const HEADLESS_ENV_VAR: &str = "CASTCHECK_HEADLESS";

/// Extra browser arguments applied when a CI signal is present.
pub const CI_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--disable-extensions",
    "--disable-plugins",
    "--disable-images",
    "--disable-background-timer-throttling",
    "--disable-renderer-backgrounding",
    "--disable-backgrounding-occluded-windows",
    "--disable-web-security",
    "--allow-running-insecure-content",
    "--disable-features=VizDisplayCompositor",
    "--disable-logging",
    "--log-level=3",
    "--silent",
];

#[derive(Debug, Clone, PartialEq)]
pub struct LaunchOptions {
    pub headless: bool,
    pub ci: bool,
    pub viewport: Viewport,
    pub element_timeout: Duration,
    pub page_load_timeout: Duration,
    pub polling_interval: Duration,
    pub args: Vec<String>,
}

impl LaunchOptions {
    /// Resolve against the process environment.
    pub fn from_env(settings: &BrowserSettings) -> Self {
        Self::resolve(settings, |key| std::env::var_os(key))
    }

    /// Resolve against an arbitrary variable lookup. Only presence counts.
    pub fn resolve<V>(settings: &BrowserSettings, lookup: impl Fn(&str) -> Option<V>) -> Self {
        let ci = lookup(CI_ENV_VAR).is_some() || lookup(HEADLESS_ENV_VAR).is_some();
        let headless = ci || settings.headless;

        let args = if ci {
            CI_ARGS.iter().map(|a| a.to_string()).collect()
        } else {
            Vec::new()
        };

        Self {
            headless,
            ci,
            viewport: settings.size,
            element_timeout: settings.timeout,
            page_load_timeout: settings.page_load_timeout,
            polling_interval: settings.polling_interval,
            args,
        }
    }

    /// Wait bounds for element-level reads.
    pub fn element_wait(&self) -> WaitSettings {
        WaitSettings::new(self.element_timeout, self.polling_interval)
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self::resolve(&BrowserSettings::default(), |_| None::<String>)
    }
}
