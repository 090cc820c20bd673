use super::loader::ConfigError;
use super::properties::Properties;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const KEY_BASE_URL: &str = "imdb.base.url";
pub const KEY_SEARCH_TERM: &str = "search.term.qa";
pub const KEY_CAST_MIN_COUNT: &str = "cast.min.count";
pub const KEY_CAST_MEMBER_INDEX: &str = "cast.member.index";
pub const KEY_DROPDOWN_WAIT: &str = "dropdown.wait";
pub const KEY_PAGE_LOAD_WAIT: &str = "page.load.wait";
pub const KEY_SCAN_BOUND: &str = "scan.bound";
pub const KEY_BROWSER_SIZE: &str = "browser.size";
pub const KEY_BROWSER_TIMEOUT: &str = "browser.timeout";
pub const KEY_BROWSER_PAGE_LOAD_TIMEOUT: &str = "browser.page.load.timeout";
pub const KEY_BROWSER_POLLING_INTERVAL: &str = "browser.polling.interval";
pub const KEY_BROWSER_HEADLESS: &str = "browser.headless";

pub const DEFAULT_SCAN_BOUND: usize = 5;

/// Immutable test parameters, loaded once per process.
#[derive(Debug, Clone, PartialEq)]
pub struct SuiteConfig {
    pub base_url: String,
    pub search_term: String,
    /// A title qualifies when its cast count is strictly above this.
    pub cast_min_count: usize,
    /// 1-based position of the cast member to verify.
    pub cast_member_index: usize,
    /// Upper bound for the search suggestions to appear.
    pub dropdown_wait: Duration,
    /// Upper bound for a navigation to settle.
    pub page_load_wait: Duration,
    pub scan_bound: usize,
    pub browser: BrowserSettings,
}

impl SuiteConfig {
    pub fn from_properties(props: &Properties) -> Result<Self, ConfigError> {
        let search_term = require(props, KEY_SEARCH_TERM)?.to_string();
        if search_term.is_empty() {
            return Err(ConfigError::Invalid {
                key: KEY_SEARCH_TERM.into(),
                reason: "search term must not be empty".into(),
            });
        }

        let cast_member_index: usize = require_number(props, KEY_CAST_MEMBER_INDEX)?;
        if cast_member_index == 0 {
            return Err(ConfigError::Invalid {
                key: KEY_CAST_MEMBER_INDEX.into(),
                reason: "index is 1-based".into(),
            });
        }

        let scan_bound = optional_number(props, KEY_SCAN_BOUND)?.unwrap_or(DEFAULT_SCAN_BOUND);
        if scan_bound == 0 {
            return Err(ConfigError::Invalid {
                key: KEY_SCAN_BOUND.into(),
                reason: "scan bound must be at least 1".into(),
            });
        }

        Ok(Self {
            base_url: require(props, KEY_BASE_URL)?.to_string(),
            search_term,
            cast_min_count: require_number(props, KEY_CAST_MIN_COUNT)?,
            cast_member_index,
            dropdown_wait: Duration::from_millis(require_number(props, KEY_DROPDOWN_WAIT)?),
            page_load_wait: Duration::from_millis(require_number(props, KEY_PAGE_LOAD_WAIT)?),
            scan_bound,
            browser: BrowserSettings::from_properties(props)?,
        })
    }

    /// Zero-based position of the cast member to verify.
    pub fn cast_member_position(&self) -> usize {
        self.cast_member_index - 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Viewport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
        let width = w.trim().parse().map_err(|_| format!("bad width '{}'", w))?;
        let height = h.trim().parse().map_err(|_| format!("bad height '{}'", h))?;
        Ok(Self { width, height })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrowserSettings {
    pub size: Viewport,
    /// Bound for element visibility waits.
    pub timeout: Duration,
    pub page_load_timeout: Duration,
    pub polling_interval: Duration,
    pub headless: bool,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            size: Viewport::default(),
            timeout: Duration::from_millis(15000),
            page_load_timeout: Duration::from_millis(45000),
            polling_interval: Duration::from_millis(300),
            headless: false,
        }
    }
}

impl BrowserSettings {
    fn from_properties(props: &Properties) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let size = match props.get(KEY_BROWSER_SIZE) {
            Some(raw) => raw.parse().map_err(|reason| ConfigError::Invalid {
                key: KEY_BROWSER_SIZE.into(),
                reason,
            })?,
            None => defaults.size,
        };
        let millis = |key: &str, fallback: Duration| -> Result<Duration, ConfigError> {
            Ok(optional_number(props, key)?
                .map(Duration::from_millis)
                .unwrap_or(fallback))
        };
        let headless = match props.get(KEY_BROWSER_HEADLESS) {
            Some(raw) => parse_flag(raw).ok_or_else(|| ConfigError::Invalid {
                key: KEY_BROWSER_HEADLESS.into(),
                reason: format!("expected a boolean, got '{}'", raw),
            })?,
            None => defaults.headless,
        };

        Ok(Self {
            size,
            timeout: millis(KEY_BROWSER_TIMEOUT, defaults.timeout)?,
            page_load_timeout: millis(KEY_BROWSER_PAGE_LOAD_TIMEOUT, defaults.page_load_timeout)?,
            polling_interval: millis(KEY_BROWSER_POLLING_INTERVAL, defaults.polling_interval)?,
            headless,
        })
    }
}

/// Accepts the usual spellings of a boolean switch.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn require<'p>(props: &'p Properties, key: &str) -> Result<&'p str, ConfigError> {
    props
        .get(key)
        .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
}

fn require_number<T: FromStr>(props: &Properties, key: &str) -> Result<T, ConfigError> {
    let raw = require(props, key)?;
    raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

fn optional_number<T: FromStr>(props: &Properties, key: &str) -> Result<Option<T>, ConfigError> {
    match props.get(key) {
        Some(_) => require_number(props, key).map(Some),
        None => Ok(None),
    }
}
