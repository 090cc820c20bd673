pub mod config;
pub mod driver;
pub mod error;
pub mod launch;
pub mod locator;
pub mod wait;

pub use driver::{Driver, NavigationResult};
pub use error::DriverError;
pub use launch::LaunchOptions;
pub use locator::Locator;
