//! WebDriver backend: drives Chrome through chromedriver or any remote
//! WebDriver endpoint.

pub mod backend;
pub mod chromedriver;
pub mod webdriver;

pub use backend::WebDriverDriver;
