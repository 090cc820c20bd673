//! Chromium backend over the DevTools protocol.

pub mod backend;
pub mod cdp;

pub use backend::ChromiumDriver;
