pub mod loader;
pub mod properties;
pub mod schema;

pub use loader::{ConfigError, ConfigLoader};
pub use properties::Properties;
pub use schema::{BrowserSettings, SuiteConfig, Viewport};
