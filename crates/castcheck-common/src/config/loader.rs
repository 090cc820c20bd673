use super::properties::Properties;
use super::schema::SuiteConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const TESTDATA_FILE: &str = "testdata.properties";
pub const TESTDATA_ENV_VAR: &str = "CASTCHECK_TESTDATA";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to find testdata.properties (searched: {})", display_paths(.searched))]
    NotFound { searched: Vec<PathBuf> },

    #[error("Failed to load {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Missing required property '{0}'")]
    MissingKey(String),

    #[error("Property '{key}' is not a number: '{value}'")]
    InvalidNumber { key: String, value: String },

    #[error("Invalid property '{key}': {reason}")]
    Invalid { key: String, reason: String },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from the first existing candidate of [`ConfigLoader::search_paths`].
    pub async fn load(explicit: Option<&Path>) -> Result<SuiteConfig, ConfigError> {
        let env_override = std::env::var_os(TESTDATA_ENV_VAR).map(PathBuf::from);
        let searched = Self::search_paths(explicit, env_override);

        for candidate in &searched {
            if candidate.exists() {
                return Self::load_from(candidate).await;
            }
        }

        Err(ConfigError::NotFound { searched })
    }

    pub async fn load_default() -> Result<SuiteConfig, ConfigError> {
        Self::load(None).await
    }

    /// Candidate locations, in priority order:
    /// 1. the explicit path (only that one when given)
    /// 2. `$CASTCHECK_TESTDATA`
    /// 3. `./testdata.properties`
    /// 4. `./resources/testdata.properties`
    /// 5. `~/.castcheck/testdata.properties`
    pub fn search_paths(explicit: Option<&Path>, env_override: Option<PathBuf>) -> Vec<PathBuf> {
        if let Some(path) = explicit {
            return vec![path.to_path_buf()];
        }

        let mut paths = Vec::new();
        if let Some(path) = env_override {
            paths.push(path);
        }
        paths.push(PathBuf::from(".").join(TESTDATA_FILE));
        paths.push(PathBuf::from(".").join("resources").join(TESTDATA_FILE));
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".castcheck").join(TESTDATA_FILE));
        }
        paths
    }

    pub async fn load_from(path: &Path) -> Result<SuiteConfig, ConfigError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let config = SuiteConfig::from_properties(&Properties::parse(&content))?;
        info!("Loaded test data from {}", path.display());
        Ok(config)
    }
}
