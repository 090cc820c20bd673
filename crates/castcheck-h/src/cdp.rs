use castcheck_common::{DriverError, LaunchOptions};
use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::cdp::js_protocol::runtime::EventConsoleApiCalled;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;

pub const CHROME_BIN_ENV_VAR: &str = "CHROME_BIN";
pub const USER_DATA_DIR_ENV_VAR: &str = "CASTCHECK_USER_DATA_DIR";

/// Chromium profile directory. A temporary one is removed on drop, so every
/// early return out of a launch cleans up after itself.
#[derive(Debug)]
pub struct UserDataDir {
    path: PathBuf,
    temporary: bool,
}

impl UserDataDir {
    /// `$CASTCHECK_USER_DATA_DIR` if set (kept), else a fresh temp dir.
    pub fn resolve() -> Result<Self, DriverError> {
        match std::env::var_os(USER_DATA_DIR_ENV_VAR) {
            Some(dir) => {
                let dir = Self::provided(PathBuf::from(dir))?;
                tracing::info!(
                    "Using user data dir from {}: {}",
                    USER_DATA_DIR_ENV_VAR,
                    dir.path.display()
                );
                Ok(dir)
            }
            None => Self::temporary(),
        }
    }

    pub fn provided(path: PathBuf) -> Result<Self, DriverError> {
        std::fs::create_dir_all(&path)?;
        Ok(Self {
            path,
            temporary: false,
        })
    }

    pub fn temporary() -> Result<Self, DriverError> {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let unique = format!("castcheck-chromium-profile-{}-{}", std::process::id(), nanos);
        let path = std::env::temp_dir().join(unique);
        std::fs::create_dir_all(&path)?;
        tracing::debug!("Using isolated user data dir: {}", path.display());
        Ok(Self {
            path,
            temporary: true,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for UserDataDir {
    fn drop(&mut self) {
        if !self.temporary {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            tracing::debug!(
                "Failed to clean up user-data-dir {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

pub struct CdpClient {
    pub browser: Browser,
    pub handler_task: JoinHandle<()>,
    pub page: Page,
    user_data_dir: UserDataDir,
}

impl CdpClient {
    pub async fn launch(options: &LaunchOptions) -> Result<Self, DriverError> {
        Self::launch_with(options, std::env::var(CHROME_BIN_ENV_VAR).ok()).await
    }

    /// Launch with an explicit Chrome binary; `None` lets chromiumoxide find one.
    pub async fn launch_with(
        options: &LaunchOptions,
        chrome_bin: Option<String>,
    ) -> Result<Self, DriverError> {
        let user_data_dir = UserDataDir::resolve()?;
        let mut config_builder = BrowserConfig::builder()
            .window_size(options.viewport.width, options.viewport.height)
            .viewport(None)
            .request_timeout(options.page_load_timeout)
            .args(options.args.iter().map(String::as_str))
            .user_data_dir(user_data_dir.path());

        if options.headless {
            tracing::info!("Launching Chromium headless");
        } else {
            tracing::info!("Launching Chromium with a visible window");
            config_builder = config_builder.with_head();
        }

        if let Some(chrome_bin) = chrome_bin {
            tracing::info!("Using custom Chrome binary: {}", chrome_bin);
            config_builder = config_builder.chrome_executable(chrome_bin);
        }

        let config = config_builder
            .build()
            .map_err(|e| DriverError::Launch(format!("invalid browser config: {}", e)))?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| DriverError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if let Err(e) = h {
                    tracing::debug!("Browser handler error (ignoring): {}", e);
                }
            }
            tracing::debug!("Browser handler task ended");
        });

        let page = match open_page(&browser).await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(e);
            }
        };

        Ok(Self {
            browser,
            handler_task,
            page,
            user_data_dir,
        })
    }

    pub async fn close(mut self) -> Result<(), DriverError> {
        let closed = self
            .browser
            .close()
            .await
            .map_err(|e| DriverError::Other(format!("Error closing browser: {}", e)));
        if let Err(e) = self.browser.wait().await {
            tracing::debug!("Error waiting for browser exit: {}", e);
        }
        if let Err(e) = self.handler_task.await {
            tracing::debug!("Error awaiting handler: {}", e);
        }
        drop(self.user_data_dir);

        closed.map(|_| ())
    }
}

/// Open the working tab with console logging and dialog auto-accept wired up.
async fn open_page(browser: &Browser) -> Result<Page, DriverError> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| DriverError::Launch(format!("Failed to create page: {}", e)))?;

    let mut console_events = page
        .event_listener::<EventConsoleApiCalled>()
        .await
        .map_err(|e| DriverError::Launch(format!("Failed to subscribe to console: {}", e)))?;
    tokio::spawn(async move {
        while let Some(event) = console_events.next().await {
            let args: Vec<String> = event
                .args
                .iter()
                .map(|arg| arg.description.clone().unwrap_or_default())
                .collect();
            tracing::debug!("Browser console [{:?}]: {}", event.r#type, args.join(" "));
        }
    });

    // Unexpected alerts would block every later evaluation.
    let mut dialog_events = page
        .event_listener::<EventJavascriptDialogOpening>()
        .await
        .map_err(|e| DriverError::Launch(format!("Failed to subscribe to dialogs: {}", e)))?;
    let dialog_page = page.clone();
    tokio::spawn(async move {
        while let Some(event) = dialog_events.next().await {
            tracing::info!("Accepting JavaScript dialog: {}", event.message);
            if let Err(e) = dialog_page
                .execute(HandleJavaScriptDialogParams::new(true))
                .await
            {
                tracing::warn!("Failed to accept dialog: {}", e);
            }
        }
    });

    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn profile_dirs() -> Vec<PathBuf> {
        let prefix = format!("castcheck-chromium-profile-{}-", std::process::id());
        let mut dirs: Vec<PathBuf> = std::fs::read_dir(std::env::temp_dir())
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .filter(|e| e.file_name().to_string_lossy().starts_with(&prefix))
                    .map(|e| e.path())
                    .collect()
            })
            .unwrap_or_default();
        dirs.sort();
        dirs
    }

    #[test]
    #[serial]
    fn test_temporary_profile_removed_on_drop() {
        let dir = UserDataDir::temporary().unwrap();
        let path = dir.path().to_path_buf();
        assert!(path.is_dir());
        drop(dir);
        assert!(!path.exists());
    }

    #[test]
    fn test_provided_profile_is_kept() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("profile");
        let dir = UserDataDir::provided(path.clone()).unwrap();
        assert!(path.is_dir());
        drop(dir);
        assert!(path.is_dir());
    }

    #[tokio::test]
    #[serial]
    async fn test_failed_launch_removes_temporary_profile() {
        if std::env::var_os(USER_DATA_DIR_ENV_VAR).is_some() {
            return;
        }
        let before = profile_dirs();
        let result = CdpClient::launch_with(
            &LaunchOptions::default(),
            Some("/nonexistent/castcheck-chrome".to_string()),
        )
        .await;
        assert!(matches!(result, Err(DriverError::Launch(_))));
        assert_eq!(profile_dirs(), before);
    }
}
