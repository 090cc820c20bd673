use castcheck_common::{DriverError, LaunchOptions};
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Port chromedriver listens on by default.
pub const DEFAULT_CHROMEDRIVER_PORT: u16 = 9515;

/// Explicit chromedriver binary.
pub const CHROMEDRIVER_ENV_VAR: &str = "CHROMEDRIVER";
/// Explicit Chrome binary, passed through as `goog:chromeOptions.binary`.
pub const CHROME_BIN_ENV_VAR: &str = "CHROME_BIN";

const CHROMEDRIVER_PATHS: &[&str] = &[
    "/usr/bin/chromedriver",
    "/usr/local/bin/chromedriver",
    "/usr/lib/chromium/chromedriver",
    "/usr/lib/chromium-browser/chromedriver",
    "/snap/bin/chromium.chromedriver",
];

const READY_ATTEMPTS: u32 = 30;
const READY_DELAY: Duration = Duration::from_millis(200);

pub fn default_chromedriver_url() -> String {
    format!("http://localhost:{}", DEFAULT_CHROMEDRIVER_PORT)
}

/// Find chromedriver: `CHROMEDRIVER`, then `PATH`, then common install paths.
pub fn find_chromedriver_binary() -> Option<String> {
    if let Ok(path) = std::env::var(CHROMEDRIVER_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Some(path);
    }

    if let Ok(output) = Command::new("which").arg("chromedriver").output()
        && output.status.success()
        && let Ok(path) = String::from_utf8(output.stdout)
    {
        let path = path.trim();
        if !path.is_empty() {
            return Some(path.to_string());
        }
    }

    CHROMEDRIVER_PATHS
        .iter()
        .find(|p| std::path::Path::new(p).exists())
        .map(|p| p.to_string())
}

/// Handle to a running chromedriver; the process is killed on drop.
pub struct ChromeDriverProcess {
    child: Child,
    port: u16,
}

impl ChromeDriverProcess {
    pub fn webdriver_url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }
}

impl Drop for ChromeDriverProcess {
    fn drop(&mut self) {
        info!("Shutting down chromedriver...");
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub async fn launch_chromedriver(port: u16) -> Result<ChromeDriverProcess, DriverError> {
    let binary = find_chromedriver_binary().ok_or_else(|| {
        DriverError::Launch(format!(
            "chromedriver not found. Install it or set {}",
            CHROMEDRIVER_ENV_VAR
        ))
    })?;

    info!("Launching chromedriver from: {}", binary);
    let child = Command::new(&binary)
        .arg(format!("--port={}", port))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| DriverError::Launch(format!("Failed to launch chromedriver: {}", e)))?;
    info!("chromedriver launched with PID: {}", child.id());

    // Owned from here so an early return still kills the process.
    let process = ChromeDriverProcess { child, port };

    let url = format!("{}/status", process.webdriver_url());
    let client = reqwest::Client::new();
    for attempt in 1..=READY_ATTEMPTS {
        sleep(READY_DELAY).await;

        match client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!("chromedriver ready after {} attempts", attempt);
                return Ok(process);
            }
            Ok(_) => warn!("chromedriver responded but not ready yet (attempt {})", attempt),
            Err(_) => {
                if attempt % 5 == 0 {
                    info!("Waiting for chromedriver... (attempt {})", attempt);
                }
            }
        }
    }

    Err(DriverError::Launch(
        "chromedriver did not become ready within timeout".into(),
    ))
}

/// W3C capabilities for a Chrome session matching `options`.
pub fn chrome_capabilities(
    options: &LaunchOptions,
    chrome_bin: Option<String>,
) -> serde_json::Map<String, serde_json::Value> {
    let mut args: Vec<String> = options.args.clone();
    args.push(format!(
        "--window-size={},{}",
        options.viewport.width, options.viewport.height
    ));
    if options.headless {
        args.push("--headless=new".into());
    }

    let mut chrome_options = serde_json::Map::new();
    chrome_options.insert("args".into(), serde_json::json!(args));
    if let Some(binary) = chrome_bin {
        chrome_options.insert("binary".into(), serde_json::Value::String(binary));
    }

    let mut caps = serde_json::Map::new();
    caps.insert("browserName".into(), serde_json::json!("chrome"));
    caps.insert(
        "goog:chromeOptions".into(),
        serde_json::Value::Object(chrome_options),
    );
    caps.insert(
        "timeouts".into(),
        serde_json::json!({
            "pageLoad": options.page_load_timeout.as_millis() as u64,
            "script": options.element_timeout.as_millis() as u64,
        }),
    );
    caps
}
