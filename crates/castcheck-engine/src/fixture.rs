//! Per-scenario browser session.
//!
//! A [`Session`] moves through `Uninitialized -> Active -> Closed` exactly
//! once. [`Fixture::run`] wraps a scenario in a session and always closes it,
//! whether the scenario succeeds, fails or panics.

use crate::report::{ScenarioReport, ScenarioStatus, artifact_stem};
use crate::scenario::{Scenario, ScenarioError, ScenarioOutcome};
use castcheck_common::{Driver, DriverError, LaunchOptions};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Active,
    Closed,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid session transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: SessionState,
        to: SessionState,
    },

    #[error("Failed to start browser session: {0}")]
    Launch(#[source] DriverError),

    #[error("Failed to close browser session: {0}")]
    Teardown(#[source] DriverError),
}

pub struct Session<'d, D: Driver + ?Sized> {
    driver: &'d mut D,
    state: SessionState,
    options: LaunchOptions,
}

impl<'d, D: Driver + ?Sized> Session<'d, D> {
    pub fn new(driver: &'d mut D, options: LaunchOptions) -> Self {
        Self {
            driver,
            state: SessionState::Uninitialized,
            options,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn options(&self) -> &LaunchOptions {
        &self.options
    }

    pub fn driver(&mut self) -> &mut D {
        self.driver
    }

    pub async fn start(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Uninitialized {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to: SessionState::Active,
            });
        }
        info!(
            "Starting browser session (headless: {}, ci: {}, viewport: {})",
            self.options.headless, self.options.ci, self.options.viewport
        );
        self.driver
            .launch(&self.options)
            .await
            .map_err(SessionError::Launch)?;
        self.state = SessionState::Active;
        Ok(())
    }

    /// Release the browser. Safe to call in any state; closing twice is a no-op.
    pub async fn close(&mut self) -> Result<(), SessionError> {
        let previous = self.state;
        self.state = SessionState::Closed;
        match previous {
            SessionState::Active => self.driver.close().await.map_err(SessionError::Teardown),
            SessionState::Uninitialized | SessionState::Closed => Ok(()),
        }
    }
}

/// Outcome of [`Fixture::run`].
pub struct ScenarioRun {
    pub report: ScenarioReport,
    pub result: Result<ScenarioOutcome, ScenarioError>,
}

pub struct Fixture {
    options: LaunchOptions,
    artifacts_dir: PathBuf,
}

impl Fixture {
    pub fn new(options: LaunchOptions, artifacts_dir: impl Into<PathBuf>) -> Self {
        Self {
            options,
            artifacts_dir: artifacts_dir.into(),
        }
    }

    pub fn options(&self) -> &LaunchOptions {
        &self.options
    }

    pub fn artifacts_dir(&self) -> &Path {
        &self.artifacts_dir
    }

    /// Run `scenario` in a fresh session on `driver`.
    ///
    /// A panic inside the scenario is re-raised after teardown and after the
    /// report has been written.
    pub async fn run<S: Scenario + ?Sized>(
        &self,
        scenario: &S,
        driver: &mut dyn Driver,
    ) -> ScenarioRun {
        let started = Instant::now();
        let name = scenario.name().to_string();
        let stem = artifact_stem(&name);
        let mut session = Session::new(driver, self.options.clone());
        let mut panic_payload = None;

        let result = match session.start().await {
            Err(e) => Err(ScenarioError::Session(e)),
            Ok(()) => match AssertUnwindSafe(scenario.run(session.driver()))
                .catch_unwind()
                .await
            {
                Ok(result) => result,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    panic_payload = Some(payload);
                    Err(ScenarioError::Panicked(message))
                }
            },
        };

        let mut artifacts = Vec::new();
        if let Err(e) = &result {
            error!("Scenario '{}' failed: {} ({:?})", name, e, e);
            if session.state() == SessionState::Active {
                artifacts = capture_artifacts(session.driver(), &self.artifacts_dir, &stem).await;
            }
        }

        if let Err(e) = session.close().await {
            warn!("{}", e);
        }

        let report = ScenarioReport {
            name: name.clone(),
            status: if result.is_ok() {
                ScenarioStatus::Passed
            } else {
                ScenarioStatus::Failed
            },
            duration_ms: started.elapsed().as_millis() as u64,
            error: result.as_ref().err().map(|e| e.to_string()),
            artifacts,
            outcome: result.as_ref().ok().cloned(),
        };
        match report.write_to(&self.artifacts_dir, &stem).await {
            Ok(path) => info!("Report for '{}' written to {}", name, path.display()),
            Err(e) => warn!("Failed to write report for '{}': {}", name, e),
        }

        if let Some(payload) = panic_payload {
            std::panic::resume_unwind(payload);
        }

        ScenarioRun { report, result }
    }
}

/// Screenshot and page source of the current page, best effort.
async fn capture_artifacts<D: Driver + ?Sized>(
    driver: &mut D,
    dir: &Path,
    stem: &str,
) -> Vec<PathBuf> {
    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        warn!("Cannot create artifacts dir {}: {}", dir.display(), e);
        return Vec::new();
    }

    let mut saved = Vec::new();

    match driver.screenshot().await {
        Ok(png) => {
            let path = dir.join(format!("{}.png", stem));
            match tokio::fs::write(&path, png).await {
                Ok(()) => saved.push(path),
                Err(e) => warn!("Failed to save screenshot: {}", e),
            }
        }
        Err(e) => warn!("Screenshot unavailable: {}", e),
    }

    match driver.page_source().await {
        Ok(html) => {
            let path = dir.join(format!("{}.html", stem));
            match tokio::fs::write(&path, html).await {
                Ok(()) => saved.push(path),
                Err(e) => warn!("Failed to save page source: {}", e),
            }
        }
        Err(e) => warn!("Page source unavailable: {}", e),
    }

    for path in &saved {
        info!("Saved failure artifact {}", path.display());
    }
    saved
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
