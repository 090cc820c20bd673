mod common;

use async_trait::async_trait;
use castcheck_common::{Driver, LaunchOptions};
use castcheck_engine::{
    Fixture, Scenario, ScenarioError, ScenarioOutcome, ScenarioStatus, SearchScenario, Session,
    SessionError, SessionState,
};
use common::*;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::Path;

fn happy_site() -> FakeSite {
    FakeSite::new("QA")
        .suggest(
            "The QA Files",
            "/title/tt3/",
            title_page(
                "The QA Files",
                &[
                    ("Alice First", "nm1"),
                    ("Bob Second", "nm2"),
                    ("Carol Third", "nm3"),
                    ("Dan Fourth", "nm4"),
                ],
            ),
        )
        .page("/name/nm3/", profile_page("Carol Third"))
}

fn files_with_extension(dir: &Path, ext: &str) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter(|e| e.path().extension().is_some_and(|x| x == ext))
                .count()
        })
        .unwrap_or(0)
}

struct PanickingScenario;

#[async_trait]
impl Scenario for PanickingScenario {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn run(&self, driver: &mut dyn Driver) -> Result<ScenarioOutcome, ScenarioError> {
        driver.open(BASE_URL).await?;
        panic!("assertion blew up mid-scenario");
    }
}

#[tokio::test]
async fn test_session_lifecycle() {
    let mut browser = FakeBrowser::new(happy_site());
    {
        let mut session = Session::new(&mut browser, LaunchOptions::default());
        assert_eq!(session.state(), SessionState::Uninitialized);

        session.start().await.unwrap();
        assert_eq!(session.state(), SessionState::Active);
        assert!(session.driver().is_ready().await);

        let err = session.start().await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidTransition {
                from: SessionState::Active,
                to: SessionState::Active
            }
        ));

        session.close().await.unwrap();
        assert_eq!(session.state(), SessionState::Closed);
        session.close().await.unwrap();

        let err = session.start().await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransition { .. }));
    }
    assert_eq!(browser.count_events("launch"), 1);
    assert_eq!(browser.count_events("close"), 1);
}

#[tokio::test]
async fn test_close_before_start_releases_nothing() {
    let mut browser = FakeBrowser::new(happy_site());
    {
        let mut session = Session::new(&mut browser, LaunchOptions::default());
        session.close().await.unwrap();
        assert_eq!(session.state(), SessionState::Closed);
    }
    assert!(browser.events.is_empty());
}

#[tokio::test]
async fn test_session_passes_launch_options() {
    let options = LaunchOptions {
        headless: true,
        ci: true,
        ..LaunchOptions::default()
    };
    let mut browser = FakeBrowser::new(happy_site());
    {
        let mut session = Session::new(&mut browser, options.clone());
        session.start().await.unwrap();
        session.close().await.unwrap();
    }
    assert_eq!(browser.last_options, Some(options));
}

#[tokio::test]
async fn test_passing_run_writes_report_only() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = Fixture::new(LaunchOptions::default(), dir.path());
    let scenario = SearchScenario::cast_profile(fast_config());
    let mut browser = FakeBrowser::new(happy_site());

    let run = fixture.run(&scenario, &mut browser).await;

    assert!(run.result.is_ok());
    assert!(run.report.passed());
    assert!(run.report.artifacts.is_empty());
    assert!(run.report.outcome.is_some());
    assert!(!browser.is_launched());
    assert_eq!(browser.count_events("close"), 1);
    assert_eq!(files_with_extension(dir.path(), "json"), 1);
    assert_eq!(files_with_extension(dir.path(), "png"), 0);
}

#[tokio::test]
async fn test_failing_run_captures_artifacts_and_closes() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = Fixture::new(LaunchOptions::default(), dir.path());
    let scenario = SearchScenario::cast_profile(fast_config());
    let mut browser = FakeBrowser::new(FakeSite::new("nothing matches"));

    let run = fixture.run(&scenario, &mut browser).await;

    assert!(run.result.is_err());
    assert_eq!(run.report.status, ScenarioStatus::Failed);
    assert!(
        run.report
            .error
            .as_deref()
            .is_some_and(|e| e.contains("No search results"))
    );
    assert_eq!(run.report.artifacts.len(), 2);
    for path in &run.report.artifacts {
        assert!(path.exists());
    }
    assert_eq!(files_with_extension(dir.path(), "png"), 1);
    assert_eq!(files_with_extension(dir.path(), "html"), 1);
    assert_eq!(browser.count_events("close"), 1);

    let json = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .find(|e| e.path().extension().is_some_and(|x| x == "json"))
        .unwrap();
    let report: serde_json::Value =
        serde_json::from_slice(&std::fs::read(json.path()).unwrap()).unwrap();
    assert_eq!(report["status"], "failed");
    assert_eq!(report["name"], "cast-profile");
}

#[tokio::test]
async fn test_launch_failure_reports_without_teardown() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = Fixture::new(LaunchOptions::default(), dir.path());
    let scenario = SearchScenario::cast_profile(fast_config());
    let mut browser = FakeBrowser::new(happy_site());
    browser.fail_launch = true;

    let run = fixture.run(&scenario, &mut browser).await;

    assert!(matches!(
        run.result,
        Err(ScenarioError::Session(SessionError::Launch(_)))
    ));
    assert!(run.report.artifacts.is_empty());
    assert_eq!(browser.count_events("close"), 0);
    assert_eq!(browser.count_events("open"), 0);
}

#[tokio::test]
async fn test_close_failure_does_not_fail_passing_run() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = Fixture::new(LaunchOptions::default(), dir.path());
    let scenario = SearchScenario::cast_profile(fast_config());
    let mut browser = FakeBrowser::new(happy_site());
    browser.fail_close = true;

    let run = fixture.run(&scenario, &mut browser).await;

    assert!(run.report.passed());
    assert_eq!(browser.count_events("close"), 1);
}

#[tokio::test]
async fn test_panic_still_tears_down() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = Fixture::new(LaunchOptions::default(), dir.path());
    let mut browser = FakeBrowser::new(happy_site());

    let caught = AssertUnwindSafe(fixture.run(&PanickingScenario, &mut browser))
        .catch_unwind()
        .await;

    assert!(caught.is_err());
    assert_eq!(browser.count_events("close"), 1);
    assert!(!browser.is_launched());
    assert_eq!(files_with_extension(dir.path(), "json"), 1);
    assert_eq!(files_with_extension(dir.path(), "png"), 1);
}
