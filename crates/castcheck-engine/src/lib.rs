//! Page objects, cast detection and scenario orchestration for the IMDb
//! search suite.
//!
//! Everything here talks to the browser through
//! [`castcheck_common::Driver`], so the same scenarios run against the CDP
//! backend, the WebDriver backend, or an in-memory fake.

pub mod cast;
pub mod fixture;
pub mod matching;
pub mod pages;
pub mod report;
pub mod scenario;
pub mod selection;

pub use fixture::{Fixture, ScenarioRun, Session, SessionError, SessionState};
pub use report::{ScenarioReport, ScenarioStatus};
pub use scenario::{Scenario, ScenarioError, ScenarioOutcome, SearchFlavor, SearchScenario};
pub use selection::{Selection, SelectionCriteria, SelectionError};
