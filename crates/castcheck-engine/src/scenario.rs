//! User journeys run inside a session fixture.

use crate::cast::CastDetector;
use crate::fixture::SessionError;
use crate::matching::names_match;
use crate::pages::{CastMember, HomePage, PageTiming, TitlePage};
use crate::selection::{Selection, SelectionCriteria, SelectionError, select_candidate};
use async_trait::async_trait;
use castcheck_common::config::SuiteConfig;
use castcheck_common::{Driver, DriverError};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("{message}: expected '{expected}', actual '{actual}'")]
    Assertion {
        message: String,
        expected: String,
        actual: String,
    },

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Scenario panicked: {0}")]
    Panicked(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioOutcome {
    pub selected: Selection,
    pub page_title: String,
    pub top_cast_count: usize,
    /// `None` when the top-cast recount did not clear the threshold.
    pub cast_member: Option<CastMember>,
    pub profile_name: Option<String>,
}

#[async_trait]
pub trait Scenario: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, driver: &mut dyn Driver) -> Result<ScenarioOutcome, ScenarioError>;
}

/// The two flavours of the search-and-verify journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFlavor {
    /// Page-object journey; recounts the cast with the standard probes.
    CastProfile,
    /// Same journey; recounts the top-cast section with the wider probe chain.
    TitleSearch,
}

impl SearchFlavor {
    pub fn name(&self) -> &'static str {
        match self {
            SearchFlavor::CastProfile => "cast-profile",
            SearchFlavor::TitleSearch => "title-search",
        }
    }

    fn recount_detector(&self) -> CastDetector {
        match self {
            SearchFlavor::CastProfile => CastDetector::standard(),
            SearchFlavor::TitleSearch => CastDetector::top_cast(),
        }
    }
}

/// Search for the configured term, open the first title with a real cast,
/// then check that the configured cast member's profile opens.
#[derive(Debug, Clone)]
pub struct SearchScenario {
    config: SuiteConfig,
    flavor: SearchFlavor,
}

impl SearchScenario {
    pub fn new(config: SuiteConfig, flavor: SearchFlavor) -> Self {
        Self { config, flavor }
    }

    pub fn cast_profile(config: SuiteConfig) -> Self {
        Self::new(config, SearchFlavor::CastProfile)
    }

    pub fn title_search(config: SuiteConfig) -> Self {
        Self::new(config, SearchFlavor::TitleSearch)
    }

    pub fn flavor(&self) -> SearchFlavor {
        self.flavor
    }
}

#[async_trait]
impl Scenario for SearchScenario {
    fn name(&self) -> &str {
        self.flavor.name()
    }

    async fn run(&self, driver: &mut dyn Driver) -> Result<ScenarioOutcome, ScenarioError> {
        let config = &self.config;
        let timing = PageTiming::from_config(config);
        let home = HomePage::new(config.base_url.clone(), timing);
        let title_page = TitlePage::new(timing);

        home.open(driver).await?;

        let criteria = SelectionCriteria::from_config(config);
        let selected = select_candidate(driver, &home, &title_page, &criteria).await?;
        info!("Selected dropdown title: {}", selected.title);

        let page_title = title_page.page_title(driver).await?;
        info!("Page title: {}", page_title);
        if page_title.is_empty() {
            return Err(ScenarioError::Assertion {
                message: "Page title should not be empty after navigation".into(),
                expected: "a non-empty title".into(),
                actual: page_title,
            });
        }

        let top_cast_count = title_page
            .cast_count_with(driver, &self.flavor.recount_detector())
            .await?;
        info!("Top cast count: {}", top_cast_count);

        if top_cast_count <= config.cast_min_count {
            warn!(
                "Page has no cast section with more than {} members, skipping profile verification",
                config.cast_min_count
            );
            return Ok(ScenarioOutcome {
                selected,
                page_title,
                top_cast_count,
                cast_member: None,
                profile_name: None,
            });
        }

        let member = title_page
            .cast_member(driver, config.cast_member_position())
            .await?;
        let profile = title_page
            .navigate_to_profile(driver, &member.profile_url)
            .await?;
        let profile_name = profile.profile_name(driver).await?;
        info!("Profile page name: {}", profile_name);

        if !names_match(&profile_name, &member.name) {
            return Err(ScenarioError::Assertion {
                message: format!(
                    "Profile name should match cast member #{}",
                    config.cast_member_index
                ),
                expected: member.name,
                actual: profile_name,
            });
        }

        info!("Verified cast member profile: {}", profile_name);
        Ok(ScenarioOutcome {
            selected,
            page_title,
            top_cast_count,
            cast_member: Some(member),
            profile_name: Some(profile_name),
        })
    }
}
