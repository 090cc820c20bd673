//! Adaptive candidate selection.
//!
//! Walks the search suggestions in display order and opens each one until a
//! title page shows more cast entries than the threshold. The suggestion
//! list is regenerated (back + re-search) before every pick after the first,
//! because it does not survive navigation. A pick whose page never settles
//! (no URL change, no heading) counts as having no cast.

use crate::pages::{HomePage, TitlePage};
use castcheck_common::{Driver, DriverError};
use castcheck_common::config::SuiteConfig;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionCriteria {
    pub query: String,
    /// Maximum number of suggestions inspected.
    pub scan_bound: usize,
    /// Cast count must be strictly greater than this.
    pub min_cast: usize,
}

impl SelectionCriteria {
    pub fn from_config(config: &SuiteConfig) -> Self {
        Self {
            query: config.search_term.clone(),
            scan_bound: config.scan_bound,
            min_cast: config.cast_min_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    /// Zero-based position in the suggestion list.
    pub index: usize,
    pub title: String,
    pub cast_count: usize,
}

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("No search results for '{query}'")]
    NoCandidates { query: String },

    #[error(
        "Could not find a title with more than {min_cast} cast members among the first {inspected} results for '{query}'"
    )]
    NoSuitableCandidate {
        query: String,
        inspected: usize,
        min_cast: usize,
    },

    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// Title shown for a suggestion: its first line, trimmed.
pub fn leading_line(text: &str) -> String {
    text.lines().next().unwrap_or_default().trim().to_string()
}

#[instrument(name = "Select title with cast", skip_all, fields(query = %criteria.query))]
pub async fn select_candidate<D: Driver + ?Sized>(
    driver: &mut D,
    home: &HomePage,
    title_page: &TitlePage,
    criteria: &SelectionCriteria,
) -> Result<Selection, SelectionError> {
    home.search_for(driver, &criteria.query).await?;
    let total = home.suggestion_count(driver).await?;
    info!("Total dropdown items: {}", total);

    if total == 0 {
        return Err(SelectionError::NoCandidates {
            query: criteria.query.clone(),
        });
    }

    let limit = total.min(criteria.scan_bound);
    let mut on_home = true;
    for index in 0..limit {
        if index > 0 {
            if !on_home {
                home.navigate_back(driver).await?;
            }
            home.re_search(driver, &criteria.query).await?;
        }

        let title = leading_line(&home.suggestion_text(driver, index).await?);
        info!("Checking dropdown item {}: {}", index, title);

        on_home = !home.click_suggestion(driver, index).await?;
        let cast_count = if on_home {
            0
        } else if title_page.wait_until_loaded(driver).await? {
            title_page.cast_count(driver).await?
        } else {
            warn!("'{}' never showed a heading, counting no cast", title);
            0
        };
        info!("Cast count for '{}': {}", title, cast_count);

        if cast_count > criteria.min_cast {
            info!("Found title with cast: {}", title);
            return Ok(Selection {
                index,
                title,
                cast_count,
            });
        }
    }

    Err(SelectionError::NoSuitableCandidate {
        query: criteria.query.clone(),
        inspected: limit,
        min_cast: criteria.min_cast,
    })
}
