//! Chained CSS locators.
//!
//! A locator is a non-empty chain of CSS steps. Every step except the last
//! narrows the search to a single element (its position, or the first match).
//! The last step names a collection; its position picks the element used by
//! single-element operations such as reading text or clicking.
//!
//! A scope step that matches nothing makes the whole collection empty rather
//! than failing, so counting never errors on a missing container.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub css: String,
    pub nth: Option<usize>,
}

impl Step {
    pub fn position(&self) -> usize {
        self.nth.unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    steps: Vec<Step>,
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self {
            steps: vec![Step {
                css: selector.into(),
                nth: None,
            }],
        }
    }

    /// Pin the current last step to a zero-based position.
    pub fn nth(mut self, index: usize) -> Self {
        if let Some(last) = self.steps.last_mut() {
            last.nth = Some(index);
        }
        self
    }

    /// Search for `selector` inside the element picked by the current chain.
    pub fn descendant(mut self, selector: impl Into<String>) -> Self {
        self.steps.push(Step {
            css: selector.into(),
            nth: None,
        });
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Steps that must each resolve to exactly one element.
    pub fn scope(&self) -> &[Step] {
        &self.steps[..self.steps.len() - 1]
    }

    pub fn target(&self) -> &Step {
        &self.steps[self.steps.len() - 1]
    }

    /// Position of the element used by single-element operations.
    pub fn position(&self) -> usize {
        self.target().position()
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, " >> ")?;
            }
            write!(f, "{}", step.css)?;
            if let Some(n) = step.nth {
                write!(f, "[{}]", n)?;
            }
        }
        Ok(())
    }
}
