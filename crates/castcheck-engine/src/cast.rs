//! Cast-section detection.
//!
//! Title pages render the cast with different markup depending on the title
//! type and page generation. A [`CastDetector`] tries an ordered list of
//! [`CastProbe`]s and uses the first that finds anything.

use castcheck_common::{Driver, DriverError, Locator};
use tracing::debug;

/// One way of locating cast entries on a title page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastProbe {
    pub name: &'static str,
    items: &'static str,
    /// Inside an item, where the actor name lives. `None` means the item itself.
    name_within: Option<&'static str>,
    /// Inside an item, the link to the profile. `None` means the item itself.
    link_within: Option<&'static str>,
}

pub const TITLE_CAST_ITEM: CastProbe = CastProbe {
    name: "title-cast-item",
    items: "[data-testid='title-cast-item']",
    name_within: Some("[data-testid='title-cast-item__actor']"),
    link_within: Some("a[href*='/name/']"),
};

pub const NAME_LINK: CastProbe = CastProbe {
    name: "name-link",
    items: "a[href*='/name/nm']",
    name_within: None,
    link_within: None,
};

pub const SUB_GRID_NAME_LINK: CastProbe = CastProbe {
    name: "sub-grid-name-link",
    items: ".ipc-sub-grid a[href*='/name/']",
    name_within: None,
    link_within: None,
};

pub const LEGACY_CAST_LIST: CastProbe = CastProbe {
    name: "legacy-cast-list",
    items: ".cast_list tr",
    name_within: Some("td:not(.primary_photo) a[href*='/name/']"),
    link_within: Some("td:not(.primary_photo) a[href*='/name/']"),
};

pub const TITLE_CAST_LINK: CastProbe = CastProbe {
    name: "title-cast-link",
    items: "[data-testid='title-cast'] a",
    name_within: None,
    link_within: None,
};

impl CastProbe {
    pub fn items(&self) -> Locator {
        Locator::css(self.items)
    }

    pub fn name_locator(&self, index: usize) -> Locator {
        Self::entry(self.items, index, self.name_within)
    }

    pub fn link_locator(&self, index: usize) -> Locator {
        Self::entry(self.items, index, self.link_within)
    }

    fn entry(items: &str, index: usize, within: Option<&str>) -> Locator {
        let item = Locator::css(items).nth(index);
        match within {
            Some(css) => item.descendant(css),
            None => item,
        }
    }

    /// Number of entries, or `None` when this probe finds nothing.
    pub async fn count<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
    ) -> Result<Option<usize>, DriverError> {
        let n = driver.count(&self.items()).await?;
        Ok((n > 0).then_some(n))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastDetector {
    probes: Vec<CastProbe>,
}

impl CastDetector {
    pub fn new(probes: Vec<CastProbe>) -> Self {
        Self { probes }
    }

    /// Probes used while scanning candidates and reading cast members.
    pub fn standard() -> Self {
        Self::new(vec![TITLE_CAST_ITEM, NAME_LINK, SUB_GRID_NAME_LINK])
    }

    /// Wider chain for counting the top-cast section, legacy markup included.
    pub fn top_cast() -> Self {
        Self::new(vec![
            TITLE_CAST_ITEM,
            LEGACY_CAST_LIST,
            TITLE_CAST_LINK,
            SUB_GRID_NAME_LINK,
            NAME_LINK,
        ])
    }

    pub fn probes(&self) -> &[CastProbe] {
        &self.probes
    }

    pub fn item_locators(&self) -> Vec<Locator> {
        self.probes.iter().map(CastProbe::items).collect()
    }

    /// First probe with a non-zero count, together with that count.
    pub async fn detect<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
    ) -> Result<Option<(CastProbe, usize)>, DriverError> {
        for probe in &self.probes {
            if let Some(n) = probe.count(driver).await? {
                debug!("Cast probe '{}' matched {} entries", probe.name, n);
                return Ok(Some((*probe, n)));
            }
        }
        Ok(None)
    }

    /// Cast size; zero when no probe matches.
    pub async fn count<D: Driver + ?Sized>(&self, driver: &mut D) -> Result<usize, DriverError> {
        Ok(self.detect(driver).await?.map(|(_, n)| n).unwrap_or(0))
    }
}
