//! Edition (diverged timeline) helpers.

use crate::proto::{DomainDivergence, Edition};

use super::constants::DEFAULT_EDITION;

/// Extension trait providing ergonomic accessors for [`Edition`].
pub trait EditionExt {
    /// True if this edition represents the main (non-diverged) timeline.
    fn is_main_timeline(&self) -> bool;

    /// True if the name is unset (the zero value for Edition).
    fn is_empty(&self) -> bool;

    /// The edition name, defaulting to [`DEFAULT_EDITION`] when unset.
    fn name_or_default(&self) -> &str;

    /// The sequence at which `domain` diverged from the main timeline, if
    /// this edition declares one.
    fn divergence_for(&self, domain: &str) -> Option<u32>;
}

impl EditionExt for Edition {
    fn is_main_timeline(&self) -> bool {
        self.name.is_empty() || self.name == DEFAULT_EDITION
    }

    fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    fn name_or_default(&self) -> &str {
        if self.name.is_empty() {
            DEFAULT_EDITION
        } else {
            &self.name
        }
    }

    fn divergence_for(&self, domain: &str) -> Option<u32> {
        self.divergences
            .iter()
            .find(|d| d.domain == domain)
            .map(|d| d.sequence)
    }
}

impl Edition {
    /// The canonical, non-diverged timeline.
    pub fn main_timeline() -> Self {
        Edition {
            name: DEFAULT_EDITION.to_string(),
            divergences: vec![],
        }
    }

    /// A named timeline with no declared divergence points.
    pub fn implicit(name: impl Into<String>) -> Self {
        Edition {
            name: name.into(),
            divergences: vec![],
        }
    }

    /// A named timeline with explicit per-domain divergence points.
    pub fn explicit(name: impl Into<String>, divergences: Vec<DomainDivergence>) -> Self {
        Edition {
            name: name.into(),
            divergences,
        }
    }
}

impl From<&str> for Edition {
    fn from(name: &str) -> Self {
        Edition::implicit(name)
    }
}

impl From<String> for Edition {
    fn from(name: String) -> Self {
        Edition::implicit(name)
    }
}
