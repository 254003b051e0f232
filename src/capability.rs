//! Capability probing and gating.
//!
//! Feature availability is a property of the deployment environment. Each
//! provider resolves its backing dependency exactly once at startup; the
//! dispatcher only ever consults the resulting table and never performs its
//! own existence checks. No re-probing mid-session.

use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

use crate::features::Providers;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Capability {
    Browser,
    Weather,
    News,
    Screenshot,
    Social,
    Wiki,
    Speech,
}

impl Capability {
    pub const ALL: [Capability; 7] = [
        Capability::Browser,
        Capability::Weather,
        Capability::News,
        Capability::Screenshot,
        Capability::Social,
        Capability::Wiki,
        Capability::Speech,
    ];

    /// Capabilities without which the run loop refuses to start.
    pub const REQUIRED: [Capability; 1] = [Capability::Speech];

    /// Human wording used in the fixed "unavailable" response.
    pub fn feature_name(self) -> &'static str {
        match self {
            Self::Browser => "browser",
            Self::Weather => "weather",
            Self::News => "news",
            Self::Screenshot => "screenshot",
            Self::Social => "social media",
            Self::Wiki => "Wikipedia",
            Self::Speech => "speech",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.feature_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable,
}

/// Feature-name → availability mapping, computed once at startup and
/// read-only afterward within a session.
#[derive(Debug, Clone)]
pub struct CapabilityTable {
    entries: BTreeMap<Capability, Availability>,
}

impl CapabilityTable {
    /// Resolve each provider's backing dependency without performing any
    /// feature action.
    pub fn probe(providers: &Providers) -> Self {
        let table = Self::from_entries(Capability::ALL.into_iter().map(|capability| {
            let ok = match capability {
                Capability::Browser => providers.browser.probe(),
                Capability::Weather => providers.weather.probe(),
                Capability::News => providers.news.probe(),
                Capability::Screenshot => providers.screenshot.probe(),
                Capability::Social => providers.social.probe(),
                Capability::Wiki => providers.wiki.probe(),
                Capability::Speech => providers.speech.probe(),
            };
            (capability, to_availability(ok))
        }));

        for (capability, availability) in &table.entries {
            info!("Capability {capability}: {availability:?}");
        }
        table
    }

    /// Build a table directly from availability pairs.
    pub fn from_entries(
        pairs: impl IntoIterator<Item = (Capability, Availability)>,
    ) -> Self {
        Self {
            entries: pairs.into_iter().collect(),
        }
    }

    pub fn is_available(&self, capability: Capability) -> bool {
        matches!(self.entries.get(&capability), Some(Availability::Available))
    }

    /// Required capabilities that failed their probe.
    pub fn missing_required(&self) -> Vec<Capability> {
        Capability::REQUIRED
            .into_iter()
            .filter(|capability| !self.is_available(*capability))
            .collect()
    }
}

fn to_availability(ok: bool) -> Availability {
    if ok {
        Availability::Available
    } else {
        Availability::Unavailable
    }
}

#[cfg(test)]
pub fn table_with(available: &[Capability]) -> CapabilityTable {
    CapabilityTable::from_entries(Capability::ALL.into_iter().map(|capability| {
        let availability = if available.contains(&capability) {
            Availability::Available
        } else {
            Availability::Unavailable
        };
        (capability, availability)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_reports_speech() {
        let table = table_with(&[Capability::Browser, Capability::Weather]);
        assert_eq!(table.missing_required(), vec![Capability::Speech]);
        assert!(!table.is_available(Capability::Speech));
    }

    #[test]
    fn full_table_has_no_missing_required() {
        let table = table_with(&Capability::ALL);
        assert!(table.missing_required().is_empty());
        assert!(table.is_available(Capability::Wiki));
    }

    #[test]
    fn unknown_entry_counts_as_unavailable() {
        let table = CapabilityTable::from_entries([]);
        assert!(!table.is_available(Capability::Browser));
    }
}
