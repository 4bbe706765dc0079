//! Core domain types for ContractForge contract generation.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{ContractForgeError, Result};

// ---------------------------------------------------------------------------
// StateConfig
// ---------------------------------------------------------------------------

/// Immutable description of one state/provider contract scenario.
///
/// Created once per invocation from caller-supplied input (a `[[states]]`
/// TOML entry or a built-in sample) and owned by the whole pipeline for its
/// duration. Never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// Full state name (e.g., "Virginia").
    pub state: String,
    /// Two-letter abbreviation used in output filenames.
    pub state_abbrev: String,
    /// Contracting health agency.
    pub health_agency: String,
    /// City where the agency is located.
    pub agency_city: String,
    /// Transportation provider name.
    pub provider_name: String,
    /// City where the provider is headquartered.
    pub provider_city: String,
    /// Service region names, in contract order.
    pub service_regions: Vec<String>,
    /// Human-readable contract date (e.g., "January 15, 2025").
    pub contract_date: String,
    /// Nested provider operating details.
    pub provider_details: ProviderDetails,
}

/// Provider operating details embedded in a [`StateConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderDetails {
    /// Contract term description (e.g., "3-year contract with two 1-year renewal options").
    pub term: String,
    /// Number of vehicles in the fleet.
    pub fleet_size: u32,
    /// Operating hours description (e.g., "24/7").
    pub operating_hours: String,
    /// Number of certified drivers.
    pub driver_count: u32,
}

impl StateConfig {
    /// Output file basename for this state: `Transportation_Contract_<ABBREV>_<date>`.
    pub fn output_basename(&self, date_stamp: &str) -> String {
        format!("Transportation_Contract_{}_{date_stamp}", self.state_abbrev)
    }

    /// Built-in sample records, carried over from the original batch inputs.
    pub fn samples() -> Vec<StateConfig> {
        vec![
            StateConfig {
                state: "Florida".into(),
                state_abbrev: "FL".into(),
                health_agency: "Florida Department of Health".into(),
                agency_city: "Tallahassee".into(),
                provider_name: "SafeRide Transit Solutions".into(),
                provider_city: "Orlando".into(),
                service_regions: vec![
                    "Orange County".into(),
                    "Seminole County".into(),
                    "Osceola County".into(),
                ],
                contract_date: "March 15, 2024".into(),
                provider_details: ProviderDetails {
                    term: "2-year contract with 1-year renewal option".into(),
                    fleet_size: 50,
                    operating_hours: "24/7".into(),
                    driver_count: 120,
                },
            },
            StateConfig {
                state: "Texas".into(),
                state_abbrev: "TX".into(),
                health_agency: "Texas Health and Human Services Commission".into(),
                agency_city: "Austin".into(),
                provider_name: "Lone Star Medical Transport".into(),
                provider_city: "Houston".into(),
                service_regions: vec![
                    "Harris County".into(),
                    "Fort Bend County".into(),
                    "Montgomery County".into(),
                ],
                contract_date: "April 1, 2024".into(),
                provider_details: ProviderDetails {
                    term: "3-year contract with two 1-year renewal options".into(),
                    fleet_size: 75,
                    operating_hours: "24/7".into(),
                    driver_count: 180,
                },
            },
            StateConfig {
                state: "Virginia".into(),
                state_abbrev: "VA".into(),
                health_agency: "Virginia Department of Medical Assistance Services".into(),
                agency_city: "Richmond".into(),
                provider_name: "Commonwealth Medical Transport".into(),
                provider_city: "Virginia Beach".into(),
                service_regions: vec![
                    "Fairfax County".into(),
                    "Virginia Beach City".into(),
                    "Richmond City".into(),
                ],
                contract_date: "January 15, 2025".into(),
                provider_details: ProviderDetails {
                    term: "3-year contract with two 1-year renewal options".into(),
                    fleet_size: 50,
                    operating_hours: "24/7".into(),
                    driver_count: 120,
                },
            },
        ]
    }
}

// ---------------------------------------------------------------------------
// SectionKind
// ---------------------------------------------------------------------------

/// The fixed canonical contract sections, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Preamble,
    Scope,
    Rates,
    ServiceAreas,
    PerformanceStandards,
    Signatures,
}

impl SectionKind {
    /// All canonical sections in their required order.
    pub const CANONICAL: [SectionKind; 6] = [
        SectionKind::Preamble,
        SectionKind::Scope,
        SectionKind::Rates,
        SectionKind::ServiceAreas,
        SectionKind::PerformanceStandards,
        SectionKind::Signatures,
    ];

    /// Display title used as the section heading.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Preamble => "Preamble",
            Self::Scope => "Scope of Services",
            Self::Rates => "Rate Schedule",
            Self::ServiceAreas => "Service Areas",
            Self::PerformanceStandards => "Performance Standards",
            Self::Signatures => "Signatures",
        }
    }

    /// Stable identifier used in logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preamble => "preamble",
            Self::Scope => "scope",
            Self::Rates => "rates",
            Self::ServiceAreas => "service_areas",
            Self::PerformanceStandards => "performance_standards",
            Self::Signatures => "signatures",
        }
    }
}

// ---------------------------------------------------------------------------
// RateSchedule
// ---------------------------------------------------------------------------

/// One `(service type, rate, unit)` entry in the rate schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    pub service_type: String,
    /// Rate in US dollars.
    pub rate: f64,
    pub unit: String,
}

/// Ordered rate schedule derived from a [`StateConfig`]. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSchedule {
    pub entries: Vec<RateEntry>,
}

/// Base rates (USD per trip) for the five standard service types.
const BASE_RATES: [(&str, f64); 5] = [
    ("Standard Vehicle Transport", 45.0),
    ("Wheelchair Accessible Vehicle", 65.0),
    ("Stretcher Transport", 110.0),
    ("Bariatric Transport", 140.0),
    ("Group Transport", 85.0),
];

impl RateSchedule {
    /// Derive the schedule for a state.
    ///
    /// Rates are the base table adjusted by a stable per-state percentage in
    /// the range [-10%, +10%], computed from a SHA-256 hash of the state
    /// name. Deterministic: the same state always yields the same schedule.
    pub fn for_state(config: &StateConfig) -> RateSchedule {
        let mut hasher = Sha256::new();
        hasher.update(config.state.as_bytes());
        let digest = hasher.finalize();

        // First two digest bytes → adjustment in [-10, +10] percent.
        let raw = u16::from_be_bytes([digest[0], digest[1]]);
        let adjustment = f64::from(raw % 21) - 10.0;
        let factor = 1.0 + adjustment / 100.0;

        let entries = BASE_RATES
            .iter()
            .map(|(service_type, base)| RateEntry {
                service_type: (*service_type).to_string(),
                rate: (base * factor * 100.0).round() / 100.0,
                unit: "per trip".to_string(),
            })
            .collect();

        RateSchedule { entries }
    }
}

// ---------------------------------------------------------------------------
// ServiceArea
// ---------------------------------------------------------------------------

/// Coverage description for one service region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceArea {
    pub region: String,
    pub coverage: String,
}

impl ServiceArea {
    /// One entry per region in the config's `service_regions`, in order.
    pub fn list_for(config: &StateConfig) -> Vec<ServiceArea> {
        config
            .service_regions
            .iter()
            .map(|region| ServiceArea {
                region: region.clone(),
                coverage: format!(
                    "Door-to-door non-emergency medical transportation throughout {region}, \
                     including all licensed healthcare facilities, during {} operating hours.",
                    config.provider_details.operating_hours
                ),
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// ContractSection / Document
// ---------------------------------------------------------------------------

/// Body content of a contract section.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionBody {
    /// Generated or templated prose paragraphs.
    Prose(String),
    /// A rate table with a header row, optionally preceded by narrative prose.
    Table {
        intro: Option<String>,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// A bulleted list, optionally preceded by narrative prose.
    List {
        intro: Option<String>,
        items: Vec<ServiceArea>,
    },
}

impl SectionBody {
    /// A body is empty when it carries no renderable content at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Prose(text) => text.trim().is_empty(),
            Self::Table { rows, .. } => rows.is_empty(),
            Self::List { items, .. } => items.is_empty(),
        }
    }
}

/// A single titled contract section.
#[derive(Debug, Clone)]
pub struct ContractSection {
    pub kind: SectionKind,
    pub title: String,
    pub body: SectionBody,
}

/// The assembled contract: an ordered sequence of sections.
///
/// Invariant: sections appear in canonical order, exactly once each, and no
/// body is empty. [`Document::validate`] enforces this after assembly.
#[derive(Debug, Clone)]
pub struct Document {
    pub sections: Vec<ContractSection>,
}

impl Document {
    /// Check the canonical-section invariant.
    pub fn validate(&self) -> Result<()> {
        if self.sections.len() != SectionKind::CANONICAL.len() {
            return Err(ContractForgeError::incomplete(format!(
                "expected {} sections, found {}",
                SectionKind::CANONICAL.len(),
                self.sections.len()
            )));
        }

        for (section, expected) in self.sections.iter().zip(SectionKind::CANONICAL) {
            if section.kind != expected {
                return Err(ContractForgeError::incomplete(format!(
                    "section '{}' out of place, expected '{}'",
                    section.kind.as_str(),
                    expected.as_str()
                )));
            }
            if section.body.is_empty() {
                return Err(ContractForgeError::incomplete(format!(
                    "section '{}' has an empty body",
                    section.kind.as_str()
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_config_toml_roundtrip() {
        let config = &StateConfig::samples()[2];
        let toml_str = toml::to_string_pretty(config).expect("serialize");
        let parsed: StateConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.state, "Virginia");
        assert_eq!(parsed.service_regions.len(), 3);
        assert_eq!(parsed.provider_details.fleet_size, 50);
    }

    #[test]
    fn output_basename_uses_abbrev_and_date() {
        let config = &StateConfig::samples()[0];
        assert_eq!(
            config.output_basename("20250115"),
            "Transportation_Contract_FL_20250115"
        );
    }

    #[test]
    fn canonical_order_is_fixed() {
        let titles: Vec<_> = SectionKind::CANONICAL.iter().map(|k| k.title()).collect();
        assert_eq!(
            titles,
            vec![
                "Preamble",
                "Scope of Services",
                "Rate Schedule",
                "Service Areas",
                "Performance Standards",
                "Signatures",
            ]
        );
    }

    #[test]
    fn rate_schedule_is_deterministic() {
        let config = &StateConfig::samples()[1];
        let a = RateSchedule::for_state(config);
        let b = RateSchedule::for_state(config);
        assert_eq!(a, b);
        assert_eq!(a.entries.len(), 5);
    }

    #[test]
    fn rate_schedule_stays_near_base() {
        for config in StateConfig::samples() {
            let schedule = RateSchedule::for_state(&config);
            for (entry, (_, base)) in schedule.entries.iter().zip(BASE_RATES) {
                assert!(entry.rate >= base * 0.9 - 0.01, "{}: {}", config.state, entry.rate);
                assert!(entry.rate <= base * 1.1 + 0.01, "{}: {}", config.state, entry.rate);
            }
        }
    }

    #[test]
    fn service_areas_preserve_config_order() {
        let config = &StateConfig::samples()[2];
        let areas = ServiceArea::list_for(config);
        let regions: Vec<_> = areas.iter().map(|a| a.region.as_str()).collect();
        assert_eq!(
            regions,
            vec!["Fairfax County", "Virginia Beach City", "Richmond City"]
        );
        assert!(areas[0].coverage.contains("Fairfax County"));
    }

    #[test]
    fn document_validate_accepts_canonical() {
        let sections = SectionKind::CANONICAL
            .iter()
            .map(|kind| ContractSection {
                kind: *kind,
                title: kind.title().to_string(),
                body: SectionBody::Prose("content".into()),
            })
            .collect();
        let doc = Document { sections };
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn document_validate_rejects_missing_section() {
        let sections: Vec<_> = SectionKind::CANONICAL[..5]
            .iter()
            .map(|kind| ContractSection {
                kind: *kind,
                title: kind.title().to_string(),
                body: SectionBody::Prose("content".into()),
            })
            .collect();
        let doc = Document { sections };
        let err = doc.validate().unwrap_err();
        assert!(err.to_string().contains("expected 6 sections"));
    }

    #[test]
    fn document_validate_rejects_empty_body() {
        let mut sections: Vec<_> = SectionKind::CANONICAL
            .iter()
            .map(|kind| ContractSection {
                kind: *kind,
                title: kind.title().to_string(),
                body: SectionBody::Prose("content".into()),
            })
            .collect();
        sections[4].body = SectionBody::Prose("   ".into());
        let doc = Document { sections };
        let err = doc.validate().unwrap_err();
        assert!(err.to_string().contains("performance_standards"));
    }

    #[test]
    fn document_validate_rejects_out_of_order() {
        let mut sections: Vec<_> = SectionKind::CANONICAL
            .iter()
            .map(|kind| ContractSection {
                kind: *kind,
                title: kind.title().to_string(),
                body: SectionBody::Prose("content".into()),
            })
            .collect();
        sections.swap(1, 2);
        let doc = Document { sections };
        assert!(doc.validate().is_err());
    }
}
