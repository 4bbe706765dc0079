//! Prompt construction for each generated contract section.
//!
//! Pure string templating over a [`StateConfig`]; no side effects. Required
//! fields are checked here so configuration problems surface before any
//! network call is made.

use contractforge_shared::{ContractForgeError, Result, StateConfig};

// ---------------------------------------------------------------------------
// PromptKind
// ---------------------------------------------------------------------------

/// The fixed set of generated contract sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    Preamble,
    RatesNarrative,
    ServiceAreasNarrative,
    PerformanceStandards,
}

impl PromptKind {
    /// All prompt kinds in generation order.
    pub const ALL: [PromptKind; 4] = [
        PromptKind::Preamble,
        PromptKind::RatesNarrative,
        PromptKind::ServiceAreasNarrative,
        PromptKind::PerformanceStandards,
    ];

    /// Stable identifier used in logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preamble => "preamble",
            Self::RatesNarrative => "rates_narrative",
            Self::ServiceAreasNarrative => "service_areas_narrative",
            Self::PerformanceStandards => "performance_standards",
        }
    }

    /// Max-length hint passed to the text-generation collaborator.
    pub fn target_tokens(&self) -> u32 {
        match self {
            Self::Preamble => 1200,
            Self::RatesNarrative => 500,
            Self::ServiceAreasNarrative => 500,
            Self::PerformanceStandards => 900,
        }
    }
}

// ---------------------------------------------------------------------------
// Prompt builder
// ---------------------------------------------------------------------------

/// Build the natural-language prompt for one section.
///
/// Fails with a configuration error when fields required by that section are
/// blank or missing.
pub fn build_prompt(kind: PromptKind, config: &StateConfig) -> Result<String> {
    require(&config.state, "state")?;
    require(&config.health_agency, "health_agency")?;
    require(&config.provider_name, "provider_name")?;

    match kind {
        PromptKind::Preamble => {
            require(&config.agency_city, "agency_city")?;
            require(&config.provider_city, "provider_city")?;
            require(&config.contract_date, "contract_date")?;
            Ok(preamble_prompt(config))
        }
        PromptKind::RatesNarrative => {
            require(&config.provider_details.term, "provider_details.term")?;
            Ok(rates_prompt(config))
        }
        PromptKind::ServiceAreasNarrative => {
            if config.service_regions.is_empty() {
                return Err(ContractForgeError::configuration(
                    "service_regions is empty: cannot build the service-areas prompt",
                ));
            }
            Ok(service_areas_prompt(config))
        }
        PromptKind::PerformanceStandards => Ok(performance_prompt(config)),
    }
}

fn require(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ContractForgeError::configuration(format!(
            "required field '{field}' is blank"
        )));
    }
    Ok(())
}

fn preamble_prompt(config: &StateConfig) -> String {
    format!(
        "Draft the preamble and recitals of a medical transportation services contract \
         between the {agency} (located in {agency_city}, {state}) and {provider}, a \
         transportation provider headquartered in {provider_city}, {state}.\n\n\
         Use these specific details:\n\
         - Contract date: {date}\n\
         - Term: {term}\n\
         - Fleet size: {fleet} vehicles\n\
         - Operating hours: {hours}\n\
         - Certified drivers: {drivers}\n\n\
         Write formal contract prose specific to {state} and non-emergency medical \
         transportation. Mark any sub-headings with '#' symbols.",
        agency = config.health_agency,
        agency_city = config.agency_city,
        state = config.state,
        provider = config.provider_name,
        provider_city = config.provider_city,
        date = config.contract_date,
        term = config.provider_details.term,
        fleet = config.provider_details.fleet_size,
        hours = config.provider_details.operating_hours,
        drivers = config.provider_details.driver_count,
    )
}

fn rates_prompt(config: &StateConfig) -> String {
    format!(
        "Write a short narrative introduction for the rate schedule of {agency}'s \
         medical transportation contract with {provider} in {state} ({term}). \
         Explain how rates reflect {state}'s cost of living, fuel costs, and urban \
         versus rural service. Do not invent specific dollar amounts; the rate table \
         is attached separately.",
        agency = config.health_agency,
        provider = config.provider_name,
        state = config.state,
        term = config.provider_details.term,
    )
}

fn service_areas_prompt(config: &StateConfig) -> String {
    format!(
        "Write a narrative introduction for the service area coverage of {provider}'s \
         contract in {state}. The contract covers: {regions}. Describe coverage \
         expectations across urban, suburban, and rural zones and the healthcare \
         facilities served. The region-by-region listing is attached separately.",
        provider = config.provider_name,
        state = config.state,
        regions = config.service_regions.join(", "),
    )
}

fn performance_prompt(config: &StateConfig) -> String {
    format!(
        "Draft the performance standards section for {provider}'s medical \
         transportation contract with {agency} in {state}. Cover on-time \
         performance, vehicle maintenance, driver qualifications, customer service, \
         safety metrics, and complaint resolution, with measurable targets \
         consistent with {state} healthcare regulations. Mark any sub-headings with \
         '#' symbols.",
        provider = config.provider_name,
        agency = config.health_agency,
        state = config.state,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use contractforge_shared::StateConfig;

    fn virginia() -> StateConfig {
        StateConfig::samples()
            .into_iter()
            .find(|s| s.state_abbrev == "VA")
            .unwrap()
    }

    #[test]
    fn preamble_prompt_embeds_parties_and_date() {
        let prompt = build_prompt(PromptKind::Preamble, &virginia()).unwrap();
        assert!(prompt.contains("Virginia Department of Medical Assistance Services"));
        assert!(prompt.contains("Commonwealth Medical Transport"));
        assert!(prompt.contains("January 15, 2025"));
        assert!(prompt.contains("50 vehicles"));
    }

    #[test]
    fn service_areas_prompt_lists_regions() {
        let prompt = build_prompt(PromptKind::ServiceAreasNarrative, &virginia()).unwrap();
        assert!(prompt.contains("Fairfax County, Virginia Beach City, Richmond City"));
    }

    #[test]
    fn missing_regions_is_a_configuration_error() {
        let mut config = virginia();
        config.service_regions.clear();
        let err = build_prompt(PromptKind::ServiceAreasNarrative, &config).unwrap_err();
        assert!(matches!(
            err,
            contractforge_shared::ContractForgeError::Configuration { .. }
        ));
        assert!(err.to_string().contains("service_regions"));
    }

    #[test]
    fn blank_agency_is_a_configuration_error() {
        let mut config = virginia();
        config.health_agency = "  ".into();
        let err = build_prompt(PromptKind::Preamble, &config).unwrap_err();
        assert!(err.to_string().contains("health_agency"));
    }

    #[test]
    fn blank_term_fails_rates_prompt() {
        let mut config = virginia();
        config.provider_details.term = String::new();
        let err = build_prompt(PromptKind::RatesNarrative, &config).unwrap_err();
        assert!(err.to_string().contains("term"));
    }

    #[test]
    fn every_kind_builds_for_valid_config() {
        let config = virginia();
        for kind in PromptKind::ALL {
            let prompt = build_prompt(kind, &config).unwrap();
            assert!(!prompt.is_empty(), "{} prompt empty", kind.as_str());
            assert!(kind.target_tokens() > 0);
        }
    }
}
