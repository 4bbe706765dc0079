//! Contract assembly: merges generated prose with locally derived tabular
//! data into the canonical six-section [`Document`].

use tracing::{debug, instrument};

use contractforge_shared::{
    ContractSection, Document, RateSchedule, Result, SectionBody, SectionKind, ServiceArea,
    StateConfig,
};

/// Generated prose for the four prompted sections, already post-processed
/// and placeholder-substituted where generation came back empty.
#[derive(Debug, Clone)]
pub struct GeneratedProse {
    pub preamble: String,
    pub rates_narrative: String,
    pub service_areas_narrative: String,
    pub performance_standards: String,
}

/// Assemble a complete contract document in canonical section order.
///
/// The scope and signature sections are templated directly from the config;
/// the rate table and service-area listing are derived deterministically.
/// The canonical-section invariant is re-checked before returning, so a
/// defect upstream surfaces as `IncompleteDocument` here.
#[instrument(skip_all, fields(state = %config.state))]
pub fn assemble(config: &StateConfig, prose: &GeneratedProse) -> Result<Document> {
    let rates = RateSchedule::for_state(config);
    let areas = ServiceArea::list_for(config);

    let sections = vec![
        section(SectionKind::Preamble, SectionBody::Prose(prose.preamble.clone())),
        section(SectionKind::Scope, SectionBody::Prose(scope_text(config))),
        section(
            SectionKind::Rates,
            SectionBody::Table {
                intro: non_blank(&prose.rates_narrative),
                headers: vec!["Service Type".into(), "Rate".into(), "Unit".into()],
                rows: rate_rows(&rates),
            },
        ),
        section(
            SectionKind::ServiceAreas,
            SectionBody::List {
                intro: non_blank(&prose.service_areas_narrative),
                items: areas,
            },
        ),
        section(
            SectionKind::PerformanceStandards,
            SectionBody::Prose(prose.performance_standards.clone()),
        ),
        section(SectionKind::Signatures, SectionBody::Prose(signature_block(config))),
    ];

    let document = Document { sections };
    document.validate()?;

    debug!(sections = document.sections.len(), "document assembled");
    Ok(document)
}

fn section(kind: SectionKind, body: SectionBody) -> ContractSection {
    ContractSection {
        kind,
        title: kind.title().to_string(),
        body,
    }
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Rate schedule rows in schedule order, formatted for display.
fn rate_rows(rates: &RateSchedule) -> Vec<Vec<String>> {
    rates
        .entries
        .iter()
        .map(|entry| {
            vec![
                entry.service_type.clone(),
                format!("${:.2}", entry.rate),
                entry.unit.clone(),
            ]
        })
        .collect()
}

/// Deterministic scope-of-services text templated from the config.
fn scope_text(config: &StateConfig) -> String {
    let details = &config.provider_details;
    format!(
        "{provider} shall furnish non-emergency medical transportation services to \
         eligible residents of {state} on behalf of the {agency} for a term of {term}, \
         beginning {date}.\n\n\
         The provider shall maintain a fleet of {fleet} vehicles, employ no fewer than \
         {drivers} certified drivers, and operate {hours}. Services cover the following \
         regions: {regions}.",
        provider = config.provider_name,
        state = config.state,
        agency = config.health_agency,
        term = details.term,
        date = config.contract_date,
        fleet = details.fleet_size,
        drivers = details.driver_count,
        hours = details.operating_hours,
        regions = config.service_regions.join(", "),
    )
}

/// Templated signature block closing the contract.
fn signature_block(config: &StateConfig) -> String {
    format!(
        "IN WITNESS WHEREOF, the parties have executed this agreement as of \
         {date}.\n\n\
         ## For the Agency\n\
         {agency}\n{agency_city}, {state}\n\n\
         Signature: ________________________    Date: ____________\n\n\
         ## For the Provider\n\
         {provider}\n{provider_city}, {state}\n\n\
         Signature: ________________________    Date: ____________",
        date = config.contract_date,
        agency = config.health_agency,
        agency_city = config.agency_city,
        state = config.state,
        provider = config.provider_name,
        provider_city = config.provider_city,
    )
}
