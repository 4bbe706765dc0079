//! End-to-end contract pipeline: config → prompts → generated prose →
//! assembled document → HTML → PDF.
//!
//! Strictly sequential, one contract per call. Nothing durable is written
//! until PDF conversion succeeds.

use std::path::PathBuf;
use std::time::Instant;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};

use contractforge_document::{GeneratedProse, PdfConverter, RenderMeta};
use contractforge_generation::{PromptKind, TextGenerator, build_prompt, placeholder_text};
use contractforge_shared::{ContractForgeError, Result, SectionKind, StateConfig};

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory receiving generated contracts (created if absent).
    pub output_dir: PathBuf,
    /// Also keep the intermediate HTML next to the PDF.
    pub keep_html: bool,
}

/// Result of one successfully generated contract.
#[derive(Debug)]
pub struct ContractOutput {
    pub pdf_path: PathBuf,
    /// Set when `keep_html` was requested.
    pub html_path: Option<PathBuf>,
    pub section_count: usize,
    /// SHA-256 of the rendered HTML, for the run summary.
    pub html_sha256: String,
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each generated section.
    fn section_generated(&self, kind: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, output: &ContractOutput);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn section_generated(&self, _kind: &str, _current: usize, _total: usize) {}
    fn done(&self, _output: &ContractOutput) {}
}

/// Run the full pipeline for one state.
///
/// All four prompts are built before the first network call, so
/// configuration errors always surface without touching the collaborator.
/// A section whose generation comes back empty gets the deterministic
/// placeholder; an unavailable collaborator aborts the run.
#[instrument(skip_all, fields(state = %state.state))]
pub async fn generate_contract<G, P>(
    config: &PipelineConfig,
    state: &StateConfig,
    generator: &G,
    converter: &P,
    progress: &dyn ProgressReporter,
) -> Result<ContractOutput>
where
    G: TextGenerator + Sync,
    P: PdfConverter + Sync,
{
    let start = Instant::now();

    // --- Phase 1: prompts (no side effects) ---
    progress.phase("Building prompts");
    let prompts: Vec<(PromptKind, String)> = PromptKind::ALL
        .iter()
        .map(|kind| build_prompt(*kind, state).map(|p| (*kind, p)))
        .collect::<Result<_>>()?;

    // --- Phase 2: generation ---
    progress.phase("Generating contract prose");
    let total = prompts.len();
    let mut texts = Vec::with_capacity(total);

    for (i, (kind, prompt)) in prompts.iter().enumerate() {
        let text = generate_section(generator, *kind, prompt).await?;
        progress.section_generated(kind.as_str(), i + 1, total);
        texts.push(text);
    }

    let mut texts = texts.into_iter();
    let prose = GeneratedProse {
        preamble: texts.next().unwrap_or_default(),
        rates_narrative: texts.next().unwrap_or_default(),
        service_areas_narrative: texts.next().unwrap_or_default(),
        performance_standards: texts.next().unwrap_or_default(),
    };

    // --- Phase 3: assembly ---
    progress.phase("Assembling document");
    let document = contractforge_document::assemble(state, &prose)?;

    // --- Phase 4: render ---
    progress.phase("Rendering PDF");
    let now = Utc::now();
    let meta = RenderMeta {
        title: format!("Transportation Services Contract - {}", state.state),
        generated_on: now.format("%B %d, %Y").to_string(),
    };
    let html = contractforge_document::render_html(&document, &meta);

    let html_sha256 = {
        let mut hasher = Sha256::new();
        hasher.update(html.as_bytes());
        format!("{:x}", hasher.finalize())
    };

    std::fs::create_dir_all(&config.output_dir)
        .map_err(|e| ContractForgeError::io(&config.output_dir, e))?;

    let basename = state.output_basename(&now.format("%Y%m%d").to_string());
    let pdf_path = config.output_dir.join(format!("{basename}.pdf"));

    converter.convert(&html, &pdf_path)?;

    // Written only after the PDF exists, so a failed run leaves nothing.
    let html_path = if config.keep_html {
        let path = config.output_dir.join(format!("{basename}.html"));
        std::fs::write(&path, &html).map_err(|e| ContractForgeError::io(&path, e))?;
        Some(path)
    } else {
        None
    };

    let output = ContractOutput {
        pdf_path,
        html_path,
        section_count: document.sections.len(),
        html_sha256,
        elapsed: start.elapsed(),
    };

    progress.done(&output);

    info!(
        pdf = %output.pdf_path.display(),
        sections = output.section_count,
        elapsed_ms = output.elapsed.as_millis(),
        "contract generated"
    );

    Ok(output)
}

/// Generate one section's prose, substituting the placeholder when the
/// collaborator answers with nothing usable.
async fn generate_section<G: TextGenerator + Sync>(
    generator: &G,
    kind: PromptKind,
    prompt: &str,
) -> Result<String> {
    match generator.generate(prompt, kind.target_tokens()).await {
        Ok(text) => Ok(text),
        Err(ContractForgeError::GenerationEmpty(reason)) => {
            warn!(kind = kind.as_str(), %reason, "empty generation, using placeholder");
            Ok(placeholder_text(section_title_for(kind)))
        }
        Err(other) => Err(other),
    }
}

/// Canonical section title owning a prompt kind's prose.
fn section_title_for(kind: PromptKind) -> &'static str {
    match kind {
        PromptKind::Preamble => SectionKind::Preamble.title(),
        PromptKind::RatesNarrative => SectionKind::Rates.title(),
        PromptKind::ServiceAreasNarrative => SectionKind::ServiceAreas.title(),
        PromptKind::PerformanceStandards => SectionKind::PerformanceStandards.title(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cf-pipeline-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn virginia() -> StateConfig {
        StateConfig::samples()
            .into_iter()
            .find(|s| s.state_abbrev == "VA")
            .unwrap()
    }

    fn pipeline_config(dir: &Path, keep_html: bool) -> PipelineConfig {
        PipelineConfig {
            output_dir: dir.to_path_buf(),
            keep_html,
        }
    }

    /// Stub collaborator returning a fixed string per prompt, counting calls.
    struct StubGenerator {
        calls: AtomicUsize,
        empty_for_performance: bool,
    }

    impl StubGenerator {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                empty_for_performance: false,
            }
        }
    }

    impl TextGenerator for StubGenerator {
        async fn generate(&self, prompt: &str, _max_tokens: u32) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.empty_for_performance && prompt.contains("performance standards") {
                return Err(ContractForgeError::GenerationEmpty("stub".into()));
            }
            Ok(format!("Stub prose for: {}", &prompt[..40.min(prompt.len())]))
        }
    }

    /// Stub converter writing a marker file.
    struct StubConverter;

    impl PdfConverter for StubConverter {
        fn convert(&self, _html: &str, output_path: &Path) -> Result<()> {
            std::fs::write(output_path, b"%PDF-stub")
                .map_err(|e| ContractForgeError::io(output_path, e))
        }
    }

    /// Stub converter signaling the external tool is absent.
    struct MissingToolConverter;

    impl PdfConverter for MissingToolConverter {
        fn convert(&self, _html: &str, _output_path: &Path) -> Result<()> {
            Err(ContractForgeError::RenderToolMissing(
                "stub: tool not found".into(),
            ))
        }
    }

    #[tokio::test]
    async fn end_to_end_produces_six_section_contract() {
        let dir = temp_dir();
        let generator = StubGenerator::new();

        let output = generate_contract(
            &pipeline_config(&dir, true),
            &virginia(),
            &generator,
            &StubConverter,
            &SilentProgress,
        )
        .await
        .unwrap();

        assert_eq!(output.section_count, 6);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 4);
        assert!(output.pdf_path.exists());
        assert_eq!(output.html_sha256.len(), 64);

        // Region names appear as list items in the kept HTML.
        let html = std::fs::read_to_string(output.html_path.unwrap()).unwrap();
        assert!(html.contains("<li><strong>Fairfax County</strong>"));
        assert!(html.contains("<li><strong>Richmond City</strong>"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn missing_regions_fail_before_any_network_call() {
        let dir = temp_dir();
        let mut state = virginia();
        state.service_regions.clear();
        let generator = StubGenerator::new();

        let err = generate_contract(
            &pipeline_config(&dir, false),
            &state,
            &generator,
            &StubConverter,
            &SilentProgress,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ContractForgeError::Configuration { .. }));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn empty_generation_is_replaced_by_placeholder() {
        let dir = temp_dir();
        let generator = StubGenerator {
            calls: AtomicUsize::new(0),
            empty_for_performance: true,
        };

        let output = generate_contract(
            &pipeline_config(&dir, true),
            &virginia(),
            &generator,
            &StubConverter,
            &SilentProgress,
        )
        .await
        .unwrap();

        assert_eq!(output.section_count, 6);
        let html = std::fs::read_to_string(output.html_path.unwrap()).unwrap();
        assert!(html.contains("Standard Performance Standards provisions apply"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn unavailable_generation_aborts_the_run() {
        let dir = temp_dir();

        struct DownGenerator;
        impl TextGenerator for DownGenerator {
            async fn generate(&self, _prompt: &str, _max_tokens: u32) -> Result<String> {
                Err(ContractForgeError::GenerationUnavailable("stub: down".into()))
            }
        }

        let err = generate_contract(
            &pipeline_config(&dir, false),
            &virginia(),
            &DownGenerator,
            &StubConverter,
            &SilentProgress,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ContractForgeError::GenerationUnavailable(_)));
        assert!(std::fs::read_dir(&dir).unwrap().next().is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn missing_render_tool_writes_nothing() {
        let dir = temp_dir();

        let err = generate_contract(
            &pipeline_config(&dir, true),
            &virginia(),
            &StubGenerator::new(),
            &MissingToolConverter,
            &SilentProgress,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ContractForgeError::RenderToolMissing(_)));
        assert!(std::fs::read_dir(&dir).unwrap().next().is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
