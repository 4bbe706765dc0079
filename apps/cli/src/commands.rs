//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use contractforge_core::{ContractOutput, PipelineConfig, ProgressReporter, generate_contract};
use contractforge_document::Wkhtmltopdf;
use contractforge_generation::{GeneratorClient, GeneratorSettings};
use contractforge_shared::{AppConfig, StateConfig, init_config, load_config, resolve_api_key};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ContractForge — draft state transportation contracts as PDFs.
#[derive(Parser)]
#[command(
    name = "contractforge",
    version,
    about = "Generate state medical-transportation contract PDFs from configuration records.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Generate contract PDFs for one or more states.
    Generate {
        /// TOML file with `[[states]]` entries. Built-in samples when omitted.
        #[arg(long)]
        states: Option<PathBuf>,

        /// Only process these state abbreviations (repeatable).
        #[arg(short = 's', long = "state")]
        only: Vec<String>,

        /// Output directory for generated contracts.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Keep the intermediate HTML next to each PDF.
        #[arg(long)]
        keep_html: bool,

        /// Override the configured generation model.
        #[arg(long)]
        model: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "contractforge=info",
        1 => "contractforge=debug",
        _ => "contractforge=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Generate {
            states,
            only,
            out,
            keep_html,
            model,
        } => cmd_generate(states.as_deref(), &only, out, keep_html, model).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// generate
// ---------------------------------------------------------------------------

/// `[[states]]` file schema.
#[derive(serde::Deserialize)]
struct StatesFile {
    states: Vec<StateConfig>,
}

async fn cmd_generate(
    states_file: Option<&Path>,
    only: &[String],
    out: Option<PathBuf>,
    keep_html: bool,
    model: Option<String>,
) -> Result<()> {
    let mut config = load_config()?;
    if let Some(model) = model {
        config.generation.model = model;
    }

    // Validate credentials and the render tool before any contract work.
    let api_key = resolve_api_key(&config)?;

    let converter = Wkhtmltopdf::new(config.pdf.tool_path.clone());
    converter.probe()?;

    let states = load_states(states_file, only)?;
    if states.is_empty() {
        return Err(eyre!("no states selected"));
    }

    let settings = GeneratorSettings::from_config(&config.generation, api_key)?;
    let generator = GeneratorClient::new(settings)?;

    let pipeline_config = PipelineConfig {
        output_dir: out.unwrap_or_else(|| PathBuf::from(&config.defaults.output_dir)),
        keep_html: keep_html || config.defaults.keep_html,
    };

    info!(
        count = states.len(),
        output_dir = %pipeline_config.output_dir.display(),
        "starting contract generation"
    );

    let mut succeeded = 0usize;
    let mut failed: Vec<String> = Vec::new();

    for state in &states {
        println!("\nProcessing {}...", state.state);
        let reporter = CliProgress::new();

        match generate_contract(&pipeline_config, state, &generator, &converter, &reporter).await {
            Ok(output) => {
                succeeded += 1;
                println!("  Contract generated for {}", state.state);
                println!("  PDF:      {}", output.pdf_path.display());
                if let Some(html) = &output.html_path {
                    println!("  HTML:     {}", html.display());
                }
                println!("  Sections: {}", output.section_count);
                println!("  Time:     {:.1}s", output.elapsed.as_secs_f64());
            }
            Err(e) => {
                warn!(state = %state.state, error = %e, "contract generation failed");
                println!("  Failed: {e}");
                failed.push(state.state_abbrev.clone());
            }
        }
    }

    println!("\nGeneration Summary:");
    println!("  Successfully generated: {succeeded} contracts");
    if !failed.is_empty() {
        println!("  Failed states: {}", failed.join(", "));
        return Err(eyre!(
            "{} of {} contracts failed: {}",
            failed.len(),
            states.len(),
            failed.join(", ")
        ));
    }
    println!("  Contracts saved in: {}", pipeline_config.output_dir.display());

    Ok(())
}

/// Load state records from a `[[states]]` TOML file, or fall back to the
/// built-in samples, then apply the `--state` filter.
fn load_states(states_file: Option<&Path>, only: &[String]) -> Result<Vec<StateConfig>> {
    let mut states = match states_file {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .map_err(|e| eyre!("cannot read states file '{}': {e}", path.display()))?;
            let parsed: StatesFile = toml::from_str(&content)
                .map_err(|e| eyre!("invalid states file '{}': {e}", path.display()))?;
            parsed.states
        }
        None => StateConfig::samples(),
    };

    if !only.is_empty() {
        let wanted: Vec<String> = only.iter().map(|s| s.to_uppercase()).collect();
        states.retain(|s| wanted.contains(&s.state_abbrev.to_uppercase()));

        for abbrev in &wanted {
            if !states.iter().any(|s| s.state_abbrev.eq_ignore_ascii_case(abbrev)) {
                return Err(eyre!("state '{abbrev}' not found in the states file"));
            }
        }
    }

    Ok(states)
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn section_generated(&self, kind: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Generated [{current}/{total}] {kind}"));
    }

    fn done(&self, _output: &ContractOutput) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_samples_load_when_no_file_given() {
        let states = load_states(None, &[]).unwrap();
        assert!(states.len() >= 3);
    }

    #[test]
    fn state_filter_is_case_insensitive() {
        let states = load_states(None, &["va".to_string()]).unwrap();
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].state, "Virginia");
    }

    #[test]
    fn unknown_state_filter_errors() {
        let err = load_states(None, &["ZZ".to_string()]).unwrap_err();
        assert!(err.to_string().contains("ZZ"));
    }
}
