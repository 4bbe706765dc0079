//! PDF conversion via an external HTML-to-PDF tool.
//!
//! The converter is a narrow collaborator contract so the pipeline can be
//! tested with deterministic stand-ins. The shipped implementation spawns
//! `wkhtmltopdf` (or a configured equivalent) as a subprocess.

use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, info, instrument};

use contractforge_shared::{ContractForgeError, Result};

/// Narrow contract for the HTML-to-PDF collaborator: HTML in, a PDF written
/// at `output_path` out. Nothing durable may be left behind on failure.
pub trait PdfConverter {
    fn convert(&self, html: &str, output_path: &Path) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Wkhtmltopdf
// ---------------------------------------------------------------------------

/// Converter backed by the `wkhtmltopdf` command-line tool.
pub struct Wkhtmltopdf {
    tool_path: String,
}

impl Wkhtmltopdf {
    pub fn new(tool_path: impl Into<String>) -> Self {
        Self {
            tool_path: tool_path.into(),
        }
    }

    /// Check that the tool exists and runs before any contract work starts.
    pub fn probe(&self) -> Result<()> {
        let output = Command::new(&self.tool_path)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => {
                debug!(tool = %self.tool_path, "PDF tool found");
                Ok(())
            }
            Ok(status) => Err(ContractForgeError::RenderToolMissing(format!(
                "`{} --version` exited with {status}",
                self.tool_path
            ))),
            Err(e) => Err(tool_error(&self.tool_path, e)),
        }
    }
}

impl PdfConverter for Wkhtmltopdf {
    #[instrument(skip(self, html), fields(output = %output_path.display()))]
    fn convert(&self, html: &str, output_path: &Path) -> Result<()> {
        let temp_html = temp_html_path(output_path);

        std::fs::write(&temp_html, html).map_err(|e| ContractForgeError::io(&temp_html, e))?;

        let result = Command::new(&self.tool_path)
            .arg("--quiet")
            .arg(&temp_html)
            .arg(output_path)
            .status();

        // The temp file must not survive either outcome.
        let _ = std::fs::remove_file(&temp_html);

        match result {
            Ok(status) if status.success() => {
                info!(output = %output_path.display(), "PDF written");
                Ok(())
            }
            Ok(status) => {
                let _ = std::fs::remove_file(output_path);
                Err(ContractForgeError::RenderToolMissing(format!(
                    "{} exited with {status}",
                    self.tool_path
                )))
            }
            Err(e) => {
                let _ = std::fs::remove_file(output_path);
                Err(tool_error(&self.tool_path, e))
            }
        }
    }
}

fn tool_error(tool: &str, e: std::io::Error) -> ContractForgeError {
    if e.kind() == ErrorKind::NotFound {
        ContractForgeError::RenderToolMissing(format!(
            "`{tool}` not found on PATH. Install wkhtmltopdf or set [pdf] tool_path."
        ))
    } else {
        ContractForgeError::RenderToolMissing(format!("failed to run `{tool}`: {e}"))
    }
}

/// Temp HTML path beside the output: `.<stem>.html.tmp` in the same directory.
fn temp_html_path(output_path: &Path) -> std::path::PathBuf {
    let stem = output_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "contract".to_string());
    output_path.with_file_name(format!(".{stem}.html.tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cf-pdf-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn temp_html_path_is_hidden_sibling() {
        let out = Path::new("/tmp/contracts/Transportation_Contract_VA_20250115.pdf");
        let temp = temp_html_path(out);
        assert_eq!(
            temp,
            Path::new("/tmp/contracts/.Transportation_Contract_VA_20250115.html.tmp")
        );
    }

    #[test]
    fn missing_tool_probe_is_render_tool_missing() {
        let converter = Wkhtmltopdf::new("cf-test-no-such-tool-xyz");
        let err = converter.probe().unwrap_err();
        assert!(matches!(err, ContractForgeError::RenderToolMissing(_)));
        assert!(err.to_string().contains("cf-test-no-such-tool-xyz"));
    }

    #[test]
    fn missing_tool_convert_leaves_no_files() {
        let dir = temp_dir();
        let output = dir.join("contract.pdf");

        let converter = Wkhtmltopdf::new("cf-test-no-such-tool-xyz");
        let err = converter.convert("<html></html>", &output).unwrap_err();

        assert!(matches!(err, ContractForgeError::RenderToolMissing(_)));
        assert!(!output.exists());
        assert!(!temp_html_path(&output).exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
