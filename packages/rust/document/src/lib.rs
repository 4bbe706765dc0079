//! Document assembly and rendering for ContractForge.
//!
//! Merges generated prose with rate tables and service-area listings into
//! the canonical contract [`contractforge_shared::Document`], serializes it
//! to HTML, and converts the HTML to PDF via an external tool.

pub mod assembler;
pub mod html;
pub mod pdf;

pub use assembler::{GeneratedProse, assemble};
pub use html::{RenderMeta, escape_html, render_html};
pub use pdf::{PdfConverter, Wkhtmltopdf};
