//! Generators module - wage-slip documents from a Typst template.
//!
//! - `amount_words` - net pay in words (lakh/crore grouping)
//! - `layout` - the single layout/geometry description of a wage slip
//! - `wage_slip` - binds a record to the template and compiles it
//! - `engine` - Typst CLI document engine

pub mod amount_words;
pub mod common;
pub mod engine;
pub mod layout;
pub mod traits;
pub mod wage_slip;

pub use amount_words::{spell, spell_decimal, InvalidAmountError};
pub use engine::TypstRenderEngine;
pub use layout::{LayoutError, WageSlipLayout};
pub use traits::{DocumentEngine, Renderer};
pub use wage_slip::WageSlipGenerator;

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a [`DocumentEngine`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to create temporary directory: {0}")]
    TempDir(#[source] std::io::Error),
    #[error("failed to write Typst source: {0}")]
    WriteTypst(#[source] std::io::Error),
    #[error("Typst CLI execution failed: {0}")]
    TypstIo(#[source] std::io::Error),
    #[error("Typst CLI exited with status {code}: {stderr}")]
    TypstExit { code: i32, stderr: String },
    #[error("Typst CLI timed out after {0:?}")]
    Timeout(Duration),
    #[error("failed to read generated PDF: {0}")]
    ReadPdf(#[source] std::io::Error),
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to load wage-slip template {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum RenderErrorKind {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error("document engine failed: {0}")]
    Engine(#[from] EngineError),
    #[error("failed to write document: {0}")]
    WriteOutput(#[source] std::io::Error),
}

/// A wage slip could not be produced for one employee.
#[derive(Debug, Error)]
#[error("failed to render wage slip for {employee_id}: {kind}")]
pub struct RenderError {
    pub employee_id: String,
    #[source]
    pub kind: RenderErrorKind,
}

impl RenderError {
    pub fn new(employee_id: impl Into<String>, kind: impl Into<RenderErrorKind>) -> Self {
        Self {
            employee_id: employee_id.into(),
            kind: kind.into(),
        }
    }
}

/// Result of a successful wage-slip render.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub employee_id: String,
    pub filename: String,
    /// Transient local copy, removed once storage holds the document.
    pub local_path: PathBuf,
    pub pdf: Vec<u8>,
    pub month: String,
    pub net_pay_words: String,
}
