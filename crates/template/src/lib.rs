//! Report Template - fixed-layout report templates with data binding
//!
//! This crate provides:
//! - The template document model (millimetre geometry, JSON form)
//! - Data binding of element content to paths in a JSON data record
//! - Table track sizing
//! - Rendering to an interactive surface, to PDF and to PNG
//! - An element and template render cache
//!
//! # Example
//!
//! ```ignore
//! use report_template::{serializer, RenderEngine};
//!
//! let document = serializer::load_from_file("lab_report.json")?;
//! let data: serde_json::Value = serde_json::from_str(data_json)?;
//! let engine = RenderEngine::default();
//! let surface = engine.render_template(&document, Some(&data))?;
//! let pdf_bytes = engine.export_pdf(&document, Some(&data))?;
//! ```

pub mod binding;
pub mod cache;
pub mod config;
pub mod engine;
pub mod model;
pub mod render;
pub mod serializer;
pub mod table;
pub mod units;

pub use binding::{get_value, is_valid_path, set_value, BindingTable};
pub use cache::{CacheStats, RenderCache};
pub use config::{EngineConfig, FontSource};
pub use engine::{RenderEngine, RenderOutcome};
pub use model::*;
pub use render::{Diagnostic, RenderedNode, Surface};
pub use table::{TableLayout, TableLayoutCalculator, TableLimits};
pub use units::{Rect, UnitConverter};

use thiserror::Error;

/// Errors that can occur during template processing
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to parse template: {0}")]
    Parse(String),

    #[error("Invalid template: {0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] pdf_core::PdfError),

    #[error("Image error: {0}")]
    Image(String),

    #[error("Font error: {0}")]
    Font(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unsupported output: {0}")]
    UnsupportedOutput(String),

    #[error("Render task failed: {0}")]
    Task(String),
}

/// Result type for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;
