//! PDF Core - Low-level PDF page writer
//!
//! This crate provides functionality for:
//! - Creating fixed-layout PDF documents page by page (sizes in points)
//! - Embedding TrueType fonts, or falling back to the standard Helvetica family
//! - Inserting text at specific coordinates
//! - Drawing lines, rectangles and ellipses
//! - Inserting images (JPEG, PNG)
//! - Rotated / translucent drawing groups
//!
//! All coordinates passed to [`PdfDocument`] use a top-left origin, the same
//! convention as the rest of the report engine. The conversion to the PDF
//! bottom-left origin happens in this crate only.
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{PdfDocument, Align};
//!
//! let mut doc = PdfDocument::new();
//! let page = doc.add_page(595.28, 841.89);
//! doc.set_standard_font(false, false, 12.0);
//! doc.insert_text("Hello, World!", page, 72.0, 72.0, Align::Left)?;
//! let bytes = doc.to_bytes()?;
//! ```

mod document;
mod font;
mod graphics;
mod image;
mod text;

pub use document::{Color, GraphicsState, PdfDocument};
pub use font::{FontData, StandardFont};
pub use graphics::{ellipse_operators, line_operators, rect_operators, PathStyle};
pub use image::{calculate_scaled_dimensions, get_dimensions, ImageDimensions, ImageScaleMode};
pub use text::{
    escape_literal, generate_text_operators, latin1_misses, simple_word_wrap, TextRenderContext,
};

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Font not found: {0}")]
    FontNotFound(String),

    #[error("Font already exists: {0}")]
    FontAlreadyExists(String),

    #[error("Failed to parse font: {0}")]
    FontParseError(String),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("Unbalanced graphics state on page {0}")]
    UnbalancedState(usize),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Text alignment options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Points per inch, the PDF user-space unit
pub const POINTS_PER_INCH: f64 = 72.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_default() {
        assert_eq!(Align::default(), Align::Left);
    }

    #[test]
    fn test_error_messages() {
        let err = PdfError::InvalidPage(3, 1);
        assert_eq!(err.to_string(), "Invalid page number: 3 (document has 1 pages)");
    }
}
