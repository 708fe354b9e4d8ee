//! Rendering
//!
//! Every element is resolved once into a [`LayoutNode`] (millimetres, with
//! bindings applied and tables laid out). Backends implement
//! [`SurfaceBuilder`] and only translate that display list into their own
//! unit space, so the interactive surface, the PDF export and the PNG export
//! cannot disagree about where an element sits.

pub mod barcode;
pub mod fonts;
pub mod layout;
pub mod paginated;
pub mod raster;
pub mod surface;

pub use fonts::FontBook;
pub use layout::{resolve_element, LayoutContext, LayoutNode, Primitive, TextLine};
pub use paginated::PdfBuilder;
pub use raster::RasterBuilder;
pub use surface::{RenderedNode, Surface, SurfaceAssembler};

use crate::model::PageSettings;
use crate::Result;
use serde::Serialize;
use std::borrow::Borrow;

/// Non-fatal condition met while rendering one element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Diagnostic {
    /// A binding did not resolve against the data; static content was used
    #[serde(rename_all = "camelCase")]
    BindingUnresolved { element_id: String, path: String },

    /// An image or font could not be loaded; a placeholder was drawn
    #[serde(rename_all = "camelCase")]
    ResourceUnavailable { element_id: String, reason: String },

    /// The value cannot be encoded in the barcode symbology
    #[serde(rename_all = "camelCase")]
    InvalidBarcode { element_id: String, reason: String },

    /// Element type unknown to this version; nothing was drawn
    #[serde(rename_all = "camelCase")]
    UnsupportedElement { element_id: String },
}

impl Diagnostic {
    pub fn element_id(&self) -> &str {
        match self {
            Diagnostic::BindingUnresolved { element_id, .. }
            | Diagnostic::ResourceUnavailable { element_id, .. }
            | Diagnostic::InvalidBarcode { element_id, .. }
            | Diagnostic::UnsupportedElement { element_id } => element_id,
        }
    }
}

/// A render backend
///
/// The dispatcher calls `begin_page` once, then `build_node` for every node
/// in paint order, then `finish`.
pub trait SurfaceBuilder {
    type Output;

    fn begin_page(&mut self, page: &PageSettings) -> Result<()>;

    fn build_node(&mut self, node: &LayoutNode) -> Result<()>;

    fn finish(self) -> Result<Self::Output>;
}

/// Indices of `nodes` in paint order: by z-index, ties in document order
pub fn paint_order<N: Borrow<LayoutNode>>(nodes: &[N]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..nodes.len()).collect();
    // sort_by_key is stable
    order.sort_by_key(|&i| nodes[i].borrow().z_index);
    order
}

/// Drive `builder` over one page of nodes
pub fn build_page<B, N>(mut builder: B, page: &PageSettings, nodes: &[N]) -> Result<B::Output>
where
    B: SurfaceBuilder,
    N: Borrow<LayoutNode>,
{
    builder.begin_page(page)?;
    for index in paint_order(nodes) {
        builder.build_node(nodes[index].borrow())?;
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::Rect;
    use pretty_assertions::assert_eq;

    fn node(id: &str, z_index: i32) -> LayoutNode {
        LayoutNode {
            id: id.to_string(),
            tag: "rectangle",
            rect: Rect::new(0.0, 0.0, 1.0, 1.0),
            rotation: 0.0,
            z_index,
            opacity: 1.0,
            content: None,
            primitives: Vec::new(),
            table: None,
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn test_paint_order_is_stable() {
        let nodes = vec![node("a", 2), node("b", 0), node("c", 2), node("d", -1), node("e", 0)];
        let ids: Vec<&str> = paint_order(&nodes)
            .into_iter()
            .map(|i| nodes[i].id.as_str())
            .collect();
        assert_eq!(ids, vec!["d", "b", "e", "a", "c"]);
    }

    #[test]
    fn test_diagnostic_json() {
        let d = Diagnostic::BindingUnresolved {
            element_id: "t1".into(),
            path: "A.B".into(),
        };
        assert_eq!(d.element_id(), "t1");
        assert_eq!(
            serde_json::to_value(&d).unwrap(),
            serde_json::json!({ "kind": "bindingUnresolved", "elementId": "t1", "path": "A.B" })
        );
    }
}
