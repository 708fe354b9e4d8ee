//! Interactive surface backend
//!
//! Nodes are positioned in device pixels at the view DPI and multiplied by
//! the current zoom. The editor keeps one [`RenderedNode`] per element so it
//! can hit-test and edit elements in place.

use super::layout::{LayoutNode, Primitive};
use super::{Diagnostic, SurfaceBuilder};
use crate::model::{Color, PageSettings};
use crate::table::TableLayout;
use crate::units::{Rect, UnitConverter};
use crate::Result;
use serde::Serialize;
use std::sync::Arc;

/// An element on the interactive surface, in device pixels
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedNode {
    pub id: String,
    pub tag: &'static str,
    pub bounds: Rect,
    pub rotation: f64,
    pub z_index: i32,
    pub opacity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub display: Vec<Primitive>,
    /// Table tracks and cell frames in pixels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<TableLayout>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
    /// The unit-independent node this was built from
    #[serde(skip)]
    pub layout: Arc<LayoutNode>,
}

impl RenderedNode {
    pub fn from_layout(layout: Arc<LayoutNode>, conv: &UnitConverter) -> Self {
        Self {
            id: layout.id.clone(),
            tag: layout.tag,
            bounds: conv.rect_to_device(&layout.rect),
            rotation: layout.rotation,
            z_index: layout.z_index,
            opacity: layout.opacity,
            content: layout.content.clone(),
            display: layout.primitives.iter().map(|p| p.to_device(conv)).collect(),
            table: layout
                .table
                .as_ref()
                .map(|t| t.map(|pt| conv.point_to_device(pt))),
            diagnostics: layout.diagnostics.clone(),
            layout,
        }
    }

    /// Whether a surface point falls inside the node, rotation included
    pub fn contains(&self, x: f64, y: f64) -> bool {
        if self.rotation == 0.0 {
            return self.bounds.contains(x, y);
        }
        // rotate the point back into the node's unrotated frame
        let (cx, cy) = self.bounds.center();
        let (sin, cos) = (-self.rotation).to_radians().sin_cos();
        let (dx, dy) = (x - cx, y - cy);
        self.bounds
            .contains(cx + dx * cos - dy * sin, cy + dx * sin + dy * cos)
    }
}

/// A rendered page for the interactive designer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Surface {
    pub width: f64,
    pub height: f64,
    pub dpi: f64,
    pub zoom: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,
    /// Page margins in pixels
    pub content_rect: Rect,
    /// Nodes in paint order
    pub nodes: Vec<Arc<RenderedNode>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl Surface {
    pub fn node(&self, id: &str) -> Option<&Arc<RenderedNode>> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Topmost node under a surface point
    pub fn hit_test(&self, x: f64, y: f64) -> Option<&Arc<RenderedNode>> {
        self.nodes.iter().rev().find(|n| n.contains(x, y))
    }

    /// Every diagnostic, surface level first, then per node in paint order
    pub fn all_diagnostics(&self) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .chain(self.nodes.iter().flat_map(|n| n.diagnostics.iter()))
            .collect()
    }
}

/// Builds a [`Surface`]
///
/// Nodes rendered earlier can be pushed as they are with
/// [`SurfaceAssembler::push_rendered`]; fresh layout nodes go through
/// [`SurfaceBuilder::build_node`].
#[derive(Debug)]
pub struct SurfaceAssembler {
    conv: UnitConverter,
    surface: Option<Surface>,
    pending: Vec<Arc<RenderedNode>>,
    diagnostics: Vec<Diagnostic>,
}

impl SurfaceAssembler {
    pub fn new(conv: UnitConverter) -> Self {
        Self {
            conv,
            surface: None,
            pending: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn converter(&self) -> &UnitConverter {
        &self.conv
    }

    /// Convert a layout node without adding it
    pub fn render(&self, layout: Arc<LayoutNode>) -> Arc<RenderedNode> {
        Arc::new(RenderedNode::from_layout(layout, &self.conv))
    }

    pub fn push_rendered(&mut self, node: Arc<RenderedNode>) {
        self.pending.push(node);
    }

    pub fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Sort pushed nodes into paint order and produce the surface
    pub fn assemble(mut self, page: &PageSettings) -> Surface {
        let mut surface = empty_surface(&self.conv, page);
        self.pending.sort_by_key(|n| n.z_index);
        surface.nodes = self.pending;
        surface.diagnostics = self.diagnostics;
        surface
    }
}

fn empty_surface(conv: &UnitConverter, page: &PageSettings) -> Surface {
    let (width, height) = page.effective_size();
    Surface {
        width: conv.to_device(width),
        height: conv.to_device(height),
        dpi: conv.dpi,
        zoom: conv.scale,
        background: page.background,
        content_rect: conv.rect_to_device(&page.content_rect()),
        nodes: Vec::new(),
        diagnostics: Vec::new(),
    }
}

impl SurfaceBuilder for SurfaceAssembler {
    type Output = Surface;

    fn begin_page(&mut self, page: &PageSettings) -> Result<()> {
        self.surface = Some(empty_surface(&self.conv, page));
        Ok(())
    }

    fn build_node(&mut self, node: &LayoutNode) -> Result<()> {
        let rendered = self.render(Arc::new(node.clone()));
        self.pending.push(rendered);
        Ok(())
    }

    fn finish(mut self) -> Result<Surface> {
        let mut surface = self
            .surface
            .take()
            .ok_or_else(|| crate::TemplateError::Validation("no page started".into()))?;
        // build_page feeds nodes already in paint order
        surface.nodes = std::mem::take(&mut self.pending);
        surface.diagnostics = self.diagnostics;
        Ok(surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::build_page;
    use pretty_assertions::assert_eq;

    fn layout(id: &str, rect: Rect, z_index: i32, rotation: f64) -> LayoutNode {
        LayoutNode {
            id: id.to_string(),
            tag: "rectangle",
            rect,
            rotation,
            z_index,
            opacity: 1.0,
            content: None,
            primitives: Vec::new(),
            table: None,
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn test_a4_surface_size() {
        let page = PageSettings::default();
        let surface = build_page(
            SurfaceAssembler::new(UnitConverter::default()),
            &page,
            &Vec::<LayoutNode>::new(),
        )
        .unwrap();
        assert!((surface.width - 793.7).abs() < 0.05);
        assert!((surface.height - 1122.5).abs() < 0.05);
    }

    #[test]
    fn test_zoom_scales_bounds() {
        let page = PageSettings::default();
        let nodes = vec![layout("a", Rect::new(25.4, 25.4, 25.4, 12.7), 0, 0.0)];
        let surface = build_page(
            SurfaceAssembler::new(UnitConverter::new(96.0, 2.0)),
            &page,
            &nodes,
        )
        .unwrap();
        let bounds = surface.node("a").unwrap().bounds;
        assert!((bounds.x - 192.0).abs() < 1e-9);
        assert!((bounds.height - 96.0).abs() < 1e-9);
        assert_eq!(surface.zoom, 2.0);
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let page = PageSettings::default();
        let nodes = vec![
            layout("top", Rect::new(0.0, 0.0, 50.0, 50.0), 5, 0.0),
            layout("bottom", Rect::new(0.0, 0.0, 100.0, 100.0), 0, 0.0),
        ];
        let mut assembler = SurfaceAssembler::new(UnitConverter::new(25.4, 1.0));
        for node in &nodes {
            let rendered = assembler.render(Arc::new(node.clone()));
            assembler.push_rendered(rendered);
        }
        let surface = assembler.assemble(&page);

        assert_eq!(surface.nodes[0].id, "bottom");
        assert_eq!(surface.hit_test(10.0, 10.0).unwrap().id, "top");
        assert_eq!(surface.hit_test(80.0, 80.0).unwrap().id, "bottom");
        assert!(surface.hit_test(150.0, 150.0).is_none());
    }

    #[test]
    fn test_hit_test_follows_rotation() {
        let node = RenderedNode::from_layout(
            Arc::new(layout("bar", Rect::new(0.0, 45.0, 100.0, 10.0), 0, 90.0)),
            &UnitConverter::new(25.4, 1.0),
        );
        // a 100x10 bar rotated a quarter turn stands upright around (50, 50)
        assert!(node.contains(50.0, 5.0));
        assert!(!node.contains(5.0, 50.0));
    }
}
