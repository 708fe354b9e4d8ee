//! Backend-agnostic element layout
//!
//! [`resolve_element`] is the one place that knows about element variants.
//! It applies bindings, lays out tables, encodes barcodes, loads images and
//! emits a display list of [`Primitive`]s. Lengths in a layout node are
//! millimetres; font sizes and stroke widths stay in points until a backend
//! maps the node into its own unit space.

use super::barcode::{self, Symbol};
use super::Diagnostic;
use crate::binding::BindingTable;
use crate::model::{
    AutoNumberElement, BarcodeElement, Color, ElementKind, ElementNode, FontSpec,
    HorizontalAlign, ImageElement, LabelInputBoxElement, SignatureElement, Stroke,
    Symbology, TableElement, TemplateDocument, VerticalAlign,
};
use crate::table::{cell_font_size, TableLayout, TableLayoutCalculator, TableLimits};
use crate::table::{CHAR_WIDTH_FACTOR, LINE_HEIGHT_FACTOR};
use crate::units::{point_to_mm, Rect, UnitConverter};
use base64::Engine as _;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Baseline offset from the top of a line box, as a multiple of the font size
pub const BASELINE_FACTOR: f64 = 0.9;

/// One line of text anchored at `x` according to the primitive's alignment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLine {
    pub text: String,
    pub x: f64,
    pub baseline: f64,
}

/// Drawing instruction
///
/// In a [`LayoutNode`] lengths are millimetres while `font.size` and stroke
/// widths are points. After [`Primitive::to_device`] every length, font
/// sizes and stroke widths included, is in device units.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Primitive {
    Rect {
        rect: Rect,
        radius: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        stroke: Option<Stroke>,
        #[serde(skip_serializing_if = "Option::is_none")]
        fill: Option<Color>,
    },
    Ellipse {
        rect: Rect,
        #[serde(skip_serializing_if = "Option::is_none")]
        stroke: Option<Stroke>,
        #[serde(skip_serializing_if = "Option::is_none")]
        fill: Option<Color>,
    },
    Line {
        from: (f64, f64),
        to: (f64, f64),
        stroke: Stroke,
    },
    Text {
        lines: Vec<TextLine>,
        font: FontSpec,
        align: HorizontalAlign,
    },
    Image {
        rect: Rect,
        #[serde(skip)]
        data: Arc<[u8]>,
    },
    /// Stand-in for content that could not be produced
    Placeholder { rect: Rect, label: String },
}

impl Primitive {
    /// Map into the unit space of `conv`
    pub fn to_device(&self, conv: &UnitConverter) -> Primitive {
        let len = |mm: f64| conv.to_device(mm);
        let pt = |pt: f64| conv.point_to_device(pt);
        let stroke = |s: &Stroke| Stroke {
            color: s.color,
            width: pt(s.width),
            dash: s.dash.as_ref().map(|d| d.iter().map(|&v| pt(v)).collect()),
        };
        match self {
            Primitive::Rect {
                rect,
                radius,
                stroke: s,
                fill,
            } => Primitive::Rect {
                rect: conv.rect_to_device(rect),
                radius: len(*radius),
                stroke: s.as_ref().map(stroke),
                fill: *fill,
            },
            Primitive::Ellipse {
                rect,
                stroke: s,
                fill,
            } => Primitive::Ellipse {
                rect: conv.rect_to_device(rect),
                stroke: s.as_ref().map(stroke),
                fill: *fill,
            },
            Primitive::Line { from, to, stroke: s } => Primitive::Line {
                from: (len(from.0), len(from.1)),
                to: (len(to.0), len(to.1)),
                stroke: stroke(s),
            },
            Primitive::Text { lines, font, align } => Primitive::Text {
                lines: lines
                    .iter()
                    .map(|l| TextLine {
                        text: l.text.clone(),
                        x: len(l.x),
                        baseline: len(l.baseline),
                    })
                    .collect(),
                font: FontSpec {
                    size: pt(font.size),
                    ..font.clone()
                },
                align: *align,
            },
            Primitive::Image { rect, data } => Primitive::Image {
                rect: conv.rect_to_device(rect),
                data: Arc::clone(data),
            },
            Primitive::Placeholder { rect, label } => Primitive::Placeholder {
                rect: conv.rect_to_device(rect),
                label: label.clone(),
            },
        }
    }
}

/// Resolved element, ready for any backend
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutNode {
    pub id: String,
    pub tag: &'static str,
    /// Element box in millimetres
    pub rect: Rect,
    /// Clockwise degrees about the centre of `rect`
    pub rotation: f64,
    pub z_index: i32,
    pub opacity: f64,
    /// Resolved display text, for elements that show one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub primitives: Vec<Primitive>,
    /// Table geometry in points, relative to the element origin
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<TableLayout>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Everything element resolution reads besides the element itself
#[derive(Debug, Clone, Copy)]
pub struct LayoutContext<'a> {
    pub data: Option<&'a Value>,
    pub bindings: &'a BindingTable,
    /// Auto-number values by element id
    pub auto_numbers: &'a HashMap<String, i64>,
    /// Base directory for relative image paths
    pub resource_root: Option<&'a Path>,
    pub table_limits: TableLimits,
}

/// Value of every auto-number element: `start + step * ordinal`, where the
/// ordinal counts the earlier elements of the same sequence in document order
pub fn auto_number_values(document: &TemplateDocument) -> HashMap<String, i64> {
    let mut ordinals: HashMap<&str, i64> = HashMap::new();
    let mut values = HashMap::new();
    for element in &document.elements {
        if let ElementKind::AutoNumber(auto) = &element.kind {
            let ordinal = ordinals.entry(auto.sequence.as_deref().unwrap_or("")).or_insert(0);
            values.insert(
                element.id.clone(),
                auto.start.saturating_add(auto.step.saturating_mul(*ordinal)),
            );
            *ordinal += 1;
        }
    }
    values
}

enum Bound {
    None,
    Resolved(String),
    Unresolved(String),
}

fn bound_text(id: &str, ctx: &LayoutContext) -> Bound {
    let Some(binding) = ctx.bindings.get(id) else {
        return Bound::None;
    };
    match ctx.data.and_then(|data| binding.evaluate(data)) {
        Some(text) => Bound::Resolved(text),
        None => Bound::Unresolved(binding.path.as_str().to_string()),
    }
}

/// Resolved binding values an element's output depends on
///
/// Includes table cell bindings and the auto-number value, so that a change
/// in the data changes the element's cache fingerprint.
pub fn bound_values(element: &ElementNode, ctx: &LayoutContext) -> Vec<Option<String>> {
    let mut values = Vec::new();
    if let Bound::Resolved(text) = bound_text(&element.id, ctx) {
        values.push(Some(text));
    } else {
        values.push(None);
    }
    if let ElementKind::Table(table) = &element.kind {
        for cell in &table.cells {
            values.push(
                cell.binding
                    .as_ref()
                    .zip(ctx.data)
                    .and_then(|(b, data)| crate::binding::get_value(data, &b.path, b.format.as_deref())),
            );
        }
    }
    if let Some(n) = ctx.auto_numbers.get(&element.id) {
        values.push(Some(n.to_string()));
    }
    values
}

/// Lay out one element
///
/// Returns `None` for invisible elements and for element types this version
/// does not know.
pub fn resolve_element(element: &ElementNode, ctx: &LayoutContext) -> Option<LayoutNode> {
    if !element.visible {
        return None;
    }

    let mut builder = NodeBuilder::new(element);
    if let Some(background) = element.style.background {
        builder.push(Primitive::Rect {
            rect: element.rect(),
            radius: 0.0,
            stroke: None,
            fill: Some(background),
        });
    }

    match &element.kind {
        ElementKind::Text(text) => {
            let content = builder.text_or(ctx, &text.content);
            builder.text_block(
                element.rect(),
                &content,
                &text.font,
                text.align,
                text.vertical_align,
                text.word_wrap,
            );
            builder.content = Some(content);
        }
        ElementKind::Label(label) => {
            builder.text_block(
                element.rect(),
                &label.text,
                &label.font,
                label.align,
                label.vertical_align,
                true,
            );
            builder.content = Some(label.text.clone());
        }
        ElementKind::Image(image) => builder.image(ctx, image),
        ElementKind::Line(line) => {
            let rect = element.rect();
            builder.push(Primitive::Line {
                from: (rect.x + line.start.x, rect.y + line.start.y),
                to: (rect.x + line.end.x, rect.y + line.end.y),
                stroke: line.stroke.clone(),
            });
        }
        ElementKind::Rectangle(shape) => {
            let (stroke, fill) = outline_or_default(&shape.stroke, shape.fill);
            builder.push(Primitive::Rect {
                rect: element.rect(),
                radius: shape.corner_radius.max(0.0),
                stroke,
                fill,
            });
        }
        ElementKind::Ellipse(shape) => {
            let (stroke, fill) = outline_or_default(&shape.stroke, shape.fill);
            builder.push(Primitive::Ellipse {
                rect: element.rect(),
                stroke,
                fill,
            });
        }
        ElementKind::Barcode(code) => builder.barcode(ctx, code),
        ElementKind::Signature(signature) => builder.signature(ctx, signature),
        ElementKind::AutoNumber(auto) => builder.auto_number(ctx, auto),
        ElementKind::Table(table) => builder.table(ctx, table),
        ElementKind::LabelInputBox(field) => builder.label_input_box(ctx, field),
        ElementKind::Unsupported => {
            log::debug!("Skipping element '{}' of unsupported type", element.id);
            return None;
        }
    }

    if let Some(border) = &element.style.border {
        builder.push(Primitive::Rect {
            rect: element.rect(),
            radius: 0.0,
            stroke: Some(border.clone()),
            fill: None,
        });
    }

    Some(builder.finish())
}

/// Shapes with neither outline nor fill get the default outline
fn outline_or_default(stroke: &Option<Stroke>, fill: Option<Color>) -> (Option<Stroke>, Option<Color>) {
    match (stroke, fill) {
        (None, None) => (Some(Stroke::default()), None),
        (stroke, fill) => (stroke.clone(), fill),
    }
}

struct NodeBuilder<'e> {
    element: &'e ElementNode,
    primitives: Vec<Primitive>,
    content: Option<String>,
    table: Option<TableLayout>,
    diagnostics: Vec<Diagnostic>,
}

impl<'e> NodeBuilder<'e> {
    fn new(element: &'e ElementNode) -> Self {
        Self {
            element,
            primitives: Vec::new(),
            content: None,
            table: None,
            diagnostics: Vec::new(),
        }
    }

    fn push(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    fn id(&self) -> String {
        self.element.id.clone()
    }

    /// Bound text, or `fallback` when unbound or unresolved
    fn text_or(&mut self, ctx: &LayoutContext, fallback: &str) -> String {
        self.bound(ctx).unwrap_or_else(|| fallback.to_string())
    }

    fn bound(&mut self, ctx: &LayoutContext) -> Option<String> {
        match bound_text(&self.element.id, ctx) {
            Bound::None => None,
            Bound::Resolved(text) => Some(text),
            Bound::Unresolved(path) => {
                if ctx.data.is_some() {
                    log::warn!(
                        "Binding '{}' of element '{}' did not resolve",
                        path,
                        self.element.id
                    );
                    self.diagnostics.push(Diagnostic::BindingUnresolved {
                        element_id: self.id(),
                        path,
                    });
                }
                None
            }
        }
    }

    fn unavailable(&mut self, rect: Rect, label: &str, reason: String) {
        log::warn!("Element '{}': {}", self.element.id, reason);
        self.diagnostics.push(Diagnostic::ResourceUnavailable {
            element_id: self.id(),
            reason,
        });
        self.push(Primitive::Placeholder {
            rect,
            label: label.to_string(),
        });
    }

    fn text_block(
        &mut self,
        rect: Rect,
        text: &str,
        font: &FontSpec,
        align: HorizontalAlign,
        vertical_align: VerticalAlign,
        wrap: bool,
    ) {
        if text.is_empty() {
            return;
        }
        self.push(text_primitive(rect, 0.0, text, font, align, vertical_align, wrap));
    }

    fn image(&mut self, ctx: &LayoutContext, image: &ImageElement) {
        let rect = self.element.rect();
        let source = match self.bound(ctx) {
            Some(value) => Some(ImageSource::Bound(value)),
            None => image
                .data
                .clone()
                .map(ImageSource::Base64)
                .or_else(|| image.path.clone().map(ImageSource::Path)),
        };
        let Some(source) = source else {
            self.push(Primitive::Placeholder {
                rect,
                label: "image".to_string(),
            });
            return;
        };

        match source.load(ctx.resource_root) {
            Ok((data, dims)) => {
                let (width, height) = pdf_core::calculate_scaled_dimensions(
                    dims.width,
                    dims.height,
                    rect.width,
                    rect.height,
                    image.scale_mode.into(),
                );
                self.push(Primitive::Image {
                    rect: Rect::new(rect.x, rect.y, width, height),
                    data,
                });
            }
            Err(reason) => self.unavailable(rect, "image", reason),
        }
    }

    fn barcode(&mut self, ctx: &LayoutContext, code: &BarcodeElement) {
        let rect = self.element.rect();
        let value = self.text_or(ctx, &code.value);

        let symbol = match barcode::encode(code.symbology, &value) {
            Ok(symbol) => symbol,
            Err(reason) => {
                log::warn!("Element '{}': {}", self.element.id, reason);
                self.diagnostics.push(Diagnostic::InvalidBarcode {
                    element_id: self.id(),
                    reason,
                });
                self.push(Primitive::Placeholder {
                    rect,
                    label: "barcode".to_string(),
                });
                self.content = Some(value);
                return;
            }
        };

        let text_band = if code.show_text && code.symbology != Symbology::Qr {
            point_to_mm(code.font.size * LINE_HEIGHT_FACTOR)
        } else {
            0.0
        };
        let bars_height = (rect.height - text_band).max(0.0);
        let dark = Some(Color::BLACK);

        match symbol {
            Symbol::Linear(modules) if !modules.is_empty() => {
                let module = rect.width / modules.len() as f64;
                for (start, len) in Symbol::dark_runs(&modules) {
                    self.push(Primitive::Rect {
                        rect: Rect::new(
                            rect.x + start as f64 * module,
                            rect.y,
                            len as f64 * module,
                            bars_height,
                        ),
                        radius: 0.0,
                        stroke: None,
                        fill: dark,
                    });
                }
            }
            Symbol::Linear(_) => {}
            Symbol::Matrix { width, modules } => {
                let side = rect.width.min(rect.height);
                let module = side / width.max(1) as f64;
                let x0 = rect.x + (rect.width - side) / 2.0;
                let y0 = rect.y + (rect.height - side) / 2.0;
                for (row, cells) in modules.chunks(width.max(1)).enumerate() {
                    for (start, len) in Symbol::dark_runs(cells) {
                        self.push(Primitive::Rect {
                            rect: Rect::new(
                                x0 + start as f64 * module,
                                y0 + row as f64 * module,
                                len as f64 * module,
                                module,
                            ),
                            radius: 0.0,
                            stroke: None,
                            fill: dark,
                        });
                    }
                }
            }
        }

        if text_band > 0.0 {
            let band = Rect::new(rect.x, rect.y + bars_height, rect.width, text_band);
            self.push(text_primitive(
                band,
                0.0,
                &value,
                &code.font,
                HorizontalAlign::Center,
                VerticalAlign::Middle,
                false,
            ));
        }
        self.content = Some(value);
    }

    fn signature(&mut self, ctx: &LayoutContext, signature: &SignatureElement) {
        let rect = self.element.rect();
        let caption_band = match &signature.caption {
            Some(caption) if !caption.is_empty() => {
                point_to_mm(signature.font.size * LINE_HEIGHT_FACTOR)
            }
            _ => 0.0,
        };
        let line_y = rect.bottom() - caption_band;
        let area = Rect::new(rect.x, rect.y, rect.width, (line_y - rect.y).max(0.0));

        let data = self.bound(ctx).or_else(|| signature.data.clone());
        if let Some(data) = data {
            match ImageSource::Base64(data).load(ctx.resource_root) {
                Ok((bytes, dims)) => {
                    let (width, height) = pdf_core::calculate_scaled_dimensions(
                        dims.width,
                        dims.height,
                        area.width,
                        area.height,
                        pdf_core::ImageScaleMode::FitBox,
                    );
                    self.push(Primitive::Image {
                        rect: Rect::new(
                            area.x + (area.width - width) / 2.0,
                            area.bottom() - height,
                            width,
                            height,
                        ),
                        data: bytes,
                    });
                }
                Err(reason) => self.unavailable(area, "signature", reason),
            }
        }

        self.push(Primitive::Line {
            from: (rect.x, line_y),
            to: (rect.right(), line_y),
            stroke: Stroke::default(),
        });

        if let Some(caption) = signature.caption.as_deref().filter(|c| !c.is_empty()) {
            let band = Rect::new(rect.x, line_y, rect.width, caption_band);
            self.push(text_primitive(
                band,
                0.0,
                caption,
                &signature.font,
                HorizontalAlign::Center,
                VerticalAlign::Middle,
                false,
            ));
        }
    }

    fn auto_number(&mut self, ctx: &LayoutContext, auto: &AutoNumberElement) {
        let number = match self.bound(ctx) {
            Some(bound) => bound,
            None => {
                let n = ctx
                    .auto_numbers
                    .get(&self.element.id)
                    .copied()
                    .unwrap_or(auto.start);
                format!("{:0width$}", n, width = auto.digits)
            }
        };
        let text = format!("{}{}{}", auto.prefix, number, auto.suffix);
        self.text_block(
            self.element.rect(),
            &text,
            &auto.font,
            auto.align,
            VerticalAlign::Middle,
            false,
        );
        self.content = Some(text);
    }

    fn table(&mut self, ctx: &LayoutContext, table: &TableElement) {
        let rect = self.element.rect();
        let cell_text = |cell: &crate::model::TableCell| {
            cell.binding
                .as_ref()
                .zip(ctx.data)
                .and_then(|(b, data)| {
                    crate::binding::get_value(data, &b.path, b.format.as_deref())
                })
                .unwrap_or_else(|| cell.content.clone())
        };

        let mut calculator = TableLayoutCalculator::new(ctx.table_limits);
        let layout = calculator.calculate(table, crate::units::mm_to_point(rect.width), cell_text);

        let mut backgrounds = Vec::new();
        let mut texts = Vec::new();
        let mut grid = Vec::new();

        for frame in &layout.cells {
            let cell = frame.cell.map(|i| &table.cells[i]);
            let frame_rect = frame.rect.map(point_to_mm).translate(rect.x, rect.y);
            let header = frame.row < table.header_rows;

            let background = cell
                .and_then(|c| c.style.background)
                .or(if header { table.header_background } else { None });
            if let Some(fill) = background {
                backgrounds.push(Primitive::Rect {
                    rect: frame_rect,
                    radius: 0.0,
                    stroke: None,
                    fill: Some(fill),
                });
            }

            if let Some(cell) = cell {
                let text = cell_text(cell);
                if !text.is_empty() {
                    let mut font = cell.style.font.clone().unwrap_or_else(|| table.font.clone());
                    font.size = cell_font_size(table, cell);
                    font.bold |= header;
                    texts.push(text_primitive(
                        frame_rect,
                        point_to_mm(table.cell_padding),
                        &text,
                        &font,
                        cell.style.align.unwrap_or_default(),
                        VerticalAlign::Middle,
                        true,
                    ));
                }
            }

            if let Some(stroke) = &table.grid_lines {
                grid.push(Primitive::Rect {
                    rect: frame_rect,
                    radius: 0.0,
                    stroke: Some(stroke.clone()),
                    fill: None,
                });
            }
        }

        self.primitives.extend(backgrounds);
        self.primitives.extend(texts);
        self.primitives.extend(grid);
        self.table = Some(layout);
    }

    fn label_input_box(&mut self, ctx: &LayoutContext, field: &LabelInputBoxElement) {
        let rect = self.element.rect();
        let label_width = field.label_width.clamp(0.0, rect.width);
        let value = self.text_or(ctx, &field.value);

        let label_rect = Rect::new(rect.x, rect.y, label_width, rect.height);
        let value_rect = Rect::new(
            rect.x + label_width,
            rect.y,
            rect.width - label_width,
            rect.height,
        );

        self.text_block(
            label_rect,
            &field.label,
            &field.font,
            HorizontalAlign::Left,
            VerticalAlign::Middle,
            false,
        );
        if !value.is_empty() {
            self.push(text_primitive(
                value_rect,
                point_to_mm(2.0),
                &value,
                &field.font,
                HorizontalAlign::Left,
                VerticalAlign::Middle,
                false,
            ));
        }
        if field.underline {
            self.push(Primitive::Line {
                from: (value_rect.x, value_rect.bottom()),
                to: (value_rect.right(), value_rect.bottom()),
                stroke: Stroke::default(),
            });
        }
        self.content = Some(value);
    }

    fn finish(self) -> LayoutNode {
        let element = self.element;
        LayoutNode {
            id: element.id.clone(),
            tag: element.kind.tag(),
            rect: element.rect(),
            rotation: element.geometry.rotation,
            z_index: element.geometry.z_index,
            opacity: element.opacity.clamp(0.0, 1.0),
            content: self.content,
            primitives: self.primitives,
            table: self.table,
            diagnostics: self.diagnostics,
        }
    }
}

/// Wrap `text` to the box and position each line
///
/// Wrapping uses the same average character width as table measurement.
pub fn text_primitive(
    rect: Rect,
    inset: f64,
    text: &str,
    font: &FontSpec,
    align: HorizontalAlign,
    vertical_align: VerticalAlign,
    wrap: bool,
) -> Primitive {
    let inner = Rect::new(
        rect.x + inset,
        rect.y + inset,
        (rect.width - 2.0 * inset).max(0.0),
        (rect.height - 2.0 * inset).max(0.0),
    );
    let lines = wrap_text(text, inner.width, font.size, wrap);

    let line_height = point_to_mm(font.size * LINE_HEIGHT_FACTOR);
    let block_height = line_height * lines.len() as f64;
    let top = match vertical_align {
        VerticalAlign::Top => inner.y,
        VerticalAlign::Middle => inner.y + (inner.height - block_height) / 2.0,
        VerticalAlign::Bottom => inner.bottom() - block_height,
    };
    let x = match align {
        HorizontalAlign::Left => inner.x,
        HorizontalAlign::Center => inner.x + inner.width / 2.0,
        HorizontalAlign::Right => inner.right(),
    };
    let ascent = point_to_mm(font.size * BASELINE_FACTOR);

    Primitive::Text {
        lines: lines
            .into_iter()
            .enumerate()
            .map(|(i, text)| TextLine {
                text,
                x,
                baseline: top + i as f64 * line_height + ascent,
            })
            .collect(),
        font: font.clone(),
        align,
    }
}

/// Split into display lines, wrapping paragraphs to `width` millimetres
pub fn wrap_text(text: &str, width: f64, font_size: f64, wrap: bool) -> Vec<String> {
    let char_width = point_to_mm(font_size * CHAR_WIDTH_FACTOR);
    let max_chars = if wrap && char_width > 0.0 {
        ((width / char_width).floor() as usize).max(1)
    } else {
        0
    };

    text.lines()
        .flat_map(|paragraph| {
            if max_chars == 0 || paragraph.chars().count() <= max_chars {
                return vec![paragraph.to_string()];
            }
            let wrapped = pdf_core::simple_word_wrap(paragraph, max_chars);
            if wrapped.is_empty() {
                vec![String::new()]
            } else {
                wrapped
            }
        })
        .collect()
}

enum ImageSource {
    /// Base64 payload or a path, decided by content
    Bound(String),
    Base64(String),
    Path(String),
}

impl ImageSource {
    fn load(self, root: Option<&Path>) -> Result<(Arc<[u8]>, pdf_core::ImageDimensions), String> {
        let bytes = match self {
            ImageSource::Base64(payload) => decode_base64(&payload)?,
            ImageSource::Path(path) => read_resource(&path, root)?,
            ImageSource::Bound(value) => match decode_base64(&value) {
                Ok(bytes) if pdf_core::get_dimensions(&bytes).is_ok() => bytes,
                _ => read_resource(&value, root)?,
            },
        };
        let dims = pdf_core::get_dimensions(&bytes).map_err(|e| e.to_string())?;
        Ok((Arc::from(bytes), dims))
    }
}

/// Decode base64, accepting a `data:` URL prefix
fn decode_base64(payload: &str) -> Result<Vec<u8>, String> {
    let payload = payload.trim();
    let payload = match payload.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => payload,
    };
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| format!("invalid base64 image data: {e}"))
}

fn read_resource(path: &str, root: Option<&Path>) -> Result<Vec<u8>, String> {
    let path = Path::new(path);
    let full = match root {
        Some(root) if path.is_relative() => root.join(path),
        _ => path.to_path_buf(),
    };
    std::fs::read(&full).map_err(|e| format!("cannot read {}: {}", full.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Geometry, LineElement, Point, RectangleElement, TableCell, TextElement};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct Fixture {
        bindings: BindingTable,
        numbers: HashMap<String, i64>,
    }

    impl Fixture {
        fn new(document: &TemplateDocument) -> Self {
            Self {
                bindings: BindingTable::build(document),
                numbers: auto_number_values(document),
            }
        }

        fn ctx<'a>(&'a self, data: Option<&'a Value>) -> LayoutContext<'a> {
            LayoutContext {
                data,
                bindings: &self.bindings,
                auto_numbers: &self.numbers,
                resource_root: None,
                table_limits: TableLimits::default(),
            }
        }
    }

    fn geometry(x: f64, y: f64, width: f64, height: f64) -> Geometry {
        Geometry {
            x,
            y,
            width,
            height,
            ..Default::default()
        }
    }

    fn document(elements: Vec<ElementNode>) -> TemplateDocument {
        let mut document = TemplateDocument::new(210.0, 297.0);
        document.elements = elements;
        document
    }

    fn bound_text(id: &str, path: &str, content: &str) -> ElementNode {
        ElementNode::new(
            id,
            geometry(10.0, 10.0, 80.0, 10.0),
            ElementKind::Text(TextElement {
                content: content.to_string(),
                binding: Some(crate::model::ElementBinding {
                    path: path.to_string(),
                    format: None,
                }),
                ..Default::default()
            }),
        )
    }

    fn text_of(node: &LayoutNode) -> Vec<String> {
        node.primitives
            .iter()
            .filter_map(|p| match p {
                Primitive::Text { lines, .. } => Some(lines.iter().map(|l| l.text.clone())),
                _ => None,
            })
            .flatten()
            .collect()
    }

    #[test]
    fn test_bound_text_and_fallback() {
        let doc = document(vec![bound_text("name", "Patient.Name", "Unknown")]);
        let fixture = Fixture::new(&doc);

        let data = json!({ "Patient": { "Name": "张三" } });
        let node = resolve_element(&doc.elements[0], &fixture.ctx(Some(&data))).unwrap();
        assert_eq!(node.content.as_deref(), Some("张三"));
        assert!(node.diagnostics.is_empty());

        let empty = json!({});
        let node = resolve_element(&doc.elements[0], &fixture.ctx(Some(&empty))).unwrap();
        assert_eq!(node.content.as_deref(), Some("Unknown"));
        assert_eq!(
            node.diagnostics,
            vec![Diagnostic::BindingUnresolved {
                element_id: "name".into(),
                path: "Patient.Name".into()
            }]
        );

        let node = resolve_element(&doc.elements[0], &fixture.ctx(None)).unwrap();
        assert_eq!(node.content.as_deref(), Some("Unknown"));
        assert!(node.diagnostics.is_empty());
    }

    #[test]
    fn test_invisible_and_unsupported_are_skipped() {
        let mut hidden = bound_text("h", "X", "x");
        hidden.visible = false;
        let unknown = ElementNode::new("u", geometry(0.0, 0.0, 5.0, 5.0), ElementKind::Unsupported);
        let doc = document(vec![hidden, unknown]);
        let fixture = Fixture::new(&doc);
        assert!(resolve_element(&doc.elements[0], &fixture.ctx(None)).is_none());
        assert!(resolve_element(&doc.elements[1], &fixture.ctx(None)).is_none());
    }

    #[test]
    fn test_text_wrap_and_alignment() {
        let lines = wrap_text("alpha beta gamma", point_to_mm(10.0 * 0.6 * 11.5), 10.0, true);
        assert_eq!(lines, vec!["alpha beta", "gamma"]);
        assert_eq!(wrap_text("a\nb", 1.0, 10.0, false), vec!["a", "b"]);

        let font = FontSpec::default();
        let Primitive::Text { lines, .. } = text_primitive(
            Rect::new(10.0, 20.0, 40.0, 30.0),
            0.0,
            "x",
            &font,
            HorizontalAlign::Right,
            VerticalAlign::Bottom,
            true,
        ) else {
            panic!("expected text");
        };
        assert_eq!(lines[0].x, 50.0);
        let line_height = point_to_mm(12.0);
        let expected = 50.0 - line_height + point_to_mm(9.0);
        assert!((lines[0].baseline - expected).abs() < 1e-9);
    }

    #[test]
    fn test_line_points_are_element_relative() {
        let line = ElementNode::new(
            "l",
            geometry(5.0, 7.0, 20.0, 1.0),
            ElementKind::Line(LineElement {
                start: Point { x: 0.0, y: 0.5 },
                end: Point { x: 20.0, y: 0.5 },
                stroke: Stroke::default(),
            }),
        );
        let doc = document(vec![line]);
        let fixture = Fixture::new(&doc);
        let node = resolve_element(&doc.elements[0], &fixture.ctx(None)).unwrap();
        assert_eq!(
            node.primitives,
            vec![Primitive::Line {
                from: (5.0, 7.5),
                to: (25.0, 7.5),
                stroke: Stroke::default()
            }]
        );
    }

    #[test]
    fn test_rectangle_box_style_order() {
        let mut rect = ElementNode::new(
            "r",
            geometry(0.0, 0.0, 10.0, 10.0),
            ElementKind::Rectangle(RectangleElement {
                fill: Some(Color::WHITE),
                ..Default::default()
            }),
        );
        rect.style.background = Some(Color::LIGHT_GRAY);
        rect.style.border = Some(Stroke::default());
        let doc = document(vec![rect]);
        let fixture = Fixture::new(&doc);
        let node = resolve_element(&doc.elements[0], &fixture.ctx(None)).unwrap();
        assert_eq!(node.primitives.len(), 3);
        assert!(matches!(
            node.primitives[0],
            Primitive::Rect { fill: Some(Color::LIGHT_GRAY), .. }
        ));
        assert!(matches!(
            node.primitives[2],
            Primitive::Rect { stroke: Some(_), fill: None, .. }
        ));
    }

    #[test]
    fn test_auto_number_sequences() {
        let auto = |id: &str, sequence: Option<&str>| {
            ElementNode::new(
                id,
                geometry(0.0, 0.0, 20.0, 5.0),
                ElementKind::AutoNumber(AutoNumberElement {
                    prefix: "No. ".into(),
                    start: 10,
                    step: 5,
                    digits: 3,
                    sequence: sequence.map(str::to_string),
                    ..Default::default()
                }),
            )
        };
        let doc = document(vec![auto("a", None), auto("b", Some("x")), auto("c", None)]);
        let values = auto_number_values(&doc);
        assert_eq!(values["a"], 10);
        assert_eq!(values["b"], 10);
        assert_eq!(values["c"], 15);

        let fixture = Fixture::new(&doc);
        let node = resolve_element(&doc.elements[2], &fixture.ctx(None)).unwrap();
        assert_eq!(node.content.as_deref(), Some("No. 015"));
    }

    #[test]
    fn test_table_cells_resolve_bindings() {
        let mut table = TableElement {
            rows: 2,
            columns: 2,
            header_rows: 1,
            header_background: Some(Color::LIGHT_GRAY),
            ..Default::default()
        };
        table.cells.push(TableCell::new(0, 0, "Test"));
        let mut bound = TableCell::new(1, 0, "-");
        bound.binding = Some(crate::model::ElementBinding {
            path: "Results[0].Name".into(),
            format: None,
        });
        table.cells.push(bound);

        let element = ElementNode::new("t", geometry(10.0, 10.0, 100.0, 20.0), ElementKind::Table(table));
        let doc = document(vec![element]);
        let fixture = Fixture::new(&doc);
        let data = json!({ "Results": [{ "Name": "Glucose" }] });
        let node = resolve_element(&doc.elements[0], &fixture.ctx(Some(&data))).unwrap();

        assert_eq!(text_of(&node), vec!["Test", "Glucose"]);
        let layout = node.table.as_ref().unwrap();
        assert_eq!(layout.cells.len(), 4);
        // two header backgrounds, two texts, four grid frames
        assert_eq!(node.primitives.len(), 8);
    }

    #[test]
    fn test_missing_image_is_a_placeholder() {
        let image = ElementNode::new(
            "logo",
            geometry(0.0, 0.0, 30.0, 10.0),
            ElementKind::Image(ImageElement {
                path: Some("no/such/logo.png".into()),
                ..Default::default()
            }),
        );
        let doc = document(vec![image]);
        let fixture = Fixture::new(&doc);
        let node = resolve_element(&doc.elements[0], &fixture.ctx(None)).unwrap();
        assert!(matches!(node.primitives[0], Primitive::Placeholder { .. }));
        assert!(matches!(
            node.diagnostics[0],
            Diagnostic::ResourceUnavailable { .. }
        ));
    }

    #[test]
    fn test_invalid_barcode_is_reported() {
        let code = ElementNode::new(
            "ean",
            geometry(0.0, 0.0, 40.0, 15.0),
            ElementKind::Barcode(BarcodeElement {
                value: "not digits".into(),
                symbology: Symbology::Ean13,
                ..Default::default()
            }),
        );
        let doc = document(vec![code]);
        let fixture = Fixture::new(&doc);
        let node = resolve_element(&doc.elements[0], &fixture.ctx(None)).unwrap();
        assert!(matches!(
            node.diagnostics[0],
            Diagnostic::InvalidBarcode { .. }
        ));
    }

    #[test]
    fn test_qr_fits_square() {
        let code = ElementNode::new(
            "qr",
            geometry(0.0, 0.0, 40.0, 20.0),
            ElementKind::Barcode(BarcodeElement {
                value: "HN-000123".into(),
                symbology: Symbology::Qr,
                ..Default::default()
            }),
        );
        let doc = document(vec![code]);
        let fixture = Fixture::new(&doc);
        let node = resolve_element(&doc.elements[0], &fixture.ctx(None)).unwrap();
        for primitive in &node.primitives {
            let Primitive::Rect { rect, .. } = primitive else {
                panic!("expected module rectangles");
            };
            assert!(rect.x >= 10.0 - 1e-9 && rect.right() <= 30.0 + 1e-9);
        }
    }

    #[test]
    fn test_to_device_scales_points() {
        let primitive = Primitive::Line {
            from: (25.4, 0.0),
            to: (50.8, 0.0),
            stroke: Stroke {
                width: 72.0,
                ..Default::default()
            },
        };
        let Primitive::Line { from, to, stroke } = primitive.to_device(&UnitConverter::new(96.0, 1.0))
        else {
            panic!("expected line");
        };
        assert!((from.0 - 96.0).abs() < 1e-9);
        assert!((to.0 - 192.0).abs() < 1e-9);
        assert!((stroke.width - 96.0).abs() < 1e-9);
    }
}
