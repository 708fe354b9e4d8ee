//! Template document model
//!
//! Geometry is in millimetres, font sizes and stroke widths in points. The
//! JSON form uses camelCase keys and an internal `type` tag per element.

use crate::units::Rect;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Root template document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDocument {
    #[serde(default)]
    pub metadata: TemplateMetadata,

    pub page: PageSettings,

    /// Elements in document order
    #[serde(default)]
    pub elements: Vec<ElementNode>,

    /// Document-level bindings; these win over inline element bindings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<DataBinding>,
}

impl TemplateDocument {
    /// Create an empty document with the given page size
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            metadata: TemplateMetadata::default(),
            page: PageSettings {
                width,
                height,
                ..Default::default()
            },
            elements: Vec::new(),
            bindings: Vec::new(),
        }
    }

    pub fn element(&self, id: &str) -> Option<&ElementNode> {
        self.elements.iter().find(|e| e.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateMetadata {
    /// Template identifier, part of the template cache key
    #[serde(default)]
    pub id: String,

    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default)]
    pub locked: bool,
}

impl Default for TemplateMetadata {
    fn default() -> Self {
        Self {
            id: String::new(),
            version: default_version(),
            name: String::new(),
            author: None,
            locked: false,
        }
    }
}

fn default_version() -> u32 {
    1
}

/// Page geometry in millimetres
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSettings {
    pub width: f64,
    pub height: f64,

    #[serde(default)]
    pub margins: Margins,

    #[serde(default)]
    pub orientation: Orientation,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,
}

impl Default for PageSettings {
    fn default() -> Self {
        // A4
        Self {
            width: 210.0,
            height: 297.0,
            margins: Margins::default(),
            orientation: Orientation::Portrait,
            background: None,
        }
    }
}

impl PageSettings {
    /// Page size after applying the orientation
    ///
    /// Landscape puts the long edge horizontally; portrait uses the
    /// configured size as is.
    pub fn effective_size(&self) -> (f64, f64) {
        match self.orientation {
            Orientation::Landscape if self.width < self.height => (self.height, self.width),
            _ => (self.width, self.height),
        }
    }

    /// Printable area inside the margins
    pub fn content_rect(&self) -> Rect {
        let (width, height) = self.effective_size();
        Rect::new(
            self.margins.left,
            self.margins.top,
            (width - self.margins.left - self.margins.right).max(0.0),
            (height - self.margins.top - self.margins.bottom).max(0.0),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Margins {
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub right: f64,
    #[serde(default)]
    pub bottom: f64,
    #[serde(default)]
    pub left: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// RGBA color, written as `#RRGGBB` or `#RRGGBBAA`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const LIGHT_GRAY: Color = Color::rgb(0xE0, 0xE0, 0xE0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_pdf(self) -> pdf_core::Color {
        pdf_core::Color::from_rgb(self.r, self.g, self.b)
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        let byte = |i: usize| {
            hex.get(i..i + 2)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| format!("invalid color: {s}"))
        };
        match hex.len() {
            6 => Ok(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self {
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
                a: byte(6)?,
            }),
            _ => Err(format!("invalid color: {s}")),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

/// Outline style; width and dashes in points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    #[serde(default)]
    pub color: Color,

    #[serde(default = "default_stroke_width")]
    pub width: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dash: Option<Vec<f64>>,
}

impl Default for Stroke {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            width: default_stroke_width(),
            dash: None,
        }
    }
}

fn default_stroke_width() -> f64 {
    0.5
}

/// Font selection; size in points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontSpec {
    /// Registered font family; `None` uses the configured default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,

    #[serde(default = "default_font_size")]
    pub size: f64,

    #[serde(default)]
    pub bold: bool,

    #[serde(default)]
    pub italic: bool,

    #[serde(default)]
    pub color: Color,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: None,
            size: default_font_size(),
            bold: false,
            italic: false,
            color: Color::BLACK,
        }
    }
}

fn default_font_size() -> f64 {
    10.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl From<HorizontalAlign> for pdf_core::Align {
    fn from(align: HorizontalAlign) -> Self {
        match align {
            HorizontalAlign::Left => pdf_core::Align::Left,
            HorizontalAlign::Center => pdf_core::Align::Center,
            HorizontalAlign::Right => pdf_core::Align::Right,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// Position and size in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,

    /// Clockwise degrees about the box centre
    #[serde(default)]
    pub rotation: f64,

    #[serde(default)]
    pub z_index: i32,
}

/// Border and background of an element box
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoxStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<Stroke>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,
}

impl BoxStyle {
    fn is_empty(&self) -> bool {
        self.border.is_none() && self.background.is_none()
    }
}

/// Inline binding carried by an element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementBinding {
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Document-level binding entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataBinding {
    pub element_id: String,
    pub data_path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_string: Option<String>,
}

/// A positioned element of the template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementNode {
    pub id: String,

    #[serde(flatten)]
    pub geometry: Geometry,

    #[serde(default = "default_true")]
    pub visible: bool,

    #[serde(default = "default_opacity")]
    pub opacity: f64,

    #[serde(default, skip_serializing_if = "BoxStyle::is_empty")]
    pub style: BoxStyle,

    #[serde(flatten)]
    pub kind: ElementKind,
}

fn default_true() -> bool {
    true
}

fn default_opacity() -> f64 {
    1.0
}

impl ElementNode {
    pub fn new(id: impl Into<String>, geometry: Geometry, kind: ElementKind) -> Self {
        Self {
            id: id.into(),
            geometry,
            visible: true,
            opacity: 1.0,
            style: BoxStyle::default(),
            kind,
        }
    }

    /// Element box in millimetres
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.geometry.x,
            self.geometry.y,
            self.geometry.width,
            self.geometry.height,
        )
    }

    /// Inline binding, for the variants that carry one
    pub fn binding(&self) -> Option<&ElementBinding> {
        match &self.kind {
            ElementKind::Text(e) => e.binding.as_ref(),
            ElementKind::Image(e) => e.binding.as_ref(),
            ElementKind::Barcode(e) => e.binding.as_ref(),
            ElementKind::Signature(e) => e.binding.as_ref(),
            ElementKind::AutoNumber(e) => e.binding.as_ref(),
            ElementKind::LabelInputBox(e) => e.binding.as_ref(),
            ElementKind::Label(_)
            | ElementKind::Line(_)
            | ElementKind::Rectangle(_)
            | ElementKind::Ellipse(_)
            | ElementKind::Table(_)
            | ElementKind::Unsupported => None,
        }
    }
}

/// Closed set of element variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ElementKind {
    Text(TextElement),
    Label(LabelElement),
    Image(ImageElement),
    Line(LineElement),
    Rectangle(RectangleElement),
    Ellipse(EllipseElement),
    Barcode(BarcodeElement),
    Signature(SignatureElement),
    AutoNumber(AutoNumberElement),
    Table(TableElement),
    LabelInputBox(LabelInputBoxElement),
    /// Any tag this version does not know; skipped when rendering
    #[serde(other)]
    Unsupported,
}

impl ElementKind {
    pub fn tag(&self) -> &'static str {
        match self {
            ElementKind::Text(_) => "text",
            ElementKind::Label(_) => "label",
            ElementKind::Image(_) => "image",
            ElementKind::Line(_) => "line",
            ElementKind::Rectangle(_) => "rectangle",
            ElementKind::Ellipse(_) => "ellipse",
            ElementKind::Barcode(_) => "barcode",
            ElementKind::Signature(_) => "signature",
            ElementKind::AutoNumber(_) => "autoNumber",
            ElementKind::Table(_) => "table",
            ElementKind::LabelInputBox(_) => "labelInputBox",
            ElementKind::Unsupported => "unsupported",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    /// Static text, also the fallback when the binding does not resolve
    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub font: FontSpec,

    #[serde(default)]
    pub align: HorizontalAlign,

    #[serde(default)]
    pub vertical_align: VerticalAlign,

    #[serde(default = "default_true")]
    pub word_wrap: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<ElementBinding>,
}

impl Default for TextElement {
    fn default() -> Self {
        Self {
            content: String::new(),
            font: FontSpec::default(),
            align: HorizontalAlign::Left,
            vertical_align: VerticalAlign::Top,
            word_wrap: true,
            binding: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelElement {
    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub font: FontSpec,

    #[serde(default)]
    pub align: HorizontalAlign,

    #[serde(default)]
    pub vertical_align: VerticalAlign,
}

/// Image scaling inside the element box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScaleMode {
    #[default]
    Stretch,
    FitWidth,
    FitHeight,
    FitBox,
}

impl From<ScaleMode> for pdf_core::ImageScaleMode {
    fn from(mode: ScaleMode) -> Self {
        match mode {
            ScaleMode::Stretch => pdf_core::ImageScaleMode::Stretch,
            ScaleMode::FitWidth => pdf_core::ImageScaleMode::FitWidth,
            ScaleMode::FitHeight => pdf_core::ImageScaleMode::FitHeight,
            ScaleMode::FitBox => pdf_core::ImageScaleMode::FitBox,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageElement {
    /// Base64 encoded image bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    /// File path, relative paths resolve against the configured resource root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default)]
    pub scale_mode: ScaleMode,

    /// Resolves to base64 data or a path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<ElementBinding>,
}

/// Point relative to the element box, in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineElement {
    pub start: Point,
    pub end: Point,

    #[serde(default)]
    pub stroke: Stroke,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RectangleElement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Stroke>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,

    /// Millimetres
    #[serde(default)]
    pub corner_radius: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EllipseElement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Stroke>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Symbology {
    #[default]
    Code128,
    Code39,
    Ean13,
    Qr,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarcodeElement {
    #[serde(default)]
    pub value: String,

    #[serde(default)]
    pub symbology: Symbology,

    /// Print the human-readable value under 1D symbols
    #[serde(default)]
    pub show_text: bool,

    #[serde(default)]
    pub font: FontSpec,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<ElementBinding>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureElement {
    /// Base64 encoded signature image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,

    #[serde(default)]
    pub font: FontSpec,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<ElementBinding>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoNumberElement {
    #[serde(default)]
    pub prefix: String,

    #[serde(default)]
    pub suffix: String,

    #[serde(default = "default_one")]
    pub start: i64,

    #[serde(default = "default_one")]
    pub step: i64,

    /// Zero-padded width of the number, 0 for none
    #[serde(default)]
    pub digits: usize,

    /// Elements sharing a sequence name count together, in document order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<String>,

    #[serde(default)]
    pub font: FontSpec,

    #[serde(default)]
    pub align: HorizontalAlign,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<ElementBinding>,
}

impl Default for AutoNumberElement {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            suffix: String::new(),
            start: 1,
            step: 1,
            digits: 0,
            sequence: None,
            font: FontSpec::default(),
            align: HorizontalAlign::Left,
            binding: None,
        }
    }
}

fn default_one() -> i64 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableElement {
    pub rows: usize,
    pub columns: usize,

    #[serde(default)]
    pub cells: Vec<TableCell>,

    /// Millimetres per column; missing or non-positive entries are computed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub column_widths: Vec<f64>,

    /// Millimetres per row; missing or non-positive entries are computed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub row_heights: Vec<f64>,

    /// Points
    #[serde(default = "default_cell_padding")]
    pub cell_padding: f64,

    /// Points
    #[serde(default)]
    pub cell_spacing: f64,

    /// Size columns to their content instead of sharing the table width
    #[serde(default)]
    pub auto_size: bool,

    #[serde(default)]
    pub font: FontSpec,

    /// `null` disables the grid
    #[serde(default = "default_grid_lines")]
    pub grid_lines: Option<Stroke>,

    #[serde(default)]
    pub header_rows: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_background: Option<Color>,
}

impl Default for TableElement {
    fn default() -> Self {
        Self {
            rows: 0,
            columns: 0,
            cells: Vec::new(),
            column_widths: Vec::new(),
            row_heights: Vec::new(),
            cell_padding: default_cell_padding(),
            cell_spacing: 0.0,
            auto_size: false,
            font: FontSpec::default(),
            grid_lines: default_grid_lines(),
            header_rows: 0,
            header_background: None,
        }
    }
}

fn default_cell_padding() -> f64 {
    2.0
}

fn default_grid_lines() -> Option<Stroke> {
    Some(Stroke::default())
}

impl TableElement {
    pub fn cell(&self, row: usize, column: usize) -> Option<&TableCell> {
        self.cells
            .iter()
            .find(|c| c.row == row && c.column == column)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    pub row: usize,
    pub column: usize,

    #[serde(default = "default_span")]
    pub row_span: usize,

    #[serde(default = "default_span")]
    pub column_span: usize,

    #[serde(default)]
    pub content: String,

    #[serde(default, skip_serializing_if = "CellStyle::is_empty")]
    pub style: CellStyle,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<ElementBinding>,
}

fn default_span() -> usize {
    1
}

impl TableCell {
    pub fn new(row: usize, column: usize, content: impl Into<String>) -> Self {
        Self {
            row,
            column,
            row_span: 1,
            column_span: 1,
            content: content.into(),
            style: CellStyle::default(),
            binding: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CellStyle {
    /// Overrides the table font
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<FontSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<HorizontalAlign>,
}

impl CellStyle {
    fn is_empty(&self) -> bool {
        self.font.is_none() && self.background.is_none() && self.align.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelInputBoxElement {
    #[serde(default)]
    pub label: String,

    /// Default value shown when unbound
    #[serde(default)]
    pub value: String,

    /// Millimetres reserved for the label
    #[serde(default = "default_label_width")]
    pub label_width: f64,

    #[serde(default)]
    pub font: FontSpec,

    #[serde(default = "default_true")]
    pub underline: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<ElementBinding>,
}

impl Default for LabelInputBoxElement {
    fn default() -> Self {
        Self {
            label: String::new(),
            value: String::new(),
            label_width: default_label_width(),
            font: FontSpec::default(),
            underline: true,
            binding: None,
        }
    }
}

fn default_label_width() -> f64 {
    25.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_color_parse_and_display() {
        let c: Color = "#1A2B3C".parse().unwrap();
        assert_eq!(c, Color::rgb(0x1A, 0x2B, 0x3C));
        assert_eq!(c.to_string(), "#1A2B3C");
        let translucent: Color = "#00000080".parse().unwrap();
        assert_eq!(translucent.a, 0x80);
        assert!("#12".parse::<Color>().is_err());
        assert!("#GGGGGG".parse::<Color>().is_err());
    }

    #[test]
    fn test_landscape_swaps_portrait_size() {
        let mut page = PageSettings::default();
        assert_eq!(page.effective_size(), (210.0, 297.0));
        page.orientation = Orientation::Landscape;
        assert_eq!(page.effective_size(), (297.0, 210.0));
        page.width = 297.0;
        page.height = 210.0;
        assert_eq!(page.effective_size(), (297.0, 210.0));
    }

    #[test]
    fn test_content_rect() {
        let page = PageSettings {
            margins: Margins {
                top: 10.0,
                right: 5.0,
                bottom: 10.0,
                left: 5.0,
            },
            ..Default::default()
        };
        assert_eq!(page.content_rect(), Rect::new(5.0, 10.0, 200.0, 277.0));
    }

    #[test]
    fn test_element_json_shape() {
        let element: ElementNode = serde_json::from_value(json!({
            "id": "name",
            "type": "text",
            "x": 10, "y": 20, "width": 50, "height": 8,
            "zIndex": 2,
            "content": "Unknown",
            "font": { "size": 12, "bold": true },
            "binding": { "path": "Patient.Name" }
        }))
        .unwrap();

        assert_eq!(element.geometry.z_index, 2);
        assert!(element.visible);
        match &element.kind {
            ElementKind::Text(text) => {
                assert_eq!(text.content, "Unknown");
                assert_eq!(text.font.size, 12.0);
                assert!(text.font.bold);
                assert!(text.word_wrap);
            }
            other => panic!("unexpected kind {other:?}"),
        }
        assert_eq!(element.binding().unwrap().path, "Patient.Name");
    }

    #[test]
    fn test_unknown_type_is_unsupported() {
        let element: ElementNode = serde_json::from_value(json!({
            "id": "chart1",
            "type": "chart",
            "x": 0, "y": 0, "width": 10, "height": 10,
            "series": [1, 2, 3]
        }))
        .unwrap();
        assert_eq!(element.kind, ElementKind::Unsupported);
        assert_eq!(element.kind.tag(), "unsupported");
    }

    #[test]
    fn test_table_defaults() {
        let element: ElementNode = serde_json::from_value(json!({
            "id": "t",
            "type": "table",
            "x": 0, "y": 0, "width": 100, "height": 30,
            "rows": 2, "columns": 2,
            "cells": [{ "row": 0, "column": 1, "content": "x" }]
        }))
        .unwrap();
        let ElementKind::Table(table) = element.kind else {
            panic!("expected table");
        };
        assert_eq!(table.cell_padding, 2.0);
        assert_eq!(table.cell(0, 1).unwrap().row_span, 1);
        assert!(table.cell(1, 1).is_none());
    }
}
