//! PDF Document writer

use crate::font::{FontData, StandardFont};
use crate::graphics::{ellipse_operators, line_operators, rect_operators, PathStyle};
use crate::image::{
    calculate_scaled_dimensions, generate_image_operators, ImageScaleMode, ImageXObject,
};
use crate::text::{escape_literal, generate_text_operators, TextRenderContext};
use crate::{Align, PdfError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::{Hash, Hasher};
use std::path::Path;

/// RGB Color (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a new RGB color (values 0.0 - 1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create color from RGB values (0-255)
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Black color
    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    /// White color
    pub fn white() -> Self {
        Self::rgb(1.0, 1.0, 1.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// Transform and transparency applied to a group of drawing operations
///
/// Opened with [`PdfDocument::push_state`] and closed with
/// [`PdfDocument::pop_state`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphicsState {
    /// Clockwise rotation in degrees, as seen on the page
    pub rotation: f64,
    /// Rotation centre in points (top-left origin)
    pub origin: (f64, f64),
    /// Constant opacity (0.0 - 1.0)
    pub opacity: f32,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            rotation: 0.0,
            origin: (0.0, 0.0),
            opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum FontKey {
    Standard(StandardFont),
    Embedded(String),
}

/// Per-page state; resources are assembled when the document is written
#[derive(Debug, Default)]
struct PageState {
    width: f64,
    height: f64,
    art_box: Option<[f64; 4]>,
    content: Vec<u8>,
    fonts: BTreeSet<FontKey>,
    images: BTreeMap<String, ObjectId>,
    ext_states: BTreeSet<String>,
    open_states: usize,
}

/// PDF document builder
///
/// Pages are appended with [`add_page`](Self::add_page); page numbers are
/// 1-indexed. Coordinates are in points with a top-left origin.
pub struct PdfDocument {
    /// The underlying lopdf document
    inner: Document,
    /// Object ID reserved for the page tree root
    pages_id: ObjectId,
    pages: Vec<PageState>,
    /// Registered TrueType fonts
    fonts: HashMap<String, FontData>,
    /// Font resource names (font -> "F1", "F2", ...)
    font_resources: BTreeMap<FontKey, String>,
    current_font: FontKey,
    current_font_size: f32,
    current_text_color: Color,
    /// Embedded images (data hash -> resource name, object ID, pixel size)
    embedded_images: HashMap<u64, (String, ObjectId, u32, u32)>,
    /// Opacity graphics states (resource name -> alpha)
    ext_states: BTreeMap<String, f32>,
    title: Option<String>,
    author: Option<String>,
}

impl Default for PdfDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfDocument {
    /// Create an empty document
    pub fn new() -> Self {
        let mut inner = Document::with_version("1.7");
        let pages_id = inner.new_object_id();

        Self {
            inner,
            pages_id,
            pages: Vec::new(),
            fonts: HashMap::new(),
            font_resources: BTreeMap::new(),
            current_font: FontKey::Standard(StandardFont::Helvetica),
            current_font_size: 12.0,
            current_text_color: Color::default(),
            embedded_images: HashMap::new(),
            ext_states: BTreeMap::new(),
            title: None,
            author: None,
        }
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page size in points
    pub fn page_size(&self, page: usize) -> Option<(f64, f64)> {
        self.pages
            .get(page.checked_sub(1)?)
            .map(|p| (p.width, p.height))
    }

    /// Append a page of the given size in points
    ///
    /// # Returns
    /// New page number (1-indexed)
    pub fn add_page(&mut self, width: f64, height: f64) -> usize {
        self.pages.push(PageState {
            width,
            height,
            ..Default::default()
        });
        self.pages.len()
    }

    /// Mark the printable area of a page (top-left origin, points)
    pub fn set_art_box(
        &mut self,
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<()> {
        let state = self.page_mut(page)?;
        let bottom = state.height - y - height;
        state.art_box = Some([x, bottom, x + width, bottom + height]);
        Ok(())
    }

    /// Set document information (Title / Author)
    pub fn set_info(&mut self, title: Option<&str>, author: Option<&str>) {
        self.title = title.map(str::to_string);
        self.author = author.map(str::to_string);
    }

    /// Add a TrueType font from bytes
    ///
    /// # Arguments
    /// * `name` - Font identifier (e.g., "noto-sans")
    /// * `ttf_data` - TrueType font file bytes
    pub fn add_font(&mut self, name: &str, ttf_data: &[u8]) -> Result<()> {
        if self.fonts.contains_key(name) {
            return Err(PdfError::FontAlreadyExists(name.to_string()));
        }
        let font = FontData::from_ttf(name, ttf_data)?;
        log::debug!("Registered font '{}' ({} bytes)", name, ttf_data.len());
        self.fonts.insert(name.to_string(), font);
        Ok(())
    }

    /// Select a registered TrueType font
    pub fn set_font(&mut self, name: &str, size: f32) -> Result<()> {
        if !self.fonts.contains_key(name) {
            return Err(PdfError::FontNotFound(name.to_string()));
        }
        self.current_font = FontKey::Embedded(name.to_string());
        self.current_font_size = size;
        Ok(())
    }

    /// Select one of the built-in Helvetica faces
    pub fn set_standard_font(&mut self, bold: bool, italic: bool, size: f32) {
        self.current_font = FontKey::Standard(StandardFont::helvetica(bold, italic));
        self.current_font_size = size;
    }

    /// Set the color used by subsequent text insertions
    pub fn set_text_color(&mut self, color: Color) {
        self.current_text_color = color;
    }

    /// Width of `text` in points with the current font and size
    pub fn get_text_width(&self, text: &str) -> f64 {
        match &self.current_font {
            FontKey::Standard(font) => font.text_width_points(text, self.current_font_size),
            FontKey::Embedded(name) => self
                .fonts
                .get(name)
                .map(|f| f.text_width_points(text, self.current_font_size))
                .unwrap_or(0.0),
        }
    }

    /// Whether the current font can display every character of `text`
    pub fn can_render(&self, text: &str) -> bool {
        match &self.current_font {
            FontKey::Standard(_) => text.chars().all(|c| (c as u32) <= 0xFF),
            FontKey::Embedded(name) => self
                .fonts
                .get(name)
                .map(|f| text.chars().all(|c| c.is_whitespace() || f.has_glyph(c)))
                .unwrap_or(false),
        }
    }

    /// Insert text at a specific position
    ///
    /// # Arguments
    /// * `text` - Text to insert
    /// * `page` - Page number (1-indexed)
    /// * `x` - X coordinate in points
    /// * `y` - Baseline Y coordinate in points (from top)
    /// * `align` - Text alignment relative to `x`
    pub fn insert_text(
        &mut self,
        text: &str,
        page: usize,
        x: f64,
        y: f64,
        align: Align,
    ) -> Result<()> {
        let page_height = self.page(page)?.height;
        if text.is_empty() {
            return Ok(());
        }

        let encoded = match &self.current_font {
            FontKey::Standard(_) => escape_literal(text),
            FontKey::Embedded(name) => {
                let font = self
                    .fonts
                    .get_mut(name)
                    .ok_or_else(|| PdfError::FontNotFound(name.clone()))?;
                font.add_chars(text);
                font.encode_text_hex(text)
            }
        };

        let ctx = TextRenderContext {
            font_name: self.font_resource_name(self.current_font.clone()),
            font_size: self.current_font_size,
            text_width: self.get_text_width(text),
            color: self.current_text_color,
        };
        let operators = generate_text_operators(&encoded, x, page_height - y, align, &ctx);

        let key = self.current_font.clone();
        let state = self.page_mut(page)?;
        state.fonts.insert(key);
        state.content.extend_from_slice(&operators);
        Ok(())
    }

    /// Insert an image stretched to the given box
    ///
    /// # Arguments
    /// * `data` - Image file bytes (JPEG or PNG)
    /// * `page` - Page number (1-indexed)
    /// * `x` - X coordinate in points
    /// * `y` - Y coordinate in points (from top)
    /// * `width` - Image width in points
    /// * `height` - Image height in points
    pub fn insert_image(
        &mut self,
        data: &[u8],
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<()> {
        self.insert_image_scaled(data, page, x, y, width, height, ImageScaleMode::Stretch)
    }

    /// Insert an image with scaling mode
    ///
    /// The scaled image is anchored at the top-left corner of the box.
    #[allow(clippy::too_many_arguments)]
    pub fn insert_image_scaled(
        &mut self,
        data: &[u8],
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        mode: ImageScaleMode,
    ) -> Result<()> {
        let page_height = self.page(page)?.height;
        let (resource_name, object_id, orig_width, orig_height) = self.image_ref(data)?;

        let (actual_width, actual_height) =
            calculate_scaled_dimensions(orig_width, orig_height, width, height, mode);
        let pdf_y = page_height - y - actual_height;
        let operators =
            generate_image_operators(&resource_name, x, pdf_y, actual_width, actual_height);

        let state = self.page_mut(page)?;
        state.images.insert(resource_name, object_id);
        state.content.extend_from_slice(&operators);
        Ok(())
    }

    /// Draw a straight line between two points
    pub fn draw_line(
        &mut self,
        page: usize,
        from: (f64, f64),
        to: (f64, f64),
        style: &PathStyle,
    ) -> Result<()> {
        let state = self.page_mut(page)?;
        let h = state.height;
        let operators = line_operators(from.0, h - from.1, to.0, h - to.1, style);
        state.content.extend_from_slice(&operators);
        Ok(())
    }

    /// Draw a rectangle; `y` is the top edge
    #[allow(clippy::too_many_arguments)]
    pub fn draw_rect(
        &mut self,
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        radius: f64,
        style: &PathStyle,
    ) -> Result<()> {
        let state = self.page_mut(page)?;
        let bottom = state.height - y - height;
        let operators = rect_operators(x, bottom, width, height, radius, style);
        state.content.extend_from_slice(&operators);
        Ok(())
    }

    /// Draw an ellipse inscribed in the box; `y` is the top edge
    pub fn draw_ellipse(
        &mut self,
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        style: &PathStyle,
    ) -> Result<()> {
        let state = self.page_mut(page)?;
        let bottom = state.height - y - height;
        let operators = ellipse_operators(x, bottom, width, height, style);
        state.content.extend_from_slice(&operators);
        Ok(())
    }

    /// Open a drawing group with rotation and opacity
    pub fn push_state(&mut self, page: usize, state: GraphicsState) -> Result<()> {
        let ext_state = if state.opacity < 1.0 {
            Some(self.ext_state_name(state.opacity))
        } else {
            None
        };

        let page_state = self.page_mut(page)?;
        let mut ops = String::from("q\n");

        if let Some(name) = ext_state {
            ops.push_str(&format!("/{name} gs\n"));
            page_state.ext_states.insert(name);
        }

        if state.rotation != 0.0 {
            let theta = state.rotation.to_radians();
            let (sin, cos) = theta.sin_cos();
            let cx = state.origin.0;
            let cy = page_state.height - state.origin.1;
            // clockwise on the page is negative rotation in PDF space
            let (a, b, c, d) = (cos, -sin, sin, cos);
            let e = cx - a * cx - c * cy;
            let f = cy - b * cx - d * cy;
            ops.push_str(&format!(
                "{a:.5} {b:.5} {c:.5} {d:.5} {e:.3} {f:.3} cm\n"
            ));
        }

        page_state.open_states += 1;
        page_state.content.extend_from_slice(ops.as_bytes());
        Ok(())
    }

    /// Close the most recent drawing group
    pub fn pop_state(&mut self, page: usize) -> Result<()> {
        let state = self.page_mut(page)?;
        if state.open_states == 0 {
            return Err(PdfError::UnbalancedState(page));
        }
        state.open_states -= 1;
        state.content.extend_from_slice(b"Q\n");
        Ok(())
    }

    /// Save the document to a file
    ///
    /// # Arguments
    /// * `path` - Output file path
    pub fn save<P: AsRef<Path>>(self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Serialize the document to bytes
    pub fn to_bytes(mut self) -> Result<Vec<u8>> {
        self.assemble()?;

        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        log::debug!("Wrote {} page(s), {} bytes", self.pages.len(), buffer.len());
        Ok(buffer)
    }

    fn page(&self, page: usize) -> Result<&PageState> {
        let count = self.pages.len();
        page.checked_sub(1)
            .and_then(|i| self.pages.get(i))
            .ok_or(PdfError::InvalidPage(page, count))
    }

    fn page_mut(&mut self, page: usize) -> Result<&mut PageState> {
        let count = self.pages.len();
        page.checked_sub(1)
            .and_then(|i| self.pages.get_mut(i))
            .ok_or(PdfError::InvalidPage(page, count))
    }

    fn font_resource_name(&mut self, key: FontKey) -> String {
        let next = self.font_resources.len() + 1;
        self.font_resources
            .entry(key)
            .or_insert_with(|| format!("F{next}"))
            .clone()
    }

    fn ext_state_name(&mut self, opacity: f32) -> String {
        let alpha = (opacity.clamp(0.0, 1.0) * 1000.0).round() / 1000.0;
        if let Some((name, _)) = self.ext_states.iter().find(|(_, a)| **a == alpha) {
            return name.clone();
        }
        let name = format!("GS{}", self.ext_states.len() + 1);
        self.ext_states.insert(name.clone(), alpha);
        name
    }

    /// Images are deduplicated by hash of their data
    fn image_ref(&mut self, data: &[u8]) -> Result<(String, ObjectId, u32, u32)> {
        let mut hasher = DefaultHasher::new();
        data.hash(&mut hasher);
        let data_hash = hasher.finish();

        if let Some(entry) = self.embedded_images.get(&data_hash) {
            return Ok(entry.clone());
        }

        let xobject = ImageXObject::from_bytes(data)?;
        let (width, height) = (xobject.width, xobject.height);
        let object_id = self.inner.add_object(xobject.to_pdf_stream());
        let name = format!("Im{}", self.embedded_images.len() + 1);
        let entry = (name, object_id, width, height);
        self.embedded_images.insert(data_hash, entry.clone());
        Ok(entry)
    }

    /// Embed a TrueType font and wire up its object references
    fn embed_font_object(&mut self, font_name: &str) -> Result<ObjectId> {
        let font_data = self
            .fonts
            .get(font_name)
            .ok_or_else(|| PdfError::FontNotFound(font_name.to_string()))?;
        let font_objects = font_data.to_pdf_objects()?;

        let font_file_id = self.inner.add_object(font_objects.font_file_stream);

        let mut font_descriptor = font_objects.font_descriptor;
        font_descriptor.set("FontFile2", Object::Reference(font_file_id));
        let font_descriptor_id = self.inner.add_object(font_descriptor);

        let mut cid_font = font_objects.cid_font;
        cid_font.set("FontDescriptor", Object::Reference(font_descriptor_id));
        let cid_font_id = self.inner.add_object(cid_font);

        let tounicode_id = self.inner.add_object(font_objects.tounicode_stream);

        let mut type0_font = font_objects.type0_font;
        type0_font.set(
            "DescendantFonts",
            Object::Array(vec![Object::Reference(cid_font_id)]),
        );
        type0_font.set("ToUnicode", Object::Reference(tounicode_id));

        Ok(self.inner.add_object(type0_font))
    }

    /// Build the page tree, resources and catalog
    fn assemble(&mut self) -> Result<()> {
        for (index, page) in self.pages.iter().enumerate() {
            if page.open_states != 0 {
                return Err(PdfError::UnbalancedState(index + 1));
            }
        }

        let mut font_ids: BTreeMap<FontKey, ObjectId> = BTreeMap::new();
        let used_fonts: BTreeSet<FontKey> = self
            .pages
            .iter()
            .flat_map(|p| p.fonts.iter().cloned())
            .collect();
        for key in used_fonts {
            let id = match &key {
                FontKey::Standard(font) => self.inner.add_object(font.to_pdf_dictionary()),
                FontKey::Embedded(name) => self.embed_font_object(name)?,
            };
            font_ids.insert(key, id);
        }

        let mut ext_state_ids: BTreeMap<String, ObjectId> = BTreeMap::new();
        for (name, alpha) in &self.ext_states {
            let dict = Dictionary::from_iter(vec![
                ("Type", "ExtGState".into()),
                ("CA", Object::Real(*alpha)),
                ("ca", Object::Real(*alpha)),
            ]);
            ext_state_ids.insert(name.clone(), self.inner.add_object(dict));
        }

        let pages = std::mem::take(&mut self.pages);
        let mut kids = Vec::with_capacity(pages.len());
        for page in &pages {
            let mut resources = Dictionary::new();

            if !page.fonts.is_empty() {
                let mut fonts = Dictionary::new();
                for key in &page.fonts {
                    fonts.set(
                        self.font_resources[key].as_bytes(),
                        Object::Reference(font_ids[key]),
                    );
                }
                resources.set("Font", fonts);
            }
            if !page.images.is_empty() {
                let mut xobjects = Dictionary::new();
                for (name, id) in &page.images {
                    xobjects.set(name.as_bytes(), Object::Reference(*id));
                }
                resources.set("XObject", xobjects);
            }
            if !page.ext_states.is_empty() {
                let mut states = Dictionary::new();
                for name in &page.ext_states {
                    states.set(name.as_bytes(), Object::Reference(ext_state_ids[name]));
                }
                resources.set("ExtGState", states);
            }

            let contents_id = self
                .inner
                .add_object(Stream::new(Dictionary::new(), page.content.clone()));

            let mut page_dict = Dictionary::from_iter(vec![
                ("Type", "Page".into()),
                ("Parent", Object::Reference(self.pages_id)),
                ("MediaBox", box_array(&[0.0, 0.0, page.width, page.height])),
                ("Contents", Object::Reference(contents_id)),
                ("Resources", resources.into()),
            ]);
            if let Some(art_box) = &page.art_box {
                page_dict.set("ArtBox", box_array(art_box));
            }
            kids.push(Object::Reference(self.inner.add_object(page_dict)));
        }
        self.pages = pages;

        let count = kids.len() as i64;
        let pages_dict = Dictionary::from_iter(vec![
            ("Type", "Pages".into()),
            ("Kids", kids.into()),
            ("Count", count.into()),
        ]);
        self.inner
            .objects
            .insert(self.pages_id, Object::Dictionary(pages_dict));

        let catalog_id = self.inner.add_object(Dictionary::from_iter(vec![
            ("Type", "Catalog".into()),
            ("Pages", Object::Reference(self.pages_id)),
        ]));
        self.inner.trailer.set("Root", Object::Reference(catalog_id));

        let mut info = Dictionary::new();
        info.set("Producer", Object::string_literal("pdf-core"));
        if let Some(title) = &self.title {
            info.set("Title", Object::string_literal(title.as_str()));
        }
        if let Some(author) = &self.author {
            info.set("Author", Object::string_literal(author.as_str()));
        }
        let info_id = self.inner.add_object(info);
        self.inner.trailer.set("Info", Object::Reference(info_id));

        Ok(())
    }
}

fn box_array(values: &[f64]) -> Object {
    Object::Array(values.iter().map(|v| Object::Real(*v as f32)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_creation() {
        let mut doc = PdfDocument::new();
        assert_eq!(doc.page_count(), 0);
        assert_eq!(doc.add_page(595.0, 842.0), 1);
        assert_eq!(doc.add_page(842.0, 595.0), 2);
        assert_eq!(doc.page_size(2), Some((842.0, 595.0)));
        assert_eq!(doc.page_size(0), None);
    }

    #[test]
    fn test_invalid_page() {
        let mut doc = PdfDocument::new();
        doc.add_page(100.0, 100.0);
        let result = doc.insert_text("x", 2, 0.0, 0.0, Align::Left);
        assert!(matches!(result, Err(PdfError::InvalidPage(2, 1))));
        let result = doc.draw_rect(0, 0.0, 0.0, 1.0, 1.0, 0.0, &PathStyle::default());
        assert!(matches!(result, Err(PdfError::InvalidPage(0, 1))));
    }

    #[test]
    fn test_set_unknown_font() {
        let mut doc = PdfDocument::new();
        assert!(matches!(
            doc.set_font("missing", 10.0),
            Err(PdfError::FontNotFound(_))
        ));
    }

    #[test]
    fn test_standard_text_flips_y() {
        let mut doc = PdfDocument::new();
        let page = doc.add_page(200.0, 300.0);
        doc.set_standard_font(false, false, 10.0);
        doc.insert_text("Hi", page, 10.0, 50.0, Align::Left).unwrap();
        let content = String::from_utf8(doc.pages[0].content.clone()).unwrap();
        assert!(content.contains("10.000 250.000 Td"));
        assert!(content.contains("(Hi) Tj"));
    }

    #[test]
    fn test_rotation_matrix_about_centre() {
        let mut doc = PdfDocument::new();
        let page = doc.add_page(100.0, 100.0);
        doc.push_state(
            page,
            GraphicsState {
                rotation: 90.0,
                origin: (50.0, 50.0),
                opacity: 1.0,
            },
        )
        .unwrap();
        doc.pop_state(page).unwrap();
        let content = String::from_utf8(doc.pages[0].content.clone()).unwrap();
        assert!(content.contains("0.00000 -1.00000 1.00000 0.00000 0.000 100.000 cm"));
        assert!(content.ends_with("Q\n"));
    }

    #[test]
    fn test_opacity_state_is_shared() {
        let mut doc = PdfDocument::new();
        let page = doc.add_page(100.0, 100.0);
        let translucent = GraphicsState {
            opacity: 0.5,
            ..Default::default()
        };
        doc.push_state(page, translucent).unwrap();
        doc.pop_state(page).unwrap();
        doc.push_state(page, translucent).unwrap();
        doc.pop_state(page).unwrap();
        assert_eq!(doc.ext_states.len(), 1);
        assert!(doc.pages[0].ext_states.contains("GS1"));
    }

    #[test]
    fn test_unbalanced_pop() {
        let mut doc = PdfDocument::new();
        let page = doc.add_page(100.0, 100.0);
        assert!(matches!(
            doc.pop_state(page),
            Err(PdfError::UnbalancedState(1))
        ));
    }

    #[test]
    fn test_unclosed_state_fails_on_save() {
        let mut doc = PdfDocument::new();
        let page = doc.add_page(100.0, 100.0);
        doc.push_state(page, GraphicsState::default()).unwrap();
        assert!(matches!(doc.to_bytes(), Err(PdfError::UnbalancedState(1))));
    }

    #[test]
    fn test_can_render_standard_font() {
        let mut doc = PdfDocument::new();
        doc.set_standard_font(true, false, 12.0);
        assert!(doc.can_render("Total: 12,50 é"));
        assert!(!doc.can_render("合计"));
    }

    #[test]
    fn test_to_bytes_header() {
        let mut doc = PdfDocument::new();
        let page = doc.add_page(100.0, 100.0);
        doc.draw_line(
            page,
            (0.0, 0.0),
            (100.0, 100.0),
            &PathStyle::stroked(Color::black(), 1.0),
        )
        .unwrap();
        let bytes = doc.to_bytes().unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));
    }
}
