//! Paginated (PDF) backend

use super::fonts::FontBook;
use super::layout::{LayoutNode, Primitive};
use super::SurfaceBuilder;
use crate::model::{Color, FontSpec, PageSettings, Stroke};
use crate::units::{mm_to_point, UnitConverter};
use crate::{Result, TemplateError};
use pdf_core::{GraphicsState, PathStyle, PdfDocument};

const PLACEHOLDER_GRAY: Color = Color::rgb(0x99, 0x99, 0x99);

/// Writes one page per document into a [`PdfDocument`]
pub struct PdfBuilder<'a> {
    doc: PdfDocument,
    page: usize,
    fonts: &'a FontBook,
    conv: UnitConverter,
}

impl<'a> PdfBuilder<'a> {
    pub fn new(fonts: &'a FontBook) -> Result<Self> {
        let mut doc = PdfDocument::new();
        for face in fonts.faces() {
            doc.add_font(&face.family, &face.data)?;
        }
        Ok(Self {
            doc,
            page: 0,
            fonts,
            conv: UnitConverter::points(),
        })
    }

    /// Set document title and author
    pub fn set_info(&mut self, title: Option<&str>, author: Option<&str>) {
        self.doc.set_info(title, author);
    }

    fn page(&self) -> Result<usize> {
        if self.page == 0 {
            return Err(TemplateError::Validation("no page started".into()));
        }
        Ok(self.page)
    }

    fn draw(&mut self, primitive: &Primitive) -> Result<()> {
        let page = self.page()?;
        match primitive {
            Primitive::Rect {
                rect,
                radius,
                stroke,
                fill,
            } => {
                let style = path_style(stroke.as_ref(), *fill);
                self.doc
                    .draw_rect(page, rect.x, rect.y, rect.width, rect.height, *radius, &style)?;
            }
            Primitive::Ellipse { rect, stroke, fill } => {
                let style = path_style(stroke.as_ref(), *fill);
                self.doc
                    .draw_ellipse(page, rect.x, rect.y, rect.width, rect.height, &style)?;
            }
            Primitive::Line { from, to, stroke } => {
                self.doc
                    .draw_line(page, *from, *to, &path_style(Some(stroke), None))?;
            }
            Primitive::Text { lines, font, align } => {
                for line in lines {
                    self.select_font(font, &line.text)?;
                    self.doc
                        .insert_text(&line.text, page, line.x, line.baseline, (*align).into())?;
                }
            }
            Primitive::Image { rect, data } => {
                self.doc
                    .insert_image(data, page, rect.x, rect.y, rect.width, rect.height)?;
            }
            Primitive::Placeholder { rect, .. } => {
                let style = PathStyle::stroked(PLACEHOLDER_GRAY.to_pdf(), 0.5);
                self.doc
                    .draw_rect(page, rect.x, rect.y, rect.width, rect.height, 0.0, &style)?;
                self.doc
                    .draw_line(page, (rect.x, rect.y), (rect.right(), rect.bottom()), &style)?;
                self.doc
                    .draw_line(page, (rect.right(), rect.y), (rect.x, rect.bottom()), &style)?;
            }
        }
        Ok(())
    }

    /// Registered face when it covers the text, else the standard font
    fn select_font(&mut self, font: &FontSpec, text: &str) -> Result<()> {
        let size = font.size as f32;
        match self.fonts.resolve(font.family.as_deref()) {
            Some(face) => {
                self.doc.set_font(&face.family, size)?;
                if !self.doc.can_render(text) {
                    log::debug!(
                        "Font '{}' lacks glyphs for '{}', using standard font",
                        face.family,
                        text
                    );
                    self.doc.set_standard_font(font.bold, font.italic, size);
                }
            }
            None => self.doc.set_standard_font(font.bold, font.italic, size),
        }
        self.doc.set_text_color(font.color.to_pdf());
        Ok(())
    }
}

fn path_style(stroke: Option<&Stroke>, fill: Option<Color>) -> PathStyle {
    PathStyle {
        stroke: stroke.map(|s| s.color.to_pdf()),
        line_width: stroke.map(|s| s.width).unwrap_or(0.0),
        fill: fill.filter(|c| !c.is_transparent()).map(Color::to_pdf),
        dash: stroke.and_then(|s| s.dash.clone()),
    }
}

impl SurfaceBuilder for PdfBuilder<'_> {
    type Output = Vec<u8>;

    fn begin_page(&mut self, page: &PageSettings) -> Result<()> {
        let (width, height) = page.effective_size();
        self.page = self.doc.add_page(mm_to_point(width), mm_to_point(height));

        let content = page.content_rect();
        if content.width > 0.0 && content.height > 0.0 {
            let art = self.conv.rect_to_device(&content);
            self.doc
                .set_art_box(self.page, art.x, art.y, art.width, art.height)?;
        }

        if let Some(background) = page.background {
            self.doc.draw_rect(
                self.page,
                0.0,
                0.0,
                mm_to_point(width),
                mm_to_point(height),
                0.0,
                &PathStyle::filled(background.to_pdf()),
            )?;
        }
        Ok(())
    }

    fn build_node(&mut self, node: &LayoutNode) -> Result<()> {
        let page = self.page()?;
        let rect = self.conv.rect_to_device(&node.rect);
        let grouped = node.rotation != 0.0 || node.opacity < 1.0;

        if grouped {
            self.doc.push_state(
                page,
                GraphicsState {
                    rotation: node.rotation,
                    origin: rect.center(),
                    opacity: node.opacity as f32,
                },
            )?;
        }
        for primitive in &node.primitives {
            self.draw(&primitive.to_device(&self.conv))?;
        }
        if grouped {
            self.doc.pop_state(page)?;
        }
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>> {
        Ok(self.doc.to_bytes()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::build_page;
    use crate::render::layout::TextLine;
    use crate::units::Rect;
    use pretty_assertions::assert_eq;

    fn node(primitives: Vec<Primitive>, rotation: f64) -> LayoutNode {
        LayoutNode {
            id: "n".into(),
            tag: "rectangle",
            rect: Rect::new(10.0, 10.0, 50.0, 20.0),
            rotation,
            z_index: 0,
            opacity: 1.0,
            content: None,
            primitives,
            table: None,
            diagnostics: Vec::new(),
        }
    }

    fn content(bytes: &[u8]) -> String {
        let doc = lopdf::Document::load_mem(bytes).unwrap();
        let pages = doc.get_pages();
        String::from_utf8_lossy(&doc.get_page_content(pages[&1]).unwrap()).into_owned()
    }

    #[test]
    fn test_page_size_in_points() {
        let fonts = FontBook::new();
        let page = PageSettings::default();
        let bytes = build_page(PdfBuilder::new(&fonts).unwrap(), &page, &Vec::<LayoutNode>::new())
            .unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        let dict = doc.get_object(pages[&1]).unwrap().as_dict().unwrap();
        let media: Vec<f32> = dict
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o.as_float().unwrap())
            .collect();
        assert!((media[2] - 595.28).abs() < 0.01);
        assert!((media[3] - 841.89).abs() < 0.01);
    }

    #[test]
    fn test_text_in_standard_font() {
        let fonts = FontBook::new();
        let text = Primitive::Text {
            lines: vec![TextLine {
                text: "Glucose".into(),
                x: 10.0,
                baseline: 20.0,
            }],
            font: FontSpec::default(),
            align: Default::default(),
        };
        let bytes = build_page(
            PdfBuilder::new(&fonts).unwrap(),
            &PageSettings::default(),
            &[node(vec![text], 0.0)],
        )
        .unwrap();
        assert!(content(&bytes).contains("(Glucose) Tj"));
    }

    #[test]
    fn test_rotated_node_is_grouped() {
        let fonts = FontBook::new();
        let rect = Primitive::Rect {
            rect: Rect::new(10.0, 10.0, 50.0, 20.0),
            radius: 0.0,
            stroke: Some(Stroke::default()),
            fill: None,
        };
        let bytes = build_page(
            PdfBuilder::new(&fonts).unwrap(),
            &PageSettings::default(),
            &[node(vec![rect], 30.0)],
        )
        .unwrap();
        let ops = content(&bytes);
        assert!(ops.starts_with("q\n"));
        assert!(ops.contains(" cm\n"));
        // outer group plus the rectangle's own save/restore
        assert_eq!(ops.matches("q\n").count(), 2);
        assert_eq!(ops.matches("Q\n").count(), 2);
    }

    #[test]
    fn test_no_page_started() {
        let fonts = FontBook::new();
        let mut builder = PdfBuilder::new(&fonts).unwrap();
        assert!(builder.build_node(&node(Vec::new(), 0.0)).is_err());
    }
}
