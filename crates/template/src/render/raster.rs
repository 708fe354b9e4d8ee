//! Raster backend
//!
//! Paints the page at a fixed sampling DPI into a tiny-skia `Pixmap`. Every
//! primitive becomes a path filled or stroked under the node's rotation
//! transform. Glyph outlines come from ab_glyph and go through the same path
//! pipeline, so rotated text needs no special case. Without a registered
//! font, text is left out of the raster.

use super::fonts::FontBook;
use super::layout::{LayoutNode, Primitive, TextLine};
use super::SurfaceBuilder;
use crate::config::DEFAULT_MAX_RASTER_PIXELS;
use crate::model::{Color, FontSpec, HorizontalAlign, PageSettings, Stroke};
use crate::units::{Rect, UnitConverter};
use crate::{Result, TemplateError};
use ab_glyph::{Font, FontArc, Outline, OutlineCurve};
use tiny_skia::{
    FillRule, FilterQuality, IntSize, Paint, Path, PathBuilder, Pixmap, PixmapPaint, StrokeDash,
    Transform,
};

const PLACEHOLDER_GRAY: Color = Color::rgb(0x99, 0x99, 0x99);
const KAPPA: f32 = 0.552_284_8;

/// Paints layout nodes into a pixmap
pub struct RasterBuilder {
    conv: UnitConverter,
    pixmap: Option<Pixmap>,
    fonts: Vec<(String, FontArc)>,
    default_family: Option<String>,
    max_pixels: u64,
    transform: Transform,
    opacity: f64,
}

impl RasterBuilder {
    pub fn new(dpi: f64, book: &FontBook) -> Self {
        let fonts = book
            .faces()
            .iter()
            .filter_map(|face| match FontArc::try_from_vec((*face.data).clone()) {
                Ok(font) => Some((face.family.clone(), font)),
                Err(e) => {
                    log::warn!("Skipping font '{}' for raster output: {}", face.family, e);
                    None
                }
            })
            .collect();
        Self {
            conv: UnitConverter::new(dpi, 1.0),
            pixmap: None,
            fonts,
            default_family: book.default_family().map(str::to_string),
            max_pixels: DEFAULT_MAX_RASTER_PIXELS,
            transform: Transform::identity(),
            opacity: 1.0,
        }
    }

    /// Refuse pages larger than `pixels` in total
    pub fn with_max_pixels(mut self, pixels: u64) -> Self {
        self.max_pixels = pixels;
        self
    }

    fn font(&self, family: Option<&str>) -> Option<&FontArc> {
        let find = |name: &str| self.fonts.iter().find(|(f, _)| f == name).map(|(_, font)| font);
        family
            .and_then(find)
            .or_else(|| self.default_family.as_deref().and_then(find))
            .or_else(|| self.fonts.first().map(|(_, font)| font))
    }

    fn paint(&self, color: Color) -> Paint<'static> {
        let mut paint = Paint::default();
        let alpha = (color.a as f64 * self.opacity).round().clamp(0.0, 255.0) as u8;
        paint.set_color_rgba8(color.r, color.g, color.b, alpha);
        paint.anti_alias = true;
        paint
    }

    fn fill(&mut self, path: &Path, color: Color, transform: Transform) {
        let paint = self.paint(color);
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.fill_path(path, &paint, FillRule::Winding, transform, None);
        }
    }

    fn stroke(&mut self, path: &Path, stroke: &Stroke) {
        let paint = self.paint(stroke.color);
        let style = skia_stroke(stroke);
        let transform = self.transform;
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.stroke_path(path, &paint, &style, transform, None);
        }
    }

    fn rect(&mut self, rect: Rect, radius: f64, stroke: Option<&Stroke>, fill: Option<Color>) {
        let Some(path) = rounded_rect(rect, radius) else {
            return;
        };
        if let Some(fill) = fill {
            self.fill(&path, fill, self.transform);
        }
        if let Some(stroke) = stroke {
            self.stroke(&path, stroke);
        }
    }

    fn ellipse(&mut self, rect: Rect, stroke: Option<&Stroke>, fill: Option<Color>) {
        let Some(path) = skia_rect(rect).and_then(PathBuilder::from_oval) else {
            return;
        };
        if let Some(fill) = fill {
            self.fill(&path, fill, self.transform);
        }
        if let Some(stroke) = stroke {
            self.stroke(&path, stroke);
        }
    }

    fn line(&mut self, from: (f64, f64), to: (f64, f64), stroke: &Stroke) {
        let mut builder = PathBuilder::new();
        builder.move_to(from.0 as f32, from.1 as f32);
        builder.line_to(to.0 as f32, to.1 as f32);
        if let Some(path) = builder.finish() {
            self.stroke(&path, stroke);
        }
    }

    fn image(&mut self, rect: Rect, data: &[u8]) {
        let Some(image) = decode_pixmap(data) else {
            return;
        };
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return;
        }
        let placement = Transform::from_row(
            (rect.width / image.width() as f64) as f32,
            0.0,
            0.0,
            (rect.height / image.height() as f64) as f32,
            rect.x as f32,
            rect.y as f32,
        )
        .post_concat(self.transform);
        let paint = PixmapPaint {
            opacity: self.opacity as f32,
            quality: FilterQuality::Bilinear,
            ..Default::default()
        };
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.draw_pixmap(0, 0, image.as_ref(), &paint, placement, None);
        }
    }

    fn text(&mut self, lines: &[TextLine], spec: &FontSpec, align: HorizontalAlign) {
        let Some(font) = self.font(spec.family.as_deref()).cloned() else {
            log::debug!("No font registered; text left out of raster output");
            return;
        };
        let Some(units_per_em) = font.units_per_em() else {
            return;
        };
        // device pixels per font unit
        let scale = spec.size as f32 / units_per_em;

        for line in lines {
            let glyphs: Vec<_> = line.text.chars().map(|c| font.glyph_id(c)).collect();
            let width: f32 = glyphs.iter().map(|&g| font.h_advance_unscaled(g) * scale).sum();
            let mut caret = match align {
                HorizontalAlign::Left => line.x as f32,
                HorizontalAlign::Center => line.x as f32 - width / 2.0,
                HorizontalAlign::Right => line.x as f32 - width,
            };

            for glyph_id in glyphs {
                let origin = caret;
                caret += font.h_advance_unscaled(glyph_id) * scale;
                let Some(path) = font.outline(glyph_id).as_ref().and_then(glyph_path) else {
                    continue;
                };
                // outlines are y-up in font units
                let transform =
                    Transform::from_row(scale, 0.0, 0.0, -scale, origin, line.baseline as f32)
                        .post_concat(self.transform);
                self.fill(&path, spec.color, transform);
            }
        }
    }

    fn draw(&mut self, primitive: &Primitive) {
        match primitive {
            Primitive::Rect {
                rect,
                radius,
                stroke,
                fill,
            } => self.rect(*rect, *radius, stroke.as_ref(), *fill),
            Primitive::Ellipse { rect, stroke, fill } => {
                self.ellipse(*rect, stroke.as_ref(), *fill)
            }
            Primitive::Line { from, to, stroke } => self.line(*from, *to, stroke),
            Primitive::Text { lines, font, align } => self.text(lines, font, *align),
            Primitive::Image { rect, data } => self.image(*rect, data),
            Primitive::Placeholder { rect, .. } => {
                let stroke = Stroke {
                    color: PLACEHOLDER_GRAY,
                    width: 1.0,
                    dash: None,
                };
                self.rect(*rect, 0.0, Some(&stroke), None);
                self.line((rect.x, rect.y), (rect.right(), rect.bottom()), &stroke);
                self.line((rect.right(), rect.y), (rect.x, rect.bottom()), &stroke);
            }
        }
    }
}

fn skia_rect(rect: Rect) -> Option<tiny_skia::Rect> {
    tiny_skia::Rect::from_xywh(
        rect.x as f32,
        rect.y as f32,
        rect.width as f32,
        rect.height as f32,
    )
}

fn rounded_rect(rect: Rect, radius: f64) -> Option<Path> {
    let bounds = skia_rect(rect)?;
    let r = (radius as f32)
        .min(bounds.width() / 2.0)
        .min(bounds.height() / 2.0);
    if r <= 0.0 {
        return Some(PathBuilder::from_rect(bounds));
    }
    let (l, t, rt, b) = (bounds.left(), bounds.top(), bounds.right(), bounds.bottom());
    let c = r * (1.0 - KAPPA);
    let mut builder = PathBuilder::new();
    builder.move_to(l + r, t);
    builder.line_to(rt - r, t);
    builder.cubic_to(rt - c, t, rt, t + c, rt, t + r);
    builder.line_to(rt, b - r);
    builder.cubic_to(rt, b - c, rt - c, b, rt - r, b);
    builder.line_to(l + r, b);
    builder.cubic_to(l + c, b, l, b - c, l, b - r);
    builder.line_to(l, t + r);
    builder.cubic_to(l, t + c, l + c, t, l + r, t);
    builder.close();
    builder.finish()
}

/// Stroke style in device pixels, at least one pixel wide
fn skia_stroke(stroke: &Stroke) -> tiny_skia::Stroke {
    let dash = stroke.dash.as_ref().and_then(|pattern| {
        let mut intervals: Vec<f32> = pattern.iter().map(|&v| v as f32).collect();
        // an odd pattern repeats to make on/off pairs
        if intervals.len() % 2 == 1 {
            intervals.extend_from_within(..);
        }
        let dash = StrokeDash::new(intervals, 0.0);
        if dash.is_none() {
            log::debug!("Ignoring unusable dash pattern {:?}", pattern);
        }
        dash
    });
    tiny_skia::Stroke {
        width: stroke.width.max(1.0) as f32,
        dash,
        ..Default::default()
    }
}

fn glyph_path(outline: &Outline) -> Option<Path> {
    let mut builder = PathBuilder::new();
    let mut last = None;
    for curve in &outline.curves {
        let (start, end) = match *curve {
            OutlineCurve::Line(a, b) => (a, b),
            OutlineCurve::Quad(a, _, b) => (a, b),
            OutlineCurve::Cubic(a, _, _, b) => (a, b),
        };
        if last != Some(start) {
            if last.is_some() {
                builder.close();
            }
            builder.move_to(start.x, start.y);
        }
        match *curve {
            OutlineCurve::Line(_, b) => builder.line_to(b.x, b.y),
            OutlineCurve::Quad(_, c, b) => builder.quad_to(c.x, c.y, b.x, b.y),
            OutlineCurve::Cubic(_, c1, c2, b) => builder.cubic_to(c1.x, c1.y, c2.x, c2.y, b.x, b.y),
        }
        last = Some(end);
    }
    if last.is_some() {
        builder.close();
    }
    builder.finish()
}

/// Decode image bytes into a premultiplied pixmap
fn decode_pixmap(data: &[u8]) -> Option<Pixmap> {
    let decoded = match image::load_from_memory(data) {
        Ok(img) => img.to_rgba8(),
        Err(e) => {
            log::warn!("Cannot decode image for raster output: {}", e);
            return None;
        }
    };
    let size = IntSize::from_wh(decoded.width(), decoded.height())?;
    let mut pixels = decoded.into_raw();
    for px in pixels.chunks_exact_mut(4) {
        let a = px[3] as u16;
        for channel in &mut px[..3] {
            *channel = ((*channel as u16 * a + 127) / 255) as u8;
        }
    }
    Pixmap::from_vec(pixels, size)
}

impl SurfaceBuilder for RasterBuilder {
    type Output = Pixmap;

    fn begin_page(&mut self, page: &PageSettings) -> Result<()> {
        let (width, height) = page.effective_size();
        let (w, h) = (
            self.conv.to_device(width).round(),
            self.conv.to_device(height).round(),
        );
        if !(w >= 1.0 && h >= 1.0) || w * h > self.max_pixels as f64 {
            return Err(TemplateError::Config(format!(
                "cannot rasterize a {w}x{h} pixel page (limit {} pixels)",
                self.max_pixels
            )));
        }
        let mut pixmap = Pixmap::new(w as u32, h as u32).ok_or_else(|| {
            TemplateError::Image(format!("cannot allocate a {w}x{h} pixel page"))
        })?;
        let background = page.background.unwrap_or(Color::WHITE);
        pixmap.fill(tiny_skia::Color::from_rgba8(
            background.r,
            background.g,
            background.b,
            255,
        ));
        self.pixmap = Some(pixmap);
        Ok(())
    }

    fn build_node(&mut self, node: &LayoutNode) -> Result<()> {
        let rect = self.conv.rect_to_device(&node.rect);
        self.transform = if node.rotation != 0.0 {
            let (cx, cy) = rect.center();
            Transform::from_rotate_at(node.rotation as f32, cx as f32, cy as f32)
        } else {
            Transform::identity()
        };
        self.opacity = node.opacity;
        for primitive in &node.primitives {
            let primitive = primitive.to_device(&self.conv);
            self.draw(&primitive);
        }
        self.transform = Transform::identity();
        self.opacity = 1.0;
        Ok(())
    }

    fn finish(self) -> Result<Pixmap> {
        self.pixmap
            .ok_or_else(|| TemplateError::Image("no page was rasterized".into()))
    }
}

/// Encode a raster page as PNG
pub fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>> {
    pixmap
        .encode_png()
        .map_err(|e| TemplateError::Image(e.to_string()))
}
