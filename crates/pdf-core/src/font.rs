//! Font handling for PDF documents

use crate::{PdfError, Result};
use lopdf::{Dictionary, Object, Stream};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Average glyph advance of the standard fonts, as a fraction of the font size
pub const STANDARD_ADVANCE_FACTOR: f64 = 0.6;

/// One of the built-in PDF base-14 Helvetica faces
///
/// Used whenever no TrueType font has been registered for a family. The
/// standard fonts only cover WinAnsi (Latin-1) text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
}

impl StandardFont {
    /// Pick the Helvetica face for a weight/style combination
    pub fn helvetica(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (false, false) => StandardFont::Helvetica,
            (true, false) => StandardFont::HelveticaBold,
            (false, true) => StandardFont::HelveticaOblique,
            (true, true) => StandardFont::HelveticaBoldOblique,
        }
    }

    /// PostScript base font name
    pub fn base_font(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::HelveticaOblique => "Helvetica-Oblique",
            StandardFont::HelveticaBoldOblique => "Helvetica-BoldOblique",
        }
    }

    /// Estimated text width in points
    pub fn text_width_points(&self, text: &str, font_size: f32) -> f64 {
        text.chars().count() as f64 * font_size as f64 * STANDARD_ADVANCE_FACTOR
    }

    /// Type1 font dictionary
    pub fn to_pdf_dictionary(&self) -> Dictionary {
        Dictionary::from_iter(vec![
            ("Type", "Font".into()),
            ("Subtype", "Type1".into()),
            ("BaseFont", Object::Name(self.base_font().as_bytes().to_vec())),
            ("Encoding", "WinAnsiEncoding".into()),
        ])
    }
}

/// Font data structure for embedded TrueType fonts
#[derive(Debug, Clone)]
pub struct FontData {
    /// Font name/identifier
    pub name: String,
    /// Raw TTF data
    ttf_data: Arc<Vec<u8>>,
    /// Characters used (for the widths array and ToUnicode map)
    pub used_chars: BTreeSet<char>,
}

/// PDF objects generated for font embedding
pub struct FontObjects {
    /// Type0 font dictionary
    pub type0_font: Dictionary,
    /// CIDFont Type2 dictionary
    pub cid_font: Dictionary,
    /// Font descriptor dictionary
    pub font_descriptor: Dictionary,
    /// Font file stream (TTF data)
    pub font_file_stream: Stream,
    /// ToUnicode CMap stream
    pub tounicode_stream: Stream,
}

impl FontData {
    /// Create font data from TTF bytes
    ///
    /// # Arguments
    /// * `name` - Font identifier
    /// * `ttf_data` - TrueType font file bytes
    pub fn from_ttf(name: &str, ttf_data: &[u8]) -> Result<Self> {
        ttf_parser::Face::parse(ttf_data, 0)
            .map_err(|e| PdfError::FontParseError(format!("{e:?}")))?;

        Ok(Self {
            name: name.to_string(),
            ttf_data: Arc::new(ttf_data.to_vec()),
            used_chars: BTreeSet::new(),
        })
    }

    /// Parsed face; the data was validated in `from_ttf`
    fn face(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.ttf_data, 0).ok()
    }

    /// Add characters to the used set
    pub fn add_chars(&mut self, text: &str) {
        self.used_chars.extend(text.chars());
    }

    /// Get glyph ID for a character
    pub fn glyph_id(&self, c: char) -> Option<u16> {
        self.face()
            .and_then(|face| face.glyph_index(c).map(|id| id.0))
    }

    /// Check if font has a glyph for the given character
    pub fn has_glyph(&self, c: char) -> bool {
        self.glyph_id(c).map(|id| id != 0).unwrap_or(false)
    }

    /// Get font units per em
    pub fn units_per_em(&self) -> u16 {
        self.face().map(|face| face.units_per_em()).unwrap_or(1000)
    }

    /// Calculate text width in points for a given font size
    pub fn text_width_points(&self, text: &str, font_size: f32) -> f64 {
        let Some(face) = self.face() else {
            return 0.0;
        };
        let units: u32 = text
            .chars()
            .filter_map(|c| {
                let gid = face.glyph_index(c)?;
                face.glyph_hor_advance(gid)
            })
            .map(u32::from)
            .sum();
        (units as f64 / face.units_per_em() as f64) * font_size as f64
    }

    /// Encode text as hex string for PDF Tj operator
    pub fn encode_text_hex(&self, text: &str) -> String {
        let Some(face) = self.face() else {
            return "<>".to_string();
        };
        let mut result = String::with_capacity(text.len() * 4 + 2);
        result.push('<');
        for c in text.chars() {
            let gid = face.glyph_index(c).map(|id| id.0).unwrap_or(0);
            result.push_str(&format!("{gid:04X}"));
        }
        result.push('>');
        result
    }

    /// Generate all PDF objects needed to embed this font
    ///
    /// References between the objects are left as placeholders and wired
    /// up by the document when embedding.
    pub fn to_pdf_objects(&self) -> Result<FontObjects> {
        let face = self
            .face()
            .ok_or_else(|| PdfError::FontParseError(self.name.clone()))?;
        let font_name = Object::Name(self.name.replace(' ', "-").into_bytes());

        let tounicode_content = self.generate_tounicode_cmap(&face);
        let tounicode_stream = Stream::new(
            Dictionary::from_iter(vec![("Type", "CMap".into())]),
            tounicode_content.into_bytes(),
        );

        let font_file_stream = Stream::new(
            Dictionary::from_iter(vec![("Length1", (self.ttf_data.len() as i64).into())]),
            self.ttf_data.as_ref().clone(),
        );

        let units_per_em = face.units_per_em() as f64;
        let scale = |v: i16| ((v as f64) * 1000.0 / units_per_em).round() as i64;
        let ascender = scale(face.ascender());
        let descender = scale(face.descender());
        let bbox = face.global_bounding_box();

        let font_descriptor = Dictionary::from_iter(vec![
            ("Type", "FontDescriptor".into()),
            ("FontName", font_name.clone()),
            ("Flags", 4.into()),
            (
                "FontBBox",
                vec![
                    scale(bbox.x_min).into(),
                    scale(bbox.y_min).into(),
                    scale(bbox.x_max).into(),
                    scale(bbox.y_max).into(),
                ]
                .into(),
            ),
            ("ItalicAngle", 0.into()),
            ("Ascent", ascender.into()),
            ("Descent", descender.into()),
            ("CapHeight", ascender.into()),
            ("StemV", 80.into()),
        ]);

        let cid_system_info = Dictionary::from_iter(vec![
            ("Registry", Object::string_literal("Adobe")),
            ("Ordering", Object::string_literal("Identity")),
            ("Supplement", 0.into()),
        ]);

        let cid_font = Dictionary::from_iter(vec![
            ("Type", "Font".into()),
            ("Subtype", "CIDFontType2".into()),
            ("BaseFont", font_name.clone()),
            ("CIDSystemInfo", cid_system_info.into()),
            ("CIDToGIDMap", "Identity".into()),
            ("W", self.generate_widths_array(&face).into()),
            ("DW", 1000.into()),
        ]);

        let type0_font = Dictionary::from_iter(vec![
            ("Type", "Font".into()),
            ("Subtype", "Type0".into()),
            ("BaseFont", font_name),
            ("Encoding", "Identity-H".into()),
        ]);

        Ok(FontObjects {
            type0_font,
            cid_font,
            font_descriptor,
            font_file_stream,
            tounicode_stream,
        })
    }

    /// Generate /W array for the glyphs used in the document
    fn generate_widths_array(&self, face: &ttf_parser::Face<'_>) -> Vec<Object> {
        let units_per_em = face.units_per_em() as f64;
        let mut gids: Vec<u16> = self
            .used_chars
            .iter()
            .filter_map(|&c| face.glyph_index(c).map(|g| g.0))
            .collect();
        gids.sort_unstable();
        gids.dedup();

        let mut widths = Vec::with_capacity(gids.len() * 2);
        for gid in gids {
            let advance = face
                .glyph_hor_advance(ttf_parser::GlyphId(gid))
                .unwrap_or(0) as f64;
            let width = (advance * 1000.0 / units_per_em).round() as i64;
            widths.push(Object::Integer(gid as i64));
            widths.push(vec![Object::Integer(width)].into());
        }
        widths
    }

    /// Generate ToUnicode CMap stream content
    fn generate_tounicode_cmap(&self, face: &ttf_parser::Face<'_>) -> String {
        let mut cmap = String::new();
        cmap.push_str("/CIDInit /ProcSet findresource begin\n");
        cmap.push_str("12 dict begin\n");
        cmap.push_str("begincmap\n");
        cmap.push_str("/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
        cmap.push_str("/CMapName /Adobe-Identity-UCS def\n");
        cmap.push_str("/CMapType 2 def\n");
        cmap.push_str("1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n");

        let mappings: Vec<(u16, char)> = self
            .used_chars
            .iter()
            .filter_map(|&c| face.glyph_index(c).map(|g| (g.0, c)))
            .collect();

        // bfchar sections are limited to 100 entries each
        for chunk in mappings.chunks(100) {
            cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
            for (gid, c) in chunk {
                let mut utf16 = [0u16; 2];
                let hex: String = c
                    .encode_utf16(&mut utf16)
                    .iter()
                    .map(|u| format!("{u:04X}"))
                    .collect();
                cmap.push_str(&format!("<{gid:04X}> <{hex}>\n"));
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\n");
        cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
        cmap.push_str("end\nend\n");
        cmap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_ttf_rejected() {
        let result = FontData::from_ttf("broken", &[0, 1, 2, 3]);
        assert!(matches!(result, Err(PdfError::FontParseError(_))));
    }

    #[test]
    fn test_standard_font_selection() {
        assert_eq!(StandardFont::helvetica(false, false), StandardFont::Helvetica);
        assert_eq!(StandardFont::helvetica(true, true).base_font(), "Helvetica-BoldOblique");
    }

    #[test]
    fn test_standard_font_width_heuristic() {
        let width = StandardFont::Helvetica.text_width_points("abcd", 10.0);
        assert!((width - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_standard_font_dictionary() {
        let dict = StandardFont::HelveticaBold.to_pdf_dictionary();
        assert_eq!(
            dict.get(b"BaseFont").unwrap().as_name().unwrap(),
            b"Helvetica-Bold"
        );
        assert_eq!(dict.get(b"Subtype").unwrap().as_name().unwrap(), b"Type1");
    }
}
