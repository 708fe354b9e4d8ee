//! Integration tests for pdf-core
//!
//! These tests build real documents and read them back with lopdf.

use image::{ImageBuffer, ImageFormat, Rgb};
use pdf_core::{Align, Color, GraphicsState, PathStyle, PdfDocument, PdfError};
use pretty_assertions::assert_eq;
use std::io::Cursor;

const A4_WIDTH: f64 = 595.28;
const A4_HEIGHT: f64 = 841.89;

fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_pixel(width, height, Rgb([200u8, 10, 10]));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

fn reload(doc: PdfDocument) -> lopdf::Document {
    let bytes = doc.to_bytes().unwrap();
    lopdf::Document::load_mem(&bytes).unwrap()
}

fn page_dict(doc: &lopdf::Document, page: u32) -> lopdf::Dictionary {
    let pages = doc.get_pages();
    doc.get_object(pages[&page])
        .unwrap()
        .as_dict()
        .unwrap()
        .clone()
}

fn page_text(doc: &lopdf::Document, page: u32) -> String {
    let pages = doc.get_pages();
    String::from_utf8_lossy(&doc.get_page_content(pages[&page]).unwrap()).into_owned()
}

fn resource_names(doc: &lopdf::Document, page: u32, kind: &[u8]) -> Vec<String> {
    let dict = page_dict(doc, page);
    let resources = dict.get(b"Resources").unwrap().as_dict().unwrap();
    match resources.get(kind) {
        Ok(obj) => obj
            .as_dict()
            .unwrap()
            .iter()
            .map(|(k, _)| String::from_utf8_lossy(k).into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[test]
fn test_empty_document_has_no_pages() {
    let doc = reload(PdfDocument::new());
    assert_eq!(doc.get_pages().len(), 0);
}

#[test]
fn test_pages_keep_their_size() {
    let mut doc = PdfDocument::new();
    doc.add_page(A4_WIDTH, A4_HEIGHT);
    doc.add_page(A4_HEIGHT, A4_WIDTH);
    let doc = reload(doc);

    assert_eq!(doc.get_pages().len(), 2);
    let media_box = page_dict(&doc, 2)
        .get(b"MediaBox")
        .unwrap()
        .as_array()
        .unwrap()
        .clone();
    let width = media_box[2].as_float().unwrap();
    assert!((width as f64 - A4_HEIGHT).abs() < 0.01);
}

#[test]
fn test_art_box_marks_margins() {
    let mut doc = PdfDocument::new();
    let page = doc.add_page(200.0, 100.0);
    doc.set_art_box(page, 10.0, 5.0, 180.0, 80.0).unwrap();
    let doc = reload(doc);

    let art_box: Vec<f32> = page_dict(&doc, 1)
        .get(b"ArtBox")
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o.as_float().unwrap())
        .collect();
    assert_eq!(art_box, vec![10.0, 15.0, 190.0, 95.0]);
}

#[test]
fn test_standard_font_text() {
    let mut doc = PdfDocument::new();
    let page = doc.add_page(A4_WIDTH, A4_HEIGHT);
    doc.set_standard_font(true, false, 14.0);
    doc.set_text_color(Color::from_rgb(255, 0, 0));
    doc.insert_text("Invoice", page, 72.0, 72.0, Align::Left)
        .unwrap();
    let doc = reload(doc);

    let content = page_text(&doc, 1);
    assert!(content.contains("(Invoice) Tj"));
    assert!(content.contains("1 0 0 rg"));
    assert_eq!(resource_names(&doc, 1, b"Font"), vec!["F1".to_string()]);
}

#[test]
fn test_empty_text_is_skipped() {
    let mut doc = PdfDocument::new();
    let page = doc.add_page(100.0, 100.0);
    doc.insert_text("", page, 0.0, 0.0, Align::Left).unwrap();
    let doc = reload(doc);

    assert!(!page_text(&doc, 1).contains("Tj"));
    assert!(resource_names(&doc, 1, b"Font").is_empty());
}

#[test]
fn test_image_is_embedded_once() {
    let png = png_fixture(20, 10);
    let mut doc = PdfDocument::new();
    let first = doc.add_page(200.0, 200.0);
    let second = doc.add_page(200.0, 200.0);
    doc.insert_image(&png, first, 10.0, 10.0, 40.0, 20.0).unwrap();
    doc.insert_image(&png, second, 50.0, 50.0, 40.0, 20.0).unwrap();
    let doc = reload(doc);

    assert_eq!(resource_names(&doc, 1, b"XObject"), vec!["Im1".to_string()]);
    assert_eq!(resource_names(&doc, 2, b"XObject"), vec!["Im1".to_string()]);
    let images = doc
        .objects
        .values()
        .filter(|o| {
            o.as_stream()
                .ok()
                .and_then(|s| s.dict.get(b"Subtype").ok())
                .and_then(|t| t.as_name().ok())
                == Some(&b"Image"[..])
        })
        .count();
    assert_eq!(images, 1);
}

#[test]
fn test_invalid_image_data() {
    let mut doc = PdfDocument::new();
    let page = doc.add_page(100.0, 100.0);
    let result = doc.insert_image(b"not an image", page, 0.0, 0.0, 10.0, 10.0);
    assert!(matches!(result, Err(PdfError::ImageError(_))));
}

#[test]
fn test_shapes_and_rotated_group() {
    let mut doc = PdfDocument::new();
    let page = doc.add_page(100.0, 100.0);
    doc.push_state(
        page,
        GraphicsState {
            rotation: 45.0,
            origin: (50.0, 50.0),
            opacity: 0.25,
        },
    )
    .unwrap();
    doc.draw_rect(
        page,
        10.0,
        10.0,
        80.0,
        80.0,
        0.0,
        &PathStyle::filled(Color::white()),
    )
    .unwrap();
    doc.draw_ellipse(
        page,
        20.0,
        20.0,
        60.0,
        40.0,
        &PathStyle::stroked(Color::black(), 1.0),
    )
    .unwrap();
    doc.pop_state(page).unwrap();
    let doc = reload(doc);

    let content = page_text(&doc, 1);
    assert!(content.contains("/GS1 gs"));
    assert!(content.contains(" cm"));
    assert!(content.contains("10.000 10.000 80.000 80.000 re"));
    assert_eq!(resource_names(&doc, 1, b"ExtGState"), vec!["GS1".to_string()]);
}

#[test]
fn test_document_info() {
    let mut doc = PdfDocument::new();
    doc.add_page(100.0, 100.0);
    doc.set_info(Some("Monthly report"), Some("ops"));
    let doc = reload(doc);

    let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
    let info = doc.get_object(info_id).unwrap().as_dict().unwrap();
    assert_eq!(
        info.get(b"Title").unwrap().as_str().unwrap(),
        b"Monthly report"
    );
}

#[test]
fn test_save_to_file() {
    let dir = std::env::temp_dir().join("pdf-core-save-test");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("out.pdf");

    let mut doc = PdfDocument::new();
    doc.add_page(100.0, 100.0);
    doc.save(&path).unwrap();

    let loaded = lopdf::Document::load(&path).unwrap();
    assert_eq!(loaded.get_pages().len(), 1);
    std::fs::remove_file(&path).ok();
}
