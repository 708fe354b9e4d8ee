//! Template JSON serialization and validation

use crate::model::TemplateDocument;
use crate::{Result, TemplateError};
use std::collections::HashSet;
use std::path::Path;

/// Serialize a document to pretty-printed JSON
pub fn serialize(document: &TemplateDocument) -> Result<String> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// Parse a document from JSON
pub fn deserialize(json: &str) -> Result<TemplateDocument> {
    serde_json::from_str(json).map_err(|e| TemplateError::Parse(e.to_string()))
}

pub fn validate(document: &TemplateDocument) -> bool {
    match validate_detailed(document) {
        Ok(()) => true,
        Err(e) => {
            log::debug!("Template '{}' is invalid: {}", document.metadata.id, e);
            false
        }
    }
}

/// Check page and element geometry, stopping at the first problem
///
/// Element boxes must lie within the page as oriented. An empty element
/// list is valid.
pub fn validate_detailed(document: &TemplateDocument) -> Result<()> {
    let page = &document.page;
    if !(page.width > 0.0 && page.height > 0.0) {
        return Err(TemplateError::Validation(format!(
            "page size must be positive, got {} x {} mm",
            page.width, page.height
        )));
    }
    let (page_width, page_height) = page.effective_size();

    let mut seen = HashSet::new();
    for element in &document.elements {
        let id = &element.id;
        let g = &element.geometry;
        if id.is_empty() {
            return Err(TemplateError::Validation("element without id".into()));
        }
        if !seen.insert(id.as_str()) {
            return Err(TemplateError::Validation(format!("duplicate element id '{id}'")));
        }
        if !(g.width > 0.0 && g.height > 0.0) {
            return Err(TemplateError::Validation(format!(
                "element '{id}' has non-positive size {} x {}",
                g.width, g.height
            )));
        }
        if !(g.x >= 0.0 && g.y >= 0.0) {
            return Err(TemplateError::Validation(format!(
                "element '{id}' has negative position ({}, {})",
                g.x, g.y
            )));
        }
        if g.x + g.width > page_width {
            return Err(TemplateError::Validation(format!(
                "element '{id}' overflows the page width: {} + {} > {}",
                g.x, g.width, page_width
            )));
        }
        if g.y + g.height > page_height {
            return Err(TemplateError::Validation(format!(
                "element '{id}' overflows the page height: {} + {} > {}",
                g.y, g.height, page_height
            )));
        }
    }
    Ok(())
}

pub fn save_to_file<P: AsRef<Path>>(document: &TemplateDocument, path: P) -> Result<()> {
    let json = serialize(document)?;
    std::fs::write(path.as_ref(), json)?;
    log::debug!("Saved template to {}", path.as_ref().display());
    Ok(())
}

pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<TemplateDocument> {
    let json = std::fs::read_to_string(path.as_ref())?;
    deserialize(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;
    use pretty_assertions::assert_eq;

    fn geometry(x: f64, y: f64, width: f64, height: f64) -> Geometry {
        Geometry {
            x,
            y,
            width,
            height,
            ..Default::default()
        }
    }

    fn bound(path: &str) -> Option<ElementBinding> {
        Some(ElementBinding {
            path: path.to_string(),
            format: None,
        })
    }

    fn every_variant() -> TemplateDocument {
        let mut doc = TemplateDocument::new(210.0, 297.0);
        doc.metadata.id = "lab-report".into();
        doc.metadata.version = 3;
        let g = geometry(10.0, 10.0, 40.0, 12.5);
        let kinds = vec![
            ElementKind::Text(TextElement {
                content: "Name".into(),
                word_wrap: true,
                binding: Some(ElementBinding {
                    path: "Patient.BirthDate".into(),
                    format: Some("yyyy-MM-dd".into()),
                }),
                ..Default::default()
            }),
            ElementKind::Label(LabelElement {
                text: "Result".into(),
                align: HorizontalAlign::Center,
                ..Default::default()
            }),
            ElementKind::Image(ImageElement {
                path: Some("logo.png".into()),
                scale_mode: ScaleMode::Stretch,
                ..Default::default()
            }),
            ElementKind::Line(LineElement {
                start: Point { x: 0.0, y: 0.0 },
                end: Point { x: 40.0, y: 0.0 },
                stroke: Stroke {
                    dash: Some(vec![2.0, 1.0]),
                    ..Default::default()
                },
            }),
            ElementKind::Rectangle(RectangleElement {
                fill: Some(Color::LIGHT_GRAY),
                corner_radius: 2.0,
                ..Default::default()
            }),
            ElementKind::Ellipse(EllipseElement {
                stroke: Some(Stroke::default()),
                ..Default::default()
            }),
            ElementKind::Barcode(BarcodeElement {
                value: "HN-000123".into(),
                symbology: Symbology::Qr,
                binding: bound("Patient.Hn"),
                ..Default::default()
            }),
            ElementKind::Signature(SignatureElement {
                caption: Some("Reported by".into()),
                binding: bound("Doctor.Signature"),
                ..Default::default()
            }),
            ElementKind::AutoNumber(AutoNumberElement {
                prefix: "No. ".into(),
                digits: 4,
                sequence: Some("page".into()),
                ..Default::default()
            }),
            ElementKind::Table(TableElement {
                rows: 2,
                columns: 2,
                cells: vec![
                    TableCell::new(0, 0, "Test"),
                    TableCell {
                        binding: bound("Results[0].Value"),
                        ..TableCell::new(1, 1, "-")
                    },
                ],
                column_widths: vec![20.0, 0.0],
                grid_lines: None,
                ..Default::default()
            }),
            ElementKind::LabelInputBox(LabelInputBoxElement {
                label: "HN".into(),
                binding: bound("Patient.Hn"),
                ..Default::default()
            }),
        ];
        for (i, kind) in kinds.into_iter().enumerate() {
            let mut element = ElementNode::new(format!("e{i}"), g, kind);
            element.geometry.z_index = i as i32;
            doc.elements.push(element);
        }
        doc.bindings.push(DataBinding {
            element_id: "e0".into(),
            data_path: "Patient.Name".into(),
            format_string: None,
        });
        doc
    }

    #[test]
    fn test_round_trip_every_variant() {
        let doc = every_variant();
        let json = serialize(&doc).unwrap();
        let back = deserialize(&json).unwrap();
        assert_eq!(back, doc);
        for (a, b) in doc.elements.iter().zip(&back.elements) {
            assert_eq!(a.kind.tag(), b.kind.tag());
        }
    }

    #[test]
    fn test_unknown_type_is_unsupported() {
        let doc = deserialize(
            r#"{
                "page": { "width": 210, "height": 297 },
                "elements": [
                    { "id": "x", "type": "chart", "x": 1, "y": 1, "width": 5, "height": 5 }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(doc.elements[0].kind, ElementKind::Unsupported);
        assert!(validate(&doc));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(deserialize("{"), Err(TemplateError::Parse(_))));
        assert!(matches!(
            deserialize(r#"{ "elements": [] }"#),
            Err(TemplateError::Parse(_))
        ));
    }

    #[test]
    fn test_validate_page_size() {
        assert!(validate(&TemplateDocument::new(210.0, 297.0)));
        assert!(!validate(&TemplateDocument::new(0.0, 297.0)));
        assert!(!validate(&TemplateDocument::new(210.0, -1.0)));
    }

    fn with_element(x: f64, y: f64, width: f64, height: f64) -> TemplateDocument {
        let mut doc = TemplateDocument::new(210.0, 297.0);
        doc.elements.push(ElementNode::new(
            "e1",
            geometry(x, y, width, height),
            ElementKind::Label(LabelElement::default()),
        ));
        doc
    }

    #[test]
    fn test_validate_geometry() {
        assert!(validate(&with_element(0.0, 0.0, 210.0, 297.0)));
        assert!(!validate(&with_element(200.0, 10.0, 20.0, 10.0)));
        assert!(!validate(&with_element(10.0, 290.0, 20.0, 10.0)));
        assert!(!validate(&with_element(-1.0, 10.0, 20.0, 10.0)));
        assert!(!validate(&with_element(10.0, 10.0, 0.0, 10.0)));
        assert!(!validate(&with_element(10.0, 10.0, 20.0, -3.0)));
    }

    #[test]
    fn test_validate_uses_orientation() {
        let mut doc = with_element(200.0, 10.0, 50.0, 10.0);
        assert!(!validate(&doc));
        doc.page.orientation = Orientation::Landscape;
        assert!(validate(&doc));
    }

    #[test]
    fn test_validate_duplicate_ids() {
        let mut doc = with_element(0.0, 0.0, 10.0, 10.0);
        doc.elements.push(doc.elements[0].clone());
        let err = validate_detailed(&doc).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("template.json");
        let doc = every_variant();
        save_to_file(&doc, &path).unwrap();
        assert_eq!(load_from_file(&path).unwrap(), doc);

        assert!(matches!(
            load_from_file(dir.path().join("missing.json")),
            Err(TemplateError::Io(_))
        ));
        std::fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(load_from_file(&path), Err(TemplateError::Parse(_))));
    }
}
