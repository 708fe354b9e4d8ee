//! Build a lab report template in code and export it
//! Run with: cargo run --example lab_report
//!
//! Writes to output/:
//! 1. lab_report.json - the template
//! 2. lab_report.pdf / lab_report.png - the template filled with sample data

use report_template::{
    serializer, DataBinding, ElementBinding, ElementKind, ElementNode, Geometry, LabelElement,
    RenderEngine, Symbology, TableCell, TableElement, TemplateDocument, TextElement,
};
use serde_json::json;
use std::fs;

fn at(x: f64, y: f64, width: f64, height: f64) -> Geometry {
    Geometry {
        x,
        y,
        width,
        height,
        ..Default::default()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all("output")?;

    let mut doc = TemplateDocument::new(210.0, 297.0);
    doc.metadata.id = "lab-report".into();
    doc.metadata.name = "Lab Report".into();

    let mut title = LabelElement {
        text: "Laboratory Report".into(),
        ..Default::default()
    };
    title.font.size = 18.0;
    title.font.bold = true;
    doc.elements.push(ElementNode::new("title", at(10.0, 10.0, 190.0, 12.0), ElementKind::Label(title)));

    doc.elements.push(ElementNode::new(
        "name",
        at(10.0, 30.0, 100.0, 8.0),
        ElementKind::Text(TextElement {
            content: "Patient name".into(),
            ..Default::default()
        }),
    ));
    doc.bindings.push(DataBinding {
        element_id: "name".into(),
        data_path: "Patient.Name".into(),
        format_string: None,
    });

    doc.elements.push(ElementNode::new(
        "hn",
        at(170.0, 28.0, 25.0, 25.0),
        ElementKind::Barcode(report_template::BarcodeElement {
            value: "HN-000000".into(),
            symbology: Symbology::Qr,
            binding: Some(ElementBinding {
                path: "Patient.Hn".into(),
                format: None,
            }),
            ..Default::default()
        }),
    ));

    let mut results = TableElement {
        rows: 3,
        columns: 2,
        header_rows: 1,
        ..Default::default()
    };
    for (row, (test, path)) in [("Test", None), ("Glucose", Some("Results[0]")), ("HbA1c", Some("Results[1]"))]
        .into_iter()
        .enumerate()
    {
        results.cells.push(TableCell::new(row, 0, test));
        let mut value = TableCell::new(row, 1, if row == 0 { "Value" } else { "-" });
        value.binding = path.map(|p| ElementBinding {
            path: p.to_string(),
            format: Some("0.0".into()),
        });
        results.cells.push(value);
    }
    doc.elements.push(ElementNode::new("results", at(10.0, 60.0, 190.0, 24.0), ElementKind::Table(results)));

    serializer::validate_detailed(&doc)?;
    serializer::save_to_file(&doc, "output/lab_report.json")?;
    println!("1. Saved template -> output/lab_report.json");

    let data = json!({
        "Patient": { "Name": "Somchai Jaidee", "Hn": "HN-000123" },
        "Results": [5.43, 6.1]
    });
    let engine = RenderEngine::default();

    let surface = engine.render_template(&doc, Some(&data))?;
    println!(
        "2. Surface {:.1} x {:.1} px, {} nodes",
        surface.width,
        surface.height,
        surface.nodes.len()
    );

    engine.render_to_file(&doc, Some(&data), "output/lab_report.pdf")?;
    engine.render_to_file(&doc, Some(&data), "output/lab_report.png")?;
    println!("3. Exported -> output/lab_report.pdf, output/lab_report.png");
    println!("   cache: {:?}", engine.cache_stats());

    Ok(())
}
