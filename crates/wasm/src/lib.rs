//! WASM bindings for the report template engine
//!
//! This crate provides JavaScript-friendly API for:
//! - Loading report templates
//! - Rendering the interactive designer surface
//! - Exporting PDF and PNG
//! - Unit conversion for the editor
//!
//! # Example (JavaScript)
//!
//! ```javascript
//! import init, { ReportTemplate, Units } from 'report-wasm';
//!
//! await init();
//!
//! const template = ReportTemplate.fromJson(templateJson);
//! template.loadFont('NotoSansSC', fontBytes);
//! template.setZoom(1.5);
//!
//! const surface = template.renderSurface({ Patient: { Name: "张三" } });
//! const pdf = template.exportPdf({ Patient: { Name: "张三" } });
//! ```

use report_template::{serializer, RenderEngine, TemplateDocument};
use serde::Serialize;
use wasm_bindgen::prelude::*;

// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// `undefined` and `null` mean no data
fn data_value(data: JsValue) -> Result<Option<serde_json::Value>, JsValue> {
    if data.is_undefined() || data.is_null() {
        return Ok(None);
    }
    Ok(Some(serde_wasm_bindgen::from_value(data)?))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(JsValue::from)
}

/// Unit conversion helpers
#[wasm_bindgen]
pub struct Units;

#[wasm_bindgen]
impl Units {
    #[wasm_bindgen(js_name = mmToPixel)]
    pub fn mm_to_pixel(mm: f64, dpi: f64) -> f64 {
        report_template::units::mm_to_pixel(mm, dpi)
    }

    #[wasm_bindgen(js_name = pixelToMm)]
    pub fn pixel_to_mm(px: f64, dpi: f64) -> f64 {
        report_template::units::pixel_to_mm(px, dpi)
    }

    #[wasm_bindgen(js_name = mmToPoint)]
    pub fn mm_to_point(mm: f64) -> f64 {
        report_template::units::mm_to_point(mm)
    }

    #[wasm_bindgen(js_name = pointToMm)]
    pub fn point_to_mm(pt: f64) -> f64 {
        report_template::units::point_to_mm(pt)
    }

    /// Screen coordinate to zoomed display coordinate
    #[wasm_bindgen(js_name = applyScale)]
    pub fn apply_scale(screen: f64, scale: f64) -> f64 {
        report_template::units::apply_scale(screen, scale)
    }

    #[wasm_bindgen(js_name = removeScale)]
    pub fn remove_scale(display: f64, scale: f64) -> f64 {
        report_template::units::remove_scale(display, scale)
    }
}

/// A template document with its own engine and cache
#[wasm_bindgen]
pub struct ReportTemplate {
    document: TemplateDocument,
    engine: RenderEngine,
}

#[wasm_bindgen]
impl ReportTemplate {
    /// Create template from JSON
    ///
    /// @param json - Template JSON string
    /// @returns ReportTemplate instance
    #[wasm_bindgen(js_name = fromJson)]
    pub fn from_json(json: &str) -> Result<ReportTemplate, JsValue> {
        let document = serializer::deserialize(json).map_err(js_error)?;
        Ok(ReportTemplate {
            document,
            engine: RenderEngine::default(),
        })
    }

    /// Current document as JSON
    #[wasm_bindgen(js_name = toJson)]
    pub fn to_json(&self) -> Result<String, JsValue> {
        serializer::serialize(&self.document).map_err(js_error)
    }

    /// Load font
    ///
    /// @param family - Font family name used by elements
    /// @param data - TTF file bytes (Uint8Array)
    #[wasm_bindgen(js_name = loadFont)]
    pub fn load_font(&mut self, family: &str, data: &[u8]) -> Result<(), JsValue> {
        self.engine.load_font(family, data.to_vec()).map_err(js_error)
    }

    #[wasm_bindgen(js_name = setZoom)]
    pub fn set_zoom(&mut self, zoom: f64) -> Result<(), JsValue> {
        self.engine.set_zoom(zoom).map_err(js_error)
    }

    /// Render the designer surface
    ///
    /// @param data - Data object for binding
    /// @returns Surface object with nodes in paint order
    #[wasm_bindgen(js_name = renderSurface)]
    pub fn render_surface(&self, data: JsValue) -> Result<JsValue, JsValue> {
        let data = data_value(data)?;
        let surface = self
            .engine
            .render_template(&self.document, data.as_ref())
            .map_err(js_error)?;
        to_js(&*surface)
    }

    /// Replace the document and re-render only the changed elements
    ///
    /// @param json - Updated template JSON
    /// @param data - Data object for binding
    /// @param changed - Ids of the elements that changed
    #[wasm_bindgen(js_name = incrementalRender)]
    pub fn incremental_render(
        &mut self,
        json: &str,
        data: JsValue,
        changed: Vec<String>,
    ) -> Result<JsValue, JsValue> {
        let document = serializer::deserialize(json).map_err(js_error)?;
        let data = data_value(data)?;
        let surface = self
            .engine
            .incremental_render_template(&document, data.as_ref(), changed.as_slice())
            .map_err(js_error)?;
        self.document = document;
        to_js(&*surface)
    }

    /// Id of the topmost element under a surface point
    #[wasm_bindgen(js_name = hitTest)]
    pub fn hit_test(&self, data: JsValue, x: f64, y: f64) -> Result<Option<String>, JsValue> {
        let data = data_value(data)?;
        let surface = self
            .engine
            .render_template(&self.document, data.as_ref())
            .map_err(js_error)?;
        Ok(surface.hit_test(x, y).map(|node| node.id.clone()))
    }

    /// Render PDF with data
    ///
    /// @param data - Data object for binding
    /// @returns PDF bytes (Uint8Array)
    #[wasm_bindgen(js_name = exportPdf)]
    pub fn export_pdf(&self, data: JsValue) -> Result<Vec<u8>, JsValue> {
        let data = data_value(data)?;
        self.engine
            .export_pdf(&self.document, data.as_ref())
            .map_err(js_error)
    }

    /// Render PNG with data
    ///
    /// @param data - Data object for binding
    /// @returns PNG bytes
    #[wasm_bindgen(js_name = exportPng)]
    pub fn export_png(&self, data: JsValue) -> Result<js_sys::Uint8Array, JsValue> {
        let data = data_value(data)?;
        let bytes = self
            .engine
            .export_png(&self.document, data.as_ref())
            .map_err(js_error)?;
        Ok(js_sys::Uint8Array::from(bytes.as_slice()))
    }

    /// Validation error message, or `undefined` when the document is valid
    pub fn validate(&self) -> Option<String> {
        serializer::validate_detailed(&self.document)
            .err()
            .map(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = clearCache)]
    pub fn clear_cache(&self) {
        self.engine.clear_all_cache();
    }

    #[wasm_bindgen(js_name = cacheSize)]
    pub fn cache_size(&self) -> usize {
        self.engine.cache_size()
    }
}
