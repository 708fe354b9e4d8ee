//! Data binding
//!
//! Resolves dotted paths (`Patient.Name`, `Results[2].Value`, `Items.0.Code`)
//! against a `serde_json::Value` data graph. Lookups never fail loudly: any
//! missing segment or null along the way resolves to `None`, and the caller
//! falls back to the element's static content.

pub mod format;

pub use format::format_value;

use crate::model::{ElementNode, TemplateDocument};
use serde_json::Value;
use std::collections::HashMap;

/// One step of a binding path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Object key; also an array index when all digits
    Key(String),
    /// Explicit `[n]` index
    Index(usize),
}

/// A binding path compiled once and evaluated many times
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingPath {
    raw: String,
    segments: Vec<Segment>,
}

impl BindingPath {
    /// Compile a path; `None` for empty or malformed paths
    pub fn parse(path: &str) -> Option<Self> {
        if path.is_empty() {
            return None;
        }

        let mut segments = Vec::new();
        for part in path.split('.') {
            let (name, mut rest) = match part.find('[') {
                Some(pos) => (&part[..pos], &part[pos..]),
                None => (part, ""),
            };
            if part.is_empty() {
                return None;
            }
            if !name.is_empty() {
                segments.push(Segment::Key(name.to_string()));
            }
            while !rest.is_empty() {
                let close = rest.find(']')?;
                let index = rest.get(1..close)?.parse::<usize>().ok()?;
                segments.push(Segment::Index(index));
                rest = &rest[close + 1..];
                if !rest.is_empty() && !rest.starts_with('[') {
                    return None;
                }
            }
        }

        Some(Self {
            raw: path.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Walk the data graph; null anywhere resolves to `None`
    pub fn resolve<'a>(&self, data: &'a Value) -> Option<&'a Value> {
        let mut current = data;
        for segment in &self.segments {
            if current.is_null() {
                return None;
            }
            current = step(current, segment)?;
        }
        (!current.is_null()).then_some(current)
    }

    fn resolve_mut<'a>(&self, data: &'a mut Value, depth: usize) -> Option<&'a mut Value> {
        let mut current = data;
        for segment in &self.segments[..depth] {
            current = step_mut(current, segment)?;
        }
        Some(current)
    }
}

fn step<'a>(value: &'a Value, segment: &Segment) -> Option<&'a Value> {
    match (value, segment) {
        (Value::Object(map), Segment::Key(key)) => map.get(key),
        (Value::Array(items), Segment::Key(key)) => items.get(key.parse::<usize>().ok()?),
        (Value::Array(items), Segment::Index(index)) => items.get(*index),
        _ => None,
    }
}

fn step_mut<'a>(value: &'a mut Value, segment: &Segment) -> Option<&'a mut Value> {
    match (value, segment) {
        (Value::Object(map), Segment::Key(key)) => map.get_mut(key),
        (Value::Array(items), Segment::Key(key)) => items.get_mut(key.parse::<usize>().ok()?),
        (Value::Array(items), Segment::Index(index)) => items.get_mut(*index),
        _ => None,
    }
}

/// Convert a JSON value to its display string
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Resolve `path` against `data` and format the result
///
/// Returns `None` when any segment is missing or null. A format that cannot
/// be applied falls back to the plain string form.
pub fn get_value(data: &Value, path: &str, format: Option<&str>) -> Option<String> {
    let path = BindingPath::parse(path)?;
    let value = path.resolve(data)?;
    Some(render(value, format))
}

fn render(value: &Value, format: Option<&str>) -> String {
    format
        .filter(|f| !f.is_empty())
        .and_then(|f| format_value(value, f))
        .unwrap_or_else(|| value_to_string(value))
}

/// Write `value` to an existing property
///
/// Only properties already present in the data are written. The incoming
/// value is converted to the type of the value it replaces; when that is not
/// possible nothing is written. Returns whether the write happened.
pub fn set_value(data: &mut Value, path: &str, value: Value) -> bool {
    let Some(path) = BindingPath::parse(path) else {
        return false;
    };
    let Some((last, _)) = path.segments.split_last() else {
        return false;
    };
    let depth = path.segments.len() - 1;
    let Some(parent) = path.resolve_mut(data, depth) else {
        return false;
    };
    let Some(slot) = step_mut(parent, last) else {
        return false;
    };
    match convert_like(slot, value) {
        Some(converted) => {
            *slot = converted;
            true
        }
        None => false,
    }
}

/// Convert `incoming` to the JSON type of `existing`
fn convert_like(existing: &Value, incoming: Value) -> Option<Value> {
    match (existing, incoming) {
        (Value::Null, v) => Some(v),
        (Value::String(_), Value::String(s)) => Some(Value::String(s)),
        (Value::String(_), v @ (Value::Number(_) | Value::Bool(_))) => {
            Some(Value::String(value_to_string(&v)))
        }
        (Value::Number(_), Value::Number(n)) => Some(Value::Number(n)),
        (Value::Number(_), Value::String(s)) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                Some(Value::from(i))
            } else {
                serde_json::Number::from_f64(s.parse::<f64>().ok()?).map(Value::Number)
            }
        }
        (Value::Bool(_), Value::Bool(b)) => Some(Value::Bool(b)),
        (Value::Bool(_), Value::String(s)) => s.trim().parse::<bool>().ok().map(Value::Bool),
        (Value::Array(_), v @ Value::Array(_)) => Some(v),
        (Value::Object(_), v @ Value::Object(_)) => Some(v),
        _ => None,
    }
}

/// Whether every segment of `path` resolves to a non-null value
pub fn is_valid_path(data: &Value, path: &str) -> bool {
    BindingPath::parse(path)
        .and_then(|p| p.resolve(data).map(|_| ()))
        .is_some()
}

/// A compiled binding with its display format
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledBinding {
    pub path: BindingPath,
    pub format: Option<String>,
}

impl CompiledBinding {
    pub fn new(path: &str, format: Option<&str>) -> Option<Self> {
        Some(Self {
            path: BindingPath::parse(path)?,
            format: format.filter(|f| !f.is_empty()).map(str::to_string),
        })
    }

    /// Raw resolved value
    pub fn value<'a>(&self, data: &'a Value) -> Option<&'a Value> {
        self.path.resolve(data)
    }

    /// Resolved and formatted display text
    pub fn evaluate(&self, data: &Value) -> Option<String> {
        self.value(data)
            .map(|value| render(value, self.format.as_deref()))
    }
}

/// Every element binding of a document, compiled once per render
#[derive(Debug, Clone, Default)]
pub struct BindingTable {
    by_element: HashMap<String, CompiledBinding>,
}

impl BindingTable {
    pub fn build(document: &TemplateDocument) -> Self {
        let mut by_element = HashMap::new();

        for element in &document.elements {
            if let Some(binding) = inline_binding(element) {
                by_element.insert(element.id.clone(), binding);
            }
        }

        for entry in &document.bindings {
            match CompiledBinding::new(&entry.data_path, entry.format_string.as_deref()) {
                Some(binding) => {
                    by_element.insert(entry.element_id.clone(), binding);
                }
                None => log::warn!(
                    "Ignoring malformed binding path '{}' for element '{}'",
                    entry.data_path,
                    entry.element_id
                ),
            }
        }

        Self { by_element }
    }

    /// Table holding only the element's inline binding
    pub fn for_element(element: &ElementNode) -> Self {
        let mut by_element = HashMap::new();
        if let Some(binding) = inline_binding(element) {
            by_element.insert(element.id.clone(), binding);
        }
        Self { by_element }
    }

    pub fn get(&self, element_id: &str) -> Option<&CompiledBinding> {
        self.by_element.get(element_id)
    }

    pub fn len(&self) -> usize {
        self.by_element.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_element.is_empty()
    }
}

fn inline_binding(element: &ElementNode) -> Option<CompiledBinding> {
    let binding = element.binding()?;
    let compiled = CompiledBinding::new(&binding.path, binding.format.as_deref());
    if compiled.is_none() {
        log::warn!(
            "Ignoring malformed binding path '{}' on element '{}'",
            binding.path,
            element.id
        );
    }
    compiled
}
