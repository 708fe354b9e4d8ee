//! Registered TrueType faces shared by the PDF and raster backends

use crate::config::FontSource;
use crate::{Result, TemplateError};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct FontFace {
    pub family: String,
    pub data: Arc<Vec<u8>>,
}

/// Font files by family name
#[derive(Debug, Clone, Default)]
pub struct FontBook {
    faces: Vec<FontFace>,
    default_family: Option<String>,
}

impl FontBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every configured font file; relative paths resolve against `root`
    pub fn load(sources: &[FontSource], root: Option<&Path>) -> Result<Self> {
        let mut book = Self::new();
        for source in sources {
            let path = match root {
                Some(root) if source.path.is_relative() => root.join(&source.path),
                _ => source.path.clone(),
            };
            let data = std::fs::read(&path).map_err(|e| {
                TemplateError::Font(format!("Failed to read font {}: {}", path.display(), e))
            })?;
            book.add(&source.family, data)?;
        }
        Ok(book)
    }

    /// Register a face, replacing any face of the same family
    pub fn add(&mut self, family: &str, data: Vec<u8>) -> Result<()> {
        ab_glyph::FontRef::try_from_slice(&data)
            .map_err(|e| TemplateError::Font(format!("Invalid font '{family}': {e}")))?;
        log::debug!("Registered font family '{}' ({} bytes)", family, data.len());

        let face = FontFace {
            family: family.to_string(),
            data: Arc::new(data),
        };
        match self.faces.iter_mut().find(|f| f.family == family) {
            Some(existing) => *existing = face,
            None => self.faces.push(face),
        }
        Ok(())
    }

    pub fn set_default_family(&mut self, family: Option<String>) {
        self.default_family = family;
    }

    pub fn default_family(&self) -> Option<&str> {
        self.default_family.as_deref()
    }

    pub fn faces(&self) -> &[FontFace] {
        &self.faces
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Face for `family`, falling back to the default family
    pub fn resolve(&self, family: Option<&str>) -> Option<&FontFace> {
        let find = |name: &str| self.faces.iter().find(|f| f.family == name);
        family
            .and_then(find)
            .or_else(|| self.default_family.as_deref().and_then(find))
    }
}
