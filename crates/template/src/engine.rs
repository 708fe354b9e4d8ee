//! Render engine
//!
//! Ties the document, the binding table, the element dispatcher and the
//! cache together. Every render takes a ticket from the cache; results are
//! committed only while that ticket is the newest, so the last render to
//! start is the one the cache keeps.

use crate::binding::BindingTable;
use crate::cache::{CacheCommit, CacheStats, ElementKey, Fingerprint, RenderCache, TemplateKey, Ticket};
use crate::config::EngineConfig;
use crate::model::{ElementKind, ElementNode, TemplateDocument};
use crate::render::layout::{auto_number_values, bound_values};
use crate::render::raster::encode_png;
use crate::render::{
    build_page, resolve_element, Diagnostic, FontBook, LayoutContext, LayoutNode, PdfBuilder,
    RasterBuilder, RenderedNode, Surface, SurfaceAssembler,
};
use crate::serializer::validate_detailed;
use crate::units::UnitConverter;
use crate::{Result, TemplateError};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

/// Result of a render that may have been overtaken by a newer one
#[derive(Debug, Clone)]
pub enum RenderOutcome {
    Completed(Arc<Surface>),
    /// A newer render started first; nothing was committed
    Superseded,
}

impl RenderOutcome {
    pub fn surface(&self) -> Option<&Arc<Surface>> {
        match self {
            RenderOutcome::Completed(surface) => Some(surface),
            RenderOutcome::Superseded => None,
        }
    }
}

struct EngineState {
    config: EngineConfig,
    zoom: RwLock<f64>,
    fonts: RwLock<Arc<FontBook>>,
    cache: RenderCache,
}

/// Shared, cloneable render engine
#[derive(Clone)]
pub struct RenderEngine {
    state: Arc<EngineState>,
}

/// Per-render inputs shared by every element
struct RenderScope {
    bindings: BindingTable,
    auto_numbers: HashMap<String, i64>,
}

impl RenderScope {
    fn new(document: &TemplateDocument) -> Self {
        Self {
            bindings: BindingTable::build(document),
            auto_numbers: auto_number_values(document),
        }
    }
}

struct Rendered {
    surface: Arc<Surface>,
    current: bool,
}

impl Default for RenderEngine {
    fn default() -> Self {
        Self::with_fonts(EngineConfig::default(), FontBook::new())
    }
}

impl RenderEngine {
    /// Create an engine, reading the configured font files
    pub fn new(config: EngineConfig) -> Result<Self> {
        let mut fonts = FontBook::load(&config.fonts, config.resource_root.as_deref())?;
        fonts.set_default_family(config.default_font_family.clone());
        Ok(Self::with_fonts(config, fonts))
    }

    pub fn with_fonts(config: EngineConfig, fonts: FontBook) -> Self {
        log::debug!(
            "Render engine at {} dpi, zoom {}, {} font(s)",
            config.dpi,
            config.zoom,
            fonts.faces().len()
        );
        Self {
            state: Arc::new(EngineState {
                zoom: RwLock::new(config.zoom),
                fonts: RwLock::new(Arc::new(fonts)),
                cache: RenderCache::new(),
                config,
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.state.config
    }

    pub fn zoom(&self) -> f64 {
        *self.state.zoom.read()
    }

    /// Change the surface zoom; cached surfaces are dropped
    pub fn set_zoom(&self, zoom: f64) -> Result<()> {
        if !(zoom.is_finite() && zoom > 0.0) {
            return Err(TemplateError::Config(format!("zoom must be positive, got {zoom}")));
        }
        let mut current = self.state.zoom.write();
        if *current != zoom {
            *current = zoom;
            self.state.cache.clear_element_cache();
            self.state.cache.clear_template_cache();
        }
        Ok(())
    }

    /// Register a TrueType face for the PDF and PNG exports
    pub fn load_font(&self, family: &str, data: Vec<u8>) -> Result<()> {
        let mut fonts = self.state.fonts.write();
        let mut book = (**fonts).clone();
        book.add(family, data)?;
        *fonts = Arc::new(book);
        Ok(())
    }

    pub fn fonts(&self) -> Arc<FontBook> {
        self.state.fonts.read().clone()
    }

    fn view(&self) -> UnitConverter {
        UnitConverter::new(self.state.config.dpi, self.zoom())
    }

    fn context<'a>(&'a self, scope: &'a RenderScope, data: Option<&'a Value>) -> LayoutContext<'a> {
        LayoutContext {
            data,
            bindings: &scope.bindings,
            auto_numbers: &scope.auto_numbers,
            resource_root: self.state.config.resource_root.as_deref(),
            table_limits: self.state.config.table_limits,
        }
    }

    /// Render the interactive surface of a document
    ///
    /// Elements whose content and bound data are unchanged come from the
    /// cache. A render overtaken by a newer one still returns its surface
    /// but leaves the cache alone.
    pub fn render_template(
        &self,
        document: &TemplateDocument,
        data: Option<&Value>,
    ) -> Result<Arc<Surface>> {
        let ticket = self.state.cache.begin();
        Ok(self.render_surface(document, data, None, ticket)?.surface)
    }

    /// Re-render only `changed` elements and elements missing from the cache
    ///
    /// Every other element reuses its cached node, looked up by id.
    pub fn incremental_render_template<S: AsRef<str>>(
        &self,
        document: &TemplateDocument,
        data: Option<&Value>,
        changed: &[S],
    ) -> Result<Arc<Surface>> {
        let changed: HashSet<&str> = changed.iter().map(AsRef::as_ref).collect();
        let ticket = self.state.cache.begin();
        Ok(self
            .render_surface(document, data, Some(&changed), ticket)?
            .surface)
    }

    /// Render a document on the blocking pool
    ///
    /// The render is ordered when this is called, not when the future is
    /// first polled: a later call supersedes this one.
    #[cfg(feature = "async")]
    pub fn render_template_async(
        &self,
        document: TemplateDocument,
        data: Option<Value>,
    ) -> impl std::future::Future<Output = Result<RenderOutcome>> + Send + 'static {
        let ticket = self.state.cache.begin();
        let engine = self.clone();
        async move {
            let rendered = tokio::task::spawn_blocking(move || {
                engine.render_surface(&document, data.as_ref(), None, ticket)
            })
            .await
            .map_err(|e| TemplateError::Task(e.to_string()))??;

            if rendered.current {
                Ok(RenderOutcome::Completed(rendered.surface))
            } else {
                log::debug!("Render {:?} was superseded", ticket);
                Ok(RenderOutcome::Superseded)
            }
        }
    }

    /// Render one element on its own
    ///
    /// Only the element's inline binding applies. Returns `None` for
    /// invisible and unsupported elements.
    pub fn render_element(
        &self,
        element: &ElementNode,
        data: Option<&Value>,
    ) -> Result<Option<Arc<RenderedNode>>> {
        let scope = RenderScope {
            bindings: BindingTable::for_element(element),
            auto_numbers: match &element.kind {
                ElementKind::AutoNumber(auto) => HashMap::from([(element.id.clone(), auto.start)]),
                _ => HashMap::new(),
            },
        };
        let ctx = self.context(&scope, data);
        let conv = self.view();
        let key = ElementKey {
            template: TemplateKey::default(),
            element_id: element.id.clone(),
            fingerprint: element_fingerprint(element, &ctx, &conv)?,
        };
        if let Some(node) = self.state.cache.get(&key) {
            return Ok(Some(node));
        }
        let Some(layout) = resolve_element(element, &ctx) else {
            return Ok(None);
        };
        let node = Arc::new(RenderedNode::from_layout(Arc::new(layout), &conv));
        self.state.cache.set(key, Arc::clone(&node));
        Ok(Some(node))
    }

    fn render_surface(
        &self,
        document: &TemplateDocument,
        data: Option<&Value>,
        changed: Option<&HashSet<&str>>,
        ticket: Ticket,
    ) -> Result<Rendered> {
        validate_detailed(document)?;
        let cache = &self.state.cache;
        let conv = self.view();

        let template_key = template_key(document);
        let fingerprint = document_fingerprint(document, data, &conv)?;
        // an incremental render always re-runs its changed elements
        if changed.is_none() {
            if let Some(surface) = cache.get_template(&template_key, fingerprint) {
                log::debug!("Template '{}' served from cache", template_key.template_id);
                return Ok(Rendered {
                    surface,
                    current: cache.is_current(ticket),
                });
            }
        }

        let scope = RenderScope::new(document);
        let ctx = self.context(&scope, data);
        let mut assembler = SurfaceAssembler::new(conv);
        let mut commit = CacheCommit::default();
        let mut ids = Vec::with_capacity(document.elements.len());
        let mut rendered = 0usize;

        for element in &document.elements {
            if matches!(element.kind, ElementKind::Unsupported) {
                log::debug!("Skipping element '{}' of unknown type", element.id);
                assembler.push_diagnostic(Diagnostic::UnsupportedElement {
                    element_id: element.id.clone(),
                });
                continue;
            }
            if !element.visible {
                continue;
            }
            ids.push(element.id.clone());

            let reuse = match changed {
                Some(changed) if !changed.contains(element.id.as_str()) => {
                    cache.get_by_id(&template_key, &element.id).map(|(_, node)| node)
                }
                _ => None,
            };
            if let Some(node) = reuse {
                assembler.push_rendered(node);
                continue;
            }

            let key = ElementKey {
                template: template_key.clone(),
                element_id: element.id.clone(),
                fingerprint: element_fingerprint(element, &ctx, &conv)?,
            };
            let cached = if changed.is_none() { cache.get(&key) } else { None };
            let node = match cached {
                Some(node) => node,
                None => match resolve_element(element, &ctx) {
                    Some(layout) => {
                        rendered += 1;
                        let node = assembler.render(Arc::new(layout));
                        commit.element(key, Arc::clone(&node));
                        node
                    }
                    None => continue,
                },
            };
            assembler.push_rendered(node);
        }

        let surface = Arc::new(assembler.assemble(&document.page));
        log::debug!(
            "Rendered {} of {} element(s) of template '{}'",
            rendered,
            ids.len(),
            template_key.template_id
        );

        commit.retain_only(template_key.clone(), ids);
        if changed.is_none() {
            commit.template(template_key, fingerprint, Arc::clone(&surface));
        }
        let current = cache.commit_if(ticket, commit);
        Ok(Rendered { surface, current })
    }

    /// Layout nodes of every drawable element, in document order
    ///
    /// Uses cached nodes where their fingerprint still matches, so exports
    /// draw exactly what the surface shows.
    fn layout_nodes(
        &self,
        document: &TemplateDocument,
        data: Option<&Value>,
    ) -> Result<Vec<Arc<LayoutNode>>> {
        validate_detailed(document)?;
        let scope = RenderScope::new(document);
        let ctx = self.context(&scope, data);
        let conv = self.view();
        let template = template_key(document);
        let mut nodes = Vec::with_capacity(document.elements.len());
        for element in &document.elements {
            if matches!(element.kind, ElementKind::Unsupported) {
                continue;
            }
            if !element.visible {
                continue;
            }
            let key = ElementKey {
                template: template.clone(),
                element_id: element.id.clone(),
                fingerprint: element_fingerprint(element, &ctx, &conv)?,
            };
            if let Some(node) = self.state.cache.get(&key) {
                nodes.push(Arc::clone(&node.layout));
            } else if let Some(layout) = resolve_element(element, &ctx) {
                nodes.push(Arc::new(layout));
            }
        }
        Ok(nodes)
    }

    /// Export a document as a one-page PDF
    pub fn export_pdf(&self, document: &TemplateDocument, data: Option<&Value>) -> Result<Vec<u8>> {
        let nodes = self.layout_nodes(document, data)?;
        let fonts = self.fonts();
        let mut builder = PdfBuilder::new(&fonts)?;
        let meta = &document.metadata;
        builder.set_info(
            Some(meta.name.as_str()).filter(|name| !name.is_empty()),
            meta.author.as_deref(),
        );
        build_page(builder, &document.page, &nodes)
    }

    /// Export a document as a PNG at the configured raster DPI
    pub fn export_png(&self, document: &TemplateDocument, data: Option<&Value>) -> Result<Vec<u8>> {
        let nodes = self.layout_nodes(document, data)?;
        let fonts = self.fonts();
        let builder = RasterBuilder::new(self.state.config.raster_dpi, &fonts)
            .with_max_pixels(self.state.config.max_raster_pixels);
        let pixmap = build_page(builder, &document.page, &nodes)?;
        encode_png(&pixmap)
    }

    /// Export to `path`, choosing the format by extension
    pub fn render_to_file<P: AsRef<Path>>(
        &self,
        document: &TemplateDocument,
        data: Option<&Value>,
        path: P,
    ) -> Result<()> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let bytes = match extension.as_str() {
            "pdf" => self.export_pdf(document, data)?,
            "png" => self.export_png(document, data)?,
            _ => {
                return Err(TemplateError::UnsupportedOutput(path.display().to_string()));
            }
        };
        std::fs::write(path, &bytes)?;
        log::info!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    pub fn clear_element_cache(&self) {
        self.state.cache.clear_element_cache();
    }

    pub fn clear_template_cache(&self) {
        self.state.cache.clear_template_cache();
    }

    pub fn clear_all_cache(&self) {
        self.state.cache.clear_all();
    }

    pub fn cache_size(&self) -> usize {
        self.state.cache.size()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.state.cache.stats()
    }
}

fn template_key(document: &TemplateDocument) -> TemplateKey {
    TemplateKey {
        template_id: document.metadata.id.clone(),
        version: document.metadata.version,
    }
}

fn element_fingerprint(
    element: &ElementNode,
    ctx: &LayoutContext,
    conv: &UnitConverter,
) -> Result<Fingerprint> {
    Ok(Fingerprint::builder()
        .add(serde_json::to_vec(element)?)
        .add(bound_values(element, ctx))
        .add_f64(conv.dpi)
        .add_f64(conv.scale)
        .finish())
}

fn document_fingerprint(
    document: &TemplateDocument,
    data: Option<&Value>,
    conv: &UnitConverter,
) -> Result<Fingerprint> {
    let data = data.map(serde_json::to_vec).transpose()?;
    Ok(Fingerprint::builder()
        .add(serde_json::to_vec(document)?)
        .add(data)
        .add_f64(conv.dpi)
        .add_f64(conv.scale)
        .finish())
}
