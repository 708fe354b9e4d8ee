//! Render cache
//!
//! Element entries are keyed by `(template, element id, fingerprint)` with an
//! exact index from `(template, element id)` to the current key, so
//! incremental renders find an element's previous node without scanning keys
//! and two templates sharing an element id never see each other's nodes.
//! Template entries are keyed by `(template id, version)` and only hit when
//! the stored document fingerprint matches.
//!
//! All maps live behind one `RwLock`. Writers commit through
//! [`RenderCache::commit_if`] so a render that has been superseded by a
//! newer one cannot overwrite its results.

use crate::render::{RenderedNode, Surface};
use parking_lot::RwLock;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Deterministic 64-bit content fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(pub u64);

impl Fingerprint {
    pub fn builder() -> FingerprintBuilder {
        FingerprintBuilder(DefaultHasher::new())
    }
}

/// Accumulates values into a [`Fingerprint`]
pub struct FingerprintBuilder(DefaultHasher);

impl FingerprintBuilder {
    pub fn add(mut self, value: impl Hash) -> Self {
        value.hash(&mut self.0);
        self
    }

    pub fn add_f64(mut self, value: f64) -> Self {
        value.to_bits().hash(&mut self.0);
        self
    }

    pub fn finish(self) -> Fingerprint {
        Fingerprint(self.0.finish())
    }
}

/// Identity of a template; the default key holds elements rendered on their own
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TemplateKey {
    pub template_id: String,
    pub version: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementKey {
    pub template: TemplateKey,
    pub element_id: String,
    pub fingerprint: Fingerprint,
}

impl ElementKey {
    fn slot(&self) -> (TemplateKey, String) {
        (self.template.clone(), self.element_id.clone())
    }
}

/// Render ticket; newer tickets supersede older ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub element_entries: usize,
    pub template_entries: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    elements: HashMap<ElementKey, Arc<RenderedNode>>,
    by_id: HashMap<(TemplateKey, String), ElementKey>,
    templates: HashMap<TemplateKey, (Fingerprint, Arc<Surface>)>,
}

impl CacheState {
    fn insert_element(&mut self, key: ElementKey, node: Arc<RenderedNode>) {
        if let Some(previous) = self.by_id.insert(key.slot(), key.clone()) {
            if previous != key {
                self.elements.remove(&previous);
            }
        }
        self.elements.insert(key, node);
    }
}

/// Element and template render cache
#[derive(Debug, Default)]
pub struct RenderCache {
    state: RwLock<CacheState>,
    generation: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Writes collected during one render, applied atomically
#[derive(Debug, Default)]
pub struct CacheCommit {
    elements: Vec<(ElementKey, Arc<RenderedNode>)>,
    template: Option<(TemplateKey, Fingerprint, Arc<Surface>)>,
    retain: Option<(TemplateKey, Vec<String>)>,
}

impl CacheCommit {
    pub fn element(&mut self, key: ElementKey, node: Arc<RenderedNode>) {
        self.elements.push((key, node));
    }

    pub fn template(&mut self, key: TemplateKey, fingerprint: Fingerprint, surface: Arc<Surface>) {
        self.template = Some((key, fingerprint, surface));
    }

    /// Drop cached elements of `template` whose id is not listed
    pub fn retain_only(&mut self, template: TemplateKey, ids: Vec<String>) {
        self.retain = Some((template, ids));
    }
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a render; every earlier ticket is superseded
    pub fn begin(&self) -> Ticket {
        Ticket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    pub fn get(&self, key: &ElementKey) -> Option<Arc<RenderedNode>> {
        let found = self.state.read().elements.get(key).cloned();
        self.count(found.is_some());
        found
    }

    /// Current entry for an element id of `template`, whatever its fingerprint
    pub fn get_by_id(
        &self,
        template: &TemplateKey,
        element_id: &str,
    ) -> Option<(ElementKey, Arc<RenderedNode>)> {
        let state = self.state.read();
        let found = state
            .by_id
            .get(&(template.clone(), element_id.to_string()))
            .and_then(|key| state.elements.get(key).map(|node| (key.clone(), Arc::clone(node))));
        drop(state);
        self.count(found.is_some());
        found
    }

    pub fn set(&self, key: ElementKey, node: Arc<RenderedNode>) {
        self.state.write().insert_element(key, node);
    }

    /// Remove the entry of an element id of `template`
    pub fn remove(&self, template: &TemplateKey, element_id: &str) -> bool {
        let mut state = self.state.write();
        match state.by_id.remove(&(template.clone(), element_id.to_string())) {
            Some(key) => state.elements.remove(&key).is_some(),
            None => false,
        }
    }

    pub fn get_template(&self, key: &TemplateKey, fingerprint: Fingerprint) -> Option<Arc<Surface>> {
        let found = self
            .state
            .read()
            .templates
            .get(key)
            .filter(|(stored, _)| *stored == fingerprint)
            .map(|(_, surface)| Arc::clone(surface));
        self.count(found.is_some());
        found
    }

    pub fn set_template(&self, key: TemplateKey, fingerprint: Fingerprint, surface: Arc<Surface>) {
        self.state.write().templates.insert(key, (fingerprint, surface));
    }

    /// Apply `commit` if `ticket` is still the newest render
    ///
    /// The check and the writes happen under the same write lock. Returns
    /// whether the commit was applied.
    pub fn commit_if(&self, ticket: Ticket, commit: CacheCommit) -> bool {
        let mut state = self.state.write();
        if !self.is_current(ticket) {
            log::debug!("Discarding cache writes of superseded render {:?}", ticket);
            return false;
        }
        for (key, node) in commit.elements {
            state.insert_element(key, node);
        }
        if let Some((template, ids)) = commit.retain {
            let keep: HashSet<String> = ids.into_iter().collect();
            let stale: Vec<(TemplateKey, String)> = state
                .by_id
                .keys()
                .filter(|(owner, id)| *owner == template && !keep.contains(id))
                .cloned()
                .collect();
            for slot in stale {
                if let Some(key) = state.by_id.remove(&slot) {
                    state.elements.remove(&key);
                }
            }
        }
        if let Some((key, fingerprint, surface)) = commit.template {
            state.templates.insert(key, (fingerprint, surface));
        }
        true
    }

    pub fn clear_element_cache(&self) {
        let mut state = self.state.write();
        state.elements.clear();
        state.by_id.clear();
    }

    pub fn clear_template_cache(&self) {
        self.state.write().templates.clear();
    }

    pub fn clear_all(&self) {
        *self.state.write() = CacheState::default();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Number of cached element and template entries
    pub fn size(&self) -> usize {
        let state = self.state.read();
        state.elements.len() + state.templates.len()
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.read();
        CacheStats {
            element_entries: state.elements.len(),
            template_entries: state.templates.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn count(&self, hit: bool) {
        let counter = if hit { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::layout::LayoutNode;
    use crate::units::{Rect, UnitConverter};
    use pretty_assertions::assert_eq;

    fn rendered(id: &str) -> Arc<RenderedNode> {
        let layout = LayoutNode {
            id: id.to_string(),
            tag: "text",
            rect: Rect::new(0.0, 0.0, 1.0, 1.0),
            rotation: 0.0,
            z_index: 0,
            opacity: 1.0,
            content: None,
            primitives: Vec::new(),
            table: None,
            diagnostics: Vec::new(),
        };
        Arc::new(RenderedNode::from_layout(Arc::new(layout), &UnitConverter::default()))
    }

    fn template(id: &str) -> TemplateKey {
        TemplateKey {
            template_id: id.to_string(),
            version: 1,
        }
    }

    fn key_in(owner: &str, id: &str, fp: u64) -> ElementKey {
        ElementKey {
            template: template(owner),
            element_id: id.to_string(),
            fingerprint: Fingerprint(fp),
        }
    }

    fn key(id: &str, fp: u64) -> ElementKey {
        key_in("t", id, fp)
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = Fingerprint::builder().add("e1").add_f64(1.5).finish();
        let b = Fingerprint::builder().add("e1").add_f64(1.5).finish();
        let c = Fingerprint::builder().add("e1").add_f64(1.25).finish();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_new_fingerprint_replaces_entry() {
        let cache = RenderCache::new();
        cache.set(key("e1", 1), rendered("e1"));
        cache.set(key("e1", 2), rendered("e1"));
        assert_eq!(cache.size(), 1);
        assert!(cache.get(&key("e1", 1)).is_none());
        assert!(cache.get(&key("e1", 2)).is_some());
    }

    #[test]
    fn test_exact_id_lookup() {
        let cache = RenderCache::new();
        cache.set(key("e10", 7), rendered("e10"));
        assert!(cache.get_by_id(&template("t"), "e1").is_none());
        let (found, node) = cache.get_by_id(&template("t"), "e10").unwrap();
        assert_eq!(found, key("e10", 7));
        assert_eq!(node.id, "e10");
        assert!(cache.remove(&template("t"), "e10"));
        assert!(!cache.remove(&template("t"), "e10"));
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_hit_and_miss_counters() {
        let cache = RenderCache::new();
        cache.set(key("a", 1), rendered("a"));
        cache.get(&key("a", 1));
        cache.get(&key("a", 2));
        cache.get(&key("b", 1));
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 2));
    }

    #[test]
    fn test_superseded_commit_is_discarded() {
        let cache = RenderCache::new();
        let first = cache.begin();
        let second = cache.begin();
        assert!(!cache.is_current(first));

        let mut stale = CacheCommit::default();
        stale.element(key("a", 1), rendered("a"));
        assert!(!cache.commit_if(first, stale));
        assert_eq!(cache.size(), 0);

        let mut fresh = CacheCommit::default();
        fresh.element(key("b", 1), rendered("b"));
        assert!(cache.commit_if(second, fresh));
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn test_retain_drops_removed_elements() {
        let cache = RenderCache::new();
        cache.set(key("a", 1), rendered("a"));
        cache.set(key("b", 1), rendered("b"));
        let ticket = cache.begin();
        let mut commit = CacheCommit::default();
        commit.retain_only(template("t"), vec!["b".to_string()]);
        assert!(cache.commit_if(ticket, commit));
        assert!(cache.get_by_id(&template("t"), "a").is_none());
        assert!(cache.get_by_id(&template("t"), "b").is_some());
    }

    #[test]
    fn test_templates_do_not_share_element_ids() {
        let cache = RenderCache::new();
        cache.set(key_in("a", "title", 1), rendered("title"));
        assert!(cache.get_by_id(&template("b"), "title").is_none());

        cache.set(key_in("b", "title", 2), rendered("title"));
        assert_eq!(cache.size(), 2);
        assert!(cache.get(&key_in("a", "title", 1)).is_some());

        // retaining within "b" leaves "a" alone
        let ticket = cache.begin();
        let mut commit = CacheCommit::default();
        commit.retain_only(template("b"), Vec::new());
        assert!(cache.commit_if(ticket, commit));
        assert!(cache.get_by_id(&template("a"), "title").is_some());
        assert!(cache.get_by_id(&template("b"), "title").is_none());
    }

    #[test]
    fn test_clear_scopes() {
        let cache = RenderCache::new();
        cache.set(key("a", 1), rendered("a"));
        let template = template("t");
        let surface = Arc::new(crate::render::SurfaceAssembler::new(UnitConverter::default())
            .assemble(&crate::model::PageSettings::default()));
        cache.set_template(template.clone(), Fingerprint(9), surface);
        assert_eq!(cache.size(), 2);
        assert!(cache.get_template(&template, Fingerprint(8)).is_none());
        assert!(cache.get_template(&template, Fingerprint(9)).is_some());

        cache.clear_element_cache();
        assert_eq!(cache.size(), 1);
        cache.clear_template_cache();
        assert_eq!(cache.size(), 0);

        cache.set(key("a", 1), rendered("a"));
        cache.clear_all();
        assert_eq!(cache.stats(), CacheStats::default());
    }
}
