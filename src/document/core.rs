use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use blake3::Hash;
use thiserror::Error;

use crate::error::{CurtainError, Result};

pub type ElementId = String;

/// Media buffering levels, ordered from nothing loaded to fully buffered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReadyState {
    HaveNothing = 0,
    HaveMetadata = 1,
    HaveCurrentData = 2,
    HaveFutureData = 3,
    HaveEnoughData = 4,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaState {
    pub ready_state: ReadyState,
    /// Whether the host allows playback without a user gesture.
    pub autoplay_allowed: bool,
    pub playing: bool,
}

impl MediaState {
    pub fn new(ready_state: ReadyState) -> Self {
        Self {
            ready_state,
            autoplay_allowed: true,
            playing: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    Block,
    Media(MediaState),
    Input { value: String },
    Button { disabled: bool },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("playback of `{0}` was blocked by the autoplay policy")]
    NotAllowed(ElementId),
    #[error("`{0}` is not a playable media element")]
    NotMedia(ElementId),
}

/// Declarative description of an element to insert into a [`Document`].
#[derive(Debug, Clone)]
pub struct Element {
    pub id: ElementId,
    pub kind: ElementKind,
    pub parent: Option<ElementId>,
    pub text: String,
    pub classes: BTreeSet<String>,
    pub styles: BTreeMap<String, String>,
    /// Distance from the top of the page in pixels; used by scroll effects.
    pub top: f64,
    pub height: f64,
}

impl Element {
    fn with_kind(id: impl Into<ElementId>, kind: ElementKind) -> Self {
        Self {
            id: id.into(),
            kind,
            parent: None,
            text: String::new(),
            classes: BTreeSet::new(),
            styles: BTreeMap::new(),
            top: 0.0,
            height: 0.0,
        }
    }

    pub fn block(id: impl Into<ElementId>) -> Self {
        Self::with_kind(id, ElementKind::Block)
    }

    pub fn media(id: impl Into<ElementId>, ready_state: ReadyState) -> Self {
        Self::with_kind(id, ElementKind::Media(MediaState::new(ready_state)))
    }

    pub fn input(id: impl Into<ElementId>) -> Self {
        Self::with_kind(
            id,
            ElementKind::Input {
                value: String::new(),
            },
        )
    }

    pub fn button(id: impl Into<ElementId>, label: impl Into<String>) -> Self {
        Self::with_kind(id, ElementKind::Button { disabled: false }).with_text(label)
    }

    pub fn with_parent(mut self, parent: impl Into<ElementId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.insert(class.into());
        self
    }

    pub fn with_style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.styles.insert(property.into(), value.into());
        self
    }

    pub fn with_top(mut self, top: f64) -> Self {
        self.top = top;
        self
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }

    pub fn with_autoplay(mut self, allowed: bool) -> Self {
        if let ElementKind::Media(media) = &mut self.kind {
            media.autoplay_allowed = allowed;
        }
        self
    }
}

/// Current state of one element plus change tracking.
#[derive(Debug, Clone)]
pub struct ElementState {
    pub kind: ElementKind,
    pub parent: Option<ElementId>,
    pub text: String,
    pub classes: BTreeSet<String>,
    pub styles: BTreeMap<String, String>,
    pub top: f64,
    pub height: f64,
    hash: Hash,
    pub is_dirty: bool,
}

impl ElementState {
    fn from_element(element: Element) -> Self {
        let mut state = Self {
            kind: element.kind,
            parent: element.parent,
            text: element.text,
            classes: element.classes,
            styles: element.styles,
            top: element.top,
            height: element.height,
            hash: blake3::hash(&[]),
            is_dirty: true,
        };
        state.hash = state.fingerprint();
        state
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        self.styles.get(property).map(String::as_str)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn media(&self) -> Option<&MediaState> {
        match &self.kind {
            ElementKind::Media(media) => Some(media),
            _ => None,
        }
    }

    fn fingerprint(&self) -> Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(format!("{:?}", self.kind).as_bytes());
        hasher.update(&[0]);
        hasher.update(self.text.as_bytes());
        for class in &self.classes {
            hasher.update(&[1]);
            hasher.update(class.as_bytes());
        }
        for (property, value) in &self.styles {
            hasher.update(&[2]);
            hasher.update(property.as_bytes());
            hasher.update(&[3]);
            hasher.update(value.as_bytes());
        }
        hasher.finalize()
    }

    /// Recompute the fingerprint; returns true when the visible state changed.
    fn refresh(&mut self) -> bool {
        let next = self.fingerprint();
        if next != self.hash {
            self.hash = next;
            self.is_dirty = true;
            true
        } else {
            false
        }
    }
}

/// Virtual page: elements keyed by id, in insertion order, plus the current
/// address fragment.
#[derive(Debug, Default)]
pub struct Document {
    entries: HashMap<ElementId, ElementState>,
    order: Vec<ElementId>,
    dirty: HashSet<ElementId>,
    location_hash: Option<String>,
    mutations: usize,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert used when assembling a page.
    pub fn with_element(mut self, element: Element) -> Result<Self> {
        self.insert(element)?;
        Ok(self)
    }

    pub fn insert(&mut self, element: Element) -> Result<()> {
        if self.entries.contains_key(&element.id) {
            return Err(CurtainError::DuplicateElement(element.id));
        }
        if let Some(parent) = &element.parent {
            if !self.entries.contains_key(parent) {
                return Err(CurtainError::ElementNotFound(parent.clone()));
            }
        }
        let id = element.id.clone();
        self.entries
            .insert(id.clone(), ElementState::from_element(element));
        self.order.push(id.clone());
        self.dirty.insert(id);
        self.mutations += 1;
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&ElementState> {
        self.entries.get(id)
    }

    pub fn ids(&self) -> &[ElementId] {
        &self.order
    }

    /// Elements carrying `class`, in document order.
    pub fn by_class(&self, class: &str) -> Vec<ElementId> {
        self.order
            .iter()
            .filter(|id| {
                self.entries
                    .get(id.as_str())
                    .map(|state| state.has_class(class))
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    /// Direct children of `parent`, in document order.
    pub fn children_of(&self, parent: &str) -> Vec<ElementId> {
        self.order
            .iter()
            .filter(|id| {
                self.entries
                    .get(id.as_str())
                    .and_then(|state| state.parent.as_deref())
                    == Some(parent)
            })
            .cloned()
            .collect()
    }

    pub fn style(&self, id: &str, property: &str) -> Option<&str> {
        self.entries.get(id).and_then(|state| state.style(property))
    }

    pub fn text(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(|state| state.text.as_str())
    }

    pub fn has_class(&self, id: &str, class: &str) -> bool {
        self.entries
            .get(id)
            .map(|state| state.has_class(class))
            .unwrap_or(false)
    }

    pub fn set_style(
        &mut self,
        id: &str,
        property: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        let (property, value) = (property.into(), value.into());
        self.mutate(id, move |state| {
            state.styles.insert(property, value);
        })
    }

    pub fn remove_style(&mut self, id: &str, property: &str) -> Result<()> {
        self.mutate(id, |state| {
            state.styles.remove(property);
        })
    }

    pub fn set_text(&mut self, id: &str, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        self.mutate(id, move |state| state.text = text)
    }

    pub fn add_class(&mut self, id: &str, class: &str) -> Result<()> {
        self.mutate(id, |state| {
            state.classes.insert(class.to_string());
        })
    }

    pub fn remove_class(&mut self, id: &str, class: &str) -> Result<()> {
        self.mutate(id, |state| {
            state.classes.remove(class);
        })
    }

    /// Toggle `class` on `id`; returns whether the class is now present.
    pub fn toggle_class(&mut self, id: &str, class: &str) -> Result<bool> {
        let present = self.has_class(id, class);
        if present {
            self.remove_class(id, class)?;
        } else {
            self.add_class(id, class)?;
        }
        Ok(!present)
    }

    pub fn media(&self, id: &str) -> Option<&MediaState> {
        self.entries.get(id).and_then(ElementState::media)
    }

    pub fn set_ready_state(&mut self, id: &str, ready_state: ReadyState) -> Result<()> {
        let state = self
            .entries
            .get_mut(id)
            .ok_or_else(|| CurtainError::ElementNotFound(id.to_string()))?;
        match &mut state.kind {
            ElementKind::Media(media) => {
                media.ready_state = ready_state;
                Ok(())
            }
            _ => Err(CurtainError::NotMedia(id.to_string())),
        }
    }

    /// Start playback, honouring the element's autoplay policy.
    pub fn play(&mut self, id: &str) -> std::result::Result<(), PlaybackError> {
        let state = self
            .entries
            .get_mut(id)
            .ok_or_else(|| PlaybackError::NotMedia(id.to_string()))?;
        let ElementKind::Media(media) = &mut state.kind else {
            return Err(PlaybackError::NotMedia(id.to_string()));
        };
        if !media.autoplay_allowed {
            return Err(PlaybackError::NotAllowed(id.to_string()));
        }
        media.playing = true;
        if state.refresh() {
            self.dirty.insert(id.to_string());
            self.mutations += 1;
        }
        Ok(())
    }

    pub fn value(&self, id: &str) -> Option<&str> {
        match self.entries.get(id).map(|state| &state.kind) {
            Some(ElementKind::Input { value }) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn set_value(&mut self, id: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        self.mutate(id, move |state| {
            if let ElementKind::Input { value: current } = &mut state.kind {
                *current = value;
            }
        })
    }

    pub fn is_disabled(&self, id: &str) -> bool {
        matches!(
            self.entries.get(id).map(|state| &state.kind),
            Some(ElementKind::Button { disabled: true })
        )
    }

    pub fn set_disabled(&mut self, id: &str, disabled: bool) -> Result<()> {
        self.mutate(id, move |state| {
            if let ElementKind::Button { disabled: current } = &mut state.kind {
                *current = disabled;
            }
        })
    }

    pub fn set_location_hash(&mut self, hash: Option<&str>) {
        self.location_hash = hash.filter(|raw| raw.len() > 1).map(str::to_string);
    }

    pub fn location_hash(&self) -> Option<&str> {
        self.location_hash.as_deref()
    }

    /// Element named by the address fragment, if both exist.
    pub fn fragment_target(&self) -> Option<ElementId> {
        let hash = self.location_hash.as_deref()?;
        let id = hash.strip_prefix('#').unwrap_or(hash);
        self.contains(id).then(|| id.to_string())
    }

    pub fn take_dirty(&mut self) -> Vec<(ElementId, ElementState)> {
        let ids: Vec<_> = self.dirty.drain().collect();
        let mut dirty: Vec<_> = ids
            .into_iter()
            .filter_map(|id| {
                self.entries.get_mut(&id).map(|state| {
                    state.is_dirty = false;
                    (id.clone(), state.clone())
                })
            })
            .collect();
        dirty.sort_by_key(|(id, _)| self.order.iter().position(|known| known == id));
        dirty
    }

    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Number of visible changes since the last call.
    pub fn take_mutation_count(&mut self) -> usize {
        std::mem::take(&mut self.mutations)
    }

    fn mutate(&mut self, id: &str, apply: impl FnOnce(&mut ElementState)) -> Result<()> {
        let state = self
            .entries
            .get_mut(id)
            .ok_or_else(|| CurtainError::ElementNotFound(id.to_string()))?;
        apply(state);
        if state.refresh() {
            self.dirty.insert(id.to_string());
            self.mutations += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Document {
        Document::new()
            .with_element(Element::block("hero"))
            .unwrap()
            .with_element(Element::block("title").with_parent("hero").with_class("reveal-text"))
            .unwrap()
            .with_element(Element::media("hero-video", ReadyState::HaveMetadata))
            .unwrap()
    }

    #[test]
    fn inserts_are_dirty_until_taken() {
        let mut doc = page();
        let dirty = doc.take_dirty();
        assert_eq!(dirty.len(), 3);
        assert_eq!(dirty[0].0, "hero");
        assert!(!doc.has_dirty());
    }

    #[test]
    fn identical_writes_do_not_mark_dirty() {
        let mut doc = page();
        doc.take_dirty();
        doc.take_mutation_count();

        doc.set_style("hero", "opacity", "0").unwrap();
        assert_eq!(doc.take_dirty().len(), 1);
        doc.set_style("hero", "opacity", "0").unwrap();
        assert!(doc.take_dirty().is_empty());
        assert_eq!(doc.take_mutation_count(), 1);
    }

    #[test]
    fn missing_element_is_reported() {
        let mut doc = page();
        let err = doc.set_text("nope", "x").unwrap_err();
        assert!(matches!(err, CurtainError::ElementNotFound(id) if id == "nope"));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = page().with_element(Element::block("hero")).unwrap_err();
        assert!(matches!(err, CurtainError::DuplicateElement(_)));
    }

    #[test]
    fn fragment_resolves_only_existing_targets() {
        let mut doc = page();
        doc.set_location_hash(Some("#hero"));
        assert_eq!(doc.fragment_target().as_deref(), Some("hero"));
        doc.set_location_hash(Some("#contact"));
        assert_eq!(doc.fragment_target(), None);
        doc.set_location_hash(Some("#"));
        assert_eq!(doc.location_hash(), None);
    }

    #[test]
    fn blocked_autoplay_is_an_error() {
        let mut doc = Document::new()
            .with_element(Element::media("video", ReadyState::HaveEnoughData).with_autoplay(false))
            .unwrap();
        assert_eq!(
            doc.play("video"),
            Err(PlaybackError::NotAllowed("video".to_string()))
        );
        assert!(!doc.media("video").unwrap().playing);
    }

    #[test]
    fn class_queries_follow_document_order() {
        let doc = Document::new()
            .with_element(Element::block("b").with_class("reveal-up"))
            .unwrap()
            .with_element(Element::block("a").with_class("reveal-up"))
            .unwrap();
        assert_eq!(doc.by_class("reveal-up"), vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn toggle_class_reports_new_state() {
        let mut doc = page();
        assert!(doc.toggle_class("hero", "active").unwrap());
        assert!(!doc.toggle_class("hero", "active").unwrap());
    }
}
