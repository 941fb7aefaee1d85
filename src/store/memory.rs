use super::{StoreError, Term, TermChanges, TermFields, TermStore};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

/// Taxonomies every fresh store starts with.
pub const DEFAULT_TAXONOMIES: [&str; 2] = ["category", "post_tag"];

/// A piece of content and the terms attached to it, keyed by taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: u64,
    pub content_type: String,
    pub title: String,
    #[serde(default)]
    pub terms: BTreeMap<String, BTreeSet<u64>>,
}

impl ContentItem {
    pub fn has_term(&self, taxonomy: &str, term_id: u64) -> bool {
        self.terms
            .get(taxonomy)
            .is_some_and(|ids| ids.contains(&term_id))
    }
}

/// Term store held entirely in memory; serializable as a JSON snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    #[serde(default)]
    next_term_id: u64,
    #[serde(default)]
    next_content_id: u64,
    #[serde(default)]
    taxonomies: BTreeSet<String>,
    #[serde(default)]
    terms: BTreeMap<u64, Term>,
    #[serde(default)]
    content: BTreeMap<u64, ContentItem>,
    #[serde(skip)]
    cache_generation: u64,
}

impl MemoryStore {
    /// Empty store with [`DEFAULT_TAXONOMIES`] registered.
    pub fn new() -> Self {
        let mut store = Self::default();
        for taxonomy in DEFAULT_TAXONOMIES {
            store.register_taxonomy(taxonomy);
        }
        store
    }

    pub fn register_taxonomy(&mut self, taxonomy: &str) {
        self.taxonomies.insert(taxonomy.to_string());
    }

    pub fn term(&self, id: u64) -> Option<&Term> {
        self.terms.get(&id)
    }

    pub fn terms(&self) -> impl Iterator<Item = &Term> {
        self.terms.values()
    }

    pub fn content_item(&self, id: u64) -> Option<&ContentItem> {
        self.content.get(&id)
    }

    pub fn content_items(&self) -> impl Iterator<Item = &ContentItem> {
        self.content.values()
    }

    /// Number of times the cache has been invalidated since this store was
    /// created or loaded.
    pub fn cache_generation(&self) -> u64 {
        self.cache_generation
    }

    pub fn insert_content(&mut self, content_type: &str, title: &str) -> u64 {
        self.next_content_id += 1;
        let id = self.next_content_id;
        self.content.insert(
            id,
            ContentItem {
                id,
                content_type: content_type.to_string(),
                title: title.to_string(),
                terms: BTreeMap::new(),
            },
        );
        id
    }

    pub fn delete_content(&mut self, id: u64) -> Option<ContentItem> {
        self.content.remove(&id)
    }

    /// Remove a term, detach it from all content and move its children up to
    /// the deleted term's parent.
    pub fn delete_term(&mut self, id: u64) -> Option<Term> {
        let removed = self.terms.remove(&id)?;
        for term in self.terms.values_mut() {
            if term.parent == id {
                term.parent = removed.parent;
            }
        }
        for item in self.content.values_mut() {
            if let Some(ids) = item.terms.get_mut(&removed.taxonomy) {
                ids.remove(&id);
                if ids.is_empty() {
                    item.terms.remove(&removed.taxonomy);
                }
            }
        }
        Some(removed)
    }

    fn slug_taken(&self, taxonomy: &str, slug: &str, except: Option<u64>) -> bool {
        self.terms
            .values()
            .any(|term| term.taxonomy == taxonomy && term.slug == slug && Some(term.id) != except)
    }

    fn check_parent(&self, taxonomy: &str, parent: u64, child: Option<u64>) -> Result<(), StoreError> {
        if parent == 0 {
            return Ok(());
        }
        let mut cursor = parent;
        while cursor != 0 {
            if Some(cursor) == child {
                return Err(StoreError::new(
                    "invalid-parent",
                    "A term cannot be its own ancestor.",
                ));
            }
            match self.terms.get(&cursor) {
                Some(term) if term.taxonomy == taxonomy => cursor = term.parent,
                _ => {
                    return Err(StoreError::new(
                        "invalid-parent",
                        format!("Parent term {parent} does not exist in {taxonomy}."),
                    ))
                }
            }
        }
        Ok(())
    }

    fn term_in(&self, id: u64, taxonomy: &str) -> Result<&Term, StoreError> {
        self.terms
            .get(&id)
            .filter(|term| term.taxonomy == taxonomy)
            .ok_or_else(|| StoreError::new("invalid-term", format!("Term {id} does not exist in {taxonomy}.")))
    }
}

fn slug_separators() -> &'static Regex {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    SEPARATORS.get_or_init(|| Regex::new(r"[^a-z0-9_]+").expect("valid slug regex"))
}

/// Lowercase, collapse everything outside `[a-z0-9_]` into single dashes.
pub(crate) fn sanitize_slug(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    slug_separators()
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

impl TermStore for MemoryStore {
    fn taxonomy_exists(&self, taxonomy: &str) -> bool {
        self.taxonomies.contains(taxonomy)
    }

    fn find_tag(&self, slug: &str, taxonomy: &str) -> Option<Term> {
        let slug = sanitize_slug(slug);
        if slug.is_empty() {
            return None;
        }
        self.terms
            .values()
            .find(|term| term.taxonomy == taxonomy && term.slug == slug)
            .cloned()
    }

    fn create_tag(
        &mut self,
        taxonomy: &str,
        name: &str,
        fields: TermFields,
    ) -> Result<Term, StoreError> {
        if !self.taxonomy_exists(taxonomy) {
            return Err(StoreError::new(
                "invalid-taxonomy",
                format!("Invalid taxonomy {taxonomy}."),
            ));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::new(
                "empty-term-name",
                "A name is required for this term.",
            ));
        }
        let slug = if fields.slug.trim().is_empty() {
            sanitize_slug(name)
        } else {
            sanitize_slug(&fields.slug)
        };
        if slug.is_empty() {
            return Err(StoreError::new(
                "empty-term-slug",
                format!("Could not derive a slug for {name:?}."),
            ));
        }
        if self.slug_taken(taxonomy, &slug, None) {
            return Err(StoreError::new(
                "term-exists",
                "A term with the name provided already exists in this taxonomy.",
            ));
        }
        let parent = fields.parent.unwrap_or(0);
        self.check_parent(taxonomy, parent, None)?;

        self.next_term_id += 1;
        let term = Term {
            id: self.next_term_id,
            taxonomy: taxonomy.to_string(),
            name: name.to_string(),
            slug,
            description: fields.description,
            parent,
        };
        self.terms.insert(term.id, term.clone());
        Ok(term)
    }

    fn update_tag(
        &mut self,
        id: u64,
        taxonomy: &str,
        changes: TermChanges,
    ) -> Result<Term, StoreError> {
        self.term_in(id, taxonomy)?;
        if let Some(name) = changes.name.as_deref() {
            if name.trim().is_empty() {
                return Err(StoreError::new(
                    "empty-term-name",
                    "A name is required for this term.",
                ));
            }
        }
        let slug = match changes.slug.as_deref() {
            Some(raw) => {
                let slug = sanitize_slug(raw);
                if slug.is_empty() {
                    return Err(StoreError::new(
                        "empty-term-slug",
                        format!("Could not derive a slug from {raw:?}."),
                    ));
                }
                if self.slug_taken(taxonomy, &slug, Some(id)) {
                    return Err(StoreError::new(
                        "duplicate-slug",
                        format!("The slug \u{201c}{slug}\u{201d} is already in use by another term."),
                    ));
                }
                Some(slug)
            }
            None => None,
        };
        if let Some(parent) = changes.parent {
            self.check_parent(taxonomy, parent, Some(id))?;
        }

        let term = self
            .terms
            .get_mut(&id)
            .ok_or_else(|| StoreError::new("invalid-term", format!("Term {id} does not exist.")))?;
        if let Some(name) = changes.name {
            term.name = name.trim().to_string();
        }
        if let Some(description) = changes.description {
            term.description = description;
        }
        if let Some(slug) = slug {
            term.slug = slug;
        }
        if let Some(parent) = changes.parent {
            term.parent = parent;
        }
        Ok(term.clone())
    }

    fn query_content_by_tag(&self, tag_id: u64, content_types: &[String]) -> Vec<u64> {
        let Some(term) = self.terms.get(&tag_id) else {
            return Vec::new();
        };
        self.content
            .values()
            .filter(|item| content_types.is_empty() || content_types.contains(&item.content_type))
            .filter(|item| item.has_term(&term.taxonomy, tag_id))
            .map(|item| item.id)
            .collect()
    }

    fn detach_tag(
        &mut self,
        content_id: u64,
        tag_id: u64,
        taxonomy: &str,
    ) -> Result<(), StoreError> {
        let item = self.content.get_mut(&content_id).ok_or_else(|| {
            StoreError::new("invalid-content", format!("Content {content_id} does not exist."))
        })?;
        if let Some(ids) = item.terms.get_mut(taxonomy) {
            ids.remove(&tag_id);
            if ids.is_empty() {
                item.terms.remove(taxonomy);
            }
        }
        Ok(())
    }

    fn attach_tag(
        &mut self,
        content_id: u64,
        tag_id: u64,
        taxonomy: &str,
    ) -> Result<(), StoreError> {
        if !self.taxonomy_exists(taxonomy) {
            return Err(StoreError::new(
                "invalid-taxonomy",
                format!("Invalid taxonomy {taxonomy}."),
            ));
        }
        self.term_in(tag_id, taxonomy)?;
        let item = self.content.get_mut(&content_id).ok_or_else(|| {
            StoreError::new("invalid-content", format!("Content {content_id} does not exist."))
        })?;
        item.terms
            .entry(taxonomy.to_string())
            .or_default()
            .insert(tag_id);
        Ok(())
    }

    fn invalidate_cache(&mut self) {
        self.cache_generation += 1;
    }
}
