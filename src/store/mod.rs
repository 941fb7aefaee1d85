//! Storage adapter for term taxonomies and the content that references them.
//!
//! Migrations only ever talk to [`TermStore`]; the in-memory implementation
//! backs the CLI and the test suites.
mod memory;
mod snapshot;

pub use memory::{ContentItem, MemoryStore, DEFAULT_TAXONOMIES};
pub use snapshot::{load_store, save_store};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A classification node owned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: u64,
    pub taxonomy: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    /// Parent term id; 0 means root.
    #[serde(default)]
    pub parent: u64,
}

/// Optional fields accepted when creating a term.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermFields {
    pub description: String,
    /// Empty means "derive from the name".
    pub slug: String,
    pub parent: Option<u64>,
}

/// Field changes for an update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub slug: Option<String>,
    pub parent: Option<u64>,
}

impl TermChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.slug.is_none()
            && self.parent.is_none()
    }
}

/// Failure reported by a store, carried verbatim into step results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct StoreError {
    pub code: String,
    pub message: String,
}

impl StoreError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Operations the migration core needs from a term storage engine.
pub trait TermStore {
    fn taxonomy_exists(&self, taxonomy: &str) -> bool;

    fn find_tag(&self, slug: &str, taxonomy: &str) -> Option<Term>;

    fn create_tag(
        &mut self,
        taxonomy: &str,
        name: &str,
        fields: TermFields,
    ) -> Result<Term, StoreError>;

    fn update_tag(
        &mut self,
        id: u64,
        taxonomy: &str,
        changes: TermChanges,
    ) -> Result<Term, StoreError>;

    /// Content ids associated with `tag_id`, in a stable order. An empty
    /// `content_types` slice matches every kind of content.
    fn query_content_by_tag(&self, tag_id: u64, content_types: &[String]) -> Vec<u64>;

    fn detach_tag(&mut self, content_id: u64, tag_id: u64, taxonomy: &str)
        -> Result<(), StoreError>;

    fn attach_tag(&mut self, content_id: u64, tag_id: u64, taxonomy: &str)
        -> Result<(), StoreError>;

    /// Best-effort; implementations must not fail.
    fn invalidate_cache(&mut self);
}
