//! JSON snapshot persistence for [`MemoryStore`].
use super::MemoryStore;
use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Load a store snapshot; a missing file yields a fresh store.
pub fn load_store(path: &Path) -> Result<MemoryStore> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "store snapshot missing; starting fresh");
            return Ok(MemoryStore::new());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("read store {}", path.display()));
        }
    };
    let store: MemoryStore = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse store snapshot {}", path.display()))?;
    Ok(store)
}

/// Persist a store snapshot in a stable JSON format.
pub fn save_store(path: &Path, store: &MemoryStore) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(store).context("serialize store snapshot")?;
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{TermFields, TermStore};

    #[test]
    fn snapshot_round_trips_terms_and_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/store.json");

        let mut store = MemoryStore::new();
        let term = store
            .create_tag("category", "News", TermFields::default())
            .expect("term");
        let post = store.insert_content("post", "Hello");
        store.attach_tag(post, term.id, "category").expect("attach");
        save_store(&path, &store).expect("save");

        let mut loaded = load_store(&path).expect("load");
        assert_eq!(loaded.find_tag("news", "category"), Some(term));
        let next = loaded
            .create_tag("category", "Sports", TermFields::default())
            .expect("next term");
        assert_eq!(next.id, 2);
        assert_eq!(loaded.query_content_by_tag(1, &[]), vec![post]);
    }

    #[test]
    fn missing_snapshot_starts_with_default_taxonomies() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = load_store(&dir.path().join("absent.json")).expect("load");
        assert!(store.taxonomy_exists("category"));
        assert!(store.taxonomy_exists("post_tag"));
        assert_eq!(store.terms().count(), 0);
    }
}
