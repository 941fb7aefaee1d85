//! Test data for trying migrations against a scratch store.
//!
//! Fixture terms hang off a single `fixture-parent` term and each gets one
//! tagged `post`, which is enough to exercise create, update and reassign.
use crate::store::{MemoryStore, TermFields, TermStore, DEFAULT_TAXONOMIES};
use anyhow::{anyhow, Result};
use serde::Serialize;

pub const FIXTURE_SLUG_PREFIX: &str = "fixture-";
pub const FIXTURE_TITLE_PREFIX: &str = "Fixture post";
pub const FIXTURE_TAXONOMY: &str = "category";
pub const DEFAULT_FIXTURE_COUNT: usize = 5;

/// What a fixtures command touched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FixtureSummary {
    pub terms: Vec<u64>,
    pub content: Vec<u64>,
}

/// Seed `count` fixture terms under `fixture-parent`, each with one post.
pub fn create_fixtures(store: &mut MemoryStore, count: usize) -> Result<FixtureSummary> {
    for taxonomy in DEFAULT_TAXONOMIES {
        store.register_taxonomy(taxonomy);
    }
    let mut summary = FixtureSummary::default();
    let parent = store
        .create_tag(
            FIXTURE_TAXONOMY,
            "Fixture Parent",
            TermFields {
                description: "Parent of generated fixture terms".to_string(),
                slug: format!("{FIXTURE_SLUG_PREFIX}parent"),
                parent: None,
            },
        )
        .map_err(|err| anyhow!("create fixture parent: {err} (run with --cleanup first?)"))?;
    summary.terms.push(parent.id);

    for n in 1..=count {
        let term = store
            .create_tag(
                FIXTURE_TAXONOMY,
                &format!("Fixture Term {n}"),
                TermFields {
                    description: format!("Generated fixture term {n}"),
                    slug: format!("{FIXTURE_SLUG_PREFIX}term-{n}"),
                    parent: Some(parent.id),
                },
            )
            .map_err(|err| anyhow!("create fixture term {n}: {err}"))?;
        let post = store.insert_content("post", &format!("{FIXTURE_TITLE_PREFIX} {n}"));
        store
            .attach_tag(post, term.id, FIXTURE_TAXONOMY)
            .map_err(|err| anyhow!("tag fixture post {post}: {err}"))?;
        summary.terms.push(term.id);
        summary.content.push(post);
    }
    store.invalidate_cache();
    tracing::info!(terms = summary.terms.len(), content = summary.content.len(), "created fixtures");
    Ok(summary)
}

/// Remove every fixture term and fixture post, wherever migrations moved them.
pub fn cleanup_fixtures(store: &mut MemoryStore) -> FixtureSummary {
    let content: Vec<u64> = store
        .content_items()
        .filter(|item| item.title.starts_with(FIXTURE_TITLE_PREFIX))
        .map(|item| item.id)
        .collect();
    for id in &content {
        store.delete_content(*id);
    }
    let terms: Vec<u64> = store
        .terms()
        .filter(|term| term.slug.starts_with(FIXTURE_SLUG_PREFIX))
        .map(|term| term.id)
        .collect();
    for id in &terms {
        store.delete_term(*id);
    }
    store.invalidate_cache();
    tracing::info!(terms = terms.len(), content = content.len(), "removed fixtures");
    FixtureSummary { terms, content }
}
