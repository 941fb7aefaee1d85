use super::{decode_payload, Operation, OperationContext};
use crate::migration::{codes, StepResult};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentTypes {
    One(String),
    Many(Vec<String>),
}

impl ContentTypes {
    fn into_list(self) -> Vec<String> {
        let list = match self {
            Self::One(kind) => vec![kind],
            Self::Many(kinds) => kinds,
        };
        list.into_iter().filter(|kind| !kind.is_empty()).collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReassignPayload {
    taxonomy: String,
    /// Absent or empty scans every kind of content.
    content_type: Option<ContentTypes>,
    from_slug: String,
    to_slug: String,
}

/// Moves every content association from one term to another.
///
/// The step reports success once the scan completes, even when individual
/// items failed; per-item outcomes live in `affected_ids`. A detach whose
/// attach then fails is not rolled back.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReassignOperation;

impl Operation for ReassignOperation {
    fn execute(&self, payload: &Map<String, Value>, ctx: &mut OperationContext<'_>) -> StepResult {
        let payload: ReassignPayload = match decode_payload(payload) {
            Ok(payload) => payload,
            Err(result) => return result,
        };
        let taxonomy = payload.taxonomy.as_str();

        let Some(from) = ctx.store.find_tag(&payload.from_slug, taxonomy) else {
            return StepResult::failed(
                codes::INVALID_FROM_SLUG,
                format!("Term {} does not exist in {taxonomy}", payload.from_slug),
            );
        };
        let Some(to) = ctx.store.find_tag(&payload.to_slug, taxonomy) else {
            return StepResult::failed(
                codes::INVALID_TO_SLUG,
                format!("Term {} does not exist in {taxonomy}", payload.to_slug),
            );
        };

        let content_types = payload
            .content_type
            .map(ContentTypes::into_list)
            .unwrap_or_default();
        let content_ids = ctx.store.query_content_by_tag(from.id, &content_types);
        let mut affected = BTreeMap::new();

        if from.id == to.id {
            tracing::info!(term = from.id, items = content_ids.len(), "reassign to same term; nothing to move");
            affected.extend(content_ids.into_iter().map(|id| (id, true)));
            return StepResult {
                affected_ids: Some(affected),
                ..StepResult::succeeded(None)
            };
        }

        let mut changed = false;
        for content_id in content_ids {
            let moved = match ctx.store.detach_tag(content_id, from.id, taxonomy) {
                Ok(()) => {
                    changed = true;
                    match ctx.store.attach_tag(content_id, to.id, taxonomy) {
                        Ok(()) => true,
                        Err(err) => {
                            tracing::warn!(content = content_id, to = %to.slug, error = %err, "attach failed after detach");
                            false
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(content = content_id, from = %from.slug, error = %err, "detach failed");
                    false
                }
            };
            affected.insert(content_id, moved);
        }

        tracing::info!(
            from = %from.slug,
            to = %to.slug,
            items = affected.len(),
            failed = affected.values().filter(|moved| !**moved).count(),
            "reassigned content"
        );
        if changed {
            ctx.invalidate_cache();
        }
        StepResult {
            affected_ids: Some(affected),
            ..StepResult::succeeded(None)
        }
    }

    fn describe(&self, payload: &Map<String, Value>) -> String {
        let Ok(payload) = decode_payload::<ReassignPayload>(payload) else {
            return "reassign content (invalid payload)".to_string();
        };
        let content_types = payload
            .content_type
            .map(ContentTypes::into_list)
            .unwrap_or_default();
        let scope = if content_types.is_empty() {
            "all content".to_string()
        } else {
            content_types.join(", ")
        };
        format!(
            "reassign {scope} in {} from {} to {}",
            payload.taxonomy, payload.from_slug, payload.to_slug
        )
    }
}

#[cfg(test)]
#[path = "reassign_tests.rs"]
mod tests;
