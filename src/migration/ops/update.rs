use super::{decode_payload, resolve_parent, Operation, OperationContext, ParentRef};
use crate::migration::{codes, StepResult};
use crate::store::TermChanges;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Changes spelled out in a nested `fields` object, where `slug` is the new
/// slug rather than the lookup key.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UpdateFields {
    name: Option<String>,
    description: Option<String>,
    slug: Option<String>,
    parent: ParentRef,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UpdatePayload {
    /// Identifies the term to change.
    slug: String,
    taxonomy: String,
    name: Option<String>,
    description: Option<String>,
    new_slug: Option<String>,
    parent: ParentRef,
    fields: UpdateFields,
}

impl UpdatePayload {
    /// Merge the nested `fields` object over the top-level shorthands.
    fn requested(self) -> (String, String, UpdateFields) {
        let fields = UpdateFields {
            name: self.fields.name.or(self.name),
            description: self.fields.description.or(self.description),
            slug: self.fields.slug.or(self.new_slug),
            parent: self.fields.parent.or(self.parent),
        };
        (self.slug, self.taxonomy, fields)
    }
}

/// Updates an existing term located by slug. Only fields named in the step
/// are changed.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateOperation;

impl Operation for UpdateOperation {
    fn execute(&self, payload: &Map<String, Value>, ctx: &mut OperationContext<'_>) -> StepResult {
        let payload: UpdatePayload = match decode_payload(payload) {
            Ok(payload) => payload,
            Err(result) => return result,
        };
        let (slug, taxonomy, requested) = payload.requested();

        if slug.is_empty() {
            return StepResult::failed(codes::EMPTY_SLUG, "Slug is empty");
        }
        let Some(term) = ctx.store.find_tag(&slug, &taxonomy) else {
            return StepResult::failed(
                codes::INVALID_SLUG,
                format!("Term {slug} does not exist in {taxonomy}"),
            );
        };

        let parent = match resolve_parent(ctx, &requested.parent, &taxonomy) {
            Ok(parent) => parent,
            Err(result) => return result,
        };
        let changes = TermChanges {
            name: requested.name,
            description: requested.description,
            slug: requested.slug,
            parent,
        };
        if changes.is_empty() {
            tracing::debug!(term = term.id, taxonomy = %taxonomy, "update has no changes left");
            return StepResult::succeeded(Some(term.id));
        }

        match ctx.store.update_tag(term.id, &taxonomy, changes) {
            Ok(updated) => {
                tracing::info!(term = updated.id, slug = %updated.slug, taxonomy = %taxonomy, "updated term");
                ctx.invalidate_cache();
                StepResult::succeeded(Some(term.id))
            }
            Err(err) => StepResult::from_store_error(&err),
        }
    }

    fn describe(&self, payload: &Map<String, Value>) -> String {
        let Ok(payload) = decode_payload::<UpdatePayload>(payload) else {
            return "update term (invalid payload)".to_string();
        };
        let (slug, taxonomy, requested) = payload.requested();
        let mut changed = Vec::new();
        if requested.name.is_some() {
            changed.push("name");
        }
        if requested.description.is_some() {
            changed.push("description");
        }
        if requested.slug.is_some() {
            changed.push("slug");
        }
        if requested.parent != ParentRef::Absent {
            changed.push("parent");
        }
        if changed.is_empty() {
            format!("update {taxonomy} term {slug} (no changes)")
        } else {
            format!("update {taxonomy} term {slug}: {}", changed.join(", "))
        }
    }
}
