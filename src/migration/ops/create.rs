use super::{decode_payload, resolve_parent, Operation, OperationContext, ParentRef};
use crate::migration::{codes, StepResult};
use crate::store::TermFields;
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CreatePayload {
    taxonomy: String,
    name: String,
    description: String,
    slug: String,
    /// Slug of an existing term in the same taxonomy.
    parent: ParentRef,
}

/// Creates a term, optionally under a parent referenced by slug.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateOperation;

impl Operation for CreateOperation {
    fn execute(&self, payload: &Map<String, Value>, ctx: &mut OperationContext<'_>) -> StepResult {
        let payload: CreatePayload = match decode_payload(payload) {
            Ok(payload) => payload,
            Err(result) => return result,
        };

        if !ctx.store.taxonomy_exists(&payload.taxonomy) {
            return StepResult::failed(
                codes::TAXONOMY_ERROR,
                format!("Taxonomy {} does not exist", payload.taxonomy),
            );
        }

        let parent = match resolve_parent(ctx, &payload.parent, &payload.taxonomy) {
            Ok(parent) => parent,
            Err(result) => return result,
        };

        let fields = TermFields {
            description: payload.description,
            slug: payload.slug,
            parent,
        };
        match ctx.store.create_tag(&payload.taxonomy, &payload.name, fields) {
            Ok(term) => {
                tracing::info!(term = term.id, slug = %term.slug, taxonomy = %term.taxonomy, "created term");
                ctx.invalidate_cache();
                StepResult::succeeded(Some(term.id))
            }
            Err(err) => StepResult::from_store_error(&err),
        }
    }

    fn describe(&self, payload: &Map<String, Value>) -> String {
        let Ok(payload) = decode_payload::<CreatePayload>(payload) else {
            return "create term (invalid payload)".to_string();
        };
        let mut description = format!("create {} term {:?}", payload.taxonomy, payload.name);
        if !payload.slug.is_empty() {
            description.push_str(&format!(" with slug {}", payload.slug));
        }
        if let Some(parent) = payload.parent.label() {
            description.push_str(&format!(" under {parent}"));
        }
        description
    }
}
