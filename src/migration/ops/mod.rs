//! Step dispatch: a registry from step type to the [`Operation`] that runs it.
//!
//! The built-in kinds are `create`, `update` and `reassign`. Adding a kind
//! means registering another handler; the dispatcher itself never changes.
mod create;
mod reassign;
mod update;

pub use create::CreateOperation;
pub use reassign::ReassignOperation;
pub use update::UpdateOperation;

use super::{codes, MigrationOptions, ParentPolicy, Step, StepResult};
use crate::store::TermStore;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Everything a handler may touch while executing one step.
pub struct OperationContext<'a> {
    pub store: &'a mut dyn TermStore,
    pub options: &'a MigrationOptions,
}

impl OperationContext<'_> {
    /// Invalidate the store cache if the batch options ask for it.
    pub fn invalidate_cache(&mut self) {
        if self.options.invalidate_cache {
            self.store.invalidate_cache();
        }
    }
}

/// Handler for one step type.
pub trait Operation {
    fn execute(&self, payload: &Map<String, Value>, ctx: &mut OperationContext<'_>) -> StepResult;

    /// One-line description of what `execute` would do, for dry runs.
    fn describe(&self, payload: &Map<String, Value>) -> String;
}

/// Maps step types to handlers.
pub struct OperationRegistry {
    handlers: BTreeMap<String, Box<dyn Operation>>,
}

impl Default for OperationRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl OperationRegistry {
    /// Registry without any handlers; every step is a no-op.
    pub fn empty() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// Registry with the `create`, `update` and `reassign` handlers.
    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("create", CreateOperation);
        registry.register("update", UpdateOperation);
        registry.register("reassign", ReassignOperation);
        registry
    }

    /// Register `operation` for `kind`, returning the handler it replaced.
    pub fn register(
        &mut self,
        kind: impl Into<String>,
        operation: impl Operation + 'static,
    ) -> Option<Box<dyn Operation>> {
        self.handlers.insert(kind.into(), Box::new(operation))
    }

    pub fn get(&self, kind: &str) -> Option<&dyn Operation> {
        self.handlers.get(kind).map(|handler| handler.as_ref())
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Run `step` with the handler registered for its type. Steps without a
    /// type, or with an unregistered one, get the default (no-op) result.
    pub fn execute(&self, step: &Step, ctx: &mut OperationContext<'_>) -> StepResult {
        let Some(kind) = step.kind.as_deref() else {
            tracing::debug!(step = %step.id, "step has no type; skipping");
            return StepResult::default();
        };
        let Some(handler) = self.get(kind) else {
            tracing::debug!(step = %step.id, kind, "no operation registered; skipping");
            return StepResult::default();
        };
        tracing::debug!(step = %step.id, kind, "executing step");
        handler.execute(step.payload(), ctx)
    }

    /// Dry-run description of `step`, or `None` when it would be skipped.
    pub fn describe(&self, step: &Step) -> Option<String> {
        let handler = self.get(step.kind.as_deref()?)?;
        Some(handler.describe(step.payload()))
    }
}

/// Decode a payload into its typed form; a type mismatch fails the step.
///
/// `null` values are dropped first, so a field written as `null` reads the
/// same as a missing one.
pub(crate) fn decode_payload<T: DeserializeOwned>(
    payload: &Map<String, Value>,
) -> Result<T, StepResult> {
    serde_json::from_value(Value::Object(without_nulls(payload))).map_err(|err| {
        StepResult::failed(codes::INVALID_PAYLOAD, format!("invalid step payload: {err}"))
    })
}

fn without_nulls(payload: &Map<String, Value>) -> Map<String, Value> {
    payload
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| match value {
            Value::Object(nested) => (key.clone(), Value::Object(without_nulls(nested))),
            other => (key.clone(), other.clone()),
        })
        .collect()
}

/// A `parent` reference as written in a payload. Only a non-empty string can
/// name a term; anything else is kept so it can be reported.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub(crate) enum ParentRef {
    #[default]
    Absent,
    Slug(String),
    NotASlug(Value),
}

impl From<Value> for ParentRef {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Absent,
            Value::String(slug) if slug.is_empty() => Self::Absent,
            Value::String(slug) => Self::Slug(slug),
            other => Self::NotASlug(other),
        }
    }
}

impl ParentRef {
    /// `self` unless it is absent, then `other`.
    pub(crate) fn or(self, other: Self) -> Self {
        match self {
            Self::Absent => other,
            present => present,
        }
    }

    /// How the reference reads in messages and dry-run descriptions.
    pub(crate) fn label(&self) -> Option<String> {
        match self {
            Self::Absent => None,
            Self::Slug(slug) => Some(slug.clone()),
            Self::NotASlug(value) => Some(value.to_string()),
        }
    }
}

/// Resolve a parent reference within `taxonomy`.
///
/// `Ok(Some(id))` when it resolves, `Ok(None)` when it is absent or dropped
/// under [`ParentPolicy::Drop`], `Err` when [`ParentPolicy::Fail`] rejects it.
pub(crate) fn resolve_parent(
    ctx: &OperationContext<'_>,
    parent: &ParentRef,
    taxonomy: &str,
) -> Result<Option<u64>, StepResult> {
    let label = match parent {
        ParentRef::Absent => return Ok(None),
        ParentRef::Slug(slug) => {
            if let Some(term) = ctx.store.find_tag(slug, taxonomy) {
                return Ok(Some(term.id));
            }
            slug.clone()
        }
        ParentRef::NotASlug(value) => value.to_string(),
    };
    match ctx.options.parent_policy {
        ParentPolicy::Drop => {
            tracing::warn!(parent = %label, taxonomy, "parent not found; dropping parent");
            Ok(None)
        }
        ParentPolicy::Fail => Err(StepResult::failed(
            codes::INVALID_PARENT,
            format!("Parent term {label} does not exist in {taxonomy}"),
        )),
    }
}
