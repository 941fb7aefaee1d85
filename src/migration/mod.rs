//! Migration documents, step results, and the policies that shape execution.
//!
//! A document is an ordered list of steps. Parsing assigns every step an id,
//! the batch runner executes steps in order and attaches a [`StepResult`] to
//! each one, so the executed document doubles as a record of what happened.
pub mod ops;
pub mod parse;
pub mod run;

pub use ops::{Operation, OperationContext, OperationRegistry};
pub use parse::{parse_content, parse_file, ParseError};
pub use run::{BatchRunner, Hooks, PlannedAction};

use crate::store::StoreError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Categorical failure identifiers surfaced as `error_code`.
pub mod codes {
    pub const FILE_NOT_FOUND: &str = "file-not-found";
    pub const FILE_EMPTY: &str = "file-empty";
    pub const FILE_UNREADABLE: &str = "file-unreadable";
    pub const MALFORMED_JSON: &str = "malformed-json";
    pub const TAXONOMY_ERROR: &str = "taxonomy-error";
    pub const EMPTY_SLUG: &str = "empty-slug";
    pub const INVALID_SLUG: &str = "invalid-slug";
    pub const INVALID_FROM_SLUG: &str = "invalid-from-slug";
    pub const INVALID_TO_SLUG: &str = "invalid-to-slug";
    pub const INVALID_PARENT: &str = "invalid-parent";
    pub const INVALID_PAYLOAD: &str = "invalid-payload";
}

/// What to do when a `parent` slug does not resolve to an existing term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentPolicy {
    /// Drop the parent and carry on: creates land at the root, updates keep
    /// the current parent.
    #[default]
    Drop,
    /// Fail the step with `invalid-parent`.
    Fail,
}

pub const DEFAULT_PARENT_POLICY: ParentPolicy = ParentPolicy::Drop;

/// Knobs shared by every operation in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationOptions {
    pub parent_policy: ParentPolicy,
    /// Ask the store to invalidate its cache after each successful mutation.
    pub invalidate_cache: bool,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            parent_policy: DEFAULT_PARENT_POLICY,
            invalidate_cache: true,
        }
    }
}

/// A parsed migration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MigrationDocument {
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Top-level keys other than `steps`, kept as written.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One migration instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Everything else the step carried.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<StepResult>,
}

impl Step {
    /// Type-specific payload: the object stored under the step's own type key
    /// (`"create": {...}`) when present, otherwise the step's flat fields.
    pub fn payload(&self) -> &Map<String, Value> {
        self.kind
            .as_deref()
            .and_then(|kind| self.fields.get(kind))
            .and_then(Value::as_object)
            .unwrap_or(&self.fields)
    }
}

/// Outcome of a single step.
///
/// `success` is true exactly when no error is set. The default value
/// (`success == false` with no error) means nothing happened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<u64>,
    /// Per content item outcome; reassign only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_ids: Option<BTreeMap<u64, bool>>,
}

impl StepResult {
    pub fn succeeded(entity_id: Option<u64>) -> Self {
        Self {
            success: true,
            entity_id,
            ..Self::default()
        }
    }

    pub fn failed(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_code: Some(code.into()),
            error_message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Copy a store failure verbatim.
    pub fn from_store_error(err: &StoreError) -> Self {
        Self::failed(err.code.clone(), err.message.clone())
    }

    /// True for the default result: not a success, but no error either.
    pub fn is_noop(&self) -> bool {
        !self.success && self.error_code.is_none()
    }
}
