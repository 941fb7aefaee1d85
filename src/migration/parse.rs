//! Migration document parsing and step id assignment.
use super::{codes, MigrationDocument, Step};
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Reasons a migration document could not be loaded. Any of these halts the
/// run before a single step executes.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{} not found", .0.display())]
    FileNotFound(PathBuf),
    #[error("{0} is empty")]
    EmptyInput(String),
    #[error("read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed migration JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),
    #[error("malformed migration document: {0}")]
    InvalidShape(String),
}

impl ParseError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::FileNotFound(_) => codes::FILE_NOT_FOUND,
            Self::EmptyInput(_) => codes::FILE_EMPTY,
            Self::Unreadable { .. } => codes::FILE_UNREADABLE,
            Self::MalformedJson(_) | Self::InvalidShape(_) => codes::MALFORMED_JSON,
        }
    }
}

/// Read and parse a migration file.
pub fn parse_file(path: &Path) -> Result<MigrationDocument, ParseError> {
    let bytes = fs::read(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => ParseError::FileNotFound(path.to_path_buf()),
        _ => ParseError::Unreadable {
            path: path.to_path_buf(),
            source,
        },
    })?;
    if is_blank(&bytes) {
        return Err(ParseError::EmptyInput(path.display().to_string()));
    }
    parse_content(&bytes)
}

/// Parse migration JSON. A top-level object without `steps` yields an empty
/// document; a top-level array is read as the step list itself.
pub fn parse_content(bytes: &[u8]) -> Result<MigrationDocument, ParseError> {
    if is_blank(bytes) {
        return Err(ParseError::EmptyInput("migration input".to_string()));
    }
    let (raw_steps, extra) = match serde_json::from_slice::<Value>(bytes)? {
        Value::Object(mut root) => {
            let steps = match root.remove("steps") {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Array(steps)) => steps,
                Some(other) => {
                    return Err(ParseError::InvalidShape(format!(
                        "`steps` must be an array, found {}",
                        json_kind(&other)
                    )))
                }
            };
            (steps, root)
        }
        Value::Array(steps) => (steps, Map::new()),
        other => {
            return Err(ParseError::InvalidShape(format!(
                "expected an object or array, found {}",
                json_kind(&other)
            )))
        }
    };

    let steps = raw_steps
        .into_iter()
        .enumerate()
        .map(|(position, raw)| match raw {
            Value::Object(fields) => Ok(step_from_fields(position, fields)),
            other => Err(ParseError::InvalidShape(format!(
                "step {position} must be an object, found {}",
                json_kind(&other)
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MigrationDocument { steps, extra })
}

/// Id assigned to a step that does not carry one (missing, null, empty, or
/// zero). `position` counts every
/// step in the document, not only the ones missing an id.
pub fn default_step_id(position: usize) -> String {
    format!("{position:06}-step")
}

fn step_from_fields(position: usize, mut fields: Map<String, Value>) -> Step {
    let id = match fields.remove("id") {
        Some(Value::String(id)) if !id.is_empty() && id != "0" => id,
        Some(Value::Number(id)) if id.as_f64() != Some(0.0) => id.to_string(),
        _ => default_step_id(position),
    };
    let kind = match fields.remove("type") {
        Some(Value::String(kind)) => Some(kind),
        _ => None,
    };
    // Results from a previous run are stale once the document is re-parsed.
    fields.remove("result");
    Step {
        id,
        kind,
        fields,
        result: None,
    }
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[path = "parse_tests.rs"]
mod tests;
