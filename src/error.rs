//! Error taxonomy. Every variant is a schema/configuration defect; nothing is
//! retried.

use std::fmt;
use std::path::PathBuf;

use crate::descriptor::TypeDescriptor;

/// A rule payload that does not match any recognized shape.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("rule `{rule}`: {message}")]
pub struct RuleError {
    pub rule: String,
    pub message: String,
}

impl RuleError {
    pub fn new(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self { rule: rule.into(), message: message.into() }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("malformed path `{path}`: {reason}")]
    MalformedPath { path: String, reason: String },

    #[error("configuration error at `{path}`: {source}")]
    Configuration {
        path: String,
        #[source]
        source: RuleError,
    },

    /// `at` is the tree location; the sources are the two declaring paths.
    #[error("shape conflict at `{at}`: `{left_source}` declares {left} but `{right_source}` declares {right}")]
    ShapeConflict {
        at: String,
        left_source: String,
        left: TypeDescriptor,
        right_source: String,
        right: TypeDescriptor,
    },
}

impl CompileError {
    pub fn malformed(path: &str, reason: impl Into<String>) -> Self {
        CompileError::MalformedPath { path: path.to_string(), reason: reason.into() }
    }

    /// The input path the error is reported against (the first one for conflicts).
    pub fn path(&self) -> &str {
        match self {
            CompileError::MalformedPath { path, .. } => path,
            CompileError::Configuration { path, .. } => path,
            CompileError::ShapeConflict { left_source, .. } => left_source,
        }
    }
}

/// All independent errors of one compilation, in input order.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub struct CompileErrors(pub Vec<CompileError>);

impl CompileErrors {
    pub fn iter(&self) -> std::slice::Iter<'_, CompileError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CompileErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [single] => write!(f, "{single}"),
            errors => {
                write!(f, "{} schema errors", errors.len())?;
                for e in errors {
                    write!(f, "\n  - {e}")?;
                }
                Ok(())
            }
        }
    }
}

impl IntoIterator for CompileErrors {
    type Item = CompileError;
    type IntoIter = std::vec::IntoIter<CompileError>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Failures reading schema documents or compiler configuration.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Config deserialization failure with the JSON path of the bad value.
    #[error("invalid config at JSON path {path}: {message}")]
    Config { path: String, message: String },

    #[error("schema document must be a JSON object of path → declaration, found {found}")]
    SchemaNotAnObject { found: &'static str },

    #[error("declaration for `{path}` must be a JSON object, found {found}")]
    DeclarationNotAnObject { path: String, found: &'static str },
}

pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
