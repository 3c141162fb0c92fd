//! Seed documents: validated snapshots of the desired collection.

use std::path::Path;

use msglog_core::OutgoingMessage;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SeedError;

/// One document of a seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedDocument {
    pub author: String,
    pub body: String,
    pub complete: bool,
}

impl SeedDocument {
    fn from_value(index: usize, value: &Value) -> Result<Self, SeedError> {
        let object = value.as_object().ok_or(SeedError::NotAnObject { index })?;
        Ok(Self {
            author: string_field(object, index, "author")?,
            body: string_field(object, index, "body")?,
            complete: bool_field(object, index, "complete")?,
        })
    }
}

fn field<'a>(
    object: &'a Map<String, Value>,
    index: usize,
    field: &'static str,
) -> Result<&'a Value, SeedError> {
    object
        .get(field)
        .ok_or(SeedError::MissingField { index, field })
}

fn string_field(
    object: &Map<String, Value>,
    index: usize,
    name: &'static str,
) -> Result<String, SeedError> {
    field(object, index, name)?
        .as_str()
        .map(str::to_string)
        .ok_or(SeedError::InvalidField {
            index,
            field: name,
            expected: "string",
        })
}

fn bool_field(
    object: &Map<String, Value>,
    index: usize,
    name: &'static str,
) -> Result<bool, SeedError> {
    field(object, index, name)?
        .as_bool()
        .ok_or(SeedError::InvalidField {
            index,
            field: name,
            expected: "boolean",
        })
}

/// A validated, non-empty, ordered set of seed documents.
///
/// Every document carries `author`, `body` and `complete`; a value of this
/// type cannot exist otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seed {
    documents: Vec<SeedDocument>,
}

impl Seed {
    /// Wrap already-typed documents.
    ///
    /// # Errors
    /// Returns [`SeedError::Empty`] if there are no documents.
    pub fn new(documents: Vec<SeedDocument>) -> Result<Self, SeedError> {
        if documents.is_empty() {
            return Err(SeedError::Empty);
        }
        Ok(Self { documents })
    }

    /// Validate a `{"data": [...]}` seed value.
    ///
    /// # Errors
    /// Returns the first structural problem found.
    pub fn from_value(value: &Value) -> Result<Self, SeedError> {
        let data = value.get("data").ok_or(SeedError::MissingData)?;
        let items = data.as_array().ok_or(SeedError::DataNotArray)?;
        let documents = items
            .iter()
            .enumerate()
            .map(|(index, item)| SeedDocument::from_value(index, item))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(documents)
    }

    /// Parse and validate a `{"data": [...]}` seed.
    ///
    /// # Errors
    /// Returns error on malformed JSON or invalid documents.
    pub fn from_json_str(text: &str) -> Result<Self, SeedError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    /// Parse and validate newline-delimited documents, one per line.
    ///
    /// Blank lines are skipped; document indices count documents, not lines.
    ///
    /// # Errors
    /// Returns error on malformed JSON or invalid documents.
    pub fn from_jsonl_str(text: &str) -> Result<Self, SeedError> {
        let mut documents = Vec::new();
        for (line_idx, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(line).map_err(|source| {
                SeedError::JsonLine {
                    line: line_idx + 1,
                    source,
                }
            })?;
            documents.push(SeedDocument::from_value(documents.len(), &value)?);
        }
        Self::new(documents)
    }

    /// Load a seed file. Files ending in `.jsonl` are read line by line.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or does not validate.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if path.extension().is_some_and(|ext| ext == "jsonl") {
            Self::from_jsonl_str(&text)
        } else {
            Self::from_json_str(&text)
        }
    }

    #[must_use]
    pub fn documents(&self) -> &[SeedDocument] {
        &self.documents
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the seed has no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Messages to send, in seed order, with bodies taken verbatim.
    #[must_use]
    pub fn messages(&self) -> Vec<OutgoingMessage> {
        self.documents
            .iter()
            .map(|doc| OutgoingMessage::content(&doc.author, &doc.body))
            .collect()
    }
}
