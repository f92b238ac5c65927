// Shape conformance: untyped JSON in, typed value or a located violation out.
use crate::core::error::{Error, ErrorKind, ValidationStage};
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_path_to_error::Segment;

/// A value that did not match its declared shape at `path`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn into_error(self, stage: ValidationStage) -> Error {
        Error::new(ErrorKind::Validation)
            .with_message(self.message)
            .with_path(self.path)
            .with_stage(stage)
    }
}

/// Checks `value` against the shape `S` declares through its `Deserialize` impl.
///
/// The violation path is `path` extended with the location inside `value`
/// where deserialization stopped. A missing field is reported at the field
/// itself (`rows[3].row.id`), not at the object that lacks it.
pub fn conform<S>(value: Value, path: &str) -> Result<S, Violation>
where
    S: DeserializeOwned,
{
    serde_path_to_error::deserialize(value).map_err(|err| {
        let message = err.inner().to_string();
        let mut located = path.to_string();
        for segment in err.path().iter() {
            located = match segment {
                Segment::Seq { index } => index_path(&located, *index),
                Segment::Map { key } => child_path(&located, key),
                Segment::Enum { variant } => child_path(&located, variant),
                Segment::Unknown => located,
            };
        }
        if let Some(field) = missing_field(&message) {
            located = child_path(&located, field);
        }
        Violation::new(located, message)
    })
}

fn missing_field(message: &str) -> Option<&str> {
    message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.strip_suffix('`'))
}

/// Joins a parent path and a child segment (`rows[2]` + `row` -> `rows[2].row`).
pub fn child_path(parent: &str, child: &str) -> String {
    if parent.is_empty() || parent == "$" {
        child.to_string()
    } else {
        format!("{parent}.{child}")
    }
}

pub fn index_path(parent: &str, index: usize) -> String {
    format!("{parent}[{index}]")
}
