//! Purpose: Turn an untyped rows payload into a typed `Page`.
//! Exports: `decode_page`.
//! Role: Pure step between the fetcher and the row stream.
//! Invariants: Either every row conforms to the target shape or no page is returned.
//! Invariants: Stages run page-wide in order: envelope, upstream (every row), then
//! Invariants: mapping and target (every row). An earlier stage's failure wins.
//! Invariants: Failures carry the stage and the path of the offending value.
use crate::core::error::{Error, ValidationStage};
use crate::core::page::Page;
use crate::core::schema::{child_path, conform, index_path};
use crate::core::transform::Transform;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub fn decode_page<T>(raw: Value, transform: &Transform) -> Result<Page<T>, Error>
where
    T: DeserializeOwned,
{
    let envelope: Page<Value> =
        conform(raw, "$").map_err(|v| v.into_error(ValidationStage::Envelope))?;

    let staged = envelope
        .try_map_rows(|position, value| transform.check_upstream(value, &row_path(position)))?;

    staged.try_map_rows(|position, staged| {
        let candidate = staged.finish()?;
        conform(candidate, &row_path(position)).map_err(|v| v.into_error(ValidationStage::Target))
    })
}

fn row_path(position: usize) -> String {
    child_path(&index_path("rows", position), "row")
}
