//! Purpose: Describe how upstream rows are remapped into the caller's row shape.
//! Exports: `Transform`.
//! Role: Chosen once when a client is built; applied by the decoder in two passes.
//! Invariants: `Identity` leaves row values untouched.
//! Invariants: `Remap` checks the upstream shape before the mapping function runs,
//! Invariants: and the mapping runs only once every row of the page has been checked.
use crate::core::error::{Error, ErrorKind, ValidationStage};
use crate::core::schema::conform;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

type Deferred = Box<dyn FnOnce() -> Result<Value, Error>>;
type UpstreamFn = dyn Fn(Value, &str) -> Result<Deferred, Error> + Send + Sync;

#[derive(Clone, Default)]
pub enum Transform {
    #[default]
    Identity,
    Remap(Arc<UpstreamFn>),
}

/// A row that passed the upstream check and is waiting to be mapped.
pub(crate) enum Staged {
    Ready(Value),
    Mapped(Deferred),
}

impl Staged {
    pub(crate) fn finish(self) -> Result<Value, Error> {
        match self {
            Staged::Ready(value) => Ok(value),
            Staged::Mapped(map) => map(),
        }
    }
}

impl Transform {
    /// Builds a remapping from upstream rows of shape `U` to values of shape `M`.
    ///
    /// `M` only needs to serialize; the result is checked against the target
    /// row shape by the decoder, so a mapping that drops a required field
    /// fails with a target-stage violation instead of producing a partial row.
    pub fn remap<U, M, F>(map: F) -> Self
    where
        U: DeserializeOwned + 'static,
        M: Serialize + 'static,
        F: Fn(U) -> M + Send + Sync + 'static,
    {
        let map = Arc::new(map);
        Transform::Remap(Arc::new(move |value: Value, path: &str| {
            let upstream: U =
                conform(value, path).map_err(|v| v.into_error(ValidationStage::Upstream))?;
            let map = Arc::clone(&map);
            let path = path.to_string();
            let deferred: Deferred = Box::new(move || {
                serde_json::to_value(map(upstream)).map_err(|err| {
                    Error::new(ErrorKind::Internal)
                        .with_message("remapped row could not be encoded as json")
                        .with_path(path)
                        .with_source(err)
                })
            });
            Ok(deferred)
        }))
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Transform::Identity)
    }

    /// First pass: checks one row against the upstream shape.
    pub(crate) fn check_upstream(&self, value: Value, path: &str) -> Result<Staged, Error> {
        match self {
            Transform::Identity => Ok(Staged::Ready(value)),
            Transform::Remap(check) => check(value, path).map(Staged::Mapped),
        }
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Identity => f.write_str("Identity"),
            Transform::Remap(_) => f.write_str("Remap(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Transform;
    use crate::core::error::{ErrorKind, ValidationStage};
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Deserialize)]
    struct QueryAnswer {
        query: String,
        answer: String,
    }

    fn pair_remap() -> Transform {
        Transform::remap(|row: QueryAnswer| json!({"anchor": row.query, "positive": row.answer}))
    }

    #[test]
    fn identity_passes_value_through() {
        let value = json!({"x": 1});
        let out = Transform::Identity
            .check_upstream(value.clone(), "rows[0].row")
            .and_then(|staged| staged.finish())
            .expect("identity");
        assert_eq!(out, value);
        assert!(Transform::default().is_identity());
    }

    #[test]
    fn remap_renames_fields() {
        let out = pair_remap()
            .check_upstream(json!({"query": "Q", "answer": "A"}), "rows[0].row")
            .and_then(|staged| staged.finish())
            .expect("remap");
        assert_eq!(out, json!({"anchor": "Q", "positive": "A"}));
    }

    #[test]
    fn remap_rejects_wrong_upstream_shape() {
        let err = pair_remap()
            .check_upstream(json!({"question": "Q", "answer": "A"}), "rows[1].row")
            .err()
            .expect("err");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.stage(), Some(ValidationStage::Upstream));
        assert_eq!(err.path(), Some("rows[1].row.query"));
    }

    #[test]
    fn mapping_waits_until_finish() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let transform = Transform::remap(move |row: QueryAnswer| {
            counter.fetch_add(1, Ordering::SeqCst);
            json!({"anchor": row.query, "positive": row.answer})
        });
        let staged = transform
            .check_upstream(json!({"query": "Q", "answer": "A"}), "rows[0].row")
            .expect("staged");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        staged.finish().expect("mapped");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
