//! Purpose: Model one page of rows as returned by the rows endpoint.
//! Exports: `Page`, `RowRecord`, `FeatureDescriptor`, `FeatureType`, `DtypeSpec`.
//! Role: Shared envelope for the decoder; `Page<Value>` is the untyped wire form.
//! Invariants: Field names serialize back to the wire names, so a decoded page
//! Invariants: re-serializes into a payload that decodes to an equal page.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<R> {
    pub features: Vec<FeatureDescriptor>,
    pub rows: Vec<RowRecord<R>>,
    #[serde(rename = "num_rows_total")]
    pub total_row_count: u64,
    #[serde(rename = "num_rows_per_page")]
    pub rows_per_page: u64,
    pub partial: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RowRecord<R> {
    #[serde(rename = "row_idx")]
    pub index: u64,
    #[serde(rename = "row")]
    pub value: R,
    pub truncated_cells: Vec<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureDescriptor {
    pub feature_idx: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FeatureType,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureType {
    /// A scalar column such as `{"dtype": "string", "_type": "Value"}`.
    Scalar(DtypeSpec),
    /// A nested column (`Sequence`, ...) carrying an inner feature.
    Nested {
        feature: Value,
        #[serde(rename = "_type")]
        type_name: String,
    },
    /// A list of named scalar columns.
    Columns(Vec<BTreeMap<String, DtypeSpec>>),
    /// Any other tagged type (`ClassLabel`, `Image`, `Audio`, `Translation`, ...).
    /// The remaining attributes are kept as-is.
    Other {
        #[serde(rename = "_type")]
        type_name: String,
        #[serde(flatten)]
        attributes: Map<String, Value>,
    },
}

impl FeatureType {
    /// The `_type` tag, when the type carries one.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            FeatureType::Scalar(spec) => Some(&spec.type_name),
            FeatureType::Nested { type_name, .. } | FeatureType::Other { type_name, .. } => {
                Some(type_name)
            }
            FeatureType::Columns(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DtypeSpec {
    pub dtype: String,
    #[serde(rename = "_type")]
    pub type_name: String,
}

impl<R> Page<R> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Rebuilds the page with every row value passed through `f`.
    /// Stops at the first failing row.
    pub fn try_map_rows<S, E, F>(self, mut f: F) -> Result<Page<S>, E>
    where
        F: FnMut(usize, R) -> Result<S, E>,
    {
        let rows = self
            .rows
            .into_iter()
            .enumerate()
            .map(|(position, record)| {
                Ok(RowRecord {
                    index: record.index,
                    value: f(position, record.value)?,
                    truncated_cells: record.truncated_cells,
                })
            })
            .collect::<Result<Vec<_>, E>>()?;
        Ok(Page {
            features: self.features,
            rows,
            total_row_count: self.total_row_count,
            rows_per_page: self.rows_per_page,
            partial: self.partial,
        })
    }

    pub fn values(&self) -> impl Iterator<Item = &R> {
        self.rows.iter().map(|record| &record.value)
    }
}
