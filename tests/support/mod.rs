//! Purpose: In-memory `PageFetcher` that serves scripted datasets for integration tests.
//! Exports: `ScriptedFetcher`, `Event`, `pair_rows`.
//! Role: Stand-in for the dataset service; pages are sliced from fixed row lists.
//! Invariants: Every request is logged before it resolves, so tests can assert call counts.
//! Invariants: Yields are cooperative (`yield_now`), keeping ordering tests deterministic.
#![allow(dead_code)]

use futures_util::future::BoxFuture;
use rowpager::api::{ApiResult, Endpoint, Error, ErrorKind, PageFetcher, Query};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Event {
    Start { dataset: String, offset: u64 },
    End { dataset: String, offset: u64 },
}

#[derive(Default)]
pub struct ScriptedFetcher {
    datasets: HashMap<String, Vec<Value>>,
    failures: HashMap<String, u64>,
    yields: HashMap<String, usize>,
    events: Mutex<Vec<Event>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(mut self, id: &str, rows: Vec<Value>) -> Self {
        self.datasets.insert(id.to_string(), rows);
        self
    }

    /// Answers requests for `id` at `offset` with a 503.
    pub fn failing_at(mut self, id: &str, offset: u64) -> Self {
        self.failures.insert(id.to_string(), offset);
        self
    }

    /// Makes every request for `id` yield to the scheduler `count` times first.
    pub fn yielding(mut self, id: &str, count: usize) -> Self {
        self.yields.insert(id.to_string(), count);
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().expect("events").clone()
    }

    pub fn offsets_for(&self, id: &str) -> Vec<u64> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Start { dataset, offset } if dataset == id => Some(offset),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: Event) {
        self.events.lock().expect("events").push(event);
    }

    fn page(&self, dataset: &str, offset: u64, length: u64) -> ApiResult<Value> {
        let Some(rows) = self.datasets.get(dataset) else {
            return Err(Error::new(ErrorKind::Transport)
                .with_message("error fetching data: Not Found")
                .with_status(404));
        };
        let start = (offset as usize).min(rows.len());
        let end = offset.saturating_add(length).min(rows.len() as u64) as usize;
        let page_rows: Vec<Value> = rows[start..end]
            .iter()
            .enumerate()
            .map(|(i, row)| json!({"row_idx": start + i, "row": row, "truncated_cells": []}))
            .collect();
        Ok(json!({
            "features": [
                {"feature_idx": 0, "name": "anchor", "type": {"dtype": "string", "_type": "Value"}}
            ],
            "rows": page_rows,
            "num_rows_total": rows.len(),
            "num_rows_per_page": length,
            "partial": false
        }))
    }
}

impl PageFetcher for ScriptedFetcher {
    fn fetch(&self, query: Query) -> BoxFuture<'_, ApiResult<Value>> {
        Box::pin(async move {
            assert_eq!(query.endpoint(), Endpoint::Rows);
            let dataset = query.get("dataset").unwrap_or_default().to_string();
            let offset: u64 = query
                .get("offset")
                .and_then(|value| value.parse().ok())
                .unwrap_or_default();
            let length: u64 = query
                .get("length")
                .and_then(|value| value.parse().ok())
                .unwrap_or_default();

            self.record(Event::Start {
                dataset: dataset.clone(),
                offset,
            });
            for _ in 0..self.yields.get(&dataset).copied().unwrap_or(0) {
                tokio::task::yield_now().await;
            }

            let result = if self.failures.get(&dataset) == Some(&offset) {
                Err(Error::new(ErrorKind::Transport)
                    .with_message("error fetching data: Service Unavailable")
                    .with_status(503)
                    .with_url(format!("scripted://rows?dataset={dataset}&offset={offset}")))
            } else {
                self.page(&dataset, offset, length)
            };
            self.record(Event::End { dataset, offset });
            result
        })
    }
}

/// `count` rows shaped `{anchor, positive}` with a per-dataset prefix.
pub fn pair_rows(prefix: &str, count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| json!({"anchor": format!("{prefix}-a{i}"), "positive": format!("{prefix}-p{i}")}))
        .collect()
}
