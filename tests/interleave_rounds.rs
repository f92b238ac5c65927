//! Purpose: Integration tests for the round-based interleaving combinator.
//! Exports: None (integration test module).
//! Role: Validate round composition, source ordering, concurrency, and fail-fast aborts.
//! Invariants: Uses the scripted in-memory fetcher; completion order is forced with yields.

mod support;

use futures_util::StreamExt;
use rowpager::api::{DatasetClient, ErrorKind, Page, PageRequest, RowStream, interleave};
use serde::Deserialize;
use std::sync::Arc;
use support::{Event, ScriptedFetcher, pair_rows};

#[derive(Clone, Debug, Deserialize, PartialEq)]
struct Pair {
    anchor: String,
    positive: String,
}

fn stream_for(fetcher: &Arc<ScriptedFetcher>, dataset: &str) -> RowStream<Pair> {
    DatasetClient::<Pair>::with_fetcher(dataset, fetcher.clone())
        .stream(PageRequest::new("train", "pair").with_length(2))
        .expect("stream")
}

fn anchors(round: &[Page<Pair>]) -> Vec<String> {
    round
        .iter()
        .map(|page| page.rows[0].value.anchor.clone())
        .collect()
}

#[tokio::test]
async fn exhausted_source_is_dropped_after_its_last_page() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .with_dataset("org/a", pair_rows("a", 6))
            .with_dataset("org/b", pair_rows("b", 2)),
    );
    let mut merged = interleave(vec![stream_for(&fetcher, "org/a"), stream_for(&fetcher, "org/b")]);

    let round = merged.next_round().await.expect("round 1").expect("pages");
    assert_eq!(anchors(&round), vec!["a-a0", "b-a0"]);

    let round = merged.next_round().await.expect("round 2").expect("pages");
    assert_eq!(anchors(&round), vec!["a-a2"]);
    assert_eq!(merged.active(), 1);

    let round = merged.next_round().await.expect("round 3").expect("pages");
    assert_eq!(anchors(&round), vec!["a-a4"]);

    assert!(merged.next_round().await.expect("end").is_none());
    assert_eq!(merged.active(), 0);
    assert_eq!(fetcher.offsets_for("org/a"), vec![0, 2, 4, 6]);
    assert_eq!(fetcher.offsets_for("org/b"), vec![0, 2]);
}

#[tokio::test]
async fn round_order_follows_sources_not_completion() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .with_dataset("org/slow", pair_rows("slow", 2))
            .with_dataset("org/fast", pair_rows("fast", 2))
            .yielding("org/slow", 5),
    );
    let mut merged = interleave(vec![
        stream_for(&fetcher, "org/slow"),
        stream_for(&fetcher, "org/fast"),
    ]);

    let round = merged.next_round().await.expect("round").expect("pages");
    assert_eq!(anchors(&round), vec!["slow-a0", "fast-a0"]);

    let events = fetcher.events();
    let fast_end = events
        .iter()
        .position(|event| matches!(event, Event::End { dataset, .. } if dataset == "org/fast"))
        .expect("fast end");
    let slow_end = events
        .iter()
        .position(|event| matches!(event, Event::End { dataset, .. } if dataset == "org/slow"))
        .expect("slow end");
    assert!(fast_end < slow_end, "fast source should finish first: {events:?}");
}

#[tokio::test]
async fn pulls_within_a_round_overlap() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .with_dataset("org/a", pair_rows("a", 2))
            .with_dataset("org/b", pair_rows("b", 2))
            .yielding("org/a", 2)
            .yielding("org/b", 2),
    );
    let mut merged = interleave(vec![stream_for(&fetcher, "org/a"), stream_for(&fetcher, "org/b")]);
    merged.next_round().await.expect("round").expect("pages");

    let events = fetcher.events();
    assert!(matches!(&events[0], Event::Start { dataset, .. } if dataset == "org/a"));
    assert!(matches!(&events[1], Event::Start { dataset, .. } if dataset == "org/b"));
}

#[tokio::test]
async fn first_pull_failure_aborts_without_a_round() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .with_dataset("org/a", pair_rows("a", 4))
            .failing_at("org/a", 0),
    );
    let mut merged = interleave(vec![stream_for(&fetcher, "org/a")]);

    let err = merged.next_round().await.expect_err("failure");
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(err.status(), Some(503));

    let err = merged.next_round().await.expect_err("aborted");
    assert_eq!(err.kind(), ErrorKind::Usage);
}

#[tokio::test]
async fn one_failing_source_aborts_the_merge_even_with_data_left() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .with_dataset("org/a", pair_rows("a", 10))
            .with_dataset("org/b", pair_rows("b", 10))
            .failing_at("org/b", 2),
    );
    let rounds: Vec<_> = interleave(vec![stream_for(&fetcher, "org/a"), stream_for(&fetcher, "org/b")])
        .into_stream()
        .collect()
        .await;

    assert_eq!(rounds.len(), 2);
    assert_eq!(rounds[0].as_ref().expect("round 1").len(), 2);
    let err = rounds[1].as_ref().expect_err("round 2");
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn no_sources_means_no_rounds() {
    let mut merged = interleave(Vec::<RowStream<Pair>>::new());
    assert_eq!(merged.active(), 0);
    assert!(merged.next_round().await.expect("empty").is_none());
}
