//! Purpose: Merge several row streams into rounds of pages, one page per live source.
//! Exports: `Interleave`, `interleave`.
//! Role: Fair round-robin combinator over `RowStream`s of the same row shape.
//! Invariants: All live sources are pulled concurrently within a round; rounds never overlap.
//! Invariants: Pages in a round keep source declaration order, whatever the completion order.
//! Invariants: Exhausted sources are dropped for good; the first source error aborts the merge.
use super::ApiResult;
use super::stream::RowStream;
use crate::core::error::{Error, ErrorKind};
use crate::core::page::Page;
use futures_util::Stream;
use futures_util::future::try_join_all;
use futures_util::stream;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

pub struct Interleave<T> {
    sources: Vec<Option<RowStream<T>>>,
    failed: bool,
}

pub fn interleave<T, I>(streams: I) -> Interleave<T>
where
    T: DeserializeOwned,
    I: IntoIterator<Item = RowStream<T>>,
{
    Interleave {
        sources: streams.into_iter().map(Some).collect(),
        failed: false,
    }
}

impl<T> Interleave<T>
where
    T: DeserializeOwned,
{
    pub fn active(&self) -> usize {
        self.sources.iter().filter(|slot| slot.is_some()).count()
    }

    /// Pulls every live source once and returns the pages in source order.
    ///
    /// Returns `Ok(None)` when no source is left, including the round in which
    /// the last live sources all report end of data.
    pub async fn next_round(&mut self) -> ApiResult<Option<Vec<Page<T>>>> {
        if self.failed {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("interleaved stream already failed"));
        }
        let active = self.active();
        if active == 0 {
            return Ok(None);
        }
        debug!(active, "starting interleave round");

        let pulls = self
            .sources
            .iter_mut()
            .enumerate()
            .filter_map(|(slot, source)| source.as_mut().map(|rows| (slot, rows)))
            .map(|(slot, rows)| async move {
                rows.next_page().await.map(|page| (slot, page)).map_err(|err| (slot, err))
            });
        // Resolves with the first failure, dropping the other in-flight pulls.
        let joined = try_join_all(pulls).await;
        let outcomes = match joined {
            Ok(outcomes) => outcomes,
            Err((slot, err)) => {
                warn!(slot, error = %err, "source failed; aborting interleave");
                self.failed = true;
                self.sources.clear();
                return Err(err);
            }
        };

        let mut round = Vec::with_capacity(outcomes.len());
        for (slot, page) in outcomes {
            match page {
                Some(page) => round.push(page),
                None => {
                    debug!(slot, "source exhausted");
                    self.sources[slot] = None;
                }
            }
        }

        if round.is_empty() {
            return Ok(None);
        }
        Ok(Some(round))
    }

    pub fn into_stream(self) -> impl Stream<Item = ApiResult<Vec<Page<T>>>> {
        stream::unfold(Some(self), |state| async move {
            let mut merged = state?;
            match merged.next_round().await {
                Ok(Some(round)) => Some((Ok(round), Some(merged))),
                Ok(None) => None,
                Err(err) => Some((Err(err), None)),
            }
        })
    }
}
