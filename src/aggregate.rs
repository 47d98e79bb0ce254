//! Aggregation run: fold fetched instances into one frequency tree.
//!
//! The aggregator owns the only mutable reference to the tree for the
//! duration of a run and pulls pages strictly sequentially; the next page is
//! not requested until every instance of the current one has been walked.

use crate::client::FetchError;
use crate::tree::FrequencyTree;
use crate::walk::{RecordWalker, WalkOptions};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// Source of record instances, delivered page by page.
///
/// Implemented by the FHIR client's search cursor; tests use in-memory
/// sources. A source may fetch ahead internally, but delivery to the
/// aggregator is one page at a time.
#[async_trait::async_trait]
pub trait RecordSource {
    /// Next page of instances, or `None` when exhausted.
    async fn next_page(&mut self) -> Result<Option<Vec<Value>>, FetchError>;
}

/// Aggregation errors.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// A page fetch failed mid-run. The run is aborted and the partial tree
    /// discarded; `processed` reports how many instances were already folded
    /// so the user sees where the run died.
    #[error("fetch failed after {processed} instance(s): {source}")]
    Fetch {
        #[source]
        source: FetchError,
        processed: u64,
    },
}

/// Result of a completed aggregation run.
#[derive(Debug)]
pub struct Aggregation {
    pub tree: FrequencyTree,
    /// Instances successfully folded into the tree. May be less than the
    /// requested limit when the source runs dry first.
    pub processed: u64,
    /// Malformed instances skipped with a warning.
    pub skipped: u64,
}

/// Fetch up to `limit` instances from `source` and fold each through the
/// walker into a fresh tree. `on_progress` is called with the running
/// processed count after every instance.
pub async fn aggregate<S: RecordSource + ?Sized>(
    source: &mut S,
    limit: Option<u64>,
    opts: WalkOptions,
    mut on_progress: impl FnMut(u64),
) -> Result<Aggregation, AggregateError> {
    let mut tree = FrequencyTree::new();
    let walker = RecordWalker::new(opts);
    let mut processed: u64 = 0;
    let mut skipped: u64 = 0;

    'pages: loop {
        let page = source
            .next_page()
            .await
            .map_err(|source| AggregateError::Fetch { source, processed })?;

        let page = match page {
            Some(page) => page,
            None => break,
        };

        for instance in &page {
            if limit.is_some_and(|n| processed >= n) {
                break 'pages;
            }
            match walker.walk(instance, &mut tree) {
                Ok(()) => {
                    processed += 1;
                    on_progress(processed);
                }
                Err(e) => {
                    skipped += 1;
                    warn!("skipping malformed instance: {e}");
                }
            }
        }

        if limit.is_some_and(|n| processed >= n) {
            break;
        }
    }

    Ok(Aggregation {
        tree,
        processed,
        skipped,
    })
}
