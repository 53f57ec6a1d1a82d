//! Trailing-debounced search.
//!
//! Keystrokes go in through [`SearchDebouncer::input`]. A search fires once
//! the input has been quiet for the debounce window, using the last text
//! entered. Searches run concurrently and are never cancelled, so results
//! can arrive out of order; each carries a generation number and
//! [`LatestSearch`] applies a result only if it is newer than the one on
//! screen.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use qkart_core::Product;

use super::catalog::{CatalogService, SearchOutcome};
use crate::error::Result;

/// Anything that can run a product search.
pub trait ProductSearch: Clone + Send + Sync + 'static {
    /// Search for `query`.
    fn search(&self, query: &str) -> impl Future<Output = Result<SearchOutcome>> + Send;
}

impl ProductSearch for CatalogService {
    fn search(&self, query: &str) -> impl Future<Output = Result<SearchOutcome>> + Send {
        Self::search(self, query)
    }
}

/// A completed search.
#[derive(Debug)]
pub struct SearchResult {
    /// Order in which the search was fired, starting at 1.
    pub generation: u64,
    /// The text that was searched.
    pub query: String,
    /// What the search returned.
    pub outcome: Result<SearchOutcome>,
}

/// Trailing debouncer in front of a [`ProductSearch`].
#[derive(Debug)]
pub struct SearchDebouncer {
    input: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

impl SearchDebouncer {
    /// Start the debouncer.
    ///
    /// Returns the debouncer and the channel completed searches arrive on.
    #[must_use]
    pub fn spawn<S: ProductSearch>(
        searcher: S,
        window: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<SearchResult>) {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (result_tx, result_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(debounce_loop(searcher, window, input_rx, result_tx));

        (
            Self {
                input: input_tx,
                task,
            },
            result_rx,
        )
    }

    /// Record the current contents of the search box.
    pub fn input(&self, text: impl Into<String>) {
        // The loop only stops after the sender is dropped.
        let _ = self.input.send(text.into());
    }

    /// Stop accepting input. A pending search still fires after the window.
    pub async fn finish(self) {
        drop(self.input);
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Search debouncer task failed");
        }
    }
}

async fn debounce_loop<S: ProductSearch>(
    searcher: S,
    window: Duration,
    mut input: mpsc::UnboundedReceiver<String>,
    results: mpsc::UnboundedSender<SearchResult>,
) {
    let mut pending: Option<String> = None;
    let mut generation = 0_u64;

    loop {
        let Some(query) = pending.take() else {
            match input.recv().await {
                Some(text) => {
                    pending = Some(text);
                    continue;
                }
                None => break,
            }
        };

        tokio::select! {
            next = input.recv() => match next {
                Some(text) => pending = Some(text),
                None => {
                    tokio::time::sleep(window).await;
                    generation += 1;
                    fire(&searcher, &results, generation, query);
                    break;
                }
            },
            () = tokio::time::sleep(window) => {
                generation += 1;
                fire(&searcher, &results, generation, query);
            }
        }
    }
}

fn fire<S: ProductSearch>(
    searcher: &S,
    results: &mpsc::UnboundedSender<SearchResult>,
    generation: u64,
    query: String,
) {
    debug!(generation, %query, "Firing search");
    let searcher = searcher.clone();
    let results = results.clone();
    tokio::spawn(async move {
        let outcome = searcher.search(&query).await;
        let _ = results.send(SearchResult {
            generation,
            query,
            outcome,
        });
    });
}

/// The search result currently on screen.
#[derive(Debug, Default)]
pub struct LatestSearch {
    generation: u64,
    products: Vec<Product>,
}

impl LatestSearch {
    /// Apply a completed search if it is newer than the current one.
    ///
    /// Returns the error of a newer failed search so it can be reported;
    /// the products on screen are left unchanged in that case. Results
    /// older than the current one are dropped.
    ///
    /// # Errors
    ///
    /// Returns the search's error if it is newer and failed.
    pub fn apply(&mut self, result: SearchResult) -> Result<Option<String>> {
        if result.generation <= self.generation {
            debug!(
                generation = result.generation,
                current = self.generation,
                "Dropping stale search result"
            );
            return Ok(None);
        }

        self.generation = result.generation;
        let outcome = result.outcome?;
        self.products = outcome.products;
        Ok(outcome.notice)
    }

    /// Generation of the result on screen (0 before any search).
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Products on screen.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }
}
