//! Product listing and search commands.

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use qkart_storefront::Result;
use qkart_storefront::notify::{Notification, Notifier, Severity};
use qkart_storefront::services::{LatestSearch, SearchResult};
use qkart_storefront::state::AppState;

use super::log_product;

/// List the whole catalog.
///
/// # Errors
///
/// Returns an error if the catalog cannot be fetched.
pub async fn list(state: &AppState) -> Result<()> {
    let products = state.catalog().products().await?;
    for product in products.iter() {
        log_product(product);
    }
    info!("{} products", products.len());
    Ok(())
}

/// Run a single search.
///
/// # Errors
///
/// Returns an error if the search fails and no fallback is available.
pub async fn search(state: &AppState, notifier: &dyn Notifier, query: &str) -> Result<()> {
    let outcome = state.catalog().search(query).await?;
    if let Some(notice) = outcome.notice {
        notifier.notify(Notification::new(Severity::Error, notice));
    }
    if outcome.products.is_empty() {
        info!("No products found");
    }
    for product in &outcome.products {
        log_product(product);
    }
    Ok(())
}

/// Read queries from stdin and search as the input settles.
///
/// Each line is treated as the current contents of the search box.
/// Failed searches are reported and do not end the session.
pub async fn interactive(state: &AppState, notifier: &dyn Notifier) {
    let (debouncer, mut results) = state.search_debouncer();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut latest = LatestSearch::default();

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(text)) => debouncer.input(text),
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read stdin");
                    break;
                }
            },
            Some(result) = results.recv() => show(&mut latest, notifier, result),
        }
    }

    debouncer.finish().await;
    while let Some(result) = results.recv().await {
        show(&mut latest, notifier, result);
    }
}

fn show(latest: &mut LatestSearch, notifier: &dyn Notifier, result: SearchResult) {
    let generation = result.generation;
    let query = result.query.clone();

    match latest.apply(result) {
        Ok(notice) if latest.generation() == generation => {
            info!("Results for {query:?}:");
            if let Some(notice) = notice {
                notifier.notify(Notification::new(Severity::Error, notice));
            }
            if latest.products().is_empty() {
                info!("No products found");
            }
            for product in latest.products() {
                log_product(product);
            }
        }
        Ok(_) => {}
        Err(e) => notifier.report(&e),
    }
}
