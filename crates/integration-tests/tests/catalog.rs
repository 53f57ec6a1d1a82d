//! Integration tests for product listing, search, and debounced search.

use std::time::Duration;

use qkart_integration_tests::{MockBackend, SEARCH_FAILURE, catalog};
use qkart_storefront::services::LatestSearch;

const PRODUCTS: &str = "GET /api/v1/products";
const SEARCH: &str = "GET /api/v1/products/search";

#[tokio::test]
async fn test_products_are_cached() {
    let backend = MockBackend::start().await.expect("start backend");
    let dir = tempfile::tempdir().expect("tempdir");
    let state = backend
        .app_state(&dir.path().join("session.json"))
        .expect("app state");

    let first = state.catalog().products().await.expect("products");
    let second = state.catalog().products().await.expect("products");

    assert_eq!(*first, catalog());
    assert_eq!(first, second);
    assert_eq!(backend.requests_to(PRODUCTS), 1);

    state.catalog().invalidate().await;
    state.catalog().products().await.expect("products");
    assert_eq!(backend.requests_to(PRODUCTS), 2);
}

#[tokio::test]
async fn test_search_matches_name_or_category() {
    let backend = MockBackend::start().await.expect("start backend");
    let dir = tempfile::tempdir().expect("tempdir");
    let state = backend
        .app_state(&dir.path().join("session.json"))
        .expect("app state");

    let outcome = state.catalog().search("sports").await.expect("search");
    let names: Vec<&str> = outcome.products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Basketball", "YONEX Smash Badminton Racquet"]);
    assert!(outcome.notice.is_none());

    let outcome = state.catalog().search("iphone").await.expect("search");
    assert_eq!(outcome.products.len(), 1);
}

#[tokio::test]
async fn test_search_query_is_url_encoded() {
    let backend = MockBackend::start().await.expect("start backend");
    let dir = tempfile::tempdir().expect("tempdir");
    let state = backend
        .app_state(&dir.path().join("session.json"))
        .expect("app state");

    let outcome = state
        .catalog()
        .search("Weekender Duffle")
        .await
        .expect("search");
    assert_eq!(outcome.products.len(), 1);

    let outcome = state.catalog().search("a&value=b").await.expect("search");
    assert!(outcome.products.is_empty());
}

#[tokio::test]
async fn test_search_not_found_is_empty_result() {
    let backend = MockBackend::start().await.expect("start backend");
    let dir = tempfile::tempdir().expect("tempdir");
    let state = backend
        .app_state(&dir.path().join("session.json"))
        .expect("app state");

    let outcome = state.catalog().search("spaceship").await.expect("search");
    assert!(outcome.products.is_empty());
    assert!(outcome.notice.is_none());
}

#[tokio::test]
async fn test_search_server_error_falls_back_to_catalog() {
    let backend = MockBackend::start().await.expect("start backend");
    backend.fail_search(true);
    let dir = tempfile::tempdir().expect("tempdir");
    let state = backend
        .app_state(&dir.path().join("session.json"))
        .expect("app state");

    let outcome = state.catalog().search("sports").await.expect("search");
    assert_eq!(outcome.products, catalog());
    assert_eq!(outcome.notice.as_deref(), Some(SEARCH_FAILURE));
}

#[tokio::test]
async fn test_blank_search_lists_everything_without_searching() {
    let backend = MockBackend::start().await.expect("start backend");
    let dir = tempfile::tempdir().expect("tempdir");
    let state = backend
        .app_state(&dir.path().join("session.json"))
        .expect("app state");

    let outcome = state.catalog().search("   ").await.expect("search");
    assert_eq!(outcome.products, catalog());
    assert_eq!(backend.requests_to(SEARCH), 0);
}

#[tokio::test]
async fn test_debounced_typing_sends_one_search() {
    let backend = MockBackend::start().await.expect("start backend");
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = backend
        .config(&dir.path().join("session.json"))
        .expect("config");
    config.search_debounce = Duration::from_millis(50);
    let state = qkart_storefront::state::AppState::new(config).expect("app state");

    let (debouncer, mut results) = state.search_debouncer();
    for text in ["b", "ba", "bas", "bask", "basketball"] {
        debouncer.input(text);
    }
    debouncer.finish().await;

    let mut latest = LatestSearch::default();
    while let Some(result) = results.recv().await {
        assert_eq!(result.query, "basketball");
        latest.apply(result).expect("search succeeded");
    }

    assert_eq!(backend.requests_to(SEARCH), 1);
    assert_eq!(latest.generation(), 1);
    let names: Vec<&str> = latest.products().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Basketball"]);
}
