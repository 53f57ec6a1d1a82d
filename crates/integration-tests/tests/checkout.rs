//! Integration tests for order placement.
//!
//! Every refusal is checked against the backend's request log: a checkout
//! that fails a local check must never reach `POST /cart/checkout`.

use secrecy::SecretString;

use qkart_core::{AddressId, CartEntry, CheckoutFailure, CheckoutState, Price};
use qkart_integration_tests::{CHECKOUT_FAILURE, MockBackend, PASSWORD, USERNAME};
use qkart_storefront::error::BACKEND_UNREACHABLE;
use qkart_storefront::services::{AddressBook, CartService};
use qkart_storefront::session::SessionContext;
use qkart_storefront::state::AppState;
use qkart_storefront::ErrorKind;

const IPHONE: &str = "KCRwjF7lN97HnEaY";
const PLACE_ORDER: &str = "POST /api/v1/cart/checkout";

struct Shopper {
    state: AppState,
    session: SessionContext,
    cart: CartService,
    addresses: AddressBook,
}

/// Log in a user with `balance` and two iPhones (200) in the cart, then
/// load the cart and address book the way the checkout page does.
async fn shopper(backend: &MockBackend, dir: &tempfile::TempDir, balance: i64) -> Shopper {
    backend.add_user(USERNAME, PASSWORD, Price::from_units(balance));
    backend.set_cart(USERNAME, vec![CartEntry::new(IPHONE, 2)]);

    let state = backend
        .app_state(&dir.path().join("session.json"))
        .expect("app state");
    let mut session = state.session().expect("session");
    state
        .auth()
        .login(&mut session, USERNAME, SecretString::from(PASSWORD.to_string()))
        .await
        .expect("login");

    let mut cart = state.cart();
    cart.fetch(&session).await.expect("fetch cart");
    let addresses = state.addresses();

    Shopper {
        state,
        session,
        cart,
        addresses,
    }
}

async fn with_address(backend: &MockBackend, shopper: &mut Shopper) -> AddressId {
    let id = backend
        .add_address(USERNAME, "12 Main St, Springfield, 560001")
        .expect("user exists");
    shopper
        .addresses
        .refresh(&shopper.session)
        .await
        .expect("refresh");
    id
}

#[tokio::test]
async fn test_insufficient_balance_is_refused_before_address_checks() {
    let backend = MockBackend::start().await.expect("start backend");
    let dir = tempfile::tempdir().expect("tempdir");
    let mut shopper = shopper(&backend, &dir, 150).await;

    let mut checkout = shopper.state.checkout();
    let err = checkout
        .place_order(&mut shopper.session, shopper.cart.items(), &shopper.addresses)
        .await
        .expect_err("balance too low");

    assert_eq!(err.kind(), ErrorKind::BusinessRule);
    assert_eq!(
        err.user_message(),
        "You do not have enough balance in your wallet for this purchase"
    );
    assert!(matches!(
        checkout.state(),
        CheckoutState::Failed(CheckoutFailure::Rejected(_))
    ));
    assert_eq!(backend.requests_to(PLACE_ORDER), 0);
}

#[tokio::test]
async fn test_no_addresses_is_refused_even_with_balance() {
    let backend = MockBackend::start().await.expect("start backend");
    let dir = tempfile::tempdir().expect("tempdir");
    let mut shopper = shopper(&backend, &dir, 5000).await;
    shopper
        .addresses
        .refresh(&shopper.session)
        .await
        .expect("refresh");

    let mut checkout = shopper.state.checkout();
    let err = checkout
        .place_order(&mut shopper.session, shopper.cart.items(), &shopper.addresses)
        .await
        .expect_err("no addresses");

    assert_eq!(err.user_message(), "Please add a new address before proceeding");
    assert_eq!(backend.requests_to(PLACE_ORDER), 0);
}

#[tokio::test]
async fn test_unselected_address_is_refused() {
    let backend = MockBackend::start().await.expect("start backend");
    let dir = tempfile::tempdir().expect("tempdir");
    let mut shopper = shopper(&backend, &dir, 5000).await;
    with_address(&backend, &mut shopper).await;

    let mut checkout = shopper.state.checkout();
    let err = checkout
        .place_order(&mut shopper.session, shopper.cart.items(), &shopper.addresses)
        .await
        .expect_err("nothing selected");

    assert_eq!(err.user_message(), "Please select one shipping address to proceed");
    assert_eq!(backend.requests_to(PLACE_ORDER), 0);
}

#[tokio::test]
async fn test_successful_order_debits_and_persists_balance() {
    let backend = MockBackend::start().await.expect("start backend");
    let dir = tempfile::tempdir().expect("tempdir");
    let mut shopper = shopper(&backend, &dir, 5000).await;
    let address = with_address(&backend, &mut shopper).await;
    shopper.addresses.select(&address).expect("select");

    let mut checkout = shopper.state.checkout();
    let remaining = checkout
        .place_order(&mut shopper.session, shopper.cart.items(), &shopper.addresses)
        .await
        .expect("order placed");

    assert_eq!(remaining, Price::from_units(4800));
    assert!(matches!(
        checkout.state(),
        CheckoutState::Succeeded { remaining_balance, .. } if *remaining_balance == remaining
    ));
    assert_eq!(backend.requests_to(PLACE_ORDER), 1);
    assert_eq!(backend.balance(USERNAME), Some(Price::from_units(4800)));
    assert!(backend.cart(USERNAME).is_empty());

    // The debited balance survives a restart
    let restored = shopper.state.session().expect("reload session");
    assert_eq!(
        restored.session().map(|s| s.balance),
        Some(Price::from_units(4800))
    );
}

#[tokio::test]
async fn test_backend_failure_keeps_balance() {
    let backend = MockBackend::start().await.expect("start backend");
    backend.fail_checkout(true);
    let dir = tempfile::tempdir().expect("tempdir");
    let mut shopper = shopper(&backend, &dir, 5000).await;
    let address = with_address(&backend, &mut shopper).await;
    shopper.addresses.select(&address).expect("select");

    let mut checkout = shopper.state.checkout();
    let err = checkout
        .place_order(&mut shopper.session, shopper.cart.items(), &shopper.addresses)
        .await
        .expect_err("backend fails");

    assert_eq!(err.kind(), ErrorKind::HttpServer);
    assert_eq!(err.user_message(), BACKEND_UNREACHABLE);
    assert_eq!(
        checkout.state(),
        &CheckoutState::Failed(CheckoutFailure::Backend {
            message: BACKEND_UNREACHABLE.to_string()
        })
    );
    assert_eq!(
        shopper.session.session().map(|s| s.balance),
        Some(Price::from_units(5000))
    );
    assert!(!err.user_message().contains(CHECKOUT_FAILURE));

    // The same service can retry once the backend recovers
    backend.fail_checkout(false);
    let remaining = checkout
        .place_order(&mut shopper.session, shopper.cart.items(), &shopper.addresses)
        .await
        .expect("retry succeeds");
    assert_eq!(remaining, Price::from_units(4800));
}

#[tokio::test]
async fn test_interrupted_order_does_not_block_the_next_attempt() {
    let backend = MockBackend::start().await.expect("start backend");
    backend.fail_checkout(true);
    let dir = tempfile::tempdir().expect("tempdir");
    let mut shopper = shopper(&backend, &dir, 5000).await;
    let address = with_address(&backend, &mut shopper).await;
    shopper.addresses.select(&address).expect("select");

    let mut checkout = shopper.state.checkout();

    // The backend cannot answer before the first poll returns, so the order
    // future is dropped while its request is in flight.
    tokio::select! {
        biased;
        _ = checkout.place_order(&mut shopper.session, shopper.cart.items(), &shopper.addresses) => {
            panic!("order completed without the backend running");
        }
        () = std::future::ready(()) => {}
    }
    assert_eq!(checkout.state().name(), "submitting");

    let err = checkout
        .place_order(&mut shopper.session, shopper.cart.items(), &shopper.addresses)
        .await
        .expect_err("backend still failing");
    assert_eq!(err.kind(), ErrorKind::HttpServer);
    assert!(matches!(
        checkout.state(),
        CheckoutState::Failed(CheckoutFailure::Backend { .. })
    ));
    assert_eq!(
        shopper.session.session().map(|s| s.balance),
        Some(Price::from_units(5000))
    );
}

#[tokio::test]
async fn test_checkout_requires_login() {
    let backend = MockBackend::start().await.expect("start backend");
    let dir = tempfile::tempdir().expect("tempdir");
    let state = backend
        .app_state(&dir.path().join("session.json"))
        .expect("app state");
    let mut session = state.session().expect("session");

    let err = state
        .checkout()
        .place_order(&mut session, &[], &state.addresses())
        .await
        .expect_err("logged out");

    assert_eq!(err.user_message(), "You must be logged in to access checkout page.");
    assert_eq!(backend.request_count(), 0);
}
