//! Integration tests for the QKart storefront client.
//!
//! [`MockBackend`] is an in-process QKart backend built on axum. It serves
//! every endpoint the client uses from in-memory state, counts the requests
//! it receives, and can be told to fail search or checkout with a 500.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p qkart-integration-tests
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path as UrlPath, Query, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::task::JoinHandle;

use qkart_core::{Address, AddressId, CartEntry, Price, Product, ProductId, cart::merge, cart_total};
use qkart_storefront::AppError;
use qkart_storefront::config::{ConfigError, StorefrontConfig};
use qkart_storefront::state::AppState;

/// Username of the user seeded by [`MockBackend::add_default_user`].
pub const USERNAME: &str = "crio.do";

/// Password of the user seeded by [`MockBackend::add_default_user`].
pub const PASSWORD: &str = "learnbydoing";

/// Wallet balance given to newly registered users.
pub const STARTING_BALANCE: i64 = 5000;

/// Message returned by the search endpoint when told to fail.
pub const SEARCH_FAILURE: &str = "Search service is unavailable";

/// Message returned by the checkout endpoint when told to fail.
pub const CHECKOUT_FAILURE: &str = "Order service is unavailable";

type ApiResult = Result<Response, Response>;

#[derive(Debug)]
struct User {
    password: String,
    balance: Price,
    cart: Vec<CartEntry>,
    addresses: Vec<Address>,
}

#[derive(Debug, Default)]
struct Data {
    products: Vec<Product>,
    users: HashMap<String, User>,
    next_address: u32,
}

#[derive(Debug, Default)]
struct BackendState {
    data: Mutex<Data>,
    requests: Mutex<Vec<String>>,
    fail_search: AtomicBool,
    fail_checkout: AtomicBool,
}

impl BackendState {
    fn data(&self) -> MutexGuard<'_, Data> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn requests(&self) -> MutexGuard<'_, Vec<String>> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A running mock QKart backend.
///
/// The server task is aborted when the backend is dropped.
#[derive(Debug)]
pub struct MockBackend {
    addr: SocketAddr,
    state: Arc<BackendState>,
    task: JoinHandle<()>,
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl MockBackend {
    /// Start a backend on an ephemeral port, seeded with [`catalog`].
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = Arc::new(BackendState::default());
        state.data().products = catalog();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let app = router(Arc::clone(&state));
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Mock backend stopped");
            }
        });

        Ok(Self { addr, state, task })
    }

    /// Base URL of the API, e.g. `http://127.0.0.1:41234/api/v1`.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("http://{}/api/v1", self.addr)
    }

    /// Client configuration pointing at this backend, with the session
    /// stored at `session_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint URL is rejected.
    pub fn config(&self, session_path: &Path) -> Result<StorefrontConfig, ConfigError> {
        let mut config = StorefrontConfig::for_endpoint(&self.endpoint())?;
        config.session_path = session_path.to_path_buf();
        Ok(config)
    }

    /// Storefront state pointing at this backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or HTTP client is rejected.
    pub fn app_state(&self, session_path: &Path) -> Result<AppState, AppError> {
        Ok(AppState::new(self.config(session_path)?)?)
    }

    /// Create [`USERNAME`] with [`STARTING_BALANCE`].
    pub fn add_default_user(&self) {
        self.add_user(USERNAME, PASSWORD, Price::from_units(STARTING_BALANCE));
    }

    /// Create a user directly, bypassing `/auth/register`.
    pub fn add_user(&self, username: &str, password: &str, balance: Price) {
        self.state.data().users.insert(
            username.to_string(),
            User {
                password: password.to_string(),
                balance,
                cart: Vec::new(),
                addresses: Vec::new(),
            },
        );
    }

    /// Replace a user's cart directly.
    pub fn set_cart(&self, username: &str, entries: Vec<CartEntry>) {
        if let Some(user) = self.state.data().users.get_mut(username) {
            user.cart = entries;
        }
    }

    /// Save an address for a user directly. Returns its id.
    pub fn add_address(&self, username: &str, text: &str) -> Option<AddressId> {
        let mut data = self.state.data();
        data.next_address += 1;
        let id = AddressId::new(format!("addr-{}", data.next_address));
        let user = data.users.get_mut(username)?;
        user.addresses.push(Address {
            id: id.clone(),
            text: text.to_string(),
        });
        Some(id)
    }

    /// A user's cart as the backend stores it.
    #[must_use]
    pub fn cart(&self, username: &str) -> Vec<CartEntry> {
        self.state
            .data()
            .users
            .get(username)
            .map(|user| user.cart.clone())
            .unwrap_or_default()
    }

    /// A user's wallet balance as the backend stores it.
    #[must_use]
    pub fn balance(&self, username: &str) -> Option<Price> {
        self.state.data().users.get(username).map(|user| user.balance)
    }

    /// Make `/products/search` answer 500.
    pub fn fail_search(&self, fail: bool) {
        self.state.fail_search.store(fail, Ordering::SeqCst);
    }

    /// Make `/cart/checkout` answer 500.
    pub fn fail_checkout(&self, fail: bool) {
        self.state.fail_checkout.store(fail, Ordering::SeqCst);
    }

    /// Requests received so far, as `"METHOD /path"`, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.state.requests().clone()
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.state.requests().len()
    }

    /// Number of requests received for `"METHOD /path"`.
    #[must_use]
    pub fn requests_to(&self, route: &str) -> usize {
        self.state.requests().iter().filter(|r| *r == route).count()
    }
}

/// The seed catalog.
#[must_use]
pub fn catalog() -> Vec<Product> {
    let product = |id: &str, name: &str, category: &str, cost: i64, rating: u8| Product {
        id: ProductId::new(id),
        name: name.to_string(),
        category: category.to_string(),
        cost: Price::from_units(cost),
        rating,
        image: format!("https://crio-directus-assets.s3.ap-south-1.amazonaws.com/{id}.png"),
    };

    vec![
        product("BW0jAAeDJmlZCF8i", "Atomic Habits", "Books", 50, 5),
        product("KCRwjF7lN97HnEaY", "iPhone XR", "Phones", 100, 4),
        product("TwMM4OAhmK0VQ93S", "Basketball", "Sports", 25, 3),
        product("upLK9JbQ4rMhTwt4", "Tan Leatherette Weekender Duffle", "Fashion", 150, 4),
        product("v4sLtEcMpzabRyfx", "YONEX Smash Badminton Racquet", "Sports", 100, 5),
    ]
}

fn router(state: Arc<BackendState>) -> Router {
    let api = Router::new()
        .route("/products", get(products))
        .route("/products/search", get(search))
        .route("/cart", get(get_cart).post(update_cart))
        .route("/cart/checkout", post(checkout))
        .route("/user/addresses", get(get_addresses).post(add_address))
        .route("/user/addresses/{id}", delete(delete_address))
        .route("/auth/login", post(login))
        .route("/auth/register", post(register));

    Router::new()
        .nest("/api/v1", api)
        .layer(middleware::from_fn_with_state(Arc::clone(&state), record))
        .with_state(state)
}

async fn record(State(state): State<Arc<BackendState>>, request: Request, next: Next) -> Response {
    state
        .requests()
        .push(format!("{} {}", request.method(), request.uri().path()));
    next.run(request).await
}

fn failure(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

/// Resolve the bearer token to a username.
fn authenticate(headers: &HeaderMap, data: &Data) -> Result<String, Response> {
    let unauthorized = || {
        failure(
            StatusCode::UNAUTHORIZED,
            "Protected route, Oauth2 Bearer token not found",
        )
    };

    let username = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .and_then(|token| token.strip_prefix("token-"))
        .ok_or_else(unauthorized)?;

    if data.users.contains_key(username) {
        Ok(username.to_string())
    } else {
        Err(unauthorized())
    }
}

fn user_mut<'a>(data: &'a mut Data, username: &str) -> Result<&'a mut User, Response> {
    data.users
        .get_mut(username)
        .ok_or_else(|| failure(StatusCode::UNAUTHORIZED, "User not found"))
}

async fn products(State(state): State<Arc<BackendState>>) -> Json<Vec<Product>> {
    Json(state.data().products.clone())
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    value: String,
}

async fn search(
    State(state): State<Arc<BackendState>>,
    Query(query): Query<SearchQuery>,
) -> ApiResult {
    if state.fail_search.load(Ordering::SeqCst) {
        return Err(failure(StatusCode::INTERNAL_SERVER_ERROR, SEARCH_FAILURE));
    }

    let needle = query.value.to_lowercase();
    let matches: Vec<Product> = state
        .data()
        .products
        .iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&needle) || p.category.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect();

    if matches.is_empty() {
        return Err(failure(StatusCode::NOT_FOUND, "No products found"));
    }
    Ok(Json(matches).into_response())
}

async fn get_cart(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> ApiResult {
    let mut data = state.data();
    let username = authenticate(&headers, &data)?;
    let user = user_mut(&mut data, &username)?;
    Ok(Json(user.cart.clone()).into_response())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartUpdate {
    product_id: ProductId,
    qty: u32,
}

async fn update_cart(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<CartUpdate>,
) -> ApiResult {
    let mut data = state.data();
    let username = authenticate(&headers, &data)?;
    if !data.products.iter().any(|p| p.id == body.product_id) {
        return Err(failure(StatusCode::NOT_FOUND, "Product doesn't exist"));
    }

    let user = user_mut(&mut data, &username)?;
    if body.qty == 0 {
        user.cart.retain(|entry| entry.product_id != body.product_id);
    } else if let Some(entry) = user
        .cart
        .iter_mut()
        .find(|entry| entry.product_id == body.product_id)
    {
        entry.quantity = body.qty;
    } else {
        user.cart.push(CartEntry::new(body.product_id, body.qty));
    }
    Ok(Json(user.cart.clone()).into_response())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutBody {
    address_id: AddressId,
}

async fn checkout(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<CheckoutBody>,
) -> ApiResult {
    if state.fail_checkout.load(Ordering::SeqCst) {
        return Err(failure(StatusCode::INTERNAL_SERVER_ERROR, CHECKOUT_FAILURE));
    }

    let mut data = state.data();
    let username = authenticate(&headers, &data)?;
    let products = data.products.clone();
    let user = user_mut(&mut data, &username)?;

    if user.cart.is_empty() {
        return Err(failure(StatusCode::BAD_REQUEST, "Cart is empty"));
    }
    if !user.addresses.iter().any(|a| a.id == body.address_id) {
        return Err(failure(StatusCode::BAD_REQUEST, "Address not set"));
    }
    let total = cart_total(&merge(&user.cart, &products));
    if user.balance < total {
        return Err(failure(
            StatusCode::BAD_REQUEST,
            "Wallet balance not sufficient to place order",
        ));
    }

    user.balance = user.balance - total;
    user.cart.clear();
    Ok(Json(json!({ "success": true })).into_response())
}

async fn get_addresses(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> ApiResult {
    let mut data = state.data();
    let username = authenticate(&headers, &data)?;
    let user = user_mut(&mut data, &username)?;
    Ok(Json(user.addresses.clone()).into_response())
}

#[derive(Deserialize)]
struct AddressBody {
    address: String,
}

async fn add_address(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<AddressBody>,
) -> ApiResult {
    let mut data = state.data();
    let username = authenticate(&headers, &data)?;
    data.next_address += 1;
    let id = AddressId::new(format!("addr-{}", data.next_address));

    let user = user_mut(&mut data, &username)?;
    user.addresses.push(Address {
        id,
        text: body.address,
    });
    Ok(Json(user.addresses.clone()).into_response())
}

async fn delete_address(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    UrlPath(id): UrlPath<AddressId>,
) -> ApiResult {
    let mut data = state.data();
    let username = authenticate(&headers, &data)?;
    let user = user_mut(&mut data, &username)?;

    let before = user.addresses.len();
    user.addresses.retain(|a| a.id != id);
    if user.addresses.len() == before {
        return Err(failure(StatusCode::NOT_FOUND, "Address to delete was not found"));
    }
    Ok(Json(user.addresses.clone()).into_response())
}

#[derive(Deserialize)]
struct Credentials {
    username: String,
    password: String,
}

async fn login(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<Credentials>,
) -> ApiResult {
    let data = state.data();
    let user = data
        .users
        .get(&body.username)
        .ok_or_else(|| failure(StatusCode::BAD_REQUEST, "Username does not exist"))?;
    if user.password != body.password {
        return Err(failure(StatusCode::BAD_REQUEST, "Password is incorrect"));
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "token": format!("token-{}", body.username),
            "username": body.username,
            "balance": user.balance,
        })),
    )
        .into_response())
}

async fn register(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<Credentials>,
) -> ApiResult {
    let mut data = state.data();
    if data.users.contains_key(&body.username) {
        return Err(failure(StatusCode::BAD_REQUEST, "Username is already taken"));
    }

    data.users.insert(
        body.username,
        User {
            password: body.password,
            balance: Price::from_units(STARTING_BALANCE),
            cart: Vec::new(),
            addresses: Vec::new(),
        },
    );
    Ok((StatusCode::CREATED, Json(json!({ "success": true }))).into_response())
}
