//! Integration tests for the TienditaCampus client.
//!
//! [`MockApi`] is an in-process stand-in for the marketplace API, built on
//! `axum` and bound to an ephemeral port. It keeps just enough state to
//! exercise the client end to end (users, products, orders) and records
//! every request it receives so tests can assert on headers and hit counts.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tiendita-integration-tests
//! ```
//!
//! # Seed data
//!
//! | id   | who / what                  | notes                        |
//! |------|-----------------------------|------------------------------|
//! | `u1` | Ana Lopez, seller           | `ana@campus.edu`             |
//! | `u2` | Beto Ruiz, buyer            | `beto@campus.edu`            |
//! | `p1` | Brownie, by `u1`            | stock 5, price 15.00         |
//! | `p2` | Galletas, by `u1`           | stock 0                      |
//! | `o1` | `u2` -> `u1`                | `requested`                  |
//! | `o2` | `u2` -> `u1`                | `accepted`                   |
//! | `o3` | `u2` -> `u1`                | `delivered`                  |
//!
//! Every seeded account logs in with [`PASSWORD`].

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Path, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use tiendita_client::{ClientConfig, SessionStorage, Tiendita};
use tiendita_core::{LifecycleAction, OrderStatus};

/// Password accepted for every seeded account.
pub const PASSWORD: &str = "secret";

/// One request as the mock API saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub idempotency_key: Option<String>,
}

#[derive(Default)]
struct Db {
    users: BTreeMap<String, Value>,
    products: BTreeMap<String, Value>,
    orders: BTreeMap<String, Value>,
}

struct MockState {
    db: Mutex<Db>,
    requests: Mutex<Vec<RecordedRequest>>,
    action_delay_ms: AtomicU64,
    next_id: AtomicU64,
}

impl MockState {
    fn db(&self) -> MutexGuard<'_, Db> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

type Shared = Arc<MockState>;

/// A running mock API.
pub struct MockApi {
    base_url: String,
    state: Shared,
}

impl MockApi {
    /// Seed the data above and serve it on `127.0.0.1:<ephemeral>`.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot bind.
    pub async fn start() -> Self {
        let state: Shared = Arc::new(MockState {
            db: Mutex::new(seed()),
            requests: Mutex::new(Vec::new()),
            action_delay_ms: AtomicU64::new(0),
            next_id: AtomicU64::new(100),
        });

        let api = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/register", post(register))
            .route("/auth/profile", get(profile))
            .route("/products", get(list_products).post(create_product))
            .route("/products/my-products", get(my_products))
            .route(
                "/products/{id}",
                get(get_product).patch(update_product).delete(delete_product),
            )
            .route("/orders/purchase", post(purchase))
            .route("/orders/incoming", get(incoming))
            .route("/orders/seller-sales", get(seller_sales))
            .route("/orders/my-purchases", get(my_purchases))
            .route("/orders/{id}", get(get_order))
            .route("/orders/{id}/{action}", post(order_action))
            .route("/users/public/{id}", get(public_user))
            .route("/users/me", axum::routing::patch(update_me))
            .route("/sales/stats", get(sales_stats));
        let app = Router::new()
            .nest("/api", api)
            .layer(middleware::from_fn_with_state(state.clone(), record))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock API");
        let addr = listener.local_addr().expect("Mock API has no address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}/api/"),
            state,
        }
    }

    /// Base URL clients should use. Routes live under `/api/`.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Client configuration pointing at this mock.
    ///
    /// # Panics
    ///
    /// Never in practice; the base URL is always valid.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(self.base_url.parse().expect("Mock base URL is valid"))
    }

    /// A fully wired client using `storage`.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn client(&self, storage: Arc<dyn SessionStorage>) -> Tiendita {
        Tiendita::new(&self.config(), storage).expect("Failed to build client")
    }

    /// Every request received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests received for `method path` (path without `/api`).
    #[must_use]
    pub fn hits(&self, method: &str, path: &str) -> usize {
        let full = format!("/api/{}", path.trim_start_matches('/'));
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == full)
            .count()
    }

    /// Hold every accept/reject/deliver for `delay` before answering.
    pub fn set_action_delay(&self, delay: Duration) {
        let ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.state.action_delay_ms.store(ms, Ordering::SeqCst);
    }

    /// Overwrite an order's status server-side.
    pub fn set_order_status(&self, id: &str, status: &str) {
        if let Some(order) = self.state.db().orders.get_mut(id) {
            order["status"] = json!(status);
        }
    }

    /// Current server-side status of an order.
    #[must_use]
    pub fn order_status(&self, id: &str) -> Option<String> {
        self.state
            .db()
            .orders
            .get(id)
            .and_then(|o| o["status"].as_str().map(str::to_owned))
    }
}

// =============================================================================
// Seed
// =============================================================================

fn seed() -> Db {
    let mut db = Db::default();
    db.users.insert(
        "u1".to_owned(),
        json!({"id": "u1", "email": "ana@campus.edu", "firstName": "Ana", "lastName": "Lopez", "role": "seller"}),
    );
    db.users.insert(
        "u2".to_owned(),
        json!({"id": "u2", "email": "beto@campus.edu", "firstName": "Beto", "lastName": "Ruiz", "role": "buyer"}),
    );
    db.products.insert(
        "p1".to_owned(),
        json!({
            "id": "p1", "name": "Brownie", "cost": "8.00", "price": "15.00",
            "isPerishable": true, "shelfLifeDays": 3,
            "seller": {"id": "u1", "firstName": "Ana", "lastName": "Lopez"},
            "sellerId": "u1", "stock": 5
        }),
    );
    db.products.insert(
        "p2".to_owned(),
        json!({
            "id": "p2", "name": "Galletas", "cost": 4, "price": 10,
            "isPerishable": false, "sellerId": "u1", "stock": 0
        }),
    );
    for (id, status) in [("o1", "requested"), ("o2", "accepted"), ("o3", "delivered")] {
        db.orders.insert(
            id.to_owned(),
            json!({
                "id": id, "buyerId": "u2", "sellerId": "u1",
                "items": [{"productId": "p1", "quantity": 1, "unitPrice": "15.00", "subtotal": "15.00"}],
                "totalAmount": "15.00", "status": status,
                "createdAt": "2026-03-01T10:00:00Z", "updatedAt": "2026-03-01T10:00:00Z"
            }),
        );
    }
    db
}

// =============================================================================
// Plumbing
// =============================================================================

async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let recorded = {
        let header_value = |name: &str| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        RecordedRequest {
            method: request.method().to_string(),
            path: request.uri().path().to_owned(),
            authorization: header_value(header::AUTHORIZATION.as_str()),
            idempotency_key: header_value("idempotency-key"),
        }
    };
    state
        .requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(recorded);
    next.run(request).await
}

fn error(status: StatusCode, message: Value) -> Response {
    (status, Json(json!({ "statusCode": status.as_u16(), "message": message }))).into_response()
}

/// The user id behind a `Bearer tok-<id>` header.
fn caller(state: &MockState, headers: &HeaderMap) -> Result<Value, Response> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer tok-"))
        .and_then(|id| state.db().users.get(id).cloned())
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, json!("Unauthorized")))
}

fn id_of(user: &Value) -> String {
    user["id"].as_str().unwrap_or_default().to_owned()
}

fn orders_where(state: &MockState, pred: impl Fn(&Value) -> bool) -> Vec<Value> {
    state.db().orders.values().filter(|o| pred(o)).cloned().collect()
}

// =============================================================================
// Handlers
// =============================================================================

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let user = state
        .db()
        .users
        .values()
        .find(|u| u["email"] == email)
        .cloned();
    match user {
        Some(user) if body["password"] == PASSWORD => {
            let token = format!("tok-{}", id_of(&user));
            Json(json!({ "accessToken": token, "user": user })).into_response()
        }
        _ => error(StatusCode::UNAUTHORIZED, json!("Invalid credentials")),
    }
}

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default().to_owned();
    if state.db().users.values().any(|u| u["email"] == email.as_str()) {
        return error(StatusCode::CONFLICT, json!("Email already registered"));
    }
    let id = state.next_id("u");
    let user = json!({
        "id": id, "email": email,
        "firstName": body["firstName"], "lastName": body["lastName"], "role": body["role"]
    });
    state.db().users.insert(id.clone(), user.clone());
    (
        StatusCode::CREATED,
        Json(json!({ "access_token": format!("tok-{id}"), "user": user })),
    )
        .into_response()
}

async fn profile(State(state): State<Shared>, headers: HeaderMap) -> Response {
    match caller(&state, &headers) {
        Ok(user) => Json(user).into_response(),
        Err(response) => response,
    }
}

async fn list_products(State(state): State<Shared>) -> Json<Vec<Value>> {
    Json(state.db().products.values().cloned().collect())
}

async fn my_products(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let user = match caller(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let id = id_of(&user);
    let mine: Vec<Value> = state
        .db()
        .products
        .values()
        .filter(|p| p["sellerId"] == id.as_str())
        .cloned()
        .collect();
    Json(mine).into_response()
}

async fn get_product(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    state.db().products.get(&id).cloned().map_or_else(
        || error(StatusCode::NOT_FOUND, json!("Product not found")),
        |p| Json(p).into_response(),
    )
}

async fn create_product(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    let user = match caller(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    if user["role"] != "seller" {
        return error(StatusCode::FORBIDDEN, json!("Only sellers can create products"));
    }
    let id = state.next_id("p");
    body["id"] = json!(id);
    body["sellerId"] = user["id"].clone();
    state.db().products.insert(id, body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn update_product(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = caller(&state, &headers) {
        return response;
    }
    let mut db = state.db();
    let Some(product) = db.products.get_mut(&id) else {
        return error(StatusCode::NOT_FOUND, json!("Product not found"));
    };
    if let (Some(target), Some(patch)) = (product.as_object_mut(), body.as_object()) {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }
    Json(product.clone()).into_response()
}

async fn delete_product(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = caller(&state, &headers) {
        return response;
    }
    if state.db().products.remove(&id).is_some() {
        StatusCode::NO_CONTENT.into_response()
    } else {
        error(StatusCode::NOT_FOUND, json!("Product not found"))
    }
}

async fn purchase(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let user = match caller(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let empty = Vec::new();
    let lines = body["items"].as_array().unwrap_or(&empty);

    let mut db = state.db();
    let mut items = Vec::new();
    for line in lines {
        let product_id = line["productId"].as_str().unwrap_or_default();
        let quantity = line["quantity"].as_u64().unwrap_or_default();
        let Some(product) = db.products.get(product_id) else {
            return error(StatusCode::NOT_FOUND, json!("Product not found"));
        };
        if quantity > product["stock"].as_u64().unwrap_or_default() {
            return error(
                StatusCode::BAD_REQUEST,
                json!([format!("Insufficient stock for {}", product["name"].as_str().unwrap_or_default())]),
            );
        }
        items.push(json!({
            "productId": product_id, "quantity": quantity,
            "unitPrice": product["price"], "subtotal": product["price"]
        }));
    }
    drop(db);

    let id = state.next_id("o");
    let order = json!({
        "id": id, "buyerId": user["id"], "sellerId": body["sellerId"],
        "items": items, "totalAmount": "15.00", "status": "requested",
        "deliveryMessage": body["deliveryMessage"],
        "createdAt": "2026-03-02T09:00:00Z", "updatedAt": "2026-03-02T09:00:00Z"
    });
    state.db().orders.insert(id, order.clone());
    (StatusCode::CREATED, Json(order)).into_response()
}

async fn incoming(State(state): State<Shared>, headers: HeaderMap) -> Response {
    match caller(&state, &headers) {
        Ok(user) => {
            let id = id_of(&user);
            Json(orders_where(&state, |o| {
                o["sellerId"] == id.as_str() && o["status"] == "requested"
            }))
            .into_response()
        }
        Err(response) => response,
    }
}

async fn seller_sales(State(state): State<Shared>, headers: HeaderMap) -> Response {
    match caller(&state, &headers) {
        Ok(user) => {
            let id = id_of(&user);
            Json(orders_where(&state, |o| o["sellerId"] == id.as_str())).into_response()
        }
        Err(response) => response,
    }
}

async fn my_purchases(State(state): State<Shared>, headers: HeaderMap) -> Response {
    match caller(&state, &headers) {
        Ok(user) => {
            let id = id_of(&user);
            Json(orders_where(&state, |o| o["buyerId"] == id.as_str())).into_response()
        }
        Err(response) => response,
    }
}

async fn get_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = caller(&state, &headers) {
        return response;
    }
    if id == "boom" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response();
    }
    state.db().orders.get(&id).cloned().map_or_else(
        || error(StatusCode::NOT_FOUND, json!("Order not found")),
        |o| Json(o).into_response(),
    )
}

async fn order_action(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((id, action)): Path<(String, String)>,
) -> Response {
    let user = match caller(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let action = match action.as_str() {
        "accept" => LifecycleAction::Accept,
        "reject" => LifecycleAction::Reject,
        "deliver" => LifecycleAction::Deliver,
        _ => return error(StatusCode::NOT_FOUND, json!("Cannot POST")),
    };

    let delay = state.action_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    let mut db = state.db();
    let Some(order) = db.orders.get_mut(&id) else {
        return error(StatusCode::NOT_FOUND, json!("Order not found"));
    };
    if order["sellerId"] != user["id"] {
        return error(StatusCode::FORBIDDEN, json!("Not your order"));
    }
    let current = OrderStatus::parse(order["status"].as_str().unwrap_or_default());
    match current.apply(action) {
        Ok(next) => {
            order["status"] = json!(next.as_str());
            order["updatedAt"] = json!("2026-03-02T12:00:00Z");
            Json(order.clone()).into_response()
        }
        Err(e) => error(StatusCode::CONFLICT, json!(e.to_string())),
    }
}

async fn public_user(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let db = state.db();
    let Some(user) = db.users.get(&id) else {
        return error(StatusCode::NOT_FOUND, json!("User not found"));
    };
    let products: Vec<Value> = db
        .products
        .values()
        .filter(|p| p["sellerId"] == id.as_str())
        .cloned()
        .collect();
    Json(json!({
        "id": user["id"], "firstName": user["firstName"], "lastName": user["lastName"],
        "products": products
    }))
    .into_response()
}

/// Echoes `role: admin` back to check that the client never adopts it.
async fn update_me(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let user = match caller(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let id = id_of(&user);
    let mut db = state.db();
    let Some(stored) = db.users.get_mut(&id) else {
        return error(StatusCode::NOT_FOUND, json!("User not found"));
    };
    for key in ["email", "firstName", "lastName"] {
        if let Some(value) = body.get(key) {
            stored[key] = value.clone();
        }
    }
    let mut echoed = stored.clone();
    echoed["role"] = json!("admin");
    Json(echoed).into_response()
}

async fn sales_stats(State(state): State<Shared>, headers: HeaderMap) -> Response {
    match caller(&state, &headers) {
        Ok(user) if user["role"] == "seller" => Json(json!({
            "totalRevenue": "30.00", "totalCost": "16.00", "netProfit": "14.00",
            "roiPercentage": 87.5, "completedOrders": 1, "unitsSold": 2,
            "topProducts": [{"productId": "p1", "name": "Brownie", "unitsSold": 2, "revenue": "30.00"}]
        }))
        .into_response(),
        Ok(_) => error(StatusCode::FORBIDDEN, json!("Forbidden resource")),
        Err(response) => response,
    }
}
