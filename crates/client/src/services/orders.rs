//! Order reads, purchases and seller lifecycle actions.
//!
//! Mutations go through an [`InFlightGuard`] so a repeated click inside the
//! suppression window never reaches the server twice, and each carries an
//! `Idempotency-Key` for servers that deduplicate on their side too.

use tracing::{info, instrument};

use tiendita_core::{LifecycleAction, OrderId};

use crate::api::{ApiClient, RequestOptions};
use crate::error::ApiError;
use crate::lifecycle::Cart;
use crate::models::{Order, PurchaseRequest};

use super::guard::InFlightGuard;

/// Order operations for buyers and sellers.
#[derive(Debug, Clone)]
pub struct OrdersService {
    api: ApiClient,
    guard: InFlightGuard,
}

impl OrdersService {
    #[must_use]
    pub const fn new(api: ApiClient, guard: InFlightGuard) -> Self {
        Self { api, guard }
    }

    /// `POST /orders/purchase`.
    ///
    /// Only shape is checked here (non-empty, every quantity ≥ 1); use
    /// [`Self::purchase_cart`] to also check against known stock.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] or [`ApiError::Duplicate`] without
    /// calling the server; otherwise propagates any [`ApiError`], including
    /// a stock rejection the local snapshot could not foresee.
    #[instrument(skip(self, request), fields(seller_id = %request.seller_id, lines = request.items.len()))]
    pub async fn purchase(&self, request: &PurchaseRequest) -> Result<Order, ApiError> {
        if request.items.is_empty() {
            return Err(ApiError::Validation("a purchase needs at least one item".to_string()));
        }
        if let Some(item) = request.items.iter().find(|item| item.quantity == 0) {
            return Err(ApiError::Validation(format!(
                "quantity for {} must be at least 1",
                item.product_id
            )));
        }

        let key = purchase_key(request);
        let idempotency_key = self.guard.claim(&key).await?;
        let result: Result<Order, ApiError> = self
            .api
            .post(
                &["orders", "purchase"],
                request,
                RequestOptions::default().with_idempotency_key(idempotency_key),
            )
            .await;

        match &result {
            Ok(order) => info!(order_id = %order.id, "purchase requested"),
            Err(_) => self.guard.release(&key).await,
        }
        result
    }

    /// Validate `cart` against its stock snapshot, then purchase.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] if the cart is empty, mixes sellers,
    /// or any quantity is 0 or above the known stock. No request is sent in
    /// that case.
    pub async fn purchase_cart(
        &self,
        cart: Cart,
        delivery_message: Option<String>,
    ) -> Result<Order, ApiError> {
        let request = cart.into_request(delivery_message)?;
        self.purchase(&request).await
    }

    /// `GET /orders/my-purchases`: the buyer's orders.
    ///
    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn my_purchases(&self) -> Result<Vec<Order>, ApiError> {
        self.api
            .get(&["orders", "my-purchases"], RequestOptions::default())
            .await
    }

    /// `GET /orders/seller-sales`: every order addressed to the seller.
    ///
    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn seller_sales(&self) -> Result<Vec<Order>, ApiError> {
        self.api
            .get(&["orders", "seller-sales"], RequestOptions::default())
            .await
    }

    /// `GET /orders/incoming`: the seller's orders awaiting an answer.
    ///
    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn incoming(&self) -> Result<Vec<Order>, ApiError> {
        self.api
            .get(&["orders", "incoming"], RequestOptions::default())
            .await
    }

    /// `GET /orders/:id`.
    ///
    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn get(&self, id: &OrderId) -> Result<Order, ApiError> {
        self.api
            .get(&["orders", id.as_str()], RequestOptions::default())
            .await
    }

    /// `POST /orders/:id/accept`.
    ///
    /// # Errors
    ///
    /// See [`Self::transition`].
    pub async fn accept(&self, id: &OrderId) -> Result<Order, ApiError> {
        self.transition(id, LifecycleAction::Accept).await
    }

    /// `POST /orders/:id/reject`.
    ///
    /// # Errors
    ///
    /// See [`Self::transition`].
    pub async fn reject(&self, id: &OrderId) -> Result<Order, ApiError> {
        self.transition(id, LifecycleAction::Reject).await
    }

    /// `POST /orders/:id/deliver`.
    ///
    /// # Errors
    ///
    /// See [`Self::transition`].
    pub async fn deliver(&self, id: &OrderId) -> Result<Order, ApiError> {
        self.transition(id, LifecycleAction::Deliver).await
    }

    /// Issue `action` against order `id`.
    ///
    /// A server refusal (wrong state, not the owner) is final: it is
    /// returned as-is and never retried.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Duplicate`] if the same action on the same order
    /// was issued within the suppression window; otherwise propagates any
    /// [`ApiError`].
    #[instrument(skip(self, id, action), fields(order_id = %id, action = %action))]
    pub async fn transition(&self, id: &OrderId, action: LifecycleAction) -> Result<Order, ApiError> {
        let key = format!("{action}:{id}");
        let idempotency_key = self.guard.claim(&key).await?;
        let result: Result<Order, ApiError> = self
            .api
            .post_empty(
                &["orders", id.as_str(), action.path_segment()],
                RequestOptions::default().with_idempotency_key(idempotency_key),
            )
            .await;

        match &result {
            Ok(order) => info!(status = %order.status, "order updated"),
            Err(_) => self.guard.release(&key).await,
        }
        result
    }
}

/// Stable key for a purchase: seller plus sorted `product x quantity` lines.
fn purchase_key(request: &PurchaseRequest) -> String {
    let mut lines: Vec<String> = request
        .items
        .iter()
        .map(|item| format!("{}x{}", item.product_id, item.quantity))
        .collect();
    lines.sort();
    format!("purchase:{}:{}", request.seller_id, lines.join(","))
}
