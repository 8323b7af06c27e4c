//! Order lifecycle as seen from the client.
//!
//! The server owns every transition. This module only decides what to
//! offer: which actions a role may issue from a status, how a buyer sees an
//! order, which orders belong in which list, and whether a purchase is
//! worth sending at all.

use std::collections::BTreeMap;

use tracing::{instrument, warn};

use tiendita_core::{
    LifecycleAction, Money, OrderId, OrderStatus, ProductId, Role, StatusCategory, StatusFilter,
    UserId,
};

use crate::access::{self, Capability};
use crate::error::ApiError;
use crate::models::{Order, Product, PurchaseItem, PurchaseRequest};
use crate::services::OrdersService;

const fn required_capability(action: LifecycleAction) -> Capability {
    match action {
        LifecycleAction::Accept => Capability::AcceptOrder,
        LifecycleAction::Reject => Capability::RejectOrder,
        LifecycleAction::Deliver => Capability::DeliverOrder,
    }
}

/// Actions `role` may issue against an order in `status`.
///
/// Empty for buyers, for admins, and for terminal or unknown statuses.
#[must_use]
pub fn available_actions(role: Role, status: &OrderStatus) -> Vec<LifecycleAction> {
    status
        .valid_actions()
        .into_iter()
        .filter(|action| access::allows(role, required_capability(*action)))
        .collect()
}

/// What a buyer is offered for one of their orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuyerView {
    /// Waiting on the seller to answer or deliver.
    Wait,
    /// Delivered; a receipt can be shown.
    ViewReceipt,
    /// Rejected; shown read-only.
    ViewOnly,
    /// Status not recognized; shown as an explicit fallback.
    Unknown,
}

/// The buyer-facing treatment of `status`.
#[must_use]
pub const fn buyer_view(status: &OrderStatus) -> BuyerView {
    match status.category() {
        StatusCategory::Open | StatusCategory::InProgress => BuyerView::Wait,
        StatusCategory::Completed => BuyerView::ViewReceipt,
        StatusCategory::Rejected => BuyerView::ViewOnly,
        StatusCategory::Unknown => BuyerView::Unknown,
    }
}

// =============================================================================
// List views
// =============================================================================

/// Orders matching `filter`, in their original order.
#[must_use]
pub fn filter_orders(orders: &[Order], filter: StatusFilter) -> Vec<&Order> {
    orders
        .iter()
        .filter(|order| filter.matches(&order.status))
        .collect()
}

/// Seller's incoming list: exactly `requested`.
#[must_use]
pub fn incoming_orders(orders: &[Order]) -> Vec<&Order> {
    filter_orders(orders, StatusFilter::Incoming)
}

/// Buyer's active list: `requested` or legacy `pending`.
#[must_use]
pub fn active_purchases(orders: &[Order]) -> Vec<&Order> {
    filter_orders(orders, StatusFilter::Active)
}

#[must_use]
pub fn completed_orders(orders: &[Order]) -> Vec<&Order> {
    filter_orders(orders, StatusFilter::Completed)
}

#[must_use]
pub fn rejected_orders(orders: &[Order]) -> Vec<&Order> {
    filter_orders(orders, StatusFilter::Rejected)
}

/// Orders bucketed by rendering category. Every order lands in exactly one
/// bucket; empty buckets are omitted.
#[must_use]
pub fn group_by_category(orders: &[Order]) -> BTreeMap<StatusCategory, Vec<&Order>> {
    let mut groups: BTreeMap<StatusCategory, Vec<&Order>> = BTreeMap::new();
    for order in orders {
        groups.entry(order.status.category()).or_default().push(order);
    }
    groups
}

// =============================================================================
// Purchases
// =============================================================================

/// A purchase the client refuses to send.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PurchaseError {
    #[error("quantity must be at least 1")]
    ZeroQuantity,

    #[error("only {available} left in stock, {requested} requested")]
    ExceedsStock { requested: u32, available: u32 },

    #[error("the cart is empty")]
    EmptyCart,

    #[error("a purchase can only include products from one seller")]
    MixedSellers,

    #[error("product {0} has no seller")]
    MissingSeller(ProductId),
}

impl From<PurchaseError> for ApiError {
    fn from(err: PurchaseError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Check `requested` against the last known `stock`.
///
/// The snapshot may be stale; the server has the final word.
///
/// # Errors
///
/// Returns [`PurchaseError`] if `requested` is 0 or above `stock`.
pub const fn validate_purchase_quantity(requested: u32, stock: u32) -> Result<(), PurchaseError> {
    if requested == 0 {
        return Err(PurchaseError::ZeroQuantity);
    }
    if requested > stock {
        return Err(PurchaseError::ExceedsStock {
            requested,
            available: stock,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CartLine {
    product_id: ProductId,
    quantity: u32,
    stock: u32,
    price: Money,
}

/// Line items for a single seller, validated before anything is sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    seller_id: Option<UserId>,
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` of `product`, merging with an existing line.
    ///
    /// # Errors
    ///
    /// Returns [`PurchaseError`] if the product has no seller, belongs to a
    /// different seller than the rest of the cart, or the combined quantity
    /// is 0 or above the product's stock. The cart is unchanged on error.
    pub fn add(&mut self, product: &Product, quantity: u32) -> Result<(), PurchaseError> {
        let seller_id = product
            .owner_id()
            .ok_or_else(|| PurchaseError::MissingSeller(product.id.clone()))?;
        if self.seller_id.as_ref().is_some_and(|s| s != seller_id) {
            return Err(PurchaseError::MixedSellers);
        }

        if quantity == 0 {
            return Err(PurchaseError::ZeroQuantity);
        }

        let existing = self
            .lines
            .iter_mut()
            .find(|line| line.product_id == product.id);
        let already = existing.as_ref().map_or(0, |line| line.quantity);
        let total = already.saturating_add(quantity);
        validate_purchase_quantity(total, product.stock)?;

        match existing {
            Some(line) => {
                line.quantity = total;
                line.stock = product.stock;
                line.price = product.price;
            }
            None => self.lines.push(CartLine {
                product_id: product.id.clone(),
                quantity,
                stock: product.stock,
                price: product.price,
            }),
        }
        self.seller_id = Some(seller_id.clone());
        Ok(())
    }

    /// Remove a product's line. Returns whether it was present.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| &line.product_id != product_id);
        if self.lines.is_empty() {
            self.seller_id = None;
        }
        self.lines.len() != before
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub const fn seller_id(&self) -> Option<&UserId> {
        self.seller_id.as_ref()
    }

    /// Total at the prices last seen. The server computes the real total.
    #[must_use]
    pub fn estimated_total(&self) -> Money {
        self.lines
            .iter()
            .map(|line| line.price.times(line.quantity))
            .sum()
    }

    /// Validate every line and build the request body.
    ///
    /// # Errors
    ///
    /// Returns [`PurchaseError::EmptyCart`] or the first invalid line.
    pub fn into_request(
        self,
        delivery_message: Option<String>,
    ) -> Result<PurchaseRequest, PurchaseError> {
        let seller_id = self.seller_id.ok_or(PurchaseError::EmptyCart)?;
        for line in &self.lines {
            validate_purchase_quantity(line.quantity, line.stock)?;
        }
        Ok(PurchaseRequest {
            seller_id,
            items: self
                .lines
                .into_iter()
                .map(|line| PurchaseItem {
                    product_id: line.product_id,
                    quantity: line.quantity,
                })
                .collect(),
            delivery_message: delivery_message.filter(|m| !m.trim().is_empty()),
        })
    }
}

// =============================================================================
// Order board
// =============================================================================

/// Which list an [`OrderBoard`] shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardScope {
    /// Seller: orders awaiting an answer.
    Incoming,
    /// Seller: every order addressed to them.
    Sales,
    /// Buyer: their own orders.
    Purchases,
}

/// A fetched list of orders plus the actions on it.
///
/// After every successful mutation the list is re-fetched; the server's
/// answer replaces whatever was shown.
#[derive(Debug)]
pub struct OrderBoard {
    service: OrdersService,
    scope: BoardScope,
    role: Role,
    orders: Vec<Order>,
    loading: bool,
}

impl OrderBoard {
    #[must_use]
    pub const fn new(service: OrdersService, scope: BoardScope, role: Role) -> Self {
        Self {
            service,
            scope,
            role,
            orders: Vec::new(),
            loading: false,
        }
    }

    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub const fn scope(&self) -> BoardScope {
        self.scope
    }

    /// Actions offered for `id`, from its locally known status.
    #[must_use]
    pub fn actions_for(&self, id: &OrderId) -> Vec<LifecycleAction> {
        self.find(id)
            .map(|order| available_actions(self.role, &order.status))
            .unwrap_or_default()
    }

    /// Re-fetch the list for this board's scope.
    ///
    /// # Errors
    ///
    /// Propagates any [`ApiError`]; the previous list is kept.
    #[instrument(skip(self), fields(scope = ?self.scope))]
    pub async fn refresh(&mut self) -> Result<&[Order], ApiError> {
        self.loading = true;
        let result = match self.scope {
            BoardScope::Incoming => self.service.incoming().await,
            BoardScope::Sales => self.service.seller_sales().await,
            BoardScope::Purchases => self.service.my_purchases().await,
        };
        self.loading = false;
        self.orders = result?;
        Ok(&self.orders)
    }

    /// # Errors
    ///
    /// See [`Self::apply`].
    pub async fn accept(&mut self, id: &OrderId) -> Result<Order, ApiError> {
        self.apply(id, LifecycleAction::Accept).await
    }

    /// # Errors
    ///
    /// See [`Self::apply`].
    pub async fn reject(&mut self, id: &OrderId) -> Result<Order, ApiError> {
        self.apply(id, LifecycleAction::Reject).await
    }

    /// # Errors
    ///
    /// See [`Self::apply`].
    pub async fn deliver(&mut self, id: &OrderId) -> Result<Order, ApiError> {
        self.apply(id, LifecycleAction::Deliver).await
    }

    /// Issue `action` on `id`, then reload the list.
    ///
    /// An order not in the local list is sent as-is and left to the server.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] without calling the server when the
    /// locally known status or the role rules out `action`; otherwise
    /// propagates the service's [`ApiError`] unchanged.
    pub async fn apply(&mut self, id: &OrderId, action: LifecycleAction) -> Result<Order, ApiError> {
        if !access::allows(self.role, required_capability(action)) {
            return Err(ApiError::Validation(format!(
                "a {} cannot {action} orders",
                self.role
            )));
        }
        if let Some(order) = self.find(id) {
            order
                .status
                .apply(action)
                .map_err(|e| ApiError::Validation(e.to_string()))?;
        }

        self.loading = true;
        let result = self.service.transition(id, action).await;
        self.loading = false;
        let updated = result?;

        if let Err(e) = self.refresh().await {
            warn!(error = %e, order_id = %id, "reload after update failed; patching locally");
            if let Some(slot) = self.orders.iter_mut().find(|o| o.id == updated.id) {
                *slot = updated.clone();
            }
        }
        Ok(updated)
    }

    fn find(&self, id: &OrderId) -> Option<&Order> {
        self.orders.iter().find(|order| &order.id == id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::SellerSummary;

    fn order(id: &str, status: &str) -> Order {
        Order {
            id: OrderId::new(id),
            buyer_id: UserId::new("b1"),
            seller_id: UserId::new("s1"),
            buyer: None,
            seller: None,
            items: Vec::new(),
            total_amount: Money::from_cents(1500),
            status: OrderStatus::parse(status),
            delivery_message: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn product(id: &str, seller: &str, stock: u32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Producto {id}"),
            description: None,
            cost: Money::from_cents(500),
            price: Money::from_cents(1250),
            is_perishable: false,
            shelf_life_days: None,
            image_url: None,
            seller: Some(SellerSummary {
                id: UserId::new(seller),
                first_name: "Ana".to_string(),
                last_name: "Lopez".to_string(),
            }),
            seller_id: None,
            stock,
        }
    }

    fn ids(orders: &[&Order]) -> Vec<String> {
        orders.iter().map(|o| o.id.to_string()).collect()
    }

    #[test]
    fn test_seller_actions_follow_status() {
        assert_eq!(
            available_actions(Role::Seller, &OrderStatus::Requested),
            vec![LifecycleAction::Accept, LifecycleAction::Reject]
        );
        assert_eq!(
            available_actions(Role::Seller, &OrderStatus::Pending),
            vec![LifecycleAction::Accept, LifecycleAction::Reject]
        );
        assert_eq!(
            available_actions(Role::Seller, &OrderStatus::Accepted),
            vec![LifecycleAction::Deliver]
        );
    }

    #[test]
    fn test_no_actions_for_terminal_or_unknown() {
        for status in ["delivered", "completed", "rejected", "on_hold"] {
            assert!(available_actions(Role::Seller, &OrderStatus::parse(status)).is_empty());
        }
    }

    #[test]
    fn test_buyers_and_admins_get_no_actions() {
        for status in ["requested", "pending", "accepted"] {
            let status = OrderStatus::parse(status);
            assert!(available_actions(Role::Buyer, &status).is_empty());
            assert!(available_actions(Role::Admin, &status).is_empty());
        }
    }

    #[test]
    fn test_buyer_view() {
        assert_eq!(buyer_view(&OrderStatus::Pending), BuyerView::Wait);
        assert_eq!(buyer_view(&OrderStatus::Accepted), BuyerView::Wait);
        assert_eq!(buyer_view(&OrderStatus::Delivered), BuyerView::ViewReceipt);
        assert_eq!(buyer_view(&OrderStatus::Completed), BuyerView::ViewReceipt);
        assert_eq!(buyer_view(&OrderStatus::Rejected), BuyerView::ViewOnly);
        assert_eq!(buyer_view(&OrderStatus::parse("refunded")), BuyerView::Unknown);
    }

    #[test]
    fn test_filters_on_mixed_list() {
        let orders = vec![
            order("o1", "requested"),
            order("o2", "accepted"),
            order("o3", "delivered"),
        ];

        assert_eq!(ids(&incoming_orders(&orders)), ["o1"]);
        assert_eq!(ids(&active_purchases(&orders)), ["o1"]);
        assert_eq!(ids(&completed_orders(&orders)), ["o3"]);
        assert!(rejected_orders(&orders).is_empty());
        // Input untouched.
        assert_eq!(orders.len(), 3);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let orders = vec![
            order("o1", "pending"),
            order("o2", "requested"),
            order("o3", "completed"),
            order("o4", "rejected"),
        ];
        for filter in [
            StatusFilter::Incoming,
            StatusFilter::Active,
            StatusFilter::Completed,
            StatusFilter::Rejected,
        ] {
            let once: Vec<Order> = filter_orders(&orders, filter).into_iter().cloned().collect();
            let twice = filter_orders(&once, filter);
            assert_eq!(ids(&twice), ids(&once.iter().collect::<Vec<_>>()));
        }
    }

    #[test]
    fn test_group_by_category_is_a_partition() {
        let orders = vec![
            order("o1", "requested"),
            order("o2", "pending"),
            order("o3", "accepted"),
            order("o4", "completed"),
            order("o5", "mystery"),
        ];
        let groups = group_by_category(&orders);

        assert_eq!(ids(&groups[&StatusCategory::Open]), ["o1", "o2"]);
        assert_eq!(ids(&groups[&StatusCategory::InProgress]), ["o3"]);
        assert_eq!(ids(&groups[&StatusCategory::Completed]), ["o4"]);
        assert_eq!(ids(&groups[&StatusCategory::Unknown]), ["o5"]);
        assert!(!groups.contains_key(&StatusCategory::Rejected));
        assert_eq!(groups.values().map(Vec::len).sum::<usize>(), orders.len());
    }

    #[test]
    fn test_validate_purchase_quantity_bounds() {
        assert_eq!(validate_purchase_quantity(0, 5), Err(PurchaseError::ZeroQuantity));
        assert_eq!(
            validate_purchase_quantity(6, 5),
            Err(PurchaseError::ExceedsStock {
                requested: 6,
                available: 5
            })
        );
        assert!(validate_purchase_quantity(1, 5).is_ok());
        assert!(validate_purchase_quantity(5, 5).is_ok());
    }

    #[test]
    fn test_cart_builds_single_seller_request() {
        let mut cart = Cart::new();
        cart.add(&product("p1", "s1", 5), 2).unwrap();
        cart.add(&product("p2", "s1", 1), 1).unwrap();
        cart.add(&product("p1", "s1", 5), 1).unwrap();

        assert_eq!(cart.estimated_total(), Money::from_cents(5000));

        let request = cart.into_request(Some("Cafeteria".to_string())).unwrap();
        assert_eq!(request.seller_id, UserId::new("s1"));
        assert_eq!(request.items.len(), 2);
        assert_eq!(request.items[0].quantity, 3);
        assert_eq!(request.delivery_message.as_deref(), Some("Cafeteria"));
    }

    #[test]
    fn test_cart_rejects_mixed_sellers() {
        let mut cart = Cart::new();
        cart.add(&product("p1", "s1", 5), 1).unwrap();
        assert_eq!(
            cart.add(&product("p9", "s2", 5), 1),
            Err(PurchaseError::MixedSellers)
        );
    }

    #[test]
    fn test_cart_rejects_over_stock_across_adds() {
        let mut cart = Cart::new();
        cart.add(&product("p1", "s1", 3), 2).unwrap();
        assert_eq!(
            cart.add(&product("p1", "s1", 3), 2),
            Err(PurchaseError::ExceedsStock {
                requested: 4,
                available: 3
            })
        );
        // Unchanged after the failed add.
        assert_eq!(cart.estimated_total(), Money::from_cents(2500));
    }

    #[test]
    fn test_cart_remove_and_empty() {
        let mut cart = Cart::new();
        cart.add(&product("p1", "s1", 3), 1).unwrap();
        assert!(cart.remove(&ProductId::new("p1")));
        assert!(!cart.remove(&ProductId::new("p1")));
        assert!(cart.seller_id().is_none());
        assert_eq!(cart.into_request(None), Err(PurchaseError::EmptyCart));
    }

    #[test]
    fn test_purchase_error_is_validation() {
        let err: ApiError = PurchaseError::ZeroQuantity.into();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
