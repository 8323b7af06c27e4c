//! Order types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tiendita_core::{Money, OrderId, OrderStatus, ProductId, UserId};

/// Denormalized buyer or seller reference embedded in an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartySummary {
    pub id: UserId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Denormalized product reference embedded in an order item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub product: Option<ProductSummary>,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// A buyer-to-seller transaction.
///
/// `total_amount` is whatever the server computed at creation; the client
/// never recomputes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    #[serde(default)]
    pub buyer: Option<PartySummary>,
    #[serde(default)]
    pub seller: Option<PartySummary>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub total_amount: Money,
    pub status: OrderStatus,
    #[serde(default)]
    pub delivery_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Total units across all lines.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// One line of a purchase request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body of `POST /orders/purchase`: one seller's worth of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub seller_id: UserId,
    pub items: Vec<PurchaseItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_message: Option<String>,
}
