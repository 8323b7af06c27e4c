//! Seller analytics.

use rust_decimal::Decimal;
use serde::Deserialize;

use tiendita_core::{Money, ProductId};

/// Per-product sales breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSales {
    pub product_id: ProductId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub units_sold: u32,
    #[serde(default)]
    pub revenue: Money,
}

/// Sales and return-on-investment summary for the logged-in seller.
///
/// Fields missing from the response default to zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SalesStats {
    pub total_revenue: Money,
    pub total_cost: Money,
    /// Revenue minus cost; may be negative, so not a [`Money`].
    pub net_profit: Decimal,
    pub roi_percentage: Decimal,
    pub completed_orders: u32,
    pub units_sold: u32,
    pub top_products: Vec<ProductSales>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default() {
        let stats: SalesStats =
            serde_json::from_str(r#"{"totalRevenue": 120, "netProfit": "-5.5"}"#).unwrap();
        assert_eq!(stats.total_revenue, Money::from_cents(12000));
        assert_eq!(stats.net_profit, Decimal::new(-55, 1));
        assert_eq!(stats.completed_orders, 0);
        assert!(stats.top_products.is_empty());
    }
}
