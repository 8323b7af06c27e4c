//! Catalog types.

use serde::{Deserialize, Serialize};

use tiendita_core::{Money, ProductId, UserId};

/// Denormalized seller reference embedded in a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerSummary {
    pub id: UserId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// A product offered by a seller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Unit cost to the seller.
    pub cost: Money,
    /// Sale price to buyers.
    pub price: Money,
    #[serde(default)]
    pub is_perishable: bool,
    #[serde(default)]
    pub shelf_life_days: Option<u32>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub seller: Option<SellerSummary>,
    #[serde(default)]
    pub seller_id: Option<UserId>,
    /// Remaining quantity, as of the last fetch.
    #[serde(default)]
    pub stock: u32,
}

impl Product {
    /// Whether any units remain.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Shelf life, only meaningful for perishable products.
    #[must_use]
    pub const fn shelf_life_days(&self) -> Option<u32> {
        if self.is_perishable {
            self.shelf_life_days
        } else {
            None
        }
    }

    /// Owning seller, from either the flat or the embedded reference.
    #[must_use]
    pub fn owner_id(&self) -> Option<&UserId> {
        self.seller_id
            .as_ref()
            .or_else(|| self.seller.as_ref().map(|s| &s.id))
    }
}

/// Body for creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub cost: Money,
    pub price: Money,
    pub is_perishable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shelf_life_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub stock: u32,
}

impl NewProduct {
    /// Check the body before sending it.
    ///
    /// Prices are non-negative by construction of [`Money`].
    ///
    /// # Errors
    ///
    /// Returns a message when the name is blank or the shelf life does not
    /// agree with the perishability flag.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name cannot be empty".to_string());
        }
        validate_shelf_life(Some(self.is_perishable), self.shelf_life_days)
    }
}

/// Body for a partial product update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_perishable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shelf_life_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
}

impl ProductUpdate {
    /// Check the body before sending it.
    ///
    /// # Errors
    ///
    /// Returns a message when a given name is blank or the shelf life
    /// contradicts an explicit non-perishable flag.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err("name cannot be empty".to_string());
        }
        validate_shelf_life(self.is_perishable, self.shelf_life_days)
    }
}

fn validate_shelf_life(is_perishable: Option<bool>, days: Option<u32>) -> Result<(), String> {
    match (is_perishable, days) {
        (Some(false), Some(_)) => {
            Err("shelf life only applies to perishable products".to_string())
        }
        (_, Some(0)) => Err("shelf life must be at least 1 day".to_string()),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn new_product() -> NewProduct {
        NewProduct {
            name: "Brownie".to_string(),
            description: None,
            cost: Money::from_cents(800),
            price: Money::from_cents(1500),
            is_perishable: true,
            shelf_life_days: Some(3),
            image_url: None,
            stock: 12,
        }
    }

    #[test]
    fn test_product_from_server_payload() {
        let json = r#"{
            "id": "p1",
            "name": "Brownie",
            "cost": "8.00",
            "price": 15,
            "isPerishable": false,
            "shelfLifeDays": 4,
            "seller": {"id": "u1", "firstName": "Ana", "lastName": "Lopez"},
            "stock": 0
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert!(!product.in_stock());
        assert_eq!(product.shelf_life_days(), None);
        assert_eq!(product.owner_id(), Some(&UserId::new("u1")));
        assert_eq!(product.price, Money::from_cents(1500));
    }

    #[test]
    fn test_new_product_validation() {
        assert!(new_product().validate().is_ok());

        let mut blank = new_product();
        blank.name = "  ".to_string();
        assert!(blank.validate().is_err());

        let mut not_perishable = new_product();
        not_perishable.is_perishable = false;
        assert!(not_perishable.validate().is_err());

        let mut zero_days = new_product();
        zero_days.shelf_life_days = Some(0);
        assert!(zero_days.validate().is_err());
    }

    #[test]
    fn test_update_serializes_only_given_fields() {
        let update = ProductUpdate {
            price: Some(Money::from_cents(2000)),
            ..ProductUpdate::default()
        };
        assert!(update.validate().is_ok());
        assert_eq!(serde_json::to_string(&update).unwrap(), r#"{"price":20.0}"#);
    }
}
