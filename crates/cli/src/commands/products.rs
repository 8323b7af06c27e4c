//! Catalog commands.

use rust_decimal::Decimal;

use tiendita_client::Tiendita;
use tiendita_client::access::Capability;
use tiendita_client::models::{NewProduct, Product};
use tiendita_core::{Money, ProductId};

use super::{CliError, require};

/// Arguments of `products add`.
pub struct NewProductArgs {
    pub name: String,
    pub description: Option<String>,
    pub cost: Decimal,
    pub price: Decimal,
    pub stock: u32,
    pub shelf_life_days: Option<u32>,
}

pub fn print_table(products: &[Product]) {
    if products.is_empty() {
        println!("No products.");
        return;
    }
    println!("{:<12} {:<28} {:>10} {:>6}  {}", "ID", "NAME", "PRICE", "STOCK", "SHELF LIFE");
    for product in products {
        let shelf_life = product
            .shelf_life_days()
            .map_or_else(String::new, |days| format!("{days} days"));
        println!(
            "{:<12} {:<28} {:>10} {:>6}  {}",
            product.id.as_str(),
            product.name,
            product.price.to_string(),
            product.stock,
            shelf_life
        );
    }
}

pub async fn list(app: &Tiendita, all: bool) -> Result<(), Box<dyn std::error::Error>> {
    let products = if all {
        app.products().list().await?
    } else {
        app.products().in_stock().await?
    };
    print_table(&products);
    Ok(())
}

pub async fn mine(app: &Tiendita) -> Result<(), Box<dyn std::error::Error>> {
    require(app, Capability::ManageProducts)?;
    print_table(&app.products().mine().await?);
    Ok(())
}

pub async fn add(app: &Tiendita, args: NewProductArgs) -> Result<(), Box<dyn std::error::Error>> {
    require(app, Capability::ManageProducts)?;
    let product = NewProduct {
        name: args.name,
        description: args.description,
        cost: Money::new(args.cost).map_err(|e| CliError::InvalidArgument(e.to_string()))?,
        price: Money::new(args.price).map_err(|e| CliError::InvalidArgument(e.to_string()))?,
        is_perishable: args.shelf_life_days.is_some(),
        shelf_life_days: args.shelf_life_days,
        image_url: None,
        stock: args.stock,
    };
    let created = app.products().create(&product).await?;
    println!("Created {} ({})", created.name, created.id);
    Ok(())
}

pub async fn delete(app: &Tiendita, id: &ProductId) -> Result<(), Box<dyn std::error::Error>> {
    require(app, Capability::ManageProducts)?;
    app.products().delete(id).await?;
    println!("Deleted {id}");
    Ok(())
}
