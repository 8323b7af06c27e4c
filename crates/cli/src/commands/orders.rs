//! Order board and purchase commands.

use tiendita_client::access::Capability;
use tiendita_client::lifecycle::{self, BoardScope, BuyerView, Cart};
use tiendita_client::models::Order;
use tiendita_client::Tiendita;
use tiendita_core::{LifecycleAction, OrderId, ProductId, Role, UserId};

use super::{CliError, require};

/// Parse `<product id>:<quantity>`.
///
/// # Errors
///
/// Returns a message for a missing separator or a bad quantity.
pub fn parse_item(raw: &str) -> Result<(ProductId, u32), String> {
    let (id, quantity) = raw
        .rsplit_once(':')
        .ok_or_else(|| format!("expected <product>:<quantity>, got {raw}"))?;
    if id.is_empty() {
        return Err(format!("missing product id in {raw}"));
    }
    let quantity = quantity
        .parse::<u32>()
        .map_err(|e| format!("bad quantity in {raw}: {e}"))?;
    Ok((ProductId::new(id), quantity))
}

fn scope_capability(scope: BoardScope) -> Capability {
    match scope {
        BoardScope::Incoming | BoardScope::Sales => Capability::ViewIncomingOrders,
        BoardScope::Purchases => Capability::ViewPurchases,
    }
}

fn hint(role: Role, order: &Order) -> String {
    if role == Role::Buyer {
        return match lifecycle::buyer_view(&order.status) {
            BuyerView::Wait => "waiting on seller".to_string(),
            BuyerView::ViewReceipt => "receipt available".to_string(),
            BuyerView::ViewOnly => String::new(),
            BuyerView::Unknown => "contact the seller".to_string(),
        };
    }
    lifecycle::available_actions(role, &order.status)
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" | ")
}

fn print_orders(role: Role, orders: &[Order]) {
    if orders.is_empty() {
        println!("No orders.");
        return;
    }
    println!(
        "{:<12} {:<26} {:>5} {:>10}  {}",
        "ID", "STATUS", "UNITS", "TOTAL", "NEXT"
    );
    for order in orders {
        println!(
            "{:<12} {:<26} {:>5} {:>10}  {}",
            order.id.as_str(),
            order.status.label(),
            order.unit_count(),
            order.total_amount.to_string(),
            hint(role, order)
        );
    }
}

pub async fn show(app: &Tiendita, scope: BoardScope) -> Result<(), Box<dyn std::error::Error>> {
    let role = require(app, scope_capability(scope))?;
    let mut board = app.order_board(scope, role);
    let orders = board.refresh().await?;
    print_orders(role, orders);
    Ok(())
}

pub async fn act(
    app: &Tiendita,
    id: &OrderId,
    action: LifecycleAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let role = require(app, Capability::ViewIncomingOrders)?;
    let mut board = app.order_board(BoardScope::Sales, role);
    // Load first so locally impossible actions are refused without a request.
    board.refresh().await?;
    let order = board.apply(id, action).await?;
    println!("Order {} is now {}", order.id, order.status.label());
    Ok(())
}

pub async fn buy(
    app: &Tiendita,
    seller: &UserId,
    items: &[(ProductId, u32)],
    message: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    require(app, Capability::Purchase)?;

    let mut cart = Cart::new();
    for (product_id, quantity) in items {
        let product = app.products().get(product_id).await?;
        if product.owner_id().is_some_and(|owner| owner != seller) {
            return Err(CliError::InvalidArgument(format!(
                "{} is not sold by {seller}",
                product.name
            ))
            .into());
        }
        cart.add(&product, *quantity)?;
    }

    println!("Estimated total: {}", cart.estimated_total());
    let order = app.orders().purchase_cart(cart, message).await?;
    println!(
        "Order {} placed: {} for {} units ({})",
        order.id,
        order.total_amount,
        order.unit_count(),
        order.status.label()
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item() {
        assert_eq!(parse_item("p1:3").unwrap(), (ProductId::new("p1"), 3));
        assert!(parse_item("p1").is_err());
        assert!(parse_item(":2").is_err());
        assert!(parse_item("p1:-1").is_err());
    }
}
