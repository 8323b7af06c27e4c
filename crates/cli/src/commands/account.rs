//! Account, profile and seller commands.

use rust_decimal::Decimal;
use secrecy::SecretString;

use tiendita_client::access::{self, Capability};
use tiendita_client::models::{RegisterRequest, UserPatch};
use tiendita_client::Tiendita;
use tiendita_core::{Email, Role, UserId};

use super::{CliError, products, require};

pub async fn login(
    app: &Tiendita,
    email: &Email,
    password: SecretString,
) -> Result<(), Box<dyn std::error::Error>> {
    let user = app.auth().login(email, &password).await?;
    println!("Logged in as {} ({})", user.full_name(), user.role);
    Ok(())
}

pub async fn register(
    app: &Tiendita,
    email: Email,
    password: SecretString,
    first_name: String,
    last_name: String,
    role: Role,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = RegisterRequest {
        email,
        password,
        first_name,
        last_name,
        role,
    };
    let user = app.auth().register(&request).await?;
    println!("Welcome, {}! Your {} account is ready.", user.first_name, user.role);
    Ok(())
}

pub fn logout(app: &Tiendita) {
    app.auth().logout();
    println!("Logged out.");
}

pub async fn whoami(app: &Tiendita, remote: bool) -> Result<(), Box<dyn std::error::Error>> {
    let user = if remote {
        app.auth().profile().await?
    } else {
        app.session().user().ok_or(CliError::NotLoggedIn)?
    };
    println!("{} <{}>", user.full_name(), user.email);
    println!("  id:   {}", user.id);
    println!("  role: {}", user.role);
    Ok(())
}

pub async fn update_profile(
    app: &Tiendita,
    email: Option<Email>,
    first_name: Option<String>,
    last_name: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if !app.session().is_authenticated() {
        return Err(CliError::NotLoggedIn.into());
    }
    let patch = UserPatch {
        email,
        first_name,
        last_name,
    };
    let user = app.users().update_me(&patch).await?;
    println!("Profile updated: {} <{}>", user.full_name(), user.email);
    Ok(())
}

pub async fn seller(app: &Tiendita, id: &UserId) -> Result<(), Box<dyn std::error::Error>> {
    let profile = app.users().public_profile(id).await?;
    println!("{} {}", profile.first_name, profile.last_name);
    if let Some(email) = &profile.email {
        println!("  {email}");
    }
    println!();
    products::print_table(&profile.products);
    Ok(())
}

pub async fn stats(app: &Tiendita) -> Result<(), Box<dyn std::error::Error>> {
    require(app, Capability::ViewSalesStats)?;
    let stats = app.sales().stats().await?;

    println!("Revenue:          {}", stats.total_revenue);
    println!("Cost:             {}", stats.total_cost);
    println!("Net profit:       ${:.2}", stats.net_profit.round_dp(2));
    println!("ROI:              {:.1}%", stats.roi_percentage.round_dp(1));
    println!("Completed orders: {}", stats.completed_orders);
    println!("Units sold:       {}", stats.units_sold);

    if !stats.top_products.is_empty() {
        println!();
        println!("{:<24} {:>6} {:>12}", "TOP PRODUCT", "UNITS", "REVENUE");
        for product in &stats.top_products {
            println!(
                "{:<24} {:>6} {:>12}",
                product.name,
                product.units_sold,
                product.revenue.to_string()
            );
        }
    }
    if stats.net_profit < Decimal::ZERO {
        println!();
        println!("Costs exceed revenue so far.");
    }
    Ok(())
}

pub fn nav(app: &Tiendita) {
    let role = app.session().user().map(|user| user.role);
    for entry in access::navigation(role) {
        println!("{:<14} {}", entry.label, entry.route);
    }
}
