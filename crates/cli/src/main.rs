//! `tienda` - TienditaCampus from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Log in (the session is kept in $TIENDITA_SESSION_DIR or ~/.tiendita)
//! tienda login -e ana@campus.edu -p ********
//!
//! # Browse the catalog and buy from one seller
//! tienda products list
//! tienda buy --seller u1 --item p1:2 --item p2:1 -m "Biblioteca, 2pm"
//!
//! # Seller: answer and fulfil orders
//! tienda orders incoming
//! tienda orders accept o1
//! tienda orders deliver o1
//! ```
//!
//! # Environment Variables
//!
//! - `TIENDITA_API_URL` - Base URL of the marketplace API (required)
//! - `TIENDITA_SESSION_DIR` - Where the session file lives
//! - `TIENDITA_LOG_FORMAT` - `pretty` or `json`
//! - `RUST_LOG` - Log filter (default `warn` for the client and CLI)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tiendita_client::session::{FileStorage, MemoryStorage};
use tiendita_client::{ClientConfig, LogFormat, SessionStorage, Tiendita};
use tiendita_core::{Email, OrderId, ProductId, Role, UserId};

mod commands;

#[derive(Parser)]
#[command(name = "tienda")]
#[command(author, version, about = "TienditaCampus marketplace client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and keep the session
    Login {
        #[arg(short, long)]
        email: Email,

        #[arg(short, long, env = "TIENDITA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create a buyer or seller account
    Register {
        #[arg(short, long)]
        email: Email,

        #[arg(short, long, env = "TIENDITA_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        /// `buyer` or `seller`
        #[arg(short, long, default_value = "buyer")]
        role: Role,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami {
        /// Ask the server instead of reading the stored session
        #[arg(long)]
        remote: bool,
    },
    /// Update your own profile
    Profile {
        #[arg(long)]
        email: Option<Email>,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,
    },
    /// Catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// A seller's public page
    Seller { id: UserId },
    /// Orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Buy from one seller
    Buy {
        #[arg(long)]
        seller: UserId,

        /// `<product id>:<quantity>`, repeatable
        #[arg(short, long = "item", required = true, value_parser = commands::orders::parse_item)]
        items: Vec<(ProductId, u32)>,

        /// Where and when to meet
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Seller sales summary
    Stats,
    /// Menu entries available to the current user
    Nav,
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List the public catalog
    List {
        /// Include products that are out of stock
        #[arg(long)]
        all: bool,
    },
    /// List your own products
    Mine,
    /// Create a product
    Add {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long)]
        cost: Decimal,

        #[arg(long)]
        price: Decimal,

        #[arg(long, default_value_t = 1)]
        stock: u32,

        /// Shelf life in days; marks the product perishable
        #[arg(long)]
        shelf_life_days: Option<u32>,
    },
    /// Delete one of your products
    Delete { id: ProductId },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// Orders awaiting your answer
    Incoming,
    /// Every order addressed to you
    Sales,
    /// Your purchases
    Purchases,
    /// Accept a requested order
    Accept { id: OrderId },
    /// Reject a requested order
    Reject { id: OrderId },
    /// Mark an accepted order delivered
    Deliver { id: OrderId },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(LogFormat::Pretty);
            tracing::error!("Configuration error: {e}");
            std::process::exit(1);
        }
    };
    init_tracing(config.log_format);

    if let Err(e) = run(cli, &config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(format: LogFormat) {
    // Quiet by default; the command's own output goes to stdout.
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tiendita_client=warn,tiendita_cli=warn".into());

    let is_json = format == LogFormat::Json;
    let json_layer = is_json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer =
        (!is_json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

fn storage(dir: Option<&PathBuf>) -> Arc<dyn SessionStorage> {
    match dir {
        Some(dir) => Arc::new(FileStorage::new(dir)),
        None => {
            tracing::warn!("no session directory; the session will not outlive this command");
            Arc::new(MemoryStorage::new())
        }
    }
}

async fn run(cli: Cli, config: &ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let app = Tiendita::new(config, storage(config.session_dir.as_ref()))?;
    app.session().hydrate().await;

    match cli.command {
        Commands::Login { email, password } => {
            commands::account::login(&app, &email, SecretString::from(password)).await?;
        }
        Commands::Register {
            email,
            password,
            first_name,
            last_name,
            role,
        } => {
            commands::account::register(
                &app,
                email,
                SecretString::from(password),
                first_name,
                last_name,
                role,
            )
            .await?;
        }
        Commands::Logout => commands::account::logout(&app),
        Commands::Whoami { remote } => commands::account::whoami(&app, remote).await?,
        Commands::Profile {
            email,
            first_name,
            last_name,
        } => commands::account::update_profile(&app, email, first_name, last_name).await?,
        Commands::Products { action } => match action {
            ProductsAction::List { all } => commands::products::list(&app, all).await?,
            ProductsAction::Mine => commands::products::mine(&app).await?,
            ProductsAction::Add {
                name,
                description,
                cost,
                price,
                stock,
                shelf_life_days,
            } => {
                commands::products::add(
                    &app,
                    commands::products::NewProductArgs {
                        name,
                        description,
                        cost,
                        price,
                        stock,
                        shelf_life_days,
                    },
                )
                .await?;
            }
            ProductsAction::Delete { id } => commands::products::delete(&app, &id).await?,
        },
        Commands::Seller { id } => commands::account::seller(&app, &id).await?,
        Commands::Orders { action } => match action {
            OrdersAction::Incoming => {
                commands::orders::show(&app, tiendita_client::BoardScope::Incoming).await?;
            }
            OrdersAction::Sales => {
                commands::orders::show(&app, tiendita_client::BoardScope::Sales).await?;
            }
            OrdersAction::Purchases => {
                commands::orders::show(&app, tiendita_client::BoardScope::Purchases).await?;
            }
            OrdersAction::Accept { id } => {
                commands::orders::act(&app, &id, tiendita_core::LifecycleAction::Accept).await?;
            }
            OrdersAction::Reject { id } => {
                commands::orders::act(&app, &id, tiendita_core::LifecycleAction::Reject).await?;
            }
            OrdersAction::Deliver { id } => {
                commands::orders::act(&app, &id, tiendita_core::LifecycleAction::Deliver).await?;
            }
        },
        Commands::Buy {
            seller,
            items,
            message,
        } => commands::orders::buy(&app, &seller, &items, message).await?,
        Commands::Stats => commands::account::stats(&app).await?,
        Commands::Nav => commands::account::nav(&app),
    }
    Ok(())
}
