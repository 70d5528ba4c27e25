//! ecomweb CLI - Terminal storefront.
//!
//! # Usage
//!
//! ```bash
//! # Browse
//! ecomweb products --category kitchen
//! ecomweb search kettle
//!
//! # Sign in (the session is kept in ECOMWEB_SESSION_FILE)
//! ecomweb login -u asha -p secret
//!
//! # Cart and checkout
//! ecomweb cart add 42 --quantity 2
//! ecomweb cart update 1 3
//! ecomweb cart show
//! ecomweb checkout --address "12 MG Road, Bengaluru" --payment "Cash on Delivery"
//!
//! # Admin
//! ecomweb admin stats
//! ```
//!
//! # Environment Variables
//!
//! See `ecomweb_storefront::config` for the full list. `RUST_LOG` overrides
//! the default log filter; logs go to stderr.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use ecomweb_core::{CartItemId, OrderId, OrderStatus, ProductId};
use ecomweb_storefront::Storefront;
use ecomweb_storefront::config::StorefrontConfig;
use ecomweb_storefront::services::{OrderForm, Registration};
use ecomweb_storefront::session::FileSessionStore;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod render;

use commands::CliError;

#[derive(Parser)]
#[command(name = "ecomweb")]
#[command(author, version, about = "ecomweb terminal storefront")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the home page products (default)
    Home,
    /// List products
    Products {
        /// Only show this category (`all` shows everything)
        #[arg(short, long)]
        category: Option<String>,
    },
    /// List the product categories
    Categories,
    /// Search products by keyword
    Search { keyword: String },
    /// Sign in
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        #[arg(short = 'n', long)]
        full_name: String,

        #[arg(short, long, default_value = "")]
        address: String,

        #[arg(long, default_value = "")]
        phone: String,
    },
    /// Sign out
    Logout,
    /// Show the signed-in user and their cart
    Whoami,
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order for the cart
    Checkout {
        #[arg(short, long)]
        address: String,

        #[arg(short, long, default_value = "")]
        payment: String,
    },
    /// Admin dashboard
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Refresh and show the cart
    Show,
    /// Add a product
    Add {
        product_id: ProductId,

        #[arg(short, long, default_value_t = 1)]
        quantity: i32,
    },
    /// Set the quantity of a cart line (0 or less removes it)
    Update {
        cart_item_id: CartItemId,

        #[arg(allow_negative_numbers = true)]
        quantity: i32,
    },
    /// Remove a cart line
    Remove { cart_item_id: CartItemId },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Dashboard counters and products
    Stats,
    /// List every order
    Orders,
    /// Change the status of an order
    OrderStatus {
        order_id: OrderId,

        /// pending, confirmed, shipped, delivered or cancelled
        status: OrderStatus,
    },
    /// Add a product
    AddProduct {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        price: String,

        #[arg(short, long)]
        stock: String,

        #[arg(short, long, default_value = "")]
        description: String,

        #[arg(short, long, default_value = "")]
        category: String,

        #[arg(short, long, default_value = "")]
        brand: String,

        /// Image file (image/*, at most 5 MB)
        #[arg(short, long)]
        image: Option<PathBuf>,
    },
    /// Delete a product
    DeleteProduct { product_id: ProductId },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Needed before the subscriber so Sentry can be wired into it
    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt().with_writer(std::io::stderr).init();
            tracing::error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ecomweb_storefront=info,ecomweb_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    match run(cli, config).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<ExitCode, CliError> {
    let sessions = Arc::new(FileSessionStore::new(config.session_file.clone()));
    let storefront = Storefront::new(config, sessions)?;

    let command = cli.command.unwrap_or(Commands::Home);

    // Home restores the session itself; everything else starts from it here
    if !matches!(command, Commands::Home) {
        let resumed = storefront.resume().await;
        if let Some(notice) = &resumed.notice {
            render::notice(notice);
        }
    }

    let code = match command {
        Commands::Home => commands::shop::home(&storefront).await,
        Commands::Products { category } => {
            commands::shop::products(&storefront, category.as_deref()).await
        }
        Commands::Categories => commands::shop::categories(&storefront).await,
        Commands::Search { keyword } => commands::shop::search(&storefront, &keyword).await,
        Commands::Login { username, password } => {
            commands::account::login(&storefront, &username, password).await
        }
        Commands::Register {
            username,
            email,
            password,
            full_name,
            address,
            phone,
        } => {
            let registration = Registration {
                username,
                email,
                password: password.into(),
                full_name,
                address,
                phone_number: phone,
            };
            commands::account::register(&storefront, &registration).await
        }
        Commands::Logout => commands::account::logout(&storefront).await,
        Commands::Whoami => commands::account::whoami(&storefront).await,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::shop::show_cart(&storefront).await,
            CartAction::Add {
                product_id,
                quantity,
            } => commands::shop::add(&storefront, product_id, quantity).await,
            CartAction::Update {
                cart_item_id,
                quantity,
            } => commands::shop::update(&storefront, cart_item_id, quantity).await,
            CartAction::Remove { cart_item_id } => {
                commands::shop::remove(&storefront, cart_item_id).await
            }
        },
        Commands::Checkout { address, payment } => {
            let form = OrderForm {
                shipping_address: address,
                payment_method: payment,
            };
            commands::shop::checkout(&storefront, &form).await
        }
        Commands::Admin { action } => match action {
            AdminAction::Stats => commands::admin::stats(&storefront).await,
            AdminAction::Orders => commands::admin::orders(&storefront).await,
            AdminAction::OrderStatus { order_id, status } => {
                commands::admin::order_status(&storefront, order_id, status).await
            }
            AdminAction::AddProduct {
                name,
                price,
                stock,
                description,
                category,
                brand,
                image,
            } => {
                let product = commands::admin::NewProduct {
                    name,
                    description,
                    price,
                    stock,
                    category,
                    brand,
                    image,
                };
                commands::admin::add_product(&storefront, product).await?
            }
            AdminAction::DeleteProduct { product_id } => {
                commands::admin::delete_product(&storefront, product_id).await
            }
        },
    };

    Ok(code)
}
