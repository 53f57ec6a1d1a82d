//! QKart CLI - shop the QKart storefront from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Create an account and log in
//! qkart register -u crio.do --password secret1 --confirm secret1
//! qkart login -u crio.do -p secret1
//!
//! # Browse
//! qkart products
//! qkart search basketball
//! qkart search --interactive
//!
//! # Cart and checkout
//! qkart cart add <product-id>
//! qkart cart inc <product-id>
//! qkart address add "12 Main St, Springfield"
//! qkart checkout --address <address-id>
//! ```
//!
//! # Environment Variables
//!
//! See `qkart_storefront::config` for the variables read at startup.
//! `RUST_LOG` overrides the default log filter.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use qkart_core::{AddressId, ProductId};
use qkart_storefront::config::StorefrontConfig;
use qkart_storefront::notify::{Notifier, TracingNotifier};
use qkart_storefront::state::AppState;

mod commands;

#[derive(Parser)]
#[command(name = "qkart")]
#[command(author, version, about = "QKart storefront")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Register {
        /// Username (at least 6 characters)
        #[arg(short, long)]
        username: String,

        /// Password (at least 6 characters)
        #[arg(long)]
        password: String,

        /// Password again
        #[arg(long)]
        confirm: String,
    },
    /// Log in and save the session
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,
    },
    /// Log out and clear the saved session
    Logout,
    /// Show the logged-in user and wallet balance
    Whoami,
    /// List every product
    Products,
    /// Search products by name or category
    Search {
        /// Text to search for
        #[arg(required_unless_present = "interactive")]
        query: Option<String>,

        /// Read queries from stdin, one keystroke snapshot per line
        #[arg(short, long, conflicts_with = "query")]
        interactive: bool,
    },
    /// Show or change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage shipping addresses
    Address {
        #[command(subcommand)]
        action: AddressAction,
    },
    /// Place an order for the cart
    Checkout {
        /// Address to ship to
        #[arg(short, long)]
        address: Option<String>,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a product with quantity 1
    Add { product_id: String },
    /// Set a product's quantity (0 removes it)
    Set { product_id: String, quantity: u32 },
    /// Raise a product's quantity by one
    Inc { product_id: String },
    /// Lower a product's quantity by one
    Dec { product_id: String },
}

#[derive(Subcommand)]
enum AddressAction {
    /// List saved addresses
    List,
    /// Save a new address
    Add { text: String },
    /// Delete a saved address
    Delete { id: String },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

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

fn init_tracing() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "qkart_storefront=info,qkart_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().without_time().with_target(false))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!("{e}");
            std::process::exit(1);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    let notifier = TracingNotifier;
    let result = match AppState::new(config) {
        Ok(state) => run(cli, &state, &notifier).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        tracing::debug!(error = ?e, kind = ?e.kind(), "Command failed");
        notifier.report(&e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, state: &AppState, notifier: &dyn Notifier) -> qkart_storefront::Result<()> {
    match cli.command {
        Commands::Register {
            username,
            password,
            confirm,
        } => commands::account::register(state, notifier, &username, password, confirm).await,
        Commands::Login { username, password } => {
            commands::account::login(state, notifier, &username, password).await
        }
        Commands::Logout => commands::account::logout(state),
        Commands::Whoami => commands::account::whoami(state),
        Commands::Products => commands::catalog::list(state).await,
        Commands::Search {
            query: Some(query), ..
        } => commands::catalog::search(state, notifier, &query).await,
        Commands::Search { query: None, .. } => {
            commands::catalog::interactive(state, notifier).await;
            Ok(())
        }
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(state).await,
            CartAction::Add { product_id } => {
                commands::cart::add(state, &ProductId::new(product_id)).await
            }
            CartAction::Set {
                product_id,
                quantity,
            } => commands::cart::set(state, &ProductId::new(product_id), quantity).await,
            CartAction::Inc { product_id } => {
                commands::cart::increment(state, &ProductId::new(product_id)).await
            }
            CartAction::Dec { product_id } => {
                commands::cart::decrement(state, &ProductId::new(product_id)).await
            }
        },
        Commands::Address { action } => match action {
            AddressAction::List => commands::address::list(state).await,
            AddressAction::Add { text } => commands::address::add(state, &text).await,
            AddressAction::Delete { id } => {
                commands::address::delete(state, &AddressId::new(id)).await
            }
        },
        Commands::Checkout { address } => {
            commands::checkout::place_order(state, notifier, address.map(AddressId::from)).await
        }
    }
}
