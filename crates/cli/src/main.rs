//! Pokebin CLI - Database migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations (schema + session table)
//! pokebin-cli migrate
//!
//! # Load the starter catalog (idempotent)
//! pokebin-cli seed
//! pokebin-cli seed --file path/to/catalog.yaml
//!
//! # Mark an order shipped, with tracking details
//! pokebin-cli order ship 42 --tracking-number 1Z999 --courier UPS
//!
//! # Mark an order not shipped
//! pokebin-cli order unship 42
//!
//! # Print an order with its items
//! pokebin-cli order show 42
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Insert categories and products from YAML
//! - `order` - Staff shipment updates and order inspection

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pokebin-cli")]
#[command(author, version, about = "Pokebin CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the catalog with categories and products
    Seed {
        /// YAML catalog file (defaults to the bundled starter catalog)
        #[arg(short, long)]
        file: Option<String>,
    },
    /// Manage orders
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Mark an order shipped
    Ship {
        /// Order number
        id: i64,

        /// Carrier tracking number
        #[arg(short, long)]
        tracking_number: Option<String>,

        /// Carrier name
        #[arg(short, long)]
        courier: Option<String>,
    },
    /// Mark an order not shipped
    Unship {
        /// Order number
        id: i64,
    },
    /// Print an order with its items
    Show {
        /// Order number
        id: i64,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Seed { file } => commands::seed::catalog(file.as_deref()).await?,
        Commands::Order { action } => match action {
            OrderAction::Ship {
                id,
                tracking_number,
                courier,
            } => commands::order::ship(id, tracking_number, courier).await?,
            OrderAction::Unship { id } => commands::order::unship(id).await?,
            OrderAction::Show { id } => commands::order::show(id).await?,
        },
    }
    Ok(())
}
