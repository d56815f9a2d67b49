//! Tradepost CLI - migrations, manual syncs and `NetSuite` diagnostics.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! tp-cli migrate
//!
//! # Import the first 25 products from NetSuite
//! tp-cli sync products --limit 25
//!
//! # Push all published products to Algolia
//! tp-cli sync search --page-size 100
//!
//! # Check NetSuite credentials
//! tp-cli netsuite test
//!
//! # Run an ad-hoc SuiteQL statement
//! tp-cli netsuite query "SELECT id FROM item WHERE ROWNUM <= 5"
//! ```
//!
//! Configuration comes from the same environment variables (and `.env` file)
//! as the admin server.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tp-cli")]
#[command(author, version, about = "Tradepost CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Run a sync workflow once
    Sync {
        #[command(subcommand)]
        target: SyncTarget,
    },
    /// `NetSuite` diagnostics
    Netsuite {
        #[command(subcommand)]
        action: NetSuiteAction,
    },
}

#[derive(Subcommand)]
enum SyncTarget {
    /// Import products from `NetSuite` into the catalog
    Products {
        /// Maximum products to import (0 = all)
        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        /// Products to skip
        #[arg(short, long, default_value_t = 0)]
        offset: usize,
    },
    /// Push published products to the search index
    Search {
        /// Products per batch
        #[arg(short, long, default_value_t = 50)]
        page_size: u32,
    },
}

#[derive(Subcommand)]
enum NetSuiteAction {
    /// Check credentials against the `SuiteQL` endpoint
    Test,
    /// Run a `SuiteQL` statement and print the result
    Query {
        /// The statement to run
        statement: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Sync { target } => match target {
            SyncTarget::Products { limit, offset } => {
                commands::sync::products(limit, offset).await?;
            }
            SyncTarget::Search { page_size } => commands::sync::search(page_size).await?,
        },
        Commands::Netsuite { action } => match action {
            NetSuiteAction::Test => commands::netsuite::test().await?,
            NetSuiteAction::Query { statement } => {
                commands::netsuite::query(&statement).await?;
            }
        },
    }
    Ok(())
}
