//! Nosorog CLI - Inspect and edit the cart storage area from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Put a product in the cart
//! nosorog add "Boxing gloves" 1500 equipment
//!
//! # Bump the quantity of the first line, or of a line by id
//! nosorog inc 0
//! nosorog dec --id 1767225600000
//!
//! # Show the cart with the 400₽ courier tariff
//! nosorog show --tariff 400
//!
//! # Follow changes made by other processes
//! nosorog watch
//! ```
//!
//! # Commands
//!
//! - `add` - Add one unit of a product
//! - `inc` / `dec` - Change a line's quantity by one
//! - `remove` - Remove a line
//! - `clear` - Empty every partition
//! - `checkout` - Place the order and empty the cart
//! - `show` - Print the cart, optionally as JSON
//! - `watch` - Print the header badge whenever another process changes the cart

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "nosorog")]
#[command(author, version, about = "Nosorog cart tools")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add one unit of a product
    Add {
        /// Product name
        name: String,

        /// Unit price in rubles
        price: u64,

        /// Category tag (`equipment`, `cosmetic`, `pharma`)
        category: String,
    },
    /// Increase a line's quantity by one
    Inc(Target),
    /// Decrease a line's quantity by one, never below one
    Dec(Target),
    /// Remove a line from the cart
    Remove(Target),
    /// Empty the cart
    Clear,
    /// Place the order and empty the cart
    Checkout {
        /// Delivery fee in rubles
        #[arg(short, long, default_value_t = 0)]
        tariff: u64,
    },
    /// Print the cart
    Show {
        /// Delivery fee in rubles
        #[arg(short, long, default_value_t = 0)]
        tariff: u64,

        /// Print the cart view as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the header badge whenever the cart changes
    Watch,
}

/// A cart line, by aggregate position or by id.
#[derive(Args)]
#[group(required = true, multiple = false)]
struct Target {
    /// Position in the cart, starting at 0
    index: Option<usize>,

    /// Stable item id
    #[arg(long)]
    id: Option<i64>,
}

impl Target {
    fn resolve(&self) -> commands::Line {
        match (self.index, self.id) {
            (_, Some(id)) => commands::Line::Id(id.into()),
            (Some(index), None) => commands::Line::Index(index),
            // clap's group guarantees one of the two
            (None, None) => commands::Line::Index(0),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let result: Result<(), commands::CommandError> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "nosorog_cart=info,nosorog_cli=info".into());

    // Logs go to stderr so `show --json` output stays parseable
    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    let ctx = commands::Context::from_env()?;
    match cli.command {
        Commands::Add {
            name,
            price,
            category,
        } => commands::cart::add(&ctx, &name, price, &category)?,
        Commands::Inc(target) => {
            commands::cart::adjust(&ctx, target.resolve(), nosorog_cart::Adjustment::Increment)?;
        }
        Commands::Dec(target) => {
            commands::cart::adjust(&ctx, target.resolve(), nosorog_cart::Adjustment::Decrement)?;
        }
        Commands::Remove(target) => commands::cart::remove(&ctx, target.resolve())?,
        Commands::Clear => commands::cart::clear(&ctx)?,
        Commands::Checkout { tariff } => commands::cart::checkout(&ctx, tariff)?,
        Commands::Show { tariff, json } => commands::cart::show(&ctx, tariff, json)?,
        Commands::Watch => commands::watch::run(&ctx).await?,
    }
    Ok(())
}
