//! GoMarket CLI - Drive the persisted cart from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Show cart lines and the summary
//! gm-cli show
//!
//! # Add a product (or bump its quantity if already present)
//! gm-cli add --id 1 --title "Cadeira Rivatti" --price 1400 --image-url https://img/1.png
//!
//! # Change quantities
//! gm-cli increment 1
//! gm-cli decrement 1
//!
//! # Tap the floating summary, which opens the cart screen
//! gm-cli open
//! ```
//!
//! # Environment Variables
//!
//! See [`gomarket_cart::config`]. `RUST_LOG` controls log verbosity.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use gomarket_cart::CartConfig;
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "gomarket_cart=info,gm_cli=info";

#[derive(Parser)]
#[command(name = "gm-cli")]
#[command(author, version, about = "GoMarket cart tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the cart and its summary
    Show,
    /// Add a product to the cart
    Add {
        /// Product ID
        #[arg(long)]
        id: String,

        /// Product title
        #[arg(short, long)]
        title: String,

        /// Unit price
        #[arg(short, long)]
        price: Decimal,

        /// Product image URL
        #[arg(long, default_value = "")]
        image_url: String,
    },
    /// Increase a product's quantity by one
    Increment {
        /// Product ID
        id: String,
    },
    /// Decrease a product's quantity by one (removes it at zero)
    Decrement {
        /// Product ID
        id: String,
    },
    /// Activate the cart summary (opens the cart screen)
    Open,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CartConfig) -> Option<sentry::ClientInitGuard> {
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

#[allow(clippy::print_stderr)]
#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match CartConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            // Tracing is not up yet.
            eprintln!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, &config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &CartConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = commands::cart::open_store(config).await;

    match cli.command {
        Commands::Show => commands::cart::show(&store),
        Commands::Add {
            id,
            title,
            price,
            image_url,
        } => commands::cart::add(&store, &id, &title, &image_url, price)?,
        Commands::Increment { id } => commands::cart::increment(&store, &id)?,
        Commands::Decrement { id } => commands::cart::decrement(&store, &id)?,
        Commands::Open => commands::cart::open(&store),
    }

    commands::cart::finish(&store).await
}
