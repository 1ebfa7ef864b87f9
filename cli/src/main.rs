//! Ratewise CLI
//!
//! Converts amounts between currencies using cached or freshly fetched rates.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ratewise_fx::{CancelHandle, Cancellation, EnvApiKey, FxConfig, ReqwestTransport};

mod app;
mod output;

use app::App;

/// Ratewise currency converter
#[derive(Parser, Debug)]
#[command(name = "ratewise")]
#[command(about = "Convert amounts between currencies")]
struct Args {
    /// Directory holding the rate cache and conversion history
    #[arg(long, global = true, default_value = ".ratewise")]
    data_dir: PathBuf,

    /// Emit logs and results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert AMOUNT of BASE into QUOTE
    Convert {
        base: String,
        quote: String,
        amount: f64,
    },
    /// List supported currencies
    Currencies,
    /// Show recent conversions
    History {
        /// Number of records to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );
    let json_layer = args
        .json
        .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr));
    let text_layer = (!args.json)
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();

    let config = FxConfig::from_env();
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let transport = Arc::new(ReqwestTransport::new(config.network_timeout)?);
    let app = App::new(&config, &args.data_dir, &EnvApiKey::default(), transport)?;

    let rendered = match args.command {
        Command::Convert {
            base,
            quote,
            amount,
        } => {
            let cancel = cancel_on_ctrl_c();
            let (request, result) = app.convert(&base, &quote, amount, &cancel).await?;
            output::conversion(&request, &result, args.json)?
        }
        Command::Currencies => {
            let cancel = cancel_on_ctrl_c();
            let catalog = app.currencies(&cancel).await?;
            output::currencies(&catalog, args.json)?
        }
        Command::History { limit } => {
            let records = app.history(limit).await?;
            output::history(&records, args.json)?
        }
    };

    println!("{}", rendered);
    Ok(())
}

/// A cancellation signal fired by Ctrl+C.
fn cancel_on_ctrl_c() -> Cancellation {
    let (handle, cancel) = CancelHandle::new();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, cancelling");
                handle.cancel();
            }
            Err(e) => error!(error = %e, "Failed to listen for Ctrl+C"),
        }
    });

    cancel
}
