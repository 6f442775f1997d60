use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;
use wheel_advisor_core::{ConfigLoader, OptionRight};
use wheel_advisor_engine::WheelService;
use wheel_advisor_ib::{IBClient, IBConfig};
use wheel_advisor_yahoo::{YahooClient, YahooConfig};

mod commands;
mod format;

use commands::Request;

#[derive(Parser)]
#[command(name = "wheel")]
#[command(about = "Wheel strategy options advisor backed by an IB gateway", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true, default_value = "config/wheel.toml")]
    config: PathBuf,

    /// Print the structured result as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Optional log file path (logs to file instead of stderr)
    #[arg(long, global = true, env = "WHEEL_LOG_FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Current underlying price (broker first, snapshot fallback)
    Price {
        symbol: String,
    },
    /// Nearest-strike option from the delayed chain
    Options {
        symbol: String,
        /// Percent out of the money
        #[arg(long, default_value = "10")]
        otm: Decimal,
        /// CALL or PUT (C and P also accepted)
        #[arg(long, default_value = "PUT")]
        right: OptionRight,
    },
    /// Wheel recommendation: sell a put when flat, a call when long
    Wheel {
        symbol: String,
        /// Cash available to secure puts; one contract when omitted
        #[arg(long)]
        cash: Option<Decimal>,
    },
    /// Account balances and stock positions
    Portfolio,
    /// Option quote with model greeks straight from the broker
    BrokerOption {
        symbol: String,
        #[arg(long, default_value = "10")]
        otm: Decimal,
        #[arg(long, default_value = "PUT")]
        right: OptionRight,
    },
    /// Free-text command, e.g. `chat option NVDA 15 call`
    Chat {
        command: String,
        args: Vec<String>,
    },
}

fn init_logging(log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_ref())?;

    let config = ConfigLoader::load_from(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;
    tracing::debug!(?config, "Configuration loaded");

    let request = match cli.command {
        Commands::Price { symbol } => Request::Price { symbol },
        Commands::Options { symbol, otm, right } => Request::Options {
            symbol,
            otm_pct: otm,
            right,
        },
        Commands::Wheel { symbol, cash } => Request::Wheel { symbol, cash },
        Commands::Portfolio => Request::Portfolio,
        Commands::BrokerOption { symbol, otm, right } => Request::BrokerOption {
            symbol,
            otm_pct: otm,
            right,
        },
        Commands::Chat { command, args } => match commands::parse_chat(&command, &args) {
            Ok(request) => request,
            Err(e) => {
                eprintln!("{e}");
                return Ok(ExitCode::FAILURE);
            }
        },
    };

    let broker = IBClient::new(IBConfig::from(&config.broker))
        .context("failed to build broker client")?;
    let snapshot = YahooClient::new(YahooConfig::from(&config.snapshot))
        .context("failed to build snapshot client")?;
    let service = WheelService::new(Arc::new(broker), Arc::new(snapshot), config);

    match commands::execute(&service, request, cli.json).await {
        Ok(output) => {
            println!("{output}");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::error!(error = %e, "Request failed");
            eprintln!("{}", format::error(&e));
            Ok(ExitCode::FAILURE)
        }
    }
}
