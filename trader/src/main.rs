//! CLI entry point for the contract bot.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use contractbook_trader::broker;
use contractbook_trader::config::Config;
use contractbook_trader::error::Error;
use contractbook_trader::execution::{self, ContractQuery, SessionOptions};
use contractbook_trader::journal::Journal;
use contractbook_trader::wizard::ConsolePrompter;

#[derive(Parser)]
#[command(name = "contractbot")]
#[command(about = "Catalog-driven options bot for the Deriv API")]
#[command(version)]
struct Cli {
    /// Path to config.toml
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Select a contract, confirm, buy and wait for settlement
    Trade {
        /// Build the order without buying
        #[arg(long)]
        dry_run: bool,

        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// List contracts, optionally filtered
    Contracts {
        #[arg(long)]
        symbol: Option<String>,
        /// Market display name pattern
        #[arg(long)]
        market: Option<String>,
        /// Submarket display name pattern
        #[arg(long)]
        submarket: Option<String>,
        /// Symbol display name pattern
        #[arg(long)]
        name: Option<String>,
        /// Modality group pattern (e.g. callput)
        #[arg(long)]
        group: Option<String>,
        /// Modality name pattern (e.g. Rise/Fall)
        #[arg(long)]
        modality: Option<String>,
        /// Duration token that must fit the envelope (e.g. 5t, 15m)
        #[arg(long)]
        duration: Option<String>,
        /// Only match envelopes expressed in the duration's own unit
        #[arg(long)]
        fit_in_units: bool,
    },

    /// Show markets and submarkets with open/closed status
    Markets,

    /// Check the connection and show the account
    Status,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    };

    let result = broker::deriv_broker(&config).and_then(|mut broker| match cli.command {
        Command::Trade { dry_run, force } => {
            let mut journal = Journal::open(&config.journal_path())?;
            let opts = SessionOptions { dry_run, force };
            execution::run_session(
                &config,
                broker.as_mut(),
                &mut ConsolePrompter,
                &mut journal,
                &opts,
            )
            .map(|_| ())
        }
        Command::Contracts {
            symbol,
            market,
            submarket,
            name,
            group,
            modality,
            duration,
            fit_in_units,
        } => {
            let query = ContractQuery {
                symbol,
                market,
                submarket,
                name,
                group,
                modality,
                duration,
                fit_in_units,
            };
            execution::show_contracts(broker.as_mut(), &query)
        }
        Command::Markets => execution::show_markets(broker.as_mut()),
        Command::Status => execution::check_status(broker.as_mut()),
    });

    if let Err(e) = result {
        match &e {
            Error::Rejected(msg) => eprintln!("\nRejected: {msg}"),
            _ => eprintln!("Error: {e}"),
        }
        process::exit(e.exit_code());
    }
}
