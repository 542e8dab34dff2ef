//! Token Ledger CLI Application
//!
//! A command-line interface for operating a fungible token ledger.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use token_ledger::cli::{self, AppState};
use token_ledger::config::LedgerConfig;

#[derive(Parser)]
#[command(name = "ledger")]
#[command(version)]
#[command(about = "An ERC-20 style fungible token ledger", long_about = None)]
struct Cli {
    /// Data directory for ledger storage
    #[arg(short, long, default_value = ".ledger_data")]
    data_dir: PathBuf,

    /// JSON config file with token settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new ledger, crediting the whole supply to the creator
    Init {
        /// Creator account (0x address or label)
        #[arg(long)]
        creator: String,

        /// Token name
        #[arg(long)]
        name: Option<String>,

        /// Token symbol
        #[arg(long)]
        symbol: Option<String>,

        /// Decimal places
        #[arg(long)]
        decimals: Option<u8>,

        /// Initial supply in whole tokens
        #[arg(long)]
        supply: Option<u128>,

        /// Replace an existing ledger
        #[arg(long)]
        force: bool,
    },

    /// Display token information
    Info,

    /// Show an account balance
    Balance {
        /// Account (0x address or label)
        #[arg(short, long)]
        account: String,
    },

    /// Show how much a spender may move on an owner's behalf
    Allowance {
        /// Owner account
        #[arg(short, long)]
        owner: String,

        /// Spender account
        #[arg(short, long)]
        spender: String,
    },

    /// Move tokens from one account to another
    Transfer {
        /// Sender account
        #[arg(short, long)]
        from: String,

        /// Recipient account
        #[arg(short, long)]
        to: String,

        /// Amount in whole tokens (fractions allowed, e.g. 1.5)
        #[arg(short, long)]
        amount: String,
    },

    /// Set a spender's allowance, replacing any previous value
    Approve {
        /// Owner account
        #[arg(short, long)]
        owner: String,

        /// Spender account
        #[arg(short, long)]
        spender: String,

        /// Amount in whole tokens
        #[arg(short, long)]
        amount: String,
    },

    /// Move tokens on an owner's behalf using an allowance
    TransferFrom {
        /// Spender account performing the transfer
        #[arg(short, long)]
        spender: String,

        /// Owner account funds are taken from
        #[arg(short, long)]
        owner: String,

        /// Recipient account
        #[arg(short, long)]
        to: String,

        /// Amount in whole tokens
        #[arg(short, long)]
        amount: String,
    },

    /// List all holders
    Holders,

    /// Show recent events
    History {
        /// Number of events to show
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,
    },

    /// Verify ledger invariants
    Verify,

    /// Export the ledger snapshot to a file
    Export {
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import a ledger snapshot, replacing the stored one
    Import {
        /// Input file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Print an account address
    Account {
        /// Label to derive the address from (random if omitted)
        #[arg(short, long)]
        label: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = LedgerConfig::load_or_default(cli.config.as_deref())?;

    // Commands that don't need a stored ledger
    match &cli.command {
        Commands::Init {
            creator,
            name,
            symbol,
            decimals,
            supply,
            force,
        } => {
            if let Some(name) = name {
                config.name = name.clone();
            }
            if let Some(symbol) = symbol {
                config.symbol = symbol.clone();
            }
            if let Some(decimals) = decimals {
                config.decimals = *decimals;
            }
            if let Some(supply) = supply {
                config.initial_supply = *supply;
            }
            return cli::cmd_init(&cli.data_dir, &config, creator, *force);
        }
        Commands::Import { input } => return cli::cmd_import(&cli.data_dir, &config, input),
        Commands::Account { label } => return cli::cmd_account(label.as_deref()),
        _ => {}
    }

    // Initialize application state
    let mut state = AppState::new(cli.data_dir.clone(), &config)?;

    // Process commands
    match cli.command {
        Commands::Init { .. } | Commands::Import { .. } | Commands::Account { .. } => {
            unreachable!()
        }
        Commands::Info => cli::cmd_info(&state)?,
        Commands::Balance { account } => cli::cmd_balance(&state, &account)?,
        Commands::Allowance { owner, spender } => cli::cmd_allowance(&state, &owner, &spender)?,
        Commands::Transfer { from, to, amount } => {
            cli::cmd_transfer(&mut state, &from, &to, &amount)?
        }
        Commands::Approve {
            owner,
            spender,
            amount,
        } => cli::cmd_approve(&mut state, &owner, &spender, &amount)?,
        Commands::TransferFrom {
            spender,
            owner,
            to,
            amount,
        } => cli::cmd_transfer_from(&mut state, &spender, &owner, &to, &amount)?,
        Commands::Holders => cli::cmd_holders(&state)?,
        Commands::History { count } => cli::cmd_history(&state, count)?,
        Commands::Verify => cli::cmd_verify(&state)?,
        Commands::Export { output } => cli::cmd_export(&state, &output)?,
    }

    Ok(())
}
