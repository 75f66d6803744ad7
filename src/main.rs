//! Contract Ledger CLI Application
//!
//! A command-line interface for deploying and calling protocol contracts.

use clap::{Parser, Subcommand};
use contract_ledger::cli::{self, AppState};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ledger")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "A deterministic contract ledger with atomic calls", long_about = None)]
struct Cli {
    /// Data directory for ledger storage
    #[arg(short, long, default_value = ".ledger_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new ledger
    Init {
        /// Delete any existing state first
        #[arg(long)]
        force: bool,
    },

    /// Generate a secp256k1 key pair
    Keygen,

    /// Sign an address with a private key
    Sign {
        /// Hex-encoded private key
        #[arg(short, long)]
        key: String,

        /// Address to sign
        #[arg(short, long)]
        address: String,
    },

    /// Issue funds to an account
    Credit {
        /// Recipient address
        #[arg(short, long)]
        to: String,

        /// Amount to issue
        #[arg(short, long)]
        amount: u128,

        /// Currency address (native if omitted)
        #[arg(short, long)]
        currency: Option<String>,
    },

    /// Advance the height
    Advance {
        /// Number of blocks to advance
        #[arg(short, long)]
        blocks: Option<u64>,

        /// Absolute height to move to
        #[arg(long)]
        to: Option<u64>,
    },

    /// Deploy a contract
    Deploy {
        /// Contract type (escrow, time_lock, relay, smart_wallet, fixed_price, nft, template)
        #[arg(short = 't', long = "type")]
        contract_type: String,

        /// Deployer address
        #[arg(short, long)]
        from: String,

        /// Constructor arguments as a JSON array
        #[arg(long)]
        args: Option<String>,

        /// Named dependencies (name=address, comma-separated)
        #[arg(long)]
        depends: Option<String>,
    },

    /// Call a contract method
    Call {
        /// Caller address
        #[arg(short, long)]
        from: String,

        /// Contract address
        #[arg(short = 'C', long)]
        contract: String,

        /// Method name
        #[arg(short, long)]
        method: String,

        /// Arguments as a JSON array
        #[arg(long)]
        args: Option<String>,

        /// Amount to attach as a deposit
        #[arg(long)]
        deposit: Option<u128>,

        /// Deposit currency (native if omitted)
        #[arg(long)]
        currency: Option<String>,
    },

    /// Run a const method without changing state
    Query {
        /// Caller address
        #[arg(short, long)]
        from: Option<String>,

        /// Contract address
        #[arg(short = 'C', long)]
        contract: String,

        /// Method name
        #[arg(short, long)]
        method: String,

        /// Arguments as a JSON array
        #[arg(long)]
        args: Option<String>,
    },

    /// Show balances of an address
    Balance {
        /// Account or contract address
        #[arg(short, long)]
        address: String,
    },

    /// Show contract info
    Info {
        /// Contract address
        #[arg(short = 'C', long)]
        contract: String,
    },

    /// List contract types and deployed contracts
    List,

    /// Show recent ledger events
    Events {
        /// Number of events to show
        #[arg(short, long, default_value = "20")]
        count: usize,
    },

    /// Export ledger state to a file
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import ledger state from a file
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Restore a backup (lists backups if none is given)
    Restore {
        /// Backup index, 0 is the most recent
        #[arg(short, long)]
        backup: Option<usize>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Commands that don't need ledger state
    match &cli.command {
        Commands::Init { force } => return cli::cmd_init(&cli.data_dir, *force),
        Commands::Keygen => return cli::cmd_keygen(),
        Commands::Sign { key, address } => return cli::cmd_sign(key, address),
        _ => {}
    }

    // Initialize application state
    let mut state = AppState::new(cli.data_dir.clone())?;

    // Process commands
    match cli.command {
        Commands::Init { .. } | Commands::Keygen | Commands::Sign { .. } => {}

        Commands::Credit {
            to,
            amount,
            currency,
        } => {
            cli::cmd_credit(&mut state, &to, amount, currency.as_deref())?;
        }

        Commands::Advance { blocks, to } => {
            cli::cmd_advance(&mut state, blocks, to)?;
        }

        Commands::Deploy {
            contract_type,
            from,
            args,
            depends,
        } => {
            cli::cmd_deploy(
                &mut state,
                &contract_type,
                &from,
                args.as_deref(),
                depends.as_deref(),
            )?;
        }

        Commands::Call {
            from,
            contract,
            method,
            args,
            deposit,
            currency,
        } => {
            cli::cmd_call(
                &mut state,
                &from,
                &contract,
                &method,
                args.as_deref(),
                deposit,
                currency.as_deref(),
            )?;
        }

        Commands::Query {
            from,
            contract,
            method,
            args,
        } => {
            cli::cmd_query(
                &mut state,
                from.as_deref(),
                &contract,
                &method,
                args.as_deref(),
            )?;
        }

        Commands::Balance { address } => {
            cli::cmd_balance(&state, &address)?;
        }

        Commands::Info { contract } => {
            cli::cmd_info(&state, &contract)?;
        }

        Commands::List => {
            cli::cmd_list(&state)?;
        }

        Commands::Events { count } => {
            cli::cmd_events(&state, count)?;
        }

        Commands::Export { output } => {
            cli::cmd_export(&state, &output)?;
        }

        Commands::Import { input } => {
            cli::cmd_import(&mut state, &input)?;
        }

        Commands::Restore { backup } => {
            cli::cmd_restore(&mut state, backup)?;
        }
    }

    Ok(())
}
