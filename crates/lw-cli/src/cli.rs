use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lw", about = "LedgerWire client for ledger nodes", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Where to connect. `--config` wins over `--node`.
#[derive(Args, Debug)]
pub struct ConnectionArgs {
    /// TOML settings file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Node URL, may be repeated
    #[arg(long = "node", global = true)]
    pub nodes: Vec<String>,
    /// ws, tls, or tcp
    #[arg(long, global = true)]
    pub protocol: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show one block
    Block(BlockArgs),
    /// Query transactions, newest block first
    Transactions(TransactionsArgs),
    /// Submit transactions from a JSON file
    Add(AddArgs),
    /// Commit transactions by id
    Commit(CommitArgs),
    /// Print block notifications as they arrive
    Watch,
}

#[derive(Args)]
pub struct BlockArgs {
    pub index: u64,
}

#[derive(Args)]
pub struct TransactionsArgs {
    /// Condition as JSON, e.g. '{"operation":"and","conditions":{...}}'
    #[arg(long)]
    pub condition: Option<String>,
    #[arg(long)]
    pub offset: Option<usize>,
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
    #[arg(long = "from")]
    pub timestamp_start: Option<u64>,
    #[arg(long = "to")]
    pub timestamp_end: Option<u64>,
    /// Stamp each transaction with its block timestamp
    #[arg(long)]
    pub timestamps: bool,
}

#[derive(Args)]
pub struct AddArgs {
    /// File holding a JSON array of transactions
    pub file: PathBuf,
    /// Do not wait for a block to confirm them
    #[arg(long)]
    pub temporary: bool,
}

#[derive(Args)]
pub struct CommitArgs {
    #[arg(required = true)]
    pub ids: Vec<String>,
}
