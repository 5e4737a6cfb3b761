use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::Value;

use lw_client::{Connector, ConnectorEvent, ConnectorSettings, TransactionQuery};
use lw_types::{Block, Node, Transaction, TransactionCondition};

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let settings = settings(&cli.connection)?;
    let connector = Connector::new(settings)?;
    let format = cli.format;

    match cli.command {
        Command::Block(args) => cmd_block(&connector, args, &format).await,
        Command::Transactions(args) => cmd_transactions(&connector, args, &format).await,
        Command::Add(args) => cmd_add(&connector, args, &format).await,
        Command::Commit(args) => cmd_commit(&connector, args).await,
        Command::Watch => cmd_watch(&connector, &format).await,
    }
}

fn settings(args: &ConnectionArgs) -> anyhow::Result<ConnectorSettings> {
    if let Some(path) = &args.config {
        let mut settings = ConnectorSettings::load(path)?;
        if let Some(protocol) = &args.protocol {
            settings.protocol = Some(protocol.clone());
        }
        return Ok(settings);
    }
    if args.nodes.is_empty() {
        bail!("no nodes given; pass --config <file> or --node <url>");
    }
    let nodes = args
        .nodes
        .iter()
        .map(Node::new)
        .collect::<Result<Vec<_>, _>>()?;
    let mut settings = ConnectorSettings::new(nodes);
    if let Some(protocol) = &args.protocol {
        settings = settings.with_protocol(protocol.clone());
    }
    Ok(settings)
}

async fn cmd_block(connector: &Connector, args: BlockArgs, format: &OutputFormat) -> anyhow::Result<()> {
    match connector.get_block(args.index).await? {
        Some(block) => match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&block)?),
            OutputFormat::Text => print_block(&block),
        },
        None => println!("Block {} not found.", args.index.to_string().yellow()),
    }
    Ok(())
}

async fn cmd_transactions(
    connector: &Connector,
    args: TransactionsArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let mut query = TransactionQuery::new().with_time_range(args.timestamp_start, args.timestamp_end);
    if let Some(raw) = &args.condition {
        let condition: TransactionCondition = serde_json::from_str(raw).context("parsing --condition")?;
        query = query.with_condition(condition);
    }
    if let Some(limit) = args.limit {
        query = query.with_window(args.offset, limit);
    }
    if args.timestamps {
        query = query.with_timestamps();
    }

    let transactions = connector.get_transactions(query).await?.unwrap_or_default();
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&transactions)?),
        OutputFormat::Text => {
            if transactions.is_empty() {
                println!("No transactions.");
            }
            for tx in &transactions {
                print_transaction(tx);
            }
        }
    }
    Ok(())
}

async fn cmd_add(connector: &Connector, args: AddArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let transactions = read_transactions(&args.file)?;
    let ids = connector.add_transactions(&transactions, args.temporary).await?;
    let ids = ids.unwrap_or_default();
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&ids)?),
        OutputFormat::Text => {
            let state = if args.temporary { "sent".yellow() } else { "confirmed".green() };
            println!("{} {} transaction(s) {}", "✓".green().bold(), ids.len(), state);
            for id in &ids {
                println!("  {}", id.cyan());
            }
        }
    }
    Ok(())
}

async fn cmd_commit(connector: &Connector, args: CommitArgs) -> anyhow::Result<()> {
    connector.commit_transactions(&args.ids).await?;
    println!("{} Committed {} transaction(s)", "✓".green().bold(), args.ids.len());
    Ok(())
}

async fn cmd_watch(connector: &Connector, format: &OutputFormat) -> anyhow::Result<()> {
    let mut events = connector.subscribe();
    println!("Watching for blocks. Press {} to stop.", "Ctrl-C".bold());
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => return Ok(()),
            event = events.recv() => match event {
                Some(ConnectorEvent::Created(block)) => match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string(block.as_ref())?),
                    OutputFormat::Text => print_block(&block),
                },
                Some(ConnectorEvent::Error(e)) => eprintln!("{} {}", "error:".red().bold(), e),
                None => return Ok(()),
            },
        }
    }
}

fn read_transactions(path: &std::path::Path) -> anyhow::Result<Vec<Transaction>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    let transactions = match value {
        Value::Array(_) => serde_json::from_value(value)?,
        Value::Object(_) => vec![serde_json::from_value(value)?],
        _ => bail!("{} must hold a transaction or an array of them", path.display()),
    };
    Ok(transactions)
}

fn print_block(block: &Block) {
    let count = block.transactions.as_ref().map_or(0, Vec::len);
    println!(
        "{} {}  {}",
        "block".bold(),
        format!("#{}", block.index).yellow().bold(),
        block.hash.dimmed()
    );
    println!("  Timestamp: {}", block.timestamp);
    println!("  Previous: {}", block.prev_hash.dimmed());
    println!("  Transactions: {}", count.to_string().cyan());
    for id in block.transaction_ids() {
        println!("    {}", id);
    }
}

fn print_transaction(tx: &Transaction) {
    match tx.timestamp() {
        Some(ts) => println!("{}  {}", tx.transaction_id.cyan(), ts.to_string().dimmed()),
        None => println!("{}", tx.transaction_id.cyan()),
    }
}
