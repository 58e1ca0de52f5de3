use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "peerchain-cli")]
#[command(about = "CLI client for a peerchain node")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:8000)
    #[arg(long, global = true, env = "PEERCHAIN_NODE", default_value = "http://127.0.0.1:8000")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a transaction
    Submit {
        /// Sender
        #[arg(long)]
        from: String,
        /// Recipient
        #[arg(long)]
        to: String,
        /// Amount
        #[arg(long)]
        amount: u64,
    },
    /// Mine a block from the pending transactions
    Mine,
    /// Print the node's chain
    Chain,
    /// Register peers with the node
    Register {
        /// Peer addresses (host:port)
        #[arg(required = true)]
        peers: Vec<String>,
    },
    /// Run conflict resolution against the node's peers
    Resolve,
    /// List the node's peers
    Peers,
    /// Show pending transactions
    Mempool,
}

#[derive(Serialize)]
struct Tx {
    sender: String,
    recipient: String,
    amount: u64,
}

#[derive(Serialize)]
struct Register {
    nodes: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let node = cli.node.trim_end_matches('/').to_string();
    let client = reqwest::Client::new();

    let request = match cli.cmd {
        Command::Submit { from, to, amount } => client
            .post(format!("{node}/transactions/new"))
            .json(&Tx {
                sender: from,
                recipient: to,
                amount,
            }),
        Command::Mine => client.post(format!("{node}/mine")),
        Command::Chain => client.get(format!("{node}/chain")),
        Command::Register { peers } => client
            .post(format!("{node}/nodes/register"))
            .json(&Register { nodes: peers }),
        Command::Resolve => client.get(format!("{node}/nodes/resolve")),
        Command::Peers => client.get(format!("{node}/nodes")),
        Command::Mempool => client.get(format!("{node}/mempool")),
    };

    let res = request.send().await?;
    let status = res.status();
    let body = res.text().await?;
    debug!(%status, bytes = body.len(), "response received");
    println!("status: {status}");
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{body}"),
    }
    Ok(())
}
