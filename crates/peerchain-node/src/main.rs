use std::{net::SocketAddr, sync::Arc, time::Duration};

use clap::Parser;
use peerchain_core::{
    constants::{FETCH_TIMEOUT_SECS, MAX_DIFFICULTY, POW_TARGET_DIFFICULTY},
    MiningStrategy, Node, NodeConfig,
};
use peerchain_node::{constants::DEFAULT_LISTEN, router, HttpPeerClient};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "peerchain-node")]
#[command(about = "A proof-of-work node that reconciles its chain with peers")]
struct Args {
    /// Address to listen on, e.g. 127.0.0.1:8000
    #[arg(long, env = "PEERCHAIN_LISTEN", default_value = DEFAULT_LISTEN)]
    listen: String,

    /// Required leading zero bits of a proof hash
    #[arg(
        long,
        env = "PEERCHAIN_DIFFICULTY",
        default_value_t = POW_TARGET_DIFFICULTY,
        value_parser = clap::value_parser!(u32).range(0..=MAX_DIFFICULTY as i64)
    )]
    difficulty: u32,

    /// Seconds to wait for a peer before skipping it
    #[arg(long, env = "PEERCHAIN_FETCH_TIMEOUT", default_value_t = FETCH_TIMEOUT_SECS)]
    fetch_timeout: u64,

    /// Refuse to mine blocks without pending transactions
    #[arg(long, env = "PEERCHAIN_NO_EMPTY_BLOCKS")]
    no_empty_blocks: bool,

    /// Search proofs on a single thread
    #[arg(long)]
    sequential: bool,

    /// Peers to register at startup (host:port), comma separated or repeated
    #[arg(long = "peer", env = "PEERCHAIN_PEERS", value_delimiter = ',')]
    peers: Vec<String>,
}

impl Args {
    fn node_config(&self) -> NodeConfig {
        NodeConfig {
            difficulty: self.difficulty,
            fetch_timeout: Duration::from_secs(self.fetch_timeout),
            allow_empty_blocks: !self.no_empty_blocks,
            mining: if self.sequential {
                MiningStrategy::Sequential
            } else {
                MiningStrategy::Parallel
            },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = args.node_config();
    let client = HttpPeerClient::new(config.fetch_timeout)?;
    let node = Arc::new(Node::new(config, client));
    if !args.peers.is_empty() {
        node.register_peers(&args.peers).await;
    }

    let app = router(Arc::clone(&node));

    let addr: SocketAddr = args.listen.parse()?;
    info!(difficulty = args.difficulty, "peerchain-node listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}
