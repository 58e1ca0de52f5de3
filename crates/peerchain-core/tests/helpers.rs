use std::collections::HashMap;
use std::future::Future;
use std::sync::{mpsc, Arc, RwLock};
use std::time::Duration;

use peerchain_core::{Block, ChainFetcher, FetchError, MiningStrategy, Node, NodeConfig};

pub const TEST_DIFFICULTY: u32 = 8;

/// What a peer address resolves to.
#[derive(Clone)]
pub enum Route {
    Node(Arc<Node<MemoryFetcher>>),
    Chain(Vec<Block>),
    /// Never answers.
    Hang,
    Down,
}

/// In-process stand-in for the HTTP peer client.
#[derive(Default)]
pub struct MemoryFetcher {
    routes: RwLock<HashMap<String, Route>>,
}

impl MemoryFetcher {
    pub fn route(&self, peer: &str, route: Route) {
        self.routes
            .write()
            .expect("routes lock poisoned")
            .insert(peer.to_string(), route);
    }
}

impl ChainFetcher for MemoryFetcher {
    fn fetch_chain(&self, peer: &str) -> impl Future<Output = Result<Vec<Block>, FetchError>> + Send {
        let route = self
            .routes
            .read()
            .expect("routes lock poisoned")
            .get(peer)
            .cloned();
        let peer = peer.to_string();
        async move {
            match route {
                Some(Route::Node(node)) => Ok(node.get_chain().await.chain),
                Some(Route::Chain(blocks)) => Ok(blocks),
                Some(Route::Hang) => std::future::pending().await,
                Some(Route::Down) | None => Err(FetchError::Unreachable {
                    peer,
                    reason: "connection refused".to_string(),
                }),
            }
        }
    }
}

pub fn test_config() -> NodeConfig {
    NodeConfig {
        fetch_timeout: Duration::from_millis(200),
        mining: MiningStrategy::Sequential,
        ..NodeConfig::default().with_difficulty(TEST_DIFFICULTY)
    }
}

pub fn new_node(config: NodeConfig) -> Arc<Node<MemoryFetcher>> {
    Arc::new(Node::new(config, MemoryFetcher::default()))
}

/// Mines until the node's chain has `len` blocks.
pub async fn mine_to(node: &Node<MemoryFetcher>, len: usize) {
    while node.chain_len().await < len {
        node.mine().await.expect("uncontended mining succeeds");
    }
}

/// Points `from` at `to` under the peer name `name`.
pub async fn connect(from: &Node<MemoryFetcher>, name: &str, to: &Arc<Node<MemoryFetcher>>) {
    from.fetcher().route(name, Route::Node(Arc::clone(to)));
    from.register_peers([name]).await;
}

/// Multi-thread runtime with a single blocking thread, for use with [`BlockingGate`].
pub fn single_blocker_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .max_blocking_threads(1)
        .enable_all()
        .build()
        .expect("runtime builds")
}

/// Occupies the only blocking thread of a [`single_blocker_runtime`], so
/// proof searches queue until [`BlockingGate::release`].
pub struct BlockingGate {
    release: mpsc::Sender<()>,
}

impl BlockingGate {
    pub fn hold() -> Self {
        let (release, held) = mpsc::channel::<()>();
        tokio::task::spawn_blocking(move || {
            let _ = held.recv();
        });
        Self { release }
    }

    pub fn release(self) {
        let _ = self.release.send(());
    }
}
