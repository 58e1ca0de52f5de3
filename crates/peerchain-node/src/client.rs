use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use peerchain_core::{Block, ChainFetcher, ChainSnapshot, FetchError};
use reqwest::Client;
use tracing::{debug, warn};

/// Talks to other nodes over their HTTP API.
#[derive(Clone)]
pub struct HttpPeerClient {
    client: Client,
}

impl HttpPeerClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Peers register as `host:port` or as a full base URL.
    pub fn peer_url(peer: &str, path: &str) -> String {
        let base = peer.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if base.starts_with("http://") || base.starts_with("https://") {
            format!("{base}/{path}")
        } else {
            format!("http://{base}/{path}")
        }
    }

    pub async fn announce_block(&self, peer: &str, block: &Block) -> Result<(), FetchError> {
        let url = Self::peer_url(peer, "/blocks/new");
        let response = self
            .client
            .post(&url)
            .json(block)
            .send()
            .await
            .map_err(|e| FetchError::Unreachable {
                peer: peer.to_string(),
                reason: e.to_string(),
            })?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                peer: peer.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }

    /// Best effort: failures are logged and otherwise ignored.
    pub async fn broadcast_block(&self, peers: &[String], block: &Block) {
        let sends = peers.iter().map(|peer| async move {
            match self.announce_block(peer, block).await {
                Ok(()) => debug!(%peer, index = block.index, "block announced"),
                Err(err) => warn!(%peer, error = %err, "failed to announce block"),
            }
        });
        join_all(sends).await;
    }
}

impl ChainFetcher for HttpPeerClient {
    fn fetch_chain(&self, peer: &str) -> impl Future<Output = Result<Vec<Block>, FetchError>> + Send {
        let client = self.client.clone();
        let url = Self::peer_url(peer, "/chain");
        let peer = peer.to_string();
        async move {
            let response = client
                .get(&url)
                .send()
                .await
                .map_err(|e| FetchError::Unreachable {
                    peer: peer.clone(),
                    reason: e.to_string(),
                })?;
            if !response.status().is_success() {
                return Err(FetchError::Status {
                    peer,
                    status: response.status().as_u16(),
                });
            }
            let snapshot: ChainSnapshot =
                response.json().await.map_err(|e| FetchError::Malformed {
                    peer: peer.clone(),
                    reason: e.to_string(),
                })?;
            if snapshot.length != snapshot.chain.len() {
                return Err(FetchError::Malformed {
                    peer,
                    reason: format!(
                        "length {} but {} blocks",
                        snapshot.length,
                        snapshot.chain.len()
                    ),
                });
            }
            debug!(%peer, length = snapshot.length, "fetched peer chain");
            Ok(snapshot.chain)
        }
    }
}
