use tracing::debug;

/// Known peer addresses. Iteration follows first registration, which keeps
/// consensus resolution deterministic when peers report equally long chains.
#[derive(Clone, Debug, Default)]
pub struct PeerRegistry {
    peers: Vec<String>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds every address not already known. Blank entries are ignored.
    /// Returns how many peers were newly added.
    pub fn register<I, S>(&mut self, addresses: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for address in addresses {
            let Some(address) = normalize(address.as_ref()) else {
                continue;
            };
            if self.contains(&address) {
                continue;
            }
            debug!(peer = %address, "peer registered");
            self.peers.push(address);
            added += 1;
        }
        added
    }

    pub fn contains(&self, address: &str) -> bool {
        self.peers.iter().any(|p| p == address)
    }

    pub fn list(&self) -> Vec<String> {
        self.peers.clone()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

fn normalize(address: &str) -> Option<String> {
    let trimmed = address.trim().trim_end_matches('/');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
