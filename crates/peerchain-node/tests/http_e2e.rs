use std::{sync::Arc, time::Duration};

use peerchain_core::{chain::ChainValidator, ChainSnapshot, MiningStrategy, Node, NodeConfig};
use peerchain_node::{router, HttpPeerClient};
use serde_json::{json, Value};
use tokio::net::TcpListener;

const DIFFICULTY: u32 = 8;

async fn spawn_node() -> (Arc<Node<HttpPeerClient>>, String) {
    let config = NodeConfig {
        fetch_timeout: Duration::from_secs(2),
        mining: MiningStrategy::Sequential,
        ..NodeConfig::default().with_difficulty(DIFFICULTY)
    };
    let client = HttpPeerClient::new(config.fetch_timeout).unwrap();
    let node = Arc::new(Node::new(config, client));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let app = router(Arc::clone(&node));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (node, addr)
}

async fn get_json(http: &reqwest::Client, url: String) -> Value {
    http.get(url).send().await.unwrap().json().await.unwrap()
}

#[tokio::test]
async fn submit_and_mine_over_http() {
    let (_node, addr) = spawn_node().await;
    let http = reqwest::Client::new();

    let res = http
        .post(format!("http://{addr}/transactions/new"))
        .json(&json!({ "sender": "alice", "recipient": "bob", "amount": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["position"], 0);
    assert_eq!(body["block_index"], 1);

    let mempool = get_json(&http, format!("http://{addr}/mempool")).await;
    assert_eq!(mempool["mempool"].as_array().unwrap().len(), 1);

    let mined = get_json(&http, format!("http://{addr}/mine")).await;
    assert_eq!(mined["block"]["index"], 1);
    assert_eq!(mined["block"]["transactions"][0]["sender"], "alice");

    let snapshot: ChainSnapshot = http
        .get(format!("http://{addr}/chain"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(snapshot.length, 2);
    assert_eq!(snapshot.chain[1].hash_hex(), mined["hash"].as_str().unwrap());
    assert!(ChainValidator::new(DIFFICULTY).is_valid(&snapshot.chain));

    let mempool = get_json(&http, format!("http://{addr}/mempool")).await;
    assert!(mempool["mempool"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_transaction_gets_bad_request() {
    let (node, addr) = spawn_node().await;
    let res = reqwest::Client::new()
        .post(format!("http://{addr}/transactions/new"))
        .json(&json!({ "sender": "", "recipient": "bob", "amount": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
    assert!(node.pending_transactions().await.is_empty());
}

#[tokio::test]
async fn register_requires_at_least_one_node() {
    let (_node, addr) = spawn_node().await;
    let res = reqwest::Client::new()
        .post(format!("http://{addr}/nodes/register"))
        .json(&json!({ "nodes": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn shorter_node_adopts_longer_chain_over_http() {
    let (a, a_addr) = spawn_node().await;
    let (b, b_addr) = spawn_node().await;
    for _ in 0..4 {
        a.mine().await.unwrap();
    }
    b.mine().await.unwrap();

    let http = reqwest::Client::new();
    let res = http
        .post(format!("http://{b_addr}/nodes/register"))
        .json(&json!({ "nodes": [a_addr.clone(), a_addr] }))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["accepted"], 1);

    let resolved = get_json(&http, format!("http://{b_addr}/nodes/resolve")).await;
    assert_eq!(resolved["replaced"], true);
    assert_eq!(resolved["length"], 5);
    assert_eq!(b.get_chain().await.chain, a.get_chain().await.chain);

    let again = get_json(&http, format!("http://{b_addr}/nodes/resolve")).await;
    assert_eq!(again["replaced"], false);
    assert_eq!(again["message"], "Chain is authoritative");
}

#[tokio::test]
async fn unreachable_peer_does_not_break_resolution() {
    let (node, addr) = spawn_node().await;
    // nothing listens on port 1
    node.register_peers(["127.0.0.1:1"]).await;
    let resolved = get_json(&reqwest::Client::new(), format!("http://{addr}/nodes/resolve")).await;
    assert_eq!(resolved["replaced"], false);
    assert_eq!(resolved["length"], 1);
}

#[tokio::test]
async fn mined_block_is_announced_to_peers() {
    let (miner, miner_addr) = spawn_node().await;
    let (follower, follower_addr) = spawn_node().await;
    miner.register_peers([follower_addr]).await;

    let http = reqwest::Client::new();
    http.post(format!("http://{miner_addr}/mine"))
        .send()
        .await
        .unwrap();

    for _ in 0..100 {
        if follower.chain_len().await == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(follower.get_chain().await.chain, miner.get_chain().await.chain);
}
