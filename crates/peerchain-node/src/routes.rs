use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use peerchain_core::{Block, Node};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{client::HttpPeerClient, error::ApiError};

#[derive(Clone)]
pub struct AppState {
    pub node: Arc<Node<HttpPeerClient>>,
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

#[derive(Deserialize)]
struct TxIn {
    sender: String,
    recipient: String,
    amount: u64,
}

#[derive(Deserialize)]
struct RegisterIn {
    nodes: Vec<String>,
}

pub fn router(node: Arc<Node<HttpPeerClient>>) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(Health { status: "ok" }) }))
        .route("/chain", get(get_chain))
        .route("/transactions/new", post(new_transaction))
        .route("/mine", get(mine).post(mine))
        .route("/nodes", get(list_nodes))
        .route("/nodes/register", post(register_nodes))
        .route("/nodes/resolve", get(resolve))
        .route("/mempool", get(mempool))
        .route("/blocks/new", post(receive_block))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { node })
}

async fn get_chain(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.node.get_chain().await)
}

async fn new_transaction(
    State(state): State<AppState>,
    Json(tx): Json<TxIn>,
) -> Result<impl IntoResponse, ApiError> {
    let position = state
        .node
        .submit_transaction(tx.sender, tx.recipient, tx.amount)
        .await?;
    let block_index = state.node.chain_len().await;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": format!("Transaction will be added to block {block_index}"),
            "position": position,
            "block_index": block_index,
        })),
    ))
}

async fn mine(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let block = state.node.mine().await?;

    let peers = state.node.peers().await;
    if !peers.is_empty() {
        let client = state.node.fetcher().clone();
        let announced = block.clone();
        tokio::spawn(async move {
            client.broadcast_block(&peers, &announced).await;
        });
    }

    Ok(Json(json!({
        "message": "Block mined",
        "hash": block.hash_hex(),
        "block": block,
    })))
}

async fn list_nodes(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "nodes": state.node.peers().await }))
}

async fn register_nodes(
    State(state): State<AppState>,
    Json(body): Json<RegisterIn>,
) -> Result<impl IntoResponse, ApiError> {
    if body.nodes.is_empty() {
        return Err(ApiError::bad_request("no nodes provided"));
    }
    let accepted = state.node.register_peers(body.nodes).await;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "New nodes have been added",
            "accepted": accepted,
            "total_nodes": state.node.peers().await,
        })),
    ))
}

async fn resolve(State(state): State<AppState>) -> impl IntoResponse {
    let outcome = state.node.resolve_conflicts().await;
    let message = if outcome.replaced {
        "Chain replaced"
    } else {
        "Chain is authoritative"
    };
    info!(replaced = outcome.replaced, length = outcome.length, "resolve requested");
    Json(json!({
        "message": message,
        "replaced": outcome.replaced,
        "length": outcome.length,
        "chain": state.node.get_chain().await.chain,
    }))
}

async fn mempool(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "mempool": state.node.pending_transactions().await }))
}

async fn receive_block(
    State(state): State<AppState>,
    Json(block): Json<Block>,
) -> Result<impl IntoResponse, ApiError> {
    state.node.accept_block(block).await?;
    Ok(Json(json!({ "message": "Block added" })))
}
