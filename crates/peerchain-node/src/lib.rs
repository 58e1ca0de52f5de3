//! HTTP transport around a [`peerchain_core::Node`].

pub mod client;
pub mod constants;
pub mod error;
pub mod routes;

pub use client::HttpPeerClient;
pub use routes::{router, AppState};
