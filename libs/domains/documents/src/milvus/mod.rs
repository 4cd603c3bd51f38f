mod client;
mod connection;
mod wire;

pub use client::{MilvusStore, MAX_QUERY_WINDOW};
pub use connection::MilvusConnection;
