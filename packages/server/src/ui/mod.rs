//! HTTP / WebSocket surface of the relay.

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::{HUB_PATH, Server};
pub use signal::shutdown_signal;
