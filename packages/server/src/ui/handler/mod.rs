//! Request handlers.

mod http;
mod websocket;

pub use http::{get_group_detail, get_groups, get_stream_file, get_streams, health_check};
pub use websocket::websocket_handler;
