//! Request handlers.

mod http;
mod websocket;

pub use http::{debug_queue, get_relay_stats, health_check};
pub use websocket::websocket_handler;
