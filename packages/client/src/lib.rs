//! CLI client for the message relay.

mod domain;
mod error;
mod formatter;
mod input;
mod runner;
mod session;
mod ui;

pub use error::ClientError;
pub use input::{InputCommand, parse_input};
pub use runner::run_client;
