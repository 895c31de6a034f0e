//! Utilities shared by the tayori server and client.

pub mod logger;
pub mod time;
