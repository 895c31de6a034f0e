//! CLI client for the message relay.
//!
//! Registers under a user ID and sends messages typed as `@recipient text`.
//! Messages queued while offline are delivered when the client (re)connects.
//! Automatically reconnects on disconnection (max 5 attempts with 5 second interval).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tayori-client -- --user-id alice
//! cargo run --bin tayori-client -- -u bob --url ws://127.0.0.1:3000/ws
//! ```

use clap::Parser;

use tayori_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "tayori-client")]
#[command(about = "CLI client for the Tayori message relay", long_about = None)]
struct Args {
    /// User ID to register as
    #[arg(short = 'u', long)]
    user_id: String,

    /// WebSocket server URL
    #[arg(long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(&[env!("CARGO_CRATE_NAME")], "info");

    let args = Args::parse();

    // Run the client
    if let Err(e) = tayori_client::run_client(args.url, args.user_id).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
