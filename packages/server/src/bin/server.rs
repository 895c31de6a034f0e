//! Presence-aware message relay.
//!
//! Delivers messages directly to online recipients; messages for offline recipients are
//! queued and trigger a push notification.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tayori-server
//! cargo run --bin tayori-server -- --host 0.0.0.0 --port 3000
//! GOOGLE_APPLICATION_CREDENTIALS=service-account.json cargo run --bin tayori-server
//! ```

use std::sync::Arc;

use clap::Parser;
use tayori_server::{
    config::{ServerArgs, ServerConfig},
    infrastructure::{
        connection_registry::InMemoryConnectionRegistry, repository::InMemoryOfflineQueueRepository,
    },
    ui::Server,
    usecase::{GetRelayStatsUseCase, NotificationDispatcher, RelayCore},
};
use tayori_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(&[env!("CARGO_CRATE_NAME"), "tower_http"], "debug");

    let config = match ServerConfig::from_args(ServerArgs::parse()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize dependencies in order:
    // 1. Registry / Queue
    // 2. Notification collaborators
    // 3. UseCases
    // 4. Server

    // 1. In-memory stores
    let registry = Arc::new(InMemoryConnectionRegistry::new());
    let queue = Arc::new(InMemoryOfflineQueueRepository::new(config.queue_capacity));
    match config.queue_capacity {
        Some(capacity) => tracing::info!("Offline queue capacity: {} per recipient", capacity),
        None => tracing::info!("Offline queue capacity: unbounded"),
    }

    // 2. Profile lookup + notification gateway
    let (profile_lookup, gateway) = config.notification_collaborators();
    let dispatcher = Arc::new(NotificationDispatcher::new(
        profile_lookup,
        gateway,
        config.notification_timeout,
    ));

    // 3. Create UseCases
    let relay_core = Arc::new(RelayCore::new(
        registry.clone(),
        queue.clone(),
        dispatcher.clone(),
        config.flush_on_register,
    ));
    let get_relay_stats_usecase = Arc::new(GetRelayStatsUseCase::new(registry, queue, dispatcher));

    // 4. Create and run the server
    let server = Server::new(relay_core, get_relay_stats_usecase, config.shutdown_grace);
    if let Err(e) = server.run(config.host, config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
