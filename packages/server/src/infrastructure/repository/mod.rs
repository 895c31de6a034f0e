//! Repository 実装
//!
//! - `inmemory`: プロセス内メモリによる実装（再起動で消える）

pub mod inmemory;

pub use inmemory::InMemoryOfflineQueueRepository;
