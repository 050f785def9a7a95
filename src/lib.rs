//! Blue/green access log watcher.
//!
//! Follows a reverse proxy's JSON access log, infers which backend pool is
//! serving traffic and whether upstream errors have crossed a threshold,
//! and sends rate-limited alerts to a webhook.

pub mod alerting;
pub mod config;
pub mod detection;
pub mod ingest;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod resilience;
pub mod tail;

pub use config::WatcherConfig;
pub use lifecycle::Shutdown;
pub use pipeline::Pipeline;
