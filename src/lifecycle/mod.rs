//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Notifier + worker → Pipeline → Tailer
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop tailer → Close alert queue → Drain worker → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, delivery second, tailing last
//! - Shutdown has a deadline: pending alerts are discarded after it

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use startup::{replay, run, send_test_alert, ReplaySummary, StartupError};
