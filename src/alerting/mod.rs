//! Alerting subsystem.
//!
//! # Data Flow
//! ```text
//! MonitorEvent
//!     → alert.rs (Alert with counters and timestamp)
//!     → dispatcher.rs (maintenance switch, per-kind cooldown)
//!     → queue.rs (bounded, drop-newest when full)
//!     → NotificationWorker (separate task)
//!     → notifier.rs (webhook POST or local log)
//! ```
//!
//! # Design Decisions
//! - At most one delivery attempt per alert
//! - Cooldown is time-based: it starts when an alert is handed off, not
//!   when delivery succeeds
//! - The ingestion loop never awaits the network

pub mod alert;
pub mod dispatcher;
pub mod notifier;
pub mod queue;

pub use alert::{Alert, AlertContext, AlertKind, AlertPayload, Severity};
pub use dispatcher::{AlertDispatcher, DispatchOutcome};
pub use notifier::{build_notifier, ConsoleNotifier, Notifier, NotifyError, WebhookNotifier};
pub use queue::{alert_queue, AlertQueue, NotificationWorker, QueueError};
