//! Detection subsystem.
//!
//! # Data Flow
//! ```text
//! LogRecord
//!     → window.rs (push error/success outcome)
//!     → pool.rs (Failover / PoolRecovered on pool change)
//!     → degradation.rs (HighErrorRate / ErrorRateRecovered on threshold crossing)
//!     → Vec<MonitorEvent>
//! ```
//!
//! # Design Decisions
//! - monitor.rs owns every piece of state; no statics, no locks
//! - Trackers emit events on transitions only, never on steady state
//! - Detection never suppresses anything: cooldown and maintenance belong to
//!   alerting

pub mod degradation;
pub mod event;
pub mod monitor;
pub mod pool;
pub mod window;

pub use event::{ErrorRateSnapshot, MonitorEvent};
pub use monitor::Monitor;
pub use window::SlidingWindow;
