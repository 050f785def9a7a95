//! Log ingestion subsystem.
//!
//! # Data Flow
//! ```text
//! raw line (from tail)
//!     → record.rs (JSON decode, lenient numeric fields)
//!     → LogRecord (immutable, one per proxied request)
//! ```
//!
//! # Design Decisions
//! - A malformed line is an `Err`, never a panic; the caller drops it
//! - Upstream status lists keep every attempt so retries stay visible

pub mod record;

pub use record::{parse_line, LogRecord, ParseError};
