//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Log source missing or rotated away:
//!     → backoff.rs (jittered exponential delay between reopen attempts)
//!     → give up after a bounded number of attempts
//! ```

pub mod backoff;

pub use backoff::Backoff;
