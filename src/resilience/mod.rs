//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Connection or listing failure (provider::supervisor):
//!     → backoff.rs (next delay, grows per consecutive failure, capped)
//!     → sleep, then reconnect
//!     → success resets the policy to its base delay
//! ```
//!
//! # Design Decisions
//! - Retries are unbounded; only shutdown stops them
//! - Delays are deterministic so tests can assert them exactly

pub mod backoff;
