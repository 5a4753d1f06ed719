//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! supervisor, snapshot builder, LXD client, API:
//!     → tracing macros with structured fields → logging.rs subscriber
//!     → metrics.rs counters/gauges → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Every backoff is logged with provider, error and retry delay
//! - Metrics are cheap (facade calls, no-op without a recorder)

pub mod logging;
pub mod metrics;
