//! Instance discovery providers.
//!
//! # Data Flow
//! ```text
//! supervisor.rs (one task per provider)
//!     → lxd/client.rs: parse endpoint, connect, list running instances
//!     → lxd/config.rs: per instance, lxd/label.rs decodes labels,
//!       defaults are filled in (rule.rs renders missing rules)
//!     → Message { provider_name, snapshot } → mpsc channel → consumer
//! ```
//!
//! # Design Decisions
//! - Each snapshot is complete; consumers replace, never merge
//! - Errors are split by what they cost: a bad label skips one instance,
//!   a failed connection or listing costs one backoff cycle, a bad
//!   static config stops startup (see error.rs)

pub mod error;
pub mod lxd;
pub mod rule;
pub mod supervisor;

pub use error::{ConnectionError, DiscoveryError, EnumerationError, TransportError};
pub use lxd::LxdProvider;
pub use supervisor::{Phase, Supervisor};

/// Name every LXD snapshot is published under.
pub const PROVIDER_NAME: &str = "lxd";
