//! LXD instance discovery provider library.

pub mod api;
pub mod config;
pub mod dynamic;
pub mod label;
pub mod lifecycle;
pub mod observability;
pub mod provider;
pub mod resilience;

pub use config::schema::ProviderConfig;
pub use dynamic::{Message, Snapshot};
pub use lifecycle::Shutdown;
pub use provider::LxdProvider;
