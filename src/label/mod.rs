//! Label decoding subsystem.
//!
//! # Data Flow
//! ```text
//! instance metadata (flat key → string map)
//!     → path.rs (qualify field paths under each namespace prefix)
//!     → value.rs (Labeled impls: scalars parse, containers discover entries)
//!     → destination value, mutated in place
//! ```
//!
//! # Addressing
//! ```text
//! <prefix>.enable                                   → bool field
//! <prefix>.http.routers.<name>.rule                 → map entry, string field
//! <prefix>.http.routers.<name>.entrypoints=a,b      → scalar list, comma form
//! <prefix>.http.services.<name>.loadbalancer.servers[0].url
//!                                                   → struct list, indexed form
//! ```
//!
//! # Design Decisions
//! - Schema is compile-time: each struct lists its fields via `labeled_struct!`
//! - Map keys and list indices come from the metadata, never from the schema
//! - Absent labels leave the caller's defaults untouched
//! - Labels outside every prefix are ignored
//! - Decoding is pure: no I/O, no state beyond the destination

pub mod duration;
mod path;
mod value;

use std::collections::HashMap;

use thiserror::Error;

pub use path::{LabelPath, Lookup};
pub use value::Labeled;

/// A label value that does not parse into its field's type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid value {value:?} for label {label}: {reason}")]
pub struct DecodeError {
    /// Fully-qualified label key.
    pub label: String,
    /// Raw label value.
    pub value: String,
    pub reason: String,
}

impl DecodeError {
    pub fn new(label: &str, value: &str, reason: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Decode `labels` into `target`, trying `prefixes` in order for each field.
pub fn decode<T: Labeled>(
    labels: &HashMap<String, String>,
    target: &mut T,
    prefixes: &[&str],
) -> Result<(), DecodeError> {
    let lookup = Lookup::new(labels, prefixes);
    target.decode(&lookup, &LabelPath::root())
}

/// Encode `value` as labels under `prefix`; the inverse of [`decode`].
pub fn encode<T: Labeled>(value: &T, prefix: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();
    value.encode(prefix, &LabelPath::root(), &mut out);
    out
}
