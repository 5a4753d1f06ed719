//! Per-instance label resolution.

use crate::dynamic::Configuration;
use crate::label::{self, DecodeError};
use crate::provider::lxd::types::InstanceRecord;

/// Namespace all provider labels live under. LXD only accepts free-form
/// config keys below `user.`.
pub const LABEL_PREFIX: &str = "user.traefik";

/// Decode an instance's labels into its configuration.
///
/// `enable` starts at `exposed_by_default` and is only overridden by an
/// explicit `user.traefik.enable` label.
pub fn resolve(instance: &InstanceRecord, exposed_by_default: bool) -> Result<Configuration, DecodeError> {
    let mut conf = Configuration {
        enable: exposed_by_default,
        ..Default::default()
    };

    label::decode(&instance.metadata, &mut conf, &[LABEL_PREFIX])?;

    Ok(conf)
}
