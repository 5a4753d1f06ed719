//! LXD API payloads and the instance records built from them.

use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// Generic LXD response envelope.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub status_code: u16,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub error_code: u16,
    pub metadata: Option<T>,
}

/// `GET /1.0` payload; only the fields that are logged.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ApiServer {
    pub api_version: String,
    pub environment: ApiServerEnvironment,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ApiServerEnvironment {
    pub server_name: String,
    pub server_version: String,
}

/// One entry of `GET /1.0/instances?recursion=2`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ApiInstance {
    pub name: String,
    pub status: String,
    pub config: HashMap<String, String>,
    pub expanded_config: HashMap<String, String>,
    pub state: Option<ApiInstanceState>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ApiInstanceState {
    pub network: Option<Network>,
}

/// Instance network state as reported by LXD, keyed by interface name.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Network(pub BTreeMap<String, NetworkInterface>);

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkInterface {
    pub addresses: Vec<NetworkAddress>,
    pub hwaddr: String,
    pub host_name: String,
    pub mtu: u32,
    pub state: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkAddress {
    pub family: String,
    pub address: String,
    pub netmask: String,
    pub scope: String,
}

impl Network {
    /// First global address on a non-loopback interface, IPv4 preferred.
    ///
    /// Interfaces are visited in name order.
    pub fn primary_address(&self) -> Option<IpAddr> {
        let global = || {
            self.0
                .iter()
                .filter(|(_, iface)| iface.kind != "loopback")
                .flat_map(|(_, iface)| iface.addresses.iter())
                .filter(|addr| addr.scope == "global")
        };
        let pick = |family: &str| {
            global()
                .filter(|addr| addr.family == family)
                .find_map(|addr| addr.address.parse::<IpAddr>().ok())
        };
        pick("inet").or_else(|| pick("inet6"))
    }
}

/// An instance as seen by one listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceRecord {
    pub name: String,
    /// User labels (`user.*` config keys included).
    pub metadata: HashMap<String, String>,
    pub network: Network,
}

impl From<ApiInstance> for InstanceRecord {
    fn from(instance: ApiInstance) -> Self {
        let metadata = if instance.expanded_config.is_empty() {
            instance.config
        } else {
            instance.expanded_config
        };
        Self {
            name: instance.name,
            metadata,
            network: instance
                .state
                .and_then(|state| state.network)
                .unwrap_or_default(),
        }
    }
}
