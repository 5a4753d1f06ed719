//! Snapshot assembly.
//!
//! # Responsibilities
//! - Resolve every listed instance and keep the enabled ones
//! - Fill in the default service, server and router an instance omits
//! - Key the result by instance name
//!
//! # Design Decisions
//! - An instance with invalid labels is skipped; the rest of the cycle goes on
//! - Duplicate names: the last instance in listing order wins
//! - An empty result is still a snapshot and is still published

use std::net::IpAddr;

use crate::dynamic::{Configuration, Server, ServersLoadBalancer, Service, Snapshot};
use crate::observability::metrics;
use crate::provider::lxd::label::resolve;
use crate::provider::lxd::types::InstanceRecord;
use crate::provider::rule::{normalize, RuleTemplate};
use crate::provider::PROVIDER_NAME;

const DEFAULT_SCHEME: &str = "http";
const DEFAULT_PORT: &str = "80";

/// Turns one listing into a [`Snapshot`].
#[derive(Debug)]
pub struct SnapshotBuilder {
    exposed_by_default: bool,
    default_rule: RuleTemplate,
}

impl SnapshotBuilder {
    pub fn new(exposed_by_default: bool, default_rule: RuleTemplate) -> Self {
        Self {
            exposed_by_default,
            default_rule,
        }
    }

    pub fn build(&self, instances: Vec<InstanceRecord>) -> Snapshot {
        let mut snapshot = Snapshot::default();

        for instance in instances {
            let conf = match resolve(&instance, self.exposed_by_default) {
                Ok(conf) => conf,
                Err(e) => {
                    tracing::error!(
                        provider = PROVIDER_NAME,
                        instance = %instance.name,
                        label = %e.label,
                        value = %e.value,
                        error = %e.reason,
                        "Skipping instance with invalid labels"
                    );
                    metrics::record_decode_error();
                    continue;
                }
            };

            if !conf.enable {
                tracing::debug!(instance = %instance.name, "Filtering disabled instance");
                continue;
            }

            let address = instance.network.primary_address();
            if address.is_none() {
                tracing::warn!(instance = %instance.name, "Instance has no global IP address, no default server");
            }

            let conf = self.apply_defaults(&instance.name, address, conf);
            if snapshot.instances.insert(instance.name.clone(), conf).is_some() {
                tracing::warn!(instance = %instance.name, "Duplicate instance name, keeping the last one listed");
            }
        }

        snapshot
    }

    fn apply_defaults(&self, name: &str, address: Option<IpAddr>, mut conf: Configuration) -> Configuration {
        let default_name = normalize(name);
        let http = &mut conf.http;

        if http.services.is_empty() {
            http.services.insert(default_name.clone(), Service::default());
        }
        for service in http.services.values_mut() {
            let lb = service.load_balancer.get_or_insert_with(ServersLoadBalancer::default);
            if let (true, Some(address)) = (lb.servers.is_empty(), address) {
                lb.servers.push(Server {
                    url: server_url(address, &lb.server.scheme, &lb.server.port),
                });
            }
        }

        if http.routers.is_empty() {
            http.routers.insert(default_name, Default::default());
        }

        let only_service = match http.services.keys().collect::<Vec<_>>().as_slice() {
            [single] => Some((*single).clone()),
            _ => None,
        };
        http.routers.retain(|router_name, router| {
            if router.rule.is_empty() {
                match self.default_rule.render(name) {
                    Ok(rule) => router.rule = rule,
                    Err(e) => {
                        tracing::error!(instance = %name, router = %router_name, error = %e, "Failed to render default rule, dropping router");
                        return false;
                    }
                }
            }
            if router.service.is_empty() {
                match &only_service {
                    Some(service) => router.service = service.clone(),
                    None => {
                        tracing::error!(
                            instance = %name,
                            router = %router_name,
                            "Router has no service and the instance defines several, dropping router"
                        );
                        return false;
                    }
                }
            }
            true
        });

        conf
    }
}

fn server_url(address: IpAddr, scheme: &str, port: &str) -> String {
    let scheme = if scheme.is_empty() { DEFAULT_SCHEME } else { scheme };
    let port = if port.is_empty() { DEFAULT_PORT } else { port };
    match address {
        IpAddr::V4(v4) => format!("{}://{}:{}", scheme, v4, port),
        IpAddr::V6(v6) => format!("{}://[{}]:{}", scheme, v6, port),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_RULE;
    use crate::provider::lxd::types::{Network, NetworkAddress, NetworkInterface};
    use std::collections::{BTreeMap, HashMap};

    fn builder(exposed_by_default: bool) -> SnapshotBuilder {
        SnapshotBuilder::new(exposed_by_default, RuleTemplate::new(DEFAULT_RULE).unwrap())
    }

    fn network(address: &str) -> Network {
        let family = if address.contains(':') { "inet6" } else { "inet" };
        let mut interfaces = BTreeMap::new();
        interfaces.insert(
            "eth0".to_string(),
            NetworkInterface {
                addresses: vec![NetworkAddress {
                    family: family.into(),
                    address: address.into(),
                    netmask: "24".into(),
                    scope: "global".into(),
                }],
                ..Default::default()
            },
        );
        Network(interfaces)
    }

    fn instance(name: &str, address: &str, labels: &[(&str, &str)]) -> InstanceRecord {
        InstanceRecord {
            name: name.to_string(),
            metadata: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
            network: network(address),
        }
    }

    #[test]
    fn test_disabled_instance_excluded() {
        let snapshot = builder(true).build(vec![
            instance("A", "10.0.0.1", &[("user.traefik.enable", "false")]),
            instance("B", "10.0.0.2", &[]),
        ]);

        let names: Vec<_> = snapshot.instances.keys().cloned().collect();
        assert_eq!(names, vec!["B"]);
        assert!(snapshot.instances["B"].enable);
    }

    #[test]
    fn test_not_exposed_by_default() {
        let snapshot = builder(false).build(vec![
            instance("A", "10.0.0.1", &[]),
            instance("B", "10.0.0.2", &[("user.traefik.enable", "true")]),
        ]);

        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.instances.contains_key("B"));
    }

    #[test]
    fn test_empty_listing_gives_empty_snapshot() {
        let snapshot = builder(true).build(Vec::new());
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_defaults_for_bare_instance() {
        let snapshot = builder(true).build(vec![instance("my_app", "10.0.3.7", &[])]);
        let http = &snapshot.instances["my_app"].http;

        let router = &http.routers["my-app"];
        assert_eq!(router.rule, "Host(`my-app`)");
        assert_eq!(router.service, "my-app");

        let lb = http.services["my-app"].load_balancer.as_ref().unwrap();
        assert_eq!(lb.servers, vec![Server { url: "http://10.0.3.7:80".into() }]);
    }

    #[test]
    fn test_labels_override_defaults() {
        let snapshot = builder(true).build(vec![instance(
            "api",
            "fd42::10",
            &[
                ("user.traefik.http.routers.public.rule", "PathPrefix(`/api`)"),
                ("user.traefik.http.services.backend.loadbalancer.server.port", "9000"),
                ("user.traefik.http.services.backend.loadbalancer.server.scheme", "h2c"),
            ],
        )]);
        let http = &snapshot.instances["api"].http;

        assert_eq!(http.routers.len(), 1);
        assert_eq!(http.routers["public"].rule, "PathPrefix(`/api`)");
        assert_eq!(http.routers["public"].service, "backend");

        let lb = http.services["backend"].load_balancer.as_ref().unwrap();
        assert_eq!(lb.servers[0].url, "h2c://[fd42::10]:9000");
    }

    #[test]
    fn test_explicit_servers_are_kept() {
        let snapshot = builder(true).build(vec![instance(
            "proxy",
            "10.0.0.4",
            &[("user.traefik.http.services.ext.loadbalancer.servers[0].url", "http://192.0.2.1:81")],
        )]);
        let lb = snapshot.instances["proxy"].http.services["ext"]
            .load_balancer
            .as_ref()
            .unwrap();

        assert_eq!(lb.servers, vec![Server { url: "http://192.0.2.1:81".into() }]);
    }

    #[test]
    fn test_router_without_service_among_many_is_dropped() {
        let snapshot = builder(true).build(vec![instance(
            "multi",
            "10.0.0.5",
            &[
                ("user.traefik.http.routers.r1.rule", "Host(`a`)"),
                ("user.traefik.http.routers.r2.rule", "Host(`b`)"),
                ("user.traefik.http.routers.r2.service", "s2"),
                ("user.traefik.http.services.s1.loadbalancer.server.port", "81"),
                ("user.traefik.http.services.s2.loadbalancer.server.port", "82"),
            ],
        )]);
        let http = &snapshot.instances["multi"].http;

        assert!(!http.routers.contains_key("r1"));
        assert_eq!(http.routers["r2"].service, "s2");
    }

    #[test]
    fn test_invalid_labels_skip_only_that_instance() {
        let snapshot = builder(true).build(vec![
            instance("bad", "10.0.0.1", &[("user.traefik.enable", "maybe")]),
            instance("good", "10.0.0.2", &[]),
        ]);

        let names: Vec<_> = snapshot.instances.keys().cloned().collect();
        assert_eq!(names, vec!["good"]);
    }

    #[test]
    fn test_instance_without_address_kept_without_server() {
        let mut record = instance("offline", "10.0.0.1", &[]);
        record.network = Network::default();
        let snapshot = builder(true).build(vec![record]);

        let http = &snapshot.instances["offline"].http;
        assert_eq!(http.routers["offline"].rule, "Host(`offline`)");
        let lb = http.services["offline"].load_balancer.as_ref().unwrap();
        assert!(lb.servers.is_empty());
    }

    #[test]
    fn test_duplicate_names_last_wins() {
        let snapshot = builder(true).build(vec![
            instance("dup", "10.0.0.1", &[]),
            instance("dup", "10.0.0.2", &[]),
        ]);
        let lb = snapshot.instances["dup"].http.services["dup"]
            .load_balancer
            .as_ref()
            .unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(lb.servers[0].url, "http://10.0.0.2:80");
    }
}
