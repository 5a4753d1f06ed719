//! HTTP routing configuration contributed by an instance.
//!
//! Field doc comments give the label segment in backticks.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::label::duration::serde_text;
use crate::labeled_struct;

/// Routers, services and middlewares, each keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfiguration {
    /// `routers`
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub routers: BTreeMap<String, Router>,
    /// `services`
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub services: BTreeMap<String, Service>,
    /// `middlewares`
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub middlewares: BTreeMap<String, Middleware>,
}

labeled_struct!(HttpConfiguration {
    routers => "routers",
    services => "services",
    middlewares => "middlewares",
});

/// Matches requests and forwards them to a service.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Router {
    /// `entrypoints`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entry_points: Vec<String>,
    /// `middlewares`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub middlewares: Vec<String>,
    /// `service`
    pub service: String,
    /// `rule`
    pub rule: String,
    /// `priority`
    #[serde(skip_serializing_if = "is_zero")]
    pub priority: i64,
    /// `tls`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<RouterTls>,
}

labeled_struct!(Router {
    entry_points => "entrypoints",
    middlewares => "middlewares",
    service => "service",
    rule => "rule",
    priority => "priority",
    tls => "tls",
});

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouterTls {
    /// `certresolver`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cert_resolver: String,
    /// `options`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub options: String,
}

labeled_struct!(RouterTls {
    cert_resolver => "certresolver",
    options => "options",
});

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Service {
    /// `loadbalancer`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_balancer: Option<ServersLoadBalancer>,
}

labeled_struct!(Service {
    load_balancer => "loadbalancer",
});

/// Load balancer over a set of upstream servers.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServersLoadBalancer {
    /// `server`: port and scheme used to derive a server from the instance
    /// address when `servers` is empty.
    #[serde(skip)]
    pub server: ServerTemplate,
    /// `servers`
    pub servers: Vec<Server>,
    /// `passhostheader`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass_host_header: Option<bool>,
    /// `healthcheck`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HealthCheck>,
}

labeled_struct!(ServersLoadBalancer {
    server => "server",
    servers => "servers",
    pass_host_header => "passhostheader",
    health_check => "healthcheck",
});

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerTemplate {
    /// `port`
    pub port: String,
    /// `scheme`
    pub scheme: String,
}

labeled_struct!(ServerTemplate {
    port => "port",
    scheme => "scheme",
});

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Server {
    /// `url`
    pub url: String,
}

labeled_struct!(Server {
    url => "url",
});

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheck {
    /// `path`
    pub path: String,
    /// `interval`
    #[serde(with = "serde_text")]
    pub interval: Duration,
    /// `timeout`
    #[serde(with = "serde_text")]
    pub timeout: Duration,
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(5),
        }
    }
}

labeled_struct!(HealthCheck {
    path => "path",
    interval => "interval",
    timeout => "timeout",
});

/// A middleware; exactly one variant is expected to be set.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Middleware {
    /// `stripprefix`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strip_prefix: Option<StripPrefix>,
    /// `addprefix`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_prefix: Option<AddPrefix>,
    /// `redirectscheme`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_scheme: Option<RedirectScheme>,
    /// `ratelimit`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimit>,
    /// `headers`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Headers>,
}

labeled_struct!(Middleware {
    strip_prefix => "stripprefix",
    add_prefix => "addprefix",
    redirect_scheme => "redirectscheme",
    rate_limit => "ratelimit",
    headers => "headers",
});

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StripPrefix {
    /// `prefixes`
    pub prefixes: Vec<String>,
}

labeled_struct!(StripPrefix {
    prefixes => "prefixes",
});

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AddPrefix {
    /// `prefix`
    pub prefix: String,
}

labeled_struct!(AddPrefix {
    prefix => "prefix",
});

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RedirectScheme {
    /// `scheme`
    pub scheme: String,
    /// `port`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub port: String,
    /// `permanent`
    pub permanent: bool,
}

labeled_struct!(RedirectScheme {
    scheme => "scheme",
    port => "port",
    permanent => "permanent",
});

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimit {
    /// `average`: requests per `period`.
    pub average: i64,
    /// `burst`
    pub burst: i64,
    /// `period`
    #[serde(with = "serde_text")]
    pub period: Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            average: 0,
            burst: 1,
            period: Duration::from_secs(1),
        }
    }
}

labeled_struct!(RateLimit {
    average => "average",
    burst => "burst",
    period => "period",
});

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Headers {
    /// `customrequestheaders.<name>`
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_request_headers: BTreeMap<String, String>,
    /// `customresponseheaders.<name>`
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_response_headers: BTreeMap<String, String>,
}

labeled_struct!(Headers {
    custom_request_headers => "customrequestheaders",
    custom_response_headers => "customresponseheaders",
});

fn is_zero(v: &i64) -> bool {
    *v == 0
}
