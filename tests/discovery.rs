//! End-to-end discovery against a fake LXD daemon.

use serde_json::json;

mod common;

use common::{instance, FakeLxd, Harness};

#[tokio::test]
async fn test_publishes_enabled_running_instances() {
    let lxd = FakeLxd::start().await;
    lxd.set_instances(vec![
        instance("a", "Running", "10.1.0.2", json!({ "user.traefik.enable": "false" })),
        instance(
            "b",
            "Running",
            "10.1.0.3",
            json!({
                "user.traefik.http.routers.web.rule": "Host(`b.example.com`)",
                "user.traefik.http.routers.web.entrypoints": "websecure",
                "user.traefik.http.services.web.loadbalancer.server.port": "8080",
                "image.os": "debian",
            }),
        ),
        instance("c", "Stopped", "10.1.0.4", json!({})),
    ]);

    let mut harness = Harness::start(lxd.endpoint());
    let message = harness.next().await;

    assert_eq!(message.provider_name, "lxd");
    let names: Vec<_> = message.snapshot.instances.keys().cloned().collect();
    assert_eq!(names, vec!["b"]);

    let http = &message.snapshot.instances["b"].http;
    let router = &http.routers["web"];
    assert_eq!(router.rule, "Host(`b.example.com`)");
    assert_eq!(router.entry_points, vec!["websecure"]);
    assert_eq!(router.service, "web");

    let lb = http.services["web"].load_balancer.as_ref().unwrap();
    assert_eq!(lb.servers.len(), 1);
    assert_eq!(lb.servers[0].url, "http://10.1.0.3:8080");

    harness.stop().await;

    let requests = lxd.requests();
    assert_eq!(requests[0], "GET /1.0 HTTP/1.1");
    assert!(requests.contains(&"GET /1.0/instances?recursion=2 HTTP/1.1".to_string()));
}

#[tokio::test]
async fn test_default_router_and_service() {
    let lxd = FakeLxd::start().await;
    lxd.set_instances(vec![instance("my_app", "Running", "10.1.0.9", json!({}))]);

    let mut harness = Harness::start(lxd.endpoint());
    let message = harness.next().await;

    let http = &message.snapshot.instances["my_app"].http;
    let router = &http.routers["my-app"];
    assert_eq!(router.rule, "Host(`my-app`)");
    assert_eq!(router.service, "my-app");
    let lb = http.services["my-app"].load_balancer.as_ref().unwrap();
    assert_eq!(lb.servers[0].url, "http://10.1.0.9:80");

    harness.stop().await;
}

#[tokio::test]
async fn test_empty_listing_publishes_empty_snapshot() {
    let lxd = FakeLxd::start().await;

    let mut harness = Harness::start(lxd.endpoint());
    let message = harness.next().await;
    assert!(message.snapshot.is_empty());

    harness.stop().await;
}

#[tokio::test]
async fn test_invalid_labels_skip_only_that_instance() {
    let lxd = FakeLxd::start().await;
    lxd.set_instances(vec![
        instance("bad", "Running", "10.1.0.2", json!({ "user.traefik.enable": "yes please" })),
        instance("good", "Running", "10.1.0.3", json!({})),
    ]);

    let mut harness = Harness::start(lxd.endpoint());
    let message = harness.next().await;
    let names: Vec<_> = message.snapshot.instances.keys().cloned().collect();
    assert_eq!(names, vec!["good"]);

    harness.stop().await;
}

#[tokio::test]
async fn test_poll_picks_up_changes() {
    let lxd = FakeLxd::start().await;

    let mut harness = Harness::start(lxd.endpoint());
    assert!(harness.next().await.snapshot.is_empty());

    lxd.set_instances(vec![instance("late", "Running", "10.1.0.5", json!({}))]);
    let message = harness.next().await;
    assert!(message.snapshot.instances.contains_key("late"));

    harness.stop().await;
}
