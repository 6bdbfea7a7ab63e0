//! Facade behaviour against an in-memory store.

mod common;

use common::FakeConnector;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::json;
use softcache_client::{Cache, HandleEvent, HandleStatus, Topology, DEFAULT_TTL_SECS};
use softcache_config::CacheCredentials;
use softcache_core::TIMEOUT_MESSAGE;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct User {
    name: String,
}

fn credentials() -> CacheCredentials {
    CacheCredentials {
        ignore: false,
        request_timeout_ms: 300,
        ..Default::default()
    }
}

fn cache_with(connector: &Arc<FakeConnector>) -> Cache {
    Cache::new(credentials(), connector.clone())
}

#[tokio::test]
async fn test_scenario_set_get_delete_get() {
    let connector = FakeConnector::new();
    let cache = cache_with(&connector);

    let ack = cache
        .set_with_ttl("user:1", &User { name: "Ada".to_string() }, 60)
        .await;
    assert_eq!(ack.as_deref(), Some("OK"));

    let user: Option<User> = cache.get("user:1").await;
    assert_eq!(user, Some(User { name: "Ada".to_string() }));

    assert_eq!(cache.delete("user:1").await, Some(1));

    let user: Option<User> = cache.get("user:1").await;
    assert_eq!(user, None);
}

#[tokio::test]
async fn test_unset_key_is_none() {
    let connector = FakeConnector::new();
    let cache = cache_with(&connector);

    assert_eq!(cache.get::<User>("never-set").await, None);
    assert_eq!(cache.delete("never-set").await, Some(0));
}

#[tokio::test]
async fn test_round_trip_preserves_structure() {
    let connector = FakeConnector::new();
    let cache = cache_with(&connector);
    let value = json!({
        "id": 7,
        "tags": ["a", "b"],
        "nested": { "ok": true, "ratio": 0.5 },
        "missing": null
    });

    cache.set("doc:7", &value).await;
    let read: Option<serde_json::Value> = cache.get("doc:7").await;
    assert_eq!(read, Some(value));
}

#[tokio::test]
async fn test_values_are_stored_as_json() {
    let connector = FakeConnector::new();
    let cache = cache_with(&connector);

    cache.set("user:1", &User { name: "Ada".to_string() }).await;
    let entry = connector.server.entry("user:1").unwrap();
    assert_eq!(entry.value, r#"{"name":"Ada"}"#);
}

#[tokio::test]
async fn test_ttl_defaults_and_overrides() {
    let connector = FakeConnector::new();
    let cache = cache_with(&connector);

    cache.set("default", &1).await;
    cache.set_with_ttl("short", &1, 60).await;

    assert_eq!(connector.server.entry("default").unwrap().ttl_secs, DEFAULT_TTL_SECS);
    assert_eq!(connector.server.entry("default").unwrap().ttl_secs, 7200);
    assert_eq!(connector.server.entry("short").unwrap().ttl_secs, 60);
}

#[tokio::test]
async fn test_ignore_flag_never_touches_store() {
    let connector = FakeConnector::new();
    let cache = Cache::new(
        CacheCredentials {
            ignore: true,
            ..credentials()
        },
        connector.clone(),
    );

    assert_eq!(cache.set("k", &1).await, None);
    assert_eq!(cache.get::<i32>("k").await, None);
    assert_eq!(cache.delete("k").await, None);
    assert_eq!(connector.constructions(), 0);
    assert!(connector.server.entry("k").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_timeout_keeps_connection() {
    let connector = FakeConnector::new();
    let cache = cache_with(&connector);
    cache.set("k", &"v").await;

    let handle = connector.latest();
    handle.delay_calls(Some(Duration::from_secs(1)));
    assert_eq!(cache.get::<String>("k").await, None);
    assert!(cache.manager().has_instance());

    handle.delay_calls(None);
    assert_eq!(cache.get::<String>("k").await.as_deref(), Some("v"));
    assert_eq!(connector.constructions(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_call_just_inside_deadline_succeeds() {
    let connector = FakeConnector::new();
    let cache = cache_with(&connector);
    cache.set("k", &"v").await;

    connector.latest().delay_calls(Some(Duration::from_millis(250)));
    assert_eq!(cache.get::<String>("k").await.as_deref(), Some("v"));
}

#[tokio::test]
async fn test_store_error_forces_fresh_connection() {
    let connector = FakeConnector::new();
    let cache = cache_with(&connector);
    cache.set("k", &"v").await;
    let first = connector.latest();

    first.fail_next("READONLY You can't write against a read only replica");
    assert_eq!(cache.set("k", &"w").await, None);
    assert!(!cache.manager().has_instance());

    assert_eq!(cache.get::<String>("k").await.as_deref(), Some("v"));
    assert_eq!(connector.constructions(), 2);
    assert_eq!(first.calls(), 2);
}

#[tokio::test]
async fn test_error_carrying_timeout_message_is_transient() {
    let connector = FakeConnector::new();
    let cache = cache_with(&connector);
    cache.set("k", &"v").await;

    connector.latest().fail_next(TIMEOUT_MESSAGE);
    assert_eq!(cache.get::<String>("k").await, None);
    assert!(cache.manager().has_instance());

    assert_eq!(cache.get::<String>("k").await.as_deref(), Some("v"));
    assert_eq!(connector.constructions(), 1);
}

#[tokio::test]
async fn test_malformed_stored_value_forces_fresh_connection() {
    let connector = FakeConnector::new();
    let cache = cache_with(&connector);
    cache.set("other", &1).await;
    connector.server.insert_raw("broken", "{\"name\":");

    assert_eq!(cache.get::<User>("broken").await, None);
    assert!(!cache.manager().has_instance());

    assert_eq!(cache.get::<i32>("other").await, Some(1));
    assert_eq!(connector.constructions(), 2);
}

#[tokio::test]
async fn test_not_ready_handle_is_a_miss() {
    let connector = FakeConnector::new();
    connector.start_as(HandleStatus::Connecting);
    let cache = cache_with(&connector);

    assert_eq!(cache.set("k", &1).await, None);
    assert_eq!(cache.get::<i32>("k").await, None);
    let handle = connector.latest();
    assert_eq!(handle.calls(), 0);
    assert_eq!(connector.constructions(), 1);

    handle.set_status(HandleStatus::Ready);
    assert_eq!(cache.set("k", &1).await.as_deref(), Some("OK"));
    assert_eq!(cache.get::<i32>("k").await, Some(1));
}

#[tokio::test]
async fn test_error_event_forces_fresh_connection() {
    let connector = FakeConnector::new();
    let cache = cache_with(&connector);
    cache.set("k", &1).await;

    connector.latest().emit(HandleEvent::Error("ECONNRESET".to_string()));
    assert!(!cache.manager().has_instance());

    assert_eq!(cache.get::<i32>("k").await, Some(1));
    assert_eq!(connector.constructions(), 2);
}

#[tokio::test]
async fn test_timeout_error_event_keeps_connection() {
    let connector = FakeConnector::new();
    let cache = cache_with(&connector);
    cache.set("k", &1).await;

    connector.latest().emit(HandleEvent::Error(TIMEOUT_MESSAGE.to_string()));
    assert_eq!(cache.get::<i32>("k").await, Some(1));
    assert_eq!(connector.constructions(), 1);
}

#[tokio::test]
async fn test_close_event_forces_fresh_connection() {
    let connector = FakeConnector::new();
    let cache = cache_with(&connector);
    cache.set("k", &1).await;

    connector.latest().emit(HandleEvent::Close);
    assert_eq!(cache.get::<i32>("k").await, Some(1));
    assert_eq!(connector.constructions(), 2);
}

#[tokio::test]
async fn test_late_event_from_replaced_handle_is_ignored() {
    let connector = FakeConnector::new();
    let cache = cache_with(&connector);
    cache.set("k", &1).await;
    let old = connector.latest();

    cache.disconnect();
    cache.set("k", &2).await;
    old.emit(HandleEvent::Close);

    assert!(cache.manager().has_instance());
    assert_eq!(cache.get::<i32>("k").await, Some(2));
    assert_eq!(connector.constructions(), 2);
}

#[tokio::test]
async fn test_errored_handle_is_replaced_on_next_call() {
    let connector = FakeConnector::new();
    let cache = cache_with(&connector);
    cache.set("k", &1).await;

    connector.latest().set_status(HandleStatus::Errored);
    assert_eq!(cache.get::<i32>("k").await, None);
    assert_eq!(cache.get::<i32>("k").await, Some(1));
    assert_eq!(connector.constructions(), 2);
}

#[tokio::test]
async fn test_construction_failure_is_a_miss_and_retried() {
    let connector = FakeConnector::new();
    connector.refuse(Some("ENOTFOUND cache.internal"));
    let cache = cache_with(&connector);

    assert_eq!(cache.set("k", &1).await, None);
    assert_eq!(cache.get::<i32>("k").await, None);
    assert!(!cache.manager().has_instance());

    connector.refuse(None);
    assert_eq!(cache.set("k", &1).await.as_deref(), Some("OK"));
    assert_eq!(cache.get::<i32>("k").await, Some(1));
}

#[tokio::test]
async fn test_disconnect_rebuilds_lazily() {
    let connector = FakeConnector::new();
    let cache = cache_with(&connector);
    cache.set("k", &1).await;

    cache.disconnect();
    cache.disconnect();
    assert_eq!(connector.constructions(), 1);

    assert_eq!(cache.get::<i32>("k").await, Some(1));
    assert_eq!(connector.constructions(), 2);
}

#[tokio::test]
async fn test_concurrent_calls_share_one_handle() {
    let connector = FakeConnector::new();
    let cache = cache_with(&connector);
    cache.set("k", &1).await;

    let reads = join_all((0..16).map(|_| cache.get::<i32>("k"))).await;
    assert!(reads.iter().all(|r| *r == Some(1)));
    assert_eq!(connector.constructions(), 1);
}

#[tokio::test]
async fn test_cluster_credentials_resolve_cluster_topology() {
    let connector = FakeConnector::new();
    let cache = Cache::new(
        CacheCredentials {
            is_cluster: true,
            host: "cluster.internal".to_string(),
            ..credentials()
        },
        connector.clone(),
    );

    cache.get::<i32>("k").await;
    let options = connector.last_options().unwrap();
    let Topology::Cluster(cluster) = options.topology else {
        panic!("expected cluster topology");
    };
    assert_eq!(cluster.nodes, vec![("cluster.internal".to_string(), 6379)]);
    assert_eq!(options.request_timeout, Duration::from_millis(300));
}
