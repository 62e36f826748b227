use std::cell::Cell;
use std::time::Duration;

use mail_triage::cache::RefCache;
use mail_triage::error::TriageError;
use mail_triage::locations::LocationClient;
use mail_triage::models::Municipality;

fn unreachable_client() -> LocationClient {
    // Nothing listens on this port; requests fail fast at the transport layer.
    LocationClient::new("http://127.0.0.1:9/api/v1/localidades", Duration::from_secs(1))
        .expect("client should build")
}

#[tokio::test]
async fn empty_state_code_short_circuits_without_a_network_call() {
    let client = unreachable_client();

    // Would error if it tried the network; the empty code returns early.
    let municipalities = client.municipalities("").await.expect("should not hit the network");
    assert!(municipalities.is_empty());
    assert_eq!(client.cached_municipality_lists(), 0);
}

#[tokio::test]
async fn transport_failures_propagate_without_caching() {
    let client = unreachable_client();

    let result = client.states().await;
    assert!(matches!(result, Err(TriageError::Http(_))));
    assert_eq!(client.cached_state_lists(), 0);

    let result = client.municipalities("PI").await;
    assert!(result.is_err());
    assert_eq!(client.cached_municipality_lists(), 0);
}

#[tokio::test]
async fn invalidate_clears_both_caches() {
    let client = unreachable_client();
    // Nothing cached yet; invalidate must still be safe to call.
    client.invalidate();
    assert_eq!(client.cached_state_lists(), 0);
    assert_eq!(client.cached_municipality_lists(), 0);
}

#[test]
fn ref_cache_is_read_through_per_key() {
    let cache: RefCache<String, Vec<Municipality>> = RefCache::new();

    let fetches = Cell::new(0);
    let lookup = |state_code: &str| -> Vec<Municipality> {
        let key = state_code.to_string();
        if let Some(hit) = cache.get(&key) {
            return hit;
        }
        fetches.set(fetches.get() + 1);
        let fetched = vec![Municipality {
            id: 1,
            nome: format!("Capital de {state_code}"),
            state_code: key.clone(),
        }];
        cache.put(key, fetched.clone());
        fetched
    };

    // First access fetches, every later access for the same key hits the cache.
    assert_eq!(lookup("PI").len(), 1);
    assert_eq!(lookup("PI").len(), 1);
    assert_eq!(fetches.get(), 1);

    // A different key misses independently.
    assert_eq!(lookup("CE")[0].state_code, "CE");
    assert_eq!(fetches.get(), 2);

    // Only an explicit clear (test hook) forgets the entries.
    cache.clear();
    assert_eq!(lookup("PI").len(), 1);
    assert_eq!(fetches.get(), 3);
}

#[test]
fn error_messages_are_fixed_per_resource() {
    assert_eq!(TriageError::ReferenceFetch("estados").to_string(), "failed to fetch estados");
    assert_eq!(
        TriageError::ReferenceFetch("municipios").to_string(),
        "failed to fetch municipios"
    );
}
