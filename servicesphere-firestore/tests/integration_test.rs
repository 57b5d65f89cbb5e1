//! Integration tests for servicesphere-firestore
//!
//! A throwaway HTTP listener stands in for the Firestore emulator.

use serde_json::json;
use servicesphere_firestore::*;
use servicesphere_notify::{NotifyError, ProfileStore};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve canned responses keyed by request path suffix; unknown paths get 404.
async fn fake_emulator(routes: Vec<(&'static str, u16, String)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let routes = routes.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let n = stream.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]);
                let path = request.split_whitespace().nth(1).unwrap_or("").to_string();

                let (status, body) = routes
                    .iter()
                    .find(|(suffix, _, _)| path.ends_with(suffix))
                    .map(|(_, status, body)| (*status, body.clone()))
                    .unwrap_or((404, "{}".to_string()));

                let response = format!(
                    "HTTP/1.1 {} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
            });
        }
    });

    addr.to_string()
}

async fn store(host: String) -> FirestoreProfileStore {
    let config = FirestoreConfig::builder()
        .project_id("demo-servicesphere")
        .emulator_host(host)
        .build();
    FirestoreProfileStore::new(FirestoreClient::new(config).await.unwrap())
}

#[tokio::test]
async fn test_fetch_profile_with_token() {
    let body = json!({
        "name": "projects/demo-servicesphere/databases/(default)/documents/users/u1",
        "fields": {
            "fcmToken": {"stringValue": "device-token-1"},
            "name": {"stringValue": "Asha"}
        }
    })
    .to_string();
    let host = fake_emulator(vec![("/documents/users/u1", 200, body)]).await;

    let profile = store(host).await.fetch_profile("u1").await.unwrap().unwrap();
    assert_eq!(profile.user_id, "u1");
    assert_eq!(profile.delivery_token(), Some("device-token-1"));
}

#[tokio::test]
async fn test_fetch_profile_without_token_field() {
    let body = json!({
        "name": "projects/demo-servicesphere/databases/(default)/documents/users/u2",
        "fields": {"fcmToken": {"nullValue": null}}
    })
    .to_string();
    let host = fake_emulator(vec![("/documents/users/u2", 200, body)]).await;

    let profile = store(host).await.fetch_profile("u2").await.unwrap().unwrap();
    assert_eq!(profile.delivery_token(), None);
}

#[tokio::test]
async fn test_missing_document_is_none() {
    let host = fake_emulator(vec![]).await;
    assert!(store(host).await.fetch_profile("ghost").await.unwrap().is_none());
}

#[tokio::test]
async fn test_service_error_maps_to_store_error() {
    let host = fake_emulator(vec![(
        "/documents/users/u3",
        403,
        json!({"error": {"status": "PERMISSION_DENIED"}}).to_string(),
    )])
    .await;

    let err = store(host).await.fetch_profile("u3").await.unwrap_err();
    match err {
        NotifyError::ProfileStore(message) => assert!(message.contains("403")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_custom_collection_and_field() {
    let body = json!({
        "name": "projects/demo-servicesphere/databases/(default)/documents/customers/c1",
        "fields": {"pushToken": {"stringValue": "alt-token"}}
    })
    .to_string();
    let host = fake_emulator(vec![("/documents/customers/c1", 200, body)]).await;

    let profile = store(host)
        .await
        .collection("customers")
        .token_field("pushToken")
        .fetch_profile("c1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.delivery_token(), Some("alt-token"));
}

#[tokio::test]
async fn test_special_characters_stay_in_the_document_id() {
    let victim = json!({
        "name": "projects/demo-servicesphere/databases/(default)/documents/users/victim",
        "fields": {"fcmToken": {"stringValue": "victim-token"}}
    })
    .to_string();
    let fragment = json!({
        "name": "projects/demo-servicesphere/databases/(default)/documents/users/victim#frag",
        "fields": {"fcmToken": {"stringValue": "fragment-token"}}
    })
    .to_string();
    let host = fake_emulator(vec![
        ("/documents/users/victim", 200, victim),
        ("/documents/users/victim%23frag", 200, fragment),
    ])
    .await;
    let store = store(host).await;

    let profile = store.fetch_profile("victim#frag").await.unwrap().unwrap();
    assert_eq!(profile.delivery_token(), Some("fragment-token"));

    assert!(store.fetch_profile("victim?x=1").await.unwrap().is_none());
    assert!(matches!(
        store.fetch_profile("..").await,
        Err(NotifyError::ProfileStore(_))
    ));
}

#[test]
fn test_firestore_error_display() {
    let err = FirestoreError::Service {
        status: 500,
        message: "boom".to_string(),
    };
    assert_eq!(err.to_string(), "Firestore returned 500: boom");
}
