//! End-to-end scenarios driven through the public facade with a scripted
//! transport: the full QR login handshake, session persistence across
//! client instances, and the retry-after-reauthentication path.

use std::sync::Arc;

use bitqiu::errors::Error;
use bitqiu::session::SessionStore;
use bitqiu::settings::BitqiuSettings;
use bitqiu::testing::{MockTransport, SessionBuilder, TestFixtures};
use bitqiu::client::SortField;
use bitqiu::Client;

fn settings() -> BitqiuSettings {
    TestFixtures::settings()
}

fn qr_begin_payload() -> serde_json::Value {
    serde_json::json!({
        "code": "verify_it",
        "url": "https://pan.bitqiu.com/login?c=verify_it"
    })
}

#[tokio::test(start_paused = true)]
async fn full_qr_login_then_authenticated_call() {
    let transport = Arc::new(MockTransport::new());
    // Handshake: ticket issued, one pending poll, then confirmed
    transport.push_success(qr_begin_payload());
    transport.push_qr_status("0");
    transport.push_qr_status_with_cookies("2", "sid_live", "uid_live");
    // First authenticated call succeeds
    transport.push_success(serde_json::json!({ "integral": 5 }));

    let client = Client::with_transport(settings(), transport.clone(), SessionStore::new());
    assert!(!client.is_authenticated());

    let session = client.login_with_qr().await.unwrap();
    assert_eq!(session.token, "sid_live");
    assert!(client.is_authenticated());

    let points = client.daily_signin().await.unwrap();
    assert_eq!(points, Some(5));

    // The authenticated call carried the fresh token
    let last = transport.last_request().unwrap();
    let auth = last.auth.unwrap();
    assert_eq!(auth.sid, "sid_live");
    assert_eq!(auth.uid, "uid_live");
}

#[tokio::test(start_paused = true)]
async fn qr_timeout_leaves_store_absent() {
    let transport = Arc::new(MockTransport::new());
    transport.push_success(qr_begin_payload());
    for _ in 0..70 {
        transport.push_qr_status("0");
    }

    let client = Client::with_transport(settings(), transport, SessionStore::new());
    let result = client.login_with_qr().await;

    match result {
        Err(Error::Authentication(reason)) => assert!(reason.contains("timed out")),
        other => panic!("expected timeout, got {other:?}"),
    }
    assert!(!client.is_authenticated());
}

#[tokio::test(start_paused = true)]
async fn expired_session_triggers_one_reauth_then_retry() {
    let transport = Arc::new(MockTransport::new());
    // 1. operation hits an expired session
    transport.push_session_expired();
    // 2. automatic reauthentication handshake
    transport.push_success(qr_begin_payload());
    transport.push_qr_status_with_cookies("2", "sid_fresh", "uid_fresh");
    // 3. the same operation retried once, now succeeding
    transport.push_success(serde_json::json!({}));

    let store = SessionStore::new();
    store.set(SessionBuilder::new().token("sid_stale").build());

    let client = Client::with_transport(settings(), transport.clone(), store);
    client
        .rename_resource("res_1", "renamed.txt", false)
        .await
        .unwrap();

    // The retried call used the fresh credentials
    let requests = transport.requests();
    let retried = requests.last().unwrap();
    assert_eq!(retried.path, "/resource/rename");
    assert_eq!(retried.auth.as_ref().unwrap().sid, "sid_fresh");
    // expiry -> begin -> poll -> retry
    assert_eq!(transport.call_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn second_consecutive_expiry_is_fatal() {
    let transport = Arc::new(MockTransport::new());
    transport.push_session_expired();
    transport.push_success(qr_begin_payload());
    transport.push_qr_status_with_cookies("2", "sid_fresh", "uid_fresh");
    // The retry also reports expiry: must escalate, not loop
    transport.push_session_expired();

    let store = SessionStore::new();
    store.set(SessionBuilder::new().token("sid_stale").build());

    let client = Client::with_transport(settings(), transport.clone(), store);
    let result = client.daily_signin().await;

    match result {
        Err(Error::Authentication(reason)) => {
            assert!(reason.contains("after reauthentication"));
        }
        other => panic!("expected fatal authentication error, got {other:?}"),
    }
    assert_eq!(transport.call_count(), 4);
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn session_persists_across_client_instances() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let mut settings = settings();
    settings.session.store_path = Some(path.clone());

    let transport = Arc::new(MockTransport::new());
    transport.push_success(qr_begin_payload());
    transport.push_qr_status_with_cookies("2", "sid_saved", "uid_saved");

    let first = Client::with_transport(settings.clone(), transport.clone(), SessionStore::new());
    first.login_with_qr().await.unwrap();

    // A new client restores the session from disk, no handshake needed
    let restored_store = SessionStore::load(&path);
    let second = Client::with_transport(settings.clone(), transport.clone(), restored_store);
    assert!(second.is_authenticated());
    assert_eq!(second.store().get().unwrap().token, "sid_saved");

    // Logout removes the persisted record too
    second.logout();
    assert!(SessionStore::load(&path).get().is_none());
}

#[tokio::test]
async fn listing_pages_through_results_with_one_classification_path() {
    let transport = Arc::new(MockTransport::new());
    transport.push_success(TestFixtures::resource_page(&["one.txt", "two.txt"], true));
    transport.push_success(TestFixtures::resource_page(&["three.txt"], false));

    let store = SessionStore::new();
    store.set(SessionBuilder::new().root_dir("root_x").build());

    let client = Client::with_transport(settings(), transport, store);
    let resources = client
        .list_resources(None, SortField::Name, true)
        .await
        .unwrap();

    let names: Vec<&str> = resources.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["one.txt", "two.txt", "three.txt"]);
}

#[tokio::test]
async fn provider_rejection_passes_code_and_message_through() {
    let transport = Arc::new(MockTransport::new());
    transport.push_failure("10412", "invalid directory id");

    let store = SessionStore::new();
    store.set(TestFixtures::session());

    let client = Client::with_transport(settings(), transport, store.clone());
    let result = client.download_url("file_404").await;

    match result {
        Err(Error::Api { code, message }) => {
            assert_eq!(code, "10412");
            assert_eq!(message, "invalid directory id");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    // A non-expiry rejection must not disturb the session
    assert!(store.get().is_some());
}

#[tokio::test]
async fn network_failure_surfaces_without_retry() {
    let transport = Arc::new(MockTransport::new());
    transport.push_network_error("connection refused");

    let store = SessionStore::new();
    store.set(TestFixtures::session());

    let client = Client::with_transport(settings(), transport.clone(), store);
    let result = client.daily_signin().await;

    assert!(matches!(result, Err(Error::Network(_))));
    assert_eq!(transport.call_count(), 1);
}
