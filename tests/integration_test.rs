//! End-to-end tests against a real HTTP server with the reqwest transport.

use actor_http::framework::mock::{create_mock_actor, drain, expect_delivery, expect_envelope};
use actor_http::framework::Delivery;
use actor_http::lifecycle::GatewaySystem;
use actor_http::message::{Message, StreamData};
use actor_http::model::{HttpRequest, DEFAULT_USER_AGENT};
use actor_http::transport::{TransportConfig, TransportError};
use actor_http::Envelope;
use httpmock::Method::{GET, POST};
use httpmock::MockServer;
use serde_json::json;
use std::time::Duration;

const QUIET: Duration = Duration::from_millis(200);

/// Waits for the first delivery, then collects the rest until the mailbox goes quiet.
async fn collect(rx: &mut tokio::sync::mpsc::Receiver<Delivery>) -> Vec<Delivery> {
    let Some(first) = expect_delivery(rx).await else {
        return Vec::new();
    };
    let mut seen = vec![first];
    seen.extend(drain(rx, QUIET).await);
    seen
}

fn gateway() -> GatewaySystem {
    let config = TransportConfig::default()
        .connect_timeout(Duration::from_secs(2))
        .read_timeout(Duration::from_secs(5));
    GatewaySystem::new(config).expect("Failed to build gateway")
}

#[tokio::test]
async fn test_get_ok_through_pipe_actor() {
    let server = MockServer::start_async().await;
    let ok = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/ok")
                .header("user-agent", DEFAULT_USER_AGENT);
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({ "status": "fine" }));
        })
        .await;

    let mut system = gateway();
    let (app, mut inbox) = create_mock_actor("app", 8);
    let pipe = system.spawn_pipe("pipe", Some(app.clone()));

    let request = HttpRequest::get(&server.url("/ok")).unwrap();
    pipe.tell(Message::Envelope(Envelope::new(app.clone(), request)), Some(&app))
        .await
        .unwrap();

    let (envelope, sender) = expect_envelope(&mut inbox).await.expect("Expected envelope");
    assert_eq!(sender, Some(pipe.clone()));
    let response = envelope.response().expect("response set");
    assert_eq!(response.status, 200);
    assert_eq!(
        response.json::<serde_json::Value>().unwrap(),
        json!({ "status": "fine" })
    );
    ok.assert_hits_async(1).await;

    drop((envelope, sender, pipe));
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unreachable_host_sets_failure() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let system = gateway();
    let (app, mut inbox) = create_mock_actor("app", 8);
    system
        .dispatcher()
        .get(&format!("http://127.0.0.1:{port}/"), &app)
        .unwrap();

    let (envelope, _) = expect_envelope(&mut inbox).await.expect("Expected envelope");
    assert!(envelope.response().is_none());
    assert!(matches!(envelope.failure(), Some(TransportError::Connect(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_blocking_post_json() {
    let server = MockServer::start_async().await;
    let created = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/items")
                .header("content-type", "application/json")
                .json_body(json!({ "name": "widget" }));
            then.status(201).body("created");
        })
        .await;

    let system = gateway();
    let dispatcher = system.dispatcher().clone();
    let url = server.url("/items");
    let response = tokio::task::spawn_blocking(move || {
        let no_headers = Vec::<(String, String)>::new();
        let body = json!({ "name": "widget" });
        let request = HttpRequest::post_json(&url, &body, no_headers).unwrap();
        dispatcher.request_blocking(request)
    })
    .await
    .unwrap()
    .expect("Expected response");

    assert_eq!(response.status, 201);
    assert_eq!(response.text(), "created");
    created.assert_async().await;
}

#[tokio::test]
async fn test_event_stream_delivers_start_data_end() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/events")
                .header("accept", "text/event-stream");
            then.status(200)
                .header("content-type", "text/event-stream")
                .body("id: 1\nevent: msg\ndata: hello\n\n");
        })
        .await;

    let system = gateway();
    let (consumer, mut consumer_rx) = create_mock_actor("consumer", 16);
    let (owner, mut owner_rx) = create_mock_actor("owner", 16);
    let _handle = system.dispatcher().open_stream(
        HttpRequest::get(&server.url("/events")).unwrap(),
        consumer,
        owner,
    );

    let seen = collect(&mut consumer_rx).await;
    let kinds: Vec<_> = seen.iter().map(|d| d.message.kind()).collect();
    assert_eq!(kinds, vec!["StreamStart", "StreamData", "StreamEnd"]);
    match &seen[1].message {
        Message::StreamData(data) => assert_eq!(
            data,
            &StreamData::new(Some("1".into()), Some("msg".into()), "hello")
        ),
        other => panic!("Expected StreamData, got {}", other.kind()),
    }

    let owner_kinds: Vec<_> = collect(&mut owner_rx)
        .await
        .iter()
        .map(|d| d.message.kind())
        .collect();
    assert_eq!(owner_kinds, vec!["StreamEnd"]);
}

#[tokio::test]
async fn test_event_stream_rejects_error_status_and_wrong_content_type() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/missing");
            then.status(404);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/plain");
            then.status(200)
                .header("content-type", "text/plain")
                .body("not a stream");
        })
        .await;

    let system = gateway();
    let (consumer, mut consumer_rx) = create_mock_actor("consumer", 16);
    let (owner, _owner_rx) = create_mock_actor("owner", 16);

    let _missing = system.dispatcher().open_stream(
        HttpRequest::get(&server.url("/missing")).unwrap(),
        consumer.clone(),
        owner.clone(),
    );
    let seen = collect(&mut consumer_rx).await;
    assert_eq!(seen.len(), 1);
    let Message::StreamFailure(failure) = &seen[0].message else {
        panic!("Expected StreamFailure, got {}", seen[0].message.kind());
    };
    assert_eq!(failure.cause, None);
    assert_eq!(failure.response.as_ref().map(|r| r.status), Some(404));

    let _plain = system.dispatcher().open_stream(
        HttpRequest::get(&server.url("/plain")).unwrap(),
        consumer,
        owner,
    );
    let seen = collect(&mut consumer_rx).await;
    assert_eq!(seen.len(), 1);
    let Message::StreamFailure(failure) = &seen[0].message else {
        panic!("Expected StreamFailure, got {}", seen[0].message.kind());
    };
    assert!(matches!(failure.cause, Some(TransportError::Protocol(_))));
    assert_eq!(failure.response.as_ref().map(|r| r.status), Some(200));
}
