use actor_http::framework::mock::{create_mock_actor, drain, expect_delivery};
use actor_http::framework::Delivery;
use actor_http::message::{Message, SocketEvent};
use actor_http::websocket::{ActorSocketHandler, DuplexError, WebSocketClient, CLOSE_TIMEOUT};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::{CloseFrame, Message as WsMessage};

/// Echoes text frames back; `bye` makes the server close with 1000 "bye".
async fn echo_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let Ok(mut ws) = accept_async(stream).await else {
                    return;
                };
                while let Some(Ok(frame)) = ws.next().await {
                    match frame {
                        WsMessage::Text(text) if text == "bye" => {
                            let _ = ws
                                .close(Some(CloseFrame {
                                    code: CloseCode::Normal,
                                    reason: "bye".into(),
                                }))
                                .await;
                        }
                        WsMessage::Text(text) => {
                            let _ = ws.send(WsMessage::Text(text)).await;
                        }
                        _ => {}
                    }
                }
            });
        }
    });
    format!("ws://{addr}")
}

/// Completes the handshake, then never reads again.
async fn silent_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = accept_async(stream).await.unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;
        drop(ws);
    });
    format!("ws://{addr}")
}

async fn socket_event(rx: &mut mpsc::Receiver<Delivery>) -> SocketEvent {
    match expect_delivery(rx).await {
        Some(Delivery {
            message: Message::Socket(event),
            sender: None,
        }) => event,
        other => panic!("Expected socket event, got {:?}", other.map(|d| d.message.kind())),
    }
}

#[tokio::test]
async fn test_open_echo_and_local_close() {
    let url = echo_server().await;
    let (actor, mut inbox) = create_mock_actor("socket-consumer", 16);

    let client = WebSocketClient::connect(&url, ActorSocketHandler::new(actor))
        .await
        .expect("Failed to connect");
    let session = client.session().id();
    assert!(client.is_open());

    assert_eq!(
        socket_event(&mut inbox).await,
        SocketEvent::Opened {
            session,
            url: url.clone()
        }
    );

    client.send("hello").await.unwrap();
    assert_eq!(
        socket_event(&mut inbox).await,
        SocketEvent::Text("hello".into())
    );

    client.close().await;
    client.close().await;
    assert!(!client.is_open());
    assert_eq!(client.send("late").await, Err(DuplexError::NotOpen));

    match socket_event(&mut inbox).await {
        SocketEvent::Closed { session: closed, .. } => assert_eq!(closed, session),
        other => panic!("Expected Closed, got {other:?}"),
    }
    client.closed().await;
}

#[tokio::test]
async fn test_server_close_is_reported_with_code_and_reason() {
    let url = echo_server().await;
    let (actor, mut inbox) = create_mock_actor("socket-consumer", 16);

    let client = WebSocketClient::connect(&url, ActorSocketHandler::new(actor))
        .await
        .expect("Failed to connect");
    assert!(matches!(
        socket_event(&mut inbox).await,
        SocketEvent::Opened { .. }
    ));

    client.send("bye").await.unwrap();
    assert_eq!(
        socket_event(&mut inbox).await,
        SocketEvent::Closed {
            session: client.session().id(),
            code: 1000,
            reason: "bye".into()
        }
    );

    assert!(!client.is_open());
    assert_eq!(client.send("anyone?").await, Err(DuplexError::NotOpen));
}

#[tokio::test]
async fn test_failed_handshake_creates_no_client() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let (actor, mut inbox) = create_mock_actor("socket-consumer", 16);

    let result =
        WebSocketClient::connect(&format!("ws://127.0.0.1:{port}"), ActorSocketHandler::new(actor))
            .await;

    assert!(matches!(result, Err(DuplexError::Handshake(_))));
    assert!(inbox.try_recv().is_err());
}

#[tokio::test]
async fn test_send_completes_while_consumer_mailbox_is_full() {
    let url = echo_server().await;
    let (actor, mut inbox) = create_mock_actor("socket-consumer", 2);

    let client = WebSocketClient::connect(&url, ActorSocketHandler::new(actor))
        .await
        .expect("Failed to connect");

    // Opened plus the first echo fill the mailbox; the second echo waits on it.
    client.send("a").await.unwrap();
    client.send("b").await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let sent = tokio::time::timeout(Duration::from_secs(2), client.send("reply")).await;
    assert_eq!(sent, Ok(Ok(())));

    let texts: Vec<SocketEvent> = drain(&mut inbox, Duration::from_millis(200))
        .await
        .into_iter()
        .filter_map(|d| match d.message {
            Message::Socket(event @ SocketEvent::Text(_)) => Some(event),
            _ => None,
        })
        .collect();
    assert_eq!(
        texts,
        vec![
            SocketEvent::Text("a".into()),
            SocketEvent::Text("b".into()),
            SocketEvent::Text("reply".into()),
        ]
    );

    client.close().await;
    client.closed().await;
}

#[tokio::test]
async fn test_close_is_abnormal_when_peer_never_answers() {
    let url = silent_server().await;
    let (actor, mut inbox) = create_mock_actor("socket-consumer", 16);

    let client = WebSocketClient::connect(&url, ActorSocketHandler::new(actor))
        .await
        .expect("Failed to connect");
    let session = client.session().id();
    assert!(matches!(
        socket_event(&mut inbox).await,
        SocketEvent::Opened { .. }
    ));

    client.close().await;
    tokio::time::timeout(CLOSE_TIMEOUT + Duration::from_secs(2), client.closed())
        .await
        .expect("closed() should give up on a silent peer");

    match inbox.try_recv() {
        Ok(Delivery {
            message: Message::Socket(SocketEvent::Closed { session: closed, code, .. }),
            ..
        }) => {
            assert_eq!(closed, session);
            assert_eq!(code, 1006);
        }
        other => panic!("Expected Closed, got {:?}", other.map(|d| d.message.kind())),
    }
}
