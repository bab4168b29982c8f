use super::error::DuplexError;
use super::handler::{
    CloseReason, SocketSession, WebSocketHandler, CLOSE_ABNORMAL, CLOSE_NO_STATUS,
};
use crate::framework::DEFAULT_MAILBOX_SIZE;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{timeout, timeout_at, Instant};
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, instrument, warn};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long a local close waits for the peer's Close frame before reporting 1006.
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

enum Command {
    Text(String, oneshot::Sender<Result<(), DuplexError>>),
    Close,
}

/// A text-frame WebSocket client whose callbacks go to a [`WebSocketHandler`].
///
/// Writes and reads run on separate tasks, so a handler that is slow to accept inbound
/// text never holds up [`WebSocketClient::send`]. Dropping the client closes the
/// connection from the local side.
pub struct WebSocketClient {
    session: SocketSession,
    commands: mpsc::Sender<Command>,
    task: JoinHandle<()>,
}

impl WebSocketClient {
    /// Connects to `url` and completes the opening handshake.
    ///
    /// `handler.on_open` has run by the time this returns.
    #[instrument(skip(handler))]
    pub async fn connect<H: WebSocketHandler>(url: &str, handler: H) -> Result<Self, DuplexError> {
        let (socket, response) = connect_async(url)
            .await
            .map_err(|e| DuplexError::Handshake(e.to_string()))?;
        debug!(status = response.status().as_u16(), "Handshake complete");

        let session = SocketSession::new(url);
        let handler = Arc::new(handler);
        info!(session = session.id(), "Socket opened");
        handler.on_open(&session).await;

        let (sink, stream) = socket.split();
        let (commands, inbox) = mpsc::channel(DEFAULT_MAILBOX_SIZE);
        let writer = tokio::spawn(write_frames(sink, inbox, session.clone()));
        let task = tokio::spawn(read_frames(stream, writer, handler, session.clone()));
        Ok(Self {
            session,
            commands,
            task,
        })
    }

    pub fn session(&self) -> &SocketSession {
        &self.session
    }

    pub fn is_open(&self) -> bool {
        self.session.is_open()
    }

    /// Sends one text frame.
    pub async fn send(&self, text: impl Into<String>) -> Result<(), DuplexError> {
        if !self.is_open() {
            return Err(DuplexError::NotOpen);
        }
        let (ack, done) = oneshot::channel();
        self.commands
            .send(Command::Text(text.into(), ack))
            .await
            .map_err(|_| DuplexError::NotOpen)?;
        done.await.map_err(|_| DuplexError::NotOpen)?
    }

    /// Starts the closing handshake. Idempotent.
    pub async fn close(&self) {
        if self.session.mark_closed() {
            let _ = self.commands.send(Command::Close).await;
        }
    }

    /// Waits until the connection is fully closed and `on_close` has run.
    ///
    /// Bounded by [`CLOSE_TIMEOUT`] once the local side has closed.
    pub async fn closed(self) {
        let Self { commands, task, .. } = self;
        drop(commands);
        if let Err(e) = task.await {
            warn!(error = %e, "Socket task failed");
        }
    }
}

/// Owns the write half. Ends after a local close or when the client is dropped.
async fn write_frames(
    mut sink: SplitSink<Socket, WsMessage>,
    mut commands: mpsc::Receiver<Command>,
    session: SocketSession,
) {
    while let Some(command) = commands.recv().await {
        match command {
            Command::Text(text, ack) => {
                let sent = sink
                    .send(WsMessage::Text(text))
                    .await
                    .map_err(|e| DuplexError::Send(e.to_string()));
                let _ = ack.send(sent);
            }
            Command::Close => break,
        }
    }

    session.mark_closed();
    if let Err(e) = sink.close().await {
        debug!(session = session.id(), error = %e, "Close frame not sent");
    }
}

/// Owns the read half and the handler. Reports the close exactly once.
async fn read_frames<H: WebSocketHandler>(
    mut stream: SplitStream<Socket>,
    mut writer: JoinHandle<()>,
    handler: Arc<H>,
    session: SocketSession,
) {
    // Set once the writer has sent our Close frame.
    let mut deadline: Option<Instant> = None;

    let reason = loop {
        let incoming = match deadline {
            None => tokio::select! {
                incoming = stream.next() => incoming,
                _ = &mut writer => {
                    deadline = Some(Instant::now() + CLOSE_TIMEOUT);
                    continue;
                }
            },
            Some(at) => match timeout_at(at, stream.next()).await {
                Ok(incoming) => incoming,
                Err(_) => break CloseReason::abnormal("close handshake timed out"),
            },
        };

        match incoming {
            Some(Ok(WsMessage::Text(text))) => handler.on_message(text).await,
            Some(Ok(WsMessage::Close(frame))) => {
                break match frame {
                    Some(frame) => {
                        CloseReason::new(u16::from(frame.code), frame.reason.to_string())
                    }
                    None => CloseReason::new(CLOSE_NO_STATUS, ""),
                };
            }
            // Pings are answered by tungstenite; binary frames are not part of this client.
            Some(Ok(_)) => {}
            Some(Err(e)) => break CloseReason::abnormal(e.to_string()),
            None => break CloseReason::abnormal("connection dropped"),
        }
    };

    session.mark_closed();
    writer.abort();
    if deadline.is_none() && reason.code != CLOSE_ABNORMAL {
        // One more read flushes tungstenite's reply to a peer-initiated close.
        let _ = timeout(CLOSE_TIMEOUT, stream.next()).await;
    }
    info!(session = session.id(), code = reason.code, "Socket closed");
    handler.on_close(&session, reason).await;
}
