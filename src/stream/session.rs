use super::listener::StreamListener;
use crate::message::StreamFailure;
use crate::model::HttpRequest;
use crate::transport::{EventStream, Transport, TransportError};
use futures::StreamExt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::debug;

/// Cancellation handle for one open stream.
///
/// Clone it freely; cancelling through any clone tears the stream down. Dropping every
/// handle does not cancel, the stream then runs until the server ends it.
#[derive(Debug, Clone)]
pub struct StreamHandle {
    cancel: Arc<watch::Sender<bool>>,
}

impl StreamHandle {
    /// Tears the stream down. Idempotent; a no-op once the stream has ended.
    pub fn cancel(&self) {
        if !self.cancel.send_replace(true) {
            debug!("Stream cancel requested");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }
}

/// The task that pumps one stream from the transport into its listener.
pub struct StreamSession {
    transport: Arc<dyn Transport>,
    listener: StreamListener,
    cancelled: watch::Receiver<bool>,
}

impl StreamSession {
    /// Starts the session on `runtime` and returns its handle immediately.
    pub fn spawn(
        runtime: &Handle,
        transport: Arc<dyn Transport>,
        request: HttpRequest,
        listener: StreamListener,
    ) -> StreamHandle {
        let (cancel, cancelled) = watch::channel(false);
        let session = Self {
            transport,
            listener,
            cancelled,
        };
        runtime.spawn(session.run(request));
        StreamHandle {
            cancel: Arc::new(cancel),
        }
    }

    async fn run(mut self, request: HttpRequest) {
        let opened = tokio::select! {
            biased;
            _ = wait_cancelled(&mut self.cancelled) => {
                self.listener.on_failure(StreamFailure::cancelled()).await;
                return;
            }
            opened = self.transport.event_stream(request) => opened,
        };

        let EventStream {
            response,
            mut events,
        } = match opened {
            Ok(stream) => stream,
            Err(failure) => {
                self.listener.on_failure(failure).await;
                return;
            }
        };
        self.listener.on_open().await;

        loop {
            tokio::select! {
                biased;
                _ = wait_cancelled(&mut self.cancelled) => {
                    let failure =
                        StreamFailure::new(Some(TransportError::Cancelled), Some(response));
                    self.listener.on_failure(failure).await;
                    return;
                }
                next = events.next() => match next {
                    Some(Ok(event)) => self.listener.on_event(event).await,
                    Some(Err(cause)) => {
                        let failure = StreamFailure::new(Some(cause), Some(response));
                        self.listener.on_failure(failure).await;
                        return;
                    }
                    None => {
                        self.listener.on_closed().await;
                        return;
                    }
                },
            }
        }
    }
}

/// Resolves once cancel is requested; never resolves if every handle is gone.
async fn wait_cancelled(cancelled: &mut watch::Receiver<bool>) {
    let senders_gone = cancelled.wait_for(|c| *c).await.is_err();
    if senders_gone {
        std::future::pending::<()>().await;
    }
}
