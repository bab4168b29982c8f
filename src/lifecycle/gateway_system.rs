use crate::dispatcher::{GatewayError, HttpDispatcher};
use crate::framework::{spawn_actor, Actor, ActorRef, DEFAULT_MAILBOX_SIZE};
use crate::pipe_actor;
use crate::transport::{ReqwestTransport, Transport, TransportConfig};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Owns the shared transport, the dispatcher and every actor it spawned.
///
/// # Example
///
/// ```ignore
/// let mut system = GatewaySystem::new(TransportConfig::default())?;
/// let (app, mut inbox) = create_mock_actor("app", 32);
/// let pipe = system.spawn_pipe("pipe", Some(app.clone()));
///
/// let request = HttpRequest::get("http://example.test/ok")?;
/// pipe.tell(Message::Envelope(Envelope::new(app.clone(), request)), Some(&app)).await?;
/// // ... the completed envelope arrives in `inbox` ...
///
/// drop(pipe);
/// system.shutdown().await?;
/// ```
pub struct GatewaySystem {
    dispatcher: HttpDispatcher,
    mailbox_size: usize,
    handles: Vec<JoinHandle<()>>,
}

impl GatewaySystem {
    /// Builds the process-wide [`ReqwestTransport`] from `config`.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(config: TransportConfig) -> Result<Self, GatewayError> {
        let transport = ReqwestTransport::new(config)?;
        Self::with_transport(Arc::new(transport))
    }

    /// Uses an existing transport, e.g. a [`MockTransport`](crate::transport::mock::MockTransport).
    pub fn with_transport(transport: Arc<dyn Transport>) -> Result<Self, GatewayError> {
        Ok(Self {
            dispatcher: HttpDispatcher::new(transport)?,
            mailbox_size: DEFAULT_MAILBOX_SIZE,
            handles: Vec::new(),
        })
    }

    /// Mailbox capacity for actors spawned from now on.
    pub fn with_mailbox_size(mut self, mailbox_size: usize) -> Self {
        self.mailbox_size = mailbox_size;
        self
    }

    pub fn dispatcher(&self) -> &HttpDispatcher {
        &self.dispatcher
    }

    /// Spawns an [`HttpPipeActor`](crate::pipe_actor::HttpPipeActor) reporting to `parent`.
    pub fn spawn_pipe(&mut self, path: &str, parent: Option<ActorRef>) -> ActorRef {
        let (actor_ref, handle) =
            pipe_actor::spawn(self.dispatcher.clone(), path, self.mailbox_size, parent);
        self.handles.push(handle);
        actor_ref
    }

    /// Spawns any actor and tracks it for shutdown.
    pub fn spawn<A: Actor>(&mut self, actor: A, path: &str, parent: Option<ActorRef>) -> ActorRef {
        let (actor_ref, handle) = spawn_actor(actor, path, self.mailbox_size, parent);
        self.handles.push(handle);
        actor_ref
    }

    /// Waits for every spawned actor to stop.
    ///
    /// Actors stop once all references to them are gone, so drop the refs returned by
    /// `spawn*` first. Requests still in flight keep their envelope's recipient alive
    /// until they complete.
    pub async fn shutdown(self) -> Result<(), GatewayError> {
        info!(actors = self.handles.len(), "Shutting down gateway...");
        drop(self.dispatcher);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(GatewayError::ActorFailed(e.to_string()));
            }
        }

        info!("Gateway shutdown complete.");
        Ok(())
    }
}
