//! Fetches one URL through a pipe actor and prints the outcome.
//!
//! ```bash
//! RUST_LOG=info cargo run -- https://example.com
//! ```

use actor_http::framework::{Actor, ActorContext};
use actor_http::lifecycle::{setup_tracing, GatewaySystem};
use actor_http::model::HttpRequest;
use actor_http::transport::TransportConfig;
use actor_http::{Envelope, Message};
use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::{error, info, Instrument};

/// Reports the first completed envelope it receives.
struct Reporter {
    done: Option<oneshot::Sender<()>>,
}

#[async_trait]
impl Actor for Reporter {
    async fn receive(&mut self, message: Message, ctx: &ActorContext) {
        match message {
            Message::Envelope(envelope) if envelope.is_complete() => {
                match (envelope.response(), envelope.failure()) {
                    (Some(response), _) => info!(
                        url = %response.url,
                        status = response.status,
                        bytes = response.body.len(),
                        "Fetched"
                    ),
                    (_, Some(failure)) => error!(error = %failure, "Fetch failed"),
                    _ => {}
                }
                if let Some(done) = self.done.take() {
                    let _ = done.send(());
                }
            }
            other => self.unhandled(other, ctx).await,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://example.com".to_string());
    info!(%url, "Starting gateway");

    let mut system = GatewaySystem::new(TransportConfig::default()).map_err(|e| e.to_string())?;

    let (done_tx, done_rx) = oneshot::channel();
    let reporter = system.spawn(Reporter { done: Some(done_tx) }, "reporter", None);
    let pipe = system.spawn_pipe("pipe", Some(reporter.clone()));

    let request = HttpRequest::get(&url).map_err(|e| e.to_string())?;
    let span = tracing::info_span!("fetch");
    async {
        pipe.tell(
            Message::Envelope(Envelope::new(reporter.clone(), request)),
            Some(&reporter),
        )
        .await
        .map_err(|e| e.to_string())?;
        done_rx.await.map_err(|e| e.to_string())
    }
    .instrument(span)
    .await?;

    drop(pipe);
    drop(reporter);
    system.shutdown().await.map_err(|e| e.to_string())?;

    info!("Done");
    Ok(())
}
