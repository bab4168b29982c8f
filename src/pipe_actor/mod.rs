//! Actor that runs HTTP requests on behalf of other actors.
//!
//! Hand it an [`Envelope`] and the completed envelope ends up at its parent. Useful when
//! the actor that wants the result is not the one that decides to make the call.

use crate::dispatcher::HttpDispatcher;
use crate::envelope::Envelope;
use crate::framework::{spawn_actor, Actor, ActorContext, ActorRef};
use crate::message::Message;
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub struct HttpPipeActor {
    dispatcher: HttpDispatcher,
    submitted: u64,
}

impl HttpPipeActor {
    pub fn new(dispatcher: HttpDispatcher) -> Self {
        Self {
            dispatcher,
            submitted: 0,
        }
    }

    async fn forward_to_parent(&self, envelope: Envelope, ctx: &ActorContext) {
        let Some(parent) = ctx.parent() else {
            warn!(actor = %ctx.self_ref(), key = envelope.key(), "Dead letter: pipe has no parent");
            return;
        };
        debug!(actor = %ctx.self_ref(), parent = %parent, key = envelope.key(), "Forward");
        if let Err(e) = parent
            .tell(Message::Envelope(envelope), Some(ctx.self_ref()))
            .await
        {
            warn!(error = %e, "Dead letter: pipe parent has stopped");
        }
    }

    fn submit(&mut self, envelope: Envelope, ctx: &ActorContext) {
        let me = ctx.self_ref();
        let fresh = Envelope::with_tag(me.clone(), envelope.request, envelope.tag);
        self.submitted += 1;
        debug!(actor = %me, submitted = self.submitted, "Submit");
        self.dispatcher.dispatch(fresh, me);
    }
}

#[async_trait]
impl Actor for HttpPipeActor {
    async fn receive(&mut self, message: Message, ctx: &ActorContext) {
        match message {
            Message::Envelope(envelope) if ctx.is_from_self() => {
                self.forward_to_parent(envelope, ctx).await
            }
            Message::Envelope(envelope) => self.submit(envelope, ctx),
            other => self.unhandled(other, ctx).await,
        }
    }
}

/// Spawns a pipe actor whose completed envelopes go to `parent`.
pub fn spawn(
    dispatcher: HttpDispatcher,
    path: &str,
    buffer_size: usize,
    parent: Option<ActorRef>,
) -> (ActorRef, JoinHandle<()>) {
    spawn_actor(HttpPipeActor::new(dispatcher), path, buffer_size, parent)
}
