use super::{CoordinatorClient, ReplyFuture, Request, Response};
use crate::coordinator::Coordinator;
use crate::error::TransportError;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

const MAILBOX_CAPACITY: usize = 64;

type Envelope = (Request, oneshot::Sender<Response>);

/// Client end of an in-process coordinator mailbox.
#[derive(Debug, Clone)]
pub struct ChannelClient {
    mailbox: mpsc::Sender<Envelope>,
}

impl CoordinatorClient for ChannelClient {
    fn send(&self, request: Request) -> ReplyFuture<'_> {
        Box::pin(async move {
            let (reply_tx, reply_rx) = oneshot::channel();
            self.mailbox
                .send((request, reply_tx))
                .await
                .map_err(|_| TransportError::Unavailable)?;
            reply_rx.await.map_err(|_| TransportError::NoReply)
        })
    }
}

/// Start serving `coordinator` behind a mailbox and return a client for it.
///
/// Each request is handled on its own task, so a registration waiting on a
/// permission prompt never blocks a dispatch from another page. The endpoint
/// stops once every client is dropped.
pub fn spawn_endpoint(coordinator: Arc<Coordinator>) -> ChannelClient {
    let (mailbox, mut inbox) = mpsc::channel::<Envelope>(MAILBOX_CAPACITY);

    tokio::spawn(async move {
        while let Some((request, reply)) = inbox.recv().await {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move {
                let kind = request.kind();
                let response = coordinator.handle(request).await;
                if reply.send(response).is_err() {
                    tracing::debug!(request = kind, "requester went away before the reply");
                }
            });
        }
        tracing::debug!("coordinator endpoint closed");
    });

    ChannelClient { mailbox }
}
