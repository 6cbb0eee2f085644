//! Request/response messaging between page contexts and the coordinator.

pub mod channel;
pub mod protocol;

pub use channel::{ChannelClient, spawn_endpoint};
pub use protocol::{
    OpenLinksOutcome, OpenLinksRequest, RegisterReason, RegistrationOutcome, Request, Response,
};

use crate::error::TransportError;
use std::future::Future;
use std::pin::Pin;

pub type ReplyFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Response, TransportError>> + Send + 'a>>;

/// Page-side handle for talking to the coordinator.
pub trait CoordinatorClient: Send + Sync {
    fn send(&self, request: Request) -> ReplyFuture<'_>;
}

impl dyn CoordinatorClient {
    pub async fn register_origin(
        &self,
        origin: impl Into<String>,
    ) -> Result<RegistrationOutcome, TransportError> {
        match self
            .send(Request::RegisterOrigin {
                origin: origin.into(),
            })
            .await?
        {
            Response::Registration(outcome) => Ok(outcome),
            Response::Opened(_) => Err(TransportError::UnexpectedReply {
                request: "REGISTER_ORIGIN",
            }),
        }
    }

    pub async fn open_links(
        &self,
        request: OpenLinksRequest,
    ) -> Result<OpenLinksOutcome, TransportError> {
        match self.send(Request::OpenLinks(request)).await? {
            Response::Opened(outcome) => Ok(outcome),
            Response::Registration(_) => Err(TransportError::UnexpectedReply {
                request: "OPEN_LINKS",
            }),
        }
    }
}
