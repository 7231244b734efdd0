//! Single-shot completion of a dispatched event.

use std::time::Duration;

use tokio::sync::oneshot;

use crate::app::HandlerError;
use crate::http::response::{DispatchError, ResponseDescriptor};

/// What a handler hands back through `done`.
pub type DispatchOutcome = Result<ResponseDescriptor, HandlerError>;

/// The `done` side handed to the handler alongside the event.
#[derive(Debug)]
pub struct DispatchContext {
    tx: oneshot::Sender<DispatchOutcome>,
}

/// The adapter's side, awaiting the handler's outcome.
#[derive(Debug)]
pub struct Completion {
    rx: oneshot::Receiver<DispatchOutcome>,
}

impl DispatchContext {
    /// Create a linked context/completion pair.
    pub fn channel() -> (Self, Completion) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, Completion { rx })
    }

    /// Complete the dispatch. Consumes the context.
    pub fn done(self, outcome: DispatchOutcome) {
        if self.tx.send(outcome).is_err() {
            tracing::warn!("Handler completed after the request was already answered");
        }
    }

    pub fn succeed(self, response: ResponseDescriptor) {
        self.done(Ok(response));
    }

    pub fn fail(self, error: impl Into<HandlerError>) {
        self.done(Err(error.into()));
    }
}

impl Completion {
    /// Wait for the handler. `None` waits indefinitely.
    pub async fn wait(self, timeout: Option<Duration>) -> Result<ResponseDescriptor, DispatchError> {
        let received = match timeout {
            Some(limit) => tokio::time::timeout(limit, self.rx)
                .await
                .map_err(|_| DispatchError::Timeout(limit))?,
            None => self.rx.await,
        };

        match received {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) => Err(DispatchError::Handler(err)),
            Err(_) => Err(DispatchError::Abandoned),
        }
    }
}
