use crate::{WithDispatcher, call_handle::RpcCallHandle, error::RpcCallerError};
use futures::{
    Stream, StreamExt,
    channel::mpsc::UnboundedReceiver,
    ready,
    task::{Context, Poll},
};
use hdlc_rpc::rpc::{RpcCallEvent, RpcCallKey, RpcStatus};
use std::pin::Pin;

/// A bidirectional-stream call in progress.
///
/// Requests go out with [`send`](Self::send) and [`finish`](Self::finish).
/// Responses are read by polling the call as a [`Stream`]:
///
/// - each streamed response yields `Some(Ok(payload))`, in arrival order;
/// - an OK completion ends the stream with `None`;
/// - any other ending yields exactly one `Some(Err(..))` (`RemoteError`,
///   `Cancelled` or `TransportClosed`), then `None`.
///
/// Dropping the call cancels it if it has not ended yet.
pub struct RpcStreamingCall<D: WithDispatcher> {
    handle: RpcCallHandle<D>,
    events: UnboundedReceiver<RpcCallEvent>,
    is_done: bool,
}

impl<D: WithDispatcher> RpcStreamingCall<D> {
    pub(crate) fn new(handle: RpcCallHandle<D>, events: UnboundedReceiver<RpcCallEvent>) -> Self {
        Self {
            handle,
            events,
            is_done: false,
        }
    }

    pub fn key(&self) -> RpcCallKey {
        self.handle.key()
    }

    /// Sends one request message.
    ///
    /// Fails with [`RpcCallerError::CallClosed`] once the call has ended or
    /// its client stream was finished.
    pub fn send(&self, payload: Vec<u8>) -> Result<(), RpcCallerError> {
        self.handle.send(payload)
    }

    /// Tells the server no more requests will follow. Responses keep
    /// arriving until the server ends the call.
    pub fn finish(&self) -> Result<(), RpcCallerError> {
        self.handle.finish()
    }

    /// Cancels the call.
    ///
    /// Idempotent. Responses that were received but not yet read are
    /// discarded and the stream yields [`RpcCallerError::Cancelled`] next.
    /// Returns `false` if the call had already ended.
    pub fn cancel(&self) -> bool {
        self.handle.cancel()
    }

    /// Terminal status, once the call has ended.
    ///
    /// Local cancellation reports `CANCELLED`; a closed transport reports
    /// `ABORTED`.
    pub fn status(&self) -> Option<RpcStatus> {
        self.handle.status()
    }

    fn finish_with(
        &mut self,
        item: Option<Result<Vec<u8>, RpcCallerError>>,
    ) -> Poll<Option<Result<Vec<u8>, RpcCallerError>>> {
        self.is_done = true;
        self.events.close();
        Poll::Ready(item)
    }
}

impl<D: WithDispatcher> Stream for RpcStreamingCall<D> {
    type Item = Result<Vec<u8>, RpcCallerError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.is_done {
            return Poll::Ready(None);
        }

        if this.handle.was_cancelled_locally() {
            return this.finish_with(Some(Err(RpcCallerError::Cancelled)));
        }

        match ready!(this.events.poll_next_unpin(cx)) {
            Some(RpcCallEvent::Payload(payload)) => Poll::Ready(Some(Ok(payload))),
            Some(RpcCallEvent::Completed { status, .. }) if status.is_ok() => {
                this.finish_with(None)
            }
            Some(RpcCallEvent::Completed { status, .. }) => {
                this.finish_with(Some(Err(RpcCallerError::RemoteError { status })))
            }
            Some(RpcCallEvent::Cancelled) => this.finish_with(Some(Err(RpcCallerError::Cancelled))),
            Some(RpcCallEvent::TransportClosed) | None => {
                this.finish_with(Some(Err(RpcCallerError::TransportClosed)))
            }
        }
    }
}
