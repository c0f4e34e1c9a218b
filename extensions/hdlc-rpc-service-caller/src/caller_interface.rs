use crate::{
    RpcCallTarget, RpcStreamingCall, RpcTransportState, RpcUnaryResponse, WithDispatcher,
    call_handle::start_call, error::RpcCallerError,
};
use futures::channel::{mpsc, oneshot};
use hdlc_rpc::rpc::{RpcCallEvent, RpcCallShape};
use std::sync::Arc;

/// Defines a generic capability for making RPC calls.
///
/// Any struct that can provide a shared `RpcDispatcher` and an `on_emit`
/// function (e.g., a client owning a connection) can implement this trait to
/// gain unary and bidirectional-stream calls.
#[async_trait::async_trait]
pub trait RpcServiceCallerInterface: Send + Sync {
    /// The specific Mutex type used to protect the dispatcher.
    type DispatcherLock: WithDispatcher + 'static;

    // --- METHODS TO BE IMPLEMENTED BY THE STRUCT (e.g., RpcClient) ---

    /// A required method that provides access to the shared dispatcher.
    fn get_dispatcher(&self) -> Arc<Self::DispatcherLock>;

    /// A required method that provides the function for emitting raw bytes
    /// over the underlying transport.
    fn get_emit_fn(&self) -> Arc<dyn Fn(Vec<u8>) + Send + Sync>;

    /// Whether the transport can still carry calls.
    ///
    /// Checked while the dispatcher lock is held; implementations must flip
    /// it under the same lock before failing open calls.
    fn is_connected(&self) -> bool;

    /// Registers a handler for connection state changes, replacing any
    /// previous one.
    fn set_state_change_handler(
        &self,
        handler: impl Fn(RpcTransportState) + Send + Sync + 'static,
    );

    // --- METHODS PROVIDED AUTOMATICALLY BY THE TRAIT ---

    /// Performs a unary call: one request, one terminal response.
    ///
    /// A non-OK status from the server is returned as a response, not an
    /// error. Dropping the returned future before it completes cancels the
    /// call.
    async fn call_unary(
        &self,
        target: RpcCallTarget,
        payload: Vec<u8>,
    ) -> Result<RpcUnaryResponse, RpcCallerError> {
        let (done_tx, done_rx) = oneshot::channel::<RpcCallEvent>();
        let mut done_tx = Some(done_tx);

        let handle = start_call(self, target, RpcCallShape::Unary, payload, move |event| {
            if event.is_terminal() {
                if let Some(tx) = done_tx.take() {
                    let _ = tx.send(event);
                }
            }
        })?;

        let result = match done_rx.await {
            Ok(RpcCallEvent::Completed { status, payload }) => Ok(RpcUnaryResponse {
                status,
                payload: status.is_ok().then_some(payload),
            }),
            Ok(RpcCallEvent::Cancelled) => Err(RpcCallerError::Cancelled),
            Ok(RpcCallEvent::TransportClosed) | Ok(RpcCallEvent::Payload(_)) | Err(_) => {
                Err(RpcCallerError::TransportClosed)
            }
        };

        // Terminal by now, so this does not cancel anything
        drop(handle);

        result
    }

    /// Opens a bidirectional-stream call.
    ///
    /// The initial request carries no payload; messages are sent with
    /// [`RpcStreamingCall::send`].
    async fn invoke_bidirectional(
        &self,
        target: RpcCallTarget,
    ) -> Result<RpcStreamingCall<Self::DispatcherLock>, RpcCallerError> {
        // Unbounded: events are pushed while the dispatcher lock is held
        let (tx, rx) = mpsc::unbounded::<RpcCallEvent>();

        let handle = start_call(
            self,
            target,
            RpcCallShape::BidirectionalStream,
            Vec::new(),
            move |event| {
                let _ = tx.unbounded_send(event);
            },
        )?;

        Ok(RpcStreamingCall::new(handle, rx))
    }
}
