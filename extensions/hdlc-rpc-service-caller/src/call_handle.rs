use crate::{RpcCallTarget, RpcServiceCallerInterface, WithDispatcher, error::RpcCallerError};
use hdlc_rpc::rpc::{RpcCallEvent, RpcCallKey, RpcCallShape, RpcStatus};
use std::sync::{
    Arc, OnceLock,
    atomic::{AtomicBool, Ordering},
};

/// Client-side ownership of one open call.
///
/// Dropping the handle cancels the call unless it already reached a terminal
/// state.
pub(crate) struct RpcCallHandle<D: WithDispatcher> {
    key: RpcCallKey,
    dispatcher: Arc<D>,
    emit: Arc<dyn Fn(Vec<u8>) + Send + Sync>,

    /// Set by the event handler, under the dispatcher lock, when the call
    /// ends.
    terminal_status: Arc<OnceLock<RpcStatus>>,

    cancelled_locally: AtomicBool,
}

/// Status a terminal event completes the call with.
fn terminal_status(event: &RpcCallEvent) -> Option<RpcStatus> {
    match event {
        RpcCallEvent::Payload(_) => None,
        RpcCallEvent::Completed { status, .. } => Some(*status),
        RpcCallEvent::Cancelled => Some(RpcStatus::Cancelled),
        RpcCallEvent::TransportClosed => Some(RpcStatus::Aborted),
    }
}

/// Opens a call on `client` and wraps it in a handle.
///
/// `on_event` sees every event after the handle's terminal status has been
/// recorded. It runs under the dispatcher lock and must not block.
pub(crate) fn start_call<C, H>(
    client: &C,
    target: RpcCallTarget,
    shape: RpcCallShape,
    payload: Vec<u8>,
    mut on_event: H,
) -> Result<RpcCallHandle<C::DispatcherLock>, RpcCallerError>
where
    C: RpcServiceCallerInterface + ?Sized,
    H: FnMut(RpcCallEvent) + Send + 'static,
{
    let dispatcher = client.get_dispatcher();
    let emit = client.get_emit_fn();
    let terminal = Arc::new(OnceLock::new());

    let key = dispatcher.with_dispatcher(|d| {
        // Checked under the lock so a concurrent close cannot miss this call
        if !client.is_connected() {
            return Err(RpcCallerError::TransportClosed);
        }

        let terminal = terminal.clone();
        d.start_call(
            target.to_request(shape, payload),
            |bytes: &[u8]| emit(bytes.to_vec()),
            move |event: RpcCallEvent| {
                if let Some(status) = terminal_status(&event) {
                    let _ = terminal.set(status);
                }
                on_event(event);
            },
        )
        .map_err(RpcCallerError::from)
    })?;

    Ok(RpcCallHandle {
        key,
        dispatcher,
        emit,
        terminal_status: terminal,
        cancelled_locally: AtomicBool::new(false),
    })
}

impl<D: WithDispatcher> RpcCallHandle<D> {
    pub(crate) fn key(&self) -> RpcCallKey {
        self.key
    }

    pub(crate) fn status(&self) -> Option<RpcStatus> {
        self.terminal_status.get().copied()
    }

    pub(crate) fn was_cancelled_locally(&self) -> bool {
        self.cancelled_locally.load(Ordering::Acquire)
    }

    pub(crate) fn send(&self, payload: Vec<u8>) -> Result<(), RpcCallerError> {
        self.dispatcher.with_dispatcher(|d| {
            // Once terminal, the key may belong to a newer call
            if self.terminal_status.get().is_some() {
                return Err(RpcCallerError::CallClosed);
            }
            d.send_client_stream(&self.key, payload, |bytes: &[u8]| {
                (self.emit)(bytes.to_vec())
            })
            .map_err(RpcCallerError::from)
        })
    }

    pub(crate) fn finish(&self) -> Result<(), RpcCallerError> {
        self.dispatcher.with_dispatcher(|d| {
            if self.terminal_status.get().is_some() {
                return Err(RpcCallerError::CallClosed);
            }
            d.finish_client_stream(&self.key, |bytes: &[u8]| (self.emit)(bytes.to_vec()))
                .map_err(RpcCallerError::from)
        })
    }

    /// Returns `true` if this invocation cancelled the call.
    pub(crate) fn cancel(&self) -> bool {
        let cancelled = self.dispatcher.with_dispatcher(|d| {
            if self.terminal_status.get().is_some() {
                return false;
            }
            d.cancel(&self.key, |bytes: &[u8]| (self.emit)(bytes.to_vec()))
        });

        if cancelled {
            self.cancelled_locally.store(true, Ordering::Release);
            tracing::trace!("Cancelled call ({})", self.key);
        }

        cancelled
    }
}

impl<D: WithDispatcher> Drop for RpcCallHandle<D> {
    fn drop(&mut self) {
        self.cancel();
    }
}
