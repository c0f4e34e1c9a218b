use hdlc_rpc::rpc::RpcDispatcher;
use std::sync::PoisonError;

/// Closure-passing access to a shared `RpcDispatcher`.
///
/// The caller provides the work to be done via a closure and the
/// implementation is responsible for acquiring its lock, running the closure
/// against the locked dispatcher and releasing the lock. Lock guards never
/// escape, so generic caller code works with whatever mutex a transport
/// picked.
///
/// Access is synchronous. Dispatcher operations never await, and a
/// synchronous lock is what lets a dropped [`RpcStreamingCall`](crate::RpcStreamingCall)
/// cancel its call from `Drop`.
pub trait WithDispatcher: Send + Sync {
    /// Executes a closure against the locked `RpcDispatcher`.
    fn with_dispatcher<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut RpcDispatcher<'static>) -> R;
}

impl WithDispatcher for std::sync::Mutex<RpcDispatcher<'static>> {
    fn with_dispatcher<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut RpcDispatcher<'static>) -> R,
    {
        // A panic in another holder leaves the call table consistent: every
        // dispatcher mutation completes before handlers run.
        let mut guard = self.lock().unwrap_or_else(PoisonError::into_inner);

        f(&mut guard)
    }
}
