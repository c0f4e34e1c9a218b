use crate::error::RpcServiceEndpointError;
use futures::future::BoxFuture;
use hdlc_rpc::constants::max_rpc_payload_size;
use hdlc_rpc::frame::FrameCodec;
use hdlc_rpc::rpc::{RpcCallKey, RpcPacket, RpcStatus};
use hdlc_rpc_service::constants::{DEFAULT_MAX_FRAME_SIZE, DEFAULT_RPC_ADDRESS};
use std::collections::{HashMap, hash_map::Entry};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

pub type RpcUnaryHandler =
    Arc<dyn Fn(Vec<u8>) -> BoxFuture<'static, Result<Vec<u8>, RpcStatus>> + Send + Sync>;

pub type RpcBidirectionalHandler =
    Arc<dyn Fn(RpcServerStream) -> BoxFuture<'static, RpcStatus> + Send + Sync>;

#[derive(Clone)]
pub(crate) enum RpcMethodHandler {
    Unary(RpcUnaryHandler),
    Bidirectional(RpcBidirectionalHandler),
}

/// What a bidirectional handler works with: the client's request messages
/// and a way to stream responses back.
pub struct RpcServerStream {
    /// Request messages in arrival order. Yields `None` once the client
    /// finishes its stream. Messages queue here until the handler reads
    /// them.
    pub requests: mpsc::UnboundedReceiver<Vec<u8>>,

    pub responder: RpcServerResponder,
}

/// Sends streamed responses for one call.
#[derive(Clone)]
pub struct RpcServerResponder {
    key: RpcCallKey,
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl RpcServerResponder {
    pub(crate) fn new(key: RpcCallKey, tx: mpsc::UnboundedSender<Vec<u8>>) -> Self {
        Self { key, tx }
    }

    pub fn key(&self) -> RpcCallKey {
        self.key
    }

    /// Queues one response message. Fails without sending if the message
    /// cannot fit in a single frame.
    pub fn send(&self, payload: Vec<u8>) -> Result<(), RpcServiceEndpointError> {
        let max = max_rpc_payload_size(DEFAULT_MAX_FRAME_SIZE);
        if payload.len() > max {
            return Err(RpcServiceEndpointError::PayloadTooLarge {
                len: payload.len(),
                max,
            });
        }

        self.tx
            .send(encode_packet(&RpcPacket::server_stream(&self.key, payload)))
            .map_err(|_| RpcServiceEndpointError::ConnectionClosed)
    }
}

pub(crate) fn encode_packet(packet: &RpcPacket) -> Vec<u8> {
    FrameCodec::encode_ui_frame(DEFAULT_RPC_ADDRESS, &packet.encode())
}

/// Method handlers, keyed by (service id, method id).
///
/// One endpoint serves every connection of a server; registration can
/// happen before or while the server runs.
#[derive(Default)]
pub struct RpcServiceEndpoint {
    handlers: Mutex<HashMap<(u32, u32), RpcMethodHandler>>,
}

impl RpcServiceEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler that answers one request with one response.
    ///
    /// `Ok(payload)` completes the call with an OK status; `Err(status)`
    /// completes it with that status and no payload.
    pub fn register_unary<F, Fut>(
        &self,
        service_id: u32,
        method_id: u32,
        handler: F,
    ) -> Result<(), RpcServiceEndpointError>
    where
        F: Fn(Vec<u8>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<u8>, RpcStatus>> + Send + 'static,
    {
        let wrapped: RpcUnaryHandler =
            Arc::new(move |payload: Vec<u8>| Box::pin(handler(payload)) as BoxFuture<'static, _>);

        self.register(service_id, method_id, RpcMethodHandler::Unary(wrapped))
    }

    /// Registers a handler for a bidirectional-stream method.
    ///
    /// The status the handler returns completes the call.
    pub fn register_bidirectional<F, Fut>(
        &self,
        service_id: u32,
        method_id: u32,
        handler: F,
    ) -> Result<(), RpcServiceEndpointError>
    where
        F: Fn(RpcServerStream) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RpcStatus> + Send + 'static,
    {
        let wrapped: RpcBidirectionalHandler = Arc::new(move |stream: RpcServerStream| {
            Box::pin(handler(stream)) as BoxFuture<'static, _>
        });

        self.register(
            service_id,
            method_id,
            RpcMethodHandler::Bidirectional(wrapped),
        )
    }

    pub fn is_registered(&self, service_id: u32, method_id: u32) -> bool {
        self.lock_handlers().contains_key(&(service_id, method_id))
    }

    pub(crate) fn handler(&self, service_id: u32, method_id: u32) -> Option<RpcMethodHandler> {
        self.lock_handlers().get(&(service_id, method_id)).cloned()
    }

    fn register(
        &self,
        service_id: u32,
        method_id: u32,
        handler: RpcMethodHandler,
    ) -> Result<(), RpcServiceEndpointError> {
        match self.lock_handlers().entry((service_id, method_id)) {
            Entry::Occupied(_) => Err(RpcServiceEndpointError::AlreadyRegistered {
                service_id,
                method_id,
            }),
            Entry::Vacant(entry) => {
                entry.insert(handler);
                Ok(())
            }
        }
    }

    fn lock_handlers(&self) -> std::sync::MutexGuard<'_, HashMap<(u32, u32), RpcMethodHandler>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
