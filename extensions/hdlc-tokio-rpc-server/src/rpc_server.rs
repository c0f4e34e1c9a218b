//! Note: This `RpcServer` is a reference implementation and does not include
//! authentication or encryption. It is best suited for trusted, local
//! communication, tests and as a foundational example. Any byte stream can be
//! served: TCP connections accepted by the server itself, or anything else
//! handed to [`RpcServer::serve_stream`].

use crate::endpoint::{
    RpcMethodHandler, RpcServerResponder, RpcServerStream, RpcServiceEndpoint, encode_packet,
};
use futures::FutureExt;
use hdlc_rpc::constants::max_rpc_payload_size;
use hdlc_rpc::frame::FrameDecoder;
use hdlc_rpc::rpc::{RpcCallKey, RpcPacket, RpcPacketType, RpcStatus};
use hdlc_rpc_service::constants::{
    DEFAULT_MAX_FRAME_SIZE, DEFAULT_READ_BUFFER_SIZE, DEFAULT_RPC_ADDRESS,
};
use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::TcpListener,
    sync::mpsc,
    task::JoinHandle,
};

/// An RPC server that serves HDLC-framed RPC on byte streams.
pub struct RpcServer {
    endpoint: Arc<RpcServiceEndpoint>,
}

impl Default for RpcServer {
    fn default() -> Self {
        Self::new()
    }
}

impl RpcServer {
    pub fn new() -> Self {
        RpcServer {
            endpoint: Arc::new(RpcServiceEndpoint::new()),
        }
    }

    /// Returns an `Arc` clone of the underlying RPC service endpoint, where
    /// handlers are registered.
    pub fn endpoint(&self) -> Arc<RpcServiceEndpoint> {
        self.endpoint.clone()
    }

    /// Serves every connection accepted on a pre-bound listener, each on
    /// its own task. Only returns if accepting fails.
    pub async fn serve_with_listener(self: Arc<Self>, listener: TcpListener) -> io::Result<()> {
        tracing::info!("Server running on {:?}", listener.local_addr()?);

        loop {
            let (stream, peer) = listener.accept().await?;
            if let Err(err) = stream.set_nodelay(true) {
                tracing::debug!("Could not disable Nagle for {}: {}", peer, err);
            }

            tracing::info!("Client connected: {}", peer);

            let server = self.clone();
            tokio::spawn(async move {
                match server.serve_stream(stream).await {
                    Ok(()) => tracing::info!("Client {} disconnected.", peer),
                    Err(err) => tracing::warn!("Connection to {} failed: {}", peer, err),
                }
            });
        }
    }

    /// Serves a single connection until the peer closes it.
    ///
    /// Handlers still running when the connection ends are aborted.
    pub async fn serve_stream<S>(&self, stream: S) -> io::Result<()>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (mut reader, mut writer) = tokio::io::split(stream);
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();

        // Forwards encoded frames from handlers to the connection
        tokio::spawn(async move {
            while let Some(bytes) = rx.recv().await {
                if let Err(err) = writer.write_all(&bytes).await {
                    tracing::debug!("Write failed: {}", err);
                    break;
                }
            }
            let _ = writer.shutdown().await;
        });

        let (finished_tx, mut finished_rx) = mpsc::unbounded_channel::<FinishedCall>();
        let mut connection = ServerConnection::new(self.endpoint.clone(), tx, finished_tx);
        let mut decoder = FrameDecoder::new();
        let mut buf = vec![0u8; DEFAULT_READ_BUFFER_SIZE];

        let result = loop {
            tokio::select! {
                Some(finished) = finished_rx.recv() => connection.forget(finished),

                read = reader.read(&mut buf) => {
                    let n = match read {
                        Ok(0) => break Ok(()),
                        Ok(n) => n,
                        Err(err) => break Err(err),
                    };

                    for frame in decoder.read_bytes(&buf[..n]) {
                        if frame.address != DEFAULT_RPC_ADDRESS {
                            tracing::trace!("Ignoring frame for address {}", frame.address);
                            continue;
                        }

                        match RpcPacket::decode(&frame.data) {
                            Ok(packet) => connection.handle_packet(packet),
                            Err(err) => tracing::debug!("Dropping frame: {}", err),
                        }
                    }
                }
            }
        };

        connection.abort_all();

        result
    }
}

/// Reported by a call's task once its final `Response` is queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FinishedCall {
    key: RpcCallKey,
    generation: u64,
}

/// Per-connection call table.
///
/// Holds only calls whose handler is still running. A call leaves the table
/// when its task reports back, when the client cancels it, or when a new
/// request replaces it.
struct ServerConnection {
    endpoint: Arc<RpcServiceEndpoint>,
    tx: mpsc::UnboundedSender<Vec<u8>>,
    finished_tx: mpsc::UnboundedSender<FinishedCall>,
    calls: HashMap<RpcCallKey, ServerCall>,
    next_generation: u64,
}

struct ServerCall {
    /// Tells this call apart from an earlier one under the same key.
    generation: u64,

    task: JoinHandle<()>,

    /// Feeds the handler's request stream. `None` for unary calls and once
    /// the client stream has ended.
    requests: Option<mpsc::UnboundedSender<Vec<u8>>>,
}

impl ServerConnection {
    fn new(
        endpoint: Arc<RpcServiceEndpoint>,
        tx: mpsc::UnboundedSender<Vec<u8>>,
        finished_tx: mpsc::UnboundedSender<FinishedCall>,
    ) -> Self {
        Self {
            endpoint,
            tx,
            finished_tx,
            calls: HashMap::new(),
            next_generation: 0,
        }
    }

    fn emit(&self, packet: &RpcPacket) {
        let _ = self.tx.send(encode_packet(packet));
    }

    fn handle_packet(&mut self, packet: RpcPacket) {
        let key = packet.key();

        match packet.packet_type {
            RpcPacketType::Request => self.start_call(key, packet.payload),
            RpcPacketType::ClientStream => {
                let Some(requests) = self.open_call(&key).and_then(|call| call.requests.as_ref())
                else {
                    self.reject(&key, "client stream");
                    return;
                };

                // Never waits on the handler
                if requests.send(packet.payload).is_err() {
                    tracing::debug!("Handler stopped reading requests ({})", key);
                }
            }
            RpcPacketType::ClientStreamEnd => match self.open_call(&key) {
                Some(call) => call.requests = None,
                None => self.reject(&key, "client stream end"),
            },
            RpcPacketType::ClientError => {
                if let Some(call) = self.calls.remove(&key) {
                    tracing::trace!("Client cancelled call ({})", key);
                    call.task.abort();
                }
            }
            RpcPacketType::Response | RpcPacketType::ServerStream | RpcPacketType::ServerError => {
                tracing::debug!(
                    "Dropping server-direction {:?} packet ({})",
                    packet.packet_type,
                    key
                );
            }
        }
    }

    /// The open call for `key`, forgetting it first if its handler is done
    /// but has not reported back yet.
    fn open_call(&mut self, key: &RpcCallKey) -> Option<&mut ServerCall> {
        if self
            .calls
            .get(key)
            .is_some_and(|call| call.task.is_finished())
        {
            self.calls.remove(key);
        }
        self.calls.get_mut(key)
    }

    /// Drops a finished call from the table, unless a newer call has taken
    /// its key since.
    fn forget(&mut self, finished: FinishedCall) {
        if self
            .calls
            .get(&finished.key)
            .is_some_and(|call| call.generation == finished.generation)
        {
            self.calls.remove(&finished.key);
        }
    }

    fn reject(&self, key: &RpcCallKey, what: &str) {
        tracing::debug!("Rejecting {} for a call that is not open ({})", what, key);
        self.emit(&RpcPacket::server_error(key, RpcStatus::FailedPrecondition));
    }

    fn start_call(&mut self, key: RpcCallKey, payload: Vec<u8>) {
        if let Some(previous) = self.calls.remove(&key) {
            tracing::debug!("Request replaces open call ({})", key);
            previous.task.abort();
        }

        let Some(handler) = self.endpoint.handler(key.service_id, key.method_id) else {
            tracing::debug!("No handler registered ({})", key);
            self.emit(&RpcPacket::server_error(&key, RpcStatus::NotFound));
            return;
        };

        let generation = self.next_generation;
        self.next_generation += 1;

        let finished = FinishedCall { key, generation };
        let tx = self.tx.clone();
        let finished_tx = self.finished_tx.clone();

        let call = match handler {
            RpcMethodHandler::Unary(handler) => ServerCall {
                generation,
                task: spawn_call(finished, tx, finished_tx, async move {
                    match handler(payload).await {
                        Ok(response) => (RpcStatus::Ok, response),
                        Err(status) => (status, Vec::new()),
                    }
                }),
                requests: None,
            },
            RpcMethodHandler::Bidirectional(handler) => {
                // The opening request carries no message for stream calls
                let (requests_tx, requests_rx) = mpsc::unbounded_channel();
                let stream = RpcServerStream {
                    requests: requests_rx,
                    responder: RpcServerResponder::new(key, tx.clone()),
                };

                ServerCall {
                    generation,
                    task: spawn_call(finished, tx, finished_tx, async move {
                        (handler(stream).await, Vec::new())
                    }),
                    requests: Some(requests_tx),
                }
            }
        };

        self.calls.insert(key, call);
    }

    fn abort_all(&mut self) {
        for (_, call) in self.calls.drain() {
            call.task.abort();
        }
    }
}

/// Runs a handler to completion, sends the final `Response` and reports the
/// call as finished.
///
/// A panicking handler completes its call with `INTERNAL`. A response too
/// large for one frame is replaced by `RESOURCE_EXHAUSTED`.
fn spawn_call<F>(
    finished: FinishedCall,
    tx: mpsc::UnboundedSender<Vec<u8>>,
    finished_tx: mpsc::UnboundedSender<FinishedCall>,
    call: F,
) -> JoinHandle<()>
where
    F: Future<Output = (RpcStatus, Vec<u8>)> + Send + 'static,
{
    let key = finished.key;

    let max_payload_size = max_rpc_payload_size(DEFAULT_MAX_FRAME_SIZE);

    tokio::spawn(async move {
        let (status, payload) = match AssertUnwindSafe(call).catch_unwind().await {
            Ok((status, payload)) if payload.len() > max_payload_size => {
                tracing::warn!(
                    "Dropping {} byte response with status {} ({})",
                    payload.len(),
                    status,
                    key
                );
                (RpcStatus::ResourceExhausted, Vec::new())
            }
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!("Handler panicked ({})", key);
                (RpcStatus::Internal, Vec::new())
            }
        };

        let _ = tx.send(encode_packet(&RpcPacket::response(&key, status, payload)));
        let _ = finished_tx.send(finished);
    })
}
