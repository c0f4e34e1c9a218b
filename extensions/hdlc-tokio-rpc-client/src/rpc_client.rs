use hdlc_rpc::rpc::{RpcDispatcher, RpcDispatcherStats};
use hdlc_rpc_service::constants::{
    DEFAULT_MAX_FRAME_SIZE, DEFAULT_READ_BUFFER_SIZE, DEFAULT_RPC_ADDRESS,
};
use hdlc_rpc_service_caller::{RpcServiceCallerInterface, RpcTransportState, WithDispatcher};
use std::io;
use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicBool, Ordering},
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};

type RpcTransportStateChangeHandler = Arc<dyn Fn(RpcTransportState) + Send + Sync>;

/// Transport settings for an [`RpcClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RpcClientConfig {
    /// HDLC address RPC frames are sent to and accepted from.
    pub rpc_address: u64,

    /// Bytes requested from the connection per read.
    pub read_buffer_size: usize,

    /// Largest inbound frame the decoder buffers.
    pub max_frame_size: usize,
}

impl Default for RpcClientConfig {
    fn default() -> Self {
        Self {
            rpc_address: DEFAULT_RPC_ADDRESS,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

/// An RPC client that owns one byte-stream connection.
///
/// Two background tasks service the connection: a read loop feeding every
/// received byte to the dispatcher and a write loop draining the queue of
/// encoded frames. The connection is released by [`close`](Self::close),
/// when the client is dropped, or when the remote end goes away; every call
/// still open at that point completes with an aborted status.
pub struct RpcClient {
    connection: Arc<Connection>,
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

/// State shared between the client handle and its I/O tasks.
struct Connection {
    dispatcher: Arc<Mutex<RpcDispatcher<'static>>>,
    is_connected: AtomicBool,
    state_change_handler: Mutex<Option<RpcTransportStateChangeHandler>>,
    shutdown_tx: watch::Sender<bool>,
}

impl Connection {
    /// Tears the connection down. Only the first invocation has any effect.
    fn shutdown(&self, reason: &str) {
        // Flipped under the dispatcher lock, so a call is either started
        // before this (and failed here) or sees the client disconnected
        let failed_calls = self.dispatcher.with_dispatcher(|dispatcher| {
            if !self.is_connected.swap(false, Ordering::SeqCst) {
                return None;
            }
            Some(dispatcher.fail_all_calls())
        });

        let Some(failed_calls) = failed_calls else {
            return;
        };

        tracing::info!(
            "Connection closed ({}), {} open call(s) aborted",
            reason,
            failed_calls
        );

        self.shutdown_tx.send_replace(true);

        let handler = self
            .state_change_handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        if let Some(handler) = handler {
            handler(RpcTransportState::Disconnected);
        }
    }
}

impl RpcClient {
    /// Connects to `host:port` over TCP with the default configuration.
    pub async fn new(host: &str, port: u16) -> io::Result<RpcClient> {
        let stream = TcpStream::connect((host, port)).await?;
        stream.set_nodelay(true)?;

        tracing::info!("Connected to {}:{}", host, port);

        Ok(Self::from_stream(stream, RpcClientConfig::default()))
    }

    /// Takes ownership of an established connection and starts servicing it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn from_stream<S>(stream: S, config: RpcClientConfig) -> RpcClient
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        let (tx, rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let connection = Arc::new(Connection {
            dispatcher: Arc::new(Mutex::new(RpcDispatcher::with_config(
                config.rpc_address,
                config.max_frame_size,
            ))),
            is_connected: AtomicBool::new(true),
            state_change_handler: Mutex::new(None),
            shutdown_tx,
        });

        tokio::spawn(Self::read_task(
            connection.clone(),
            reader,
            config.read_buffer_size,
            shutdown_rx.clone(),
        ));

        tokio::spawn(Self::write_task(
            connection.clone(),
            writer,
            rx,
            shutdown_rx,
        ));

        RpcClient { connection, tx }
    }

    /// Closes the connection.
    ///
    /// Idempotent. Fails every open call with an aborted status, stops both
    /// I/O tasks and reports [`RpcTransportState::Disconnected`] to the
    /// state change handler.
    pub fn close(&self) {
        self.connection.shutdown("closed by client");
    }

    /// Counters of inbound traffic the dispatcher dropped.
    pub fn stats(&self) -> RpcDispatcherStats {
        self.connection.dispatcher.with_dispatcher(|d| d.stats())
    }

    async fn read_task<R>(
        connection: Arc<Connection>,
        mut reader: R,
        read_buffer_size: usize,
        mut shutdown_rx: watch::Receiver<bool>,
    ) where
        R: AsyncRead + Unpin,
    {
        let mut buf = vec![0u8; read_buffer_size];

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => break,

                result = reader.read(&mut buf) => match result {
                    Ok(0) => {
                        connection.shutdown("remote end closed the connection");
                        break;
                    }
                    Ok(n) => {
                        connection
                            .dispatcher
                            .with_dispatcher(|dispatcher| dispatcher.read_bytes(&buf[..n]));
                    }
                    Err(err) => {
                        tracing::warn!("Read failed: {}", err);
                        connection.shutdown("read error");
                        break;
                    }
                },
            }
        }
    }

    async fn write_task<W>(
        connection: Arc<Connection>,
        mut writer: W,
        mut rx: mpsc::UnboundedReceiver<Vec<u8>>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) where
        W: AsyncWrite + Unpin,
    {
        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => break,

                bytes = rx.recv() => {
                    let Some(bytes) = bytes else {
                        break;
                    };

                    if let Err(err) = writer.write_all(&bytes).await {
                        tracing::warn!("Write failed: {}", err);
                        connection.shutdown("write error");
                        return;
                    }
                }
            }
        }

        // Frames queued before the shutdown (e.g. cancellations) still go out
        while let Ok(bytes) = rx.try_recv() {
            if writer.write_all(&bytes).await.is_err() {
                break;
            }
        }

        let _ = writer.shutdown().await;
    }
}

impl Drop for RpcClient {
    fn drop(&mut self) {
        self.close();
    }
}

#[async_trait::async_trait]
impl RpcServiceCallerInterface for RpcClient {
    type DispatcherLock = Mutex<RpcDispatcher<'static>>;

    fn get_dispatcher(&self) -> Arc<Self::DispatcherLock> {
        self.connection.dispatcher.clone()
    }

    fn get_emit_fn(&self) -> Arc<dyn Fn(Vec<u8>) + Send + Sync> {
        let tx = self.tx.clone();
        Arc::new(move |bytes: Vec<u8>| {
            if tx.send(bytes).is_err() {
                tracing::debug!("Dropping outbound frame, writer has stopped");
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.connection.is_connected.load(Ordering::SeqCst)
    }

    /// Replaces the state change handler. If the client is currently
    /// connected, the new handler is invoked with `Connected` right away.
    fn set_state_change_handler(
        &self,
        handler: impl Fn(RpcTransportState) + Send + Sync + 'static,
    ) {
        let handler: RpcTransportStateChangeHandler = Arc::new(handler);

        *self
            .connection
            .state_change_handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handler.clone());

        if self.is_connected() {
            handler(RpcTransportState::Connected);
        }
    }
}
