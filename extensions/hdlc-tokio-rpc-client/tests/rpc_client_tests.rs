use example_hdlc_rpc_service_definition::benchmark::{
    BENCHMARK_SERVICE_ID, BidirectionalEcho, UnaryEcho,
};
use futures::StreamExt;
use hdlc_rpc::rpc::RpcStatus;
use hdlc_rpc_service::{DEFAULT_CHANNEL_ID, prebuffered::RpcMethodPrebuffered};
use hdlc_rpc_service_caller::{
    RpcCallTarget, error::RpcCallerError, prebuffered::RpcCallPrebuffered,
};
use hdlc_tokio_rpc_client::{
    RpcClient, RpcClientConfig, RpcServiceCallerInterface, RpcTransportState,
};
use hdlc_tokio_rpc_server::{RpcServer, utils::bind_tcp_listener_on_random_port};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tokio::time::{Duration, sleep, timeout};

const STALLED_UNARY_METHOD_ID: u32 = 0x0511;
const STALLED_STREAM_METHOD_ID: u32 = 0x0512;

/// The benchmark echo service, echoing raw bytes, plus two methods that
/// never complete.
fn benchmark_server() -> RpcServer {
    let server = RpcServer::new();
    let endpoint = server.endpoint();

    endpoint
        .register_unary(UnaryEcho::SERVICE_ID, UnaryEcho::METHOD_ID, |request| async move {
            Ok(request)
        })
        .unwrap();

    endpoint
        .register_bidirectional(
            BidirectionalEcho::SERVICE_ID,
            BidirectionalEcho::METHOD_ID,
            |mut stream| async move {
                while let Some(request) = stream.requests.recv().await {
                    if stream.responder.send(request).is_err() {
                        return RpcStatus::Aborted;
                    }
                }
                RpcStatus::Ok
            },
        )
        .unwrap();

    endpoint
        .register_unary(BENCHMARK_SERVICE_ID, STALLED_UNARY_METHOD_ID, |_| async move {
            std::future::pending::<Result<Vec<u8>, RpcStatus>>().await
        })
        .unwrap();

    endpoint
        .register_bidirectional(BENCHMARK_SERVICE_ID, STALLED_STREAM_METHOD_ID, |_| async move {
            std::future::pending::<RpcStatus>().await
        })
        .unwrap();

    server
}

async fn connect_to_benchmark_server() -> RpcClient {
    let (listener, port) = bind_tcp_listener_on_random_port().await.unwrap();
    tokio::spawn(Arc::new(benchmark_server()).serve_with_listener(listener));

    RpcClient::new("127.0.0.1", port).await.unwrap()
}

fn unary_echo() -> RpcCallTarget {
    RpcCallTarget::on_default_channel(UnaryEcho::SERVICE_ID, UnaryEcho::METHOD_ID)
}

fn bidirectional_echo() -> RpcCallTarget {
    RpcCallTarget::on_default_channel(BidirectionalEcho::SERVICE_ID, BidirectionalEcho::METHOD_ID)
}

#[tokio::test]
async fn test_unary_echo() {
    let client = connect_to_benchmark_server().await;

    for i in 0..50 {
        let payload = format!("O_o #{i}").into_bytes();
        let response = client.call_unary(unary_echo(), payload.clone()).await.unwrap();

        assert_eq!(response.status, RpcStatus::Ok);
        assert_eq!(response.payload, Some(payload));
    }
}

#[tokio::test]
async fn test_concurrent_unary_calls() {
    let client = Arc::new(connect_to_benchmark_server().await);

    let mut tasks = vec![];
    for i in 0..20 {
        let client = client.clone();
        tasks.push(tokio::spawn(async move {
            let payload = format!("O_o #{i}").into_bytes();
            let response = client.call_unary(unary_echo(), payload.clone()).await.unwrap();
            assert_eq!(response.payload, Some(payload));
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }
}

#[tokio::test]
async fn test_typed_unary_echo() {
    let client = connect_to_benchmark_server().await;

    let echoed = UnaryEcho::call(&client, DEFAULT_CHANNEL_ID, b"typed".to_vec())
        .await
        .unwrap();

    assert_eq!(echoed, b"typed");
}

#[tokio::test]
async fn test_unknown_method_returns_not_found() {
    let client = connect_to_benchmark_server().await;

    let response = client
        .call_unary(
            RpcCallTarget::on_default_channel(BENCHMARK_SERVICE_ID, 0xbad),
            vec![],
        )
        .await
        .unwrap();

    assert_eq!(response.status, RpcStatus::NotFound);
    assert_eq!(response.payload, None);
}

#[tokio::test]
async fn test_bidirectional_echo() {
    let client = connect_to_benchmark_server().await;
    let mut call = client.invoke_bidirectional(bidirectional_echo()).await.unwrap();

    for i in 0..50 {
        call.send(format!("O_o #{i}").into_bytes()).unwrap();
    }

    for i in 0..50 {
        let response = call.next().await.unwrap().unwrap();
        assert_eq!(response, format!("O_o #{i}").into_bytes());
    }

    call.finish().unwrap();
    assert!(call.next().await.is_none());
    assert_eq!(call.status(), Some(RpcStatus::Ok));
}

#[tokio::test]
async fn test_cancel_ends_stream_and_keeps_connection() {
    let client = connect_to_benchmark_server().await;
    let mut call = client.invoke_bidirectional(bidirectional_echo()).await.unwrap();

    call.send(b"first".to_vec()).unwrap();
    assert_eq!(call.next().await.unwrap().unwrap(), b"first");

    call.send(b"second".to_vec()).unwrap();
    assert!(call.cancel());

    assert!(matches!(call.next().await, Some(Err(RpcCallerError::Cancelled))));
    assert!(call.next().await.is_none());
    assert!(matches!(call.send(vec![]), Err(RpcCallerError::CallClosed)));

    // The connection is unaffected
    let response = client.call_unary(unary_echo(), b"after".to_vec()).await.unwrap();
    assert_eq!(response.payload, Some(b"after".to_vec()));
}

#[tokio::test]
async fn test_unary_timeout_cancels_call() {
    let client = connect_to_benchmark_server().await;
    let target = RpcCallTarget::on_default_channel(BENCHMARK_SERVICE_ID, STALLED_UNARY_METHOD_ID);

    let result = timeout(Duration::from_millis(50), client.call_unary(target, vec![])).await;
    assert!(result.is_err());

    let pending = client.get_dispatcher().lock().unwrap().pending_call_count();
    assert_eq!(pending, 0);
}

#[tokio::test]
async fn test_close_aborts_every_open_call_once() {
    let client = Arc::new(connect_to_benchmark_server().await);
    let stalled_stream =
        RpcCallTarget::on_default_channel(BENCHMARK_SERVICE_ID, STALLED_STREAM_METHOD_ID);

    let mut streams = vec![];
    for _ in 0..5 {
        streams.push(client.invoke_bidirectional(stalled_stream).await.unwrap());
    }

    let unary = tokio::spawn({
        let client = client.clone();
        async move {
            let target =
                RpcCallTarget::on_default_channel(BENCHMARK_SERVICE_ID, STALLED_UNARY_METHOD_ID);
            client.call_unary(target, vec![]).await
        }
    });

    // Let the unary call reach the dispatcher
    sleep(Duration::from_millis(20)).await;

    client.close();
    client.close();

    for stream in streams.iter_mut() {
        assert!(matches!(
            stream.next().await,
            Some(Err(RpcCallerError::TransportClosed))
        ));
        assert!(stream.next().await.is_none());
        assert_eq!(stream.status(), Some(RpcStatus::Aborted));
    }

    let err = unary.await.unwrap().unwrap_err();
    assert_eq!(err.status(), RpcStatus::Aborted);

    // New calls fail fast
    assert!(!client.is_connected());
    assert!(matches!(
        client.call_unary(unary_echo(), vec![]).await,
        Err(RpcCallerError::TransportClosed)
    ));
}

#[tokio::test]
async fn test_dropping_client_aborts_calls() {
    let client = connect_to_benchmark_server().await;
    let stalled_stream =
        RpcCallTarget::on_default_channel(BENCHMARK_SERVICE_ID, STALLED_STREAM_METHOD_ID);

    let mut call = client.invoke_bidirectional(stalled_stream).await.unwrap();
    drop(client);

    assert!(matches!(
        call.next().await,
        Some(Err(RpcCallerError::TransportClosed))
    ));
}

#[tokio::test]
async fn test_state_change_handler_reports_remote_disconnect() {
    let (listener, port) = bind_tcp_listener_on_random_port().await.unwrap();
    let (hang_up_tx, hang_up_rx) = oneshot::channel::<()>();

    // Accepts one connection and hangs up when told to
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let _ = hang_up_rx.await;
        drop(stream);
    });

    let client = RpcClient::new("127.0.0.1", port).await.unwrap();

    let states = Arc::new(Mutex::new(Vec::new()));
    client.set_state_change_handler({
        let states = states.clone();
        move |state| states.lock().unwrap().push(state)
    });
    assert_eq!(*states.lock().unwrap(), vec![RpcTransportState::Connected]);

    hang_up_tx.send(()).unwrap();

    timeout(Duration::from_secs(2), async {
        while client.is_connected() {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("disconnect was not detected");

    assert_eq!(
        *states.lock().unwrap(),
        vec![RpcTransportState::Connected, RpcTransportState::Disconnected]
    );

    // Already closed; nothing more is reported
    client.close();
    assert_eq!(states.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_client_over_in_memory_stream() {
    let (client_io, server_io) = tokio::io::duplex(1024);
    let server = benchmark_server();
    tokio::spawn(async move { server.serve_stream(server_io).await });

    let client = RpcClient::from_stream(
        client_io,
        RpcClientConfig {
            read_buffer_size: 7,
            ..RpcClientConfig::default()
        },
    );

    // A tiny read buffer splits every frame across reads
    for i in 0..10 {
        let payload = format!("O_o #{i}").into_bytes();
        let response = client.call_unary(unary_echo(), payload.clone()).await.unwrap();
        assert_eq!(response.payload, Some(payload));
    }

    assert_eq!(client.stats().frames_dropped, 0);
}

#[tokio::test]
async fn test_connect_to_closed_port_fails() {
    let (listener, port) = bind_tcp_listener_on_random_port().await.unwrap();
    drop(listener);

    assert!(RpcClient::new("127.0.0.1", port).await.is_err());
}
