use example_hdlc_rpc_app::benchmark_server;
use example_hdlc_rpc_service_definition::benchmark::{BidirectionalEcho, UnaryEcho};
use futures::{StreamExt, future::join_all};
use hdlc_rpc_service::{DEFAULT_CHANNEL_ID, prebuffered::RpcMethodPrebuffered};
use hdlc_rpc_service_caller::{RpcCallTarget, prebuffered::RpcCallPrebuffered};
use hdlc_tokio_rpc_client::{RpcClient, RpcServiceCallerInterface, RpcTransportState};
use hdlc_tokio_rpc_server::utils::{bind_tcp_listener_on_random_port, tcp_listener_to_host_port};
use std::error::Error;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const MESSAGE_COUNT: usize = 50;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Bind to a random available port
    let (listener, _) = bind_tcp_listener_on_random_port().await?;
    let (host, port) = tcp_listener_to_host_port(&listener)?;

    let server = Arc::new(benchmark_server()?);
    let _server_task = tokio::spawn(server.serve_with_listener(listener));

    let client = RpcClient::new(&host.to_string(), port).await?;
    client.set_state_change_handler(|state: RpcTransportState| {
        tracing::info!("Transport state: {:?}", state);
    });

    // Unary: every echo is issued at once and awaited together
    let replies = join_all((0..MESSAGE_COUNT).map(|i| {
        UnaryEcho::call(&client, DEFAULT_CHANNEL_ID, format!("O_o #{i}").into_bytes())
    }))
    .await;

    for reply in replies {
        println!("UnaryEcho -> {}", String::from_utf8_lossy(&reply?));
    }

    // Bidirectional: stream the messages out, then read the echoes back
    let mut call = client
        .invoke_bidirectional(RpcCallTarget::new(
            DEFAULT_CHANNEL_ID,
            BidirectionalEcho::SERVICE_ID,
            BidirectionalEcho::METHOD_ID,
        ))
        .await?;

    for i in 0..MESSAGE_COUNT {
        call.send(BidirectionalEcho::encode_request(
            format!("O_o #{i}").into_bytes(),
        )?)?;
    }
    call.finish()?;

    while let Some(message) = call.next().await {
        let echoed = BidirectionalEcho::decode_response(&message?)?;
        println!("BidirectionalEcho -> {}", String::from_utf8_lossy(&echoed));
    }

    println!("Stream ended with {:?}", call.status());

    client.close();

    Ok(())
}
