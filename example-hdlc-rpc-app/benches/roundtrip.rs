use criterion::{Criterion, criterion_group, criterion_main};
use example_hdlc_rpc_app::benchmark_server;
use example_hdlc_rpc_service_definition::benchmark::UnaryEcho;
use futures::{StreamExt, stream::FuturesUnordered};
use hdlc_rpc_service::DEFAULT_CHANNEL_ID;
use hdlc_rpc_service_caller::prebuffered::RpcCallPrebuffered;
use hdlc_tokio_rpc_client::RpcClient;
use hdlc_tokio_rpc_server::utils::bind_tcp_listener_on_random_port;
use std::{hint::black_box, sync::Arc};
use tokio::runtime::Runtime;

fn bench_roundtrip(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    // Set up server + client once
    let (client, _server_task) = rt.block_on(async {
        let (listener, port) = bind_tcp_listener_on_random_port().await.unwrap();
        let server = Arc::new(benchmark_server().unwrap());
        let server_task = tokio::spawn(server.serve_with_listener(listener));

        let client = RpcClient::new("127.0.0.1", port).await.unwrap();
        (client, server_task)
    });

    c.bench_function("unary_echo_roundtrip_futures_unordered_batch_10", |b| {
        b.to_async(&rt).iter(|| async {
            let mut tasks = FuturesUnordered::new();

            // Submitted all at once; interleaved on the one connection
            for i in 0..10 {
                tasks.push(UnaryEcho::call(
                    &client,
                    DEFAULT_CHANNEL_ID,
                    format!("O_o #{i}").into_bytes(),
                ));
            }

            let mut results = Vec::with_capacity(10);
            while let Some(res) = tasks.next().await {
                results.push(res.unwrap());
            }

            black_box(results);
        });
    });

    c.bench_function("unary_echo_roundtrip_singles", |b| {
        b.to_async(&rt).iter(|| async {
            let res = UnaryEcho::call(&client, DEFAULT_CHANNEL_ID, b"O_o #0".to_vec()).await;
            black_box(res.unwrap());
        });
    });
}

criterion_group!(benches, bench_roundtrip);
criterion_main!(benches);
