use example_hdlc_rpc_service_definition::benchmark::{BidirectionalEcho, UnaryEcho};
use hdlc_rpc_service::{RpcStatus, prebuffered::RpcMethodPrebuffered};
use hdlc_tokio_rpc_server::{RpcServer, error::RpcServiceEndpointError};

/// A server hosting the `pw.rpc.Benchmark` service.
///
/// Messages are decoded and re-encoded, so a malformed request is answered
/// with `INVALID_ARGUMENT` rather than echoed.
pub fn benchmark_server() -> Result<RpcServer, RpcServiceEndpointError> {
    let server = RpcServer::new();
    let endpoint = server.endpoint();

    endpoint.register_unary(UnaryEcho::SERVICE_ID, UnaryEcho::METHOD_ID, |bytes| async move {
        let request = UnaryEcho::decode_request(&bytes).map_err(|_| RpcStatus::InvalidArgument)?;
        UnaryEcho::encode_response(request).map_err(|_| RpcStatus::Internal)
    })?;

    endpoint.register_bidirectional(
        BidirectionalEcho::SERVICE_ID,
        BidirectionalEcho::METHOD_ID,
        |mut stream| async move {
            while let Some(bytes) = stream.requests.recv().await {
                let Ok(request) = BidirectionalEcho::decode_request(&bytes) else {
                    return RpcStatus::InvalidArgument;
                };
                let Ok(response) = BidirectionalEcho::encode_response(request) else {
                    return RpcStatus::Internal;
                };
                if stream.responder.send(response).is_err() {
                    return RpcStatus::Aborted;
                }
            }

            RpcStatus::Ok
        },
    )?;

    Ok(server)
}
