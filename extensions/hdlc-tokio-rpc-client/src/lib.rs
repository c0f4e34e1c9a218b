mod rpc_client;
pub use rpc_client::{RpcClient, RpcClientConfig};

pub use hdlc_rpc_service_caller::{RpcServiceCallerInterface, RpcTransportState};
