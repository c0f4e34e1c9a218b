mod endpoint;
pub use endpoint::*;

pub mod error;

mod rpc_server;
pub use rpc_server::RpcServer;

pub mod utils;
