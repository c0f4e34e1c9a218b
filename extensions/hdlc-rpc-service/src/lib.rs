pub mod constants;
pub use constants::*;
mod macros;
pub use macros::*;
pub mod prebuffered;

pub use hdlc_rpc::rpc::RpcStatus;
