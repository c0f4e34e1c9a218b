mod rpc_call;
mod rpc_dispatcher;
mod rpc_error;
mod rpc_packet;
mod rpc_packet_type;
mod rpc_status;
pub mod rpc_trait;

pub use rpc_call::{RpcCallEvent, RpcCallKey, RpcCallRequest, RpcCallShape, RpcCallState};
pub use rpc_dispatcher::{RpcDispatcher, RpcDispatcherStats};
pub use rpc_error::{RpcDispatcherError, RpcPacketDecodeError};
pub use rpc_packet::RpcPacket;
pub use rpc_packet_type::RpcPacketType;
pub use rpc_status::RpcStatus;
