use hdlc_rpc::rpc::{RpcCallRequest, RpcCallShape, RpcStatus};
use hdlc_rpc_service::DEFAULT_CHANNEL_ID;

/// Where a call goes: channel, service and method, plus an optional
/// explicit call id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RpcCallTarget {
    pub channel_id: u32,
    pub service_id: u32,
    pub method_id: u32,

    /// `None` lets the dispatcher pick a call id that is not in use.
    pub call_id: Option<u32>,
}

impl RpcCallTarget {
    pub fn new(channel_id: u32, service_id: u32, method_id: u32) -> Self {
        Self {
            channel_id,
            service_id,
            method_id,
            call_id: None,
        }
    }

    /// Targets a method on [`DEFAULT_CHANNEL_ID`].
    pub fn on_default_channel(service_id: u32, method_id: u32) -> Self {
        Self::new(DEFAULT_CHANNEL_ID, service_id, method_id)
    }

    pub fn with_call_id(self, call_id: u32) -> Self {
        Self {
            call_id: Some(call_id),
            ..self
        }
    }

    pub(crate) fn to_request(self, shape: RpcCallShape, payload: Vec<u8>) -> RpcCallRequest {
        RpcCallRequest {
            channel_id: self.channel_id,
            service_id: self.service_id,
            method_id: self.method_id,
            call_id: self.call_id,
            shape,
            payload,
        }
    }
}

/// Outcome of a unary call that reached the server.
///
/// A non-OK status is a normal result here, not an error: the server
/// answered, it just did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcUnaryResponse {
    pub status: RpcStatus,

    /// Response body; present only when `status` is OK.
    pub payload: Option<Vec<u8>>,
}
