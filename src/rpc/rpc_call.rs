use crate::rpc::{RpcPacket, RpcStatus};
use std::fmt;

/// Identifies one call on the transport.
///
/// At most one call occupies a key at a time. A call id may be reused once
/// the call previously holding it has reached a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RpcCallKey {
    pub channel_id: u32,
    pub service_id: u32,
    pub method_id: u32,
    pub call_id: u32,
}

impl RpcCallKey {
    /// The key a received packet is addressed to.
    pub fn of_packet(packet: &RpcPacket) -> Self {
        Self {
            channel_id: packet.channel_id,
            service_id: packet.service_id,
            method_id: packet.method_id,
            call_id: packet.call_id,
        }
    }
}

impl fmt::Display for RpcCallKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "channel {} service {:08x} method {:08x} call {}",
            self.channel_id, self.service_id, self.method_id, self.call_id
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcCallShape {
    /// One request, one response.
    Unary,

    /// Any number of requests and responses, ended by a terminal status.
    BidirectionalStream,
}

/// Lifecycle of a call while it sits in the dispatcher's table.
///
/// Terminal calls are removed from the table, so there is no terminal
/// variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcCallState {
    /// Request sent, nothing received yet.
    Open,

    /// At least one streamed response has been delivered.
    Streaming,
}

/// Everything needed to open a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcCallRequest {
    pub channel_id: u32,
    pub service_id: u32,
    pub method_id: u32,

    /// Explicit call id. `None` lets the dispatcher pick a free one.
    pub call_id: Option<u32>,

    pub shape: RpcCallShape,

    /// Request payload. Typically empty when opening a stream.
    pub payload: Vec<u8>,
}

/// What the dispatcher delivers to a call's consumer.
///
/// Exactly one of the terminal variants (`Completed`, `Cancelled`,
/// `TransportClosed`) is delivered per call, after which the consumer is
/// never invoked again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcCallEvent {
    /// One streamed response payload.
    Payload(Vec<u8>),

    /// The server ended the call. The payload is the unary response body
    /// and is empty for stream completions and server errors.
    Completed { status: RpcStatus, payload: Vec<u8> },

    /// The call was cancelled locally.
    Cancelled,

    /// The transport closed before the call completed.
    TransportClosed,
}

impl RpcCallEvent {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RpcCallEvent::Payload(_))
    }
}
