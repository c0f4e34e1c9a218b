use crate::rpc::RpcCallKey;
use std::fmt;

/// A serialized packet that could not be decoded.
///
/// The dispatcher treats every variant as a dropped frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcPacketDecodeError {
    /// Fewer bytes than the fixed packet header.
    TooShort,

    /// The layout version byte is not one this crate understands.
    UnsupportedVersion(u8),

    UnknownPacketType(u8),

    UnknownStatus(u32),

    /// The payload length field disagrees with the bytes that follow.
    LengthMismatch { declared: usize, actual: usize },
}

impl fmt::Display for RpcPacketDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcPacketDecodeError::TooShort => write!(f, "malformed packet: too short"),
            RpcPacketDecodeError::UnsupportedVersion(v) => {
                write!(f, "malformed packet: unsupported version {}", v)
            }
            RpcPacketDecodeError::UnknownPacketType(t) => {
                write!(f, "malformed packet: unknown packet type {}", t)
            }
            RpcPacketDecodeError::UnknownStatus(s) => {
                write!(f, "malformed packet: unknown status {}", s)
            }
            RpcPacketDecodeError::LengthMismatch { declared, actual } => write!(
                f,
                "malformed packet: payload length {} but {} bytes present",
                declared, actual
            ),
        }
    }
}

impl std::error::Error for RpcPacketDecodeError {}

/// Call-scoped failures reported by the dispatcher to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcDispatcherError {
    /// A call with the same key is already open.
    CallKeyCollision(RpcCallKey),

    /// No open call exists for the key; it either never existed or has
    /// already reached a terminal state.
    CallNotOpen(RpcCallKey),

    /// The client stream of the call was already ended.
    ClientStreamEnded(RpcCallKey),

    /// Every call id on the (channel, service, method) tuple is in use.
    CallIdsExhausted,

    /// The payload would not fit in one frame. Nothing was sent.
    PayloadTooLarge { len: usize, max: usize },
}

impl fmt::Display for RpcDispatcherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcDispatcherError::CallKeyCollision(key) => {
                write!(f, "a call is already open for {}", key)
            }
            RpcDispatcherError::CallNotOpen(key) => write!(f, "no open call for {}", key),
            RpcDispatcherError::ClientStreamEnded(key) => {
                write!(f, "client stream already ended for {}", key)
            }
            RpcDispatcherError::CallIdsExhausted => write!(f, "no free call id"),
            RpcDispatcherError::PayloadTooLarge { len, max } => {
                write!(f, "payload of {} bytes exceeds the {} byte limit", len, max)
            }
        }
    }
}

impl std::error::Error for RpcDispatcherError {}
