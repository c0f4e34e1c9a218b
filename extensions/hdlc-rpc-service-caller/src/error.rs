use hdlc_rpc::rpc::{RpcCallKey, RpcDispatcherError, RpcStatus};
use std::fmt;
use std::io;

/// Represents errors that can occur during an RPC call from the perspective
/// of the caller.
#[derive(Debug)]
pub enum RpcCallerError {
    /// Encoding a request or decoding a response failed.
    Io(io::Error),

    /// A call with the same (channel, service, method, call id) is already
    /// open. Nothing was sent.
    CallKeyCollision(RpcCallKey),

    /// Every call id for the method is in use.
    CallIdsExhausted,

    /// The payload does not fit in one frame. Nothing was sent.
    PayloadTooLarge { len: usize, max: usize },

    /// The call already reached a terminal state, or its client stream was
    /// already finished.
    CallClosed,

    /// The server ended the call with a non-OK status.
    RemoteError { status: RpcStatus },

    /// The call was cancelled locally.
    Cancelled,

    /// The transport closed before the call completed.
    TransportClosed,
}

impl RpcCallerError {
    /// Status code equivalent of the error.
    pub fn status(&self) -> RpcStatus {
        match self {
            RpcCallerError::Io(_) => RpcStatus::Internal,
            RpcCallerError::CallKeyCollision(_) => RpcStatus::AlreadyExists,
            RpcCallerError::CallIdsExhausted => RpcStatus::ResourceExhausted,
            RpcCallerError::PayloadTooLarge { .. } => RpcStatus::ResourceExhausted,
            RpcCallerError::CallClosed => RpcStatus::FailedPrecondition,
            RpcCallerError::RemoteError { status } => *status,
            RpcCallerError::Cancelled => RpcStatus::Cancelled,
            RpcCallerError::TransportClosed => RpcStatus::Aborted,
        }
    }
}

impl fmt::Display for RpcCallerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcCallerError::Io(e) => write!(f, "I/O error: {}", e),
            RpcCallerError::CallKeyCollision(key) => {
                write!(f, "a call is already open for {}", key)
            }
            RpcCallerError::CallIdsExhausted => write!(f, "no free call id"),
            RpcCallerError::PayloadTooLarge { len, max } => {
                write!(f, "payload of {} bytes exceeds the {} byte limit", len, max)
            }
            RpcCallerError::CallClosed => write!(f, "call is closed"),
            RpcCallerError::RemoteError { status } => {
                write!(f, "remote ended call with status {}", status)
            }
            RpcCallerError::Cancelled => write!(f, "RPC call cancelled"),
            RpcCallerError::TransportClosed => write!(f, "transport closed"),
        }
    }
}

impl std::error::Error for RpcCallerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RpcCallerError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RpcCallerError {
    fn from(e: io::Error) -> Self {
        RpcCallerError::Io(e)
    }
}

impl From<RpcDispatcherError> for RpcCallerError {
    fn from(e: RpcDispatcherError) -> Self {
        match e {
            RpcDispatcherError::CallKeyCollision(key) => RpcCallerError::CallKeyCollision(key),
            RpcDispatcherError::CallIdsExhausted => RpcCallerError::CallIdsExhausted,
            RpcDispatcherError::PayloadTooLarge { len, max } => {
                RpcCallerError::PayloadTooLarge { len, max }
            }
            RpcDispatcherError::CallNotOpen(_) | RpcDispatcherError::ClientStreamEnded(_) => {
                RpcCallerError::CallClosed
            }
        }
    }
}
