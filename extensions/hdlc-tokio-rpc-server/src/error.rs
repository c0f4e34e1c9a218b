use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcServiceEndpointError {
    /// A handler is already registered for the (service, method) pair.
    AlreadyRegistered { service_id: u32, method_id: u32 },

    /// The connection the call arrived on is gone.
    ConnectionClosed,

    /// A response message too large for one frame.
    PayloadTooLarge { len: usize, max: usize },
}

impl fmt::Display for RpcServiceEndpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcServiceEndpointError::AlreadyRegistered {
                service_id,
                method_id,
            } => write!(
                f,
                "a handler for service {:08x} method {:08x} is already registered",
                service_id, method_id
            ),
            RpcServiceEndpointError::ConnectionClosed => write!(f, "connection closed"),
            RpcServiceEndpointError::PayloadTooLarge { len, max } => {
                write!(f, "payload of {} bytes exceeds the {} byte limit", len, max)
            }
        }
    }
}

impl std::error::Error for RpcServiceEndpointError {}
