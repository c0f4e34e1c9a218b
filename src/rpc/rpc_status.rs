use std::fmt;

/// Terminal status of a call.
///
/// The numbering is the canonical status code space shared by gRPC, Abseil
/// and pw_rpc, so status values travel unchanged between implementations.
#[repr(u32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RpcStatus {
    Ok = 0,
    Cancelled = 1,
    Unknown = 2,
    InvalidArgument = 3,
    DeadlineExceeded = 4,
    NotFound = 5,
    AlreadyExists = 6,
    PermissionDenied = 7,
    ResourceExhausted = 8,
    FailedPrecondition = 9,
    Aborted = 10,
    OutOfRange = 11,
    Unimplemented = 12,
    Internal = 13,
    Unavailable = 14,
    DataLoss = 15,
    Unauthenticated = 16,
}

impl RpcStatus {
    #[inline]
    pub fn value(self) -> u32 {
        self as u32
    }

    #[inline]
    pub fn is_ok(self) -> bool {
        self == RpcStatus::Ok
    }
}

impl TryFrom<u32> for RpcStatus {
    type Error = ();

    fn try_from(v: u32) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(RpcStatus::Ok),
            1 => Ok(RpcStatus::Cancelled),
            2 => Ok(RpcStatus::Unknown),
            3 => Ok(RpcStatus::InvalidArgument),
            4 => Ok(RpcStatus::DeadlineExceeded),
            5 => Ok(RpcStatus::NotFound),
            6 => Ok(RpcStatus::AlreadyExists),
            7 => Ok(RpcStatus::PermissionDenied),
            8 => Ok(RpcStatus::ResourceExhausted),
            9 => Ok(RpcStatus::FailedPrecondition),
            10 => Ok(RpcStatus::Aborted),
            11 => Ok(RpcStatus::OutOfRange),
            12 => Ok(RpcStatus::Unimplemented),
            13 => Ok(RpcStatus::Internal),
            14 => Ok(RpcStatus::Unavailable),
            15 => Ok(RpcStatus::DataLoss),
            16 => Ok(RpcStatus::Unauthenticated),
            _ => Err(()),
        }
    }
}

impl fmt::Display for RpcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RpcStatus::Ok => "OK",
            RpcStatus::Cancelled => "CANCELLED",
            RpcStatus::Unknown => "UNKNOWN",
            RpcStatus::InvalidArgument => "INVALID_ARGUMENT",
            RpcStatus::DeadlineExceeded => "DEADLINE_EXCEEDED",
            RpcStatus::NotFound => "NOT_FOUND",
            RpcStatus::AlreadyExists => "ALREADY_EXISTS",
            RpcStatus::PermissionDenied => "PERMISSION_DENIED",
            RpcStatus::ResourceExhausted => "RESOURCE_EXHAUSTED",
            RpcStatus::FailedPrecondition => "FAILED_PRECONDITION",
            RpcStatus::Aborted => "ABORTED",
            RpcStatus::OutOfRange => "OUT_OF_RANGE",
            RpcStatus::Unimplemented => "UNIMPLEMENTED",
            RpcStatus::Internal => "INTERNAL",
            RpcStatus::Unavailable => "UNAVAILABLE",
            RpcStatus::DataLoss => "DATA_LOSS",
            RpcStatus::Unauthenticated => "UNAUTHENTICATED",
        };
        f.write_str(name)
    }
}
