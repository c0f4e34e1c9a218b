/// Discriminates the packets exchanged for a call.
///
/// Client-originated types are even, server-originated types are odd (with
/// `ClientStreamEnd` as the late addition at 8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RpcPacketType {
    /// Opens a call. Carries the request payload for unary calls.
    Request = 0,

    /// Final packet of a call, carrying the terminal status.
    Response = 1,

    /// One request message of a client-streaming or bidirectional call.
    ClientStream = 2,

    /// One response message of a server-streaming or bidirectional call.
    ServerStream = 3,

    /// Client-side termination, e.g. cancellation.
    ClientError = 4,

    /// Server-side termination with a non-OK status.
    ServerError = 5,

    /// The client will send no more `ClientStream` packets.
    ClientStreamEnd = 8,
}

impl TryFrom<u8> for RpcPacketType {
    type Error = ();

    fn try_from(v: u8) -> Result<Self, ()> {
        match v {
            0 => Ok(RpcPacketType::Request),
            1 => Ok(RpcPacketType::Response),
            2 => Ok(RpcPacketType::ClientStream),
            3 => Ok(RpcPacketType::ServerStream),
            4 => Ok(RpcPacketType::ClientError),
            5 => Ok(RpcPacketType::ServerError),
            8 => Ok(RpcPacketType::ClientStreamEnd),
            _ => Err(()),
        }
    }
}
