use crate::{
    constants::{
        RPC_PACKET_CALL_ID_OFFSET, RPC_PACKET_CHANNEL_ID_OFFSET, RPC_PACKET_HEADER_SIZE,
        RPC_PACKET_METHOD_ID_OFFSET, RPC_PACKET_PAYLOAD_LENGTH_OFFSET,
        RPC_PACKET_SERVICE_ID_OFFSET, RPC_PACKET_STATUS_OFFSET, RPC_PACKET_TYPE_OFFSET,
        RPC_PACKET_VERSION, RPC_PACKET_VERSION_OFFSET,
    },
    rpc::{RpcCallKey, RpcPacketDecodeError, RpcPacketType, RpcStatus},
};

/// The decoded contents of one frame: addressing, call correlation, type,
/// status and an opaque payload.
///
/// Serialized layout (all integers little-endian):
///
/// ```text
/// 0      version (u8)
/// 1      packet type (u8)
/// 2..6   channel id (u32)
/// 6..10  service id (u32)
/// 10..14 method id (u32)
/// 14..18 call id (u32)
/// 18..22 status (u32)
/// 22..26 payload length (u32)
/// 26..   payload
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcPacket {
    pub packet_type: RpcPacketType,
    pub channel_id: u32,
    pub service_id: u32,
    pub method_id: u32,
    pub call_id: u32,

    /// Only meaningful on terminal packets; `Ok` elsewhere.
    pub status: RpcStatus,

    /// Serialized application message. Never inspected by this crate.
    pub payload: Vec<u8>,
}

impl RpcPacket {
    fn for_key(packet_type: RpcPacketType, key: &RpcCallKey) -> Self {
        Self {
            packet_type,
            channel_id: key.channel_id,
            service_id: key.service_id,
            method_id: key.method_id,
            call_id: key.call_id,
            status: RpcStatus::Ok,
            payload: Vec::new(),
        }
    }

    pub fn key(&self) -> RpcCallKey {
        RpcCallKey::of_packet(self)
    }

    pub fn request(key: &RpcCallKey, payload: Vec<u8>) -> Self {
        Self {
            payload,
            ..Self::for_key(RpcPacketType::Request, key)
        }
    }

    pub fn client_stream(key: &RpcCallKey, payload: Vec<u8>) -> Self {
        Self {
            payload,
            ..Self::for_key(RpcPacketType::ClientStream, key)
        }
    }

    pub fn client_stream_end(key: &RpcCallKey) -> Self {
        Self::for_key(RpcPacketType::ClientStreamEnd, key)
    }

    /// Client-side cancellation of an open call.
    pub fn cancel(key: &RpcCallKey) -> Self {
        Self {
            status: RpcStatus::Cancelled,
            ..Self::for_key(RpcPacketType::ClientError, key)
        }
    }

    pub fn response(key: &RpcCallKey, status: RpcStatus, payload: Vec<u8>) -> Self {
        Self {
            status,
            payload,
            ..Self::for_key(RpcPacketType::Response, key)
        }
    }

    pub fn server_stream(key: &RpcCallKey, payload: Vec<u8>) -> Self {
        Self {
            payload,
            ..Self::for_key(RpcPacketType::ServerStream, key)
        }
    }

    pub fn server_error(key: &RpcCallKey, status: RpcStatus) -> Self {
        Self {
            status,
            ..Self::for_key(RpcPacketType::ServerError, key)
        }
    }

    /// Serializes the packet. Deterministic: equal packets yield equal bytes.
    ///
    /// The payload length is written as a `u32`. Senders cap payloads at
    /// [`max_rpc_payload_size`](crate::constants::max_rpc_payload_size); the
    /// dispatcher refuses anything longer.
    pub fn encode(&self) -> Vec<u8> {
        debug_assert!(u32::try_from(self.payload.len()).is_ok());

        let mut buf = Vec::with_capacity(RPC_PACKET_HEADER_SIZE + self.payload.len());

        buf.push(RPC_PACKET_VERSION);
        buf.push(self.packet_type as u8);
        buf.extend(&self.channel_id.to_le_bytes());
        buf.extend(&self.service_id.to_le_bytes());
        buf.extend(&self.method_id.to_le_bytes());
        buf.extend(&self.call_id.to_le_bytes());
        buf.extend(&self.status.value().to_le_bytes());
        buf.extend(&(self.payload.len() as u32).to_le_bytes());
        buf.extend(&self.payload);

        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self, RpcPacketDecodeError> {
        if buf.len() < RPC_PACKET_HEADER_SIZE {
            return Err(RpcPacketDecodeError::TooShort);
        }

        let version = buf[RPC_PACKET_VERSION_OFFSET];
        if version != RPC_PACKET_VERSION {
            return Err(RpcPacketDecodeError::UnsupportedVersion(version));
        }

        let type_byte = buf[RPC_PACKET_TYPE_OFFSET];
        let packet_type = RpcPacketType::try_from(type_byte)
            .map_err(|_| RpcPacketDecodeError::UnknownPacketType(type_byte))?;

        let status_value = read_u32(buf, RPC_PACKET_STATUS_OFFSET)?;
        let status = RpcStatus::try_from(status_value)
            .map_err(|_| RpcPacketDecodeError::UnknownStatus(status_value))?;

        let declared = read_u32(buf, RPC_PACKET_PAYLOAD_LENGTH_OFFSET)? as usize;
        let actual = buf.len() - RPC_PACKET_HEADER_SIZE;
        if declared != actual {
            return Err(RpcPacketDecodeError::LengthMismatch { declared, actual });
        }

        Ok(Self {
            packet_type,
            channel_id: read_u32(buf, RPC_PACKET_CHANNEL_ID_OFFSET)?,
            service_id: read_u32(buf, RPC_PACKET_SERVICE_ID_OFFSET)?,
            method_id: read_u32(buf, RPC_PACKET_METHOD_ID_OFFSET)?,
            call_id: read_u32(buf, RPC_PACKET_CALL_ID_OFFSET)?,
            status,
            payload: buf[RPC_PACKET_HEADER_SIZE..].to_vec(),
        })
    }
}

#[inline]
fn read_u32(buf: &[u8], offset: usize) -> Result<u32, RpcPacketDecodeError> {
    buf.get(offset..offset + 4)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or(RpcPacketDecodeError::TooShort)
}
