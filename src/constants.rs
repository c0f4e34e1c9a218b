// HDLC frame related constants

/// Delimits the start and end of every frame on the wire.
pub const HDLC_FLAG: u8 = 0x7E;

/// Introduces an escaped byte. The byte that follows is XOR'd with
/// `HDLC_ESCAPE_CONSTANT`.
pub const HDLC_ESCAPE: u8 = 0x7D;

pub const HDLC_ESCAPE_CONSTANT: u8 = 0x20;

/// Control byte of an unnumbered information (UI) frame, the only frame type
/// used for RPC traffic.
pub const HDLC_UI_FRAME_CONTROL: u8 = 0x03;

/// Size in bytes of the frame check sequence (CRC-32, little-endian).
pub const HDLC_FCS_SIZE: usize = 4;

/// Size in bytes of the control field.
pub const HDLC_CONTROL_SIZE: usize = 1;

/// Smallest un-escaped frame: one address byte, the control byte and the FCS.
pub const HDLC_MIN_FRAME_SIZE: usize = 1 + HDLC_CONTROL_SIZE + HDLC_FCS_SIZE;

/// Longest one-terminated varint needed to carry a `u64` address.
pub const HDLC_MAX_ADDRESS_SIZE: usize = 10;

// RPC packet related constants

/// Version byte written at the front of every serialized packet.
/// Bump whenever the byte layout below changes.
pub const RPC_PACKET_VERSION: u8 = 1;

/// Byte offset of the 1-byte layout version.
pub const RPC_PACKET_VERSION_OFFSET: usize = 0;

/// Byte offset of the 1-byte packet type (`RpcPacketType`).
pub const RPC_PACKET_TYPE_OFFSET: usize = 1;

/// Byte offset of the 4-byte channel id (u32).
pub const RPC_PACKET_CHANNEL_ID_OFFSET: usize = 2;

/// Byte offset of the 4-byte service id (u32).
pub const RPC_PACKET_SERVICE_ID_OFFSET: usize = 6;

/// Byte offset of the 4-byte method id (u32).
pub const RPC_PACKET_METHOD_ID_OFFSET: usize = 10;

/// Byte offset of the 4-byte call id (u32).
/// Correlates requests and responses of one call.
pub const RPC_PACKET_CALL_ID_OFFSET: usize = 14;

/// Byte offset of the 4-byte status code (u32, `RpcStatus`).
pub const RPC_PACKET_STATUS_OFFSET: usize = 18;

/// Byte offset of the 4-byte payload length (u32).
pub const RPC_PACKET_PAYLOAD_LENGTH_OFFSET: usize = 22;

/// Total size of the fixed-length packet header. The payload follows directly.
pub const RPC_PACKET_HEADER_SIZE: usize = 26;

// Defaults shared by the client and server sides

/// HDLC address that carries RPC packets. Frames on other addresses are
/// ignored by the dispatcher.
pub const DEFAULT_RPC_ADDRESS: u64 = 82;

/// Largest un-escaped frame (address, control, packet and FCS) the decoder
/// will buffer before dropping the frame.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1024 * 64;

/// Largest `RpcPacket` payload that fits in an un-escaped frame of
/// `max_frame_size` bytes, whatever the address.
pub const fn max_rpc_payload_size(max_frame_size: usize) -> usize {
    max_frame_size.saturating_sub(
        HDLC_MAX_ADDRESS_SIZE + HDLC_CONTROL_SIZE + RPC_PACKET_HEADER_SIZE + HDLC_FCS_SIZE,
    )
}
