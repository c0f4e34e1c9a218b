use crate::{
    constants::{
        HDLC_ESCAPE, HDLC_ESCAPE_CONSTANT, HDLC_FCS_SIZE, HDLC_FLAG, HDLC_MAX_ADDRESS_SIZE,
        HDLC_MIN_FRAME_SIZE,
    },
    frame::{Frame, FrameDecodeError},
};

/// Provides encoding and decoding functionality for HDLC frames.
///
/// Wire layout of an encoded frame:
///
/// ```text
/// FLAG | escaped(address | control | data | fcs) | FLAG
/// ```
///
/// - `FLAG` is `0x7E`. Inside the frame, `0x7E` and `0x7D` are written as
///   `0x7D` followed by the byte XOR `0x20`.
/// - `address` is a one-terminated varint: 7 bits per byte, stored in the
///   upper bits, with the low bit set only on the final byte.
/// - `fcs` is the CRC-32 (IEEE, as used by zlib) of the un-escaped
///   `address | control | data`, written little-endian.
///
/// `encode` produces the complete escaped byte sequence. `decode` works on
/// the un-escaped contents between two flags and is what the streaming
/// [`FrameDecoder`](crate::frame::FrameDecoder) calls once it has found a
/// frame boundary.
pub struct FrameCodec;

impl FrameCodec {
    /// Encodes a `Frame` into its escaped, flag-delimited wire form.
    pub fn encode(frame: &Frame) -> Vec<u8> {
        let mut content = Vec::with_capacity(HDLC_MAX_ADDRESS_SIZE + 1 + frame.data.len());
        encode_address(frame.address, &mut content);
        content.push(frame.control);
        content.extend_from_slice(&frame.data);

        let fcs = crc32fast::hash(&content);

        // Worst case every byte is escaped
        let mut buf = Vec::with_capacity(2 * (content.len() + HDLC_FCS_SIZE) + 2);
        buf.push(HDLC_FLAG);
        for &byte in content.iter().chain(fcs.to_le_bytes().iter()) {
            escape_into(byte, &mut buf);
        }
        buf.push(HDLC_FLAG);

        buf
    }

    /// Shorthand for encoding an unnumbered information frame.
    pub fn encode_ui_frame(address: u64, data: &[u8]) -> Vec<u8> {
        Self::encode(&Frame::ui(address, data.to_vec()))
    }

    /// Decodes the un-escaped contents found between two flag bytes.
    ///
    /// The FCS is verified before anything else is interpreted, so a
    /// corrupted frame never yields a partially decoded `Frame`.
    pub fn decode(buf: &[u8]) -> Result<Frame, FrameDecodeError> {
        if buf.len() < HDLC_MIN_FRAME_SIZE {
            return Err(FrameDecodeError::TooShort);
        }

        let (body, fcs_bytes) = buf.split_at(buf.len() - HDLC_FCS_SIZE);
        let expected_fcs = u32::from_le_bytes(
            fcs_bytes
                .try_into()
                .map_err(|_| FrameDecodeError::TooShort)?,
        );

        if crc32fast::hash(body) != expected_fcs {
            return Err(FrameDecodeError::InvalidChecksum);
        }

        let (address, address_len) = decode_address(body)?;

        // The control byte must follow the address
        let control = *body.get(address_len).ok_or(FrameDecodeError::TooShort)?;

        Ok(Frame {
            address,
            control,
            data: body[address_len + 1..].to_vec(),
        })
    }
}

#[inline]
fn escape_into(byte: u8, buf: &mut Vec<u8>) {
    if byte == HDLC_FLAG || byte == HDLC_ESCAPE {
        buf.push(HDLC_ESCAPE);
        buf.push(byte ^ HDLC_ESCAPE_CONSTANT);
    } else {
        buf.push(byte);
    }
}

fn encode_address(address: u64, buf: &mut Vec<u8>) {
    let mut remaining = address;

    loop {
        let mut byte = ((remaining & 0x7F) as u8) << 1;
        remaining >>= 7;

        if remaining == 0 {
            byte |= 1;
            buf.push(byte);
            return;
        }

        buf.push(byte);
    }
}

/// Returns the decoded address and the number of bytes it occupied.
fn decode_address(buf: &[u8]) -> Result<(u64, usize), FrameDecodeError> {
    let mut address: u64 = 0;

    for (i, &byte) in buf.iter().take(HDLC_MAX_ADDRESS_SIZE).enumerate() {
        let bits = u64::from(byte >> 1);

        // The tenth byte only has room for the top bit of a u64
        if i == HDLC_MAX_ADDRESS_SIZE - 1 && bits > 1 {
            return Err(FrameDecodeError::InvalidAddress);
        }

        address |= bits << (7 * i);

        if byte & 1 == 1 {
            return Ok((address, i + 1));
        }
    }

    Err(FrameDecodeError::InvalidAddress)
}
