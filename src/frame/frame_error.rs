use std::fmt;

/// Reasons a frame is rejected by the decoder.
///
/// None of these are surfaced past the transport. A rejected frame is
/// counted and dropped, and decoding resumes at the next flag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDecodeError {
    /// Fewer bytes than address + control + FCS.
    TooShort,

    /// The CRC-32 carried in the frame does not match its contents.
    InvalidChecksum,

    /// The address varint is unterminated or does not fit in a `u64`.
    InvalidAddress,

    /// An escape byte was directly followed by a flag byte.
    InvalidEscape,

    /// The frame grew past the decoder's maximum frame size.
    Oversized,
}

impl fmt::Display for FrameDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameDecodeError::TooShort => write!(f, "frame too short"),
            FrameDecodeError::InvalidChecksum => write!(f, "frame check sequence mismatch"),
            FrameDecodeError::InvalidAddress => write!(f, "invalid frame address"),
            FrameDecodeError::InvalidEscape => write!(f, "escape byte followed by flag"),
            FrameDecodeError::Oversized => write!(f, "frame exceeds maximum size"),
        }
    }
}

impl std::error::Error for FrameDecodeError {}
