use crate::constants::HDLC_UI_FRAME_CONTROL;

/// A single HDLC frame, as seen after un-escaping and FCS validation.
///
/// Frames are the unit of integrity on the wire. Several frames (or pieces
/// of frames) may arrive in one read from the transport; the
/// [`FrameDecoder`](crate::frame::FrameDecoder) takes care of finding the
/// boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Destination address. RPC traffic uses
    /// [`DEFAULT_RPC_ADDRESS`](crate::constants::DEFAULT_RPC_ADDRESS); other
    /// addresses can share the same byte stream (e.g. log output).
    pub address: u64,

    /// HDLC control byte. Always `HDLC_UI_FRAME_CONTROL` for frames produced
    /// by this crate.
    pub control: u8,

    /// The frame contents, typically one serialized `RpcPacket`.
    pub data: Vec<u8>,
}

impl Frame {
    /// Creates an unnumbered information frame.
    pub fn ui(address: u64, data: Vec<u8>) -> Self {
        Self {
            address,
            control: HDLC_UI_FRAME_CONTROL,
            data,
        }
    }
}
