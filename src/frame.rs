mod frame_codec;
mod frame_decoder;
mod frame_error;
mod frame_struct;

pub use frame_codec::FrameCodec;
pub use frame_decoder::{FrameDecoder, FrameDecoderIterator, FrameDecoderStats};
pub use frame_error::FrameDecodeError;
pub use frame_struct::Frame;
