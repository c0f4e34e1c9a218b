use crate::constants::{DEFAULT_MAX_FRAME_SIZE, HDLC_ESCAPE, HDLC_ESCAPE_CONSTANT, HDLC_FLAG};
use crate::frame::{Frame, FrameCodec, FrameDecodeError};
use std::collections::VecDeque;

/// A streaming HDLC frame decoder.
///
/// `FrameDecoder` accepts a continuous stream of bytes, split at arbitrary
/// points, and emits every complete frame whose FCS checks out. Partial
/// frames are kept between calls to [`read_bytes`](Self::read_bytes).
///
/// ### Behavior Summary:
/// - Bytes seen before the first flag are discarded.
/// - Back-to-back flags are allowed and produce no frames.
/// - A frame that fails validation is dropped, counted in
///   [`FrameDecoderStats`] and logged. The flag that ended it also starts
///   the next frame, so one corrupted frame never desynchronizes the stream.
/// - A frame that grows past `max_frame_size` stops buffering and is dropped
///   when its closing flag arrives.
pub struct FrameDecoder {
    state: DecoderState,
    buffer: Vec<u8>,
    max_frame_size: usize,
    is_oversized: bool,
    stats: FrameDecoderStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    InterFrame,
    Frame,
    FrameEscape,
}

/// Running counters kept by a [`FrameDecoder`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameDecoderStats {
    /// Frames that passed validation and were emitted.
    pub frames_decoded: u64,

    /// Frames rejected for any `FrameDecodeError` reason.
    pub frames_dropped: u64,
}

pub struct FrameDecoderIterator {
    queue: VecDeque<Frame>,
}

impl Iterator for FrameDecoderIterator {
    type Item = Frame;

    fn next(&mut self) -> Option<Self::Item> {
        self.queue.pop_front()
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            state: DecoderState::InterFrame,
            buffer: Vec::new(),
            max_frame_size,
            is_oversized: false,
            stats: FrameDecoderStats::default(),
        }
    }

    pub fn stats(&self) -> FrameDecoderStats {
        self.stats
    }

    /// Reads new bytes and returns the frames they completed.
    pub fn read_bytes(&mut self, data: &[u8]) -> FrameDecoderIterator {
        let mut queue = VecDeque::new();

        for &byte in data {
            if let Some(frame) = self.process_byte(byte) {
                queue.push_back(frame);
            }
        }

        FrameDecoderIterator { queue }
    }

    fn process_byte(&mut self, byte: u8) -> Option<Frame> {
        match self.state {
            DecoderState::InterFrame => {
                if byte == HDLC_FLAG {
                    self.start_frame();
                }
                None
            }
            DecoderState::Frame => match byte {
                HDLC_FLAG => {
                    let frame = self.finish_frame();
                    self.start_frame();
                    frame
                }
                HDLC_ESCAPE => {
                    self.state = DecoderState::FrameEscape;
                    None
                }
                _ => {
                    self.push(byte);
                    None
                }
            },
            DecoderState::FrameEscape => {
                if byte == HDLC_FLAG {
                    self.drop_frame(FrameDecodeError::InvalidEscape);
                    self.start_frame();
                } else {
                    self.state = DecoderState::Frame;
                    self.push(byte ^ HDLC_ESCAPE_CONSTANT);
                }
                None
            }
        }
    }

    fn start_frame(&mut self) {
        self.buffer.clear();
        self.is_oversized = false;
        self.state = DecoderState::Frame;
    }

    fn push(&mut self, byte: u8) {
        if self.buffer.len() >= self.max_frame_size {
            self.is_oversized = true;
            return;
        }
        self.buffer.push(byte);
    }

    fn finish_frame(&mut self) -> Option<Frame> {
        if self.buffer.is_empty() && !self.is_oversized {
            return None;
        }

        if self.is_oversized {
            self.drop_frame(FrameDecodeError::Oversized);
            return None;
        }

        match FrameCodec::decode(&self.buffer) {
            Ok(frame) => {
                self.stats.frames_decoded += 1;
                Some(frame)
            }
            Err(err) => {
                self.drop_frame(err);
                None
            }
        }
    }

    fn drop_frame(&mut self, err: FrameDecodeError) {
        self.stats.frames_dropped += 1;
        tracing::debug!(
            "Dropping HDLC frame ({} bytes buffered): {}",
            self.buffer.len(),
            err
        );
    }
}
