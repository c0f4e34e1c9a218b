pub use hdlc_rpc::constants::{DEFAULT_MAX_FRAME_SIZE, DEFAULT_RPC_ADDRESS};

/// Channel used when the caller does not pick one.
pub const DEFAULT_CHANNEL_ID: u32 = 1;

/// Size of the buffer a transport reads into before handing bytes to the
/// frame decoder.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1024 * 4;
