use std::io;

// Optional helper traits that couple a method's wire IDs with the
// serialization of its messages, in one place shared by client and server.
//
// The core crates never look at payloads; adopting these traits is up to the
// application. "Prebuffered" means the whole message is materialized before it
// is encoded or decoded, which is true of every message on this transport: a
// bidirectional stream is a sequence of such messages.

/// A method whose request and response messages are fully materialized
/// byte payloads.
pub trait RpcMethodPrebuffered {
    /// Service the method belongs to. See [`rpc_service_id!`](crate::rpc_service_id).
    const SERVICE_ID: u32;

    /// Method ID, unique within the service. See
    /// [`rpc_method_id!`](crate::rpc_method_id).
    const METHOD_ID: u32;

    /// The high-level input type expected by the request encoder.
    type Input;

    /// The high-level output type returned by the response decoder.
    type Output;

    fn encode_request(input: Self::Input) -> Result<Vec<u8>, io::Error>;

    fn decode_request(bytes: &[u8]) -> Result<Self::Input, io::Error>;

    fn encode_response(output: Self::Output) -> Result<Vec<u8>, io::Error>;

    fn decode_response(bytes: &[u8]) -> Result<Self::Output, io::Error>;
}
