use super::{BENCHMARK_SERVICE_ID, decode_payload, encode_payload};
use hdlc_rpc_service::{prebuffered::RpcMethodPrebuffered, rpc_method_id};
use std::io;

/// Streams every request message straight back as a response message.
///
/// The codec applies per stream message.
pub struct BidirectionalEcho;

impl RpcMethodPrebuffered for BidirectionalEcho {
    const SERVICE_ID: u32 = BENCHMARK_SERVICE_ID;
    const METHOD_ID: u32 = rpc_method_id!("BidirectionalEcho");

    type Input = Vec<u8>;
    type Output = Vec<u8>;

    fn encode_request(input: Self::Input) -> Result<Vec<u8>, io::Error> {
        Ok(encode_payload(input))
    }

    fn decode_request(bytes: &[u8]) -> Result<Self::Input, io::Error> {
        decode_payload(bytes)
    }

    fn encode_response(output: Self::Output) -> Result<Vec<u8>, io::Error> {
        Ok(encode_payload(output))
    }

    fn decode_response(bytes: &[u8]) -> Result<Self::Output, io::Error> {
        decode_payload(bytes)
    }
}
