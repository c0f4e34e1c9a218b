//! The `pw.rpc.Benchmark` service: echo methods used to exercise a
//! connection end to end.

use bitcode::{Decode, Encode};
use hdlc_rpc_service::rpc_service_id;
use std::io;

mod bidirectional_echo;
pub use bidirectional_echo::BidirectionalEcho;

mod unary_echo;
pub use unary_echo::UnaryEcho;

pub const BENCHMARK_SERVICE_ID: u32 = rpc_service_id!("pw.rpc.Benchmark");

/// The message both echo methods take and return.
#[derive(Encode, Decode, PartialEq, Debug, Clone)]
pub struct Payload {
    pub payload: Vec<u8>,
}

fn encode_payload(payload: Vec<u8>) -> Vec<u8> {
    bitcode::encode(&Payload { payload })
}

fn decode_payload(bytes: &[u8]) -> Result<Vec<u8>, io::Error> {
    let raw = bitcode::decode::<Payload>(bytes)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    Ok(raw.payload)
}
