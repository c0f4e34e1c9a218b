//! HDLC framing, packet model and call dispatching for RPC over byte streams.
//!
//! This crate is the runtime-agnostic core. It turns an untrusted byte
//! stream into validated frames ([`frame`]), frames into typed packets, and
//! routes packets to the calls waiting for them ([`rpc`]). It never touches
//! a socket: transports feed it bytes and receive bytes to write through
//! callbacks.

pub mod constants;
pub mod frame;
pub mod rpc;
