use xxhash_rust::const_xxh32::xxh32 as const_xxh32;

/// Hashes a fully qualified name (e.g. `"pw.rpc.Benchmark"` or
/// `"UnaryEcho"`) into a 32-bit wire ID.
pub const fn name_id_hash(name: &str) -> u32 {
    const_xxh32(name.as_bytes(), 0)
}

/// Compile-time RPC service ID generator using xxHash32.
///
/// Computes a deterministic `u32` identifier from a string literal at
/// **compile time**, so both ends of a connection derive the same ID from the
/// same fully qualified service name without sharing a registry.
///
/// ## Example
///
/// ```rust
/// use hdlc_rpc_service::rpc_service_id;
/// const BENCHMARK: u32 = rpc_service_id!("pw.rpc.Benchmark");
/// assert_ne!(BENCHMARK, rpc_service_id!("pw.rpc.EchoService"));
/// ```
#[macro_export]
macro_rules! rpc_service_id {
    ($name:literal) => {{
        const ID: u32 = $crate::name_id_hash($name);
        ID
    }};
}

/// Compile-time RPC method ID generator using xxHash32.
///
/// Method IDs only need to be unique within their service.
///
/// ```rust
/// use hdlc_rpc_service::rpc_method_id;
/// assert_ne!(rpc_method_id!("UnaryEcho"), rpc_method_id!("BidirectionalEcho"));
/// ```
#[macro_export]
macro_rules! rpc_method_id {
    ($name:literal) => {{
        const ID: u32 = $crate::name_id_hash($name);
        ID
    }};
}
