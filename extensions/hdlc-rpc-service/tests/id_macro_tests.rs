use hdlc_rpc_service::{name_id_hash, rpc_method_id, rpc_service_id};

#[test]
fn ids_are_usable_in_const_context() {
    const SERVICE: u32 = rpc_service_id!("pw.rpc.Benchmark");
    const METHOD: u32 = rpc_method_id!("UnaryEcho");

    assert_eq!(SERVICE, name_id_hash("pw.rpc.Benchmark"));
    assert_eq!(METHOD, name_id_hash("UnaryEcho"));
}

#[test]
fn const_hash_matches_runtime_xxh32() {
    for name in ["pw.rpc.Benchmark", "UnaryEcho", "BidirectionalEcho", ""] {
        assert_eq!(
            name_id_hash(name),
            xxhash_rust::xxh32::xxh32(name.as_bytes(), 0)
        );
    }
}

#[test]
fn distinct_names_get_distinct_ids() {
    let ids = [
        rpc_method_id!("UnaryEcho"),
        rpc_method_id!("BidirectionalEcho"),
        rpc_service_id!("pw.rpc.Benchmark"),
        rpc_service_id!("pw.rpc.EchoService"),
    ];

    for (i, a) in ids.iter().enumerate() {
        for b in &ids[i + 1..] {
            assert_ne!(a, b);
        }
    }
}
