use hdlc_rpc::constants::{RPC_PACKET_HEADER_SIZE, RPC_PACKET_VERSION};
use hdlc_rpc::rpc::{RpcCallKey, RpcPacket, RpcPacketDecodeError, RpcPacketType, RpcStatus};

fn test_key() -> RpcCallKey {
    RpcCallKey {
        channel_id: 1,
        service_id: 0xaabb_ccdd,
        method_id: 0x1122_3344,
        call_id: 7,
    }
}

#[test]
fn packet_roundtrip_for_every_type() {
    let key = test_key();

    let packets = vec![
        RpcPacket::request(&key, b"O_o #0".to_vec()),
        RpcPacket::client_stream(&key, vec![0x7E, 0x7D, 0x00]),
        RpcPacket::client_stream_end(&key),
        RpcPacket::cancel(&key),
        RpcPacket::response(&key, RpcStatus::Ok, b"reply".to_vec()),
        RpcPacket::server_stream(&key, vec![]),
        RpcPacket::server_error(&key, RpcStatus::Unauthenticated),
        RpcPacket {
            packet_type: RpcPacketType::Response,
            channel_id: u32::MAX,
            service_id: u32::MAX,
            method_id: 0,
            call_id: u32::MAX,
            status: RpcStatus::DataLoss,
            payload: vec![0xFF; 1024],
        },
    ];

    for packet in packets {
        let bytes = packet.encode();
        assert_eq!(bytes.len(), RPC_PACKET_HEADER_SIZE + packet.payload.len());
        assert_eq!(RpcPacket::decode(&bytes), Ok(packet));
    }
}

#[test]
fn request_packet_layout() {
    let packet = RpcPacket::request(&test_key(), b"ab".to_vec());

    let mut expected = vec![RPC_PACKET_VERSION, 0];
    expected.extend(1u32.to_le_bytes());
    expected.extend(0xaabb_ccddu32.to_le_bytes());
    expected.extend(0x1122_3344u32.to_le_bytes());
    expected.extend(7u32.to_le_bytes());
    expected.extend(0u32.to_le_bytes());
    expected.extend(2u32.to_le_bytes());
    expected.extend(b"ab");

    assert_eq!(packet.encode(), expected);
}

#[test]
fn cancel_packet_carries_cancelled_status() {
    let packet = RpcPacket::cancel(&test_key());

    assert_eq!(packet.packet_type, RpcPacketType::ClientError);
    assert_eq!(packet.status, RpcStatus::Cancelled);
    assert_eq!(packet.key(), test_key());
}

#[test]
fn decode_rejects_malformed_packets() {
    let valid = RpcPacket::request(&test_key(), b"abc".to_vec()).encode();

    assert_eq!(
        RpcPacket::decode(&valid[..RPC_PACKET_HEADER_SIZE - 1]),
        Err(RpcPacketDecodeError::TooShort)
    );

    let mut bad_version = valid.clone();
    bad_version[0] = 9;
    assert_eq!(
        RpcPacket::decode(&bad_version),
        Err(RpcPacketDecodeError::UnsupportedVersion(9))
    );

    let mut bad_type = valid.clone();
    bad_type[1] = 6;
    assert_eq!(
        RpcPacket::decode(&bad_type),
        Err(RpcPacketDecodeError::UnknownPacketType(6))
    );

    let mut bad_status = valid.clone();
    bad_status[18..22].copy_from_slice(&17u32.to_le_bytes());
    assert_eq!(
        RpcPacket::decode(&bad_status),
        Err(RpcPacketDecodeError::UnknownStatus(17))
    );

    let truncated = &valid[..valid.len() - 1];
    assert_eq!(
        RpcPacket::decode(truncated),
        Err(RpcPacketDecodeError::LengthMismatch {
            declared: 3,
            actual: 2
        })
    );
}

#[test]
fn status_codes_roundtrip() {
    for value in 0..=16u32 {
        let status = RpcStatus::try_from(value).expect("canonical status");
        assert_eq!(status.value(), value);
    }
    assert!(RpcStatus::try_from(17).is_err());
    assert!(RpcStatus::Ok.is_ok());
    assert_eq!(RpcStatus::Aborted.to_string(), "ABORTED");
}
