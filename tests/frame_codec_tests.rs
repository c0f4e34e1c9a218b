use hdlc_rpc::constants::{DEFAULT_RPC_ADDRESS, HDLC_ESCAPE, HDLC_FLAG, HDLC_UI_FRAME_CONTROL};
use hdlc_rpc::frame::{Frame, FrameCodec, FrameDecodeError, FrameDecoder};
use rand::Rng;

fn decode_all(decoder: &mut FrameDecoder, bytes: &[u8]) -> Vec<Frame> {
    decoder.read_bytes(bytes).collect()
}

#[test]
fn encode_decode_roundtrip_with_special_bytes() {
    let all_bytes: Vec<u8> = (0..=255u8).collect();
    let payloads: Vec<Vec<u8>> = vec![
        vec![],
        b"O_o #0".to_vec(),
        vec![HDLC_FLAG],
        vec![HDLC_ESCAPE],
        vec![HDLC_FLAG, HDLC_ESCAPE, HDLC_FLAG, HDLC_ESCAPE],
        all_bytes,
    ];

    for payload in payloads {
        let encoded = FrameCodec::encode_ui_frame(DEFAULT_RPC_ADDRESS, &payload);

        // Flags only appear as delimiters
        assert_eq!(encoded.first(), Some(&HDLC_FLAG));
        assert_eq!(encoded.last(), Some(&HDLC_FLAG));
        assert!(!encoded[1..encoded.len() - 1].contains(&HDLC_FLAG));

        let mut decoder = FrameDecoder::new();
        let frames = decode_all(&mut decoder, &encoded);

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].address, DEFAULT_RPC_ADDRESS);
        assert_eq!(frames[0].control, HDLC_UI_FRAME_CONTROL);
        assert_eq!(frames[0].data, payload);
    }
}

#[test]
fn known_frame_layout() {
    let encoded = FrameCodec::encode_ui_frame(DEFAULT_RPC_ADDRESS, b"hi");

    // Address 82 is a single one-terminated varint byte
    let mut content = vec![0xA5, HDLC_UI_FRAME_CONTROL, b'h', b'i'];
    let fcs = crc32fast::hash(&content);
    content.extend(fcs.to_le_bytes());

    let mut expected = vec![HDLC_FLAG];
    for byte in content {
        if byte == HDLC_FLAG || byte == HDLC_ESCAPE {
            expected.push(HDLC_ESCAPE);
            expected.push(byte ^ 0x20);
        } else {
            expected.push(byte);
        }
    }
    expected.push(HDLC_FLAG);

    assert_eq!(encoded, expected);
}

#[test]
fn decode_rejects_bad_checksum() {
    let mut content = vec![0xA5, HDLC_UI_FRAME_CONTROL, 1, 2, 3];
    let fcs = crc32fast::hash(&content) ^ 0xFFFF_FFFF;
    content.extend(fcs.to_le_bytes());

    assert_eq!(
        FrameCodec::decode(&content),
        Err(FrameDecodeError::InvalidChecksum)
    );
    assert_eq!(
        FrameCodec::decode(&[0xA5, HDLC_UI_FRAME_CONTROL]),
        Err(FrameDecodeError::TooShort)
    );
}

#[test]
fn decoder_handles_incomplete_input() {
    let full = FrameCodec::encode_ui_frame(DEFAULT_RPC_ADDRESS, b"xyz");
    let split = full.split_at(full.len() / 2);

    let mut decoder = FrameDecoder::new();

    assert_eq!(decode_all(&mut decoder, split.0).len(), 0); // Incomplete frame

    let frames = decode_all(&mut decoder, split.1);
    assert_eq!(frames.len(), 1); // Now complete
    assert_eq!(frames[0].data, b"xyz");
}

#[test]
fn decoder_tolerates_random_splits() {
    let payloads: Vec<Vec<u8>> = (0..40)
        .map(|i| {
            let mut payload = format!("O_o #{i}").into_bytes();
            payload.extend([HDLC_FLAG, HDLC_ESCAPE, i as u8]);
            payload
        })
        .collect();

    let stream: Vec<u8> = payloads
        .iter()
        .flat_map(|payload| FrameCodec::encode_ui_frame(DEFAULT_RPC_ADDRESS, payload))
        .collect();

    let mut rng = rand::rng();
    let mut decoder = FrameDecoder::new();
    let mut frames = vec![];

    let mut remaining = &stream[..];
    while !remaining.is_empty() {
        let take = rng.random_range(1..=remaining.len().min(17));
        let (chunk, rest) = remaining.split_at(take);
        frames.extend(decoder.read_bytes(chunk));
        remaining = rest;
    }

    let decoded: Vec<Vec<u8>> = frames.into_iter().map(|f| f.data).collect();
    assert_eq!(decoded, payloads);
    assert_eq!(decoder.stats().frames_decoded, 40);
    assert_eq!(decoder.stats().frames_dropped, 0);
}

#[test]
fn decoder_resyncs_after_corrupted_frame() {
    let mut first = FrameCodec::encode_ui_frame(DEFAULT_RPC_ADDRESS, b"hello");
    let second = FrameCodec::encode_ui_frame(DEFAULT_RPC_ADDRESS, b"world");

    // Index 3 is the first data byte ('h'); flipping one bit breaks the FCS
    assert_eq!(first[3], b'h');
    first[3] ^= 0x01;

    let mut stream = first;
    stream.extend(&second);

    let mut decoder = FrameDecoder::new();
    let frames = decode_all(&mut decoder, &stream);

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].data, b"world");
    assert_eq!(decoder.stats().frames_dropped, 1);
}

#[test]
fn decoder_resyncs_with_shared_flag() {
    // Frames may share a single flag between them
    let first = FrameCodec::encode_ui_frame(DEFAULT_RPC_ADDRESS, b"one");
    let second = FrameCodec::encode_ui_frame(DEFAULT_RPC_ADDRESS, b"two");

    let mut stream = first.clone();
    stream.extend(&second[1..]);

    let mut decoder = FrameDecoder::new();
    let frames = decode_all(&mut decoder, &stream);

    let decoded: Vec<&[u8]> = frames.iter().map(|f| f.data.as_slice()).collect();
    assert_eq!(decoded, vec![&b"one"[..], &b"two"[..]]);
}

#[test]
fn decoder_discards_leading_garbage_and_repeated_flags() {
    let mut stream = b"boot log line\n".to_vec();
    stream.extend([HDLC_FLAG, HDLC_FLAG, HDLC_FLAG]);
    stream.extend(FrameCodec::encode_ui_frame(DEFAULT_RPC_ADDRESS, b"payload"));
    stream.extend([HDLC_FLAG, HDLC_FLAG]);

    let mut decoder = FrameDecoder::new();
    let frames = decode_all(&mut decoder, &stream);

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].data, b"payload");
    assert_eq!(decoder.stats().frames_dropped, 0);
}

#[test]
fn decoder_drops_escape_followed_by_flag() {
    let mut stream = vec![HDLC_FLAG, 0xA5, HDLC_UI_FRAME_CONTROL, HDLC_ESCAPE];
    stream.extend(FrameCodec::encode_ui_frame(DEFAULT_RPC_ADDRESS, b"after"));

    let mut decoder = FrameDecoder::new();
    let frames = decode_all(&mut decoder, &stream);

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].data, b"after");
    assert_eq!(decoder.stats().frames_dropped, 1);
}

#[test]
fn decoder_drops_oversized_frames() {
    let big = FrameCodec::encode_ui_frame(DEFAULT_RPC_ADDRESS, &[0x11; 256]);
    let small = FrameCodec::encode_ui_frame(DEFAULT_RPC_ADDRESS, &[0x22; 8]);

    let mut stream = big;
    stream.extend(&small);

    let mut decoder = FrameDecoder::with_max_frame_size(64);
    let frames = decode_all(&mut decoder, &stream);

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].data, vec![0x22; 8]);
    assert_eq!(decoder.stats().frames_dropped, 1);
}

#[test]
fn frames_keep_their_address() {
    let frame = Frame::ui(1, b"log".to_vec());
    let mut decoder = FrameDecoder::new();
    let frames = decode_all(&mut decoder, &FrameCodec::encode(&frame));

    assert_eq!(frames, vec![frame]);
}
