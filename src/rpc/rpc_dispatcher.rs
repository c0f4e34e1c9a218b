use crate::{
    constants::{DEFAULT_MAX_FRAME_SIZE, DEFAULT_RPC_ADDRESS, max_rpc_payload_size},
    frame::{FrameCodec, FrameDecoder},
    rpc::{
        RpcCallEvent, RpcCallKey, RpcCallRequest, RpcCallShape, RpcCallState,
        RpcDispatcherError, RpcPacket, RpcPacketType,
        rpc_trait::{RpcCallEventHandler, RpcEmit},
    },
};
use std::collections::HashMap;

/// Client-side call table and packet router.
///
/// The dispatcher owns the HDLC decoder for inbound bytes, the table of open
/// calls keyed by [`RpcCallKey`], and the per-call event handlers. It is
/// runtime-agnostic and synchronous: a transport feeds it bytes with
/// [`read_bytes`](Self::read_bytes) and hands it an `on_emit` callback for
/// every operation that produces outbound bytes.
///
/// A transport shares one dispatcher between the sending path (callers
/// opening and cancelling calls) and the receiving path (the read loop), so
/// it is meant to live behind a single mutex. Event handlers run while that
/// lock is held and must not block; in practice they push into channels.
pub struct RpcDispatcher<'a> {
    rpc_address: u64,
    max_payload_size: usize,
    frame_decoder: FrameDecoder,
    calls: HashMap<RpcCallKey, RpcCallEntry<'a>>,
    next_call_id: u32,
    stats: RpcDispatcherStats,
}

struct RpcCallEntry<'a> {
    shape: RpcCallShape,
    state: RpcCallState,
    client_stream_ended: bool,
    on_event: Box<dyn FnMut(RpcCallEvent) + Send + 'a>,
}

/// Counters for everything the dispatcher dropped instead of delivering.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RpcDispatcherStats {
    /// Frames rejected by the HDLC decoder (bad FCS, malformed, oversized).
    pub frames_dropped: u64,

    /// Valid frames addressed to something other than RPC.
    pub frames_ignored: u64,

    /// Frames whose contents did not decode as an `RpcPacket`.
    pub packets_malformed: u64,

    /// Packets for a call that is not open, e.g. late responses to a
    /// cancelled call.
    pub packets_unmatched: u64,

    /// Packets that are never valid at a client, such as a `Request` or a
    /// streamed response to a unary call.
    pub packets_unexpected: u64,
}

impl Default for RpcDispatcher<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> RpcDispatcher<'a> {
    pub fn new() -> Self {
        Self::with_config(DEFAULT_RPC_ADDRESS, DEFAULT_MAX_FRAME_SIZE)
    }

    pub fn with_config(rpc_address: u64, max_frame_size: usize) -> Self {
        Self {
            rpc_address,
            max_payload_size: max_rpc_payload_size(max_frame_size),
            frame_decoder: FrameDecoder::with_max_frame_size(max_frame_size),
            calls: HashMap::new(),
            next_call_id: 1,
            stats: RpcDispatcherStats::default(),
        }
    }

    pub fn rpc_address(&self) -> u64 {
        self.rpc_address
    }

    /// Largest payload a request or client stream message may carry.
    ///
    /// Derived from the maximum frame size, which is assumed to be the same
    /// on both ends of the connection.
    pub fn max_payload_size(&self) -> usize {
        self.max_payload_size
    }

    /// Opens a call and emits its `Request` packet.
    ///
    /// When `request.call_id` is `None`, a call id not currently in use on
    /// the (channel, service, method) tuple is picked. An explicit call id
    /// that collides with an open call, or a payload over
    /// [`max_payload_size`](Self::max_payload_size), fails fast without
    /// emitting anything.
    pub fn start_call<E, H>(
        &mut self,
        request: RpcCallRequest,
        mut on_emit: E,
        on_event: H,
    ) -> Result<RpcCallKey, RpcDispatcherError>
    where
        E: RpcEmit,
        H: RpcCallEventHandler + 'a,
    {
        self.check_payload_size(&request.payload)?;

        let call_id = match request.call_id {
            Some(call_id) => call_id,
            None => self.allocate_call_id(
                request.channel_id,
                request.service_id,
                request.method_id,
            )?,
        };

        let key = RpcCallKey {
            channel_id: request.channel_id,
            service_id: request.service_id,
            method_id: request.method_id,
            call_id,
        };

        if self.calls.contains_key(&key) {
            return Err(RpcDispatcherError::CallKeyCollision(key));
        }

        self.calls.insert(
            key,
            RpcCallEntry {
                shape: request.shape,
                state: RpcCallState::Open,
                client_stream_ended: false,
                on_event: Box::new(on_event),
            },
        );

        tracing::trace!("Opening {:?} call ({})", request.shape, key);

        self.emit_packet(&RpcPacket::request(&key, request.payload), &mut on_emit);

        Ok(key)
    }

    /// Sends one client stream message on an open call.
    pub fn send_client_stream<E>(
        &mut self,
        key: &RpcCallKey,
        payload: Vec<u8>,
        mut on_emit: E,
    ) -> Result<(), RpcDispatcherError>
    where
        E: RpcEmit,
    {
        let call = self
            .calls
            .get(key)
            .ok_or(RpcDispatcherError::CallNotOpen(*key))?;

        if call.client_stream_ended {
            return Err(RpcDispatcherError::ClientStreamEnded(*key));
        }

        self.check_payload_size(&payload)?;
        self.emit_packet(&RpcPacket::client_stream(key, payload), &mut on_emit);

        Ok(())
    }

    /// Half-closes a call: the server is told no more requests will follow.
    pub fn finish_client_stream<E>(
        &mut self,
        key: &RpcCallKey,
        mut on_emit: E,
    ) -> Result<(), RpcDispatcherError>
    where
        E: RpcEmit,
    {
        let call = self
            .calls
            .get_mut(key)
            .ok_or(RpcDispatcherError::CallNotOpen(*key))?;

        if call.client_stream_ended {
            return Err(RpcDispatcherError::ClientStreamEnded(*key));
        }
        call.client_stream_ended = true;

        self.emit_packet(&RpcPacket::client_stream_end(key), &mut on_emit);

        Ok(())
    }

    /// Cancels an open call.
    ///
    /// Emits a cancellation packet, removes the call and delivers
    /// [`RpcCallEvent::Cancelled`]. Returns `false` without doing anything
    /// if the call already reached a terminal state, so cancelling is
    /// idempotent and races with an inbound terminal packet resolve to
    /// whichever got the lock first.
    pub fn cancel<E>(&mut self, key: &RpcCallKey, mut on_emit: E) -> bool
    where
        E: RpcEmit,
    {
        let Some(mut call) = self.calls.remove(key) else {
            return false;
        };

        tracing::trace!("Cancelling call ({})", key);

        self.emit_packet(&RpcPacket::cancel(key), &mut on_emit);
        (call.on_event)(RpcCallEvent::Cancelled);

        true
    }

    /// Feeds raw transport bytes through the frame decoder and routes every
    /// RPC packet they complete.
    ///
    /// Corrupted frames, frames for other addresses and malformed packets are
    /// dropped and counted; none of them is an error for the transport.
    pub fn read_bytes(&mut self, bytes: &[u8]) {
        for frame in self.frame_decoder.read_bytes(bytes) {
            if frame.address != self.rpc_address {
                self.stats.frames_ignored += 1;
                tracing::trace!("Ignoring frame for address {}", frame.address);
                continue;
            }

            match RpcPacket::decode(&frame.data) {
                Ok(packet) => self.handle_packet(packet),
                Err(err) => {
                    self.stats.packets_malformed += 1;
                    tracing::debug!("Dropping frame: {}", err);
                }
            }
        }
    }

    /// Routes one decoded packet to the call it belongs to.
    pub fn handle_packet(&mut self, packet: RpcPacket) {
        let key = packet.key();

        match packet.packet_type {
            RpcPacketType::ServerStream => {
                let Some(call) = self.calls.get_mut(&key) else {
                    self.drop_unmatched(&packet);
                    return;
                };

                if call.shape == RpcCallShape::Unary {
                    self.stats.packets_unexpected += 1;
                    tracing::debug!("Dropping stream response for unary call ({})", key);
                    return;
                }

                call.state = RpcCallState::Streaming;
                (call.on_event)(RpcCallEvent::Payload(packet.payload));
            }
            RpcPacketType::Response | RpcPacketType::ServerError => {
                let Some(mut call) = self.calls.remove(&key) else {
                    self.drop_unmatched(&packet);
                    return;
                };

                tracing::trace!("Call completed with {} ({})", packet.status, key);

                let payload = match packet.packet_type {
                    RpcPacketType::Response => packet.payload,
                    _ => Vec::new(),
                };

                (call.on_event)(RpcCallEvent::Completed {
                    status: packet.status,
                    payload,
                });
            }
            RpcPacketType::Request
            | RpcPacketType::ClientStream
            | RpcPacketType::ClientError
            | RpcPacketType::ClientStreamEnd => {
                self.stats.packets_unexpected += 1;
                tracing::debug!(
                    "Dropping client-direction {:?} packet ({})",
                    packet.packet_type,
                    key
                );
            }
        }
    }

    /// Completes every open call with [`RpcCallEvent::TransportClosed`].
    ///
    /// Calls are removed before their handler runs, so each one observes
    /// the closure exactly once. Returns the number of calls failed.
    pub fn fail_all_calls(&mut self) -> usize {
        let calls: Vec<_> = self.calls.drain().collect();
        let count = calls.len();

        for (key, mut call) in calls {
            tracing::trace!("Failing call on transport close ({})", key);
            (call.on_event)(RpcCallEvent::TransportClosed);
        }

        count
    }

    pub fn call_state(&self, key: &RpcCallKey) -> Option<RpcCallState> {
        self.calls.get(key).map(|call| call.state)
    }

    pub fn is_call_open(&self, key: &RpcCallKey) -> bool {
        self.calls.contains_key(key)
    }

    pub fn pending_call_count(&self) -> usize {
        self.calls.len()
    }

    pub fn stats(&self) -> RpcDispatcherStats {
        RpcDispatcherStats {
            frames_dropped: self.frame_decoder.stats().frames_dropped,
            ..self.stats
        }
    }

    fn allocate_call_id(
        &mut self,
        channel_id: u32,
        service_id: u32,
        method_id: u32,
    ) -> Result<u32, RpcDispatcherError> {
        // One more attempt than there are open calls always finds a free id
        for _ in 0..=self.calls.len() {
            let call_id = self.next_call_id;
            self.next_call_id = self.next_call_id.wrapping_add(1);

            let key = RpcCallKey {
                channel_id,
                service_id,
                method_id,
                call_id,
            };

            if !self.calls.contains_key(&key) {
                return Ok(call_id);
            }
        }

        Err(RpcDispatcherError::CallIdsExhausted)
    }

    fn check_payload_size(&self, payload: &[u8]) -> Result<(), RpcDispatcherError> {
        if payload.len() > self.max_payload_size {
            return Err(RpcDispatcherError::PayloadTooLarge {
                len: payload.len(),
                max: self.max_payload_size,
            });
        }
        Ok(())
    }

    fn emit_packet<E>(&self, packet: &RpcPacket, on_emit: &mut E)
    where
        E: RpcEmit,
    {
        let bytes = FrameCodec::encode_ui_frame(self.rpc_address, &packet.encode());
        on_emit(&bytes);
    }

    fn drop_unmatched(&mut self, packet: &RpcPacket) {
        self.stats.packets_unmatched += 1;
        tracing::debug!(
            "Dropping {:?} packet with no matching call ({})",
            packet.packet_type,
            packet.key()
        );
    }
}
