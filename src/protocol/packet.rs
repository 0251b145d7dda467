//! Control packet recognition and encoding
//!
//! Decoders return `None` when a buffer is not the packet kind they look
//! for; that is never an error. Multi-byte fields travel in native byte
//! order, matching the clients deployed against this daemon.

use bytes::{BufMut, Bytes, BytesMut};

use crate::protocol::callsign::{Callsign, CALLSIGN_LEN};
use crate::protocol::codec::Codec;
use crate::stream::StreamDescriptor;

const OPEN_STREAM_TAG: &[u8] = b"AMBEDOS";
const CLOSE_STREAM_TAG: &[u8] = b"AMBEDCS";
const KEEP_ALIVE_TAG: &[u8] = b"AMBEDPING";
const STREAM_DESCRIPTOR_TAG: &[u8] = b"AMBEDSTD";
const BUSY_TAG: &[u8] = b"AMBEDBUSY";
const KEEP_ALIVE_REPLY_TAG: &[u8] = b"AMBEDPONG";

/// Exact size of an open-stream request
pub const OPEN_STREAM_LEN: usize = 17;
/// Minimum size of a close-stream request
pub const CLOSE_STREAM_MIN_LEN: usize = 9;
/// Exact size of a keep-alive request
pub const KEEP_ALIVE_LEN: usize = 17;
/// Size of a stream descriptor reply
pub const STREAM_DESCRIPTOR_LEN: usize = 14;

/// Fields of a valid open-stream request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenStreamRequest {
    pub callsign: Callsign,
    pub codec_in: Codec,
    pub codec_out: Codec,
}

/// A recognized inbound control packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRequest {
    OpenStream(OpenStreamRequest),
    CloseStream { stream_id: u16 },
    KeepAlive { callsign: Callsign },
}

/// `AMBEDOS` + callsign[8] + codec_in + codec_out, exactly 17 bytes
pub fn decode_open_stream(buf: &[u8]) -> Option<OpenStreamRequest> {
    if buf.len() != OPEN_STREAM_LEN || !buf.starts_with(OPEN_STREAM_TAG) {
        return None;
    }

    let offset = OPEN_STREAM_TAG.len();
    let callsign = Callsign::parse(&buf[offset..offset + CALLSIGN_LEN])?;
    let codec_in = Codec::from_u8(buf[15])?;
    let codec_out = Codec::from_u8(buf[16])?;

    Some(OpenStreamRequest {
        callsign,
        codec_in,
        codec_out,
    })
}

/// `AMBEDCS` + stream id (u16), at least 9 bytes
///
/// Trailing bytes past the id are ignored.
pub fn decode_close_stream(buf: &[u8]) -> Option<u16> {
    if buf.len() < CLOSE_STREAM_MIN_LEN || !buf.starts_with(CLOSE_STREAM_TAG) {
        return None;
    }

    let offset = CLOSE_STREAM_TAG.len();
    Some(u16::from_ne_bytes([buf[offset], buf[offset + 1]]))
}

/// `AMBEDPING` + callsign[8], exactly 17 bytes
pub fn decode_keep_alive(buf: &[u8]) -> Option<Callsign> {
    if buf.len() != KEEP_ALIVE_LEN || !buf.starts_with(KEEP_ALIVE_TAG) {
        return None;
    }

    Callsign::parse(&buf[KEEP_ALIVE_TAG.len()..])
}

/// Try every request kind in priority order: open, close, keep-alive
pub fn decode_request(buf: &[u8]) -> Option<ControlRequest> {
    if let Some(open) = decode_open_stream(buf) {
        return Some(ControlRequest::OpenStream(open));
    }
    if let Some(stream_id) = decode_close_stream(buf) {
        return Some(ControlRequest::CloseStream { stream_id });
    }
    decode_keep_alive(buf).map(|callsign| ControlRequest::KeepAlive { callsign })
}

/// `AMBEDSTD` + id (u16) + port (u16) + codec_in (u8) + codec_out (u8)
pub fn encode_stream_descriptor(stream: &StreamDescriptor) -> Bytes {
    let mut buf = BytesMut::with_capacity(STREAM_DESCRIPTOR_LEN);
    buf.put_slice(STREAM_DESCRIPTOR_TAG);
    buf.put_u16_ne(stream.id);
    buf.put_u16_ne(stream.port);
    buf.put_u8(stream.codec_in.as_u8());
    buf.put_u8(stream.codec_out.as_u8());
    buf.freeze()
}

/// `AMBEDBUSY`
pub fn encode_no_stream_available() -> Bytes {
    Bytes::from_static(BUSY_TAG)
}

/// `AMBEDPONG`
pub fn encode_keep_alive_reply() -> Bytes {
    Bytes::from_static(KEEP_ALIVE_REPLY_TAG)
}
