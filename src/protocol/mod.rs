//! UDP control protocol spoken between codec clients and the transcoder
//!
//! All packets are tag-prefixed ASCII with fixed layouts; there is no
//! length field, checksum or version byte.

pub mod callsign;
pub mod codec;
pub mod packet;

pub use callsign::{Callsign, CALLSIGN_LEN};
pub use codec::Codec;
pub use packet::{
    decode_close_stream, decode_keep_alive, decode_open_stream, decode_request,
    encode_keep_alive_reply, encode_no_stream_available, encode_stream_descriptor,
    ControlRequest, OpenStreamRequest,
};
