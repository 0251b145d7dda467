//! Per-datagram request handling

use bytes::Bytes;
use std::net::SocketAddr;

use crate::controller::lifecycle::StreamLifecycle;
use crate::protocol::{
    decode_request, encode_keep_alive_reply, encode_no_stream_available,
    encode_stream_descriptor, ControlRequest,
};
use crate::stream::StreamFactory;

/// Turns one inbound datagram into table changes and an optional reply
pub struct Dispatcher<F> {
    lifecycle: StreamLifecycle<F>,
}

impl<F: StreamFactory> Dispatcher<F> {
    pub fn new(lifecycle: StreamLifecycle<F>) -> Self {
        Self { lifecycle }
    }

    /// Handle one datagram from `from`, returning the reply to send back
    pub fn handle(&mut self, datagram: &[u8], from: SocketAddr) -> Option<Bytes> {
        let Some(request) = decode_request(datagram) else {
            tracing::trace!("Ignoring {} byte datagram from {}", datagram.len(), from);
            return None;
        };

        match request {
            ControlRequest::OpenStream(open) => {
                tracing::info!("Stream open from {} ({})", open.callsign, from);

                let reply = match self.lifecycle.allocate_and_open(
                    open.callsign,
                    from,
                    open.codec_in,
                    open.codec_out,
                ) {
                    Some(descriptor) => encode_stream_descriptor(&descriptor),
                    None => {
                        tracing::warn!("No stream available for {}", open.callsign);
                        encode_no_stream_available()
                    }
                };
                Some(reply)
            }
            ControlRequest::CloseStream { stream_id } => {
                if self.lifecycle.close(stream_id) {
                    tracing::info!("Stream {} closed", stream_id);
                } else {
                    tracing::debug!("Close for unknown stream {} from {}", stream_id, from);
                }
                None
            }
            ControlRequest::KeepAlive { callsign } => {
                tracing::debug!("Keep-alive from {} ({})", callsign, from);
                Some(encode_keep_alive_reply())
            }
        }
    }

    pub fn lifecycle(&self) -> &StreamLifecycle<F> {
        &self.lifecycle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::table::StreamTable;
    use crate::stream::testing::ScriptedFactory;
    use std::sync::Arc;

    const BASE: u16 = 10100;

    fn dispatcher(factory: &ScriptedFactory) -> Dispatcher<ScriptedFactory> {
        let table = Arc::new(StreamTable::new());
        Dispatcher::new(StreamLifecycle::new(factory.clone(), table, BASE, 99, false))
    }

    fn client() -> SocketAddr {
        "192.168.1.20:30001".parse().unwrap()
    }

    fn open_packet() -> Vec<u8> {
        let mut buf = b"AMBEDOS".to_vec();
        buf.extend_from_slice(b"N7TAE   ");
        buf.extend_from_slice(&[1, 1]);
        buf
    }

    fn close_packet(id: u16) -> Vec<u8> {
        let mut buf = b"AMBEDCS".to_vec();
        buf.extend_from_slice(&id.to_ne_bytes());
        buf
    }

    #[test]
    fn test_keep_alive_reply() {
        let factory = ScriptedFactory::new();
        let mut d = dispatcher(&factory);

        let mut ping = b"AMBEDPING".to_vec();
        ping.extend_from_slice(b"N7TAE   ");
        assert_eq!(ping.len(), 17);

        let reply = d.handle(&ping, client()).unwrap();
        assert_eq!(&reply[..], b"AMBEDPONG");
        assert!(d.lifecycle().table().is_empty());
    }

    #[test]
    fn test_open_reply_describes_stream() {
        let factory = ScriptedFactory::new();
        let mut d = dispatcher(&factory);

        let reply = d.handle(&open_packet(), client()).unwrap();
        assert_eq!(reply.len(), 14);
        assert_eq!(&reply[..8], b"AMBEDSTD");
        assert_eq!(u16::from_ne_bytes([reply[8], reply[9]]), 1);
        assert_eq!(u16::from_ne_bytes([reply[10], reply[11]]), BASE + 1);
        assert_eq!(reply[12], 1);
        assert_eq!(reply[13], 1);

        let table = d.lifecycle().table();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(1).unwrap().remote, client());
    }

    #[test]
    fn test_busy_when_open_fails() {
        let factory = ScriptedFactory::new();
        factory.fail_opens(true);
        let mut d = dispatcher(&factory);

        let reply = d.handle(&open_packet(), client()).unwrap();
        assert_eq!(&reply[..], b"AMBEDBUSY");
        assert!(d.lifecycle().table().is_empty());
    }

    #[test]
    fn test_close_sends_no_reply() {
        let factory = ScriptedFactory::new();
        let mut d = dispatcher(&factory);
        d.handle(&open_packet(), client()).unwrap();

        assert!(d.handle(&close_packet(1), client()).is_none());
        assert!(d.lifecycle().table().is_empty());

        // already closed
        assert!(d.handle(&close_packet(1), client()).is_none());
        assert_eq!(factory.closed(), vec![1]);
    }

    #[test]
    fn test_unrecognized_datagrams_are_dropped() {
        let factory = ScriptedFactory::new();
        let mut d = dispatcher(&factory);

        let mut short_open = open_packet();
        short_open.pop();

        assert!(d.handle(&short_open, client()).is_none());
        assert!(d.handle(b"HELLO", client()).is_none());
        assert!(d.handle(b"AMBEDCS", client()).is_none());
        assert!(d.lifecycle().table().is_empty());
        assert!(factory.opened().is_empty());
    }
}
