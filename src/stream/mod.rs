//! Transcoding streams
//!
//! A [`Stream`] pairs the controller-side description of a session with a
//! [`StreamHandle`] that owns the actual resources (dedicated port and
//! vocoder channel). Handles are produced by a [`StreamFactory`], which
//! lets the controller run against the UDP backend in production and a
//! scripted backend in tests.

pub mod udp;
pub mod vocoder;

#[cfg(test)]
pub(crate) mod testing;

use std::net::SocketAddr;

use crate::error::StreamError;
use crate::protocol::{Callsign, Codec};

pub use udp::{UdpStream, UdpStreamFactory, UdpStreamStats};
pub use vocoder::{VocoderChannel, VocoderPool};

/// Everything the controller knows about a stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDescriptor {
    pub id: u16,
    pub callsign: Callsign,
    pub remote: SocketAddr,
    pub codec_in: Codec,
    pub codec_out: Codec,
    /// Dedicated port the stream's audio path binds to
    pub port: u16,
}

/// Resource side of a stream
pub trait StreamHandle: Send {
    /// Bind the dedicated port and acquire a vocoder resource
    ///
    /// On error nothing stays acquired.
    fn open(&mut self, port: u16) -> Result<(), StreamError>;

    /// Release everything acquired by `open`; calling it twice is harmless
    fn close(&mut self);

    /// Whether the stream has seen traffic recently
    fn is_active(&self) -> bool;
}

/// Builds stream handles for the controller
pub trait StreamFactory: Send + 'static {
    fn create(&self, descriptor: &StreamDescriptor) -> Box<dyn StreamHandle>;
}

/// A live (or about to be live) transcoding stream
pub struct Stream {
    descriptor: StreamDescriptor,
    handle: Box<dyn StreamHandle>,
}

impl Stream {
    pub fn new(descriptor: StreamDescriptor, handle: Box<dyn StreamHandle>) -> Self {
        Self { descriptor, handle }
    }

    /// Open the underlying resources on the descriptor's port
    pub fn open(&mut self) -> Result<(), StreamError> {
        self.handle.open(self.descriptor.port)
    }

    /// Release the resources and discard the stream
    pub fn close(mut self) {
        self.handle.close();
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_active()
    }

    pub fn id(&self) -> u16 {
        self.descriptor.id
    }

    pub fn port(&self) -> u16 {
        self.descriptor.port
    }

    pub fn descriptor(&self) -> &StreamDescriptor {
        &self.descriptor
    }
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}
