//! UDP-bound stream backend
//!
//! Each stream binds its dedicated port, leases a vocoder channel and runs
//! a receive thread that records when the client last sent a frame.
//! Activity is what the controller's shutdown sweep looks at.

use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::constants::{MAX_PACKET_SIZE, RECEIVE_TIMEOUT_MS};
use crate::error::StreamError;
use crate::network::{create_socket, is_timeout};
use crate::stream::vocoder::{VocoderChannel, VocoderPool};
use crate::stream::{StreamDescriptor, StreamFactory, StreamHandle};

/// Creates [`UdpStream`]s sharing one vocoder pool
pub struct UdpStreamFactory {
    bind_address: IpAddr,
    pool: Arc<VocoderPool>,
    activity_timeout: Duration,
}

impl UdpStreamFactory {
    pub fn new(bind_address: IpAddr, pool: Arc<VocoderPool>, activity_timeout: Duration) -> Self {
        Self {
            bind_address,
            pool,
            activity_timeout,
        }
    }

    pub fn pool(&self) -> &Arc<VocoderPool> {
        &self.pool
    }
}

impl StreamFactory for UdpStreamFactory {
    fn create(&self, descriptor: &StreamDescriptor) -> Box<dyn StreamHandle> {
        Box::new(UdpStream::new(
            descriptor,
            self.bind_address,
            Arc::clone(&self.pool),
            self.activity_timeout,
        ))
    }
}

/// Counters shared with the receive thread
struct Activity {
    /// Reference point for `last_frame_us`
    epoch: Instant,
    last_frame_us: AtomicU64,
    frames_received: AtomicU64,
    bytes_received: AtomicU64,
}

impl Activity {
    fn new() -> Self {
        Self {
            epoch: Instant::now(),
            last_frame_us: AtomicU64::new(0),
            frames_received: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
        }
    }

    fn touch(&self) {
        let now = self.epoch.elapsed().as_micros() as u64;
        self.last_frame_us.store(now, Ordering::Relaxed);
    }

    fn idle_for(&self) -> Duration {
        let now = self.epoch.elapsed().as_micros() as u64;
        let last = self.last_frame_us.load(Ordering::Relaxed);
        Duration::from_micros(now.saturating_sub(last))
    }
}

/// Per-stream traffic statistics
#[derive(Debug, Clone, Default)]
pub struct UdpStreamStats {
    pub frames_received: u64,
    pub bytes_received: u64,
    pub idle: Duration,
}

/// Stream handle bound to a dedicated UDP port
pub struct UdpStream {
    id: u16,
    /// Only frames from this host count as activity
    client: IpAddr,
    bind_address: IpAddr,
    pool: Arc<VocoderPool>,
    activity_timeout: Duration,

    channel: Option<VocoderChannel>,
    local_addr: Option<SocketAddr>,
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
    activity: Arc<Activity>,
}

impl UdpStream {
    pub fn new(
        descriptor: &StreamDescriptor,
        bind_address: IpAddr,
        pool: Arc<VocoderPool>,
        activity_timeout: Duration,
    ) -> Self {
        Self {
            id: descriptor.id,
            client: descriptor.remote.ip(),
            bind_address,
            pool,
            activity_timeout,
            channel: None,
            local_addr: None,
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
            activity: Arc::new(Activity::new()),
        }
    }

    /// Check if the stream holds its resources
    pub fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    /// Address of the bound stream socket
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Vocoder channel leased by this stream
    pub fn vocoder_channel(&self) -> Option<usize> {
        self.channel.as_ref().map(VocoderChannel::index)
    }

    /// Get statistics
    pub fn stats(&self) -> UdpStreamStats {
        UdpStreamStats {
            frames_received: self.activity.frames_received.load(Ordering::Relaxed),
            bytes_received: self.activity.bytes_received.load(Ordering::Relaxed),
            idle: self.activity.idle_for(),
        }
    }
}

impl StreamHandle for UdpStream {
    fn open(&mut self, port: u16) -> Result<(), StreamError> {
        if self.is_open() {
            return Ok(());
        }

        let channel = self.pool.acquire().ok_or(StreamError::NoVocoderAvailable)?;

        let addr = SocketAddr::new(self.bind_address, port);
        let socket = create_socket(addr, Some(Duration::from_millis(RECEIVE_TIMEOUT_MS)))
            .map_err(|e| StreamError::PortBindFailed {
                port,
                reason: e.to_string(),
            })?;
        let local_addr = socket.local_addr().ok();

        let running = self.running.clone();
        let activity = self.activity.clone();
        let client = self.client;
        let id = self.id;

        // Reset counters
        activity.frames_received.store(0, Ordering::SeqCst);
        activity.bytes_received.store(0, Ordering::SeqCst);
        activity.touch();

        running.store(true, Ordering::SeqCst);

        let handle = thread::Builder::new()
            .name(format!("stream-{}", id))
            .spawn(move || {
                let mut buf = [0u8; MAX_PACKET_SIZE];

                while running.load(Ordering::Relaxed) {
                    match socket.recv_from(&mut buf) {
                        Ok((len, from)) => {
                            if from.ip() != client {
                                tracing::trace!("Stream {}: ignoring frame from {}", id, from);
                                continue;
                            }
                            activity.touch();
                            activity.frames_received.fetch_add(1, Ordering::Relaxed);
                            activity.bytes_received.fetch_add(len as u64, Ordering::Relaxed);
                        }
                        Err(e) if is_timeout(&e) => {}
                        Err(e) => {
                            tracing::warn!("Stream {} receive error: {}", id, e);
                        }
                    }
                }
                // socket is dropped here, releasing the port
            });

        let handle = match handle {
            Ok(handle) => handle,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(StreamError::WorkerSpawnFailed(e.to_string()));
            }
        };

        tracing::debug!(
            "Stream {} bound to {:?} on vocoder channel {}",
            id,
            local_addr,
            channel.index()
        );

        self.thread_handle = Some(handle);
        self.local_addr = local_addr;
        self.channel = Some(channel);
        Ok(())
    }

    fn close(&mut self) {
        self.running.store(false, Ordering::SeqCst);

        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }

        self.local_addr = None;
        self.channel = None;
    }

    fn is_active(&self) -> bool {
        self.is_open() && self.activity.idle_for() <= self.activity_timeout
    }
}

impl Drop for UdpStream {
    fn drop(&mut self) {
        self.close();
    }
}
