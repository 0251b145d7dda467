//! Stream controller
//!
//! A single worker thread polls the control socket with a bounded wait,
//! dispatches each datagram and replies on the same socket. The stream
//! table is shared with the owning thread, which tears every remaining
//! stream down at shutdown.

pub mod dispatch;
pub mod lifecycle;
pub mod table;

use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::ControllerConfig;
use crate::constants::MAX_PACKET_SIZE;
use crate::error::{Error, Result};
use crate::network::{create_socket, is_timeout};
use crate::stream::StreamFactory;

pub use dispatch::Dispatcher;
pub use lifecycle::{StreamIdAllocator, StreamLifecycle};
pub use table::StreamTable;

/// Controller lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Worker thread is polling the control socket
    Running,
    /// Stop requested, waiting for the worker to return
    Stopping,
    /// Worker has returned
    Stopped,
}

/// Owns the control socket worker and the stream table
pub struct Controller {
    table: Arc<StreamTable>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    state: ControllerState,
    local_addr: SocketAddr,
}

impl Controller {
    /// Bind the control socket and start the worker thread
    ///
    /// Fails without starting anything if the socket cannot be bound.
    pub fn start<F: StreamFactory>(config: &ControllerConfig, factory: F) -> Result<Self> {
        let socket = create_socket(config.socket_addr(), Some(config.receive_timeout()))?;
        let local_addr = socket.local_addr()?;

        let table = Arc::new(StreamTable::new());
        let lifecycle = StreamLifecycle::new(
            factory,
            table.clone(),
            config.base_port(),
            config.max_streams,
            config.strict_id_allocation,
        );

        let running = Arc::new(AtomicBool::new(true));
        let worker = Worker {
            socket,
            dispatcher: Dispatcher::new(lifecycle),
            running: running.clone(),
            receive_timeout: config.receive_timeout(),
        };

        let handle = thread::Builder::new()
            .name("ambed-controller".to_string())
            .spawn(move || worker.run())
            .map_err(Error::Io)?;

        tracing::info!(
            "Controller listening on {}, up to {} streams above port {}",
            local_addr,
            config.max_streams,
            config.base_port()
        );

        Ok(Self {
            table,
            running,
            worker: Some(handle),
            state: ControllerState::Running,
            local_addr,
        })
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Address the control socket is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of live streams
    pub fn stream_count(&self) -> usize {
        self.table.len()
    }

    /// Ids of live streams, ascending
    pub fn stream_ids(&self) -> Vec<u16> {
        self.table.ids()
    }

    /// Stop the worker and wait for it
    ///
    /// The worker sweeps inactive streams before returning. Latency is
    /// bounded by the receive timeout.
    pub fn stop(&mut self) {
        if self.state == ControllerState::Stopped {
            return;
        }

        self.state = ControllerState::Stopping;
        self.running.store(false, Ordering::SeqCst);

        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                tracing::error!("Controller worker panicked");
            }
        }

        self.state = ControllerState::Stopped;
    }

    /// Stop the worker, then close every remaining stream regardless of activity
    ///
    /// Returns the number of streams closed by the teardown.
    pub fn shutdown(&mut self) -> usize {
        self.stop();

        let remaining = self.table.drain_all();
        let count = remaining.len();
        for stream in remaining {
            tracing::debug!("Closing stream {} at shutdown", stream.id());
            stream.close();
        }

        if count > 0 {
            tracing::info!("Closed {} remaining streams", count);
        }
        count
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// State moved onto the worker thread
struct Worker<F> {
    socket: UdpSocket,
    dispatcher: Dispatcher<F>,
    running: Arc<AtomicBool>,
    receive_timeout: Duration,
}

impl<F: StreamFactory> Worker<F> {
    fn run(mut self) {
        let mut buf = [0u8; MAX_PACKET_SIZE];

        while self.running.load(Ordering::Relaxed) {
            match self.socket.recv_from(&mut buf) {
                Ok((len, from)) => {
                    if let Some(reply) = self.dispatcher.handle(&buf[..len], from) {
                        if let Err(e) = self.socket.send_to(&reply, from) {
                            tracing::warn!("Failed to send reply to {}: {}", from, e);
                        }
                    }
                }
                Err(e) if is_timeout(&e) => {}
                Err(e) => {
                    tracing::warn!("Control socket receive error: {}", e);
                    thread::sleep(self.receive_timeout);
                }
            }
        }

        let swept = self.dispatcher.lifecycle().sweep_inactive();
        tracing::info!("Controller stopped, {} inactive streams swept", swept);
        // control socket is closed when the worker returns
    }
}
