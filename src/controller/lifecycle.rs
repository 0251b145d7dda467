//! Stream lifecycle: id allocation, opening, closing, sweeping

use std::net::SocketAddr;
use std::sync::Arc;

use crate::controller::table::StreamTable;
use crate::protocol::{Callsign, Codec};
use crate::stream::{Stream, StreamDescriptor, StreamFactory};

/// Wrapping stream id counter over `[1, max]`
#[derive(Debug, Clone)]
pub struct StreamIdAllocator {
    last: u16,
    max: u16,
}

impl StreamIdAllocator {
    pub fn new(max: u16) -> Self {
        Self {
            last: 0,
            max: max.max(1),
        }
    }

    /// Advance to the next id, wrapping to 1 after `max`
    pub fn next_id(&mut self) -> u16 {
        self.last = if self.last >= self.max { 1 } else { self.last + 1 };
        self.last
    }

    /// Advance to the next id for which `is_live` is false
    ///
    /// Gives up after one full turn, leaving the counter where it started.
    pub fn next_free(&mut self, is_live: impl Fn(u16) -> bool) -> Option<u16> {
        for _ in 0..self.max {
            let id = self.next_id();
            if !is_live(id) {
                return Some(id);
            }
        }
        None
    }

    /// Last id handed out, 0 before the first allocation
    pub fn last(&self) -> u16 {
        self.last
    }
}

/// Owns id allocation and stream construction
///
/// Lives on the controller's worker thread, which makes it the only writer
/// of the id counter.
pub struct StreamLifecycle<F> {
    allocator: StreamIdAllocator,
    factory: F,
    table: Arc<StreamTable>,
    base_port: u16,
    /// Skip ids that are still live instead of wrapping blindly
    strict: bool,
}

impl<F: StreamFactory> StreamLifecycle<F> {
    pub fn new(
        factory: F,
        table: Arc<StreamTable>,
        base_port: u16,
        max_streams: u16,
        strict: bool,
    ) -> Self {
        Self {
            allocator: StreamIdAllocator::new(max_streams),
            factory,
            table,
            base_port,
            strict,
        }
    }

    /// Allocate an id, open a stream on its dedicated port and publish it
    ///
    /// Returns `None` when the stream could not be opened; the caller
    /// answers busy. Nothing is retried.
    pub fn allocate_and_open(
        &mut self,
        callsign: Callsign,
        remote: SocketAddr,
        codec_in: Codec,
        codec_out: Codec,
    ) -> Option<StreamDescriptor> {
        let id = if self.strict {
            let table = &self.table;
            match self.allocator.next_free(|id| table.contains(id)) {
                Some(id) => id,
                None => {
                    tracing::warn!("Stream table full, refusing {}", callsign);
                    return None;
                }
            }
        } else {
            self.allocator.next_id()
        };

        let Some(port) = self.base_port.checked_add(id) else {
            tracing::warn!("Stream {} port out of range (base {})", id, self.base_port);
            return None;
        };

        let descriptor = StreamDescriptor {
            id,
            callsign,
            remote,
            codec_in,
            codec_out,
            port,
        };
        let handle = self.factory.create(&descriptor);
        let mut stream = Stream::new(descriptor.clone(), handle);

        if let Err(e) = stream.open() {
            tracing::warn!("Failed to open stream {} for {}: {}", id, callsign, e);
            stream.close();
            return None;
        }

        if let Some(displaced) = self.table.insert(stream) {
            tracing::warn!("Stream id {} reused while still live, closing old stream", id);
            displaced.close();
        }

        tracing::info!(
            "Opened stream {} for {} ({} -> {}) on port {}",
            id,
            callsign,
            codec_in,
            codec_out,
            port
        );
        Some(descriptor)
    }

    /// Close and discard the stream with `id`; unknown ids are ignored
    pub fn close(&self, id: u16) -> bool {
        match self.table.remove(id) {
            Some(stream) => {
                stream.close();
                true
            }
            None => false,
        }
    }

    /// Close and discard every stream reporting inactive
    pub fn sweep_inactive(&self) -> usize {
        let inactive = self.table.drain_inactive();
        let count = inactive.len();

        for stream in inactive {
            tracing::info!("Stream {} activity timeout", stream.id());
            stream.close();
        }
        count
    }

    pub fn table(&self) -> &Arc<StreamTable> {
        &self.table
    }

    pub fn last_allocated(&self) -> u16 {
        self.allocator.last()
    }
}
