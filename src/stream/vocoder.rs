//! Vocoder channel pool
//!
//! Transcoding hardware exposes a fixed number of channels. A stream must
//! hold one for its whole life; the lease frees the slot when dropped.

use parking_lot::Mutex;
use std::sync::Arc;

/// Fixed-size pool of vocoder channels
pub struct VocoderPool {
    /// `true` when the slot is leased
    slots: Mutex<Vec<bool>>,
}

impl VocoderPool {
    /// Create a pool with `channels` slots
    pub fn new(channels: usize) -> Arc<Self> {
        Arc::new(Self {
            slots: Mutex::new(vec![false; channels]),
        })
    }

    /// Lease a free channel, `None` when all are in use
    pub fn acquire(self: &Arc<Self>) -> Option<VocoderChannel> {
        let mut slots = self.slots.lock();
        let index = slots.iter().position(|in_use| !in_use)?;
        slots[index] = true;

        Some(VocoderChannel {
            index,
            pool: Arc::clone(self),
        })
    }

    /// Number of free channels
    pub fn available(&self) -> usize {
        self.slots.lock().iter().filter(|in_use| !**in_use).count()
    }

    /// Total number of channels
    pub fn capacity(&self) -> usize {
        self.slots.lock().len()
    }

    fn release(&self, index: usize) {
        if let Some(slot) = self.slots.lock().get_mut(index) {
            *slot = false;
        }
    }
}

/// Lease on one vocoder channel
pub struct VocoderChannel {
    index: usize,
    pool: Arc<VocoderPool>,
}

impl VocoderChannel {
    pub fn index(&self) -> usize {
        self.index
    }
}

impl Drop for VocoderChannel {
    fn drop(&mut self) {
        self.pool.release(self.index);
    }
}
