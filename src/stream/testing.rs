//! Scripted stream backend for controller tests

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::StreamError;
use crate::stream::{StreamDescriptor, StreamFactory, StreamHandle};

#[derive(Default)]
struct Script {
    fail_opens: AtomicBool,
    inactive: Mutex<HashSet<u16>>,
    opened: Mutex<Vec<(u16, u16)>>,
    closed: Mutex<Vec<u16>>,
}

/// Factory whose handles follow a shared script
#[derive(Clone, Default)]
pub(crate) struct ScriptedFactory {
    script: Arc<Script>,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `open` fail
    pub fn fail_opens(&self, fail: bool) {
        self.script.fail_opens.store(fail, Ordering::SeqCst);
    }

    pub fn set_inactive(&self, id: u16) {
        self.script.inactive.lock().insert(id);
    }

    /// `(id, port)` of every successful open, in order
    pub fn opened(&self) -> Vec<(u16, u16)> {
        self.script.opened.lock().clone()
    }

    /// Ids of every close, in order
    pub fn closed(&self) -> Vec<u16> {
        self.script.closed.lock().clone()
    }
}

impl StreamFactory for ScriptedFactory {
    fn create(&self, descriptor: &StreamDescriptor) -> Box<dyn StreamHandle> {
        Box::new(ScriptedHandle {
            id: descriptor.id,
            open: false,
            script: Arc::clone(&self.script),
        })
    }
}

struct ScriptedHandle {
    id: u16,
    open: bool,
    script: Arc<Script>,
}

impl StreamHandle for ScriptedHandle {
    fn open(&mut self, port: u16) -> Result<(), StreamError> {
        if self.script.fail_opens.load(Ordering::SeqCst) {
            return Err(StreamError::NoVocoderAvailable);
        }
        self.open = true;
        self.script.opened.lock().push((self.id, port));
        Ok(())
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.script.closed.lock().push(self.id);
        }
    }

    fn is_active(&self) -> bool {
        self.open && !self.script.inactive.lock().contains(&self.id)
    }
}
