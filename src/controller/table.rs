//! Stream table
//!
//! Live streams keyed by id, behind one lock. The lock only covers the map
//! operation itself; opening and closing stream resources always happens
//! after the lock is released, on streams that have already been taken out
//! of (or not yet put into) the map.

use parking_lot::Mutex;
use std::collections::HashMap;

use crate::stream::{Stream, StreamDescriptor};

/// Live streams keyed by id
#[derive(Default)]
pub struct StreamTable {
    streams: Mutex<HashMap<u16, Stream>>,
}

impl StreamTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a stream, returning whatever was stored under the same id
    pub fn insert(&self, stream: Stream) -> Option<Stream> {
        self.streams.lock().insert(stream.id(), stream)
    }

    /// Remove the stream with `id`
    pub fn remove(&self, id: u16) -> Option<Stream> {
        self.streams.lock().remove(&id)
    }

    /// Take out every stream reporting inactive
    pub fn drain_inactive(&self) -> Vec<Stream> {
        let mut streams = self.streams.lock();

        let inactive: Vec<u16> = streams
            .iter()
            .filter(|(_, stream)| !stream.is_active())
            .map(|(id, _)| *id)
            .collect();

        inactive
            .into_iter()
            .filter_map(|id| streams.remove(&id))
            .collect()
    }

    /// Take out every stream regardless of activity
    pub fn drain_all(&self) -> Vec<Stream> {
        self.streams.lock().drain().map(|(_, stream)| stream).collect()
    }

    pub fn contains(&self, id: u16) -> bool {
        self.streams.lock().contains_key(&id)
    }

    /// Descriptor of a live stream
    pub fn get(&self, id: u16) -> Option<StreamDescriptor> {
        self.streams.lock().get(&id).map(|s| s.descriptor().clone())
    }

    /// Ids of all live streams, ascending
    pub fn ids(&self) -> Vec<u16> {
        let mut ids: Vec<u16> = self.streams.lock().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.streams.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Callsign, Codec};
    use crate::stream::testing::ScriptedFactory;
    use crate::stream::StreamFactory;

    fn open_stream(factory: &ScriptedFactory, id: u16) -> Stream {
        let descriptor = StreamDescriptor {
            id,
            callsign: Callsign::from_bytes(b"N7TAE"),
            remote: "127.0.0.1:40000".parse().unwrap(),
            codec_in: Codec::AmbePlus,
            codec_out: Codec::AmbePlus,
            port: 10100 + id,
        };
        let handle = factory.create(&descriptor);
        let mut stream = Stream::new(descriptor, handle);
        stream.open().unwrap();
        stream
    }

    #[test]
    fn test_insert_and_remove() {
        let factory = ScriptedFactory::new();
        let table = StreamTable::new();

        assert!(table.insert(open_stream(&factory, 1)).is_none());
        assert!(table.insert(open_stream(&factory, 2)).is_none());
        assert_eq!(table.ids(), vec![1, 2]);
        assert_eq!(table.get(2).unwrap().port, 10102);

        let removed = table.remove(1).unwrap();
        assert_eq!(removed.id(), 1);
        assert!(table.remove(1).is_none());
        assert!(!table.contains(1));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_insert_displaces_same_id() {
        let factory = ScriptedFactory::new();
        let table = StreamTable::new();

        table.insert(open_stream(&factory, 5));
        let displaced = table.insert(open_stream(&factory, 5));
        assert_eq!(displaced.map(|s| s.id()), Some(5));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_drain_inactive_leaves_active() {
        let factory = ScriptedFactory::new();
        let table = StreamTable::new();
        for id in 1..=4 {
            table.insert(open_stream(&factory, id));
        }
        factory.set_inactive(2);
        factory.set_inactive(4);

        let mut drained: Vec<u16> = table.drain_inactive().iter().map(Stream::id).collect();
        drained.sort_unstable();

        assert_eq!(drained, vec![2, 4]);
        assert_eq!(table.ids(), vec![1, 3]);
    }

    #[test]
    fn test_drain_all() {
        let factory = ScriptedFactory::new();
        let table = StreamTable::new();
        table.insert(open_stream(&factory, 1));
        table.insert(open_stream(&factory, 9));

        assert_eq!(table.drain_all().len(), 2);
        assert!(table.is_empty());
    }
}
