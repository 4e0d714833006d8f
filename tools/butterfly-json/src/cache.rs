//! Coordinate cache: batched writes of node coordinates and way reference lists, and the
//! lookups that denormalize ways and relation members from them.

use butterfly_common::Result;

use crate::codec::{decode_ids, encode_ids, node_key, way_key, NodeCoord};
use crate::store::{KeyValueStore, WriteBatch};

pub const DEFAULT_BATCH_SIZE: usize = 50_000;

pub struct CoordinateCache<S: KeyValueStore> {
    store: S,
    batch: WriteBatch,
    batch_size: usize,
}

impl<S: KeyValueStore> CoordinateCache<S> {
    pub fn new(store: S, batch_size: usize) -> Self {
        Self {
            store,
            batch: WriteBatch::new(),
            batch_size: batch_size.max(1),
        }
    }

    pub fn pending(&self) -> usize {
        self.batch.len()
    }

    pub fn queue_node(&mut self, id: i64, coord: &NodeCoord) {
        self.batch.put(node_key(id), coord.encode());
    }

    pub fn queue_way_refs(&mut self, way_id: i64, refs: &[i64]) {
        self.batch.put(way_key(way_id), encode_ids(refs));
    }

    /// Write the pending batch once it has reached the configured size
    pub fn flush_if_full(&mut self) -> Result<()> {
        if self.batch.len() >= self.batch_size {
            self.flush(false)?;
        }
        Ok(())
    }

    /// Write the pending batch as one atomic write and start a new one
    pub fn flush(&mut self, sync: bool) -> Result<()> {
        if self.batch.is_empty() {
            return Ok(());
        }
        log::debug!("flushing {} cache writes (sync: {sync})", self.batch.len());
        self.store.write(&self.batch, sync)?;
        self.batch.clear();
        Ok(())
    }

    pub fn lookup_node(&self, id: i64) -> Result<Option<NodeCoord>> {
        let key = node_key(id);
        match self.store.get(key.as_bytes())? {
            Some(bytes) => NodeCoord::decode(&key, &bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Resolve every node of a way, in order.
    ///
    /// Returns `Ok(None)` as soon as one node is missing from the cache.
    pub fn lookup_way_nodes(&self, way_id: i64, refs: &[i64]) -> Result<Option<Vec<NodeCoord>>> {
        let mut coords = Vec::with_capacity(refs.len());
        for node_id in refs {
            match self.lookup_node(*node_id)? {
                Some(coord) => coords.push(coord),
                None => {
                    log::warn!("denormalize failed for way: {way_id} node not found: {node_id}");
                    return Ok(None);
                }
            }
        }
        Ok(Some(coords))
    }

    /// Resolve a way cached only as a reference list, then its nodes
    pub fn lookup_way_refs_then_nodes(&self, way_id: i64) -> Result<Option<Vec<NodeCoord>>> {
        let key = way_key(way_id);
        let Some(bytes) = self.store.get(key.as_bytes())? else {
            log::warn!("lookup failed for way: {way_id} noderefs not found: {key}");
            return Ok(None);
        };
        let refs = decode_ids(&key, &bytes)?;
        self.lookup_way_nodes(way_id, &refs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entrance::Entrance;
    use crate::store::MemoryStore;
    use butterfly_common::Error;

    #[test]
    fn test_queue_is_not_visible_until_flush() {
        let store = MemoryStore::new();
        let mut cache = CoordinateCache::new(&store, 10);

        cache.queue_node(1, &NodeCoord::new(1.0, 2.0));
        assert_eq!(cache.pending(), 1);
        assert_eq!(cache.lookup_node(1).unwrap(), None);

        cache.flush(true).unwrap();
        assert_eq!(cache.pending(), 0);
        assert_eq!(cache.lookup_node(1).unwrap(), Some(NodeCoord::new(1.0, 2.0)));
        assert_eq!(store.batch_writes(), vec![(1, true)]);
    }

    #[test]
    fn test_flush_if_full() {
        let store = MemoryStore::new();
        let mut cache = CoordinateCache::new(&store, 2);

        cache.queue_node(1, &NodeCoord::new(1.0, 1.0));
        cache.flush_if_full().unwrap();
        assert_eq!(cache.pending(), 1);

        cache.queue_node(2, &NodeCoord::new(2.0, 2.0));
        cache.flush_if_full().unwrap();
        assert_eq!(cache.pending(), 0);
        assert_eq!(store.batch_writes(), vec![(2, false)]);
    }

    #[test]
    fn test_empty_flush_is_noop() {
        let store = MemoryStore::new();
        let mut cache = CoordinateCache::new(&store, 2);
        cache.flush(true).unwrap();
        assert!(store.batch_writes().is_empty());
    }

    #[test]
    fn test_lookup_way_nodes() {
        let store = MemoryStore::new();
        let mut cache = CoordinateCache::new(&store, 100);
        let mut entrance = NodeCoord::new(3.0, 3.0);
        entrance.entrance = Entrance::Main;

        cache.queue_node(1, &NodeCoord::new(1.0, 1.0));
        cache.queue_node(2, &NodeCoord::new(2.0, 2.0));
        cache.queue_node(3, &entrance);
        cache.flush(false).unwrap();

        let coords = cache.lookup_way_nodes(10, &[1, 2, 3, 1]).unwrap().unwrap();
        assert_eq!(coords.len(), 4);
        assert_eq!(coords[1], NodeCoord::new(2.0, 2.0));
        assert_eq!(coords[2].entrance, Entrance::Main);
        assert_eq!(coords[3], coords[0]);

        assert_eq!(cache.lookup_way_nodes(10, &[1, 4, 2]).unwrap(), None);
    }

    #[test]
    fn test_lookup_way_refs_then_nodes() {
        let store = MemoryStore::new();
        let mut cache = CoordinateCache::new(&store, 100);
        cache.queue_node(1, &NodeCoord::new(1.0, 1.0));
        cache.queue_node(2, &NodeCoord::new(2.0, 2.0));
        cache.queue_way_refs(10, &[2, 1]);
        cache.flush(true).unwrap();

        let coords = cache.lookup_way_refs_then_nodes(10).unwrap().unwrap();
        assert_eq!(coords, vec![NodeCoord::new(2.0, 2.0), NodeCoord::new(1.0, 1.0)]);

        assert_eq!(cache.lookup_way_refs_then_nodes(11).unwrap(), None);
    }

    #[test]
    fn test_corrupt_way_refs_are_fatal() {
        let store = MemoryStore::new();
        store.put(b"W10", &[0u8; 9]).unwrap();
        let cache = CoordinateCache::new(&store, 100);

        let err = cache.lookup_way_refs_then_nodes(10).unwrap_err();
        assert!(matches!(err, Error::CorruptRecord { .. }));
    }
}
