//! Key-value storage behind the coordinate cache
//!
//! [`RocksStore`] is the on-disk store used by the CLI; [`MemoryStore`] backs tests and small
//! in-process conversions.

use butterfly_common::{Error, Result};
use parking_lot::Mutex;
use rocksdb::{DBCompressionType, Options, WriteOptions, DB};
use std::collections::BTreeMap;
use std::path::Path;

/// Ordered list of pending put operations
#[derive(Debug, Default)]
pub struct WriteBatch {
    ops: Vec<(Vec<u8>, Vec<u8>)>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.ops.push((key.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.ops.iter().map(|(k, v)| (k.as_slice(), v.as_slice()))
    }
}

pub trait KeyValueStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Apply every operation in `batch` atomically; `sync` asks for a durable write
    fn write(&self, batch: &WriteBatch, sync: bool) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        (**self).put(key, value)
    }

    fn write(&self, batch: &WriteBatch, sync: bool) -> Result<()> {
        (**self).write(batch, sync)
    }
}

pub struct RocksStore {
    db: DB,
}

impl RocksStore {
    pub fn open(path: &Path) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_compression_type(DBCompressionType::Zstd);

        let db = DB::open(&opts, path).map_err(|e| {
            Error::StoreError(format!("failed to open {}: {e}", path.display()))
        })?;
        Ok(Self { db })
    }
}

impl KeyValueStore for RocksStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.db
            .get(key)
            .map_err(|e| Error::StoreError(format!("read failed: {e}")))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.db
            .put(key, value)
            .map_err(|e| Error::StoreError(format!("write failed: {e}")))
    }

    fn write(&self, batch: &WriteBatch, sync: bool) -> Result<()> {
        let mut rocks_batch = rocksdb::WriteBatch::default();
        for (key, value) in batch.iter() {
            rocks_batch.put(key, value);
        }

        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(sync);

        self.db
            .write_opt(rocks_batch, &write_opts)
            .map_err(|e| Error::StoreError(format!("batch write failed: {e}")))
    }
}

/// In-memory store; records the sync flag of every batch write
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
    batch_writes: Mutex<Vec<(usize, bool)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.lock().is_empty()
    }

    /// `(operation count, sync)` for each batch written so far
    pub fn batch_writes(&self) -> Vec<(usize, bool)> {
        self.batch_writes.lock().clone()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.data.lock().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.data.lock().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn write(&self, batch: &WriteBatch, sync: bool) -> Result<()> {
        let mut data = self.data.lock();
        for (key, value) in batch.iter() {
            data.insert(key.to_vec(), value.to_vec());
        }
        self.batch_writes.lock().push((batch.len(), sync));
        Ok(())
    }
}
