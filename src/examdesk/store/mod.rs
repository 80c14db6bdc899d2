//! # Storage Layer
//!
//! The record store is a versioned key-value database organized into fixed,
//! named partitions (see [`Partition`]). Each partition maps a string id to one
//! record; writing an existing id overwrites it in place.
//!
//! ## Layers
//!
//! - [`backend::StorageBackend`]: raw envelope I/O (the "how").
//!   - [`fs_backend::FsBackend`]: production, one JSON file per partition,
//!     atomic writes (temp file + rename).
//!   - [`mem_backend::MemBackend`]: tests and the degraded in-memory mode.
//! - [`RecordStore`]: opens/upgrades the schema and hands out accessors.
//! - [`PartitionAccessor`]: typed `put / get / delete / get_all / clear`
//!   scoped to one partition. Envelope field names never leak past it.
//!
//! ## Schema Upgrades
//!
//! Upgrades are additive only. Opening a root recorded at an older version
//! creates the partitions it lacks and bumps the version; partitions that
//! already exist are never touched. A root recorded at a *newer* version than
//! this build understands is refused with `StoreUnavailable`.
//!
//! ## Atomicity
//!
//! Each single put/get/delete/clear is atomic. There are no multi-key
//! transactions: two calls are two independent operations.

use crate::error::{ExamError, Result};
use crate::model::{Partition, SCHEMA_VERSION};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

pub mod backend;
pub mod fs_backend;
pub mod mem_backend;
pub mod record;

use backend::{SchemaManifest, StorageBackend};
pub use record::Record;

/// Handle to an opened record store.
pub struct RecordStore<B: StorageBackend> {
    backend: B,
    version: u32,
}

impl<B: StorageBackend> RecordStore<B> {
    /// Open the store, creating or upgrading the schema as needed.
    pub fn open(backend: B) -> Result<Self> {
        backend.probe()?;

        let recorded = backend.load_schema().map_err(unavailable)?;
        let old_version = recorded.as_ref().map(|s| s.version).unwrap_or(0);

        if old_version > SCHEMA_VERSION {
            return Err(ExamError::StoreUnavailable(format!(
                "Store schema v{} is newer than supported v{}",
                old_version, SCHEMA_VERSION
            )));
        }

        if old_version < SCHEMA_VERSION {
            let mut created = Vec::new();
            for partition in Partition::all() {
                if !backend.partition_exists(*partition) {
                    if old_version >= partition.since_version() {
                        warn!(%partition, from = old_version, "Partition missing, recreating");
                    }
                    backend.create_partition(*partition).map_err(unavailable)?;
                    created.push(partition.name());
                }
            }
            let manifest = SchemaManifest {
                version: SCHEMA_VERSION,
                partitions: Partition::all().to_vec(),
            };
            backend.save_schema(&manifest).map_err(unavailable)?;
            info!(
                from = old_version,
                to = SCHEMA_VERSION,
                created = ?created,
                "Upgraded record store schema"
            );
        }

        Ok(Self {
            backend,
            version: SCHEMA_VERSION,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn partition(&self, partition: Partition) -> PartitionAccessor<'_, B> {
        PartitionAccessor {
            backend: &self.backend,
            partition,
        }
    }

    /// The underlying backend (for testing/internal use).
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

fn unavailable(err: ExamError) -> ExamError {
    match err {
        ExamError::StoreUnavailable(_) => err,
        other => ExamError::StoreUnavailable(other.to_string()),
    }
}

/// Typed operations against one partition.
pub struct PartitionAccessor<'a, B: StorageBackend> {
    backend: &'a B,
    partition: Partition,
}

impl<B: StorageBackend> PartitionAccessor<'_, B> {
    pub fn partition(&self) -> Partition {
        self.partition
    }

    /// Upsert by `record.id`.
    pub fn put<T: Serialize>(&self, record: &Record<T>) -> Result<()> {
        let envelope = record.to_envelope(self.partition)?;
        self.backend
            .write_record(self.partition, &record.id, &envelope)?;
        debug!(partition = %self.partition, id = %record.id, "put");
        Ok(())
    }

    /// The unwrapped payload, or `None` when no record has this id.
    /// A stored `null`/`false`/`0` comes back as `Some`.
    pub fn get<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>> {
        match self.backend.read_record(self.partition, id)? {
            Some(envelope) => {
                let record = Record::<T>::from_envelope(self.partition, envelope)?;
                Ok(Some(record.payload))
            }
            None => Ok(None),
        }
    }

    /// Idempotent: deleting an absent id succeeds.
    pub fn delete(&self, id: &str) -> Result<()> {
        self.backend.delete_record(self.partition, id)?;
        debug!(partition = %self.partition, id, "delete");
        Ok(())
    }

    /// Every record, in unspecified order. Sort if order matters.
    pub fn get_all<T: DeserializeOwned>(&self) -> Result<Vec<Record<T>>> {
        self.backend
            .list_records(self.partition)?
            .into_iter()
            .map(|envelope| Record::from_envelope(self.partition, envelope))
            .collect()
    }

    /// Empty the partition; the partition itself stays.
    pub fn clear(&self) -> Result<()> {
        self.backend.clear_partition(self.partition)?;
        debug!(partition = %self.partition, "clear");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mem_backend::MemBackend;
    use serde_json::{json, Value};

    fn open_store() -> RecordStore<MemBackend> {
        RecordStore::open(MemBackend::new()).unwrap()
    }

    #[test]
    fn open_creates_all_partitions() {
        let store = open_store();
        for p in Partition::all() {
            assert!(store.backend().partition_exists(*p));
        }
        assert_eq!(store.version(), SCHEMA_VERSION);
    }

    #[test]
    fn open_fails_when_host_refuses_storage() {
        let backend = MemBackend::new();
        backend.set_simulate_unavailable(true);
        let err = RecordStore::open(backend).err().unwrap();
        assert!(matches!(err, ExamError::StoreUnavailable(_)));
    }

    #[test]
    fn open_refuses_newer_schema() {
        let backend = MemBackend::new();
        backend
            .save_schema(&SchemaManifest {
                version: SCHEMA_VERSION + 1,
                partitions: vec![],
            })
            .unwrap();
        let err = RecordStore::open(backend).err().unwrap();
        assert!(matches!(err, ExamError::StoreUnavailable(_)));
    }

    #[test]
    fn upgrade_from_v1_keeps_existing_records() {
        let backend = MemBackend::new();
        for p in [
            Partition::UserSettings,
            Partition::ExamData,
            Partition::ExamResults,
        ] {
            backend.create_partition(p).unwrap();
        }
        backend
            .save_schema(&SchemaManifest {
                version: 1,
                partitions: vec![
                    Partition::UserSettings,
                    Partition::ExamData,
                    Partition::ExamResults,
                ],
            })
            .unwrap();
        backend
            .write_record(
                Partition::ExamData,
                "quizData",
                &json!({"id": "quizData", "data": [1, 2, 3]}),
            )
            .unwrap();

        let store = RecordStore::open(backend).unwrap();

        assert!(store.backend().partition_exists(Partition::Images));
        let data: Option<Vec<u32>> = store.partition(Partition::ExamData).get("quizData").unwrap();
        assert_eq!(data, Some(vec![1, 2, 3]));
        assert_eq!(
            store.backend().load_schema().unwrap().unwrap().version,
            SCHEMA_VERSION
        );
    }

    #[test]
    fn upgrade_recreates_partition_missing_from_older_schema() {
        let backend = MemBackend::new();
        backend.create_partition(Partition::UserSettings).unwrap();
        backend.create_partition(Partition::ExamData).unwrap();
        backend
            .save_schema(&SchemaManifest {
                version: 1,
                partitions: vec![Partition::UserSettings, Partition::ExamData],
            })
            .unwrap();

        let store = RecordStore::open(backend).unwrap();

        for p in Partition::all() {
            assert!(store.backend().partition_exists(*p));
        }
    }

    #[test]
    fn put_overwrites_in_place() {
        let store = open_store();
        let settings = store.partition(Partition::UserSettings);
        settings.put(&Record::new("timeLimit", 30)).unwrap();
        settings.put(&Record::new("timeLimit", 45)).unwrap();

        let all: Vec<Record<u64>> = settings.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(settings.get::<u64>("timeLimit").unwrap(), Some(45));
    }

    #[test]
    fn absent_is_distinct_from_falsy_payloads() {
        let store = open_store();
        let data = store.partition(Partition::ExamData);
        data.put(&Record::new("nothing", Value::Null)).unwrap();
        data.put(&Record::new("zero", 0)).unwrap();
        data.put(&Record::new("no", false)).unwrap();

        assert_eq!(data.get::<Value>("nothing").unwrap(), Some(Value::Null));
        assert_eq!(data.get::<i64>("zero").unwrap(), Some(0));
        assert_eq!(data.get::<bool>("no").unwrap(), Some(false));
        assert_eq!(data.get::<Value>("missing").unwrap(), None);
    }

    #[test]
    fn same_id_in_two_partitions_does_not_collide() {
        let store = open_store();
        store
            .partition(Partition::ExamData)
            .put(&Record::new("x", "exam"))
            .unwrap();
        store
            .partition(Partition::ExamResults)
            .put(&Record::new("x", "result"))
            .unwrap();

        assert_eq!(
            store
                .partition(Partition::ExamData)
                .get::<String>("x")
                .unwrap()
                .as_deref(),
            Some("exam")
        );
        assert_eq!(
            store
                .partition(Partition::ExamResults)
                .get::<String>("x")
                .unwrap()
                .as_deref(),
            Some("result")
        );
    }

    #[test]
    fn delete_is_idempotent() {
        let store = open_store();
        let data = store.partition(Partition::ExamData);
        data.delete("never-written").unwrap();
        data.put(&Record::new("a", 1)).unwrap();
        data.delete("a").unwrap();
        data.delete("a").unwrap();
        assert_eq!(data.get::<i64>("a").unwrap(), None);
    }

    #[test]
    fn clear_keeps_partition_usable() {
        let store = open_store();
        let results = store.partition(Partition::ExamResults);
        results.put(&Record::new("examAnswers", json!({"0": 2}))).unwrap();
        results.clear().unwrap();

        assert!(results.get_all::<Value>().unwrap().is_empty());
        results.put(&Record::new("reviewMarks", json!({}))).unwrap();
        assert_eq!(results.get_all::<Value>().unwrap().len(), 1);
    }

    #[test]
    fn missing_partition_surfaces_not_found() {
        let store = open_store();
        store.backend().drop_partition(Partition::ExamData);
        let err = store
            .partition(Partition::ExamData)
            .get::<Value>("quizData")
            .unwrap_err();
        assert!(matches!(
            err,
            ExamError::PartitionNotFound(Partition::ExamData)
        ));
    }
}
