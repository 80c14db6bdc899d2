use super::backend::{SchemaManifest, StorageBackend};
use crate::error::{ExamError, Result};
use crate::model::Partition;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;

/// In-memory storage backend.
///
/// Used by tests and as the degraded store when no durable storage is
/// available. Uses `RefCell` for interior mutability since examdesk is
/// single-threaded, so the `StorageBackend` trait can use `&self` throughout.
#[derive(Default)]
pub struct MemBackend {
    schema: RefCell<Option<SchemaManifest>>,
    partitions: RefCell<HashMap<Partition, HashMap<String, Value>>>,
    simulate_write_error: RefCell<bool>,
    simulate_unavailable: RefCell<bool>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation (quota exceeded, revoked permission).
    pub fn set_simulate_write_error(&self, simulate: bool) {
        *self.simulate_write_error.borrow_mut() = simulate;
    }

    /// Make `probe` fail as if the host disallowed persistent storage.
    pub fn set_simulate_unavailable(&self, simulate: bool) {
        *self.simulate_unavailable.borrow_mut() = simulate;
    }

    /// Test helper: remove a partition entirely, as stale code against a
    /// different schema would see it.
    pub fn drop_partition(&self, partition: Partition) -> bool {
        self.partitions.borrow_mut().remove(&partition).is_some()
    }

    fn check_write(&self) -> Result<()> {
        if *self.simulate_write_error.borrow() {
            return Err(ExamError::AccessDenied("Simulated write error".to_string()));
        }
        Ok(())
    }
}

impl StorageBackend for MemBackend {
    fn probe(&self) -> Result<()> {
        if *self.simulate_unavailable.borrow() {
            return Err(ExamError::StoreUnavailable(
                "Simulated unavailable storage".to_string(),
            ));
        }
        Ok(())
    }

    fn load_schema(&self) -> Result<Option<SchemaManifest>> {
        Ok(self.schema.borrow().clone())
    }

    fn save_schema(&self, schema: &SchemaManifest) -> Result<()> {
        self.check_write()?;
        *self.schema.borrow_mut() = Some(schema.clone());
        Ok(())
    }

    fn create_partition(&self, partition: Partition) -> Result<()> {
        self.check_write()?;
        self.partitions.borrow_mut().entry(partition).or_default();
        Ok(())
    }

    fn partition_exists(&self, partition: Partition) -> bool {
        self.partitions.borrow().contains_key(&partition)
    }

    fn read_record(&self, partition: Partition, id: &str) -> Result<Option<Value>> {
        let partitions = self.partitions.borrow();
        let records = partitions
            .get(&partition)
            .ok_or(ExamError::PartitionNotFound(partition))?;
        Ok(records.get(id).cloned())
    }

    fn write_record(&self, partition: Partition, id: &str, envelope: &Value) -> Result<()> {
        self.check_write()?;
        let mut partitions = self.partitions.borrow_mut();
        let records = partitions
            .get_mut(&partition)
            .ok_or(ExamError::PartitionNotFound(partition))?;
        records.insert(id.to_string(), envelope.clone());
        Ok(())
    }

    fn delete_record(&self, partition: Partition, id: &str) -> Result<()> {
        self.check_write()?;
        let mut partitions = self.partitions.borrow_mut();
        let records = partitions
            .get_mut(&partition)
            .ok_or(ExamError::PartitionNotFound(partition))?;
        records.remove(id);
        Ok(())
    }

    fn list_records(&self, partition: Partition) -> Result<Vec<Value>> {
        let partitions = self.partitions.borrow();
        let records = partitions
            .get(&partition)
            .ok_or(ExamError::PartitionNotFound(partition))?;
        Ok(records.values().cloned().collect())
    }

    fn clear_partition(&self, partition: Partition) -> Result<()> {
        self.check_write()?;
        let mut partitions = self.partitions.borrow_mut();
        let records = partitions
            .get_mut(&partition)
            .ok_or(ExamError::PartitionNotFound(partition))?;
        records.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_partition_is_reported() {
        let backend = MemBackend::new();
        let err = backend
            .read_record(Partition::ExamData, "quizData")
            .unwrap_err();
        assert!(matches!(
            err,
            ExamError::PartitionNotFound(Partition::ExamData)
        ));
    }

    #[test]
    fn create_partition_keeps_existing_records() {
        let backend = MemBackend::new();
        backend.create_partition(Partition::ExamData).unwrap();
        backend
            .write_record(Partition::ExamData, "a", &json!({"id": "a", "data": 1}))
            .unwrap();

        backend.create_partition(Partition::ExamData).unwrap();

        assert!(backend
            .read_record(Partition::ExamData, "a")
            .unwrap()
            .is_some());
    }

    #[test]
    fn simulated_write_error_is_access_denied() {
        let backend = MemBackend::new();
        backend.create_partition(Partition::UserSettings).unwrap();
        backend.set_simulate_write_error(true);

        let err = backend
            .write_record(Partition::UserSettings, "x", &json!({}))
            .unwrap_err();
        assert!(matches!(err, ExamError::AccessDenied(_)));
    }
}
