use crate::error::Result;
use crate::model::Partition;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Recorded schema of a data root: version plus the partitions it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaManifest {
    pub version: u32,
    pub partitions: Vec<Partition>,
}

/// Abstract interface for raw record I/O.
/// This trait handles the "how" of storage (filesystem vs memory),
/// while `RecordStore` handles the "what" (schema upgrades, envelopes).
///
/// Records are passed around as full envelopes (`{"id": .., "<field>": ..}`);
/// backends never look inside them beyond storing them under their id.
pub trait StorageBackend {
    // --- Host ---

    /// Check that the host allows persistent storage at all.
    /// Fails with `StoreUnavailable` otherwise.
    fn probe(&self) -> Result<()>;

    // --- Schema ---

    /// Load the schema manifest. Ok(None) means a fresh, never-opened root.
    fn load_schema(&self) -> Result<Option<SchemaManifest>>;

    fn save_schema(&self, schema: &SchemaManifest) -> Result<()>;

    /// Create an empty partition. MUST leave an existing partition untouched.
    fn create_partition(&self, partition: Partition) -> Result<()>;

    fn partition_exists(&self, partition: Partition) -> bool;

    // --- Records ---

    /// Read one envelope. Ok(None) if the id is absent.
    /// Err(PartitionNotFound) if the partition itself is missing.
    fn read_record(&self, partition: Partition, id: &str) -> Result<Option<Value>>;

    /// Upsert one envelope. MUST be atomic.
    fn write_record(&self, partition: Partition, id: &str, envelope: &Value) -> Result<()>;

    /// Remove one envelope; absent ids are not an error.
    fn delete_record(&self, partition: Partition, id: &str) -> Result<()>;

    /// All envelopes of a partition, in no particular order.
    fn list_records(&self, partition: Partition) -> Result<Vec<Value>>;

    /// Remove every record but keep the partition.
    fn clear_partition(&self, partition: Partition) -> Result<()>;
}

impl<T: StorageBackend + ?Sized> StorageBackend for Box<T> {
    fn probe(&self) -> Result<()> {
        (**self).probe()
    }

    fn load_schema(&self) -> Result<Option<SchemaManifest>> {
        (**self).load_schema()
    }

    fn save_schema(&self, schema: &SchemaManifest) -> Result<()> {
        (**self).save_schema(schema)
    }

    fn create_partition(&self, partition: Partition) -> Result<()> {
        (**self).create_partition(partition)
    }

    fn partition_exists(&self, partition: Partition) -> bool {
        (**self).partition_exists(partition)
    }

    fn read_record(&self, partition: Partition, id: &str) -> Result<Option<Value>> {
        (**self).read_record(partition, id)
    }

    fn write_record(&self, partition: Partition, id: &str, envelope: &Value) -> Result<()> {
        (**self).write_record(partition, id, envelope)
    }

    fn delete_record(&self, partition: Partition, id: &str) -> Result<()> {
        (**self).delete_record(partition, id)
    }

    fn list_records(&self, partition: Partition) -> Result<Vec<Value>> {
        (**self).list_records(partition)
    }

    fn clear_partition(&self, partition: Partition) -> Result<()> {
        (**self).clear_partition(partition)
    }
}
