use super::backend::{SchemaManifest, StorageBackend};
use crate::error::{ExamError, Result};
use crate::model::Partition;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const SCHEMA_FILENAME: &str = "schema.json";

/// File-backed storage: one JSON file per partition under a data root.
///
/// ```text
/// <root>/
/// ├── schema.json          # SchemaManifest
/// ├── userSettings.json    # { id: envelope, ... }
/// ├── examData.json
/// ├── examResults.json
/// └── images.json
/// ```
pub struct FsBackend {
    root: PathBuf,
}

type PartitionMap = HashMap<String, Value>;

impl FsBackend {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn partition_path(&self, partition: Partition) -> PathBuf {
        self.root.join(format!("{}.json", partition.name()))
    }

    fn load_partition(&self, partition: Partition) -> Result<PartitionMap> {
        let path = self.partition_path(partition);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ExamError::PartitionNotFound(partition));
            }
            Err(e) => return Err(ExamError::from_io(e)),
        };
        let records: PartitionMap = serde_json::from_str(&content)?;
        Ok(records)
    }

    fn save_partition(&self, partition: Partition, records: &PartitionMap) -> Result<()> {
        let content = serde_json::to_string_pretty(records)?;
        self.atomic_write(&self.partition_path(partition), &content)
    }

    fn atomic_write(&self, target: &Path, content: &str) -> Result<()> {
        let tmp = self.root.join(format!(".write-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp, content).map_err(ExamError::from_io)?;
        if let Err(e) = fs::rename(&tmp, target) {
            let _ = fs::remove_file(&tmp);
            return Err(ExamError::from_io(e));
        }
        Ok(())
    }
}

impl StorageBackend for FsBackend {
    fn probe(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(|e| {
                ExamError::StoreUnavailable(format!(
                    "Cannot create data root {}: {}",
                    self.root.display(),
                    e
                ))
            })?;
        }
        let meta = fs::metadata(&self.root).map_err(|e| {
            ExamError::StoreUnavailable(format!("{}: {}", self.root.display(), e))
        })?;
        if !meta.is_dir() {
            return Err(ExamError::StoreUnavailable(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }
        if meta.permissions().readonly() {
            return Err(ExamError::StoreUnavailable(format!(
                "{} is read-only",
                self.root.display()
            )));
        }
        Ok(())
    }

    fn load_schema(&self) -> Result<Option<SchemaManifest>> {
        let path = self.root.join(SCHEMA_FILENAME);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ExamError::from_io(e)),
        };
        let schema = serde_json::from_str(&content).map_err(|e| {
            ExamError::StoreUnavailable(format!("Corrupt schema manifest: {}", e))
        })?;
        Ok(Some(schema))
    }

    fn save_schema(&self, schema: &SchemaManifest) -> Result<()> {
        let content = serde_json::to_string_pretty(schema)?;
        self.atomic_write(&self.root.join(SCHEMA_FILENAME), &content)
    }

    fn create_partition(&self, partition: Partition) -> Result<()> {
        if self.partition_exists(partition) {
            return Ok(());
        }
        self.save_partition(partition, &PartitionMap::new())
    }

    fn partition_exists(&self, partition: Partition) -> bool {
        self.partition_path(partition).is_file()
    }

    fn read_record(&self, partition: Partition, id: &str) -> Result<Option<Value>> {
        let mut records = self.load_partition(partition)?;
        Ok(records.remove(id))
    }

    fn write_record(&self, partition: Partition, id: &str, envelope: &Value) -> Result<()> {
        let mut records = self.load_partition(partition)?;
        records.insert(id.to_string(), envelope.clone());
        self.save_partition(partition, &records)
    }

    fn delete_record(&self, partition: Partition, id: &str) -> Result<()> {
        let mut records = self.load_partition(partition)?;
        if records.remove(id).is_some() {
            self.save_partition(partition, &records)?;
        }
        Ok(())
    }

    fn list_records(&self, partition: Partition) -> Result<Vec<Value>> {
        let records = self.load_partition(partition)?;
        Ok(records.into_values().collect())
    }

    fn clear_partition(&self, partition: Partition) -> Result<()> {
        if !self.partition_exists(partition) {
            return Err(ExamError::PartitionNotFound(partition));
        }
        self.save_partition(partition, &PartitionMap::new())
    }
}
