//! # Legacy Migration
//!
//! One-shot transfer of the old flat key/value store (string keys, string
//! values, JSON-encoded where structured) into the partitioned record store.
//!
//! - Guarded by the `migrationCompleted` setting; calling it again is a no-op.
//! - Records already present in the partitioned store win over legacy values.
//! - The flag is only set when every write succeeded, so an interrupted run
//!   is retried on the next start.

use crate::data::DataManager;
use crate::error::{ExamError, Result};
use crate::model::{keys, settings, Partition};
use crate::store::backend::StorageBackend;
use crate::store::Record;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// A flat key/value dump of legacy data.
pub trait LegacySource {
    fn entries(&self) -> Result<Vec<(String, String)>>;
}

impl LegacySource for BTreeMap<String, String> {
    fn entries(&self) -> Result<Vec<(String, String)>> {
        Ok(self.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

/// A legacy dump saved as a single flat JSON object.
/// String values are taken as-is; any other value is re-encoded as JSON text.
pub struct JsonFileLegacySource {
    path: PathBuf,
}

impl JsonFileLegacySource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl LegacySource for JsonFileLegacySource {
    fn entries(&self) -> Result<Vec<(String, String)>> {
        let content = fs::read_to_string(&self.path).map_err(ExamError::from_io)?;
        let map: serde_json::Map<String, Value> = serde_json::from_str(&content)?;
        Ok(map
            .into_iter()
            .map(|(k, v)| match v {
                Value::String(s) => (k, s),
                other => (k, other.to_string()),
            })
            .collect())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub already_done: bool,
    pub settings: usize,
    pub exam_data: usize,
    pub exam_results: usize,
    /// Legacy keys ignored because the partitioned store already had them.
    pub kept_existing: usize,
    pub failed: usize,
    pub skipped: Vec<String>,
}

impl MigrationReport {
    pub fn migrated(&self) -> usize {
        self.settings + self.exam_data + self.exam_results
    }
}

/// Partition a legacy key belongs to, if any.
fn route(key: &str) -> Option<Partition> {
    match key {
        k if settings::is_known(k) => Some(Partition::UserSettings),
        keys::QUIZ_DATA | keys::FINAL_QUIZ | keys::EXAM_STATE | keys::EXAM_META
        | keys::IMAGE_MAP => Some(Partition::ExamData),
        keys::EXAM_ANSWERS | keys::REVIEW_MARKS => Some(Partition::ExamResults),
        _ => None,
    }
}

/// Legacy values were stored as text; structured ones as JSON text.
fn decode(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

pub fn is_migrated<B: StorageBackend>(data: &DataManager<B>) -> bool {
    data.get_user_setting(settings::MIGRATION_COMPLETED, false)
}

pub fn migrate_legacy<B: StorageBackend>(
    data: &DataManager<B>,
    source: &dyn LegacySource,
) -> Result<MigrationReport> {
    if is_migrated(data) {
        debug!("Legacy migration already completed");
        return Ok(MigrationReport {
            already_done: true,
            ..Default::default()
        });
    }

    let mut report = MigrationReport::default();

    for (key, raw) in source.entries()? {
        let Some(partition) = route(&key) else {
            debug!(key = %key, "Skipping unknown legacy key");
            report.skipped.push(key);
            continue;
        };
        let accessor = data.store().partition(partition);

        match accessor.get::<Value>(&key) {
            Ok(Some(_)) => {
                report.kept_existing += 1;
                continue;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(key = %key, %partition, error = %e, "Cannot inspect target record");
                report.failed += 1;
                continue;
            }
        }

        match accessor.put(&Record::new(key.as_str(), decode(raw))) {
            Ok(()) => match partition {
                Partition::UserSettings => report.settings += 1,
                Partition::ExamData => report.exam_data += 1,
                Partition::ExamResults | Partition::Images => report.exam_results += 1,
            },
            Err(e) => {
                warn!(key = %key, %partition, error = %e, "Legacy record not migrated");
                report.failed += 1;
            }
        }
    }

    if report.failed == 0 {
        if !data.set_user_setting(settings::MIGRATION_COMPLETED, &true) {
            warn!("Migration flag not saved; migration will run again");
        }
    } else {
        warn!(failed = report.failed, "Migration incomplete, will retry");
    }

    info!(
        migrated = report.migrated(),
        kept = report.kept_existing,
        skipped = report.skipped.len(),
        "Legacy migration finished"
    );
    Ok(report)
}
