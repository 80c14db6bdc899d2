//! # Data Manager
//!
//! The single coordinating facade over the record store. UI code (the CLI,
//! the exam session) talks to this type only, never to partitions directly.
//!
//! ## Never-throw contract
//!
//! No storage error escapes this module:
//! - reads fall back to a default (or `None`) and log a warning,
//! - writes return `true`/`false` and log a warning on failure.
//!
//! Callers that need a write for correctness (saving exam results) check the
//! boolean and report it themselves.
//!
//! ## Bootstrap
//!
//! [`DataManager::initialize_app`] moves `Uninitialized → Initializing → Ready`,
//! writing each default setting only when it is absent. Partial failures are
//! logged and still end in `Ready`.

use crate::error::{ExamError, Result};
use crate::model::{keys, settings, Partition, Question};
use crate::store::backend::StorageBackend;
use crate::store::mem_backend::MemBackend;
use crate::store::{Record, RecordStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// File name → ids of the images extracted from it.
pub type ImageMap = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    Uninitialized,
    Initializing,
    Ready,
}

pub struct DataManager<B: StorageBackend> {
    store: RecordStore<B>,
    state: BootstrapState,
    volatile: bool,
    default_time_limit: u64,
}

impl<B: StorageBackend> DataManager<B> {
    pub fn open(backend: B) -> Result<Self> {
        Ok(Self::from_store(RecordStore::open(backend)?))
    }

    pub fn from_store(store: RecordStore<B>) -> Self {
        Self {
            store,
            state: BootstrapState::Uninitialized,
            volatile: false,
            default_time_limit: settings::DEFAULT_TIME_LIMIT_MINUTES,
        }
    }

    /// Override the `timeLimit` default written by `initialize_app`.
    pub fn with_default_time_limit(mut self, minutes: u64) -> Self {
        self.default_time_limit = minutes;
        self
    }

    pub fn store(&self) -> &RecordStore<B> {
        &self.store
    }

    pub fn bootstrap_state(&self) -> BootstrapState {
        self.state
    }

    /// True when durable storage was unavailable and data lives in memory only.
    pub fn is_volatile(&self) -> bool {
        self.volatile
    }

    // --- Bootstrap ---

    fn default_settings(&self) -> Vec<(&'static str, Value)> {
        vec![
            (settings::TIME_LIMIT, Value::from(self.default_time_limit)),
            (settings::PRACTICE_MODE, Value::Bool(false)),
            (settings::DARK_MODE, Value::Bool(false)),
        ]
    }

    /// Write every default setting that is currently absent.
    /// Returns the names that were written. Safe to call repeatedly.
    pub fn initialize_app(&mut self) -> Vec<&'static str> {
        self.state = BootstrapState::Initializing;
        let mut written = Vec::new();

        for (name, value) in self.default_settings() {
            match self
                .store
                .partition(Partition::UserSettings)
                .get::<Value>(name)
            {
                Ok(Some(_)) => continue,
                Ok(None) => {
                    if self.write(Partition::UserSettings, name, &value) {
                        written.push(name);
                    }
                }
                Err(e) => {
                    warn!(setting = name, error = %e, "Could not check default setting");
                }
            }
        }

        self.state = BootstrapState::Ready;
        info!(written = ?written, "App initialized");
        written
    }

    // --- User settings ---

    pub fn get_user_setting<T: DeserializeOwned>(&self, name: &str, default: T) -> T {
        self.read(Partition::UserSettings, name).unwrap_or(default)
    }

    pub fn set_user_setting<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> bool {
        self.write(Partition::UserSettings, name, value)
    }

    /// All stored settings, keyed by name.
    pub fn user_settings(&self) -> BTreeMap<String, Value> {
        self.read_all(Partition::UserSettings)
            .into_iter()
            .map(|r| (r.id, r.payload))
            .collect()
    }

    // --- Exam data ---

    pub fn get_exam_data<T: DeserializeOwned>(&self, id: &str) -> Option<T> {
        self.read(Partition::ExamData, id)
    }

    pub fn set_exam_data<T: Serialize + ?Sized>(&self, id: &str, payload: &T) -> bool {
        self.write(Partition::ExamData, id, payload)
    }

    pub fn delete_exam_data(&self, id: &str) -> bool {
        self.remove(Partition::ExamData, id)
    }

    /// Every exam data record, sorted by id.
    pub fn list_exam_data(&self) -> Vec<Record<Value>> {
        let mut records = self.read_all(Partition::ExamData);
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    /// Drop question sets, checkpoints and session metadata (restart flow).
    pub fn clear_exam_data(&self) -> bool {
        self.clear(Partition::ExamData)
    }

    // --- Exam results ---

    pub fn get_exam_results<T: DeserializeOwned>(&self, id: &str) -> Option<T> {
        self.read(Partition::ExamResults, id)
    }

    pub fn set_exam_results<T: Serialize + ?Sized>(&self, id: &str, payload: &T) -> bool {
        self.write(Partition::ExamResults, id, payload)
    }

    pub fn delete_exam_results(&self, id: &str) -> bool {
        self.remove(Partition::ExamResults, id)
    }

    pub fn clear_exam_results(&self) -> bool {
        self.clear(Partition::ExamResults)
    }

    // --- Question sets ---

    pub fn save_question_set(&self, questions: &[Question]) -> bool {
        self.set_exam_data(keys::QUIZ_DATA, questions)
    }

    /// Store the set the next attempt runs on. Any checkpoint or session
    /// metadata from a previous attempt is discarded.
    pub fn finalize_question_set(&self, questions: &[Question]) -> bool {
        let saved = self.set_exam_data(keys::FINAL_QUIZ, questions);
        let state_cleared = self.delete_exam_data(keys::EXAM_STATE);
        let meta_cleared = self.delete_exam_data(keys::EXAM_META);
        saved && state_cleared && meta_cleared
    }

    /// The finalized set if there is one, else the selected set.
    pub fn load_question_set(&self) -> Option<Vec<Question>> {
        [keys::FINAL_QUIZ, keys::QUIZ_DATA]
            .iter()
            .filter_map(|id| self.get_exam_data::<Vec<Question>>(id))
            .find(|questions| !questions.is_empty())
    }

    // --- Images ---

    pub fn save_image(&self, id: &str, content: &str) -> bool {
        self.write(Partition::Images, id, content)
    }

    pub fn get_image(&self, id: &str) -> Option<String> {
        self.read(Partition::Images, id)
    }

    pub fn get_image_map(&self) -> ImageMap {
        self.get_exam_data(keys::IMAGE_MAP).unwrap_or_default()
    }

    pub fn set_image_map(&self, map: &ImageMap) -> bool {
        self.set_exam_data(keys::IMAGE_MAP, map)
    }

    pub fn clear_images(&self) -> bool {
        let cleared = self.clear(Partition::Images);
        let unmapped = self.delete_exam_data(keys::IMAGE_MAP);
        cleared && unmapped
    }

    // --- Whole store ---

    /// Clear every partition independently. True if at least one partition
    /// was cleared; a failing partition does not stop the rest.
    ///
    /// The legacy migration flag survives, so a configured legacy dump is not
    /// imported again on the next start.
    pub fn clear_all_app_data(&self) -> bool {
        let migrated = self.get_user_setting(settings::MIGRATION_COMPLETED, false);
        let mut cleared = 0;
        for partition in Partition::all() {
            if self.clear(*partition) {
                cleared += 1;
            }
        }
        if migrated && !self.set_user_setting(settings::MIGRATION_COMPLETED, &true) {
            warn!("Could not keep the migration flag; legacy data may be imported again");
        }
        info!(cleared, total = Partition::all().len(), "Cleared app data");
        cleared > 0
    }

    // --- Internal helpers ---

    fn read<T: DeserializeOwned>(&self, partition: Partition, id: &str) -> Option<T> {
        match self.store.partition(partition).get::<T>(id) {
            Ok(value) => value,
            Err(e) => {
                warn!(%partition, id, error = %e, "Read failed, using default");
                None
            }
        }
    }

    fn read_all(&self, partition: Partition) -> Vec<Record<Value>> {
        self.store
            .partition(partition)
            .get_all()
            .unwrap_or_else(|e| {
                warn!(%partition, error = %e, "Listing failed");
                Vec::new()
            })
    }

    fn write<T: Serialize + ?Sized>(&self, partition: Partition, id: &str, payload: &T) -> bool {
        match self.store.partition(partition).put(&Record::new(id, payload)) {
            Ok(()) => true,
            Err(e) => {
                warn!(%partition, id, error = %e, "Write failed");
                false
            }
        }
    }

    fn remove(&self, partition: Partition, id: &str) -> bool {
        match self.store.partition(partition).delete(id) {
            Ok(()) => true,
            Err(e) => {
                warn!(%partition, id, error = %e, "Delete failed");
                false
            }
        }
    }

    fn clear(&self, partition: Partition) -> bool {
        match self.store.partition(partition).clear() {
            Ok(()) => true,
            Err(e) => {
                warn!(%partition, error = %e, "Clear failed");
                false
            }
        }
    }
}

impl DataManager<Box<dyn StorageBackend>> {
    /// Open durable storage, degrading to an in-memory store when the host
    /// refuses it. Check [`DataManager::is_volatile`] to warn the user.
    pub fn open_with_fallback(backend: Box<dyn StorageBackend>) -> Result<Self> {
        match RecordStore::open(backend) {
            Ok(store) => Ok(Self::from_store(store)),
            Err(ExamError::StoreUnavailable(reason)) => {
                warn!(%reason, "Durable storage unavailable, data will not survive this run");
                let fallback: Box<dyn StorageBackend> = Box::new(MemBackend::new());
                let mut manager = Self::from_store(RecordStore::open(fallback)?);
                manager.volatile = true;
                debug!("Opened in-memory store");
                Ok(manager)
            }
            Err(e) => Err(e),
        }
    }
}
