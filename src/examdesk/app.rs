//! # App Facade
//!
//! Entry point for every UI. [`App::start`] runs the startup sequence:
//!
//! 1. open the record store, degrading to memory when the host refuses it,
//! 2. migrate a configured legacy dump,
//! 3. write default settings that are still absent.
//!
//! Migration runs before defaults so legacy settings win over them.
//!
//! After that the facade only dispatches to `commands/*.rs`; it holds no
//! business logic and performs no output.

use crate::commands::{self, CmdResult};
use crate::config::AppConfig;
use crate::data::DataManager;
use crate::error::Result;
use crate::exam::SessionOptions;
use crate::migration::{migrate_legacy, JsonFileLegacySource, MigrationReport};
use crate::store::backend::StorageBackend;
use crate::store::fs_backend::FsBackend;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub use crate::commands::config::ConfigAction;
pub use crate::commands::exam::ExamAction;
pub use crate::commands::settings::SettingsAction;

const STORE_DIR: &str = "store";

/// What happened during startup.
#[derive(Debug, Default)]
pub struct StartupReport {
    pub volatile: bool,
    pub defaults_written: Vec<&'static str>,
    pub migration: Option<MigrationReport>,
}

pub struct App {
    data: DataManager<Box<dyn StorageBackend>>,
    config: AppConfig,
    root: PathBuf,
    startup: StartupReport,
}

impl App {
    /// Start against the on-disk store under `root`.
    pub fn start(root: PathBuf, config: AppConfig) -> Result<Self> {
        let backend = Box::new(FsBackend::new(root.join(STORE_DIR)));
        Self::start_with_backend(backend, root, config)
    }

    pub fn start_with_backend(
        backend: Box<dyn StorageBackend>,
        root: PathBuf,
        config: AppConfig,
    ) -> Result<Self> {
        let mut data = DataManager::open_with_fallback(backend)?
            .with_default_time_limit(config.default_time_limit);

        let migration = config
            .legacy_import
            .as_ref()
            .and_then(|path| run_startup_migration(&data, path));

        let defaults_written = data.initialize_app();
        let startup = StartupReport {
            volatile: data.is_volatile(),
            defaults_written,
            migration,
        };
        info!(root = %root.display(), volatile = startup.volatile, "App started");

        Ok(Self {
            data,
            config,
            root,
            startup,
        })
    }

    pub fn data(&self) -> &DataManager<Box<dyn StorageBackend>> {
        &self.data
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn startup(&self) -> &StartupReport {
        &self.startup
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions::from_settings(&self.data, self.config.tab_leave_limit)
    }

    pub fn init(&self) -> Result<CmdResult> {
        commands::init::run(&self.startup, &self.root)
    }

    pub fn settings(&self, action: SettingsAction) -> Result<CmdResult> {
        commands::settings::run(&self.data, action)
    }

    pub fn import(&self, path: &Path, sections: &[u32]) -> Result<CmdResult> {
        commands::import::run(&self.data, path, sections)
    }

    pub fn exam(&self, action: ExamAction) -> Result<CmdResult> {
        commands::exam::run(&self.data, self.session_options(), action)
    }

    pub fn results(&self) -> Result<CmdResult> {
        commands::results::show(&self.data)
    }

    pub fn clear_results(&self) -> Result<CmdResult> {
        commands::results::clear(&self.data)
    }

    pub fn clear(&self, exam_only: bool) -> Result<CmdResult> {
        commands::clear::run(&self.data, exam_only)
    }

    /// Reports the startup migration when it already ran against `path`.
    pub fn migrate(&self, path: &Path) -> Result<CmdResult> {
        match &self.startup.migration {
            Some(report) if self.config.legacy_import.as_deref() == Some(path) => {
                Ok(commands::migrate::report(report.clone()))
            }
            _ => commands::migrate::run(&self.data, path),
        }
    }

    pub fn config_command(&self, action: ConfigAction) -> Result<CmdResult> {
        commands::config::run(&self.root, action)
    }
}

/// A broken legacy dump must not keep the app from starting.
fn run_startup_migration<B: StorageBackend>(
    data: &DataManager<B>,
    path: &Path,
) -> Option<MigrationReport> {
    if !path.exists() {
        warn!(path = %path.display(), "Legacy dump not found, skipping migration");
        return None;
    }
    match migrate_legacy(data, &JsonFileLegacySource::new(path.to_path_buf())) {
        Ok(report) => Some(report),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Legacy migration failed");
            None
        }
    }
}
