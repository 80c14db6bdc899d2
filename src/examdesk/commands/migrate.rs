use crate::commands::{CmdMessage, CmdResult};
use crate::data::DataManager;
use crate::error::Result;
use crate::migration::{migrate_legacy, JsonFileLegacySource, MigrationReport};
use crate::store::backend::StorageBackend;
use std::path::Path;

pub fn run<B: StorageBackend>(data: &DataManager<B>, path: &Path) -> Result<CmdResult> {
    let source = JsonFileLegacySource::new(path.to_path_buf());
    Ok(report(migrate_legacy(data, &source)?))
}

pub fn report(report: MigrationReport) -> CmdResult {
    let mut result = CmdResult::default();
    for message in summarize(&report) {
        result.add_message(message);
    }
    result.with_migration(report)
}

pub fn summarize(report: &MigrationReport) -> Vec<CmdMessage> {
    if report.already_done {
        return vec![CmdMessage::info("Legacy data was already migrated")];
    }

    let mut messages = vec![CmdMessage::success(format!(
        "Migrated {} records ({} settings, {} exam, {} results)",
        report.migrated(),
        report.settings,
        report.exam_data,
        report.exam_results
    ))];
    if report.kept_existing > 0 {
        messages.push(CmdMessage::info(format!(
            "Kept {} existing records",
            report.kept_existing
        )));
    }
    if !report.skipped.is_empty() {
        messages.push(CmdMessage::info(format!(
            "Ignored unknown keys: {}",
            report.skipped.join(", ")
        )));
    }
    if report.failed > 0 {
        messages.push(CmdMessage::error(format!(
            "{} records could not be written; migration will be retried",
            report.failed
        )));
    }
    messages
}
