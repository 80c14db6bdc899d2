use crate::commands::{CmdMessage, CmdResult};
use crate::data::DataManager;
use crate::error::Result;
use crate::store::backend::StorageBackend;

/// Wipe the exam partition only, or every partition.
pub fn run<B: StorageBackend>(data: &DataManager<B>, exam_only: bool) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    let (cleared, what) = if exam_only {
        (data.clear_exam_data(), "Exam data")
    } else {
        (data.clear_all_app_data(), "All app data")
    };

    if cleared {
        result.add_message(CmdMessage::success(format!("{} cleared", what)));
    } else {
        result.add_message(CmdMessage::error(format!("{} could not be cleared", what)));
    }
    Ok(result)
}
