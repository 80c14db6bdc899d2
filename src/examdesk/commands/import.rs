use crate::commands::{CmdMessage, CmdResult};
use crate::data::DataManager;
use crate::error::{ExamError, Result};
use crate::import::{levels, load_question_file, select_sections};
use crate::store::backend::StorageBackend;
use std::path::Path;

/// Validate a question file, keep the requested levels, and make the result
/// the set the next attempt runs on. Any attempt in progress is discarded.
pub fn run<B: StorageBackend>(
    data: &DataManager<B>,
    path: &Path,
    sections: &[u32],
) -> Result<CmdResult> {
    let questions = load_question_file(path)?;
    let selected = select_sections(&questions, sections);
    if selected.is_empty() {
        return Err(ExamError::Validation(format!(
            "no questions at level(s) {:?}; file has levels {:?}",
            sections,
            levels(&questions)
        )));
    }

    let mut result = CmdResult::default();
    if !data.save_question_set(&questions) || !data.finalize_question_set(&selected) {
        result.add_message(CmdMessage::error("Question set could not be saved"));
        return Ok(result);
    }

    result.add_message(CmdMessage::info(format!(
        "Read {} questions from {}",
        questions.len(),
        path.display()
    )));
    result.add_message(CmdMessage::success(format!(
        "Exam ready with {} questions",
        selected.len()
    )));
    Ok(result)
}
