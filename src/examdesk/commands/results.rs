use crate::commands::{CmdMessage, CmdResult};
use crate::data::DataManager;
use crate::error::Result;
use crate::exam::ExamReport;
use crate::model::keys;
use crate::store::backend::StorageBackend;
use std::collections::BTreeMap;

/// Report on the last submitted attempt against the current question set.
pub fn show<B: StorageBackend>(data: &DataManager<B>) -> Result<CmdResult> {
    let mut result = CmdResult::default();

    let Some(answers) = data.get_exam_results::<BTreeMap<usize, usize>>(keys::EXAM_ANSWERS) else {
        result.add_message(CmdMessage::info("No submitted exam yet"));
        return Ok(result);
    };
    let Some(questions) = data.load_question_set() else {
        result.add_message(CmdMessage::warning(
            "Results exist but the question set is gone",
        ));
        return Ok(result);
    };
    let marks: BTreeMap<usize, bool> = data
        .get_exam_results(keys::REVIEW_MARKS)
        .unwrap_or_default();

    Ok(result.with_report(ExamReport::build(&questions, &answers, &marks)))
}

pub fn clear<B: StorageBackend>(data: &DataManager<B>) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    if data.clear_exam_results() {
        result.add_message(CmdMessage::success("Results cleared"));
    } else {
        result.add_message(CmdMessage::error("Results could not be cleared"));
    }
    Ok(result)
}
