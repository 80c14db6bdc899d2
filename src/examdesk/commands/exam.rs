//! Exam commands.
//!
//! Each call rehydrates the session from the store, applies one action and
//! lets the session checkpoint it. Session events raised along the way become
//! user messages.

use crate::commands::{option_label, CmdMessage, CmdResult, QuestionView};
use crate::data::DataManager;
use crate::error::{ExamError, Result};
use crate::exam::{
    Direction, ExamMeta, ExamReport, ExamSession, SessionEvent, SessionOptions,
    SessionPhase, SubmitReason,
};
use crate::model::keys;
use crate::store::backend::StorageBackend;
use std::cell::RefCell;
use std::rc::Rc;

/// Question and option indices are zero-based here; see [`question_index`]
/// and [`parse_option`] for converting user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExamAction {
    Start,
    Status,
    Answer { question: usize, option: usize },
    Clear(usize),
    Review(usize),
    FiftyFifty(usize),
    Next,
    Previous,
    GoTo(usize),
    /// The user switched away from the exam.
    Leave,
    Submit,
}

/// 1-based question number to index.
pub fn question_index(number: usize) -> Result<usize> {
    number
        .checked_sub(1)
        .ok_or_else(|| ExamError::InvalidState("Questions are numbered from 1".to_string()))
}

/// Accepts a letter (`a`..`d`) or a 1-based number.
pub fn parse_option(input: &str) -> Result<usize> {
    let trimmed = input.trim();
    if let Ok(n) = trimmed.parse::<usize>() {
        return question_index(n)
            .map_err(|_| ExamError::InvalidState("Options are numbered from 1".to_string()));
    }
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => {
            Ok((c.to_ascii_uppercase() as u8 - b'A') as usize)
        }
        _ => Err(ExamError::InvalidState(format!("Invalid option: {}", input))),
    }
}

pub fn run<B: StorageBackend>(
    data: &DataManager<B>,
    options: SessionOptions,
    action: ExamAction,
) -> Result<CmdResult> {
    let mut result = CmdResult::default();

    let mut session = if action == ExamAction::Start {
        let resuming = data.get_exam_data::<ExamMeta>(keys::EXAM_META).is_some();
        let session = ExamSession::load(data, options)?;
        if resuming {
            result.add_message(CmdMessage::info("Resuming the exam in progress"));
        } else {
            result.add_message(CmdMessage::success(format!(
                "Exam started: {} questions, time limit {}",
                session.questions().len(),
                session.time_left()
            )));
        }
        session
    } else {
        ExamSession::resume(data, options)?
    };

    if session.phase() == SessionPhase::Submitted {
        // Time ran out while nobody was looking.
        return Ok(finished(&session, result));
    }

    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    session.subscribe(move |event| sink.borrow_mut().push(event.clone()));

    match action {
        ExamAction::Start | ExamAction::Status => {}
        ExamAction::Answer { question, option } => session.select_option(question, option)?,
        ExamAction::Clear(question) => session.clear_answer(question)?,
        ExamAction::Review(question) => {
            session.toggle_review(question)?;
        }
        ExamAction::FiftyFifty(question) => {
            session.use_fifty_fifty(question)?;
        }
        ExamAction::Next => {
            session.navigate(Direction::Next)?;
        }
        ExamAction::Previous => {
            session.navigate(Direction::Previous)?;
        }
        ExamAction::GoTo(question) => session.go_to(question)?,
        ExamAction::Leave => {
            session.visibility_changed(false);
            session.visibility_changed(true);
        }
        ExamAction::Submit => {
            session.submit()?;
        }
    }

    for event in events.borrow().iter() {
        if let Some(message) = describe(event) {
            result.add_message(message);
        }
    }

    if session.phase() == SessionPhase::Submitted {
        return Ok(finished(&session, result));
    }

    let status = session.status();
    let view = question_view(&session, session.current_index());
    Ok(result.with_status(status).with_question(view))
}

fn question_view<B: StorageBackend>(session: &ExamSession<'_, B>, index: usize) -> QuestionView {
    let question = &session.questions()[index];
    QuestionView {
        index,
        total: session.questions().len(),
        text: question.question.clone(),
        options: question.options.clone(),
        hidden: session.hidden_options(index).to_vec(),
        selected: session.answer(index),
        marked: session.snapshot().is_marked(index),
    }
}

fn finished<B: StorageBackend>(session: &ExamSession<'_, B>, mut result: CmdResult) -> CmdResult {
    if !session.submission_recorded() {
        result.add_message(CmdMessage::error(
            "Results could not be saved; the exam stays open",
        ));
        return result.with_status(session.status());
    }

    let headline = match session.submit_reason() {
        Some(SubmitReason::TimeExpired) => CmdMessage::warning("Time is up. The exam was submitted"),
        Some(SubmitReason::TabLeaveLimit) => {
            CmdMessage::warning("Left the exam too often. The exam was submitted")
        }
        _ => CmdMessage::success("Exam submitted"),
    };
    result.add_message(headline);
    if !session.results_persisted() {
        result.add_message(CmdMessage::error(
            "Results could not be saved yet; `exam status` retries",
        ));
    }

    let snapshot = session.snapshot();
    let report = ExamReport::build(session.questions(), &snapshot.answers, &snapshot.review_marks);
    result.with_status(session.status()).with_report(report)
}

fn describe(event: &SessionEvent) -> Option<CmdMessage> {
    let message = match event {
        SessionEvent::AnswerChanged {
            question,
            answer: Some(option),
        } => CmdMessage::success(format!(
            "Question {}: answered {}",
            question + 1,
            option_label(*option)
        )),
        SessionEvent::AnswerChanged {
            question,
            answer: None,
        } => CmdMessage::info(format!("Question {}: answer cleared", question + 1)),
        SessionEvent::ReviewToggled { question, marked } => CmdMessage::info(format!(
            "Question {} {} for review",
            question + 1,
            if *marked { "marked" } else { "unmarked" }
        )),
        SessionEvent::FiftyFiftyUsed {
            hidden,
            answer_cleared,
            ..
        } => {
            let labels: Vec<String> = hidden.iter().map(|o| option_label(*o).to_string()).collect();
            let mut text = format!("Removed options {}", labels.join(" and "));
            if *answer_cleared {
                text.push_str("; your answer was one of them and has been cleared");
            }
            CmdMessage::success(text)
        }
        SessionEvent::TabLeaveWarning { count, remaining } => CmdMessage::warning(format!(
            "You left the exam ({} so far). {} more and it is submitted automatically",
            count, remaining
        )),
        SessionEvent::SubmitConfirmationRequested => {
            CmdMessage::warning("No more questions that way. Run `exam submit` to finish")
        }
        SessionEvent::QuestionChanged { .. }
        | SessionEvent::TimerTick { .. }
        | SessionEvent::Submitted { .. } => return None,
    };
    Some(message)
}
