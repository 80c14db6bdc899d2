use super::events::{EventBus, SessionEvent, SubscriptionId};
use super::{
    remaining_seconds, Direction, ExamMeta, ExamSnapshot, ExamStatus, NavigateOutcome,
    SessionOptions, SessionPhase, SubmitReason, TimeLeft,
};
use crate::data::DataManager;
use crate::error::{ExamError, Result};
use crate::model::{keys, Question};
use crate::store::backend::StorageBackend;
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, error, info, warn};

/// One exam attempt. Owns the in-memory state and is its only writer.
pub struct ExamSession<'a, B: StorageBackend> {
    data: &'a DataManager<B>,
    questions: Vec<Question>,
    options: SessionOptions,
    phase: SessionPhase,
    snapshot: ExamSnapshot,
    started_at: DateTime<Utc>,
    time_left: TimeLeft,
    time_expired: bool,
    hidden: bool,
    submit_reason: Option<SubmitReason>,
    results_persisted: bool,
    submission_recorded: bool,
    bus: EventBus,
}

impl<'a, B: StorageBackend> ExamSession<'a, B> {
    /// Load the question set and any checkpoint, starting a new attempt if
    /// none is recorded.
    pub fn load(data: &'a DataManager<B>, options: SessionOptions) -> Result<Self> {
        Self::load_at(data, options, Utc::now())
    }

    pub fn load_at(
        data: &'a DataManager<B>,
        options: SessionOptions,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let questions = data.load_question_set().ok_or(ExamError::NoQuestionSet)?;

        let started_at = match data.get_exam_data::<ExamMeta>(keys::EXAM_META) {
            Some(meta) => meta.started_at,
            None => {
                let meta = ExamMeta { started_at: now };
                if !data.set_exam_data(keys::EXAM_META, &meta) {
                    warn!("Could not record exam start; a reload will restart the clock");
                }
                info!(questions = questions.len(), "Exam attempt started");
                now
            }
        };

        Self::enter(data, questions, options, started_at, now)
    }

    /// Rehydrate an attempt that was already started. Fails with
    /// `InvalidState` when no attempt is recorded.
    pub fn resume(data: &'a DataManager<B>, options: SessionOptions) -> Result<Self> {
        Self::resume_at(data, options, Utc::now())
    }

    pub fn resume_at(
        data: &'a DataManager<B>,
        options: SessionOptions,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let questions = data.load_question_set().ok_or(ExamError::NoQuestionSet)?;
        let meta = data
            .get_exam_data::<ExamMeta>(keys::EXAM_META)
            .ok_or_else(|| ExamError::InvalidState("No exam in progress".to_string()))?;
        Self::enter(data, questions, options, meta.started_at, now)
    }

    fn enter(
        data: &'a DataManager<B>,
        questions: Vec<Question>,
        options: SessionOptions,
        started_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let mut snapshot = data
            .get_exam_data::<ExamSnapshot>(keys::EXAM_STATE)
            .unwrap_or_default();
        if snapshot.current_index >= questions.len() {
            warn!(
                index = snapshot.current_index,
                count = questions.len(),
                "Checkpoint index out of range, clamping"
            );
            snapshot.current_index = questions.len() - 1;
        }

        let time_left = if options.practice_mode {
            TimeLeft::Unbounded
        } else {
            TimeLeft::Seconds(remaining_seconds(
                options.time_limit_secs(),
                started_at,
                now,
            ))
        };

        let mut session = Self {
            data,
            questions,
            options,
            phase: SessionPhase::Loading,
            snapshot,
            started_at,
            time_left,
            time_expired: false,
            hidden: false,
            submit_reason: None,
            results_persisted: false,
            submission_recorded: false,
            bus: EventBus::new(),
        };

        if let Some(reason) = session.snapshot.submitted {
            info!(?reason, "Attempt was submitted without saved results, retrying");
            session.time_expired = reason == SubmitReason::TimeExpired;
            session.finish(reason);
            return Ok(session);
        }

        session.phase = SessionPhase::InProgress;
        debug!(
            index = session.snapshot.current_index,
            answered = session.snapshot.answers.len(),
            time_left = %session.time_left,
            "Exam session in progress"
        );

        if session.time_left.is_exhausted() {
            session.time_expired = true;
            session.force_submit(SubmitReason::TimeExpired);
        }

        Ok(session)
    }

    // --- Accessors ---

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn snapshot(&self) -> &ExamSnapshot {
        &self.snapshot
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.snapshot.current_index
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.snapshot.current_index]
    }

    pub fn answer(&self, question: usize) -> Option<usize> {
        self.snapshot.answers.get(&question).copied()
    }

    /// Options hidden by the fifty-fifty lifeline for this question.
    pub fn hidden_options(&self, question: usize) -> &[usize] {
        self.snapshot
            .fifty_fifty_used
            .get(&question)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn time_left(&self) -> TimeLeft {
        self.time_left
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn time_expired(&self) -> bool {
        self.time_expired
    }

    pub fn tab_leave_count(&self) -> u32 {
        self.snapshot.tab_leave_count
    }

    pub fn submit_reason(&self) -> Option<SubmitReason> {
        self.submit_reason
    }

    /// Whether final answers reached `examResults`. Meaningful once submitted.
    pub fn results_persisted(&self) -> bool {
        self.results_persisted
    }

    /// False when neither the results nor the submitted marker could be
    /// saved, so the next rehydration reopens the attempt.
    pub fn submission_recorded(&self) -> bool {
        self.submission_recorded
    }

    pub fn status(&self) -> ExamStatus {
        ExamStatus {
            phase: self.phase,
            current_index: self.snapshot.current_index,
            question_count: self.questions.len(),
            answered: self.snapshot.answers.len(),
            marked_for_review: self.snapshot.marked_count(),
            time_left: self.time_left,
            time_expired: self.time_expired,
            tab_leave_count: self.snapshot.tab_leave_count,
            started_at: self.started_at,
        }
    }

    // --- Events ---

    pub fn subscribe(&mut self, listener: impl FnMut(&SessionEvent) + 'static) -> SubscriptionId {
        self.bus.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    // --- Answering ---

    pub fn select_option(&mut self, question: usize, option: usize) -> Result<()> {
        self.set_answer(question, Some(option))
    }

    pub fn clear_answer(&mut self, question: usize) -> Result<()> {
        self.set_answer(question, None)
    }

    /// `None` removes the answer entirely.
    pub fn set_answer(&mut self, question: usize, answer: Option<usize>) -> Result<()> {
        self.ensure_in_progress()?;
        let q = self.question(question)?;

        match answer {
            Some(option) => {
                if option >= q.options.len() {
                    return Err(ExamError::InvalidState(format!(
                        "Question {} has no option {}",
                        question + 1,
                        option + 1
                    )));
                }
                if self.hidden_options(question).contains(&option) {
                    return Err(ExamError::InvalidState(format!(
                        "Option {} of question {} was removed by fifty-fifty",
                        option + 1,
                        question + 1
                    )));
                }
                self.snapshot.answers.insert(question, option);
            }
            None => {
                self.snapshot.answers.remove(&question);
            }
        }

        self.checkpoint();
        self.bus
            .emit(&SessionEvent::AnswerChanged { question, answer });
        Ok(())
    }

    /// Flip the review mark; returns the new value.
    pub fn toggle_review(&mut self, question: usize) -> Result<bool> {
        self.ensure_in_progress()?;
        self.question(question)?;

        let marked = !self.snapshot.is_marked(question);
        self.snapshot.review_marks.insert(question, marked);

        self.checkpoint();
        self.bus
            .emit(&SessionEvent::ReviewToggled { question, marked });
        Ok(marked)
    }

    pub fn use_fifty_fifty(&mut self, question: usize) -> Result<Vec<usize>> {
        self.use_fifty_fifty_with(question, &mut rand::thread_rng())
    }

    /// Hide two incorrect options, chosen uniformly. Once per question.
    /// An answer pointing at a hidden option is cleared in the same step.
    pub fn use_fifty_fifty_with<R: Rng + ?Sized>(
        &mut self,
        question: usize,
        rng: &mut R,
    ) -> Result<Vec<usize>> {
        self.ensure_in_progress()?;
        let q = self.question(question)?;

        if self.snapshot.fifty_fifty_used.contains_key(&question) {
            return Err(ExamError::InvalidState(format!(
                "Fifty-fifty already used on question {}",
                question + 1
            )));
        }

        let incorrect = q.incorrect_options();
        if incorrect.len() < 2 {
            return Err(ExamError::InvalidState(format!(
                "Question {} has fewer than two incorrect options",
                question + 1
            )));
        }

        let mut hidden: Vec<usize> = incorrect.choose_multiple(rng, 2).copied().collect();
        hidden.sort_unstable();

        let answer_cleared = match self.snapshot.answers.get(&question) {
            Some(answer) if hidden.contains(answer) => {
                self.snapshot.answers.remove(&question);
                true
            }
            _ => false,
        };
        self.snapshot
            .fifty_fifty_used
            .insert(question, hidden.clone());

        self.checkpoint();
        self.bus.emit(&SessionEvent::FiftyFiftyUsed {
            question,
            hidden: hidden.clone(),
            answer_cleared,
        });
        Ok(hidden)
    }

    // --- Navigation ---

    /// Move one question forward or back. Past either end, nothing moves and
    /// a submit confirmation is requested instead.
    pub fn navigate(&mut self, direction: Direction) -> Result<NavigateOutcome> {
        self.ensure_in_progress()?;
        let current = self.snapshot.current_index;

        let target = match direction {
            Direction::Next if current + 1 < self.questions.len() => Some(current + 1),
            Direction::Previous if current > 0 => Some(current - 1),
            _ => None,
        };

        match target {
            Some(index) => {
                self.move_to(index);
                Ok(NavigateOutcome::Moved(index))
            }
            None => {
                self.bus.emit(&SessionEvent::SubmitConfirmationRequested);
                Ok(NavigateOutcome::ConfirmSubmit)
            }
        }
    }

    pub fn go_to(&mut self, index: usize) -> Result<()> {
        self.ensure_in_progress()?;
        self.question(index)?;
        if index != self.snapshot.current_index {
            self.move_to(index);
        }
        Ok(())
    }

    fn move_to(&mut self, index: usize) {
        self.snapshot.current_index = index;
        self.checkpoint();
        self.bus.emit(&SessionEvent::QuestionChanged { index });
    }

    // --- Timer & monitoring ---

    /// One timer second. No-op in practice mode and outside `InProgress`.
    /// Reaching zero force-submits.
    pub fn tick(&mut self) -> TimeLeft {
        if self.phase != SessionPhase::InProgress {
            return self.time_left;
        }
        let TimeLeft::Seconds(secs) = self.time_left else {
            return self.time_left;
        };

        self.time_left = TimeLeft::Seconds(secs.saturating_sub(1));
        self.bus.emit(&SessionEvent::TimerTick {
            time_left: self.time_left,
        });

        if self.time_left.is_exhausted() {
            self.time_expired = true;
            info!("Time expired");
            self.force_submit(SubmitReason::TimeExpired);
        }
        self.time_left
    }

    /// Report a visibility transition of the exam view. Only a visible →
    /// hidden transition counts as a leave; repeated hidden reports do not.
    pub fn visibility_changed(&mut self, visible: bool) {
        if visible {
            self.hidden = false;
            return;
        }
        if self.hidden {
            return;
        }
        self.hidden = true;

        if self.phase != SessionPhase::InProgress || self.options.practice_mode {
            return;
        }

        self.snapshot.tab_leave_count += 1;
        let count = self.snapshot.tab_leave_count;
        self.checkpoint();

        if count >= self.options.tab_leave_limit {
            warn!(count, "Tab-leave limit reached, submitting");
            self.force_submit(SubmitReason::TabLeaveLimit);
        } else {
            let remaining = self.options.tab_leave_limit - count;
            warn!(count, remaining, "Left the exam view");
            self.bus
                .emit(&SessionEvent::TabLeaveWarning { count, remaining });
        }
    }

    // --- Submission ---

    /// User-confirmed submission.
    pub fn submit(&mut self) -> Result<bool> {
        self.ensure_in_progress()?;
        self.finish(SubmitReason::Confirmed);
        Ok(self.results_persisted)
    }

    fn force_submit(&mut self, reason: SubmitReason) {
        if self.phase == SessionPhase::InProgress {
            self.finish(reason);
        }
    }

    fn finish(&mut self, reason: SubmitReason) {
        self.phase = SessionPhase::Submitting;
        self.submit_reason = Some(reason);

        let answers_saved = self
            .data
            .set_exam_results(keys::EXAM_ANSWERS, &self.snapshot.answers);
        let marks_saved = self
            .data
            .set_exam_results(keys::REVIEW_MARKS, &self.snapshot.review_marks);
        self.results_persisted = answers_saved && marks_saved;

        if self.results_persisted {
            self.data.delete_exam_data(keys::EXAM_STATE);
            self.data.delete_exam_data(keys::EXAM_META);
            self.submission_recorded = true;
        } else {
            error!(?reason, "Exam results could not be saved");
            self.snapshot.submitted = Some(reason);
            self.submission_recorded = self.data.set_exam_data(keys::EXAM_STATE, &self.snapshot);
            if !self.submission_recorded {
                error!("Submitted marker not saved; the attempt will reopen");
            }
        }

        self.phase = SessionPhase::Submitted;
        info!(
            ?reason,
            answered = self.snapshot.answers.len(),
            persisted = self.results_persisted,
            "Exam submitted"
        );
        self.bus.emit(&SessionEvent::Submitted {
            reason,
            persisted: self.results_persisted,
        });
        self.bus.clear();
    }

    // --- Internal helpers ---

    fn ensure_in_progress(&self) -> Result<()> {
        if self.phase != SessionPhase::InProgress {
            return Err(ExamError::InvalidState(format!(
                "Exam is {}",
                self.phase
            )));
        }
        Ok(())
    }

    fn question(&self, index: usize) -> Result<&Question> {
        self.questions.get(index).ok_or_else(|| {
            ExamError::InvalidState(format!(
                "No question {} (exam has {})",
                index + 1,
                self.questions.len()
            ))
        })
    }

    fn checkpoint(&self) {
        if !self.data.set_exam_data(keys::EXAM_STATE, &self.snapshot) {
            warn!("Checkpoint dropped; the next change will retry with full state");
        }
    }
}
