use std::collections::HashSet;
use std::rc::Rc;

use chrono::{DateTime, Local};

use super::catalog::LessonCatalog;
use super::model::{LessonDefinition, StepDefinition};
use crate::clock::{elapsed_minutes, Clock};
use crate::error::{LessonError, StorageError};
use crate::stats::model::StatsPatch;
use crate::stats::store::StatsStore;
use crate::util::percent;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AnswerState {
    #[default]
    Unanswered,
    Correct,
    Incorrect,
}

/// Transient state of one learner walking through one lesson
#[derive(Clone, Debug, PartialEq)]
pub struct LessonSessionState {
    pub lesson_id: u32,
    pub current_step_index: usize,
    pub selected_answer: Option<String>,
    pub answer_state: AnswerState,
    pub hint_visible: bool,
    pub session_start: DateTime<Local>,
    /// Survives `restart`, so it can exceed the number of practice steps
    pub correct_answer_count: u32,
    pub total_practice_step_count: u32,
}

impl LessonSessionState {
    fn clear_transient(&mut self) {
        self.selected_answer = None;
        self.answer_state = AnswerState::Unanswered;
        self.hint_visible = false;
    }
}

/// Result of the completion commit
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionReport {
    pub lesson_id: u32,
    pub time_spent_minutes: u32,
    pub correct_answer_count: u32,
    pub total_practice_step_count: u32,
    /// Accuracy as committed to the statistics, at most 100
    pub session_accuracy: u32,
    pub words_learned_delta: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    Moved(usize),
    Finished(CompletionReport),
    Ignored,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckOutcome {
    Correct,
    Incorrect,
    Ignored,
}

/// Learner intents the lesson view can issue
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LessonAction {
    Next,
    Previous,
    /// Pick the option at this position of the current practice step
    Select(usize),
    Check,
    ToggleHint,
    Restart,
    Finish,
    Abandon,
}

/// What the view should do after an action
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionResult {
    Stay,
    Finished(CompletionReport),
    Abandoned { minutes: u32 },
}

/// Drives one lesson from open to completion or abandonment.
///
/// Statistics are written through the `StatsStore` passed to each call;
/// the session never holds on to it.
pub struct LessonSession {
    lesson: LessonDefinition,
    state: LessonSessionState,
    /// Step indices credited with a correct answer during the current pass
    credited: HashSet<usize>,
    clock: Rc<dyn Clock>,
    closed: bool,
}

impl std::fmt::Debug for LessonSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LessonSession")
            .field("lesson", &self.lesson)
            .field("state", &self.state)
            .field("credited", &self.credited)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl LessonSession {
    pub fn open(
        catalog: &dyn LessonCatalog,
        lesson_id: u32,
        clock: Rc<dyn Clock>,
    ) -> Result<Self, LessonError> {
        let lesson = catalog
            .lesson(lesson_id)
            .filter(|l| !l.steps.is_empty())
            .ok_or(LessonError::NotFound { id: lesson_id })?
            .clone();

        let state = LessonSessionState {
            lesson_id,
            current_step_index: 0,
            selected_answer: None,
            answer_state: AnswerState::Unanswered,
            hint_visible: false,
            session_start: clock.now(),
            correct_answer_count: 0,
            total_practice_step_count: lesson.practice_count() as u32,
        };
        log::debug!(
            "opened lesson {} ({} steps, {} practice)",
            lesson_id,
            lesson.steps.len(),
            state.total_practice_step_count
        );

        let session = Self {
            lesson,
            state,
            credited: HashSet::new(),
            clock,
            closed: false,
        };
        session.warn_if_unanswerable();
        Ok(session)
    }

    pub fn lesson(&self) -> &LessonDefinition {
        &self.lesson
    }

    pub fn state(&self) -> &LessonSessionState {
        &self.state
    }

    pub fn current_step(&self) -> &StepDefinition {
        &self.lesson.steps[self.state.current_step_index]
    }

    pub fn current_step_answerable(&self) -> bool {
        self.current_step().is_answerable()
    }

    pub fn is_last_step(&self) -> bool {
        self.state.current_step_index + 1 == self.lesson.steps.len()
    }

    /// Committed or abandoned; every further call is ignored
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn move_to(&mut self, index: usize) {
        self.state.current_step_index = index;
        self.state.clear_transient();
        log::debug!(
            "lesson {} at step {}: {}",
            self.lesson.id,
            index,
            self.current_step().heading()
        );
        self.warn_if_unanswerable();
    }

    fn warn_if_unanswerable(&self) {
        if !self.current_step_answerable() {
            log::warn!(
                "lesson {} step {} cannot be answered",
                self.lesson.id,
                self.state.current_step_index + 1
            );
        }
    }

    fn ignored(&self, what: &str) {
        log::debug!(
            "ignored {what} on lesson {} step {} ({:?}, closed: {})",
            self.lesson.id,
            self.state.current_step_index,
            self.state.answer_state,
            self.closed
        );
    }

    fn current_options(&self) -> Option<&[String]> {
        match self.current_step() {
            StepDefinition::Practice { options, .. } => Some(options),
            StepDefinition::Intro { .. }
            | StepDefinition::Explanation { .. }
            | StepDefinition::Completion { .. } => None,
        }
    }

    /// Advance one step, or run the completion commit from the last step
    pub fn next(&mut self, store: &mut StatsStore) -> Result<Transition, LessonError> {
        if self.closed {
            self.ignored("next");
            return Ok(Transition::Ignored);
        }
        if self.is_last_step() {
            return self.commit(store).map(Transition::Finished);
        }
        let next = self.state.current_step_index + 1;
        self.move_to(next);
        Ok(Transition::Moved(next))
    }

    pub fn previous(&mut self) -> Transition {
        if self.closed || self.state.current_step_index == 0 {
            self.ignored("previous");
            return Transition::Ignored;
        }
        let prev = self.state.current_step_index - 1;
        self.move_to(prev);
        Transition::Moved(prev)
    }

    /// Select one of the current practice step's options.
    /// Returns false when the selection was not accepted.
    pub fn select_answer(&mut self, option: &str) -> bool {
        let accepted = !self.closed
            && self.state.answer_state == AnswerState::Unanswered
            && self
                .current_options()
                .is_some_and(|opts| opts.iter().any(|o| o == option));

        if !accepted {
            self.ignored("select");
            return false;
        }
        self.state.selected_answer = Some(option.to_string());
        true
    }

    pub fn select_option(&mut self, index: usize) -> bool {
        match self.current_options().and_then(|opts| opts.get(index)) {
            Some(option) => {
                let option = option.clone();
                self.select_answer(&option)
            }
            None => {
                self.ignored("select");
                false
            }
        }
    }

    /// Grade the selected answer.
    ///
    /// A correct answer is credited once per step per pass: it bumps the
    /// correct count and raises the stored lesson progress by one practice
    /// step's share, never lowering it.
    pub fn check_answer(&mut self, store: &mut StatsStore) -> Result<CheckOutcome, LessonError> {
        if self.closed || self.state.answer_state != AnswerState::Unanswered {
            self.ignored("check");
            return Ok(CheckOutcome::Ignored);
        }
        let Some(selected) = self.state.selected_answer.as_deref() else {
            self.ignored("check");
            return Ok(CheckOutcome::Ignored);
        };
        let StepDefinition::Practice { correct_answer, .. } = self.current_step() else {
            self.ignored("check");
            return Ok(CheckOutcome::Ignored);
        };

        let index = self.state.current_step_index;
        if !self.current_step_answerable() {
            return Err(LessonError::MalformedLessonData {
                lesson_id: self.lesson.id,
                step_index: index,
            });
        }

        if selected != correct_answer.as_str() {
            self.state.answer_state = AnswerState::Incorrect;
            log::debug!("lesson {} step {index}: incorrect", self.lesson.id);
            return Ok(CheckOutcome::Incorrect);
        }

        self.state.answer_state = AnswerState::Correct;
        if !self.credited.insert(index) {
            log::debug!("lesson {} step {index}: already credited", self.lesson.id);
            return Ok(CheckOutcome::Correct);
        }
        self.state.correct_answer_count += 1;

        let total = self.state.total_practice_step_count;
        if total > 0 {
            let prior = store.stats().lesson_progress(self.lesson.course, self.lesson.id);
            let raised = (prior as f64 + 100.0 / total as f64).round().min(100.0) as u32;
            if raised > prior {
                store.update_progress(self.lesson.course, self.lesson.id, raised)?;
            }
        }
        Ok(CheckOutcome::Correct)
    }

    /// Flip hint visibility; returns the new value
    pub fn toggle_hint(&mut self) -> bool {
        if !self.closed {
            self.state.hint_visible = !self.state.hint_visible;
        }
        self.state.hint_visible
    }

    /// Back to the first step. The correct-answer count is kept.
    pub fn restart(&mut self) -> Transition {
        if self.closed {
            self.ignored("restart");
            return Transition::Ignored;
        }
        self.credited.clear();
        self.move_to(0);
        Transition::Moved(0)
    }

    /// Explicit finish from a completion step or the last step
    pub fn finish(&mut self, store: &mut StatsStore) -> Result<Transition, LessonError> {
        if self.closed || !(self.current_step().is_completion() || self.is_last_step()) {
            self.ignored("finish");
            return Ok(Transition::Ignored);
        }
        self.commit(store).map(Transition::Finished)
    }

    fn report(&self) -> CompletionReport {
        let correct = self.state.correct_answer_count;
        let total = self.state.total_practice_step_count;
        CompletionReport {
            lesson_id: self.lesson.id,
            time_spent_minutes: elapsed_minutes(self.state.session_start, self.clock.now()),
            correct_answer_count: correct,
            total_practice_step_count: total,
            session_accuracy: percent(correct, total).min(100),
            words_learned_delta: self.lesson.words_learned_delta(),
        }
    }

    /// Fold the session into the statistics. Every write is attempted; the
    /// first failure is returned and the session is closed regardless.
    fn commit(&mut self, store: &mut StatsStore) -> Result<CompletionReport, LessonError> {
        self.closed = true;
        let report = self.report();
        log::info!(
            "lesson {} completed: {}/{} correct, {} min",
            report.lesson_id,
            report.correct_answer_count,
            report.total_practice_step_count,
            report.time_spent_minutes
        );

        let words = store.stats().words_learned + report.words_learned_delta;
        let results: [Result<(), StorageError>; 4] = [
            store.update_stats(StatsPatch {
                words_learned: Some(words),
                ..Default::default()
            }),
            store.update_accuracy(report.session_accuracy),
            store.update_time_distribution(self.lesson.category, report.time_spent_minutes),
            store.update_progress(self.lesson.course, self.lesson.id, 100),
        ];

        match results.into_iter().find_map(Result::err) {
            Some(e) => Err(e.into()),
            None => Ok(report),
        }
    }

    /// Leave without completing: only the elapsed time is recorded.
    /// Returns the minutes flushed; zero once the session is closed.
    pub fn abandon(&mut self, store: &mut StatsStore) -> Result<u32, LessonError> {
        if self.closed {
            self.ignored("abandon");
            return Ok(0);
        }
        self.closed = true;

        let minutes = elapsed_minutes(self.state.session_start, self.clock.now());
        log::info!("lesson {} abandoned after {minutes} min", self.lesson.id);
        if minutes > 0 {
            store.update_time_distribution(self.lesson.category, minutes)?;
        }
        Ok(minutes)
    }

    pub fn apply(
        &mut self,
        action: LessonAction,
        store: &mut StatsStore,
    ) -> Result<ActionResult, LessonError> {
        let transition = match action {
            LessonAction::Next => self.next(store)?,
            LessonAction::Previous => self.previous(),
            LessonAction::Select(index) => {
                self.select_option(index);
                Transition::Ignored
            }
            LessonAction::Check => {
                self.check_answer(store)?;
                Transition::Ignored
            }
            LessonAction::ToggleHint => {
                self.toggle_hint();
                Transition::Ignored
            }
            LessonAction::Restart => self.restart(),
            LessonAction::Finish => self.finish(store)?,
            LessonAction::Abandon => {
                let minutes = self.abandon(store)?;
                return Ok(ActionResult::Abandoned { minutes });
            }
        };

        Ok(match transition {
            Transition::Finished(report) => ActionResult::Finished(report),
            Transition::Moved(_) | Transition::Ignored => ActionResult::Stay,
        })
    }
}
