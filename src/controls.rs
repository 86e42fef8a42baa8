use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::lesson::model::StepDefinition;
use crate::lesson::session::{AnswerState, LessonAction, LessonSession};

/// Help line shown under the lesson view
pub const LESSON_KEYS: &str =
    "(1-9) choose  (enter) check/next  (←/→) step  (h)int  (r)estart  (f)inish  (esc) leave";

/// Translate a key press in the lesson view into a learner action.
///
/// Enter is contextual: on a practice step with a pending selection it
/// checks the answer, everywhere else it advances.
pub fn lesson_action(key: KeyEvent, session: &LessonSession) -> Option<LessonAction> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return None;
    }

    match key.code {
        KeyCode::Enter => {
            let state = session.state();
            let pending = matches!(session.current_step(), StepDefinition::Practice { .. })
                && state.answer_state == AnswerState::Unanswered
                && state.selected_answer.is_some();
            Some(if pending {
                LessonAction::Check
            } else {
                LessonAction::Next
            })
        }
        KeyCode::Right | KeyCode::Char('n') => Some(LessonAction::Next),
        KeyCode::Left | KeyCode::Char('p') => Some(LessonAction::Previous),
        KeyCode::Char(c @ '1'..='9') => {
            c.to_digit(10).map(|d| LessonAction::Select(d as usize - 1))
        }
        KeyCode::Char('c') => Some(LessonAction::Check),
        KeyCode::Char('h') => Some(LessonAction::ToggleHint),
        KeyCode::Char('r') => Some(LessonAction::Restart),
        KeyCode::Char('f') => Some(LessonAction::Finish),
        KeyCode::Esc | KeyCode::Char('q') => Some(LessonAction::Abandon),
        _ => None,
    }
}
