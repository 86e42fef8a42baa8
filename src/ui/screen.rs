use ratatui::{layout::Rect, Frame};

use crate::{
    ui::{render_course_list, render_lesson, render_not_found, render_stats},
    App, AppState,
};

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame, area: Rect);
}

pub struct CourseListScreen;

impl Screen for CourseListScreen {
    fn render(&self, app: &App, f: &mut Frame, area: Rect) {
        render_course_list(app, f, area);
    }
}

pub struct LessonScreen;

impl Screen for LessonScreen {
    fn render(&self, app: &App, f: &mut Frame, area: Rect) {
        render_lesson(app, f, area);
    }
}

pub struct NotFoundScreen {
    pub lesson_id: u32,
}

impl Screen for NotFoundScreen {
    fn render(&self, _app: &App, f: &mut Frame, area: Rect) {
        render_not_found(self.lesson_id, f, area);
    }
}

pub struct StatsScreen;

impl Screen for StatsScreen {
    fn render(&self, app: &App, f: &mut Frame, area: Rect) {
        render_stats(app, f, area);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Courses => Box::new(CourseListScreen),
        AppState::Lesson => Box::new(LessonScreen),
        AppState::LessonNotFound(id) => Box::new(NotFoundScreen { lesson_id: *id }),
        AppState::Stats => Box::new(StatsScreen),
    }
}
