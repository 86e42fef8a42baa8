pub mod catalog;
pub mod model;
pub mod session;

pub use catalog::{LessonCatalog, StaticCatalog};
pub use model::{Category, CourseType, ExamplePair, LessonDefinition, StepDefinition};
pub use session::{
    ActionResult, AnswerState, CheckOutcome, CompletionReport, LessonAction, LessonSession,
    LessonSessionState, Transition,
};
