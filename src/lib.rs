// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod controls;
pub mod error;
pub mod lesson;
pub mod runtime;
pub mod stats;
pub mod util;

pub use error::{CatalogError, LessonError, StorageError};
