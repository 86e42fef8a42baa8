pub mod backend;
pub mod model;
pub mod store;

pub use backend::{JsonFileBackend, MemoryBackend, SqliteBackend, StatsBackend};
pub use model::{ActivityWindow, DailyGoal, StatsPatch, UserStatistics};
pub use store::StatsStore;
