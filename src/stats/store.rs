use std::rc::Rc;

use super::backend::StatsBackend;
use super::model::{StatsPatch, UserStatistics, DEFAULT_DAILY_GOAL};
use crate::clock::Clock;
use crate::error::StorageError;
use crate::lesson::model::{Category, CourseType};
use crate::util::weighted_fold;

/// Stored accuracy counts as at most this many prior sessions when a new
/// session is folded in.
pub const ACCURACY_HISTORY_WEIGHT: u32 = 4;

/// Single owner of the learner's statistics.
///
/// Every mutation updates the in-memory state first and then saves the
/// whole blob through the backend before returning. A failed save is
/// returned to the caller; the in-memory state keeps the mutation.
pub struct StatsStore {
    stats: UserStatistics,
    backend: Box<dyn StatsBackend>,
    clock: Rc<dyn Clock>,
    daily_goal_target: u32,
    /// False when unreadable stored data could not be moved aside
    writable: bool,
    load_warning: Option<String>,
}

impl StatsStore {
    /// Load persisted statistics. Starts from defaults when nothing is
    /// stored. An unreadable blob is set aside through the backend first;
    /// if that fails too the store runs on defaults and never saves.
    pub fn open(backend: Box<dyn StatsBackend>, clock: Rc<dyn Clock>) -> Self {
        let mut writable = true;
        let mut load_warning = None;
        let stats = match backend.load() {
            Ok(Some(stats)) => {
                log::debug!("loaded statistics: {} lessons completed", stats.lessons_completed);
                stats
            }
            Ok(None) => {
                log::debug!("no stored statistics, starting fresh");
                UserStatistics::default()
            }
            Err(e) => {
                let warning = match backend.set_aside() {
                    Ok(dest) => format!(
                        "Stored statistics were unreadable ({e}); moved to {dest}, starting fresh"
                    ),
                    Err(aside) => {
                        writable = false;
                        format!(
                            "Stored statistics are unreadable ({e}) and could not be moved ({aside}); changes will not be saved"
                        )
                    }
                };
                log::warn!("{warning}");
                load_warning = Some(warning);
                UserStatistics::default()
            }
        };

        Self {
            stats,
            backend,
            clock,
            daily_goal_target: DEFAULT_DAILY_GOAL,
            writable,
            load_warning,
        }
    }

    /// Set when the stored statistics could not be loaded
    pub fn load_warning(&self) -> Option<&str> {
        self.load_warning.as_deref()
    }

    /// Target points for the daily goal, applied now and after a reset
    pub fn with_daily_goal(mut self, target_points: u32) -> Self {
        self.daily_goal_target = target_points;
        self.stats.daily_goal.target_points = target_points;
        self
    }

    pub fn stats(&self) -> &UserStatistics {
        &self.stats
    }

    pub fn snapshot(&self) -> UserStatistics {
        self.stats.clone()
    }

    pub fn clock(&self) -> &Rc<dyn Clock> {
        &self.clock
    }

    fn persist(&self) -> Result<(), StorageError> {
        if !self.writable {
            return Err(StorageError::Unreadable);
        }
        self.backend.save(&self.stats).map_err(|e| {
            log::warn!("failed to save statistics: {e}");
            e
        })
    }

    /// Set a lesson's progress. Counts the lesson as completed the first
    /// time it reaches 100.
    pub fn update_progress(
        &mut self,
        course: CourseType,
        lesson_id: u32,
        percent: u32,
    ) -> Result<(), StorageError> {
        let percent = percent.min(100);
        self.stats
            .lesson_progress
            .entry(course)
            .or_default()
            .insert(lesson_id, percent);

        if percent == 100
            && self
                .stats
                .completed_lessons
                .entry(course)
                .or_default()
                .insert(lesson_id)
        {
            self.stats.lessons_completed += 1;
            log::info!("lesson {course}/{lesson_id} completed for the first time");
        }

        self.persist()
    }

    pub fn update_stats(&mut self, patch: StatsPatch) -> Result<(), StorageError> {
        self.stats.apply(&patch);
        self.persist()
    }

    /// Fold one session's accuracy into the running figure
    pub fn update_accuracy(&mut self, session_accuracy: u32) -> Result<(), StorageError> {
        let sample = session_accuracy.min(100);
        let weight = self.stats.accuracy_samples.min(ACCURACY_HISTORY_WEIGHT);
        self.stats.accuracy_percent = weighted_fold(self.stats.accuracy_percent, sample, weight);
        self.stats.accuracy_samples = self.stats.accuracy_samples.saturating_add(1);
        self.persist()
    }

    pub fn update_time_distribution(
        &mut self,
        category: Category,
        minutes: u32,
    ) -> Result<(), StorageError> {
        *self.stats.time_by_category.entry(category).or_insert(0) += minutes;
        self.stats.total_time_minutes += minutes;
        self.persist()
    }

    /// Advance the day streak at most once per calendar day.
    /// Returns the streak after the check.
    pub fn check_and_update_streak(&mut self) -> Result<u32, StorageError> {
        let today = self.clock.today();

        match self.stats.last_streak_day {
            // Same day, or the clock went backwards: nothing to do.
            Some(last) if last >= today => return Ok(self.stats.day_streak),
            Some(last) if last.succ_opt() == Some(today) => {
                self.stats.day_streak += 1;
            }
            _ => {
                self.stats.day_streak = 1;
            }
        }
        self.stats.last_streak_day = Some(today);
        log::debug!("day streak is now {}", self.stats.day_streak);

        self.persist()?;
        Ok(self.stats.day_streak)
    }

    /// Daily hook: roll the activity window to today and reset the daily
    /// goal if the calendar day changed. Returns whether it did.
    pub fn start_new_day(&mut self) -> Result<bool, StorageError> {
        if !self.roll_day() {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    fn roll_day(&mut self) -> bool {
        let today = self.clock.today();
        let changed = self.stats.activity.roll_to(today);
        if changed {
            self.stats.daily_goal.current_points = 0;
        }
        changed
    }

    /// Credit `points` to today's slot and the daily goal. If the clock is
    /// behind the window's last day only the cumulative total is credited.
    pub fn update_today_activity(&mut self, points: u32) -> Result<(), StorageError> {
        self.roll_day();
        let today = self.clock.today();
        if self.stats.activity.day.is_some_and(|day| day > today) {
            log::warn!(
                "clock is behind the activity window ({today}); {points} points not added to the day"
            );
        } else {
            self.stats.activity.add_today(points);
            self.stats.daily_goal.current_points += points;
        }
        self.stats.points_earned += points;
        self.persist()
    }

    pub fn update_vocabulary_progress(
        &mut self,
        category: Category,
        percent: u32,
    ) -> Result<(), StorageError> {
        self.stats
            .vocabulary_progress
            .insert(category, percent.min(100));
        self.persist()
    }

    /// First visit of the day: check the streak and award `points`.
    /// Returns false if today was already recorded.
    pub fn record_daily_visit(&mut self, points: u32) -> Result<bool, StorageError> {
        if self.stats.last_streak_day == Some(self.clock.today()) {
            return Ok(false);
        }
        self.check_and_update_streak()?;
        self.update_today_activity(points)?;
        Ok(true)
    }

    /// Replace everything with defaults. Confirmation is the caller's job.
    pub fn reset_user_data(&mut self) -> Result<(), StorageError> {
        log::info!("resetting all user statistics");
        self.stats = UserStatistics::default();
        self.stats.daily_goal.target_points = self.daily_goal_target;
        self.persist()
    }
}
