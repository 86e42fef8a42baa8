use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::lesson::model::{Category, CourseType};

pub const ACTIVITY_DAYS: usize = 7;
pub const DEFAULT_DAILY_GOAL: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyGoal {
    pub target_points: u32,
    pub current_points: u32,
}

impl Default for DailyGoal {
    fn default() -> Self {
        Self {
            target_points: DEFAULT_DAILY_GOAL,
            current_points: 0,
        }
    }
}

impl DailyGoal {
    pub fn remaining(&self) -> u32 {
        self.target_points.saturating_sub(self.current_points)
    }

    pub fn is_reached(&self) -> bool {
        self.current_points >= self.target_points
    }
}

/// Points earned per day over the last week; the last slot is `day`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActivityWindow {
    pub day: Option<NaiveDate>,
    pub points: [u32; ACTIVITY_DAYS],
}

impl ActivityWindow {
    /// Move the window forward so its last slot is `today`.
    /// Returns true when the calendar day changed.
    pub fn roll_to(&mut self, today: NaiveDate) -> bool {
        let Some(day) = self.day else {
            self.day = Some(today);
            return true;
        };
        if today <= day {
            return false;
        }

        let gap = (today - day).num_days().min(ACTIVITY_DAYS as i64) as usize;
        self.points.rotate_left(gap);
        for slot in &mut self.points[ACTIVITY_DAYS - gap..] {
            *slot = 0;
        }
        self.day = Some(today);
        true
    }

    pub fn today(&self) -> u32 {
        self.points[ACTIVITY_DAYS - 1]
    }

    pub fn add_today(&mut self, points: u32) {
        self.points[ACTIVITY_DAYS - 1] += points;
    }

    pub fn total(&self) -> u32 {
        self.points.iter().sum()
    }
}

/// Cumulative learner statistics, the blob persisted between runs
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserStatistics {
    pub total_time_minutes: u32,
    pub words_learned: u32,
    pub lessons_completed: u32,
    pub accuracy_percent: u32,
    /// Sessions folded into `accuracy_percent` so far
    pub accuracy_samples: u32,
    pub day_streak: u32,
    pub last_streak_day: Option<NaiveDate>,
    pub points_earned: u32,
    pub time_by_category: BTreeMap<Category, u32>,
    pub vocabulary_progress: BTreeMap<Category, u32>,
    pub daily_goal: DailyGoal,
    pub lesson_progress: BTreeMap<CourseType, BTreeMap<u32, u32>>,
    pub completed_lessons: BTreeMap<CourseType, BTreeSet<u32>>,
    pub activity: ActivityWindow,
}

impl UserStatistics {
    pub fn lesson_progress(&self, course: CourseType, lesson_id: u32) -> u32 {
        self.lesson_progress
            .get(&course)
            .and_then(|m| m.get(&lesson_id))
            .copied()
            .unwrap_or(0)
    }

    pub fn is_completed(&self, course: CourseType, lesson_id: u32) -> bool {
        self.completed_lessons
            .get(&course)
            .is_some_and(|s| s.contains(&lesson_id))
    }

    pub fn time_in(&self, category: Category) -> u32 {
        self.time_by_category.get(&category).copied().unwrap_or(0)
    }

    pub fn vocabulary_in(&self, category: Category) -> u32 {
        self.vocabulary_progress.get(&category).copied().unwrap_or(0)
    }

    pub fn total_hours(&self) -> f64 {
        self.total_time_minutes as f64 / 60.0
    }

    pub fn apply(&mut self, patch: &StatsPatch) {
        if let Some(v) = patch.words_learned {
            self.words_learned = v;
        }
        if let Some(v) = patch.lessons_completed {
            self.lessons_completed = v;
        }
        if let Some(v) = patch.total_time_minutes {
            self.total_time_minutes = v;
        }
        if let Some(v) = patch.points_earned {
            self.points_earned = v;
        }
    }
}

/// Fields to overwrite in one `update_stats` call.
/// Values are new totals, not increments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsPatch {
    pub words_learned: Option<u32>,
    pub lessons_completed: Option<u32>,
    pub total_time_minutes: Option<u32>,
    pub points_earned: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn test_roll_first_day_only_sets_anchor() {
        let mut window = ActivityWindow::default();
        assert!(window.roll_to(day(10)));
        assert_eq!(window.day, Some(day(10)));
        assert_eq!(window.points, [0; ACTIVITY_DAYS]);
    }

    #[test]
    fn test_roll_same_day_is_noop() {
        let mut window = ActivityWindow {
            day: Some(day(10)),
            points: [1, 2, 3, 4, 5, 6, 7],
        };
        assert!(!window.roll_to(day(10)));
        assert_eq!(window.points, [1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_roll_shifts_by_elapsed_days() {
        let mut window = ActivityWindow {
            day: Some(day(10)),
            points: [1, 2, 3, 4, 5, 6, 7],
        };
        assert!(window.roll_to(day(12)));
        assert_eq!(window.points, [3, 4, 5, 6, 7, 0, 0]);
        assert_eq!(window.today(), 0);
    }

    #[test]
    fn test_roll_after_long_gap_clears_window() {
        let mut window = ActivityWindow {
            day: Some(day(1)),
            points: [9; ACTIVITY_DAYS],
        };
        window.roll_to(day(20));
        assert_eq!(window.points, [0; ACTIVITY_DAYS]);
        assert_eq!(window.day, Some(day(20)));
    }

    #[test]
    fn test_add_today() {
        let mut window = ActivityWindow::default();
        window.roll_to(day(3));
        window.add_today(5);
        window.add_today(10);
        assert_eq!(window.today(), 15);
        assert_eq!(window.total(), 15);
    }

    #[test]
    fn test_daily_goal_remaining() {
        let goal = DailyGoal {
            target_points: 50,
            current_points: 20,
        };
        assert_eq!(goal.remaining(), 30);
        assert!(!goal.is_reached());

        let done = DailyGoal {
            target_points: 50,
            current_points: 65,
        };
        assert_eq!(done.remaining(), 0);
        assert!(done.is_reached());
    }

    #[test]
    fn test_patch_overwrites_only_given_fields() {
        let mut stats = UserStatistics {
            words_learned: 10,
            lessons_completed: 2,
            ..Default::default()
        };
        stats.apply(&StatsPatch {
            words_learned: Some(25),
            ..Default::default()
        });
        assert_eq!(stats.words_learned, 25);
        assert_eq!(stats.lessons_completed, 2);
    }

    #[test]
    fn test_blob_roundtrip_keeps_every_field() {
        let mut stats = UserStatistics {
            total_time_minutes: 95,
            words_learned: 40,
            lessons_completed: 3,
            accuracy_percent: 82,
            accuracy_samples: 4,
            day_streak: 6,
            last_streak_day: Some(day(9)),
            points_earned: 120,
            ..Default::default()
        };
        stats.time_by_category.insert(Category::Grammar, 30);
        stats.vocabulary_progress.insert(Category::Vocabulary, 45);
        stats
            .lesson_progress
            .entry(CourseType::Beginner)
            .or_default()
            .insert(2, 50);
        stats
            .completed_lessons
            .entry(CourseType::Intermediate)
            .or_default()
            .insert(5);
        stats.activity = ActivityWindow {
            day: Some(day(9)),
            points: [0, 5, 10, 0, 20, 5, 15],
        };

        let json = serde_json::to_string(&stats).unwrap();
        let back: UserStatistics = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stats);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let back: UserStatistics = serde_json::from_str(r#"{ "words_learned": 7 }"#).unwrap();
        assert_eq!(back.words_learned, 7);
        assert_eq!(back.daily_goal, DailyGoal::default());
        assert_eq!(back.lesson_progress(CourseType::Beginner, 1), 0);
    }
}
