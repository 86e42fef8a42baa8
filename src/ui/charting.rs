use chrono::{Duration, NaiveDate};
use lernen::lesson::Category;
use lernen::stats::{ActivityWindow, UserStatistics};
use lernen::util::percent;

/// Weekday-labelled bars for the rolling activity window, oldest first
pub fn activity_bars(window: &ActivityWindow, fallback_today: NaiveDate) -> Vec<(String, u64)> {
    let last = window.day.unwrap_or(fallback_today);
    let days = window.points.len() as i64;

    window
        .points
        .iter()
        .enumerate()
        .map(|(i, &points)| {
            let day = last - Duration::days(days - 1 - i as i64);
            (day.format("%a").to_string(), points as u64)
        })
        .collect()
}

/// Minutes and share of total time for every category with time spent
pub fn time_shares(stats: &UserStatistics) -> Vec<(Category, u32, u32)> {
    let total: u32 = stats.time_by_category.values().sum();
    Category::ALL
        .iter()
        .filter_map(|&c| {
            let minutes = stats.time_in(c);
            (minutes > 0).then(|| (c, minutes, percent(minutes, total)))
        })
        .collect()
}

/// Ratio for a gauge, clamped to what ratatui accepts
pub fn gauge_ratio(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64).clamp(0.0, 1.0)
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.1}")
    }
}
