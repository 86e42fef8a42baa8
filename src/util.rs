/// Integer percentage of `part` over `whole`, rounded to nearest.
/// Returns 0 when `whole` is 0.
pub fn percent(part: u32, whole: u32) -> u32 {
    match whole {
        0 => 0,
        w => ((part as f64 / w as f64) * 100.0).round() as u32,
    }
}

/// Blend `sample` into `stored` where `stored` carries `weight` prior samples.
///
/// Rounds toward `sample` so that a run of identical samples always reaches
/// it instead of stalling one point short.
pub fn weighted_fold(stored: u32, sample: u32, weight: u32) -> u32 {
    let exact = (stored as f64 * weight as f64 + sample as f64) / (weight as f64 + 1.0);
    if sample >= stored {
        exact.ceil() as u32
    } else {
        exact.floor() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(percent(1, 2), 50);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(3, 3), 100);
    }

    #[test]
    fn test_percent_zero_whole() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(5, 0), 0);
    }

    #[test]
    fn test_percent_above_whole() {
        assert_eq!(percent(3, 2), 150);
    }

    #[test]
    fn test_weighted_fold_without_history() {
        assert_eq!(weighted_fold(0, 80, 0), 80);
        assert_eq!(weighted_fold(55, 10, 0), 10);
    }

    #[test]
    fn test_weighted_fold_favours_history() {
        // (80 * 4 + 30) / 5 = 70
        assert_eq!(weighted_fold(80, 30, 4), 70);
        // (60 * 4 + 100) / 5 = 68
        assert_eq!(weighted_fold(60, 100, 4), 68);
    }

    #[test]
    fn test_weighted_fold_rounds_toward_sample() {
        // exact 98.4 rounds up toward 100
        assert_eq!(weighted_fold(98, 100, 4), 99);
        // exact 1.6 rounds down toward 0
        assert_eq!(weighted_fold(2, 0, 4), 1);
    }
}
