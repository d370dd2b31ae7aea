use chrono::{Datelike, NaiveDate};

const FLEXIBLE_MOVE_IN: [&str; 3] = ["asap", "immediately", "flexible"];

/// Timing refinement signal for the blender
///
/// Compares the renter's move-in preference against the listing's
/// availability, measuring day gaps from `reference_date` (the run date) so
/// the result does not depend on the wall clock.
pub fn timing_refinement(
    move_in: Option<&str>,
    available_from: Option<&str>,
    reference_date: NaiveDate,
) -> f64 {
    let preference = move_in.map(|p| p.trim().to_lowercase()).unwrap_or_default();
    let available = available_from.map(str::trim).unwrap_or_default();

    if preference.is_empty() || available.is_empty() {
        return 0.5;
    }

    if FLEXIBLE_MOVE_IN.contains(&preference.as_str()) {
        return 0.9;
    }

    if let Some(available_date) = parse_available_date(available) {
        if preference == "next month"
            && (available_date <= reference_date
                || is_following_month(reference_date, available_date))
        {
            return 0.9;
        }

        let gap = (available_date - reference_date).num_days().abs();
        if gap <= 30 {
            return 0.9;
        } else if gap <= 60 {
            return 0.7;
        } else if gap <= 90 {
            return 0.5;
        }
    }

    if available.to_lowercase().contains(&preference) {
        0.8
    } else {
        0.4
    }
}

/// Parse the leading `YYYY-MM-DD` of an availability string
fn parse_available_date(available: &str) -> Option<NaiveDate> {
    if available.len() <= 4 {
        return None;
    }
    let head = available.get(..10).unwrap_or(available);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

fn is_following_month(reference: NaiveDate, candidate: NaiveDate) -> bool {
    let (year, month) = if reference.month() == 12 {
        (reference.year() + 1, 1)
    } else {
        (reference.year(), reference.month() + 1)
    };
    candidate.year() == year && candidate.month() == month
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_missing_side_is_neutral() {
        assert_eq!(timing_refinement(None, Some("2024-09-01"), day(2024, 8, 1)), 0.5);
        assert_eq!(timing_refinement(Some("asap"), None, day(2024, 8, 1)), 0.5);
    }

    #[test]
    fn test_flexible_preferences() {
        for pref in ["ASAP", "immediately", "Flexible"] {
            assert_eq!(timing_refinement(Some(pref), Some("whenever"), day(2024, 8, 1)), 0.9);
        }
    }

    #[test]
    fn test_day_gap_buckets() {
        let today = day(2024, 8, 1);
        assert_eq!(timing_refinement(Some("september"), Some("2024-08-20"), today), 0.9);
        assert_eq!(timing_refinement(Some("september"), Some("2024-09-20"), today), 0.7);
        assert_eq!(timing_refinement(Some("october"), Some("2024-10-20"), today), 0.5);
        // More than 90 days out falls through to text matching
        assert_eq!(timing_refinement(Some("2024-12"), Some("2024-12-15"), today), 0.8);
        assert_eq!(timing_refinement(Some("june"), Some("2025-01-15"), today), 0.4);
    }

    #[test]
    fn test_next_month() {
        let today = day(2024, 12, 10);
        assert_eq!(timing_refinement(Some("next month"), Some("2025-01-28"), today), 0.9);
        assert_eq!(timing_refinement(Some("next month"), Some("2024-11-01"), today), 0.9);
    }

    #[test]
    fn test_unparseable_dates_use_text() {
        let today = day(2024, 8, 1);
        assert_eq!(timing_refinement(Some("fall"), Some("Fall semester"), today), 0.8);
        assert_eq!(timing_refinement(Some("spring"), Some("Fall semester"), today), 0.4);
    }
}
