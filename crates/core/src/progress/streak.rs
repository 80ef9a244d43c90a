use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};

/// Distinct UTC calendar days on which a quiz or a lesson was completed.
pub fn activity_days(
    quiz_completions: impl IntoIterator<Item = DateTime<Utc>>,
    lesson_completions: impl IntoIterator<Item = DateTime<Utc>>,
) -> BTreeSet<NaiveDate> {
    quiz_completions
        .into_iter()
        .chain(lesson_completions)
        .map(|at| at.date_naive())
        .collect()
}

/// Consecutive active days counted backward from the most recent active day.
///
/// Any calendar day without activity ends the streak.
#[must_use]
pub fn current_streak(days: &BTreeSet<NaiveDate>) -> u32 {
    let Some(&latest) = days.last() else {
        return 0;
    };

    let mut streak = 1_u32;
    let mut day = latest;
    while let Some(prev) = day.pred_opt() {
        if !days.contains(&prev) {
            break;
        }
        streak = streak.saturating_add(1);
        day = prev;
    }
    streak
}
