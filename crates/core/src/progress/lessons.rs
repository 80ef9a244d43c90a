use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::model::{LessonId, LessonProgress, LessonStatus};

use super::round1;

/// Per-lesson status row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonRow {
    pub lesson_id: LessonId,
    pub status: LessonStatus,
    pub progress_percent: f64,
}

/// Completion breakdown of the lesson catalog for one student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonOverview {
    pub completed: u32,
    pub in_progress: u32,
    pub not_started: u32,
    pub completion_percentage: f64,
    pub lessons: Vec<LessonRow>,
}

/// Match `catalog` against stored progress. Lessons never opened count as not started.
///
/// Repeated catalog entries count once, in first-seen order.
#[must_use]
pub fn lesson_overview(catalog: &[LessonId], progress: &[LessonProgress]) -> LessonOverview {
    let mut seen = HashSet::new();
    let catalog: Vec<LessonId> = catalog.iter().copied().filter(|id| seen.insert(*id)).collect();
    let by_lesson: HashMap<LessonId, &LessonProgress> =
        progress.iter().map(|lp| (lp.lesson_id(), lp)).collect();

    let mut completed = 0_u32;
    let mut in_progress = 0_u32;
    let mut not_started = 0_u32;

    let lessons: Vec<LessonRow> = catalog
        .iter()
        .map(|&lesson_id| {
            let (status, progress_percent) = by_lesson
                .get(&lesson_id)
                .map_or((LessonStatus::NotStarted, 0.0), |lp| {
                    (lp.status(), lp.progress_percent())
                });
            match status {
                LessonStatus::Completed => completed += 1,
                LessonStatus::InProgress => in_progress += 1,
                LessonStatus::NotStarted => not_started += 1,
            }
            LessonRow {
                lesson_id,
                status,
                progress_percent,
            }
        })
        .collect();

    let completion_percentage = if catalog.is_empty() {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let total = catalog.len() as f64;
        round1(f64::from(completed) / total * 100.0)
    };

    LessonOverview {
        completed,
        in_progress,
        not_started,
        completion_percentage,
        lessons,
    }
}
