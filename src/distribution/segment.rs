use super::{WeeklyBucket, WeeklyHistogram};
use crate::calendar::{key_of, WeekKey};
use crate::model::LabelAdoption;
use serde::Serialize;

/// Weekly counts split at the week a newcomer label was first used.
/// The adoption week opens `after`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segmentation {
    pub adoption_week: WeekKey,
    pub before: Vec<usize>,
    pub after: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SideSummary {
    pub weeks: usize,
    pub total: usize,
    pub mean: f64,
}

impl SideSummary {
    fn of(counts: &[usize]) -> Self {
        let total: usize = counts.iter().sum();
        let mean = if counts.is_empty() {
            0.0
        } else {
            total as f64 / counts.len() as f64
        };
        Self {
            weeks: counts.len(),
            total,
            mean,
        }
    }
}

impl Segmentation {
    pub fn summary(&self) -> (SideSummary, SideSummary) {
        (SideSummary::of(&self.before), SideSummary::of(&self.after))
    }

    pub fn len(&self) -> usize {
        self.before.len() + self.after.len()
    }

    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }
}

/// Split `dense` around the adoption week. When that week has no bucket (label
/// used before creation or after the upper bound) an empty one is placed in
/// order first, so the split always lands on a real position.
pub fn segment(dense: &WeeklyHistogram, adoption: Option<&LabelAdoption>) -> Option<Segmentation> {
    let adoption = adoption?;
    let adoption_week = key_of(&adoption.created_at);
    let extended = dense.with_week(adoption_week);
    let split = extended
        .buckets()
        .partition_point(|bucket| bucket.week() < adoption_week);

    let (before, after) = extended.buckets().split_at(split);
    Some(Segmentation {
        adoption_week,
        before: before.iter().map(WeeklyBucket::total).collect(),
        after: after.iter().map(WeeklyBucket::total).collect(),
    })
}
