use super::{SparseHistogram, WeeklyBucket, WeeklyHistogram};
use crate::calendar::key_of;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// Expand `sparse` into one bucket per week, from the week holding `anchor`
/// up to the last week starting before `upper_bound`.
///
/// An anchor at or after the upper bound yields an empty histogram. Events of
/// weeks outside that span are not carried over.
pub fn fill(
    sparse: &SparseHistogram,
    anchor: DateTime<Utc>,
    upper_bound: DateTime<Utc>,
) -> WeeklyHistogram {
    if anchor >= upper_bound {
        debug!(%anchor, %upper_bound, "empty range, nothing to fill");
        return WeeklyHistogram::default();
    }

    let mut buckets = Vec::new();
    let mut carried = 0usize;
    let mut week = key_of(&anchor);
    while week.start() < upper_bound {
        match sparse.get(&week) {
            Some(bucket) => {
                carried += bucket.total();
                buckets.push(bucket.clone());
            }
            None => buckets.push(WeeklyBucket::empty(week)),
        }
        week = week.successor();
    }

    let dropped = sparse.total_events() - carried;
    if dropped > 0 {
        warn!(dropped, %anchor, %upper_bound, "contributions outside the repository lifetime were left out");
    }

    WeeklyHistogram(buckets)
}
