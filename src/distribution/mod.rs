//! Weekly first-contribution histograms.
//!
//! The pipeline is `build` (sparse fold) → `fill` (dense, gap-free) →
//! `segment` (before / after the newcomer label adoption week). Each step
//! returns a new value and never touches its input.

pub mod build;
pub mod fill;
pub mod segment;

pub use build::build;
pub use fill::fill;
pub use segment::{segment, Segmentation, SideSummary};

use crate::calendar::{key_of, WeekKey};
use crate::error::NewcomersError;
use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One week of first contributions. The count is always the number of dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BucketRepr", into = "BucketRepr")]
pub struct WeeklyBucket {
    week: WeekKey,
    dates: Vec<DateTime<Utc>>,
}

impl WeeklyBucket {
    pub fn empty(week: WeekKey) -> Self {
        Self {
            week,
            dates: Vec::new(),
        }
    }

    pub fn week(&self) -> WeekKey {
        self.week
    }

    pub fn dates(&self) -> &[DateTime<Utc>] {
        &self.dates
    }

    pub fn total(&self) -> usize {
        self.dates.len()
    }

    fn push(&mut self, timestamp: DateTime<Utc>) {
        self.dates.push(timestamp);
    }
}

#[derive(Serialize, Deserialize)]
struct BucketRepr {
    week: WeekKey,
    dates: Vec<DateTime<Utc>>,
    total: usize,
}

impl TryFrom<BucketRepr> for WeeklyBucket {
    type Error = NewcomersError;

    fn try_from(repr: BucketRepr) -> Result<Self, Self::Error> {
        if repr.total != repr.dates.len() {
            return Err(NewcomersError::InvalidBucket(format!(
                "week {} has total {} but {} dates",
                repr.week,
                repr.total,
                repr.dates.len()
            )));
        }
        if let Some(stray) = repr.dates.iter().find(|d| key_of(d) != repr.week) {
            return Err(NewcomersError::InvalidBucket(format!(
                "date {stray} does not fall in week {}",
                repr.week
            )));
        }
        Ok(Self {
            week: repr.week,
            dates: repr.dates,
        })
    }
}

impl From<WeeklyBucket> for BucketRepr {
    fn from(bucket: WeeklyBucket) -> Self {
        Self {
            total: bucket.total(),
            week: bucket.week,
            dates: bucket.dates,
        }
    }
}

/// Weeks that saw at least one event, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SparseHistogram {
    buckets: Vec<WeeklyBucket>,
    index: HashMap<WeekKey, usize>,
}

impl SparseHistogram {
    pub fn buckets(&self) -> &[WeeklyBucket] {
        &self.buckets
    }

    pub fn get(&self, week: &WeekKey) -> Option<&WeeklyBucket> {
        self.index.get(week).map(|&i| &self.buckets[i])
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn total_events(&self) -> usize {
        self.buckets.iter().map(WeeklyBucket::total).sum()
    }

    fn record(&mut self, timestamp: DateTime<Utc>) {
        let week = key_of(&timestamp);
        let slot = match self.index.get(&week) {
            Some(&i) => i,
            None => {
                self.buckets.push(WeeklyBucket::empty(week));
                self.index.insert(week, self.buckets.len() - 1);
                self.buckets.len() - 1
            }
        };
        self.buckets[slot].push(timestamp);
    }

    fn insert_bucket(&mut self, bucket: WeeklyBucket) {
        match self.index.get(&bucket.week) {
            Some(&i) => self.buckets[i].dates.extend(bucket.dates),
            None => {
                self.index.insert(bucket.week, self.buckets.len());
                self.buckets.push(bucket);
            }
        }
    }
}

/// Weekly buckets in strictly ascending week order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<WeeklyBucket>", into = "Vec<WeeklyBucket>")]
pub struct WeeklyHistogram(Vec<WeeklyBucket>);

impl WeeklyHistogram {
    pub fn buckets(&self) -> &[WeeklyBucket] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn counts(&self) -> Vec<usize> {
        self.0.iter().map(WeeklyBucket::total).collect()
    }

    pub fn total_events(&self) -> usize {
        self.0.iter().map(WeeklyBucket::total).sum()
    }

    pub fn position(&self, week: &WeekKey) -> Option<usize> {
        self.0.binary_search_by_key(week, WeeklyBucket::week).ok()
    }

    /// Copy of this histogram holding a bucket for `week`, inserting an empty
    /// one at its ordered position when missing.
    pub fn with_week(&self, week: WeekKey) -> WeeklyHistogram {
        match self.0.binary_search_by_key(&week, WeeklyBucket::week) {
            Ok(_) => self.clone(),
            Err(at) => {
                let mut buckets = self.0.clone();
                buckets.insert(at, WeeklyBucket::empty(week));
                WeeklyHistogram(buckets)
            }
        }
    }

    pub fn to_sparse(&self) -> SparseHistogram {
        let mut sparse = SparseHistogram::default();
        for bucket in &self.0 {
            sparse.insert_bucket(bucket.clone());
        }
        sparse
    }

    /// Drops the buckets of the first `months` months after the first week.
    pub fn without_warmup(&self, months: u32) -> WeeklyHistogram {
        let Some(first) = self.0.first() else {
            return WeeklyHistogram::default();
        };
        let Some(cutoff) = first.week.monday().checked_add_months(Months::new(months)) else {
            return WeeklyHistogram::default();
        };
        let cutoff = WeekKey::from_date(cutoff);
        WeeklyHistogram(self.0.iter().filter(|b| b.week >= cutoff).cloned().collect())
    }
}

impl TryFrom<Vec<WeeklyBucket>> for WeeklyHistogram {
    type Error = NewcomersError;

    fn try_from(buckets: Vec<WeeklyBucket>) -> Result<Self, Self::Error> {
        if let Some(pair) = buckets.windows(2).find(|w| w[0].week >= w[1].week) {
            return Err(NewcomersError::InvalidBucket(format!(
                "week {} listed after week {}",
                pair[1].week, pair[0].week
            )));
        }
        Ok(Self(buckets))
    }
}

impl From<WeeklyHistogram> for Vec<WeeklyBucket> {
    fn from(histogram: WeeklyHistogram) -> Self {
        histogram.0
    }
}
