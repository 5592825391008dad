use crate::calendar::parse_timestamp;
use crate::distribution::{build, fill, segment, Segmentation};
use crate::error::Result;
use crate::labels::{earliest_adoption, sorted_adoptions};
use crate::model::{AnalysisInput, RepositoryRecord, SCHEMA_VERSION};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Result of analysing one repository.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub record: RepositoryRecord,
    pub segmentation: Option<Segmentation>,
}

/// Bucket first contributions per week from creation up to `now` and split the
/// series at the earliest newcomer label adoption, if any.
pub fn analyze(input: &AnalysisInput, now: DateTime<Utc>) -> Result<Analysis> {
    let created_at = parse_timestamp(&input.info.created_at)?;

    let sparse = build(&input.contributions);
    debug!(
        repository = %input.info.full_name,
        weeks = sparse.len(),
        events = sparse.total_events(),
        "built sparse distribution"
    );

    let dense = fill(&sparse, created_at, now);
    let newcomer_labels = sorted_adoptions(&input.newcomer_labels);
    let segmentation = segment(&dense, earliest_adoption(&newcomer_labels));

    info!(
        repository = %input.info.full_name,
        weeks = dense.len(),
        contributors = input.contributions.len(),
        adoption_week = segmentation.as_ref().map(|s| s.adoption_week.to_string()),
        "analysis complete"
    );

    let sample = &input.sample;
    let record = RepositoryRecord {
        version: SCHEMA_VERSION,
        execution: None,
        id: input.info.id,
        owner: sample.owner.clone(),
        name: sample.name.clone(),
        url: sample.url.clone(),
        language: sample.language.clone().or_else(|| input.info.language.clone()),
        stars: input.info.stars,
        forks: input.info.forks,
        subscribers: input.info.subscribers,
        watchers: input.info.watchers,
        open_issues: input.info.open_issues,
        created_at: input.info.created_at.clone(),
        nameconcat: sample.nameconcat.clone().unwrap_or_else(|| sample.full_name()),
        labels: input.labels.clone(),
        has_newcomer_labels: !newcomer_labels.is_empty(),
        newcomer_labels,
        first_contributions: input.contributions.clone(),
        weekly_distribution: dense,
        weekly_distribution_before: segmentation.as_ref().map(|s| s.before.clone()),
        weekly_distribution_after: segmentation.as_ref().map(|s| s.after.clone()),
    };

    Ok(Analysis {
        record,
        segmentation,
    })
}

/// Recompute a stored record from its own raw fields against a new `now`.
pub fn resegment(record: &RepositoryRecord, now: DateTime<Utc>) -> Result<Analysis> {
    let mut analysis = analyze(&record.to_input(), now)?;
    analysis.record.execution = record.execution.clone();
    Ok(analysis)
}
