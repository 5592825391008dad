//! Ingestion from the GitHub REST API.

pub mod client;
pub mod wire;

pub use client::{next_page_link, GithubClient};

use crate::calendar::parse_timestamp;
use crate::error::Result;
use crate::labels::{sorted_adoptions, LabelCatalog};
use crate::model::{AnalysisInput, ContributionEvent, LabelAdoption, RepositoryInfo, SampleRepository};
use std::collections::HashSet;
use tracing::{debug, info};

/// A pull request as listed by the API, timestamp still unparsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullSummary {
    pub number: u64,
    pub login: Option<String>,
    pub created_at: String,
}

/// Where repository history comes from.
pub trait RepositorySource {
    fn repository(&self, owner: &str, name: &str) -> Result<RepositoryInfo>;

    /// All pull requests, oldest first.
    fn pull_requests(&self, owner: &str, name: &str) -> Result<Vec<PullSummary>>;

    fn labels(&self, owner: &str, name: &str) -> Result<Vec<String>>;

    /// Creation time of the oldest issue or pull request carrying `label`.
    fn first_label_use(&self, owner: &str, name: &str, label: &str) -> Result<Option<String>>;
}

/// Keep the first pull request of every author, in listing order.
pub fn first_contributions(pulls: &[PullSummary]) -> Result<Vec<ContributionEvent>> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut contributions = Vec::new();

    for pull in pulls {
        let Some(login) = pull.login.as_deref() else {
            debug!(number = pull.number, "pull request without author skipped");
            continue;
        };
        if !seen.insert(login) {
            continue;
        }
        contributions.push(ContributionEvent {
            login: login.to_string(),
            created_at: parse_timestamp(&pull.created_at)?,
            issue_number: Some(pull.number),
        });
    }

    Ok(contributions)
}

/// Fetch everything the analysis needs for one repository.
pub fn collect<S>(source: &S, sample: &SampleRepository, catalog: &LabelCatalog) -> Result<AnalysisInput>
where
    S: RepositorySource + ?Sized,
{
    let (owner, name) = (sample.owner.as_str(), sample.name.as_str());
    info!(repository = %sample.full_name(), "collecting repository history");

    let info = source.repository(owner, name)?;

    let pulls = source.pull_requests(owner, name)?;
    let contributions = first_contributions(&pulls)?;
    debug!(pulls = pulls.len(), contributors = contributions.len(), "first contributions collected");

    let labels = source.labels(owner, name)?;
    let newcomer_labels = adoptions(source, owner, name, catalog.matching(&labels))?;
    info!(
        repository = %sample.full_name(),
        labels = labels.len(),
        newcomer_labels = newcomer_labels.len(),
        "labels collected"
    );

    Ok(AnalysisInput {
        sample: sample.clone(),
        info,
        contributions,
        labels,
        newcomer_labels: sorted_adoptions(&newcomer_labels),
    })
}

/// Bring the newcomer labels of a previously collected input in line with
/// `catalog`: adoptions of labels the catalog no longer knows are dropped and
/// labels it newly matches are looked up. Returns whether anything changed.
pub fn reconcile_labels<S>(source: &S, input: &mut AnalysisInput, catalog: &LabelCatalog) -> Result<bool>
where
    S: RepositorySource + ?Sized,
{
    let before = input.newcomer_labels.len();
    input.newcomer_labels.retain(|adoption| catalog.contains(&adoption.name));
    let dropped = before - input.newcomer_labels.len();

    let known: HashSet<&str> = input.newcomer_labels.iter().map(|a| a.name.as_str()).collect();
    let missing: Vec<&str> = catalog
        .matching(&input.labels)
        .into_iter()
        .filter(|label| !known.contains(label))
        .collect();
    let found = adoptions(source, &input.sample.owner, &input.sample.name, missing)?;
    let added = found.len();

    if dropped > 0 || added > 0 {
        debug!(repository = %input.sample.full_name(), dropped, added, "newcomer labels reconciled with catalog");
        input.newcomer_labels.extend(found);
        input.newcomer_labels = sorted_adoptions(&input.newcomer_labels);
    }
    Ok(dropped > 0 || added > 0)
}

// First use of every label that has been used at all.
fn adoptions<S>(source: &S, owner: &str, name: &str, labels: Vec<&str>) -> Result<Vec<LabelAdoption>>
where
    S: RepositorySource + ?Sized,
{
    let mut found = Vec::new();
    for label in labels {
        match source.first_label_use(owner, name, label)? {
            Some(raw) => found.push(LabelAdoption {
                name: label.to_string(),
                created_at: parse_timestamp(&raw)?,
            }),
            None => debug!(label, "newcomer label never used"),
        }
    }
    Ok(found)
}
