use crate::distribution::WeeklyHistogram;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

/// One entry of a language sample file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRepository {
    pub owner: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nameconcat: Option<String>,
}

impl SampleRepository {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Repository metadata as reported by the hosting platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub id: i64,
    pub full_name: String,
    /// Kept as received; parsed when the analysis runs.
    pub created_at: String,
    pub language: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub watchers: u64,
    pub subscribers: u64,
    pub open_issues: u64,
}

/// First pull request of a distinct author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionEvent {
    pub login: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_number: Option<u64>,
}

/// First recorded use of a newcomer label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelAdoption {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Everything fetched for one repository before analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisInput {
    pub sample: SampleRepository,
    pub info: RepositoryInfo,
    pub contributions: Vec<ContributionEvent>,
    pub labels: Vec<String>,
    pub newcomer_labels: Vec<LabelAdoption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptExecution {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Persisted per-repository result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<ScriptExecution>,
    pub id: i64,
    pub owner: String,
    pub name: String,
    pub url: Option<String>,
    pub language: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub subscribers: u64,
    pub watchers: u64,
    pub open_issues: u64,
    pub created_at: String,
    pub nameconcat: String,
    pub labels: Vec<String>,
    pub newcomer_labels: Vec<LabelAdoption>,
    pub has_newcomer_labels: bool,
    pub first_contributions: Vec<ContributionEvent>,
    pub weekly_distribution: WeeklyHistogram,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly_distribution_before: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly_distribution_after: Option<Vec<usize>>,
}

impl RepositoryRecord {
    /// Recover the raw inputs a record was computed from.
    pub fn to_input(&self) -> AnalysisInput {
        AnalysisInput {
            sample: SampleRepository {
                owner: self.owner.clone(),
                name: self.name.clone(),
                url: self.url.clone(),
                language: self.language.clone(),
                nameconcat: Some(self.nameconcat.clone()),
            },
            info: RepositoryInfo {
                id: self.id,
                full_name: format!("{}/{}", self.owner, self.name),
                created_at: self.created_at.clone(),
                language: self.language.clone(),
                stars: self.stars,
                forks: self.forks,
                watchers: self.watchers,
                subscribers: self.subscribers,
                open_issues: self.open_issues,
            },
            contributions: self.first_contributions.clone(),
            labels: self.labels.clone(),
            newcomer_labels: self.newcomer_labels.clone(),
        }
    }
}
