//! Subsets of the REST payloads that are read.

use crate::model::RepositoryInfo;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RepoPayload {
    pub id: i64,
    pub full_name: String,
    pub created_at: String,
    pub language: Option<String>,
    pub stargazers_count: u64,
    pub watchers_count: u64,
    pub forks_count: u64,
    #[serde(default)]
    pub subscribers_count: u64,
    pub open_issues_count: u64,
}

impl From<RepoPayload> for RepositoryInfo {
    fn from(repo: RepoPayload) -> Self {
        Self {
            id: repo.id,
            full_name: repo.full_name,
            created_at: repo.created_at,
            language: repo.language,
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            watchers: repo.watchers_count,
            subscribers: repo.subscribers_count,
            open_issues: repo.open_issues_count,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UserPayload {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct PullPayload {
    pub number: u64,
    pub created_at: String,
    pub user: Option<UserPayload>,
}

#[derive(Debug, Deserialize)]
pub struct LabelPayload {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct IssuePayload {
    pub created_at: String,
}
