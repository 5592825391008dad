use super::wire::{IssuePayload, LabelPayload, PullPayload, RepoPayload};
use super::{PullSummary, RepositorySource};
use crate::config::ClientConfig;
use crate::error::{NewcomersError, Result};
use crate::model::RepositoryInfo;
use chrono::DateTime;
use indicatif::{ProgressBar, ProgressStyle};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use ureq::{Agent, AgentBuilder, Request, Response};

const USER_AGENT: &str = concat!("newcomers/", env!("CARGO_PKG_VERSION"));

/// Blocking GitHub REST client. Requests are issued one at a time.
pub struct GithubClient {
    agent: Agent,
    base_url: String,
    token: Option<String>,
    per_page: u32,
    pause: Duration,
    progress: bool,
}

impl GithubClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let agent = AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build();
        Ok(Self {
            agent,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
            per_page: config.per_page,
            pause: config.pause,
            progress: config.progress,
        })
    }

    fn request(&self, url: &str) -> Request {
        let request = self
            .agent
            .get(url)
            .set("Accept", "application/vnd.github+json")
            .set("X-GitHub-Api-Version", "2022-11-28");
        match &self.token {
            Some(token) => request.set("Authorization", &format!("Bearer {token}")),
            None => request,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn call(&self, request: Request) -> Result<Response> {
        match request.call() {
            Ok(response) => Ok(response),
            Err(ureq::Error::Status(status, response))
                if (status == 403 || status == 429)
                    && response.header("x-ratelimit-remaining") == Some("0") =>
            {
                Err(NewcomersError::RateLimited {
                    reset: reset_time(response.header("x-ratelimit-reset")),
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    fn paginate<T: DeserializeOwned>(&self, first: Request, what: &str) -> Result<Vec<T>> {
        let pb = if self.progress {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );

        let mut items = Vec::new();
        let mut page = 0u32;
        let mut request = Some(first);

        while let Some(current) = request.take() {
            let response = self.call(current)?;
            let next = response.header("link").and_then(next_page_link);
            let batch: Vec<T> = response.into_json()?;

            page += 1;
            debug!(what, page, items = batch.len(), "fetched page");
            items.extend(batch);
            pb.set_message(format!("Fetching {what}: page {page}, {} items", items.len()));
            pb.tick();

            if let Some(url) = next {
                if !self.pause.is_zero() {
                    std::thread::sleep(self.pause);
                }
                request = Some(self.request(&url));
            }
        }

        pb.finish_and_clear();
        Ok(items)
    }

    /// Raw `/rate_limit` document.
    pub fn rate_limit(&self) -> Result<serde_json::Value> {
        let response = self.call(self.request(&self.endpoint("/rate_limit")))?;
        Ok(response.into_json()?)
    }
}

impl RepositorySource for GithubClient {
    fn repository(&self, owner: &str, name: &str) -> Result<RepositoryInfo> {
        let url = self.endpoint(&format!("/repos/{owner}/{name}"));
        let payload: RepoPayload = self.call(self.request(&url))?.into_json()?;
        Ok(payload.into())
    }

    fn pull_requests(&self, owner: &str, name: &str) -> Result<Vec<PullSummary>> {
        let url = self.endpoint(&format!("/repos/{owner}/{name}/pulls"));
        let request = self
            .request(&url)
            .query("state", "all")
            .query("sort", "created")
            .query("direction", "asc")
            .query("per_page", &self.per_page.to_string());
        let pulls: Vec<PullPayload> = self.paginate(request, &format!("pull requests of {owner}/{name}"))?;
        Ok(pulls
            .into_iter()
            .map(|pull| PullSummary {
                number: pull.number,
                login: pull.user.map(|u| u.login),
                created_at: pull.created_at,
            })
            .collect())
    }

    fn labels(&self, owner: &str, name: &str) -> Result<Vec<String>> {
        let url = self.endpoint(&format!("/repos/{owner}/{name}/labels"));
        let request = self.request(&url).query("per_page", &self.per_page.to_string());
        let labels: Vec<LabelPayload> = self.paginate(request, &format!("labels of {owner}/{name}"))?;
        Ok(labels.into_iter().map(|l| l.name).collect())
    }

    fn first_label_use(&self, owner: &str, name: &str, label: &str) -> Result<Option<String>> {
        let url = self.endpoint(&format!("/repos/{owner}/{name}/issues"));
        let request = self
            .request(&url)
            .query("state", "all")
            .query("sort", "created")
            .query("direction", "asc")
            .query("labels", label)
            .query("per_page", "1");
        let issues: Vec<IssuePayload> = self.call(request)?.into_json()?;
        Ok(issues.into_iter().next().map(|i| i.created_at))
    }
}

/// URL of the `rel="next"` entry of a `Link` header.
pub fn next_page_link(header: &str) -> Option<String> {
    header.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        if !parts.any(|p| p.trim() == r#"rel="next""#) {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}

fn reset_time(header: Option<&str>) -> String {
    header
        .and_then(|raw| raw.parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| "an unknown time".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_link_is_found_among_relations() {
        let header = r#"<https://api.github.com/repositories/1/pulls?page=1>; rel="prev", <https://api.github.com/repositories/1/pulls?page=3>; rel="next", <https://api.github.com/repositories/1/pulls?page=9>; rel="last""#;
        assert_eq!(
            next_page_link(header).as_deref(),
            Some("https://api.github.com/repositories/1/pulls?page=3")
        );
    }

    #[test]
    fn last_page_has_no_next_link() {
        let header = r#"<https://api.github.com/repositories/1/pulls?page=1>; rel="first", <https://api.github.com/repositories/1/pulls?page=2>; rel="prev""#;
        assert_eq!(next_page_link(header), None);
    }

    #[test]
    fn reset_header_is_rendered_as_rfc3339() {
        assert_eq!(reset_time(Some("0")), "1970-01-01T00:00:00+00:00");
        assert_eq!(reset_time(Some("soon")), "an unknown time");
        assert_eq!(reset_time(None), "an unknown time");
    }
}
