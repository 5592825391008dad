use crate::cli::{ApiArgs, CommonArgs, CrawlArgs};
use crate::error::{NewcomersError, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const GITHUB_API: &str = "https://api.github.com";

pub const DEFAULT_LANGUAGES: [&str; 10] = [
    "c",
    "cplusplus",
    "csharp",
    "go",
    "java",
    "javascript",
    "php",
    "python",
    "ruby",
    "typescript",
];

const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub per_page: u32,
    pub pause: Duration,
    pub timeout: Duration,
    pub progress: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: GITHUB_API.to_string(),
            token: None,
            per_page: MAX_PER_PAGE,
            pause: Duration::ZERO,
            timeout: Duration::from_secs(30),
            progress: false,
        }
    }
}

impl ClientConfig {
    pub fn from_api_args(api: &ApiArgs) -> Result<Self> {
        let config = Self {
            base_url: api.api_url.trim_end_matches('/').to_string(),
            token: api.token.clone().filter(|t| !t.trim().is_empty()),
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            return Err(NewcomersError::Config(format!(
                "per-page must be between 1 and {MAX_PER_PAGE}, got {}",
                self.per_page
            )));
        }
        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            return Err(NewcomersError::Config(format!(
                "API URL must be http(s), got '{}'",
                self.base_url
            )));
        }
        Ok(())
    }
}

/// Settings for one `crawl` run, resolved from the command line.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub client: ClientConfig,
    pub samples_dir: PathBuf,
    pub labels_path: PathBuf,
    pub languages: Vec<String>,
    pub output_dir: PathBuf,
    pub cache_path: Option<PathBuf>,
    pub refresh: bool,
}

impl CrawlConfig {
    pub fn from_args(common: &CommonArgs, args: &CrawlArgs) -> Result<Self> {
        let client = ClientConfig {
            per_page: args.per_page,
            pause: args.pause,
            progress: !args.no_progress,
            ..ClientConfig::from_api_args(&args.api)?
        };
        client.validate()?;

        Ok(Self {
            client,
            samples_dir: args.samples.clone(),
            labels_path: args.labels.clone(),
            languages: parse_languages(args.languages.as_deref())?,
            output_dir: common.output.clone(),
            cache_path: common.cache.clone(),
            refresh: args.refresh,
        })
    }
}

/// Comma separated language list, or every sampled language when absent.
pub fn parse_languages(raw: Option<&str>) -> Result<Vec<String>> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_LANGUAGES.iter().map(|l| l.to_string()).collect());
    };
    let languages: Vec<String> = raw
        .split(',')
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty())
        .collect();
    if languages.is_empty() {
        return Err(NewcomersError::Config("language list is empty".to_string()));
    }
    if let Some(bad) = languages.iter().find(|l| l.contains(['/', '\\']) || l.starts_with('.')) {
        return Err(NewcomersError::Config(format!("invalid language '{bad}'")));
    }
    Ok(languages)
}
