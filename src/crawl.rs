use crate::aggregate::analyze;
use crate::cache::Cache;
use crate::cli::{ApiArgs, CommonArgs, CrawlArgs};
use crate::config::{ClientConfig, CrawlConfig};
use crate::error::{NewcomersError, Result};
use crate::github::{collect, reconcile_labels, GithubClient, RepositorySource};
use crate::labels::LabelCatalog;
use crate::model::{SampleRepository, ScriptExecution};
use crate::store::{load_samples, Store};
use anyhow::Context;
use chrono::Utc;
use console::style;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CrawlSummary {
    pub crawled: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Set when the API quota ran out; holds the reset time.
    pub rate_limited: Option<String>,
}

impl CrawlSummary {
    fn absorb(&mut self, other: CrawlSummary) {
        self.crawled += other.crawled;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.rate_limited = self.rate_limited.take().or(other.rate_limited);
    }
}

pub fn exec(common: &CommonArgs, args: &CrawlArgs) -> anyhow::Result<()> {
    let config = CrawlConfig::from_args(common, args).context("Invalid crawl configuration")?;
    let catalog = LabelCatalog::load(&config.labels_path).with_context(|| {
        format!("Failed to load newcomer labels from {}", config.labels_path.display())
    })?;
    let client = GithubClient::new(&config.client).context("Failed to build GitHub client")?;
    let mut cache = Cache::new(config.cache_path.as_deref(), &config.output_dir)
        .context("Failed to initialize cache")?;
    let store = Store::new(&config.output_dir);

    if config.client.token.is_none() {
        eprintln!(
            "{} no GitHub token given, unauthenticated requests are heavily rate limited",
            style("warning:").yellow()
        );
    }

    let mut summary = CrawlSummary::default();
    for language in &config.languages {
        let samples_path = config.samples_dir.join(format!("{language}.json"));
        let samples = load_samples(&samples_path)
            .with_context(|| format!("Failed to read sample {}", samples_path.display()))?;
        info!(language = %language, repositories = samples.len(), "started language");

        summary.absorb(crawl_samples(
            &client,
            &mut cache,
            &store,
            &catalog,
            language,
            &samples,
            config.refresh,
        ));
        if let Some(reset) = &summary.rate_limited {
            print_summary(&summary);
            anyhow::bail!("GitHub rate limit exhausted, resets at {reset}");
        }
    }

    print_summary(&summary);
    Ok(())
}

/// Crawl every sample of one language. A failing repository is reported and
/// skipped; an exhausted rate limit stops the run.
pub fn crawl_samples<S>(
    source: &S,
    cache: &mut Cache,
    store: &Store,
    catalog: &LabelCatalog,
    language: &str,
    samples: &[SampleRepository],
    refresh: bool,
) -> CrawlSummary
where
    S: RepositorySource + ?Sized,
{
    let mut summary = CrawlSummary::default();
    for sample in samples {
        if store.contains(language, &sample.owner, &sample.name) {
            debug!(repository = %sample.full_name(), "already crawled");
            summary.skipped += 1;
            continue;
        }

        match crawl_repository(source, cache, store, catalog, language, sample, refresh) {
            Ok(path) => {
                summary.crawled += 1;
                println!("{} {} → {}", style("✓").green(), sample.full_name(), path.display());
            }
            Err(NewcomersError::RateLimited { reset }) => {
                warn!(repository = %sample.full_name(), %reset, "rate limit exhausted, stopping");
                summary.rate_limited = Some(reset);
                break;
            }
            Err(e) => {
                summary.failed += 1;
                error!(repository = %sample.full_name(), error = %e, "repository abandoned");
                println!("{} {}: {}", style("✗").red(), sample.full_name(), e);
            }
        }
    }
    summary
}

/// Fetch (or reuse cached data for), analyse and save one repository.
pub fn crawl_repository<S>(
    source: &S,
    cache: &mut Cache,
    store: &Store,
    catalog: &LabelCatalog,
    language: &str,
    sample: &SampleRepository,
    refresh: bool,
) -> Result<PathBuf>
where
    S: RepositorySource + ?Sized,
{
    let started_at = Utc::now();
    let full_name = sample.full_name();

    let cached = if refresh { None } else { cache.get_snapshot(&full_name)? };
    let input = match cached {
        Some(mut input) => {
            debug!(repository = %full_name, fetched_at = ?cache.fetched_at(&full_name)?, "using cached history");
            if reconcile_labels(source, &mut input, catalog)? {
                cache.store_snapshot(&input, Utc::now())?;
            }
            input
        }
        None => {
            let input = collect(source, sample, catalog)?;
            cache.store_snapshot(&input, Utc::now())?;
            input
        }
    };

    let mut analysis = analyze(&input, started_at)?;
    analysis.record.execution = Some(ScriptExecution {
        started_at,
        finished_at: Utc::now(),
    });
    store.save(language, &analysis.record)
}

fn print_summary(summary: &CrawlSummary) {
    println!(
        "\n{} crawled, {} skipped, {} failed",
        style(summary.crawled).green(),
        style(summary.skipped).dim(),
        style(summary.failed).red()
    );
}

pub fn limit(api: &ApiArgs) -> anyhow::Result<()> {
    let config = ClientConfig::from_api_args(api)?;
    let client = GithubClient::new(&config)?;
    let status = client.rate_limit().context("Failed to query rate limit")?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
