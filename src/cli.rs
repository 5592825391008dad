use crate::config::GITHUB_API;
use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "newcomers")]
#[command(about = "Weekly first-time contributors around newcomer label adoption")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(long, help = "Directory holding per-language repository records", default_value = "resources/output")]
    pub output: PathBuf,

    #[arg(long, help = "Path to cache database")]
    pub cache: Option<PathBuf>,

    #[arg(short, long, action = ArgAction::Count, help = "Increase log verbosity (-v info, -vv debug)")]
    pub verbose: u8,

    #[arg(long, help = "Write logs as JSON")]
    pub log_json: bool,
}

#[derive(Args, Clone)]
pub struct ApiArgs {
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, help = "GitHub API token")]
    pub token: Option<String>,

    #[arg(long, env = "GITHUB_API_URL", default_value = GITHUB_API, help = "GitHub REST API base URL")]
    pub api_url: String,
}

#[derive(Args, Clone)]
pub struct CrawlArgs {
    #[arg(long, help = "Directory of <language>.json sample files", default_value = "resources/input/repositories-by-language")]
    pub samples: PathBuf,

    #[arg(long, help = "Newcomer label catalog (JSON array of names)", default_value = "resources/input/labels/all-labels.json")]
    pub labels: PathBuf,

    #[arg(long, help = "Comma separated languages to crawl (default: all sampled languages)")]
    pub languages: Option<String>,

    #[arg(long, help = "Items per API page", default_value_t = 100)]
    pub per_page: u32,

    #[arg(long, help = "Pause between page requests (e.g. 250ms, 2s)", default_value = "0s", value_parser = humantime::parse_duration)]
    pub pause: Duration,

    #[arg(long, help = "Ignore cached API data and fetch again")]
    pub refresh: bool,

    #[arg(long, help = "Hide progress spinners")]
    pub no_progress: bool,

    #[clap(flatten)]
    pub api: ApiArgs,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Crawl sampled repositories and store one record per repository
    Crawl(CrawlArgs),
    /// Recompute a stored record against the current time
    Analyze {
        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, help = "Output weekly buckets as NDJSON")]
        ndjson: bool,

        #[arg(long, help = "Save the recomputed record under this language")]
        write: Option<String>,

        #[arg(help = "Stored repository record")]
        record: PathBuf,
    },
    /// Render the weekly distribution of a stored record
    Show {
        #[arg(long, help = "Hide the first N months of the distribution")]
        skip_months: Option<u32>,

        #[arg(help = "Stored repository record")]
        record: PathBuf,
    },
    /// Report stored records whose newcomer labels are help-wanted variations
    Labels {
        #[arg(long, help = "Comma separated languages (default: all sampled languages)")]
        languages: Option<String>,

        #[arg(long, help = "Drop help-wanted labels, re-segment and save")]
        strip_help_wanted: bool,
    },
    /// Compare weekly first contributions before and after label adoption
    Stats {
        #[arg(long, help = "Comma separated languages (default: all sampled languages)")]
        languages: Option<String>,

        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, help = "Significance level of the Mann-Whitney test", default_value_t = crate::stats::SIGNIFICANCE_LEVEL)]
        alpha: f64,
    },
    /// Show the API rate limit status
    Limit {
        #[clap(flatten)]
        api: ApiArgs,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        crate::logging::init(self.common.verbose, self.common.log_json)?;

        match self.command {
            Commands::Crawl(args) => crate::crawl::exec(&self.common, &args),
            Commands::Analyze { json, ndjson, write, record } => {
                crate::analyze::exec(&self.common, &record, json, ndjson, write.as_deref())
            }
            Commands::Show { skip_months, record } => crate::analyze::show(&record, skip_months),
            Commands::Labels { languages, strip_help_wanted } => {
                crate::help_wanted::exec(&self.common, languages.as_deref(), strip_help_wanted)
            }
            Commands::Stats { languages, json, alpha } => {
                crate::stats::exec(&self.common, languages.as_deref(), json, alpha)
            }
            Commands::Limit { api } => crate::crawl::limit(&api),
        }
    }
}
