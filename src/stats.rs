//! Before/after statistics over stored repository records.
//!
//! Weekly first-contribution counts after the newcomer label adoption are the
//! treatment, the weeks before it the control. Pairs are compared with
//! Cliff's delta and a two-sided Mann-Whitney U test.

use crate::calendar::parse_timestamp;
use crate::cli::CommonArgs;
use crate::config::parse_languages;
use crate::error::Result;
use crate::labels::earliest_adoption;
use crate::model::RepositoryRecord;
use crate::store::Store;
use anyhow::Context;
use console::style;
use serde::Serialize;
use statrs::function::erf::erfc;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// A label first used this many days after creation or sooner leaves too
/// little history before it to compare against.
pub const EARLY_ADOPTION_DAYS: i64 = 180;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub size: usize,
    pub min: usize,
    pub median: f64,
    pub mean: f64,
    pub max: usize,
    /// Sample standard deviation; zero below two values.
    pub std_dev: f64,
}

impl Summary {
    pub fn of(values: &[usize]) -> Option<Self> {
        let mut sorted = values.to_vec();
        sorted.sort_unstable();
        let (&min, &max) = (sorted.first()?, sorted.last()?);

        let n = sorted.len();
        let median = if n % 2 == 1 {
            sorted[n / 2] as f64
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) as f64 / 2.0
        };
        let mean = sorted.iter().sum::<usize>() as f64 / n as f64;
        let std_dev = if n < 2 {
            0.0
        } else {
            let squares: f64 = sorted.iter().map(|&v| (v as f64 - mean).powi(2)).sum();
            (squares / (n - 1) as f64).sqrt()
        };

        Some(Self {
            size: n,
            min,
            median,
            mean,
            max,
            std_dev,
        })
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Min={};Median={:.3};Mean={:.3};Max={};std_dev={:.3}",
            self.min, self.median, self.mean, self.max, self.std_dev
        )
    }
}

/// Magnitude bands of Cliff's delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectSize {
    Negligible,
    Small,
    Medium,
    Large,
}

impl EffectSize {
    pub fn of(delta: f64) -> Self {
        match delta.abs() {
            d if d < 0.147 => EffectSize::Negligible,
            d if d < 0.33 => EffectSize::Small,
            d if d < 0.474 => EffectSize::Medium,
            _ => EffectSize::Large,
        }
    }
}

impl fmt::Display for EffectSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EffectSize::Negligible => "negligible",
            EffectSize::Small => "small",
            EffectSize::Medium => "medium",
            EffectSize::Large => "large",
        };
        f.pad(name)
    }
}

/// Share of (treatment, control) pairs where treatment is larger minus the
/// share where it is smaller. `None` when either side is empty.
pub fn cliffs_delta(treatment: &[usize], control: &[usize]) -> Option<f64> {
    if treatment.is_empty() || control.is_empty() {
        return None;
    }
    let dominance: i64 = treatment
        .iter()
        .flat_map(|x| control.iter().map(move |y| x.cmp(y) as i64))
        .sum();
    Some(dominance as f64 / (treatment.len() * control.len()) as f64)
}

/// Two-sided Mann-Whitney U p-value using the normal approximation with tie
/// and continuity correction. `None` when either side is empty.
pub fn mann_whitney_p(x: &[usize], y: &[usize]) -> Option<f64> {
    if x.is_empty() || y.is_empty() {
        return None;
    }
    let (nx, ny) = (x.len() as f64, y.len() as f64);

    let mut pooled: Vec<(usize, bool)> = x
        .iter()
        .map(|&v| (v, true))
        .chain(y.iter().map(|&v| (v, false)))
        .collect();
    pooled.sort_unstable_by_key(|&(v, _)| v);

    let mut rank_sum_x = 0.0;
    let mut tie_term = 0.0;
    let mut start = 0;
    while start < pooled.len() {
        let end = start + pooled[start..].iter().take_while(|(v, _)| *v == pooled[start].0).count();
        let ties = (end - start) as f64;
        // Ranks start..end (1-based start+1..=end) share their average.
        let rank = (start + 1 + end) as f64 / 2.0;
        rank_sum_x += rank * pooled[start..end].iter().filter(|(_, from_x)| *from_x).count() as f64;
        tie_term += ties.powi(3) - ties;
        start = end;
    }

    let u = rank_sum_x - nx * (nx + 1.0) / 2.0;
    let n = nx + ny;
    let sigma = ((nx * ny / 12.0) * ((n + 1.0) - tie_term / (n * (n - 1.0)))).sqrt();
    if sigma.is_nan() || sigma <= 0.0 {
        return Some(1.0);
    }

    let centred = u - nx * ny / 2.0;
    let correction = if centred > 0.0 {
        0.5
    } else if centred < 0.0 {
        -0.5
    } else {
        0.0
    };
    let z = (centred - correction) / sigma;
    Some((2.0 * standard_normal_cdf(-z.abs())).min(1.0))
}

fn standard_normal_cdf(z: f64) -> f64 {
    0.5 * erfc(-z / std::f64::consts::SQRT_2)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Comparison {
    pub delta: f64,
    pub effect_size: EffectSize,
    pub p_value: f64,
    /// The test found no difference at the chosen significance level.
    pub identical: bool,
}

pub fn compare(treatment: &[usize], control: &[usize], alpha: f64) -> Option<Comparison> {
    let delta = cliffs_delta(treatment, control)?;
    let p_value = mann_whitney_p(treatment, control)?;
    Some(Comparison {
        delta,
        effect_size: EffectSize::of(delta),
        p_value,
        identical: p_value >= alpha,
    })
}

/// Both sides of the split hold at least one week.
pub fn enough_data_to_split(record: &RepositoryRecord) -> bool {
    record.has_newcomer_labels
        && record.weekly_distribution_before.as_ref().is_some_and(|b| !b.is_empty())
        && record.weekly_distribution_after.as_ref().is_some_and(|a| !a.is_empty())
}

/// The earliest newcomer label was first used within `EARLY_ADOPTION_DAYS`
/// calendar days of creation.
pub fn early_adoption(record: &RepositoryRecord) -> Result<bool> {
    let Some(adoption) = earliest_adoption(&record.newcomer_labels) else {
        return Ok(false);
    };
    let created_at = parse_timestamp(&record.created_at)?;
    let days = (adoption.created_at.date_naive() - created_at.date_naive()).num_days();
    Ok(days <= EARLY_ADOPTION_DAYS)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordStats {
    pub repository: String,
    pub language: String,
    pub label: Option<String>,
    pub first_contributions: usize,
    pub weeks: usize,
    pub enough_data: bool,
    pub early_adoption: bool,
    pub before: Option<Summary>,
    pub after: Option<Summary>,
    /// After (treatment) against before (control); only for records with
    /// enough data and no early adoption.
    pub comparison: Option<Comparison>,
}

impl RecordStats {
    pub fn is_comparable(&self) -> bool {
        self.enough_data && !self.early_adoption
    }
}

pub fn record_stats(language: &str, record: &RepositoryRecord, alpha: f64) -> Result<RecordStats> {
    let enough_data = enough_data_to_split(record);
    let early = early_adoption(record)?;
    let before = record.weekly_distribution_before.as_deref().unwrap_or_default();
    let after = record.weekly_distribution_after.as_deref().unwrap_or_default();

    let comparison = if enough_data && !early {
        compare(after, before, alpha)
    } else {
        None
    };

    Ok(RecordStats {
        repository: record.nameconcat.clone(),
        language: language.to_string(),
        label: earliest_adoption(&record.newcomer_labels).map(|a| a.name.clone()),
        first_contributions: record.first_contributions.len(),
        weeks: record.weekly_distribution.len(),
        enough_data,
        early_adoption: early,
        before: if enough_data { Summary::of(before) } else { None },
        after: if enough_data { Summary::of(after) } else { None },
        comparison,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageSummary {
    pub language: String,
    pub first_contributions: Summary,
    pub repositories: Vec<String>,
}

/// First-contribution counts per language, languages in name order.
pub fn language_summaries(records: &[RecordStats]) -> Vec<LanguageSummary> {
    let mut by_language: BTreeMap<&str, (Vec<usize>, Vec<String>)> = BTreeMap::new();
    for record in records {
        let (counts, repositories) = by_language.entry(record.language.as_str()).or_default();
        counts.push(record.first_contributions);
        repositories.push(record.repository.clone());
    }

    by_language
        .into_iter()
        .filter_map(|(language, (counts, repositories))| {
            Some(LanguageSummary {
                language: language.to_string(),
                first_contributions: Summary::of(&counts)?,
                repositories,
            })
        })
        .collect()
}

/// First-contribution counts of repositories with a newcomer label against
/// those without one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelComparison {
    pub with_label: Option<Summary>,
    pub without_label: Option<Summary>,
    pub comparison: Option<Comparison>,
}

pub fn with_vs_without_label(records: &[RecordStats], alpha: f64) -> LabelComparison {
    let (with, without): (Vec<&RecordStats>, Vec<&RecordStats>) =
        records.iter().partition(|r| r.label.is_some());
    let with: Vec<usize> = with.iter().map(|r| r.first_contributions).collect();
    let without: Vec<usize> = without.iter().map(|r| r.first_contributions).collect();

    LabelComparison {
        with_label: Summary::of(&with),
        without_label: Summary::of(&without),
        comparison: compare(&with, &without, alpha),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    pub alpha: f64,
    pub records: Vec<RecordStats>,
    pub languages: Vec<LanguageSummary>,
    pub with_vs_without_label: LabelComparison,
}

impl StatsReport {
    pub fn new(records: Vec<RecordStats>, alpha: f64) -> Self {
        Self {
            alpha,
            languages: language_summaries(&records),
            with_vs_without_label: with_vs_without_label(&records, alpha),
            records,
        }
    }
}

pub fn exec(common: &CommonArgs, languages: Option<&str>, json: bool, alpha: f64) -> anyhow::Result<()> {
    if !(alpha > 0.0 && alpha < 1.0) {
        anyhow::bail!("significance level must be between 0 and 1, got {alpha}");
    }
    let store = Store::new(&common.output);
    let languages = parse_languages(languages)?;

    let mut records = Vec::new();
    for language in &languages {
        let stored = store
            .load_language(language)
            .with_context(|| format!("Failed to read records for {language}"))?;
        debug!(language = %language, records = stored.len(), "loaded records");
        for (path, record) in stored {
            let stats = record_stats(language, &record, alpha)
                .with_context(|| format!("Failed to summarize {}", path.display()))?;
            records.push(stats);
        }
    }
    info!(records = records.len(), "statistics computed");

    let report = StatsReport::new(records, alpha);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output_table(&report);
    }
    Ok(())
}

fn output_table(report: &StatsReport) {
    println!(
        "{:<40} {:<12} {:>6} {:>6} {:>9} {:>8} {:<10} {:>10}",
        style("Repository").bold(),
        style("Language").bold(),
        style("Weeks").bold(),
        style("First").bold(),
        style("Split").bold(),
        style("Delta").bold(),
        style("Effect").bold(),
        style("p-value").bold()
    );
    println!("{}", "─".repeat(108));
    for r in &report.records {
        let split = match (r.enough_data, r.early_adoption) {
            (false, _) => "no",
            (true, true) => "early",
            (true, false) => "yes",
        };
        match &r.comparison {
            Some(c) => println!(
                "{:<40} {:<12} {:>6} {:>6} {:>9} {:>8.3} {:<10} {:>10.3e}",
                r.repository, r.language, r.weeks, r.first_contributions, split, c.delta, c.effect_size, c.p_value
            ),
            None => println!(
                "{:<40} {:<12} {:>6} {:>6} {:>9} {:>8} {:<10} {:>10}",
                r.repository, r.language, r.weeks, r.first_contributions, split, "-", "-", "-"
            ),
        }
    }

    println!("\n{}", style("First contributions per language").bold());
    for l in &report.languages {
        println!(
            "{:<12} {} ({} repositories)",
            l.language.to_uppercase(),
            l.first_contributions,
            l.first_contributions.size
        );
    }

    let cmp = &report.with_vs_without_label;
    println!("\n{}", style("With vs without newcomer label").bold());
    if let Some(s) = &cmp.with_label {
        println!("  with:    {} (n={})", s, s.size);
    }
    if let Some(s) = &cmp.without_label {
        println!("  without: {} (n={})", s, s.size);
    }
    match &cmp.comparison {
        Some(c) => println!(
            "  delta {:.3} ({}), p-value {:.3e}, {}",
            c.delta,
            c.effect_size,
            c.p_value,
            if c.identical {
                style("no difference").dim()
            } else {
                style("different").yellow()
            }
        ),
        None => println!("  {}", style("not enough repositories on both sides").dim()),
    }
}
