use crate::aggregate::resegment;
use crate::cli::CommonArgs;
use crate::distribution::segment;
use crate::labels::earliest_adoption;
use crate::output::{output_distribution, output_json, output_ndjson, output_summary};
use crate::store::Store;
use anyhow::Context;
use chrono::Utc;
use std::path::Path;

pub fn exec(
    common: &CommonArgs,
    record_path: &Path,
    json: bool,
    ndjson: bool,
    write: Option<&str>,
) -> anyhow::Result<()> {
    let record = Store::load(record_path)
        .with_context(|| format!("Failed to read record {}", record_path.display()))?;
    let analysis = resegment(&record, Utc::now()).context("Failed to analyze record")?;

    if let Some(language) = write {
        let saved = Store::new(&common.output)
            .save(language, &analysis.record)
            .context("Failed to save record")?;
        eprintln!("Saved {}", saved.display());
    }

    if json {
        output_json(&analysis.record)?;
    } else if ndjson {
        output_ndjson(&analysis.record.weekly_distribution)?;
    } else {
        output_summary(&analysis.record, analysis.segmentation.as_ref())?;
    }

    Ok(())
}

/// Render a stored record as is, without recomputing it.
pub fn show(record_path: &Path, skip_months: Option<u32>) -> anyhow::Result<()> {
    let record = Store::load(record_path)
        .with_context(|| format!("Failed to read record {}", record_path.display()))?;
    let segmentation = segment(
        &record.weekly_distribution,
        earliest_adoption(&record.newcomer_labels),
    );
    output_distribution(&record, segmentation.as_ref(), skip_months)
}
