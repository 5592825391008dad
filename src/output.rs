use crate::distribution::{Segmentation, WeeklyHistogram};
use crate::model::RepositoryRecord;
use anyhow::Result;
use console::style;

pub fn output_json(record: &RepositoryRecord) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(record)?);
    Ok(())
}

pub fn output_ndjson(histogram: &WeeklyHistogram) -> Result<()> {
    for bucket in histogram.buckets() {
        println!("{}", serde_json::to_string(bucket)?);
    }
    Ok(())
}

pub fn output_summary(record: &RepositoryRecord, segmentation: Option<&Segmentation>) -> Result<()> {
    println!("{}", style(&record.nameconcat).bold());
    println!("{}", "─".repeat(50));
    println!("Created: {}", style(&record.created_at).dim());
    println!("First-time contributors: {}", style(record.first_contributions.len()).cyan());
    println!("Weeks: {}", style(record.weekly_distribution.len()).cyan());

    match segmentation {
        Some(segmentation) => {
            let label = record
                .newcomer_labels
                .first()
                .map(|l| l.name.as_str())
                .unwrap_or("newcomer label");
            let (before, after) = segmentation.summary();
            println!(
                "Adopted '{}' in week {}",
                style(label).yellow(),
                style(segmentation.adoption_week).yellow()
            );
            println!(
                "  before: {:>4} weeks, {:>5} newcomers, {:.2}/week",
                before.weeks, before.total, before.mean
            );
            println!(
                "  after:  {:>4} weeks, {:>5} newcomers, {:.2}/week",
                after.weeks, after.total, after.mean
            );
        }
        None => println!("{}", style("No newcomer label adopted").dim()),
    }
    Ok(())
}

pub fn output_distribution(
    record: &RepositoryRecord,
    segmentation: Option<&Segmentation>,
    skip_months: Option<u32>,
) -> Result<()> {
    let mut histogram = match segmentation {
        Some(s) => record.weekly_distribution.with_week(s.adoption_week),
        None => record.weekly_distribution.clone(),
    };
    if let Some(months) = skip_months {
        histogram = histogram.without_warmup(months);
    }

    if histogram.is_empty() {
        println!("No data to display");
        return Ok(());
    }

    let max = histogram.buckets().iter().map(|b| b.total()).max().unwrap_or(1).max(1);

    println!("{}", style("Weekly First Contributions").bold());
    println!("{}", "─".repeat(50));

    for bucket in histogram.buckets() {
        let intensity = ((bucket.total() as f64 / max as f64) * 5.0) as u32;
        let bar = match intensity {
            0 if bucket.total() > 0 => "▁",
            0 => " ",
            1 => "▁",
            2 => "▃",
            3 => "▅",
            4 => "▇",
            _ => "█",
        };
        let adopted = segmentation.is_some_and(|s| s.adoption_week == bucket.week());
        if adopted {
            println!(
                "{} {} newcomers: {:>3} {}",
                bucket.week(),
                style(bar).red(),
                bucket.total(),
                style("◀ newcomer label adopted").red().bold()
            );
        } else {
            println!("{} {} newcomers: {:>3}", bucket.week(), style(bar).green(), bucket.total());
        }
    }

    println!();
    output_summary(record, segmentation)
}
