use crate::aggregate::resegment;
use crate::cli::CommonArgs;
use crate::config::parse_languages;
use crate::labels::is_help_wanted;
use crate::model::RepositoryRecord;
use crate::store::Store;
use anyhow::Context;
use chrono::Utc;
use console::style;
use tracing::info;

pub fn exec(common: &CommonArgs, languages: Option<&str>, strip: bool) -> anyhow::Result<()> {
    let store = Store::new(&common.output);
    let languages = parse_languages(languages)?;
    let now = Utc::now();

    let mut affected = 0usize;
    let mut keep_other_labels = 0usize;

    for language in &languages {
        let records = store
            .load_language(language)
            .with_context(|| format!("Failed to read records for {language}"))?;

        for (path, record) in records {
            let help_wanted: Vec<&str> = record
                .newcomer_labels
                .iter()
                .map(|l| l.name.as_str())
                .filter(|name| is_help_wanted(name))
                .collect();
            if help_wanted.is_empty() {
                continue;
            }
            affected += 1;
            println!("{} - {}: {}", language, record.nameconcat, style(help_wanted.join(", ")).yellow());

            let stripped = strip_help_wanted(&record);
            if stripped.has_newcomer_labels {
                keep_other_labels += 1;
            }
            if strip {
                let analysis = resegment(&stripped, now)
                    .with_context(|| format!("Failed to re-segment {}", path.display()))?;
                store.save(language, &analysis.record)?;
                info!(path = %path.display(), "help-wanted labels removed");
            }
        }
    }

    println!(
        "\n{} repositories use help-wanted labels, {} of them have other newcomer labels",
        style(affected).cyan(),
        style(keep_other_labels).cyan()
    );
    Ok(())
}

/// Copy of `record` without help-wanted variations among its newcomer labels.
pub fn strip_help_wanted(record: &RepositoryRecord) -> RepositoryRecord {
    let mut stripped = record.clone();
    stripped.newcomer_labels.retain(|l| !is_help_wanted(&l.name));
    stripped.has_newcomer_labels = !stripped.newcomer_labels.is_empty();
    stripped
}
