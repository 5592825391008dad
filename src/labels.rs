use crate::error::{NewcomersError, Result};
use crate::model::LabelAdoption;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Spellings of "help wanted" that do not specifically target newcomers.
pub const HELP_WANTED_VARIATIONS: &[&str] = &[
    "status/help-wanted",
    "help needed",
    "help wanted",
    "help-wanted",
    "disposition/help wanted",
    "helpwanted",
    "state: help wanted (pr)",
    "status: help wanted",
    "type: help-wanted",
    "type/help-wanted",
];

/// Known newcomer label names, compared case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct LabelCatalog {
    names: HashSet<String>,
}

impl LabelCatalog {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names.into_iter().map(|n| n.as_ref().to_lowercase()).collect(),
        }
    }

    /// Load a JSON array of label names.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let names: Vec<String> = serde_json::from_str(&raw)?;
        if names.is_empty() {
            return Err(NewcomersError::Config(format!(
                "label catalog {} is empty",
                path.display()
            )));
        }
        debug!(path = %path.display(), count = names.len(), "loaded newcomer label catalog");
        Ok(Self::new(names))
    }

    pub fn contains(&self, label: &str) -> bool {
        self.names.contains(&label.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Repository labels that are newcomer labels, spelled as the repository does.
    pub fn matching<'a>(&self, labels: &'a [String]) -> Vec<&'a str> {
        labels
            .iter()
            .map(String::as_str)
            .filter(|label| self.contains(label))
            .collect()
    }
}

pub fn is_help_wanted(label: &str) -> bool {
    let label = label.to_lowercase();
    HELP_WANTED_VARIATIONS.contains(&label.as_str())
}

/// The adoption that drives segmentation: earliest first use, first listed on ties.
pub fn earliest_adoption(adoptions: &[LabelAdoption]) -> Option<&LabelAdoption> {
    adoptions.iter().min_by_key(|a| a.created_at)
}

pub fn sorted_adoptions(adoptions: &[LabelAdoption]) -> Vec<LabelAdoption> {
    let mut sorted = adoptions.to_vec();
    sorted.sort_by_key(|a| a.created_at);
    sorted
}
