use chrono::{DateTime, Utc};
use newcomers::aggregate::analyze;
use newcomers::model::{AnalysisInput, ContributionEvent, LabelAdoption, RepositoryInfo, RepositoryRecord, SampleRepository};
use newcomers::stats::{
    cliffs_delta, compare, early_adoption, enough_data_to_split, language_summaries, mann_whitney_p,
    record_stats, with_vs_without_label, EffectSize, StatsReport, Summary, SIGNIFICANCE_LEVEL,
};
use pretty_assertions::assert_eq;

fn at(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn close(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 1e-6
}

fn record(name: &str, contributions: &[&str], label: Option<&str>, now: &str) -> RepositoryRecord {
    let input = AnalysisInput {
        sample: SampleRepository {
            owner: "acme".to_string(),
            name: name.to_string(),
            url: None,
            language: None,
            nameconcat: None,
        },
        info: RepositoryInfo {
            id: 1,
            full_name: format!("acme/{name}"),
            created_at: "2021-03-01T00:00:00Z".to_string(),
            language: None,
            stars: 0,
            forks: 0,
            watchers: 0,
            subscribers: 0,
            open_issues: 0,
        },
        contributions: contributions
            .iter()
            .enumerate()
            .map(|(i, created_at)| ContributionEvent {
                login: format!("user{i}"),
                created_at: at(created_at),
                issue_number: None,
            })
            .collect(),
        labels: label.iter().map(|_| "good first issue".to_string()).collect(),
        newcomer_labels: label
            .map(|created_at| LabelAdoption {
                name: "good first issue".to_string(),
                created_at: at(created_at),
            })
            .into_iter()
            .collect(),
    };
    analyze(&input, at(now)).unwrap().record
}

#[test]
fn summary_matches_the_usual_definitions() {
    let s = Summary::of(&[3, 0, 1, 0]).unwrap();
    assert_eq!((s.size, s.min, s.max), (4, 0, 3));
    assert!(close(s.median, 0.5));
    assert!(close(s.mean, 1.0));
    assert!(close(s.std_dev, 2f64.sqrt()));
    assert_eq!(s.to_string(), "Min=0;Median=0.500;Mean=1.000;Max=3;std_dev=1.414");

    let odd = Summary::of(&[7, 1, 4]).unwrap();
    assert!(close(odd.median, 4.0));

    let single = Summary::of(&[5]).unwrap();
    assert!(close(single.std_dev, 0.0));
    assert_eq!(Summary::of(&[]), None);
}

#[test]
fn cliffs_delta_counts_dominance() {
    assert_eq!(cliffs_delta(&[4, 5, 6], &[1, 2, 3]), Some(1.0));
    assert_eq!(cliffs_delta(&[1, 2, 3], &[4, 5, 6]), Some(-1.0));
    assert_eq!(cliffs_delta(&[1, 1], &[1, 1]), Some(0.0));
    assert!(close(cliffs_delta(&[1, 3], &[2, 2, 3]).unwrap(), -1.0 / 6.0));
    assert_eq!(cliffs_delta(&[], &[1]), None);
    assert_eq!(cliffs_delta(&[1], &[]), None);
}

#[test]
fn effect_size_bands() {
    assert_eq!(EffectSize::of(0.0), EffectSize::Negligible);
    assert_eq!(EffectSize::of(0.146), EffectSize::Negligible);
    assert_eq!(EffectSize::of(-0.2), EffectSize::Small);
    assert_eq!(EffectSize::of(0.4), EffectSize::Medium);
    assert_eq!(EffectSize::of(0.474), EffectSize::Large);
    assert_eq!(EffectSize::of(-1.0), EffectSize::Large);
    assert_eq!(EffectSize::Medium.to_string(), "medium");
    assert_eq!(serde_json::to_string(&EffectSize::Large).unwrap(), "\"large\"");
}

#[test]
fn mann_whitney_matches_normal_approximation() {
    let p = mann_whitney_p(&[1, 2, 3], &[4, 5, 6]).unwrap();
    assert!((p - 0.080_855_6).abs() < 1e-5, "{p}");

    let p = mann_whitney_p(&[0, 0, 1, 2, 5, 7, 7, 9], &[0, 0, 0, 1, 0, 0, 2, 0, 1, 0]).unwrap();
    assert!((p - 0.022_238_3).abs() < 1e-5, "{p}");

    let forward = mann_whitney_p(&[0, 1, 0, 2, 0], &[3, 0, 1, 0]).unwrap();
    let backward = mann_whitney_p(&[3, 0, 1, 0], &[0, 1, 0, 2, 0]).unwrap();
    assert!(close(forward, backward));
    assert!((forward - 0.787_406_5).abs() < 1e-5, "{forward}");

    assert_eq!(mann_whitney_p(&[2, 2, 2], &[2, 2]), Some(1.0));
    assert_eq!(mann_whitney_p(&[], &[1, 2]), None);
}

#[test]
fn comparison_flags_identical_populations_by_significance() {
    let strict = compare(&[1, 2, 3], &[4, 5, 6], SIGNIFICANCE_LEVEL).unwrap();
    assert_eq!(strict.effect_size, EffectSize::Large);
    assert!(strict.identical);

    let loose = compare(&[1, 2, 3], &[4, 5, 6], 0.1).unwrap();
    assert!(!loose.identical);
    assert_eq!(compare(&[], &[1], SIGNIFICANCE_LEVEL), None);
}

#[test]
fn split_needs_weeks_on_both_sides() {
    let events = ["2021-03-01T09:00:00Z", "2021-03-03T12:00:00Z", "2021-03-16T10:00:00Z"];
    let split = record("split", &events, Some("2021-03-10T00:00:00Z"), "2021-03-29T00:00:00Z");
    assert!(enough_data_to_split(&split));

    let at_creation = record("first-week", &events, Some("2021-03-02T00:00:00Z"), "2021-03-29T00:00:00Z");
    assert_eq!(at_creation.weekly_distribution_before, Some(vec![]));
    assert!(!enough_data_to_split(&at_creation));

    let unlabelled = record("plain", &events, None, "2021-03-29T00:00:00Z");
    assert!(!enough_data_to_split(&unlabelled));
    assert!(!early_adoption(&unlabelled).unwrap());
}

#[test]
fn early_adoptions_are_not_compared() {
    let events = ["2021-03-01T09:00:00Z", "2021-06-03T12:00:00Z", "2021-12-16T10:00:00Z"];

    let early = record("early", &events, Some("2021-08-28T00:00:00Z"), "2022-03-01T00:00:00Z");
    assert!(early_adoption(&early).unwrap());
    let stats = record_stats("go", &early, SIGNIFICANCE_LEVEL).unwrap();
    assert!(stats.enough_data);
    assert!(!stats.is_comparable());
    assert_eq!(stats.comparison, None);
    assert!(stats.before.is_some());

    let late = record("late", &events, Some("2021-08-29T00:00:00Z"), "2022-03-01T00:00:00Z");
    assert!(!early_adoption(&late).unwrap());
    let stats = record_stats("go", &late, SIGNIFICANCE_LEVEL).unwrap();
    assert!(stats.is_comparable());
    assert_eq!(stats.label.as_deref(), Some("good first issue"));
    assert_eq!(stats.first_contributions, 3);
    let before = stats.before.unwrap();
    let after = stats.after.unwrap();
    assert_eq!(before.size + after.size, stats.weeks);
    assert_eq!(stats.comparison.unwrap().delta, cliffs_delta(
        late.weekly_distribution_after.as_deref().unwrap(),
        late.weekly_distribution_before.as_deref().unwrap(),
    ).unwrap());
}

#[test]
fn languages_and_label_groups_are_summarized() {
    let now = "2021-06-01T00:00:00Z";
    let two = ["2021-03-01T09:00:00Z", "2021-03-03T12:00:00Z"];
    let four = [
        "2021-03-01T09:00:00Z",
        "2021-03-08T09:00:00Z",
        "2021-03-15T09:00:00Z",
        "2021-03-22T09:00:00Z",
    ];
    let records = vec![
        record_stats("go", &record("a", &two, Some("2021-04-01T00:00:00Z"), now), SIGNIFICANCE_LEVEL).unwrap(),
        record_stats("rust", &record("b", &four, None, now), SIGNIFICANCE_LEVEL).unwrap(),
        record_stats("go", &record("c", &four, None, now), SIGNIFICANCE_LEVEL).unwrap(),
    ];

    let languages = language_summaries(&records);
    let names: Vec<&str> = languages.iter().map(|l| l.language.as_str()).collect();
    assert_eq!(names, vec!["go", "rust"]);
    assert_eq!(languages[0].repositories, vec!["acme/a", "acme/c"]);
    assert!(close(languages[0].first_contributions.mean, 3.0));
    assert_eq!(languages[1].first_contributions.size, 1);

    let groups = with_vs_without_label(&records, SIGNIFICANCE_LEVEL);
    assert_eq!(groups.with_label.unwrap().size, 1);
    assert_eq!(groups.without_label.unwrap().size, 2);
    assert_eq!(groups.comparison.unwrap().delta, -1.0);

    let report = StatsReport::new(records, SIGNIFICANCE_LEVEL);
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["records"].as_array().unwrap().len(), 3);
    assert_eq!(json["languages"][1]["language"], "rust");
    assert_eq!(json["with_vs_without_label"]["comparison"]["effect_size"], "large");
}
