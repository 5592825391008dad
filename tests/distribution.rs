use chrono::{DateTime, Duration, Utc};
use newcomers::calendar::{key_of, WeekKey};
use newcomers::distribution::{build, fill, segment, WeeklyBucket, WeeklyHistogram};
use newcomers::model::{ContributionEvent, LabelAdoption};
use pretty_assertions::assert_eq;

fn at(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn event(login: &str, created_at: &str) -> ContributionEvent {
    ContributionEvent {
        login: login.to_string(),
        created_at: at(created_at),
        issue_number: None,
    }
}

fn adoption(created_at: &str) -> LabelAdoption {
    LabelAdoption {
        name: "good first issue".to_string(),
        created_at: at(created_at),
    }
}

// W1 is the week of Monday 2021-03-01 (09 2021); W3 two weeks later.
fn scenario_events() -> Vec<ContributionEvent> {
    vec![
        event("dana", "2021-03-16T10:00:00Z"),
        event("carl", "2021-03-07T23:59:00Z"),
        event("alma", "2021-03-01T09:00:00Z"),
        event("bert", "2021-03-03T12:00:00Z"),
    ]
}

const W1_START: &str = "2021-03-01T00:00:00Z";
const W5_START: &str = "2021-03-29T00:00:00Z";

fn scenario_dense() -> WeeklyHistogram {
    fill(&build(&scenario_events()), at(W1_START), at(W5_START))
}

#[test]
fn build_groups_by_week_in_first_seen_order() {
    let sparse = build(&scenario_events());
    assert_eq!(sparse.len(), 2);
    assert_eq!(sparse.total_events(), 4);

    let weeks: Vec<String> = sparse.buckets().iter().map(|b| b.week().to_string()).collect();
    assert_eq!(weeks, vec!["11 2021", "09 2021"]);

    let w1 = sparse.get(&key_of(&at(W1_START))).unwrap();
    assert_eq!(
        w1.dates(),
        &[
            at("2021-03-07T23:59:00Z"),
            at("2021-03-01T09:00:00Z"),
            at("2021-03-03T12:00:00Z")
        ]
    );
    assert_eq!(w1.total(), 3);
}

#[test]
fn build_of_nothing_is_empty() {
    let sparse = build(&Vec::<ContributionEvent>::new());
    assert!(sparse.is_empty());
    assert_eq!(sparse.total_events(), 0);
}

#[test]
fn fill_inserts_silent_weeks_in_order() {
    let dense = scenario_dense();
    assert_eq!(dense.counts(), vec![3, 0, 1, 0]);
    let weeks: Vec<String> = dense.buckets().iter().map(|b| b.week().to_string()).collect();
    assert_eq!(weeks, vec!["09 2021", "10 2021", "11 2021", "12 2021"]);
    assert!(dense.buckets()[1].dates().is_empty());
}

#[test]
fn fill_is_idempotent() {
    let dense = scenario_dense();
    let again = fill(&dense.to_sparse(), at(W1_START), at(W5_START));
    assert_eq!(again, dense);
}

#[test]
fn fill_covers_every_week_between_bounds() {
    let sparse = build(&scenario_events());
    let cases = [
        ("2021-03-01T00:00:00Z", "2021-03-29T00:00:00Z"),
        ("2021-03-03T15:00:00Z", "2021-03-31T15:00:00Z"),
        ("2019-12-25T00:00:00Z", "2021-01-10T00:00:00Z"),
        ("2020-12-27T23:00:00Z", "2021-01-04T00:00:01Z"),
        ("2015-06-10T08:00:00Z", "2024-02-29T12:00:00Z"),
    ];

    for (anchor, upper) in cases {
        let (anchor, upper) = (at(anchor), at(upper));
        let dense = fill(&sparse, anchor, upper);
        let whole_weeks = (upper - anchor).num_weeks() as usize;
        let week_secs = Duration::weeks(1).num_seconds();
        let from_monday = (upper - key_of(&anchor).start()).num_seconds();
        let expected = ((from_monday + week_secs - 1) / week_secs) as usize;
        assert_eq!(dense.len(), expected);
        assert!(
            dense.len() >= whole_weeks && dense.len() <= whole_weeks + 2,
            "{} buckets for {} whole weeks",
            dense.len(),
            whole_weeks
        );
        assert_eq!(dense.buckets()[0].week(), key_of(&anchor));
        assert!(dense.buckets().last().unwrap().week().start() < upper);
        assert!(dense.buckets().last().unwrap().week().successor().start() >= upper);
        for pair in dense.buckets().windows(2) {
            assert_eq!(pair[0].week().successor(), pair[1].week());
        }
    }
}

#[test]
fn fill_crosses_a_53_week_year_without_gaps() {
    let events = vec![
        event("a", "2020-12-28T10:00:00Z"),
        event("b", "2020-12-31T10:00:00Z"),
        event("c", "2021-01-01T10:00:00Z"),
        event("d", "2021-01-04T10:00:00Z"),
    ];
    let dense = fill(&build(&events), at("2020-12-21T00:00:00Z"), at("2021-01-11T00:00:00Z"));
    let weeks: Vec<String> = dense.buckets().iter().map(|b| b.week().to_string()).collect();
    assert_eq!(weeks, vec!["52 2020", "53 2020", "01 2021"]);
    assert_eq!(dense.counts(), vec![0, 3, 1]);
}

#[test]
fn degenerate_range_gives_empty_histogram() {
    let sparse = build(&scenario_events());
    assert!(fill(&sparse, at(W5_START), at(W1_START)).is_empty());
    assert!(fill(&sparse, at(W1_START), at(W1_START)).is_empty());
    assert!(fill(&sparse, at("2021-03-03T00:00:00Z"), at("2021-03-02T00:00:00Z")).is_empty());
}

#[test]
fn later_runs_extend_with_zero_weeks() {
    let sparse = build(&scenario_events());
    let now = fill(&sparse, at(W1_START), at(W5_START));
    let later = fill(&sparse, at(W1_START), at(W5_START) + Duration::weeks(3));
    assert_eq!(later.len(), now.len() + 3);
    assert_eq!(&later.buckets()[..now.len()], now.buckets());
    assert_eq!(later.counts()[now.len()..].to_vec(), vec![0, 0, 0]);
}

#[test]
fn events_outside_the_lifetime_are_left_out() {
    let mut events = scenario_events();
    events.push(event("early", "2021-02-10T00:00:00Z"));
    events.push(event("late", "2021-04-20T00:00:00Z"));
    let dense = fill(&build(&events), at(W1_START), at(W5_START));
    assert_eq!(dense.counts(), vec![3, 0, 1, 0]);
    assert_eq!(dense.total_events(), 4);
}

#[test]
fn every_bucket_count_matches_its_dates() {
    let dense = fill(&build(&scenario_events()), at("2020-11-02T00:00:00Z"), at("2021-06-01T00:00:00Z"));
    for bucket in dense.buckets() {
        assert_eq!(bucket.total(), bucket.dates().len());
        assert!(bucket.dates().iter().all(|d| key_of(d) == bucket.week()));
    }
    assert_eq!(dense.total_events(), 4);
}

#[test]
fn buckets_serialize_with_week_label_dates_and_total() {
    let dense = scenario_dense();
    let json = serde_json::to_value(&dense.buckets()[2]).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "week": "11 2021",
            "dates": ["2021-03-16T10:00:00Z"],
            "total": 1
        })
    );

    let back: WeeklyHistogram = serde_json::from_str(&serde_json::to_string(&dense).unwrap()).unwrap();
    assert_eq!(back, dense);
}

#[test]
fn inconsistent_buckets_are_rejected() {
    let wrong_total = r#"{"week":"09 2021","dates":["2021-03-01T09:00:00Z"],"total":2}"#;
    assert!(serde_json::from_str::<WeeklyBucket>(wrong_total).is_err());

    let stray_date = r#"{"week":"09 2021","dates":["2021-03-08T09:00:00Z"],"total":1}"#;
    assert!(serde_json::from_str::<WeeklyBucket>(stray_date).is_err());

    let out_of_order = r#"[
        {"week":"10 2021","dates":[],"total":0},
        {"week":"09 2021","dates":[],"total":0}
    ]"#;
    assert!(serde_json::from_str::<WeeklyHistogram>(out_of_order).is_err());

    let duplicated = r#"[
        {"week":"09 2021","dates":[],"total":0},
        {"week":"09 2021","dates":[],"total":0}
    ]"#;
    assert!(serde_json::from_str::<WeeklyHistogram>(duplicated).is_err());
}

#[test]
fn adoption_week_opens_the_after_segment() {
    let dense = scenario_dense();
    let split = segment(&dense, Some(&adoption("2021-03-10T15:00:00Z"))).unwrap();
    assert_eq!(split.adoption_week.to_string(), "10 2021");
    assert_eq!(split.before, vec![3]);
    assert_eq!(split.after, vec![0, 1, 0]);

    let at_monday = segment(&dense, Some(&adoption("2021-03-08T00:00:00Z"))).unwrap();
    assert_eq!(at_monday, split);
}

#[test]
fn no_adoption_means_no_segmentation() {
    let dense = scenario_dense();
    assert_eq!(segment(&dense, None), None);
    assert_eq!(dense.counts(), vec![3, 0, 1, 0]);
}

#[test]
fn empty_histogram_still_segments_on_the_synthesized_week() {
    let dense = fill(&build(&scenario_events()), at(W5_START), at(W1_START));
    let split = segment(&dense, Some(&adoption("2021-03-10T15:00:00Z"))).unwrap();
    assert!(split.before.is_empty());
    assert_eq!(split.after, vec![0]);
}

#[test]
fn adoption_before_creation_is_placed_first() {
    let dense = scenario_dense();
    let split = segment(&dense, Some(&adoption("2021-01-15T00:00:00Z"))).unwrap();
    assert!(split.before.is_empty());
    assert_eq!(split.after, vec![0, 3, 0, 1, 0]);
    assert_eq!(dense.len(), 4);
}

#[test]
fn adoption_after_upper_bound_is_placed_last() {
    let dense = scenario_dense();
    let split = segment(&dense, Some(&adoption("2021-06-01T00:00:00Z"))).unwrap();
    assert_eq!(split.before, vec![3, 0, 1, 0]);
    assert_eq!(split.after, vec![0]);
}

#[test]
fn segments_partition_the_extended_histogram() {
    let dense = fill(&build(&scenario_events()), at("2021-01-20T00:00:00Z"), at("2021-05-01T00:00:00Z"));
    let mut instant = at("2020-12-01T12:00:00Z");
    while instant < at("2021-06-15T00:00:00Z") {
        let adopted = LabelAdoption {
            name: "beginner".to_string(),
            created_at: instant,
        };
        let split = segment(&dense, Some(&adopted)).unwrap();
        let extended = dense.with_week(key_of(&instant));

        let mut joined = split.before.clone();
        joined.extend(&split.after);
        assert_eq!(joined, extended.counts());
        assert_eq!(split.len(), extended.len());
        assert_eq!(extended.position(&split.adoption_week), Some(split.before.len()));

        instant = instant + Duration::days(5);
    }
}

#[test]
fn with_week_leaves_the_original_untouched() {
    let dense = scenario_dense();
    let outside = WeekKey::new(1, 2021).unwrap();
    let extended = dense.with_week(outside);
    assert_eq!(dense.len(), 4);
    assert_eq!(extended.len(), 5);
    assert_eq!(extended.position(&outside), Some(0));
    assert_eq!(dense.with_week(key_of(&at(W1_START))), dense);
}

#[test]
fn summary_reports_mean_weekly_newcomers() {
    let split = segment(&scenario_dense(), Some(&adoption("2021-03-10T15:00:00Z"))).unwrap();
    let (before, after) = split.summary();
    assert_eq!((before.weeks, before.total), (1, 3));
    assert_eq!((after.weeks, after.total), (3, 1));
    assert!((before.mean - 3.0).abs() < f64::EPSILON);
    assert!((after.mean - 1.0 / 3.0).abs() < 1e-9);
}

#[test]
fn warmup_trimming_drops_the_first_months() {
    let dense = fill(&build(&scenario_events()), at("2021-01-04T00:00:00Z"), at("2021-10-04T00:00:00Z"));
    let trimmed = dense.without_warmup(6);
    let cutoff = key_of(&at("2021-07-04T00:00:00Z"));
    assert_eq!(trimmed.buckets()[0].week(), cutoff);
    assert_eq!(trimmed.len(), dense.len() - dense.position(&cutoff).unwrap());
    assert!(WeeklyHistogram::default().without_warmup(6).is_empty());
    assert_eq!(dense.without_warmup(0), dense);
}
