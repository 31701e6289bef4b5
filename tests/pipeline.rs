mod common;

use common::{
    FakeProvider, FakeTeams, LOADING_SHELL, id, read_fixture, single_item_json, stats_url,
    test_config,
};
use matchstats_terminal::error::FailureKind;
use matchstats_terminal::filter::MetricSet;
use matchstats_terminal::model::{EXPECTED_GOALS, MatchId, parse_match_ids};
use matchstats_terminal::pipeline::{CancelFlag, Pipeline};

#[test]
fn one_good_match_and_one_timeout() {
    let xg = single_item_json(EXPECTED_GOALS, 1.2, 0.8);
    let provider = FakeProvider::default()
        .with_page(stats_url("A"), &[xg.as_str()])
        .with_page(stats_url("B"), &[LOADING_SHELL]);
    let counters = provider.counters.clone();
    let teams = FakeTeams::default()
        .with("A", "Team X", "Team Y")
        .with("B", "Team Z", "Team W");

    let pipeline = Pipeline::new(test_config(), provider, teams);
    let run = pipeline
        .run(&[id("A"), id("B")], &MetricSet::default())
        .expect("session opens");

    assert_eq!(run.records.len(), 1);
    let record = &run.records[0];
    assert_eq!(record.match_id.as_str(), "A");
    assert_eq!(record.name(), EXPECTED_GOALS);
    assert_eq!(record.home.as_deref(), Some("Team X"));
    assert_eq!(record.away.as_deref(), Some("Team Y"));
    assert_eq!(record.home_value, Some(1.2));
    assert_eq!(record.away_value, Some(0.8));
    assert_eq!(record.period.as_deref(), Some("ALL"));

    assert_eq!(run.failures.len(), 1);
    assert_eq!(run.failures[0].match_id.as_str(), "B");
    assert_eq!(run.failures[0].kind, FailureKind::Timeout);
    assert!(!run.cancelled);

    assert_eq!(counters.acquired(), 1);
    assert_eq!(counters.released(), 1);
}

#[test]
fn payload_that_renders_late_is_picked_up() {
    let xg = single_item_json(EXPECTED_GOALS, 2.1, 0.3);
    let rendered = format!("<html><body><pre>{xg}</pre></body></html>");
    let provider = FakeProvider::default().with_page(
        stats_url("late"),
        &[LOADING_SHELL, LOADING_SHELL, rendered.as_str()],
    );
    let teams = FakeTeams::default().with("late", "Home", "Away");

    let run = Pipeline::new(test_config(), provider, teams)
        .run(&[id("late")], &MetricSet::default())
        .unwrap();
    assert!(run.failures.is_empty());
    assert_eq!(run.records.len(), 1);
    assert_eq!(run.records[0].home_value, Some(2.1));
}

#[test]
fn html_rendered_fixture_flows_through() {
    let page = read_fixture("statistics_page.html");
    let provider = FakeProvider::default().with_page(stats_url("12528186"), &[page.as_str()]);
    let teams = FakeTeams::default().with("12528186", "Fenerbahçe", "Galatasaray");

    let run = Pipeline::new(test_config(), provider, teams)
        .run(&[id("12528186")], &MetricSet::default())
        .unwrap();
    assert_eq!(run.records.len(), 1);
    assert_eq!(run.records[0].home.as_deref(), Some("Fenerbahçe"));
}

#[test]
fn team_lookup_failure_keeps_rows_with_blank_names() {
    let raw = read_fixture("statistics.json");
    let provider = FakeProvider::default().with_page(stats_url("7"), &[raw.as_str()]);

    let run = Pipeline::new(test_config(), provider, FakeTeams::default())
        .run(&[id("7")], &MetricSet::default())
        .unwrap();

    // Full-match xG and corners only.
    assert_eq!(run.records.len(), 2);
    let xg = run.records.iter().find(|r| r.name() == EXPECTED_GOALS).unwrap();
    assert_eq!(xg.home.as_deref(), Some(""));
    assert_eq!(xg.away.as_deref(), Some(""));
    assert_eq!(run.failures.len(), 1);
    assert_eq!(run.failures[0].kind, FailureKind::TeamLookup);
}

#[test]
fn malformed_and_transport_failures_are_isolated() {
    let good = read_fixture("statistics.json");
    let provider = FakeProvider::default()
        .with_page(stats_url("bad"), &["<html><body><pre>{\"statistics\": [</pre></body></html>"])
        .with_transport_error(stats_url("down"))
        .with_page(stats_url("good"), &[good.as_str()]);
    let counters = provider.counters.clone();
    let teams = FakeTeams::default().with("good", "Fenerbahçe", "Galatasaray");

    let run = Pipeline::new(test_config(), provider, teams)
        .run(&[id("bad"), id("down"), id("good")], &MetricSet::default())
        .unwrap();

    let kinds: Vec<(&str, FailureKind)> = run
        .failures
        .iter()
        .map(|f| (f.match_id.as_str(), f.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("bad", FailureKind::MalformedDocument),
            ("down", FailureKind::Transport)
        ]
    );
    assert_eq!(run.records.len(), 2);
    assert!(run.records.iter().all(|r| r.match_id.as_str() == "good"));
    assert_eq!(counters.released(), 1);
}

#[test]
fn accumulation_preserves_identifier_order() {
    let provider = FakeProvider::default()
        .with_page(stats_url("1"), &[single_item_json(EXPECTED_GOALS, 1.0, 0.0).as_str()])
        .with_page(stats_url("2"), &[single_item_json(EXPECTED_GOALS, 2.0, 0.0).as_str()])
        .with_page(stats_url("3"), &[single_item_json(EXPECTED_GOALS, 3.0, 0.0).as_str()]);
    let teams = FakeTeams::default()
        .with("1", "A", "B")
        .with("2", "C", "D")
        .with("3", "E", "F");

    let run = Pipeline::new(test_config(), provider, teams)
        .run(&[id("3"), id("1"), id("2")], &MetricSet::default())
        .unwrap();
    let order: Vec<&str> = run.records.iter().map(|r| r.match_id.as_str()).collect();
    assert_eq!(order, vec!["3", "1", "2"]);
}

#[test]
fn repeated_identifier_is_fetched_each_time() {
    let xg = single_item_json(EXPECTED_GOALS, 1.5, 0.5);
    let provider = FakeProvider::default().with_page(stats_url("7"), &[xg.as_str()]);
    let counters = provider.counters.clone();
    let teams = FakeTeams::default().with("7", "Home", "Away");

    let ids = parse_match_ids("7, 7");
    let run = Pipeline::new(test_config(), provider, teams)
        .run(&ids, &MetricSet::default())
        .unwrap();
    assert_eq!(run.records.len(), 2);
    assert_eq!(counters.loads(), 2);
    assert_eq!(counters.released(), 1);
}

#[test]
fn session_failure_aborts_batch() {
    let provider = FakeProvider {
        fail_acquire: true,
        ..FakeProvider::default()
    };
    let counters = provider.counters.clone();

    let err = Pipeline::new(test_config(), provider, FakeTeams::default())
        .run(&[id("1")], &MetricSet::default())
        .unwrap_err();
    assert!(format!("{err:#}").contains("browser failed to start"));
    assert_eq!(counters.acquired(), 0);
    assert_eq!(counters.released(), 0);
}

#[test]
fn cancellation_stops_between_matches_and_releases() {
    let xg = single_item_json(EXPECTED_GOALS, 1.0, 1.0);
    let provider = FakeProvider::default()
        .with_page(stats_url("1"), &[xg.as_str()])
        .with_page(stats_url("2"), &[xg.as_str()]);
    let counters = provider.counters.clone();
    let teams = FakeTeams::default().with("1", "A", "B").with("2", "C", "D");

    let cancel = CancelFlag::new();
    let mut seen: Vec<MatchId> = Vec::new();
    let run = Pipeline::new(test_config(), provider, teams)
        .run_with(
            &[id("1"), id("2")],
            &MetricSet::default(),
            &cancel,
            |progress| {
                seen.push(progress.match_id.clone());
                cancel.cancel();
            },
        )
        .unwrap();

    assert!(run.cancelled);
    assert_eq!(seen, vec![id("1")]);
    assert_eq!(run.records.len(), 1);
    assert_eq!(counters.loads(), 1);
    assert_eq!(counters.released(), 1);
}

#[test]
fn session_released_when_every_match_fails() {
    let provider = FakeProvider::default();
    let counters = provider.counters.clone();

    let run = Pipeline::new(test_config(), provider, FakeTeams::default())
        .run(&[id("x"), id("y")], &MetricSet::default())
        .unwrap();
    assert!(run.records.is_empty());
    assert_eq!(run.failures.len(), 2);
    assert!(run.failures.iter().all(|f| f.kind == FailureKind::Timeout));
    assert_eq!(counters.acquired(), 1);
    assert_eq!(counters.released(), 1);
}

#[test]
fn session_released_when_batch_panics() {
    let provider = FakeProvider::default()
        .with_page(stats_url("1"), &[single_item_json(EXPECTED_GOALS, 1.0, 1.0).as_str()]);
    let counters = provider.counters.clone();
    let teams = FakeTeams::default().with("1", "A", "B");
    let pipeline = Pipeline::new(test_config(), provider, teams);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        pipeline.run_with(
            &[id("1")],
            &MetricSet::default(),
            &CancelFlag::new(),
            |_| panic!("progress sink went away"),
        )
    }));
    assert!(result.is_err());
    assert_eq!(counters.acquired(), 1);
    assert_eq!(counters.released(), 1);
}

#[test]
fn empty_identifier_list_still_releases() {
    let provider = FakeProvider::default();
    let counters = provider.counters.clone();
    let run = Pipeline::new(test_config(), provider, FakeTeams::default())
        .run(&[], &MetricSet::default())
        .unwrap();
    assert!(run.records.is_empty());
    assert!(run.failures.is_empty());
    assert_eq!(counters.released(), 1);
}
