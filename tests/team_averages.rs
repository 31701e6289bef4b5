use matchstats_terminal::model::{CORNER_KICKS, EXPECTED_GOALS, EnrichedRecord, MatchId};
use matchstats_terminal::team_averages::{all_team_averages, team_average, teams_for_metric};
use serde_json::Map;

fn xg(id: &str, home: &str, away: &str, home_value: f64, away_value: f64) -> EnrichedRecord {
    EnrichedRecord {
        match_id: MatchId::new(id).unwrap(),
        period: Some("ALL".to_string()),
        name: Some(EXPECTED_GOALS.to_string()),
        home: Some(home.to_string()),
        away: Some(away.to_string()),
        home_value: Some(home_value),
        away_value: Some(away_value),
        extra: Map::new(),
        team_attributed: true,
    }
}

fn sample() -> Vec<EnrichedRecord> {
    vec![
        xg("1", "Fenerbahçe", "Galatasaray", 1.8, 0.6),
        xg("2", "Beşiktaş", "Fenerbahçe", 1.1, 2.0),
        xg("3", "Fenerbahçe", "Trabzonspor", 1.2, 0.9),
        EnrichedRecord {
            name: Some(CORNER_KICKS.to_string()),
            home: Some("7".to_string()),
            away: Some("3".to_string()),
            team_attributed: false,
            ..xg("1", "", "", 7.0, 3.0)
        },
    ]
}

#[test]
fn averages_split_home_and_away() {
    let avg = team_average(&sample(), "Fenerbahçe", EXPECTED_GOALS);
    assert_eq!(avg.home_matches, 2);
    assert_eq!(avg.away_matches, 1);
    assert!((avg.home.unwrap() - 1.5).abs() < 1e-9);
    assert!((avg.away.unwrap() - 2.0).abs() < 1e-9);
    assert!((avg.overall().unwrap() - 1.75).abs() < 1e-9);
}

#[test]
fn one_sided_team_uses_that_side_only() {
    let avg = team_average(&sample(), "Galatasaray", EXPECTED_GOALS);
    assert_eq!(avg.home, None);
    assert_eq!(avg.overall(), avg.away);
}

#[test]
fn unknown_team_has_no_average() {
    let avg = team_average(&sample(), "Göztepe", EXPECTED_GOALS);
    assert_eq!(avg.overall(), None);
    assert_eq!(avg.home_matches + avg.away_matches, 0);
}

#[test]
fn teams_come_from_the_metric_rows_only() {
    let teams = teams_for_metric(&sample(), EXPECTED_GOALS);
    assert_eq!(
        teams,
        vec!["Beşiktaş", "Fenerbahçe", "Galatasaray", "Trabzonspor"]
    );
    // Corner rows carry raw values, not team names.
    assert!(teams_for_metric(&sample(), CORNER_KICKS).is_empty());
    assert_eq!(all_team_averages(&sample(), EXPECTED_GOALS).len(), 4);
}
