use std::collections::BTreeSet;

use crate::model::EnrichedRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct TeamAverage {
    pub team: String,
    pub metric: String,
    pub home: Option<f64>,
    pub away: Option<f64>,
    pub home_matches: usize,
    pub away_matches: usize,
}

impl TeamAverage {
    /// Mean of the home and away averages; one side alone when the team only played there.
    pub fn overall(&self) -> Option<f64> {
        match (self.home, self.away) {
            (Some(h), Some(a)) => Some((h + a) / 2.0),
            (Some(v), None) | (None, Some(v)) => Some(v),
            (None, None) => None,
        }
    }
}

/// Averages `metric` for `team`, reading `homeValue` where it played at home and
/// `awayValue` where it played away. Only team-attributed rows count.
pub fn team_average(records: &[EnrichedRecord], team: &str, metric: &str) -> TeamAverage {
    let team = team.trim();
    let mut home = Mean::default();
    let mut away = Mean::default();

    for record in metric_rows(records, metric) {
        if record.home.as_deref() == Some(team)
            && let Some(value) = record.home_value
        {
            home.push(value);
        }
        if record.away.as_deref() == Some(team)
            && let Some(value) = record.away_value
        {
            away.push(value);
        }
    }

    TeamAverage {
        team: team.to_string(),
        metric: metric.to_string(),
        home: home.value(),
        away: away.value(),
        home_matches: home.count,
        away_matches: away.count,
    }
}

/// Every team named on a team-attributed `metric` row, sorted by name.
pub fn teams_for_metric(records: &[EnrichedRecord], metric: &str) -> Vec<String> {
    let mut names = BTreeSet::new();
    for record in metric_rows(records, metric) {
        for side in [record.home.as_deref(), record.away.as_deref()] {
            if let Some(name) = side.map(str::trim).filter(|n| !n.is_empty()) {
                names.insert(name.to_string());
            }
        }
    }
    names.into_iter().collect()
}

pub fn all_team_averages(records: &[EnrichedRecord], metric: &str) -> Vec<TeamAverage> {
    teams_for_metric(records, metric)
        .iter()
        .map(|team| team_average(records, team, metric))
        .collect()
}

fn metric_rows<'a>(
    records: &'a [EnrichedRecord],
    metric: &'a str,
) -> impl Iterator<Item = &'a EnrichedRecord> {
    records
        .iter()
        .filter(move |r| r.team_attributed && r.name() == metric)
}

#[derive(Default)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn push(&mut self, value: f64) {
        if value.is_finite() {
            self.sum += value;
            self.count += 1;
        }
    }

    fn value(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}
