use crate::model::{
    EXPECTED_GOALS, EnrichedRecord, INTERNAL_FIELDS, NormalizedRecord, RECORD_TAGS, TeamIdentity,
};

/// Which rows get their `home`/`away` cells replaced by team names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TeamAttribution {
    /// Only the expected-goals row carries team names; other rows keep raw display values.
    #[default]
    ExpectedGoalsOnly,
    AllMetrics,
}

impl TeamAttribution {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "xg" | "expected_goals" | "expected-goals" => Some(Self::ExpectedGoalsOnly),
            "all" | "all_metrics" | "all-metrics" => Some(Self::AllMetrics),
            _ => None,
        }
    }

    fn applies_to(self, name: Option<&str>) -> bool {
        match (self, name) {
            (_, None) => false,
            (Self::ExpectedGoalsOnly, Some(name)) => name == EXPECTED_GOALS,
            (Self::AllMetrics, Some(_)) => true,
        }
    }
}

pub fn enrich(
    records: Vec<NormalizedRecord>,
    identity: &TeamIdentity,
    attribution: TeamAttribution,
) -> Vec<EnrichedRecord> {
    records
        .into_iter()
        .map(|record| enrich_record(record, identity, attribution))
        .collect()
}

fn enrich_record(
    record: NormalizedRecord,
    identity: &TeamIdentity,
    attribution: TeamAttribution,
) -> EnrichedRecord {
    // groupName and the internal block are dropped by not carrying them over; stray item
    // keys with the same names go too.
    let NormalizedRecord {
        match_id,
        period,
        group_name: _,
        mut item,
    } = record;
    for key in INTERNAL_FIELDS.iter().chain(RECORD_TAGS) {
        item.extra.remove(*key);
    }

    let team_attributed = attribution.applies_to(item.name.as_deref());
    let (home, away) = if team_attributed {
        (
            Some(identity.home_team.clone()),
            Some(identity.away_team.clone()),
        )
    } else {
        (item.home, item.away)
    };

    EnrichedRecord {
        match_id,
        period: Some(period),
        name: item.name,
        home,
        away,
        home_value: item.home_value,
        away_value: item.away_value,
        extra: item.extra,
        team_attributed,
    }
}
