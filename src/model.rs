use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub const PERIOD_ALL: &str = "ALL";
pub const UNKNOWN: &str = "UNKNOWN";
pub const EXPECTED_GOALS: &str = "Expected goals";
pub const CORNER_KICKS: &str = "Corner kicks";

/// Metrics selected when the caller does not name any.
pub const DEFAULT_METRICS: &[&str] = &[EXPECTED_GOALS, CORNER_KICKS];

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(String);

impl MatchId {
    /// Returns `None` for blank tokens.
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for MatchId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Splits a comma/semicolon/whitespace separated list, dropping blanks. Repeats are kept
/// and fetched again, in the order given.
pub fn parse_match_ids(raw: &str) -> Vec<MatchId> {
    raw.split([',', ';', ' ', '\n', '\t'])
        .filter_map(MatchId::new)
        .collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStatisticsDocument {
    #[serde(default)]
    pub statistics: Option<StatisticsBlocks>,
}

impl RawStatisticsDocument {
    pub fn blocks(&self) -> &[PeriodBlock] {
        match &self.statistics {
            Some(StatisticsBlocks::Many(blocks)) => blocks,
            Some(StatisticsBlocks::One(block)) => std::slice::from_ref(block),
            None => &[],
        }
    }
}

/// The live endpoint returns one block per period; older payloads carry a single object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StatisticsBlocks {
    Many(Vec<PeriodBlock>),
    One(PeriodBlock),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeriodBlock {
    #[serde(default, deserialize_with = "lenient_text")]
    pub period: Option<String>,
    #[serde(default)]
    pub groups: Option<Vec<StatGroup>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatGroup {
    #[serde(rename = "groupName", default, deserialize_with = "lenient_text")]
    pub group_name: Option<String>,
    #[serde(rename = "statisticsItems", default)]
    pub statistics_items: Option<Vec<StatItem>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatItem {
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub home: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub away: Option<String>,
    #[serde(
        rename = "homeValue",
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub home_value: Option<f64>,
    #[serde(
        rename = "awayValue",
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub away_value: Option<f64>,
    #[serde(flatten)]
    pub internal: InternalFields,
    /// Anything else the service sends along, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Bookkeeping columns the service attaches to every item. Never surfaced downstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InternalFields {
    #[serde(rename = "compareCode", default, skip_serializing_if = "Option::is_none")]
    pub compare_code: Option<Value>,
    #[serde(rename = "statisticsType", default, skip_serializing_if = "Option::is_none")]
    pub statistics_type: Option<Value>,
    #[serde(rename = "valueType", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<Value>,
    #[serde(rename = "renderType", default, skip_serializing_if = "Option::is_none")]
    pub render_type: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Value>,
    #[serde(rename = "homeTotal", default, skip_serializing_if = "Option::is_none")]
    pub home_total: Option<Value>,
    #[serde(rename = "awayTotal", default, skip_serializing_if = "Option::is_none")]
    pub away_total: Option<Value>,
}

/// Strings pass through, numbers and booleans are rendered as text, anything else is `None`.
/// One odd cell must not sink the rest of the match.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Numbers, or strings that parse as one; anything else is `None`.
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    })
}

/// Record-level tags set by normalization. An item key with one of these names is dropped
/// so it cannot shadow the tag.
pub const RECORD_TAGS: &[&str] = &["match_id", "period", "groupName"];

/// Field names removed by enrichment. `groupName` is added by normalization.
pub const INTERNAL_FIELDS: &[&str] = &[
    "compareCode",
    "statisticsType",
    "valueType",
    "renderType",
    "key",
    "groupName",
    "homeTotal",
    "awayTotal",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub match_id: MatchId,
    pub period: String,
    #[serde(rename = "groupName")]
    pub group_name: String,
    #[serde(flatten)]
    pub item: StatItem,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRecord {
    pub match_id: MatchId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub away: Option<String>,
    #[serde(rename = "homeValue", skip_serializing_if = "Option::is_none")]
    pub home_value: Option<f64>,
    #[serde(rename = "awayValue", skip_serializing_if = "Option::is_none")]
    pub away_value: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Set when `home`/`away` hold team names rather than display values.
    #[serde(skip)]
    pub team_attributed: bool,
}

impl EnrichedRecord {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Keys this record exposes when serialized, in serialization order.
    pub fn field_names(&self) -> Vec<String> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamIdentity {
    pub home_team: String,
    pub away_team: String,
}

impl TeamIdentity {
    pub fn new(home: impl Into<String>, away: impl Into<String>) -> Self {
        Self {
            home_team: home.into(),
            away_team: away.into(),
        }
    }

    /// Used when the event lookup failed but the batch carries on.
    pub fn blank() -> Self {
        Self::default()
    }
}

pub type ResultSet = Vec<EnrichedRecord>;
