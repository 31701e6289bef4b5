use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{FetchFailure, SchemaDriftWarning};
use crate::model::{
    MatchId, NormalizedRecord, RECORD_TAGS, RawStatisticsDocument, StatItem, UNKNOWN,
};

#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub records: Vec<NormalizedRecord>,
    pub warnings: Vec<SchemaDriftWarning>,
}

pub fn parse_statistics_json(
    raw: &str,
    match_id: &MatchId,
) -> Result<RawStatisticsDocument, FetchFailure> {
    let malformed = |reason: String| FetchFailure::MalformedDocument {
        match_id: match_id.clone(),
        reason,
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(malformed("empty payload".to_string()));
    }
    let root: Value = serde_json::from_str(trimmed)
        .map_err(|err| malformed(format!("invalid json: {err}")))?;
    if !root.is_object() {
        return Err(malformed(format!("expected a json object, got {}", json_kind(&root))));
    }
    if let Some(error) = root.get("error") {
        return Err(malformed(format!("service returned an error body: {error}")));
    }
    serde_json::from_value(root)
        .map_err(|err| malformed(format!("unexpected statistics shape: {err}")))
}

/// Flattens every period block into one record per statistics item.
pub fn normalize(doc: &RawStatisticsDocument, match_id: &MatchId) -> Vec<NormalizedRecord> {
    normalize_with_warnings(doc, match_id).records
}

pub fn normalize_with_warnings(doc: &RawStatisticsDocument, match_id: &MatchId) -> Normalized {
    let mut out = Normalized::default();
    if doc.statistics.is_none() {
        out.drift(match_id, "statistics", "no blocks");
    }

    for block in doc.blocks() {
        let period = match block.period.as_deref() {
            Some(period) => period,
            None => {
                out.drift(match_id, "period", UNKNOWN);
                UNKNOWN
            }
        };
        let Some(groups) = block.groups.as_deref() else {
            out.drift(match_id, "groups", "[]");
            continue;
        };

        for group in groups {
            let group_name = match group.group_name.as_deref() {
                Some(name) => name,
                None => {
                    out.drift(match_id, "groupName", UNKNOWN);
                    UNKNOWN
                }
            };
            let Some(items) = group.statistics_items.as_deref() else {
                out.drift(match_id, "statisticsItems", "[]");
                continue;
            };
            out.records.extend(items.iter().map(|item| NormalizedRecord {
                match_id: match_id.clone(),
                period: period.to_string(),
                group_name: group_name.to_string(),
                item: untagged(item),
            }));
        }
    }

    debug!(%match_id, records = out.records.len(), "normalized statistics");
    out
}

impl Normalized {
    fn drift(&mut self, match_id: &MatchId, field: &'static str, substituted: &'static str) {
        warn!(%match_id, field, substituted, "statistics field missing, using default");
        self.warnings.push(SchemaDriftWarning {
            match_id: match_id.clone(),
            field,
            substituted,
        });
    }
}

/// The block's tags take precedence over item keys of the same name.
fn untagged(item: &StatItem) -> StatItem {
    let mut item = item.clone();
    for tag in RECORD_TAGS {
        item.extra.remove(*tag);
    }
    item
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
