use std::env;
use std::time::Duration;

use crate::enrich::TeamAttribution;
use crate::filter::MetricSet;
use crate::model::{MatchId, parse_match_ids};

pub const DEFAULT_STATS_API_BASE: &str = "https://api.sofascore.com/api/v1";
pub const DEFAULT_EVENT_API_BASE: &str = "https://www.sofascore.com/api/v1";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub stats_api_base: String,
    pub event_api_base: String,
    pub render_timeout: Duration,
    pub render_poll: Duration,
    pub request_timeout: Duration,
    pub attribution: TeamAttribution,
    pub metrics: MetricSet,
    pub match_ids: Vec<MatchId>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stats_api_base: DEFAULT_STATS_API_BASE.to_string(),
            event_api_base: DEFAULT_EVENT_API_BASE.to_string(),
            render_timeout: Duration::from_secs(10),
            render_poll: Duration::from_millis(250),
            request_timeout: Duration::from_secs(10),
            attribution: TeamAttribution::default(),
            metrics: MetricSet::default(),
            match_ids: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// Reads `.env.local`, `.env`, then the process environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let secs = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|val| val.trim().parse::<u64>().ok())
                .map(|val| Duration::from_secs(val.max(1)))
                .unwrap_or(default)
        };

        let render_poll = lookup("RENDER_POLL_MS")
            .and_then(|val| val.trim().parse::<u64>().ok())
            .map(|val| Duration::from_millis(val.max(50)))
            .unwrap_or(defaults.render_poll);
        let attribution = lookup("TEAM_ATTRIBUTION")
            .and_then(|val| TeamAttribution::parse(&val))
            .unwrap_or(defaults.attribution);
        let metrics = lookup("STAT_METRICS")
            .map(|val| MetricSet::parse(&val))
            .filter(|set| !set.is_empty())
            .unwrap_or_default();
        let match_ids = lookup("MATCH_IDS")
            .map(|val| parse_match_ids(&val))
            .unwrap_or_default();

        Self {
            stats_api_base: base_url(lookup("STATS_API_BASE"), &defaults.stats_api_base),
            event_api_base: base_url(lookup("EVENT_API_BASE"), &defaults.event_api_base),
            render_timeout: secs("RENDER_TIMEOUT_SECS", defaults.render_timeout),
            render_poll,
            request_timeout: secs("REQUEST_TIMEOUT_SECS", defaults.request_timeout),
            attribution,
            metrics,
            match_ids,
        }
    }

    /// Applies `--ids`, `--metrics` and `--attribution` on top of the env values.
    pub fn apply_args(&mut self, args: &[String]) {
        if let Some(raw) = arg_value(args, "--ids") {
            let ids = parse_match_ids(&raw);
            if !ids.is_empty() {
                self.match_ids = ids;
            }
        }
        if let Some(raw) = arg_value(args, "--metrics") {
            let metrics = MetricSet::parse(&raw);
            if !metrics.is_empty() {
                self.metrics = metrics;
            }
        }
        if let Some(attribution) =
            arg_value(args, "--attribution").and_then(|raw| TeamAttribution::parse(&raw))
        {
            self.attribution = attribution;
        }
    }

    pub fn statistics_url(&self, match_id: &MatchId) -> String {
        format!("{}/event/{match_id}/statistics", self.stats_api_base)
    }

    pub fn event_url(&self, match_id: &MatchId) -> String {
        format!("{}/event/{match_id}", self.event_api_base)
    }
}

/// Accepts both `--flag=value` and `--flag value`.
pub fn arg_value(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&prefix) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

fn base_url(raw: Option<String>, default: &str) -> String {
    raw.map(|val| val.trim().trim_end_matches('/').to_string())
        .filter(|val| !val.is_empty())
        .unwrap_or_else(|| default.to_string())
}
