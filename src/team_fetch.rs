use anyhow::Result;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::PipelineConfig;
use crate::error::FetchFailure;
use crate::http_client::{build_client, fetch_text};
use crate::model::{MatchId, TeamIdentity};

pub trait TeamSource {
    fn fetch_identity(&self, match_id: &MatchId) -> Result<TeamIdentity, FetchFailure>;
}

pub struct HttpTeamSource {
    client: Client,
    config: PipelineConfig,
}

impl HttpTeamSource {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.request_timeout)?,
            config: config.clone(),
        })
    }
}

impl TeamSource for HttpTeamSource {
    fn fetch_identity(&self, match_id: &MatchId) -> Result<TeamIdentity, FetchFailure> {
        let url = self.config.event_url(match_id);
        let body = fetch_text(&self.client, &url).map_err(|err| FetchFailure::TeamLookup {
            match_id: match_id.clone(),
            reason: format!("{err:#}"),
        })?;
        let identity = parse_event_json(&body, match_id)?;
        debug!(%match_id, home = %identity.home_team, away = %identity.away_team, "team identity");
        Ok(identity)
    }
}

#[derive(Debug, Deserialize)]
struct EventResponse {
    event: Option<EventBody>,
}

#[derive(Debug, Deserialize)]
struct EventBody {
    #[serde(rename = "homeTeam")]
    home_team: Option<EventTeam>,
    #[serde(rename = "awayTeam")]
    away_team: Option<EventTeam>,
}

#[derive(Debug, Deserialize)]
struct EventTeam {
    name: Option<String>,
}

/// Pulls `event.homeTeam.name` and `event.awayTeam.name` out of the event-detail body.
pub fn parse_event_json(raw: &str, match_id: &MatchId) -> Result<TeamIdentity, FetchFailure> {
    let lookup = |reason: String| FetchFailure::TeamLookup {
        match_id: match_id.clone(),
        reason,
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(lookup("empty event response".to_string()));
    }
    let data: EventResponse =
        serde_json::from_str(trimmed).map_err(|err| lookup(format!("invalid event json: {err}")))?;
    let event = data.event.ok_or_else(|| lookup("missing `event`".to_string()))?;
    let home_team = team_name(event.home_team)
        .ok_or_else(|| lookup("missing `event.homeTeam.name`".to_string()))?;
    let away_team = team_name(event.away_team)
        .ok_or_else(|| lookup("missing `event.awayTeam.name`".to_string()))?;

    Ok(TeamIdentity {
        home_team,
        away_team,
    })
}

fn team_name(team: Option<EventTeam>) -> Option<String> {
    let name = team?.name?;
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
