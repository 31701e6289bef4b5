use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::model::MatchId;

/// Why a single identifier contributed nothing (or only partial rows) to a run.
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("statistics page for {match_id} not ready after {waited:?}")]
    Timeout { match_id: MatchId, waited: Duration },
    #[error("statistics payload for {match_id} is malformed: {reason}")]
    MalformedDocument { match_id: MatchId, reason: String },
    #[error("team lookup for {match_id} failed: {reason}")]
    TeamLookup { match_id: MatchId, reason: String },
    #[error("request for {match_id} failed: {source:#}")]
    Transport {
        match_id: MatchId,
        #[source]
        source: anyhow::Error,
    },
}

impl FetchFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchFailure::Timeout { .. } => FailureKind::Timeout,
            FetchFailure::MalformedDocument { .. } => FailureKind::MalformedDocument,
            FetchFailure::TeamLookup { .. } => FailureKind::TeamLookup,
            FetchFailure::Transport { .. } => FailureKind::Transport,
        }
    }

    pub fn match_id(&self) -> &MatchId {
        match self {
            FetchFailure::Timeout { match_id, .. }
            | FetchFailure::MalformedDocument { match_id, .. }
            | FetchFailure::TeamLookup { match_id, .. }
            | FetchFailure::Transport { match_id, .. } => match_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FailureKind {
    Timeout,
    MalformedDocument,
    TeamLookup,
    Transport,
}

impl FailureKind {
    pub fn label(self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::MalformedDocument => "malformed",
            FailureKind::TeamLookup => "team lookup",
            FailureKind::Transport => "transport",
        }
    }
}

/// What the caller gets back for each failed identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    pub match_id: MatchId,
    pub kind: FailureKind,
    pub message: String,
}

impl From<&FetchFailure> for FailureReport {
    fn from(failure: &FetchFailure) -> Self {
        Self {
            match_id: failure.match_id().clone(),
            kind: failure.kind(),
            message: failure.to_string(),
        }
    }
}

/// A field the payload should have carried but did not; a default was used instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaDriftWarning {
    pub match_id: MatchId,
    pub field: &'static str,
    pub substituted: &'static str,
}
