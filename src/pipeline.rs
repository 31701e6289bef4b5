use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use tracing::{info, info_span, warn};

use crate::config::PipelineConfig;
use crate::document_fetch::{
    HttpSessionProvider, SessionGuard, SessionProvider, WaitPolicy, fetch_statistics,
};
use crate::enrich::enrich;
use crate::error::{FailureReport, FetchFailure, SchemaDriftWarning};
use crate::filter::{MetricSet, filter_full_match, select_metrics};
use crate::model::{MatchId, ResultSet, TeamIdentity};
use crate::normalize::normalize_with_warnings;
use crate::team_fetch::{HttpTeamSource, TeamSource};

/// Checked between identifiers; a batch never stops half way through one match.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
    pub match_id: MatchId,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineRun {
    pub records: ResultSet,
    pub failures: Vec<FailureReport>,
    pub warnings: Vec<SchemaDriftWarning>,
    pub cancelled: bool,
}

pub struct Pipeline<P, T> {
    config: PipelineConfig,
    sessions: P,
    teams: T,
}

pub type HttpPipeline = Pipeline<HttpSessionProvider, HttpTeamSource>;

impl HttpPipeline {
    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        let sessions = HttpSessionProvider::new(&config);
        let teams = HttpTeamSource::new(&config).context("team lookup client")?;
        Ok(Pipeline::new(config, sessions, teams))
    }
}

impl<P: SessionProvider, T: TeamSource> Pipeline<P, T> {
    pub fn new(config: PipelineConfig, sessions: P, teams: T) -> Self {
        Self {
            config,
            sessions,
            teams,
        }
    }

    pub fn run(&self, match_ids: &[MatchId], metrics: &MetricSet) -> Result<PipelineRun> {
        self.run_with(match_ids, metrics, &CancelFlag::new(), |_| {})
    }

    /// Errors only when the render session cannot be opened; per-match problems land in
    /// [`PipelineRun::failures`].
    pub fn run_with(
        &self,
        match_ids: &[MatchId],
        metrics: &MetricSet,
        cancel: &CancelFlag,
        mut on_progress: impl FnMut(Progress),
    ) -> Result<PipelineRun> {
        let session = self.sessions.acquire().context("render session unavailable")?;
        let mut guard = SessionGuard::new(session);
        let mut run = PipelineRun::default();
        let mut collected: ResultSet = Vec::new();

        for (idx, match_id) in match_ids.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(remaining = match_ids.len() - idx, "batch cancelled");
                run.cancelled = true;
                break;
            }
            on_progress(Progress {
                current: idx + 1,
                total: match_ids.len(),
                match_id: match_id.clone(),
            });

            let _span = info_span!("match", %match_id).entered();
            match self.process_match(guard.session(), match_id, &mut run) {
                Ok(records) => collected.extend(records),
                Err(failure) => {
                    warn!(%match_id, error = %failure, "skipping match");
                    run.failures.push(FailureReport::from(&failure));
                }
            }
        }

        guard.release();
        run.records = select_metrics(collected, metrics);
        info!(
            matches = match_ids.len(),
            records = run.records.len(),
            failures = run.failures.len(),
            "batch finished"
        );
        Ok(run)
    }

    fn process_match(
        &self,
        session: &mut P::Session,
        match_id: &MatchId,
        run: &mut PipelineRun,
    ) -> Result<ResultSet, FetchFailure> {
        let url = self.config.statistics_url(match_id);
        let doc = fetch_statistics(session, &url, match_id, WaitPolicy::from_config(&self.config))?;
        let normalized = normalize_with_warnings(&doc, match_id);
        run.warnings.extend(normalized.warnings);

        let identity = match self.teams.fetch_identity(match_id) {
            Ok(identity) => identity,
            Err(failure) => {
                warn!(%match_id, error = %failure, "continuing without team names");
                run.failures.push(FailureReport::from(&failure));
                TeamIdentity::blank()
            }
        };

        let enriched = enrich(normalized.records, &identity, self.config.attribution);
        Ok(filter_full_match(enriched))
    }
}
