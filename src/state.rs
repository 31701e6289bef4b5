use std::collections::VecDeque;

use crate::error::FailureReport;
use crate::filter::MetricSet;
use crate::model::{EXPECTED_GOALS, MatchId, ResultSet};
use crate::pipeline::{PipelineRun, Progress};
use crate::team_averages::{TeamAverage, all_team_averages};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Idle,
    Running {
        current: usize,
        total: usize,
        match_id: MatchId,
    },
    Finished {
        cancelled: bool,
    },
    Aborted(String),
}

#[derive(Debug)]
pub struct AppState {
    pub status: RunStatus,
    pub records: ResultSet,
    pub failures: Vec<FailureReport>,
    pub warnings: usize,
    pub metrics: Vec<String>,
    pub metric_idx: usize,
    pub selected: usize,
    pub help_overlay: bool,
    pub logs: VecDeque<String>,
}

impl AppState {
    pub fn new(metrics: &MetricSet) -> Self {
        let metrics = metrics
            .sorted()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        // Averages make most sense for xG, so start there when it was requested.
        let metric_idx = metrics
            .iter()
            .position(|m| m == EXPECTED_GOALS)
            .unwrap_or(0);
        Self {
            status: RunStatus::Idle,
            records: Vec::new(),
            failures: Vec::new(),
            warnings: 0,
            metrics,
            metric_idx,
            selected: 0,
            help_overlay: false,
            logs: VecDeque::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.status, RunStatus::Running { .. })
    }

    pub fn current_metric(&self) -> Option<&str> {
        self.metrics.get(self.metric_idx).map(String::as_str)
    }

    pub fn cycle_metric(&mut self) {
        if !self.metrics.is_empty() {
            self.metric_idx = (self.metric_idx + 1) % self.metrics.len();
        }
    }

    pub fn averages(&self) -> Vec<TeamAverage> {
        match self.current_metric() {
            Some(metric) => all_team_averages(&self.records, metric),
            None => Vec::new(),
        }
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.records.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn to_run(&self) -> PipelineRun {
        PipelineRun {
            records: self.records.clone(),
            failures: self.failures.clone(),
            warnings: Vec::new(),
            cancelled: matches!(self.status, RunStatus::Finished { cancelled: true }),
        }
    }
}

#[derive(Debug)]
pub enum Delta {
    Started { total: usize },
    Progress(Progress),
    Finished(PipelineRun),
    Aborted(String),
    Log(String),
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::Started { total } => {
            state.records.clear();
            state.failures.clear();
            state.warnings = 0;
            state.selected = 0;
            state.push_log(format!("[INFO] Fetching {total} matches"));
        }
        Delta::Progress(progress) => {
            state.status = RunStatus::Running {
                current: progress.current,
                total: progress.total,
                match_id: progress.match_id,
            };
        }
        Delta::Finished(run) => {
            for failure in &run.failures {
                state.push_log(format!(
                    "[WARN] {} {}: {}",
                    failure.match_id,
                    failure.kind.label(),
                    failure.message
                ));
            }
            state.push_log(format!(
                "[INFO] {} records, {} failures{}",
                run.records.len(),
                run.failures.len(),
                if run.cancelled { " (cancelled)" } else { "" }
            ));
            state.status = RunStatus::Finished {
                cancelled: run.cancelled,
            };
            state.records = run.records;
            state.failures = run.failures;
            state.warnings = run.warnings.len();
            state.selected = state.selected.min(state.records.len().saturating_sub(1));
        }
        Delta::Aborted(reason) => {
            state.push_log(format!("[ERROR] {reason}"));
            state.status = RunStatus::Aborted(reason);
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
