#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Result, anyhow};

use matchstats_terminal::config::PipelineConfig;
use matchstats_terminal::document_fetch::{RenderSession, SessionProvider};
use matchstats_terminal::error::FetchFailure;
use matchstats_terminal::model::{MatchId, TeamIdentity};
use matchstats_terminal::team_fetch::TeamSource;

pub const LOADING_SHELL: &str = "<html><body><div id=\"app\">Loading…</div></body></html>";

pub fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

pub fn id(raw: &str) -> MatchId {
    MatchId::new(raw).expect("non-empty id")
}

pub fn test_config() -> PipelineConfig {
    PipelineConfig {
        stats_api_base: "http://stats.test".to_string(),
        event_api_base: "http://events.test".to_string(),
        render_timeout: Duration::from_millis(40),
        render_poll: Duration::from_millis(5),
        ..PipelineConfig::default()
    }
}

pub fn stats_url(raw: &str) -> String {
    test_config().statistics_url(&id(raw))
}

/// Counts acquisitions and releases across every session the provider hands out.
#[derive(Clone, Default)]
pub struct SessionCounters {
    pub acquired: Arc<AtomicUsize>,
    pub released: Arc<AtomicUsize>,
    pub loads: Arc<AtomicUsize>,
}

impl SessionCounters {
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

/// Serves scripted renderings: the first on `load`, later ones on each `snapshot`.
#[derive(Clone, Default)]
pub struct FakeProvider {
    pub pages: HashMap<String, Vec<String>>,
    pub transport_errors: Vec<String>,
    pub fail_acquire: bool,
    pub counters: SessionCounters,
}

impl FakeProvider {
    pub fn with_page(mut self, url: String, renderings: &[&str]) -> Self {
        self.pages
            .insert(url, renderings.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_transport_error(mut self, url: String) -> Self {
        self.transport_errors.push(url);
        self
    }
}

pub struct FakeSession {
    pages: HashMap<String, Vec<String>>,
    transport_errors: Vec<String>,
    counters: SessionCounters,
    current: Option<(String, usize)>,
}

impl SessionProvider for FakeProvider {
    type Session = FakeSession;

    fn acquire(&self) -> Result<FakeSession> {
        if self.fail_acquire {
            return Err(anyhow!("browser failed to start"));
        }
        self.counters.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSession {
            pages: self.pages.clone(),
            transport_errors: self.transport_errors.clone(),
            counters: self.counters.clone(),
            current: None,
        })
    }
}

impl FakeSession {
    fn rendering(&self) -> String {
        let Some((url, step)) = &self.current else {
            return String::new();
        };
        match self.pages.get(url) {
            Some(renderings) if !renderings.is_empty() => {
                renderings[(*step).min(renderings.len() - 1)].clone()
            }
            _ => LOADING_SHELL.to_string(),
        }
    }
}

impl RenderSession for FakeSession {
    fn load(&mut self, url: &str) -> Result<String> {
        self.counters.loads.fetch_add(1, Ordering::SeqCst);
        if self.transport_errors.iter().any(|u| u == url) {
            return Err(anyhow!("connection reset"));
        }
        self.current = Some((url.to_string(), 0));
        Ok(self.rendering())
    }

    fn snapshot(&mut self) -> Result<String> {
        if let Some((_, step)) = self.current.as_mut() {
            *step += 1;
        }
        Ok(self.rendering())
    }

    fn release(&mut self) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakeTeams {
    pub teams: HashMap<String, TeamIdentity>,
}

impl FakeTeams {
    pub fn with(mut self, raw_id: &str, home: &str, away: &str) -> Self {
        self.teams
            .insert(raw_id.to_string(), TeamIdentity::new(home, away));
        self
    }
}

impl TeamSource for FakeTeams {
    fn fetch_identity(&self, match_id: &MatchId) -> Result<TeamIdentity, FetchFailure> {
        self.teams
            .get(match_id.as_str())
            .cloned()
            .ok_or_else(|| FetchFailure::TeamLookup {
                match_id: match_id.clone(),
                reason: "missing `event.homeTeam.name`".to_string(),
            })
    }
}

/// A one-item statistics body for the "ALL" period.
pub fn single_item_json(name: &str, home_value: f64, away_value: f64) -> String {
    format!(
        r#"{{"statistics":[{{"period":"ALL","groups":[{{"groupName":"{name}","statisticsItems":[{{"name":"{name}","home":"{home_value}","away":"{away_value}","homeValue":{home_value},"awayValue":{away_value},"compareCode":1,"key":"k"}}]}}]}}]}}"#
    )
}
