use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::config::PipelineConfig;
use crate::error::FetchFailure;
use crate::http_client::{build_client, fetch_text};
use crate::model::{MatchId, RawStatisticsDocument};
use crate::normalize::parse_statistics_json;

/// A stateful page-loading session shared by every identifier of one batch.
pub trait RenderSession {
    /// Navigates to `url` and returns the page as currently rendered.
    fn load(&mut self, url: &str) -> Result<String>;

    /// Re-reads the page last loaded, without navigating away.
    fn snapshot(&mut self) -> Result<String>;

    /// Frees the underlying resource. Called exactly once by [`SessionGuard`].
    fn release(&mut self);
}

pub trait SessionProvider {
    type Session: RenderSession;

    fn acquire(&self) -> Result<Self::Session>;
}

/// Owns a session for the length of a batch and releases it on every exit path.
pub struct SessionGuard<S: RenderSession> {
    session: S,
    released: bool,
}

impl<S: RenderSession> SessionGuard<S> {
    pub fn new(session: S) -> Self {
        Self {
            session,
            released: false,
        }
    }

    pub fn session(&mut self) -> &mut S {
        &mut self.session
    }

    pub fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.session.release();
        }
    }
}

impl<S: RenderSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        self.release();
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub poll: Duration,
}

impl WaitPolicy {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            timeout: config.render_timeout,
            poll: config.render_poll,
        }
    }
}

/// Loads the statistics page for one identifier and waits for the payload to show up.
pub fn fetch_statistics<S: RenderSession>(
    session: &mut S,
    url: &str,
    match_id: &MatchId,
    wait: WaitPolicy,
) -> Result<RawStatisticsDocument, FetchFailure> {
    let transport = |source: anyhow::Error| FetchFailure::Transport {
        match_id: match_id.clone(),
        source,
    };

    let started = Instant::now();
    let mut page = session.load(url).map_err(transport)?;
    let payload = loop {
        if let Some(payload) = extract_payload(&page) {
            break payload;
        }
        let waited = started.elapsed();
        if waited >= wait.timeout {
            warn!(%match_id, ?waited, "statistics payload never appeared");
            return Err(FetchFailure::Timeout {
                match_id: match_id.clone(),
                waited,
            });
        }
        thread::sleep(wait.poll.min(wait.timeout - waited));
        page = session.snapshot().map_err(transport)?;
    };

    debug!(
        %match_id,
        bytes = payload.len(),
        elapsed = ?started.elapsed(),
        "statistics payload ready"
    );
    parse_statistics_json(&payload, match_id)
}

/// The readiness marker: a `<pre>` block holding the JSON, or a body that already is JSON.
pub fn extract_payload(page: &str) -> Option<String> {
    let trimmed = page.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Some(trimmed.to_string());
    }
    if !trimmed.starts_with('<') {
        return None;
    }

    let document = Html::parse_document(page);
    let selector = Selector::parse("pre").ok()?;
    let pre = document.select(&selector).next()?;
    let text = pre.text().collect::<String>();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Plain HTTP rendering: the endpoint is re-requested until its payload is complete.
pub struct HttpRenderSession {
    client: Option<Client>,
    current_url: Option<String>,
}

impl HttpRenderSession {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Some(build_client(timeout)?),
            current_url: None,
        })
    }

    fn client(&self) -> Result<&Client> {
        self.client
            .as_ref()
            .context("render session already released")
    }
}

impl RenderSession for HttpRenderSession {
    fn load(&mut self, url: &str) -> Result<String> {
        let body = fetch_text(self.client()?, url).with_context(|| format!("load {url}"))?;
        self.current_url = Some(url.to_string());
        Ok(body)
    }

    fn snapshot(&mut self) -> Result<String> {
        let url = self
            .current_url
            .clone()
            .context("snapshot before any page was loaded")?;
        fetch_text(self.client()?, &url).with_context(|| format!("reload {url}"))
    }

    fn release(&mut self) {
        self.client = None;
        self.current_url = None;
        debug!("render session released");
    }
}

pub struct HttpSessionProvider {
    request_timeout: Duration,
}

impl HttpSessionProvider {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            request_timeout: config.request_timeout,
        }
    }
}

impl SessionProvider for HttpSessionProvider {
    type Session = HttpRenderSession;

    fn acquire(&self) -> Result<HttpRenderSession> {
        HttpRenderSession::new(self.request_timeout).context("could not open render session")
    }
}
