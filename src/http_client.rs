use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::Client;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko)";

pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("failed to build http client")
}

/// GET `url` and return the body, treating non-2xx as an error.
pub fn fetch_text(client: &Client, url: &str) -> Result<String> {
    let resp = client.get(url).send().context("request failed")?;
    let status = resp.status();
    let body = resp.text().context("failed reading body")?;
    check_status(status, body)
}

fn check_status(status: StatusCode, body: String) -> Result<String> {
    if !status.is_success() {
        return Err(anyhow::anyhow!("http {}: {}", status, truncate(&body, 200)));
    }
    Ok(body)
}

fn truncate(body: &str, max: usize) -> &str {
    match body.char_indices().nth(max) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
