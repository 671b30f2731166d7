//! HTTP existence check for candidate links.

use ela_core::LinkValidator;
use log::debug;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("ela/", env!("CARGO_PKG_VERSION"));

/// A link exists when a GET request answers `200 OK`.
pub struct HttpLinkValidator {
    client: Client,
}

impl HttpLinkValidator {
    pub fn new() -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

impl LinkValidator for HttpLinkValidator {
    fn exists(&self, candidate: &str) -> Result<bool, String> {
        let response = self
            .client
            .get(candidate)
            .send()
            .map_err(|err| format!("request to {candidate} failed: {err}"))?;
        let status = response.status();
        debug!(
            "event=link_check module=cli status=ok link={} http_status={}",
            candidate,
            status.as_u16()
        );
        Ok(status == StatusCode::OK)
    }
}
