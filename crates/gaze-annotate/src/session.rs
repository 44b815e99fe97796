//! Blocking client for the labeling server.
//!
//! The server keeps one labeling session per cookie. Opening the session
//! hits `/`, the session size is scraped from the first label page, and each
//! image's annotations are posted as a JSON string in the `annotations` form
//! field of `/label_image/<index>`.

use std::sync::OnceLock;

use gaze_annotate_core::{AnnotationRecord, AnnotationSink};
use log::{debug, warn};
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::StatusCode;

/// Longest response body excerpt kept in a [`SessionError::Status`].
const BODY_EXCERPT_CHARS: usize = 200;

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("HTTP {status} from {url}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },
}

/// A cookie-bound session on the labeling server.
#[derive(Debug)]
pub struct LabelingSession {
    client: Client,
    base_url: String,
}

impl LabelingSession {
    /// Connect to `base_url` and initialize the session cookie.
    pub fn open(base_url: impl Into<String>) -> Result<Self, SessionError> {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        let client = Client::builder().cookie_store(true).build()?;
        let session = Self { client, base_url };

        let url = session.url("/");
        let resp = session.client.get(&url).send()?;
        check_status(&url, resp)?;
        debug!("labeling session opened at {}", session.base_url);
        Ok(session)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Number of images in this session, as shown on the first label page.
    ///
    /// `None` when the page is unavailable or does not carry the count.
    pub fn session_total(&self) -> Option<usize> {
        let url = self.url("/label_image/0");
        let resp = match self.client.get(&url).send() {
            Ok(resp) => resp,
            Err(err) => {
                warn!("failed to load {url}: {err}");
                return None;
            }
        };
        if resp.status() != StatusCode::OK {
            return None;
        }
        resp.text().ok().as_deref().and_then(parse_session_total)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl AnnotationSink for LabelingSession {
    type Error = SessionError;

    fn submit(&mut self, index: usize, records: &[AnnotationRecord]) -> Result<(), Self::Error> {
        let url = self.url(&format!("/label_image/{index}"));
        let payload = serde_json::to_string(records)?;
        let resp = self
            .client
            .post(&url)
            .form(&[("annotations", payload)])
            .send()?;
        check_status(&url, resp)
    }
}

fn check_status(url: &str, resp: reqwest::blocking::Response) -> Result<(), SessionError> {
    let status = resp.status();
    if status.is_success() || status.is_redirection() {
        return Ok(());
    }
    let body: String = resp
        .text()
        .unwrap_or_default()
        .chars()
        .take(BODY_EXCERPT_CHARS)
        .collect();
    Err(SessionError::Status {
        url: url.to_owned(),
        status,
        body,
    })
}

/// Extract `N` from the first `Image 1 of N` in a label page.
pub fn parse_session_total(html: &str) -> Option<usize> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN
        .get_or_init(|| Regex::new(r"Image\s+1\s+of\s+(\d+)").expect("valid session pattern"));
    re.captures(html)?.get(1)?.as_str().parse().ok()
}
