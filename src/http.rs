//! Async HTTP client wrapping reqwest.
//!
//! Not a browser — just HTTP requests with a browser-like user-agent, a
//! shared cookie store, redirect following, and bounded retry with
//! exponential backoff on 500/502/503/504 and connect errors. The retry
//! policy applies uniformly to every call the autopilot makes.

use crate::error::{PilotError, Result};
use std::time::Duration;

/// Chrome user-agent matching what the platform's own frontend sees.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                          AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/120.0.0.0 Safari/537.36";

const MAX_RETRIES: u32 = 3;

/// Response from an HTTP request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Original requested URL.
    pub url: String,
    /// Final URL after redirects.
    pub final_url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

/// HTTP client shared by the session manager and the SCO runner.
///
/// Clones share the underlying connection pool and cookie store, so a clone
/// taken after login still carries the authenticated session.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    /// Raw `Cookie` header attached to every request when a caller adopted
    /// a pre-captured session instead of logging in.
    raw_cookie: Option<String>,
}

impl HttpClient {
    /// Create a new client with a cookie store and redirect following.
    pub fn new(timeout_ms: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(10))
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            raw_cookie: None,
        }
    }

    /// Attach a raw `Cookie` header to every subsequent request.
    pub fn set_raw_cookie(&mut self, cookie: &str) {
        self.raw_cookie = Some(cookie.trim().to_string());
    }

    /// GET a URL, following redirects. Retries on 500/502/503/504 and on
    /// transport errors, with exponential backoff.
    pub async fn get(
        &self,
        url: &str,
        extra_headers: &[(&str, &str)],
        timeout_ms: u64,
    ) -> Result<HttpResponse> {
        self.send_with_retry(url, extra_headers, timeout_ms, None)
            .await
    }

    /// POST url-encoded form data. Same retry policy as `get`.
    pub async fn post_form(
        &self,
        url: &str,
        form_fields: &[(&str, &str)],
        extra_headers: &[(&str, &str)],
        timeout_ms: u64,
    ) -> Result<HttpResponse> {
        self.send_with_retry(url, extra_headers, timeout_ms, Some(form_fields))
            .await
    }

    fn build_request(
        &self,
        url: &str,
        extra_headers: &[(&str, &str)],
        timeout_ms: u64,
        form_fields: Option<&[(&str, &str)]>,
    ) -> reqwest::RequestBuilder {
        let mut builder = match form_fields {
            Some(fields) => self.client.post(url).form(fields),
            None => self.client.get(url),
        };
        builder = builder.timeout(Duration::from_millis(timeout_ms));
        if let Some(cookie) = &self.raw_cookie {
            builder = builder.header("Cookie", cookie.as_str());
        }
        for (name, value) in extra_headers {
            builder = builder.header(*name, *value);
        }
        builder
    }

    async fn send_with_retry(
        &self,
        url: &str,
        extra_headers: &[(&str, &str)],
        timeout_ms: u64,
        form_fields: Option<&[(&str, &str)]>,
    ) -> Result<HttpResponse> {
        let mut retries = 0u32;

        loop {
            let resp = self
                .build_request(url, extra_headers, timeout_ms, form_fields)
                .send()
                .await;

            match resp {
                Ok(r) => {
                    let status = r.status().as_u16();
                    let final_url = r.url().to_string();

                    if matches!(status, 500 | 502 | 503 | 504) && retries < MAX_RETRIES {
                        retries += 1;
                        let delay = Duration::from_millis(500 * 2u64.pow(retries - 1));
                        tracing::debug!("HTTP {status} from {url}, retry {retries} in {delay:?}");
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    let body = r.text().await.unwrap_or_default();

                    return Ok(HttpResponse {
                        url: url.to_string(),
                        final_url,
                        status,
                        body,
                    });
                }
                Err(e) => {
                    if retries < MAX_RETRIES {
                        retries += 1;
                        let delay = Duration::from_millis(500 * 2u64.pow(retries - 1));
                        tracing::debug!("transport error from {url} ({e}), retry {retries}");
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(PilotError::Transport(e));
                }
            }
        }
    }
}
