//! Probe fetcher
//!
//! One bounded-time request against one candidate URL, presented with a
//! browser-like identity and the referer the origin expects. Outcomes are
//! classified, never retried; moving on to the next candidate is the
//! caller's decision.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::Client;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, ACCEPT_RANGES, AUTHORIZATION, CONTENT_LENGTH, CONTENT_RANGE,
    CONTENT_TYPE, HeaderMap, RANGE, REFERER,
};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

use crate::config::{MediaConfig, UpstreamConfig};
use crate::domain::{Candidate, MediationError, ProbeErrorKind, ProbeOutcome};

/// Per-probe options forwarded from the inbound request
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    pub timeout: Duration,
    pub range: Option<String>,
    pub authorization: Option<String>,
    /// Bodies above this are abandoned with [`ProbeErrorKind::TooLarge`]
    pub max_body_bytes: Option<usize>,
}

impl ProbeRequest {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            range: None,
            authorization: None,
            max_body_bytes: None,
        }
    }

    pub fn with_range(mut self, range: impl Into<String>) -> Self {
        self.range = Some(range.into());
        self
    }

    pub fn with_authorization(mut self, authorization: impl Into<String>) -> Self {
        self.authorization = Some(authorization.into());
        self
    }

    pub fn with_body_limit(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = Some(max_body_bytes);
        self
    }
}

/// An upstream response whose body is passed through as it arrives
pub struct StreamedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub content_range: Option<String>,
    pub accept_ranges: Option<String>,
    pub content_length: Option<u64>,
    pub body: BoxStream<'static, Result<Bytes, std::io::Error>>,
}

impl std::fmt::Debug for StreamedResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamedResponse")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .field("content_range", &self.content_range)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Candidate probing seam
#[async_trait]
pub trait Prober: Send + Sync {
    /// Fetch `candidate` once and classify the result
    async fn probe(&self, candidate: &Candidate, request: &ProbeRequest) -> ProbeOutcome;

    /// Open `url` and hand back the body as a stream; only the response head
    /// is bounded by the request timeout
    async fn stream(
        &self,
        url: &str,
        request: &ProbeRequest,
    ) -> Result<StreamedResponse, MediationError>;
}

/// reqwest-backed prober
pub struct HttpProbeFetcher {
    client: Client,
    referers: HashMap<String, String>,
}

fn header_string(headers: &HeaderMap, name: reqwest::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

enum BodyError {
    OverLimit,
    Transfer(reqwest::Error),
}

/// Collect a body chunk by chunk, giving up once it passes `limit`
async fn read_bounded(response: reqwest::Response, limit: usize) -> Result<Bytes, BodyError> {
    let mut chunks = response.bytes_stream();
    let mut body = BytesMut::new();
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(BodyError::Transfer)?;
        if body.len() + chunk.len() > limit {
            return Err(BodyError::OverLimit);
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body.freeze())
}

impl HttpProbeFetcher {
    pub fn new(user_agent: &str, referers: HashMap<String, String>) -> Self {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .unwrap_or_else(|e| {
                error!(error = %e, "Failed to build probe HTTP client, using default client");
                Client::new()
            });

        Self { client, referers }
    }

    pub fn from_config(upstream: &UpstreamConfig, media: &MediaConfig) -> Self {
        Self::new(&upstream.user_agent, media.referers.clone())
    }

    /// Referer the origin of `url` expects: configured per host, else the
    /// origin's own root
    pub fn referer_for(&self, url: &Url) -> Option<String> {
        let host = url.host_str()?;
        if let Some(referer) = self.referers.get(host) {
            return Some(referer.clone());
        }
        Some(format!("{}/", url.origin().ascii_serialization()))
    }

    fn build(&self, url: &Url, request: &ProbeRequest) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .get(url.as_str())
            .header(ACCEPT, "*/*")
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9");

        if let Some(referer) = self.referer_for(url) {
            builder = builder.header(REFERER, referer);
        }
        if let Some(range) = &request.range {
            builder = builder.header(RANGE, range);
        }
        if let Some(authorization) = &request.authorization {
            builder = builder.header(AUTHORIZATION, authorization);
        }
        builder
    }

    fn classify(err: &reqwest::Error) -> ProbeErrorKind {
        if err.is_timeout() {
            ProbeErrorKind::Timeout
        } else {
            ProbeErrorKind::Network
        }
    }
}

#[async_trait]
impl Prober for HttpProbeFetcher {
    async fn probe(&self, candidate: &Candidate, request: &ProbeRequest) -> ProbeOutcome {
        let url = match Url::parse(&candidate.url) {
            Ok(url) => url,
            Err(e) => {
                debug!(candidate = %candidate.url, "Unparseable candidate: {}", e);
                return ProbeOutcome::failure(candidate.clone(), None, ProbeErrorKind::Network);
            }
        };

        let response = match self.build(&url, request).timeout(request.timeout).send().await {
            Ok(response) => response,
            Err(e) => {
                let kind = Self::classify(&e);
                debug!(candidate = %candidate.url, kind = kind.as_str(), "Probe failed: {}", e);
                return ProbeOutcome::failure(candidate.clone(), None, kind);
            }
        };

        let status = response.status().as_u16();
        if !response.status().is_success() {
            debug!(candidate = %candidate.url, status, "Probe rejected by origin");
            return ProbeOutcome::failure(candidate.clone(), Some(status), ProbeErrorKind::Status);
        }

        let headers = response.headers().clone();
        let declared_length: Option<u64> =
            header_string(&headers, CONTENT_LENGTH).and_then(|value| value.parse().ok());
        if let (Some(limit), Some(length)) = (request.max_body_bytes, declared_length)
            && length > limit as u64
        {
            debug!(candidate = %candidate.url, length, limit, "Probe body over limit");
            return ProbeOutcome::failure(candidate.clone(), Some(status), ProbeErrorKind::TooLarge);
        }

        let body = match request.max_body_bytes {
            Some(limit) => read_bounded(response, limit).await,
            None => response.bytes().await.map_err(BodyError::Transfer),
        };

        match body {
            Ok(body) => {
                debug!(candidate = %candidate.url, status, bytes = body.len(), "Probe succeeded");
                let mut outcome = ProbeOutcome::success(
                    candidate.clone(),
                    status,
                    body,
                    header_string(&headers, CONTENT_TYPE),
                );
                outcome.content_range = header_string(&headers, CONTENT_RANGE);
                outcome.accept_ranges = header_string(&headers, ACCEPT_RANGES);
                outcome
            }
            Err(BodyError::OverLimit) => {
                debug!(candidate = %candidate.url, "Probe body grew past limit");
                ProbeOutcome::failure(candidate.clone(), Some(status), ProbeErrorKind::TooLarge)
            }
            Err(BodyError::Transfer(e)) => {
                let kind = Self::classify(&e);
                debug!(candidate = %candidate.url, kind = kind.as_str(), "Probe body failed: {}", e);
                ProbeOutcome::failure(candidate.clone(), Some(status), kind)
            }
        }
    }

    async fn stream(
        &self,
        url: &str,
        request: &ProbeRequest,
    ) -> Result<StreamedResponse, MediationError> {
        let parsed = Url::parse(url)
            .map_err(|e| MediationError::validation(format!("Invalid URL: {}", e)))?;

        // Bound only the response head; the body may legitimately take longer
        let send = self.build(&parsed, request).send();

        let response = tokio::time::timeout(request.timeout, send)
            .await
            .map_err(|_| MediationError::UpstreamTimeout {
                seconds: request.timeout.as_secs(),
            })??;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            return Err(MediationError::upstream(
                Some(status),
                format!("Origin answered {}", status),
            ));
        }

        let headers = response.headers().clone();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(std::io::Error::other))
            .boxed();

        Ok(StreamedResponse {
            status,
            content_type: header_string(&headers, CONTENT_TYPE),
            content_range: header_string(&headers, CONTENT_RANGE),
            accept_ranges: header_string(&headers, ACCEPT_RANGES),
            content_length: header_string(&headers, CONTENT_LENGTH)
                .and_then(|value| value.parse().ok()),
            body,
        })
    }
}
