use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::{debug, warn};

use crate::error::BridgeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    // Connection could not be established, the request never left.
    Connect(String),
    Other(String),
}

impl From<TransportError> for BridgeError {
    fn from(value: TransportError) -> Self {
        match value {
            TransportError::Connect(message) | TransportError::Other(message) => {
                BridgeError::Http(message)
            }
        }
    }
}

pub trait Transport: Send + Sync {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpReply, TransportError>;
    fn get_basic_auth(
        &self,
        url: &str,
        username: &str,
        password: &str,
    ) -> Result<HttpReply, TransportError>;
    fn post(&self, url: &str, headers: HeaderMap, body: Vec<u8>) -> Result<HttpReply, TransportError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub connect_retries: usize,
    pub backoff_factor: Duration,
    pub backoff_max: Duration,
    pub server_error_pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            connect_retries: 3,
            backoff_factor: Duration::from_secs(15),
            backoff_max: Duration::from_secs(120),
            server_error_pause: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn immediate() -> Self {
        Self {
            backoff_factor: Duration::ZERO,
            backoff_max: Duration::ZERO,
            server_error_pause: Duration::ZERO,
            ..Self::default()
        }
    }

    // `retry` is 1-based; the first retry goes out immediately.
    pub fn backoff(&self, retry: usize) -> Duration {
        if retry <= 1 {
            return Duration::ZERO;
        }
        let exponent = u32::try_from(retry - 1).unwrap_or(u32::MAX).min(16);
        self.backoff_factor
            .saturating_mul(1u32 << exponent)
            .min(self.backoff_max)
    }

    pub fn send_with_retries<F>(&self, mut make_req: F) -> Result<HttpReply, BridgeError>
    where
        F: FnMut() -> Result<HttpReply, TransportError>,
    {
        let mut retry = 0usize;
        loop {
            match make_req() {
                Ok(reply) => return Ok(reply),
                Err(TransportError::Connect(message)) if retry < self.connect_retries => {
                    retry += 1;
                    let delay = self.backoff(retry);
                    warn!(retry, delay_ms = delay.as_millis() as u64, %message, "connection failed, retrying");
                    pause(delay);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

pub fn pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}

pub fn url_path_join(segments: &[&str]) -> String {
    segments
        .iter()
        .map(|segment| segment.trim_matches('/'))
        .collect::<Vec<_>>()
        .join("/")
}

pub fn user_agent() -> Result<HeaderMap, BridgeError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&format!("brapi2biosamples/{}", env!("CARGO_PKG_VERSION")))
            .map_err(|err| BridgeError::Http(err.to_string()))?,
    );
    Ok(headers)
}

#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, BridgeError> {
        let client = Client::builder()
            .default_headers(user_agent()?)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| BridgeError::Http(err.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpReply, TransportError> {
        debug!(url, ?query, "GET");
        let response = self.client.get(url).query(query).send().map_err(transport_error)?;
        read_reply(response)
    }

    fn get_basic_auth(
        &self,
        url: &str,
        username: &str,
        password: &str,
    ) -> Result<HttpReply, TransportError> {
        debug!(url, username, "GET with basic auth");
        let response = self
            .client
            .get(url)
            .basic_auth(username, Some(password))
            .send()
            .map_err(transport_error)?;
        read_reply(response)
    }

    fn post(&self, url: &str, headers: HeaderMap, body: Vec<u8>) -> Result<HttpReply, TransportError> {
        debug!(url, bytes = body.len(), "POST");
        let response = self
            .client
            .post(url)
            .headers(headers)
            .body(body)
            .send()
            .map_err(transport_error)?;
        read_reply(response)
    }
}

fn transport_error(err: reqwest::Error) -> TransportError {
    if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}

fn read_reply(response: Response) -> Result<HttpReply, TransportError> {
    let status = response.status().as_u16();
    let body = response
        .text()
        .map_err(|err| TransportError::Other(err.to_string()))?;
    Ok(HttpReply { status, body })
}
