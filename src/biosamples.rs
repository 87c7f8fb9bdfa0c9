use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::info;

use crate::endpoints::Endpoints;
use crate::error::BridgeError;
use crate::http::{HttpReply, ReqwestTransport, Transport};
use crate::sample::SubmittedSample;

pub const HAL_JSON: &str = "application/hal+json";
pub const JSON_UTF8: &str = "application/json;charset=UTF-8";

pub trait SampleRegistry {
    fn fetch_token(&self, username: &str, password: &str) -> Result<String, BridgeError>;
    fn validate(&self, token: &str, sample: &Value) -> Result<(), BridgeError>;
    fn submit(&self, token: &str, sample: &Value) -> Result<SubmittedSample, BridgeError>;
    fn sample_url(&self, accession: &str) -> String;
}

pub struct BioSamplesHttpClient<T: Transport = ReqwestTransport> {
    transport: T,
    endpoints: Endpoints,
}

impl BioSamplesHttpClient<ReqwestTransport> {
    pub fn new(endpoints: Endpoints) -> Result<Self, BridgeError> {
        Ok(Self::with_transport(ReqwestTransport::new()?, endpoints))
    }
}

impl<T: Transport> BioSamplesHttpClient<T> {
    pub fn with_transport(transport: T, endpoints: Endpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn post(&self, url: &str, token: &str, sample: &Value) -> Result<HttpReply, BridgeError> {
        let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|err| BridgeError::Http(format!("invalid bearer token: {err}")))?;
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(HAL_JSON));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8));
        headers.insert(AUTHORIZATION, bearer);
        let body =
            serde_json::to_vec(sample).map_err(|err| BridgeError::Serialization(err.to_string()))?;
        Ok(self.transport.post(url, headers, body)?)
    }
}

impl<T: Transport> SampleRegistry for BioSamplesHttpClient<T> {
    fn fetch_token(&self, username: &str, password: &str) -> Result<String, BridgeError> {
        let reply = self
            .transport
            .get_basic_auth(&self.endpoints.token, username, password)?;
        if reply.status != 200 {
            return Err(BridgeError::AuthFailed {
                status: reply.status,
                message: reply.body,
            });
        }
        info!(username, "authenticated against the token endpoint");
        Ok(reply.body.trim().to_string())
    }

    fn validate(&self, token: &str, sample: &Value) -> Result<(), BridgeError> {
        let reply = self.post(&self.endpoints.validate, token, sample)?;
        match reply.status {
            200 | 201 => Ok(()),
            status => Err(BridgeError::RequestFailed {
                status,
                url: self.endpoints.validate.clone(),
            }),
        }
    }

    fn submit(&self, token: &str, sample: &Value) -> Result<SubmittedSample, BridgeError> {
        let reply = self.post(&self.endpoints.submit, token, sample)?;
        if reply.status != 201 {
            return Err(BridgeError::RequestFailed {
                status: reply.status,
                url: self.endpoints.submit.clone(),
            });
        }
        serde_json::from_str(&reply.body)
            .map_err(|err| BridgeError::InvalidResponse(format!("{}: {err}", self.endpoints.submit)))
    }

    fn sample_url(&self, accession: &str) -> String {
        self.endpoints.sample_url(accession)
    }
}
