use serde_json::Value;
use tracing::{debug, warn};

use crate::error::BridgeError;
use crate::http::{HttpReply, ReqwestTransport, RetryPolicy, Transport, pause, url_path_join};
use crate::model::{Germplasm, GermplasmSummary, Trial, from_result};

pub const DEFAULT_PAGE_SIZE: u32 = 1000;
pub const FALLBACK_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaginationMode {
    // Stops after page 0 whatever `totalPages` declares.
    #[default]
    FirstPage,
    AllPages,
}

pub trait BrapiClient {
    fn fetch_trial(&self, trial_id: &str) -> Result<Trial, BridgeError>;
    fn fetch_study_germplasm(&self, study_id: &str)
    -> Result<Vec<GermplasmSummary>, BridgeError>;
    fn fetch_germplasm(&self, germplasm_id: &str) -> Result<Germplasm, BridgeError>;
}

pub struct BrapiHttpClient<T: Transport = ReqwestTransport> {
    transport: T,
    base_url: String,
    policy: RetryPolicy,
    pagination: PaginationMode,
}

impl BrapiHttpClient<ReqwestTransport> {
    pub fn new(base_url: impl Into<String>, pagination: PaginationMode) -> Result<Self, BridgeError> {
        Ok(Self::with_transport(
            ReqwestTransport::new()?,
            base_url,
            RetryPolicy::default(),
            pagination,
        ))
    }
}

impl<T: Transport> BrapiHttpClient<T> {
    pub fn with_transport(
        transport: T,
        base_url: impl Into<String>,
        policy: RetryPolicy,
        pagination: PaginationMode,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            policy,
            pagination,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn fetch_single(&self, path: &str) -> Result<Value, BridgeError> {
        let url = url_path_join(&[&self.base_url, path]);
        let mut reply = self
            .policy
            .send_with_retries(|| self.transport.get(&url, &[]))?;
        if reply.status == 500 {
            warn!(%url, "internal server error, retrying once");
            pause(self.policy.server_error_pause);
            reply = self.transport.get(&url, &[])?;
        }
        let body = Self::handle_status(reply, &url)?;
        match body {
            Value::Object(mut map) => map
                .remove("result")
                .ok_or_else(|| BridgeError::missing(url, "result")),
            _ => Err(BridgeError::missing(url, "result")),
        }
    }

    pub fn fetch_paginated(&self, path: &str) -> Result<Vec<Value>, BridgeError> {
        let url = url_path_join(&[&self.base_url, path]);
        let mut page: u64 = 0;
        let mut page_size = DEFAULT_PAGE_SIZE;
        let mut total_pages: Option<u64> = None;
        let mut output = Vec::new();

        loop {
            if let Some(total) = total_pages {
                if page >= total {
                    break;
                }
            }
            debug!(%url, page, page_size, total_pages = total_pages.unwrap_or(0), "retrieving page");
            let query = [("page", page.to_string()), ("pageSize", page_size.to_string())];
            let reply = self
                .policy
                .send_with_retries(|| self.transport.get(&url, &query))?;
            if reply.status == 504 && page_size != FALLBACK_PAGE_SIZE {
                warn!(%url, page, "gateway timeout, retrying with pageSize={FALLBACK_PAGE_SIZE}");
                // Keep the item offset: rows already collected must not come back.
                page = page * u64::from(page_size) / u64::from(FALLBACK_PAGE_SIZE);
                page_size = FALLBACK_PAGE_SIZE;
                total_pages = None;
                continue;
            }
            let mut body = Self::handle_status(reply, &url)?;
            total_pages = Some(declared_total_pages(&body, &url)?);

            match body.pointer_mut("/result/data").map(Value::take) {
                Some(Value::Array(data)) => output.extend(data),
                _ => return Err(BridgeError::missing(url, "result.data")),
            }

            page += 1;
            if self.pagination == PaginationMode::FirstPage {
                break;
            }
        }

        Ok(output)
    }

    fn handle_status(reply: HttpReply, url: &str) -> Result<Value, BridgeError> {
        if reply.status != 200 {
            return Err(BridgeError::RequestFailed {
                status: reply.status,
                url: url.to_string(),
            });
        }
        serde_json::from_str(&reply.body)
            .map_err(|err| BridgeError::InvalidResponse(format!("{url}: {err}")))
    }
}

impl<T: Transport> BrapiClient for BrapiHttpClient<T> {
    fn fetch_trial(&self, trial_id: &str) -> Result<Trial, BridgeError> {
        let result = self.fetch_single(&format!("/trials/{trial_id}"))?;
        from_result(result, "trial")
    }

    fn fetch_study_germplasm(
        &self,
        study_id: &str,
    ) -> Result<Vec<GermplasmSummary>, BridgeError> {
        self.fetch_paginated(&format!("/studies/{study_id}/germplasm"))?
            .into_iter()
            .map(|entry| from_result(entry, "study germplasm"))
            .collect()
    }

    fn fetch_germplasm(&self, germplasm_id: &str) -> Result<Germplasm, BridgeError> {
        let result = self.fetch_single(&format!("/germplasm/{germplasm_id}"))?;
        from_result(result, "germplasm")
    }
}

fn declared_total_pages(body: &Value, url: &str) -> Result<u64, BridgeError> {
    let value = body
        .pointer("/metadata/pagination/totalPages")
        .ok_or_else(|| BridgeError::missing(url, "metadata.pagination.totalPages"))?;
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|text| text.trim().parse().ok()))
        .ok_or_else(|| {
            BridgeError::InvalidResponse(format!("{url}: totalPages is not a count: {value}"))
        })
}
