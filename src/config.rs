use std::path::PathBuf;

use camino::Utf8PathBuf;

use crate::brapi::PaginationMode;
use crate::credentials::Credentials;
use crate::decode::DecodeFields;
use crate::endpoints::{Endpoints, Environment};
use crate::error::BridgeError;
use crate::transform::{TaxonScan, TransformOptions};

#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub trial_id: String,
    pub endpoint: String,
    pub release: Option<String>,
    pub domain: String,
    pub submit: bool,
    pub environment: Environment,
    pub secret: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub rename: bool,
    pub decode: Option<String>,
    pub pagination: PaginationMode,
    pub taxon_scan: TaxonScan,
}

#[derive(Debug, Clone)]
pub enum RunMode {
    Export {
        output_dir: Utf8PathBuf,
    },
    Submit {
        environment: Environment,
        endpoints: Endpoints,
        credentials: Credentials,
    },
}

impl RunMode {
    pub fn label(&self) -> &'static str {
        match self {
            RunMode::Export { .. } => "export",
            RunMode::Submit { .. } => "submit",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedRun {
    pub trial_id: String,
    pub brapi_base: String,
    pub mode: RunMode,
    pub transform: TransformOptions,
    pub decode: DecodeFields,
    pub pagination: PaginationMode,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(request: RunRequest) -> Result<ResolvedRun, BridgeError> {
        let mode = if request.submit {
            let secret = request.secret.ok_or(BridgeError::MissingCredentials)?;
            RunMode::Submit {
                environment: request.environment,
                endpoints: Endpoints::resolve(request.environment),
                credentials: Credentials::load(&secret)?,
            }
        } else {
            let output = request.output.unwrap_or_else(|| PathBuf::from("."));
            if !output.is_dir() {
                return Err(BridgeError::OutputDirMissing(output));
            }
            let output_dir = Utf8PathBuf::from_path_buf(output).map_err(|path| {
                BridgeError::Filesystem(format!("non-utf8 output path: {}", path.display()))
            })?;
            RunMode::Export { output_dir }
        };

        Ok(ResolvedRun {
            trial_id: request.trial_id,
            brapi_base: request.endpoint,
            mode,
            transform: TransformOptions {
                domain: request.domain,
                release: request.release.unwrap_or_else(default_release_date),
                rename: request.rename,
                taxon_scan: request.taxon_scan,
            },
            decode: request
                .decode
                .as_deref()
                .map(DecodeFields::parse)
                .unwrap_or_default(),
            pagination: request.pagination,
        })
    }
}

// e.g. 2021-01-20T17:05:13.123456, local time without an offset.
pub fn default_release_date() -> String {
    chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}
