use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::sync::{LazyLock, Mutex, PoisonError};

use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;

use crate::error::BridgeError;

pub const REPORT_FILE_NAME: &str = "submission_details.text";

static UNSAFE_FILE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]").expect("static regex"));

#[derive(Debug)]
pub struct Store {
    output_dir: Utf8PathBuf,
    report_dir: Utf8PathBuf,
    // Sample files written during this run, keyed by path, with their germplasm id.
    written: Mutex<HashMap<Utf8PathBuf, String>>,
}

impl Store {
    pub fn new(output_dir: Utf8PathBuf) -> Self {
        Self::new_with_paths(output_dir, Utf8PathBuf::from("."))
    }

    pub fn new_with_paths(output_dir: Utf8PathBuf, report_dir: Utf8PathBuf) -> Self {
        Self {
            output_dir,
            report_dir,
            written: Mutex::new(HashMap::new()),
        }
    }

    pub fn sample_path(&self, germplasm_id: &str) -> Utf8PathBuf {
        let safe = UNSAFE_FILE_CHARS.replace_all(germplasm_id, "_");
        self.output_dir.join(format!("o_{safe}.json"))
    }

    pub fn report_path(&self) -> Utf8PathBuf {
        self.report_dir.join(REPORT_FILE_NAME)
    }

    pub fn write_sample(&self, germplasm_id: &str, sample: &Value) -> Result<Utf8PathBuf, BridgeError> {
        let path = self.sample_path(germplasm_id);
        self.claim(&path, germplasm_id)?;
        let mut content = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut content, PrettyFormatter::with_indent(b"    "));
        sample
            .serialize(&mut serializer)
            .map_err(|err| BridgeError::Serialization(err.to_string()))?;
        Self::write_bytes_atomic(&path, &content)?;
        Ok(path)
    }

    pub fn write_report(&self, lines: &[String]) -> Result<Utf8PathBuf, BridgeError> {
        let path = self.report_path();
        Self::write_bytes_atomic(&path, lines.join("\n").as_bytes())?;
        Ok(path)
    }

    fn claim(&self, path: &Utf8Path, germplasm_id: &str) -> Result<(), BridgeError> {
        let mut written = self.written.lock().unwrap_or_else(PoisonError::into_inner);
        match written.get(path) {
            Some(first) if first != germplasm_id => Err(BridgeError::FileNameCollision {
                path: path.to_string(),
                first: first.clone(),
                second: germplasm_id.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                written.insert(path.to_path_buf(), germplasm_id.to_string());
                Ok(())
            }
        }
    }

    pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), BridgeError> {
        let parent = path
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .unwrap_or(Utf8Path::new("."));
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| BridgeError::Filesystem(err.to_string()))?;
        let mut temp = tempfile::Builder::new()
            .prefix("brapi2biosamples")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| BridgeError::Filesystem(err.to_string()))?;
        temp.write_all(content)
            .map_err(|err| BridgeError::Filesystem(err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| BridgeError::Filesystem(format!("write {path}: {err}")))?;
        Ok(())
    }
}
