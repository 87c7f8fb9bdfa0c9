use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BridgeError;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trial {
    #[serde(default)]
    pub studies: Option<Vec<StudyRef>>,
}

impl Trial {
    pub fn studies(&self) -> Result<&[StudyRef], BridgeError> {
        self.studies
            .as_deref()
            .ok_or_else(|| BridgeError::missing("trial", "studies"))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyRef {
    #[serde(deserialize_with = "id")]
    pub study_db_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GermplasmSummary {
    #[serde(deserialize_with = "id")]
    pub germplasm_db_id: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Germplasm {
    #[serde(deserialize_with = "id")]
    pub germplasm_db_id: String,
    #[serde(default)]
    pub germplasm_name: Option<String>,
    #[serde(default, rename = "germplasmPUI")]
    pub germplasm_pui: Option<String>,
    #[serde(default)]
    pub genus: Option<String>,
    #[serde(default)]
    pub species: Option<String>,
    #[serde(default)]
    pub subtaxa: Option<String>,
    #[serde(default)]
    pub common_crop_name: Option<String>,
    #[serde(default)]
    pub accession_number: Option<String>,
    #[serde(default)]
    pub institute_name: Option<String>,
    #[serde(default)]
    pub holding_institute: Option<HoldingInstitute>,
    #[serde(default)]
    pub taxon_ids: Option<Vec<TaxonId>>,
    #[serde(default)]
    pub synonyms: Option<Vec<Value>>,
    #[serde(default)]
    pub default_display_name: Option<String>,
    #[serde(default)]
    pub external_references: Option<Value>,
}

impl Germplasm {
    fn record(&self) -> String {
        format!("germplasm {}", self.germplasm_db_id)
    }

    pub fn require<'a>(
        &'a self,
        field: &str,
        value: &'a Option<String>,
    ) -> Result<&'a str, BridgeError> {
        value
            .as_deref()
            .ok_or_else(|| BridgeError::missing(self.record(), field))
    }

    pub fn germplasm_name(&self) -> Result<&str, BridgeError> {
        self.require("germplasmName", &self.germplasm_name)
    }

    pub fn material_id(&self) -> &str {
        self.germplasm_pui
            .as_deref()
            .filter(|pui| !pui.is_empty())
            .unwrap_or(&self.germplasm_db_id)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingInstitute {
    #[serde(default)]
    pub acronym: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonId {
    pub source_name: String,
    #[serde(deserialize_with = "id")]
    pub taxon_id: String,
}

pub fn from_result<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, BridgeError> {
    serde_json::from_value(value)
        .map_err(|err| BridgeError::InvalidResponse(format!("{what}: {err}")))
}

// Identifiers are strings in BrAPI v2 but some servers still send integers.
fn id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(value) => Ok(value),
        Value::Number(value) => Ok(value.to_string()),
        other => Err(de::Error::custom(format!(
            "expected string or number identifier, got {other}"
        ))),
    }
}
