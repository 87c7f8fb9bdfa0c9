use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BridgeError;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Characteristic {
    pub text: String,
    #[serde(rename = "ontologyTerms", default, skip_serializing_if = "Option::is_none")]
    pub ontology_terms: Option<Vec<String>>,
}

impl Characteristic {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ontology_terms: None,
        }
    }
}

pub fn characteristic(text: impl Into<String>) -> Vec<Characteristic> {
    vec![Characteristic::text(text)]
}

pub fn characteristic_with_ontology(
    text: impl Into<String>,
    ontology: impl Into<String>,
) -> Vec<Characteristic> {
    vec![Characteristic {
        text: text.into(),
        ontology_terms: Some(vec![ontology.into()]),
    }]
}

// Declaration order is output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CharacteristicName {
    #[serde(rename = "project name")]
    ProjectName,
    #[serde(rename = "biological material ID")]
    BiologicalMaterialId,
    #[serde(rename = "synonyms")]
    Synonyms,
    #[serde(rename = "organism")]
    Organism,
    #[serde(rename = "genus")]
    Genus,
    #[serde(rename = "species")]
    Species,
    #[serde(rename = "infraspecific name")]
    InfraspecificName,
    #[serde(rename = "material source ID")]
    MaterialSourceId,
}

impl CharacteristicName {
    pub fn as_str(&self) -> &'static str {
        match self {
            CharacteristicName::ProjectName => "project name",
            CharacteristicName::BiologicalMaterialId => "biological material ID",
            CharacteristicName::Synonyms => "synonyms",
            CharacteristicName::Organism => "organism",
            CharacteristicName::Genus => "genus",
            CharacteristicName::Species => "species",
            CharacteristicName::InfraspecificName => "infraspecific name",
            CharacteristicName::MaterialSourceId => "material source ID",
        }
    }
}

impl fmt::Display for CharacteristicName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSubmission {
    pub name: String,
    pub domain: String,
    pub release: String,
    pub characteristics: BTreeMap<CharacteristicName, Vec<Characteristic>>,
}

impl SampleSubmission {
    pub fn new(name: impl Into<String>, domain: impl Into<String>, release: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: domain.into(),
            release: release.into(),
            characteristics: BTreeMap::new(),
        }
    }

    // Empty lists are dropped: a stored characteristic always has an entry.
    pub fn set(&mut self, name: CharacteristicName, values: Vec<Characteristic>) {
        if values.is_empty() {
            return;
        }
        self.characteristics.insert(name, values);
    }

    pub fn get(&self, name: CharacteristicName) -> Option<&[Characteristic]> {
        self.characteristics.get(&name).map(Vec::as_slice)
    }

    pub fn to_json(&self) -> Result<Value, BridgeError> {
        serde_json::to_value(self).map_err(|err| BridgeError::Serialization(err.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedSample {
    pub name: String,
    pub accession: String,
}
