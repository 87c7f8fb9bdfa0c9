use std::collections::BTreeSet;

use serde_json::Value;

use crate::error::BridgeError;
use crate::model::Germplasm;
use crate::sample::{Characteristic, CharacteristicName, SampleSubmission, characteristic};

pub const NCBI_TAXON_PREFIX: &str = "http://purl.obolibrary.org/obo/NCBITaxon_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaxonScan {
    // Only the first taxon id decides, anything else falls back to the crop name.
    #[default]
    FirstEntry,
    AnyEntry,
}

#[derive(Debug, Clone)]
pub struct TransformOptions {
    pub domain: String,
    pub release: String,
    pub rename: bool,
    pub taxon_scan: TaxonScan,
}

pub fn transform(
    study_id: &str,
    germplasm: &Germplasm,
    options: &TransformOptions,
) -> Result<SampleSubmission, BridgeError> {
    let name = if options.rename {
        reconstruct_accession_name(germplasm)?
    } else {
        germplasm.germplasm_db_id.clone()
    };

    let mut sample = SampleSubmission::new(name, &options.domain, &options.release);
    sample.set(CharacteristicName::ProjectName, characteristic(study_id));
    sample.set(
        CharacteristicName::BiologicalMaterialId,
        characteristic(germplasm.material_id()),
    );
    sample.set(
        CharacteristicName::Synonyms,
        generate_synonyms(germplasm)?
            .into_iter()
            .map(Characteristic::text)
            .collect(),
    );
    sample.set(
        CharacteristicName::Organism,
        characteristic(organism(germplasm, options.taxon_scan)?),
    );
    sample.set(
        CharacteristicName::Genus,
        characteristic(germplasm.require("genus", &germplasm.genus)?),
    );
    sample.set(
        CharacteristicName::Species,
        characteristic(germplasm.require("species", &germplasm.species)?),
    );
    if let Some(subtaxa) = germplasm.subtaxa.as_deref() {
        sample.set(CharacteristicName::InfraspecificName, characteristic(subtaxa));
    }
    sample.set(
        CharacteristicName::MaterialSourceId,
        characteristic(germplasm.material_id()),
    );

    Ok(sample)
}

// genus:institute:accessionNumber, the holding institute acronym wins over instituteName.
pub fn reconstruct_accession_name(germplasm: &Germplasm) -> Result<String, BridgeError> {
    let genus = germplasm.require("genus", &germplasm.genus)?;
    let acronym = germplasm
        .holding_institute
        .as_ref()
        .and_then(|institute| institute.acronym.as_deref())
        .filter(|acronym| !acronym.is_empty());
    let institute = match acronym {
        Some(acronym) => acronym,
        None => germplasm.require("instituteName", &germplasm.institute_name)?,
    };
    let accession = germplasm.require("accessionNumber", &germplasm.accession_number)?;
    Ok(format!("{genus}:{institute}:{accession}"))
}

pub fn organism(germplasm: &Germplasm, scan: TaxonScan) -> Result<String, BridgeError> {
    match germplasm.taxon_ids.as_deref() {
        Some(ids) if !ids.is_empty() => generate_taxon_link(germplasm, scan),
        _ => common_crop_name(germplasm),
    }
}

pub fn generate_taxon_link(germplasm: &Germplasm, scan: TaxonScan) -> Result<String, BridgeError> {
    let ids = germplasm.taxon_ids.as_deref().unwrap_or_default();
    let candidates = match scan {
        TaxonScan::FirstEntry => ids.get(..1).unwrap_or_default(),
        TaxonScan::AnyEntry => ids,
    };
    match candidates
        .iter()
        .find(|taxon| taxon.source_name.eq_ignore_ascii_case("NCBI"))
    {
        Some(taxon) => Ok(format!("{NCBI_TAXON_PREFIX}{}", taxon.taxon_id)),
        None => common_crop_name(germplasm),
    }
}

fn common_crop_name(germplasm: &Germplasm) -> Result<String, BridgeError> {
    germplasm
        .require("commonCropName", &germplasm.common_crop_name)
        .map(str::to_string)
}

pub fn generate_synonyms(germplasm: &Germplasm) -> Result<BTreeSet<String>, BridgeError> {
    let mut synonyms = BTreeSet::new();
    synonyms.insert(germplasm.germplasm_name()?.to_string());

    for synonym in germplasm.synonyms.iter().flatten() {
        synonyms.insert(synonym_text(synonym)?);
    }
    if let Some(display) = germplasm
        .default_display_name
        .as_deref()
        .filter(|display| !display.is_empty())
    {
        synonyms.insert(display.to_string());
    }
    if let Some(references) = &germplasm.external_references {
        synonyms.extend(external_reference_texts(references)?);
    }

    Ok(synonyms)
}

// BrAPI v1 lists bare strings, v2 wraps them as {"synonym": ..., "type": ...}.
fn synonym_text(value: &Value) -> Result<String, BridgeError> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Object(map) => match map.get("synonym") {
            Some(Value::String(text)) => Ok(text.clone()),
            _ => Err(BridgeError::InvalidSynonym(value.to_string())),
        },
        other => Err(BridgeError::InvalidSynonym(other.to_string())),
    }
}

fn external_reference_texts(value: &Value) -> Result<Vec<String>, BridgeError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(text) if text.is_empty() => Ok(Vec::new()),
        Value::Array(items) => items.iter().map(external_reference_text).collect(),
        other => Ok(vec![external_reference_text(other)?]),
    }
}

fn external_reference_text(value: &Value) -> Result<String, BridgeError> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Object(map) => ["referenceID", "referenceId"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .ok_or_else(|| BridgeError::InvalidSynonym(value.to_string())),
        other => Err(BridgeError::InvalidSynonym(other.to_string())),
    }
}
