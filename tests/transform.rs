use assert_matches::assert_matches;
use serde_json::json;

use brapi2biosamples::error::BridgeError;
use brapi2biosamples::model::{Germplasm, from_result};
use brapi2biosamples::sample::{
    Characteristic, CharacteristicName, characteristic, characteristic_with_ontology,
};
use brapi2biosamples::transform::{
    NCBI_TAXON_PREFIX, TaxonScan, TransformOptions, generate_synonyms, organism,
    reconstruct_accession_name, transform,
};

fn germplasm(value: serde_json::Value) -> Germplasm {
    from_result(value, "germplasm").unwrap()
}

fn maize() -> Germplasm {
    germplasm(json!({
        "germplasmDbId": "G0001",
        "germplasmName": "B73",
        "germplasmPUI": "https://doi.org/10.18730/ABC",
        "genus": "Zea",
        "species": "mays",
        "subtaxa": "subsp. mays",
        "commonCropName": "maize",
        "accessionNumber": "123",
        "instituteName": "Example Institute",
        "holdingInstitute": {"instituteName": "Example Institute", "acronym": "ABC"},
        "taxonIds": [{"sourceName": "NCBI", "taxonId": "4577"}],
        "synonyms": ["B-73", "B73"],
        "defaultDisplayName": "B73 inbred",
        "externalReferences": [{"referenceID": "urn:ext:1", "referenceSource": "ext"}]
    }))
}

fn options(rename: bool) -> TransformOptions {
    TransformOptions {
        domain: "self.ExampleDomain".to_string(),
        release: "2021-01-20T17:05:13Z".to_string(),
        rename,
        taxon_scan: TaxonScan::FirstEntry,
    }
}

#[test]
fn characteristic_shapes() {
    assert_eq!(characteristic("x"), vec![Characteristic::text("x")]);
    assert_eq!(
        serde_json::to_value(characteristic("x")).unwrap(),
        json!([{"text": "x"}])
    );
    assert_eq!(
        serde_json::to_value(characteristic_with_ontology("x", "http://purl/y")).unwrap(),
        json!([{"text": "x", "ontologyTerms": ["http://purl/y"]}])
    );
}

#[test]
fn full_record_mapping() {
    let sample = transform("study-7", &maize(), &options(false)).unwrap();
    assert_eq!(sample.name, "G0001");
    assert_eq!(sample.domain, "self.ExampleDomain");
    assert_eq!(sample.release, "2021-01-20T17:05:13Z");

    let text = |name| sample.get(name).unwrap()[0].text.clone();
    assert_eq!(text(CharacteristicName::ProjectName), "study-7");
    assert_eq!(
        text(CharacteristicName::BiologicalMaterialId),
        "https://doi.org/10.18730/ABC"
    );
    assert_eq!(
        text(CharacteristicName::MaterialSourceId),
        "https://doi.org/10.18730/ABC"
    );
    assert_eq!(
        text(CharacteristicName::Organism),
        format!("{NCBI_TAXON_PREFIX}4577")
    );
    assert_eq!(text(CharacteristicName::Genus), "Zea");
    assert_eq!(text(CharacteristicName::Species), "mays");
    assert_eq!(text(CharacteristicName::InfraspecificName), "subsp. mays");

    let synonyms = sample
        .get(CharacteristicName::Synonyms)
        .unwrap()
        .iter()
        .map(|entry| entry.text.as_str())
        .collect::<Vec<_>>();
    assert_eq!(synonyms, vec!["B-73", "B73", "B73 inbred", "urn:ext:1"]);

    for values in sample.characteristics.values() {
        assert!(!values.is_empty());
    }
}

#[test]
fn renamed_sample_uses_reconstructed_accession() {
    let sample = transform("s", &maize(), &options(true)).unwrap();
    assert_eq!(sample.name, "Zea:ABC:123");
}

#[test]
fn reconstruction_falls_back_to_institute_name() {
    let record = germplasm(json!({
        "germplasmDbId": "g",
        "genus": "Triticum",
        "instituteName": "INRAE",
        "accessionNumber": "TA-9"
    }));
    assert_eq!(reconstruct_accession_name(&record).unwrap(), "Triticum:INRAE:TA-9");

    let record = germplasm(json!({"germplasmDbId": "g", "genus": "Triticum", "accessionNumber": "1"}));
    assert_matches!(
        reconstruct_accession_name(&record).unwrap_err(),
        BridgeError::MissingField { ref field, .. } if field == "instituteName"
    );
}

#[test]
fn empty_pui_falls_back_to_db_id() {
    let mut record = maize();
    record.germplasm_pui = Some(String::new());
    let sample = transform("s", &record, &options(false)).unwrap();
    assert_eq!(
        sample.get(CharacteristicName::BiologicalMaterialId).unwrap()[0].text,
        "G0001"
    );
}

#[test]
fn organism_without_taxon_ids_is_crop_name() {
    let mut record = maize();
    record.taxon_ids = Some(Vec::new());
    assert_eq!(organism(&record, TaxonScan::FirstEntry).unwrap(), "maize");
    record.taxon_ids = None;
    assert_eq!(organism(&record, TaxonScan::AnyEntry).unwrap(), "maize");
}

#[test]
fn taxon_source_match_is_case_insensitive() {
    let record = germplasm(json!({
        "germplasmDbId": "g",
        "commonCropName": "maize",
        "taxonIds": [{"sourceName": "ncbi", "taxonId": "4577"}]
    }));
    let link = organism(&record, TaxonScan::FirstEntry).unwrap();
    assert!(link.contains("4577"));
    assert!(link.starts_with("http://purl.obolibrary.org/obo/NCBITaxon_"));
}

#[test]
fn only_first_taxon_id_is_inspected_by_default() {
    let record = germplasm(json!({
        "germplasmDbId": "g",
        "commonCropName": "maize",
        "taxonIds": [
            {"sourceName": "GRIN", "taxonId": "42"},
            {"sourceName": "NCBI", "taxonId": "4577"}
        ]
    }));
    assert_eq!(organism(&record, TaxonScan::FirstEntry).unwrap(), "maize");
    assert_eq!(
        organism(&record, TaxonScan::AnyEntry).unwrap(),
        format!("{NCBI_TAXON_PREFIX}4577")
    );
}

#[test]
fn synonyms_ignore_source_order() {
    let forward = germplasm(json!({
        "germplasmDbId": "g", "germplasmName": "A",
        "synonyms": ["x", "y", "z", "x"]
    }));
    let reversed = germplasm(json!({
        "germplasmDbId": "g", "germplasmName": "A",
        "synonyms": ["z", "x", "y"]
    }));
    let forward = generate_synonyms(&forward).unwrap();
    assert_eq!(forward, generate_synonyms(&reversed).unwrap());
    assert_eq!(forward.len(), 4);
    assert!(forward.contains("A"));
}

#[test]
fn composite_synonyms_are_rejected() {
    let record = germplasm(json!({
        "germplasmDbId": "g", "germplasmName": "A",
        "externalReferences": [{"referenceSource": "nowhere"}]
    }));
    assert_matches!(generate_synonyms(&record).unwrap_err(), BridgeError::InvalidSynonym(_));

    let record = germplasm(json!({
        "germplasmDbId": "g", "germplasmName": "A",
        "synonyms": [["nested"]]
    }));
    assert_matches!(generate_synonyms(&record).unwrap_err(), BridgeError::InvalidSynonym(_));
}

#[test]
fn missing_genus_aborts_the_record() {
    let record = germplasm(json!({
        "germplasmDbId": "g",
        "germplasmName": "A",
        "commonCropName": "maize",
        "species": "mays"
    }));
    assert_matches!(
        transform("s", &record, &options(false)).unwrap_err(),
        BridgeError::MissingField { ref field, .. } if field == "genus"
    );
}

#[test]
fn absent_subtaxa_is_omitted() {
    let mut record = maize();
    record.subtaxa = None;
    let sample = transform("s", &record, &options(false)).unwrap();
    assert!(sample.get(CharacteristicName::InfraspecificName).is_none());
}

#[test]
fn empty_subtaxa_is_copied_verbatim() {
    let mut record = maize();
    record.subtaxa = Some(String::new());
    let sample = transform("s", &record, &options(false)).unwrap();
    assert_eq!(
        sample.get(CharacteristicName::InfraspecificName),
        Some(&[Characteristic::text("")][..])
    );
}
