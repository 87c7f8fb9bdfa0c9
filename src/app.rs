use std::collections::HashSet;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;

use crate::biosamples::SampleRegistry;
use crate::brapi::BrapiClient;
use crate::config::{ResolvedRun, RunMode};
use crate::decode::{DecodeFields, decode_base64};
use crate::error::BridgeError;
use crate::sample::{SampleSubmission, SubmittedSample};
use crate::store::Store;
use crate::transform::transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Authenticate,
    FetchTrial,
    ForEachStudy,
    ForEachGermplasm,
    Transform,
    ValidateAndSubmit,
    WriteFile,
    Done,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub phase: Phase,
    pub message: String,
    pub elapsed: Option<Duration>,
}

impl ProgressEvent {
    pub fn new(phase: Phase, message: impl Into<String>) -> Self {
        Self {
            phase,
            message: message.into(),
            elapsed: None,
        }
    }
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub mode: String,
    pub trial_id: String,
    pub processed: Vec<String>,
    pub exported: Vec<String>,
    pub submitted: Vec<SubmittedSample>,
    pub report_path: Option<String>,
}

pub struct App<B: BrapiClient, S: SampleRegistry> {
    brapi: B,
    registry: S,
    store: Store,
}

impl<B: BrapiClient, S: SampleRegistry> App<B, S> {
    pub fn new(brapi: B, registry: S, store: Store) -> Self {
        Self {
            brapi,
            registry,
            store,
        }
    }

    pub fn run(&self, run: &ResolvedRun, sink: &dyn ProgressSink) -> Result<RunSummary, BridgeError> {
        let start = Instant::now();
        let token = match &run.mode {
            RunMode::Submit { credentials, .. } => {
                sink.event(ProgressEvent::new(Phase::Authenticate, "--- Requesting TOKEN ---"));
                let token = self
                    .registry
                    .fetch_token(&credentials.username, &credentials.password)?;
                sink.event(ProgressEvent::new(
                    Phase::Authenticate,
                    "  Authentication is successful",
                ));
                Some(token)
            }
            RunMode::Export { .. } => None,
        };

        sink.event(ProgressEvent::new(
            Phase::FetchTrial,
            "--- Fetching germplasm data ---",
        ));
        let trial = self.brapi.fetch_trial(&run.trial_id)?;

        let mut seen = HashSet::new();
        let mut summary = RunSummary {
            mode: run.mode.label().to_string(),
            trial_id: run.trial_id.clone(),
            processed: Vec::new(),
            exported: Vec::new(),
            submitted: Vec::new(),
            report_path: None,
        };

        for study in trial.studies()? {
            let study_id = study.study_db_id.as_str();
            sink.event(ProgressEvent::new(
                Phase::ForEachStudy,
                format!("  - Getting germplasms from {study_id}"),
            ));
            for entry in self.brapi.fetch_study_germplasm(study_id)? {
                let germplasm_id = entry.germplasm_db_id;
                if !seen.insert(germplasm_id.clone()) {
                    continue;
                }
                sink.event(ProgressEvent::new(
                    Phase::ForEachGermplasm,
                    format!("  - Generating BioSamples JSON-LD for {germplasm_id}"),
                ));
                let germplasm = self.brapi.fetch_germplasm(&germplasm_id)?;

                sink.event(ProgressEvent::new(Phase::Transform, format!("transform {germplasm_id}")));
                let sample = transform(study_id, &germplasm, &run.transform)?;
                let document = prepare_document(&sample, &run.decode)?;

                match token.as_deref() {
                    Some(token) => {
                        let submitted = self.submit(token, &germplasm_id, &document, sink)?;
                        summary.submitted.push(submitted);
                    }
                    None => {
                        let path = self.store.write_sample(&germplasm_id, &document)?;
                        sink.event(ProgressEvent::new(
                            Phase::WriteFile,
                            format!("  BioSample JSON-LD from {study_id} dumped as {path}"),
                        ));
                        summary.exported.push(path.to_string());
                    }
                }
                summary.processed.push(germplasm_id);
            }
        }

        if token.is_some() {
            let lines = summary
                .submitted
                .iter()
                .map(|sample| format!("{}\t{}", sample.name, sample.accession))
                .collect::<Vec<_>>();
            let report = self.store.write_report(&lines)?;
            sink.event(ProgressEvent::new(
                Phase::Done,
                format!("All accession numbers of the submissions are written to {report}"),
            ));
            sink.event(ProgressEvent {
                phase: Phase::Done,
                message: format!(
                    "Submission of {} samples to BioSamples has successfully ended",
                    summary.processed.len()
                ),
                elapsed: Some(start.elapsed()),
            });
            summary.report_path = Some(report.to_string());
        } else {
            sink.event(ProgressEvent {
                phase: Phase::Done,
                message: "Dumping successful".to_string(),
                elapsed: Some(start.elapsed()),
            });
        }

        Ok(summary)
    }

    fn submit(
        &self,
        token: &str,
        germplasm_id: &str,
        document: &Value,
        sink: &dyn ProgressSink,
    ) -> Result<SubmittedSample, BridgeError> {
        sink.event(ProgressEvent::new(
            Phase::ValidateAndSubmit,
            format!("  - Validating the JSON-LD schema of {germplasm_id}"),
        ));
        self.registry.validate(token, document)?;
        sink.event(ProgressEvent::new(
            Phase::ValidateAndSubmit,
            "  Validation was successful",
        ));
        sink.event(ProgressEvent::new(
            Phase::ValidateAndSubmit,
            format!("  - Submitting the JSON-LD schema of {germplasm_id}"),
        ));
        let submitted = self.registry.submit(token, document)?;
        sink.event(ProgressEvent::new(
            Phase::ValidateAndSubmit,
            format!(
                "  Sample was successfully submitted as:\n    Name: {}\n    Accession: {}\n    URL: {}",
                submitted.name,
                submitted.accession,
                self.registry.sample_url(&submitted.accession)
            ),
        ));
        Ok(submitted)
    }
}

pub fn prepare_document(sample: &SampleSubmission, decode: &DecodeFields) -> Result<Value, BridgeError> {
    let mut document = sample.to_json()?;
    if let Value::Object(record) = &mut document {
        decode_base64(record, decode)?;
    }
    Ok(document)
}
