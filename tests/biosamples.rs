use std::collections::VecDeque;
use std::sync::Mutex;

use assert_matches::assert_matches;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap};
use serde_json::{Value, json};

use brapi2biosamples::biosamples::{BioSamplesHttpClient, SampleRegistry};
use brapi2biosamples::endpoints::{Endpoints, Environment};
use brapi2biosamples::error::BridgeError;
use brapi2biosamples::http::{HttpReply, Transport, TransportError};

#[derive(Debug, Clone, PartialEq)]
enum Sent {
    Auth {
        url: String,
        username: String,
        password: String,
    },
    Post {
        url: String,
        headers: HeaderMap,
        body: Value,
    },
}

struct RecordingTransport {
    replies: Mutex<VecDeque<HttpReply>>,
    sent: Mutex<Vec<Sent>>,
}

impl RecordingTransport {
    fn new(replies: Vec<HttpReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            sent: Mutex::new(Vec::new()),
        }
    }

    fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    fn reply(&self) -> Result<HttpReply, TransportError> {
        Ok(self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected request"))
    }
}

impl Transport for RecordingTransport {
    fn get(&self, url: &str, _: &[(&str, String)]) -> Result<HttpReply, TransportError> {
        panic!("unexpected GET to {url}")
    }

    fn get_basic_auth(
        &self,
        url: &str,
        username: &str,
        password: &str,
    ) -> Result<HttpReply, TransportError> {
        self.sent.lock().unwrap().push(Sent::Auth {
            url: url.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        });
        self.reply()
    }

    fn post(&self, url: &str, headers: HeaderMap, body: Vec<u8>) -> Result<HttpReply, TransportError> {
        self.sent.lock().unwrap().push(Sent::Post {
            url: url.to_string(),
            headers,
            body: serde_json::from_slice(&body).unwrap(),
        });
        self.reply()
    }
}

fn registry(replies: Vec<HttpReply>) -> BioSamplesHttpClient<RecordingTransport> {
    BioSamplesHttpClient::with_transport(
        RecordingTransport::new(replies),
        Endpoints::resolve(Environment::Dev),
    )
}

fn sample() -> Value {
    json!({
        "name": "G1",
        "domain": "self.Test",
        "release": "2021-01-20T17:05:13Z",
        "characteristics": {"genus": [{"text": "Zea"}]}
    })
}

#[test]
fn token_is_fetched_with_basic_auth_and_trimmed() {
    let registry = registry(vec![HttpReply::new(200, "eyJhbGciOi.token\n")]);
    let token = registry.fetch_token("Webin-1", "secret").unwrap();
    assert_eq!(token, "eyJhbGciOi.token");
    assert_eq!(
        registry.transport().sent(),
        vec![Sent::Auth {
            url: "https://explore.api.aai.ebi.ac.uk/auth".to_string(),
            username: "Webin-1".to_string(),
            password: "secret".to_string(),
        }]
    );
}

#[test]
fn rejected_credentials_fail_authentication() {
    let registry = registry(vec![HttpReply::new(401, "Bad credentials")]);
    let err = registry.fetch_token("Webin-1", "wrong").unwrap_err();
    assert_matches!(
        err,
        BridgeError::AuthFailed { status: 401, ref message } if message == "Bad credentials"
    );
}

#[test]
fn posts_carry_bearer_and_content_headers() {
    let registry = registry(vec![
        HttpReply::new(200, "[]"),
        HttpReply::new(201, r#"{"name": "G1", "accession": "SAMEA0001", "domain": "self.Test"}"#),
    ]);
    registry.validate("tok", &sample()).unwrap();
    let submitted = registry.submit("tok", &sample()).unwrap();
    assert_eq!(submitted.name, "G1");
    assert_eq!(submitted.accession, "SAMEA0001");

    let sent = registry.transport().sent();
    assert_eq!(sent.len(), 2);
    let urls = ["https://wwwdev.ebi.ac.uk/biosamples/validate", "https://wwwdev.ebi.ac.uk/biosamples/samples/"];
    for (request, expected_url) in sent.iter().zip(urls) {
        let Sent::Post { url, headers, body } = request else {
            panic!("expected a POST, got {request:?}");
        };
        assert_eq!(url, expected_url);
        assert_eq!(headers[AUTHORIZATION], "Bearer tok");
        assert_eq!(headers[CONTENT_TYPE], "application/json;charset=UTF-8");
        assert_eq!(headers[ACCEPT], "application/hal+json");
        assert_eq!(body, &sample());
    }
}

#[test]
fn validation_accepts_created() {
    let registry = registry(vec![HttpReply::new(201, "")]);
    registry.validate("tok", &sample()).unwrap();
}

#[test]
fn validation_errors_are_fatal() {
    let registry = registry(vec![HttpReply::new(400, r#"[{"errors": ["genus"]}]"#)]);
    let err = registry.validate("tok", &sample()).unwrap_err();
    assert_matches!(
        err,
        BridgeError::RequestFailed { status: 400, ref url } if url.ends_with("/biosamples/validate")
    );
}

#[test]
fn submission_requires_created() {
    let registry = registry(vec![HttpReply::new(200, r#"{"name": "G1", "accession": "SAMEA0001"}"#)]);
    let err = registry.submit("tok", &sample()).unwrap_err();
    assert_matches!(err, BridgeError::RequestFailed { status: 200, .. });
}

#[test]
fn submission_without_accession_is_invalid() {
    let registry = registry(vec![HttpReply::new(201, r#"{"name": "G1"}"#)]);
    let err = registry.submit("tok", &sample()).unwrap_err();
    assert_matches!(err, BridgeError::InvalidResponse(_));
}

#[test]
fn sample_urls_use_the_environment() {
    let registry = registry(Vec::new());
    assert_eq!(
        registry.sample_url("SAMEA0001"),
        "https://wwwdev.ebi.ac.uk/biosamples/samples/SAMEA0001"
    );
}
