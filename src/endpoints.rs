use std::fmt;
use std::str::FromStr;

use crate::error::BridgeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Dev,
    #[default]
    Stable,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Dev => write!(f, "dev"),
            Environment::Stable => write!(f, "stable"),
        }
    }
}

impl FromStr for Environment {
    type Err = BridgeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "stable" => Ok(Environment::Stable),
            _ => Err(BridgeError::InvalidEnvironment(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub token: String,
    pub validate: String,
    pub submit: String,
    pub sample: String,
}

impl Endpoints {
    pub fn resolve(environment: Environment) -> Self {
        match environment {
            Environment::Dev => Self {
                token: "https://explore.api.aai.ebi.ac.uk/auth".to_string(),
                validate: "https://wwwdev.ebi.ac.uk/biosamples/validate".to_string(),
                submit: "https://wwwdev.ebi.ac.uk/biosamples/samples/".to_string(),
                sample: "https://wwwdev.ebi.ac.uk/biosamples/samples/".to_string(),
            },
            Environment::Stable => Self {
                token: "https://api.aai.ebi.ac.uk/auth".to_string(),
                validate: "https://www.ebi.ac.uk/biosamples/validate".to_string(),
                submit: "https://www.ebi.ac.uk/biosamples/samples".to_string(),
                sample: "https://www.ebi.ac.uk/biosamples/samples/".to_string(),
            },
        }
    }

    pub fn sample_url(&self, accession: &str) -> String {
        format!("{}{}", self.sample, accession)
    }
}
