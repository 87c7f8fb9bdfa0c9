use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::BridgeError;

#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl Credentials {
    pub fn load(path: &Path) -> Result<Self, BridgeError> {
        let content = fs::read_to_string(path)
            .map_err(|_| BridgeError::CredentialsRead(path.to_path_buf()))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, BridgeError> {
        let raw: Credentials = serde_yaml::from_str(content)
            .map_err(|err| BridgeError::CredentialsParse(err.to_string()))?;
        Ok(Self {
            username: raw.username.trim().to_string(),
            password: raw.password.trim().to_string(),
        })
    }
}
