use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{info, warn};

/// Checks login credentials
#[async_trait::async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, username: &str, password: &str) -> bool;
}

#[derive(Debug, Deserialize)]
struct CredentialFileContents {
    #[serde(default)]
    users: HashMap<String, String>,
}

/// Credentials kept outside the binary, in a `[users]` table:
///
/// ```toml
/// [users]
/// client1 = "a long passphrase"
/// ```
pub struct CredentialFile {
    users: HashMap<String, String>,
}

impl CredentialFile {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()
            .with_context(|| format!("Failed to read credentials from {}", path))?;

        let contents: CredentialFileContents = settings
            .try_deserialize()
            .context("Invalid credentials file")?;

        info!("Loaded {} user credentials", contents.users.len());

        Ok(Self::from_users(contents.users))
    }

    pub fn from_users(users: HashMap<String, String>) -> Self {
        Self { users }
    }
}

#[async_trait::async_trait]
impl IdentityVerifier for CredentialFile {
    async fn verify(&self, username: &str, password: &str) -> bool {
        let valid = self
            .users
            .get(username)
            .is_some_and(|expected| !expected.is_empty() && expected == password);

        if !valid {
            warn!("Invalid login attempt for username: {}", username);
        }

        valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_verify() {
        let verifier = CredentialFile::from_users(HashMap::from([
            ("client1".to_string(), "secret".to_string()),
            ("blank".to_string(), String::new()),
        ]));

        assert!(verifier.verify("client1", "secret").await);
        assert!(!verifier.verify("client1", "wrong").await);
        assert!(!verifier.verify("nobody", "secret").await);
        assert!(!verifier.verify("blank", "").await);
    }

    #[test]
    fn test_load_from_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("credentials.toml");
        std::fs::write(&path, "[users]\nclient1 = \"secret\"\n")?;

        let verifier = CredentialFile::load(path.to_str().unwrap())?;
        assert_eq!(verifier.users.get("client1").map(String::as_str), Some("secret"));

        Ok(())
    }
}
