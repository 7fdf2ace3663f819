//! Access/secret key pair used to sign backend requests.

use super::settings::CredentialSettings;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Environment variable holding the access key.
pub const ACCESS_KEY_VAR: &str = "JIMENG_ACCESS_KEY";
/// Environment variable holding the secret key.
pub const SECRET_KEY_VAR: &str = "JIMENG_SECRET_KEY";

/// A complete credential pair. Only constructed when both halves are non-empty.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key: String,
    secret_key: String,
}

impl Credentials {
    /// Build credentials, returning `None` if either key is missing or blank.
    pub fn new(access_key: Option<String>, secret_key: Option<String>) -> Option<Self> {
        let access_key = access_key.filter(|k| !k.trim().is_empty())?;
        let secret_key = secret_key.filter(|k| !k.trim().is_empty())?;
        Some(Self {
            access_key,
            secret_key,
        })
    }

    /// Resolve credentials from a variable lookup, falling back to the config file values.
    pub fn resolve<F>(file: &CredentialSettings, lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        let access_key =
            non_empty(lookup(ACCESS_KEY_VAR)).or_else(|| non_empty(file.access_key.clone()));
        let secret_key =
            non_empty(lookup(SECRET_KEY_VAR)).or_else(|| non_empty(file.secret_key.clone()));

        Self::new(access_key, secret_key)
    }

    /// Load `.env` from the working directory, then `fallback` if the keys are still unset.
    ///
    /// Existing process variables are never overwritten.
    pub fn load_env_files(fallback: &Path) {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }

        if env_present(ACCESS_KEY_VAR) && env_present(SECRET_KEY_VAR) {
            return;
        }

        if fallback.exists() {
            match dotenvy::from_path(fallback) {
                Ok(()) => debug!("Loaded environment from {}", fallback.display()),
                Err(e) => debug!("Failed to load {}: {}", fallback.display(), e),
            }
        }
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// Access key with everything but the first and last four characters hidden.
    pub fn masked_access_key(&self) -> String {
        mask(&self.access_key)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.masked_access_key())
            .field("secret_key", &"****")
            .finish()
    }
}

fn env_present(name: &str) -> bool {
    std::env::var(name).is_ok_and(|v| !v.trim().is_empty())
}

/// Mask a secret for display.
pub(crate) fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 8), tail)
}
