//! Secure credential handling for provider adapters.
//!
//! Every adapter stores its API key as an [`ApiCredential`] so the value
//! cannot leak through `Debug`/`Display` output and is zeroed on drop. The
//! key is exposed only at the point it is written into a request.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

use crate::capabilities::CapabilityError;

/// Where a credential was loaded from. Useful when debugging configuration
/// without exposing the value itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Loaded from an environment variable.
    Environment,
    /// Provided programmatically.
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// A securely-stored API key.
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    name: &'static str,
}

impl ApiCredential {
    /// Wrap a key value. After this point the value can no longer be
    /// accidentally formatted or logged.
    pub fn new(value: impl Into<String>, source: CredentialSource, name: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            name,
        }
    }

    /// Load the key from an environment variable.
    ///
    /// `name` is the human-readable label used in error messages, e.g.
    /// "OpenAI API key".
    pub fn from_env(env_var: &str, name: &'static str) -> Result<Self, CapabilityError> {
        std::env::var(env_var)
            .map(|v| Self::new(v, CredentialSource::Environment, name))
            .map_err(|_| {
                CapabilityError::NotConfigured(format!(
                    "{name} not set: configure the '{env_var}' environment variable"
                ))
            })
    }

    /// Expose the key for use in a request. Call this at the point of use
    /// only; never store the exposed value.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.value.expose_secret().is_empty()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} [REDACTED]", self.name, self.source)
    }
}
