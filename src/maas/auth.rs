use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::common::{CredentialSnafu, Error, Result};

// MAAS issues tokens without a consumer secret.
const CONSUMER_SECRET: &str = "";

/// An API key of the form `key:token:secret`.
#[derive(Clone, PartialEq)]
pub struct Credential {
    key: String,
    token: String,
    secret: String,
}

impl Credential {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Build the `Authorization` header value for one request.
    ///
    /// One-legged OAuth 1.0 with the PLAINTEXT method, so nothing about the
    /// request itself is signed.
    pub(super) fn authorization(&self) -> String {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        self.authorization_with(&nonce, timestamp)
    }

    fn authorization_with(&self, nonce: &str, timestamp: u64) -> String {
        let signature = format!(
            "{}&{}",
            urlencoding::encode(CONSUMER_SECRET),
            urlencoding::encode(&self.secret)
        );
        let params = [
            ("oauth_nonce", nonce.to_string()),
            ("oauth_timestamp", timestamp.to_string()),
            ("oauth_version", "1.0".to_string()),
            ("oauth_signature_method", "PLAINTEXT".to_string()),
            ("oauth_consumer_key", self.key.clone()),
            ("oauth_token", self.token.clone()),
            ("oauth_signature", signature),
        ];

        let fields: Vec<String> = params
            .iter()
            .map(|(name, value)| format!("{name}=\"{}\"", urlencoding::encode(value)))
            .collect();
        format!("OAuth {}", fields.join(", "))
    }
}

impl FromStr for Credential {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [key, token, secret] => Ok(Self {
                key: key.to_string(),
                token: token.to_string(),
                secret: secret.to_string(),
            }),
            _ => CredentialSnafu {
                message: format!(
                    "expected key:token:secret, found {} part(s)",
                    parts.len()
                ),
            }
            .fail(),
        }
    }
}

// Keep the secret out of logs.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("key", &self.key)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}
