//! OAuth1 PLAINTEXT request signing for MAAS API keys.

use url::form_urlencoded::byte_serialize;

use crate::controller::ControllerError;

/// MAAS API key split into its OAuth parts.
///
/// A MAAS API key has the form `consumer_key:token_key:token_secret`. An
/// empty key yields anonymous credentials that sign nothing.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    consumer_key: String,
    token_key: String,
    token_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("token_key", &self.token_key)
            .field("token_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Parse a MAAS API key.
    ///
    /// # Errors
    /// Returns [`ControllerError::Config`] if a non-empty key does not have
    /// exactly three colon-separated parts.
    pub fn parse(api_key: &str) -> Result<Self, ControllerError> {
        if api_key.is_empty() {
            return Ok(Self::default());
        }

        let parts: Vec<&str> = api_key.split(':').collect();
        match parts.as_slice() {
            [consumer, token, secret] => Ok(Self {
                consumer_key: (*consumer).to_string(),
                token_key: (*token).to_string(),
                token_secret: (*secret).to_string(),
            }),
            _ => Err(ControllerError::Config(format!(
                "invalid API key: expected 3 ':'-separated parts, got {}",
                parts.len()
            ))),
        }
    }

    /// Whether requests go out unsigned.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.consumer_key.is_empty() && self.token_key.is_empty() && self.token_secret.is_empty()
    }

    /// Build the `Authorization` header value, or `None` when anonymous.
    #[must_use]
    pub fn authorization(&self) -> Option<String> {
        if self.is_anonymous() {
            return None;
        }
        let nonce = uuid::Uuid::new_v4().to_string();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        Some(self.header_value(&nonce, &timestamp))
    }

    fn header_value(&self, nonce: &str, timestamp: &str) -> String {
        let signature = format!("&{}", self.token_secret);
        let params = [
            ("oauth_consumer_key", self.consumer_key.as_str()),
            ("oauth_token", self.token_key.as_str()),
            ("oauth_signature_method", "PLAINTEXT"),
            ("oauth_signature", signature.as_str()),
            ("oauth_timestamp", timestamp),
            ("oauth_nonce", nonce),
            ("oauth_version", "1.0"),
        ];

        let rendered: Vec<String> = params
            .iter()
            .map(|(key, value)| {
                let encoded: String = byte_serialize(value.as_bytes()).collect();
                format!("{key}=\"{encoded}\"")
            })
            .collect();
        format!("OAuth {}", rendered.join(", "))
    }
}
