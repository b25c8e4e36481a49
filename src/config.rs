/// Runtime configuration
///
/// The only value read from the environment is the API credential.
/// Model and endpoint default to the Gemini image model and can be
/// overridden when embedding the client.

/// Environment variable holding the Gemini API key
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Image model used for every generation
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";

/// Base URL of the Generative Language REST API
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
}

impl Config {
    /// Read the credential from `GEMINI_API_KEY`.
    /// A missing or blank key is kept as `None`; it only fails when a
    /// generation is attempted.
    pub fn from_env() -> Self {
        Self::with_api_key(std::env::var(API_KEY_VAR).ok())
    }

    pub fn with_api_key(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Full URL of the `generateContent` method for the configured model
    pub fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

// Keep the key out of logs
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_key_is_missing() {
        assert!(!Config::with_api_key(Some("   ".into())).has_api_key());
        assert!(!Config::with_api_key(None).has_api_key());
        assert!(Config::with_api_key(Some("abc".into())).has_api_key());
    }

    #[test]
    fn test_generate_url() {
        let config = Config::with_api_key(None).with_endpoint("http://localhost:9000/v1beta/");
        assert_eq!(
            config.generate_url(),
            "http://localhost:9000/v1beta/models/gemini-2.5-flash-image:generateContent"
        );
    }

    #[test]
    fn test_model_override() {
        let config = Config::with_api_key(None).with_model("imagen-test");
        assert!(config.generate_url().ends_with("/models/imagen-test:generateContent"));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = Config::with_api_key(Some("secret-key".into()));
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("<redacted>"));
    }
}
