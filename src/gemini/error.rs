use std::error::Error as StdError;

/// Failures surfaced by an image generator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    /// No credential configured; no request was attempted
    #[error("API Key is missing. Please check your environment configuration ({0}).")]
    Configuration(String),

    /// Transport, HTTP or API-reported failure
    #[error("{0}")]
    Upstream(String),

    /// The response parsed but carried no inline image part
    #[error("No image data found in the response.")]
    NoImageData,
}

impl From<reqwest::Error> for GenerateError {
    fn from(err: reqwest::Error) -> Self {
        GenerateError::Upstream(error_chain(&err))
    }
}

/// Render an error followed by every `source()` below it, joined with ": ".
/// Causes whose text is already contained in the message so far are skipped.
pub fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !text.is_empty() && !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
