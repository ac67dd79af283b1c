use thiserror::Error;

/// Generation parameters passed through to the provider.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: Option<u32>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.7,
            max_output_tokens: None,
        }
    }
}

/// Errors from the text-generation call.
///
/// There is no retry here: a failed generation aborts the submission before
/// anything is written, and the user resubmits.
#[derive(Debug, Error)]
pub enum AiError {
    /// The request never completed (network failure, timeout).
    #[error("feedback request failed: {0}")]
    Request(String),

    /// The service answered with an error status.
    #[error("feedback service error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The service answered but produced no usable text.
    #[error("feedback service returned no text")]
    EmptyResponse,
}
