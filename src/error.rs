use reqwest::StatusCode;

/// Errors that abort a forwarding invocation (or start-up, for configuration).
#[derive(Debug, thiserror::Error)]
pub enum ForwarderError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse {stage} payload as JSON: {source}")]
    Parse {
        stage: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Envelope value is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Envelope value is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Envelope value is not valid JSON: {0}")]
    EnvelopeValue(#[source] serde_json::Error),

    #[error("Envelope value must be a string")]
    EnvelopeValueType,

    #[error("Failed to serialize batch: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Error posting to API endpoint: {status}: {body}")]
    Delivery { status: StatusCode, body: String },

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),
}
