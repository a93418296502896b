/// Failures talking to the CMS delivery API.
///
/// A query that matches nothing is not an error: lookups return
/// `Ok(None)` for that case.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, body).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered with a non-2xx status code.
    #[error("CMS API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The API could not be reached for a reason other than an HTTP error.
    #[error("CMS unavailable: {0}")]
    Unavailable(String),

    /// The response did not have the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// The client could not be built from the given settings.
    #[error("Invalid client configuration: {0}")]
    Config(String),
}

impl DeliveryError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            DeliveryError::Request(err) => !err.is_decode() && !err.is_builder(),
            DeliveryError::Api { status, .. } => *status >= 500 || *status == 429,
            DeliveryError::Unavailable(_) => true,
            DeliveryError::Decode(_) | DeliveryError::Config(_) => false,
        }
    }
}

impl From<stacksite_core::Error> for DeliveryError {
    fn from(err: stacksite_core::Error) -> Self {
        DeliveryError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DeliveryError>;
