use thiserror::Error;

/// nessie-wallet error types
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport failure (timeout, no connectivity, TLS)
    #[error("network error: {0}")]
    Network(String),

    /// Response body did not match the expected shape
    #[error("decode error for {resource}: {source}")]
    Decode {
        resource: String,
        #[source]
        source: serde_json::Error,
    },

    /// Lookup returned 404
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-success HTTP status
    #[error("http {status} from {path}: {body}")]
    Http {
        status: u16,
        path: String,
        body: String,
    },

    /// The source answered a lookup with a different record than requested
    #[error("requested customer {requested}, received {received}")]
    CustomerMismatch { requested: String, received: String },

    /// Caller supplied an unusable argument
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// A newer refresh started before this one could publish
    #[error("refresh superseded by a newer one")]
    Superseded,
}

impl FetchError {
    pub fn decode(resource: impl Into<String>, source: serde_json::Error) -> Self {
        FetchError::Decode {
            resource: resource.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound(_))
    }
}

// The request URL carries the API key, so it is stripped from the message
impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.without_url().to_string())
    }
}

/// Result type alias for nessie-wallet
pub type Result<T> = std::result::Result<T, FetchError>;
