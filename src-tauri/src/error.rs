use serde::Deserialize;

/// Error code the status endpoint reports when the game server refuses connections
pub const CONNECTION_REFUSED_CODE: &str = "ECONNREFUSED";

#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The endpoint reached the game server host, which refused the connection
    ConnectionRefused,
    /// The endpoint answered with any other error payload
    Upstream {
        code: Option<String>,
        message: Option<String>,
    },
    /// The request to the endpoint itself could not be completed
    Network(String),
    /// Non-success HTTP status without a recognizable error payload
    Http(u16),
    /// Success payload missing expected fields, or not JSON at all
    Parse(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::ConnectionRefused => write!(f, "Server refused the connection"),
            FetchError::Upstream { code, message } => {
                let code = code.as_deref().unwrap_or("no code");
                if let Some(message) = message {
                    write!(f, "Ping failed: {} ({})", message, code)
                } else {
                    write!(f, "Ping failed: {}", code)
                }
            }
            FetchError::Network(msg) => write!(f, "Network error: {}", msg),
            FetchError::Http(status) => write!(f, "HTTP error: {}", status),
            FetchError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

impl FetchError {
    /// Build the error for an error payload returned by the status endpoint
    pub fn from_upstream(code: Option<String>, message: Option<String>) -> Self {
        if code.as_deref() == Some(CONNECTION_REFUSED_CODE) {
            FetchError::ConnectionRefused
        } else {
            FetchError::Upstream { code, message }
        }
    }

    /// Returns true if the game server host is known to be down
    pub fn is_connection_refused(&self) -> bool {
        matches!(self, FetchError::ConnectionRefused)
    }

    /// Get a short error category for logging and tooltips
    pub fn category(&self) -> &'static str {
        match self {
            FetchError::ConnectionRefused => "Offline",
            FetchError::Upstream { .. } => "Ping Failed",
            FetchError::Network(_) => "Unreachable",
            FetchError::Http(_) => "Bad Status",
            FetchError::Parse(_) => "Malformed Response",
        }
    }
}

impl From<wreq::Error> for FetchError {
    fn from(e: wreq::Error) -> Self {
        FetchError::Network(format!("Request failed: {}", e))
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Parse(format!("Failed to parse response: {}", e))
    }
}

/// Error payload shape: `{ "error": { "code": "...", ... } }`
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
