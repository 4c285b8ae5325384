//! Error types for the Voluntar client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the Voluntar client
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// The GraphQL response carried errors; holds the first message
    #[error("GraphQL error: {message}")]
    GraphQl {
        message: String,
        /// The `code` extension, when the server sent one
        code: Option<String>,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// The server refused the credentials
    #[error("Login failed: {0}")]
    LoginFailed(String),

    /// The operation needs a token and none is stored
    #[error("Not logged in")]
    NotLoggedIn,

    /// The live event connection could not be re-established
    #[error("Could not reconnect to the event stream after {0} attempts")]
    ReconnectFailed(u32),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. }) || self.has_code("NOT_FOUND")
    }

    /// Check if the server rejected the caller's identity or rights
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Self::NotLoggedIn | Self::LoginFailed(_) | Self::ApiError { status: 401 | 403, .. }
        ) || self.has_code("UNAUTHENTICATED")
            || self.has_code("FORBIDDEN")
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 400 && *status < 500)
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }

    /// Whether repeating the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RequestFailed(_)) || self.is_server_error()
    }

    fn has_code(&self, expected: &str) -> bool {
        matches!(self, Self::GraphQl { code: Some(code), .. } if code == expected)
    }
}
