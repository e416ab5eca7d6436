use std::net::IpAddr;
use std::time::Duration;

/// Every way an inspection request can fail.
///
/// All variants are terminal for the request that produced them; nothing is
/// retried and no partially rewritten page is ever returned.
#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    /// Missing, malformed or disallowed-scheme URL (HTTP 400, exit code 2)
    #[error("{0}")]
    InvalidInput(String),
    /// Target or redirect hop resolves to a private/reserved address (HTTP 400, exit code 3)
    #[error("Blocked private/localhost targets")]
    SecurityBlocked {
        host: String,
        addr: IpAddr,
        range: &'static str,
    },
    /// Final response is not HTML (HTTP 415, exit code 4)
    #[error("Target did not return HTML (content-type: {content_type})")]
    UnsupportedContent { content_type: String },
    /// Redirect chain longer than the configured maximum (HTTP 400, exit code 5)
    #[error("Too many redirects (limit {max})")]
    RedirectLoop { max: u32 },
    /// Overall deadline exceeded (HTTP 500, exit code 6)
    #[error("Timed out after {}ms fetching target", .0.as_millis())]
    Timeout(Duration),
    /// Resolution or transport failure (HTTP 500, exit code 7)
    #[error("Network error: {0}")]
    Network(String),
    /// Malformed redirect response (HTTP 400, exit code 8)
    #[error("Malformed redirect: {0}")]
    Protocol(String),
    /// Response body larger than the configured cap (HTTP 500, exit code 9)
    #[error("Response body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },
}

impl InspectError {
    /// HTTP status the retrieval endpoint answers with
    pub fn status_code(&self) -> u16 {
        match self {
            InspectError::InvalidInput(_)
            | InspectError::SecurityBlocked { .. }
            | InspectError::RedirectLoop { .. }
            | InspectError::Protocol(_) => 400,
            InspectError::UnsupportedContent { .. } => 415,
            InspectError::Timeout(_)
            | InspectError::Network(_)
            | InspectError::BodyTooLarge { .. } => 500,
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            InspectError::InvalidInput(_) => 2,
            InspectError::SecurityBlocked { .. } => 3,
            InspectError::UnsupportedContent { .. } => 4,
            InspectError::RedirectLoop { .. } => 5,
            InspectError::Timeout(_) => 6,
            InspectError::Network(_) => 7,
            InspectError::Protocol(_) => 8,
            InspectError::BodyTooLarge { .. } => 9,
        }
    }

    /// Message safe to hand back to the caller.
    ///
    /// Server-side failures are collapsed into a generic message; the detail
    /// only goes to the log.
    pub fn public_message(&self) -> String {
        if self.status_code() >= 500 {
            "Failed to fetch target".to_string()
        } else {
            self.to_string()
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        InspectError::InvalidInput(msg.into())
    }
}

impl From<reqwest::Error> for InspectError {
    fn from(err: reqwest::Error) -> Self {
        InspectError::Network(err.to_string())
    }
}

/// Exit code for errors that are not an [`InspectError`]
pub const EXIT_GENERIC: i32 = 1;

/// Pick the exit code for any error bubbling out of a command
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<InspectError>()
        .map(InspectError::exit_code)
        .unwrap_or(EXIT_GENERIC)
}

#[cfg(test)]
#[path = "errors_test.rs"]
mod errors_test;
