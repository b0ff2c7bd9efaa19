use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized - invalid credentials or token")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    /// The request reached the server but the envelope `status` was not "success".
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Could not read file: {0}")]
    FileRead(#[from] std::io::Error),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    /// True for transport-level failures (connect, timeout, TLS), as opposed
    /// to the server answering with an error.
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::NetworkError(_))
    }

    /// True when the server refused the credentials or the request itself.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            ApiError::Unauthorized | ApiError::AccessDenied(_) | ApiError::Rejected(_)
        )
    }

    /// Short, human-readable text for a notification.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized => "Invalid credentials".to_string(),
            ApiError::AccessDenied(_) => "You do not have access to this resource".to_string(),
            ApiError::NotFound(_) => "The requested record was not found".to_string(),
            ApiError::RateLimited => "Too many requests. Please wait and try again.".to_string(),
            ApiError::ServerError(_) => "The server ran into a problem. Try again later.".to_string(),
            ApiError::Rejected(message) => message.clone(),
            ApiError::NetworkError(e) if e.is_timeout() => {
                "Connection timed out. Please try again.".to_string()
            }
            ApiError::NetworkError(_) => {
                "Unable to connect to server. Check your internet connection.".to_string()
            }
            ApiError::InvalidResponse(_) => "Unexpected response from server".to_string(),
            ApiError::FileRead(_) => "Could not read the selected file".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, ""),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, "nope"),
            ApiError::AccessDenied(ref b) if b == "nope"
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, ""),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, ""),
            ApiError::RateLimited
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, ""),
            ApiError::ServerError(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_REQUEST, "bad"),
            ApiError::InvalidResponse(ref m) if m.contains("400")
        ));
    }

    #[test]
    fn test_truncate_body() {
        let long = "x".repeat(MAX_ERROR_BODY_LENGTH + 20);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.contains("truncated"));
        assert!(truncated.contains(&format!("{} total bytes", long.len())));

        assert_eq!(ApiError::truncate_body("short"), "short");
    }

    #[test]
    fn test_user_message_for_rejection_uses_server_text() {
        let err = ApiError::Rejected("Account disabled".to_string());
        assert_eq!(err.user_message(), "Account disabled");
        assert!(err.is_auth_failure());
        assert!(!err.is_network());
    }
}
