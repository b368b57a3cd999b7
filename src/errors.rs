use axum::http::StatusCode;

/// Failure talking to the assessment backend.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Connection refused, timeout, non-2xx status or an unreadable body.
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Body said `OK` but did not have the expected shape.
    #[error("backend response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    /// Decoded body carried a `code` other than `OK`.
    #[error("backend rejected the request: {}", .message.as_deref().unwrap_or("no message"))]
    Rejected { message: Option<String> },
}

impl ApiError {
    pub fn rejected(message: Option<String>) -> Self {
        Self::Rejected {
            message: message.filter(|m| !m.trim().is_empty()),
        }
    }

    /// Text shown to the field worker for this failure.
    pub fn user_message(&self, rejected_fallback: &str, transport_fallback: &str) -> String {
        match self {
            Self::Rejected {
                message: Some(message),
            } => message.clone(),
            Self::Rejected { message: None } => rejected_fallback.to_string(),
            Self::Transport(_) | Self::Decode(_) => transport_fallback.to_string(),
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_prefers_server_message() {
        let err = ApiError::rejected(Some("Duplicate contact number".to_string()));
        assert_eq!(
            err.user_message("fallback", "network"),
            "Duplicate contact number"
        );
    }

    #[test]
    fn blank_server_message_uses_fallback() {
        let err = ApiError::rejected(Some("   ".to_string()));
        assert_eq!(err.user_message("fallback", "network"), "fallback");
        assert!(err.is_rejection());
    }

    #[test]
    fn decode_failure_reads_as_transport() {
        let err = ApiError::from(serde_json::from_str::<u32>("\"x\"").unwrap_err());
        assert_eq!(err.user_message("fallback", "network"), "network");
        assert!(!err.is_rejection());
    }
}
