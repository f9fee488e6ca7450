use thiserror::Error;

/// Core error type for beacon operations.
#[derive(Error, Debug)]
pub enum BeaconError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request never produced a response (DNS, connect, timeout, body read).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote service answered with a status other than the expected one.
    #[error("Bad {service} response, code {status}: {body}")]
    UnexpectedStatus {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// The response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Member {name} failed: {reason}")]
    MemberFailed { name: String, reason: String },

    #[error("Member {0} exited unexpectedly")]
    MemberExited(String),

    #[error("Member {0} exited before becoming ready")]
    MemberNotReady(String),

    #[error("Process group aborted: {}", .0.join("; "))]
    GroupAborted(Vec<String>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BeaconError {
    /// Status code carried by an unexpected-status error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for BeaconError {
    fn from(e: serde_json::Error) -> Self {
        BeaconError::Serialization(e.to_string())
    }
}

/// Result type alias using BeaconError.
pub type Result<T> = std::result::Result<T, BeaconError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_status_message() {
        let err = BeaconError::UnexpectedStatus {
            service: "registry",
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Bad registry response, code 500: boom");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_group_aborted_joins_reasons() {
        let err = BeaconError::GroupAborted(vec![
            "Member a failed: x".to_string(),
            "Member b exited unexpectedly".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "Process group aborted: Member a failed: x; Member b exited unexpectedly"
        );
        assert_eq!(err.status(), None);
    }
}
