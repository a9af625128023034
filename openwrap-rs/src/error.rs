use std::fmt;
use thiserror::Error;

/// Categories of failure surfaced to a [`BannerEventListener`](crate::BannerEventListener).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidRequest,
    NetworkError,
    NoFillAvailable,
    /// A partner win signal arrived after the ad server creative was already declared the winner.
    SignalingMismatch,
    /// Any ad server failure without a more specific mapping.
    InternalError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::NetworkError => "network_error",
            Self::NoFillAvailable => "no_fill",
            Self::SignalingMismatch => "signaling_mismatch",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn signaling_mismatch() -> Self {
        Self::new(ErrorKind::SignalingMismatch, "ad server mismatched bid win signal")
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Ad-request error codes shared by the supported ad servers.
pub mod codes {
    pub const INTERNAL_ERROR: i32 = 0;
    pub const INVALID_REQUEST: i32 = 1;
    pub const NETWORK_ERROR: i32 = 2;
    pub const NO_FILL: i32 = 3;
}

/// Translates an ad server's numeric load failure into an [`Error`].
///
/// `source` names the ad server in the resulting message.
pub fn error_from_code(source: &str, code: i32) -> Error {
    match code {
        codes::INVALID_REQUEST => {
            Error::new(ErrorKind::InvalidRequest, format!("{source} gives invalid request error"))
        }
        codes::NETWORK_ERROR => {
            Error::new(ErrorKind::NetworkError, format!("{source} gives network error"))
        }
        codes::NO_FILL => {
            Error::new(ErrorKind::NoFillAvailable, format!("{source} gives no fill error"))
        }
        code => {
            Error::new(ErrorKind::InternalError, format!("{source} failed with error code: {code}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_codes() {
        assert_eq!(error_from_code("dfp", 1).kind, ErrorKind::InvalidRequest);
        assert_eq!(error_from_code("dfp", 2).kind, ErrorKind::NetworkError);
        assert_eq!(error_from_code("dfp", 3).kind, ErrorKind::NoFillAvailable);
    }

    #[test]
    fn unknown_codes_are_internal() {
        for code in [0, 4, -1, 42] {
            let err = error_from_code("dfp", code);
            assert_eq!(err.kind, ErrorKind::InternalError);
            assert!(err.message.ends_with(&code.to_string()));
        }
    }

    #[test]
    fn display_includes_kind() {
        let err = Error::signaling_mismatch();
        assert_eq!(err.to_string(), "signaling_mismatch: ad server mismatched bid win signal");
    }
}
