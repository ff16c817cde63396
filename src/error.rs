//! Error types for the priority bias webhook

use thiserror::Error;

/// Main error type for webhook operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The admitted object is not of the type the defaulter handles
    #[error("expected a {expected} object but got {found}")]
    TypeMismatch {
        /// Kind the defaulter was registered for
        expected: String,
        /// apiVersion/kind actually presented
        found: String,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Kubernetes API error
    #[error("kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Configuration error (TLS material, CLI input)
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTPS listener error
    #[error("server error: {0}")]
    Server(String),
}

impl Error {
    /// Create a type mismatch error
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create a configuration error with the given message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a server error with the given message
    pub fn server(msg: impl Into<String>) -> Self {
        Self::Server(msg.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Story: a Deployment routed to the Pod defaulter names both types
    #[test]
    fn story_type_mismatch_names_expected_and_found() {
        let err = Error::type_mismatch("Pod", "apps/v1/Deployment");
        assert_eq!(
            err.to_string(),
            "expected a Pod object but got apps/v1/Deployment"
        );

        match err {
            Error::TypeMismatch { expected, found } => {
                assert_eq!(expected, "Pod");
                assert_eq!(found, "apps/v1/Deployment");
            }
            _ => panic!("Expected TypeMismatch variant"),
        }
    }

    #[test]
    fn test_serde_json_error_converts_to_serialization() {
        let err: Error = serde_json::from_str::<()>("invalid").unwrap_err().into();
        assert!(err.to_string().contains("serialization error"));
    }

    #[test]
    fn test_constructors() {
        assert!(Error::config("missing tls.crt")
            .to_string()
            .contains("configuration error: missing tls.crt"));
        assert!(Error::server("bind failed")
            .to_string()
            .contains("server error: bind failed"));
        assert!(Error::serialization("bad patch")
            .to_string()
            .contains("bad patch"));
    }
}
