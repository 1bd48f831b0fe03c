/// Reasons a token can fail to issue or decode.
///
/// Decoding never yields partially trusted claims: any of these variants
/// means the whole token was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Malformed token")]
    Malformed,

    #[error("Unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token has expired")]
    Expired,

    #[error("Token claim mismatch: {0}")]
    ClaimMismatch(&'static str),

    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

/// Failure inside the credential hasher.
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("Invalid hasher configuration: {0}")]
    Config(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

/// A required configuration value is missing or unparsable.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}
