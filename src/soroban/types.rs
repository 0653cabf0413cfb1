//! Soroban-specific types and error definitions.

use thiserror::Error;

// Re-export SorobanConfig from config module to avoid duplication
pub use crate::config::schema::SorobanConfig;

/// Errors raised while converting values to or from the contract wire format.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Text is not a well-formed strkey of the expected kind.
    #[error("Invalid address '{input}': {reason}")]
    InvalidAddress { input: String, reason: &'static str },

    /// Amount text is empty, non-numeric, negative or too large.
    #[error("Invalid amount '{0}': expected a non-negative base-10 integer below 2^127")]
    InvalidAmount(String),

    /// Integer text is empty or contains non-digit characters.
    #[error("Invalid {kind} '{input}': expected a base-10 integer")]
    InvalidInteger { input: String, kind: &'static str },

    /// Integer text does not fit the target width.
    #[error("Integer '{input}' out of range for {kind}")]
    IntegerOutOfRange { input: String, kind: &'static str },

    /// A value exceeds its wire-format length bound.
    #[error("{what} length {len} exceeds maximum {max}")]
    LengthExceeded {
        what: &'static str,
        len: usize,
        max: usize,
    },

    /// Symbol contains characters outside `[A-Za-z0-9_]`.
    #[error("Invalid symbol '{0}'")]
    InvalidSymbol(String),

    /// Bytes are not valid XDR for the expected type, or exceed its limits.
    #[error("XDR error: {0}")]
    Xdr(#[from] stellar_xdr::curr::Error),

    /// Decoded value has a different shape than the schema requires.
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Record field missing or out of schema order.
    #[error("Expected field '{expected}' at position {position}, found {found:?}")]
    FieldMismatch {
        expected: &'static str,
        position: usize,
        found: Option<String>,
    },

    /// Enum variant name unknown to the schema.
    #[error("Unknown {enum_name} variant '{variant}'")]
    UnknownVariant {
        enum_name: &'static str,
        variant: String,
    },
}

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while talking to the Soroban RPC endpoint.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Connection or HTTP-level failure.
    #[error("RPC transport error: {0}")]
    Transport(String),

    /// Request exceeded the configured timeout.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Endpoint returned a JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    Server { code: i64, message: String },

    /// Endpoint replied with something we could not interpret.
    #[error("Malformed RPC response: {0}")]
    Malformed(String),

    /// Requested account has no ledger entry.
    #[error("Account {0} not found on ledger")]
    AccountNotFound(String),
}

/// Result type for RPC operations.
pub type RpcResult<T> = Result<T, RpcError>;

impl From<CodecError> for RpcError {
    fn from(err: CodecError) -> Self {
        RpcError::Malformed(err.to_string())
    }
}

/// Why an envelope is being built; selects fee and source-account policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Zero-fee dry run from the contract-derived placeholder account.
    Read,
    /// Fee-bearing transaction from the signer's live account.
    Write,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Read => "read",
            Intent::Write => "write",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RpcError::Timeout(10);
        assert_eq!(err.to_string(), "RPC timeout after 10 seconds");

        let err = CodecError::LengthExceeded {
            what: "symbol",
            len: 40,
            max: 32,
        };
        assert_eq!(err.to_string(), "symbol length 40 exceeds maximum 32");
    }

    #[test]
    fn test_codec_error_becomes_malformed_rpc() {
        let err: RpcError = CodecError::Xdr(stellar_xdr::curr::Error::Invalid).into();
        assert!(matches!(err, RpcError::Malformed(_)));
    }
}
