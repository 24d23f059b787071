//! Error Types for the C3 Feed Core
//!
//! Typed failures of the output locator and the datum decoder. Failures are
//! never retried and never swallowed: the ledger data is either well-formed
//! or it is not, and the caller decides how to report it.

use core::fmt;

use crate::plutus::DataKind;
use crate::types::{AssetFingerprint, MatchMode};

/// Result type alias for feed operations
pub type FeedResult<T> = Result<T, FeedError>;

/// Main error enum for the locator and decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    // ============ Locator Errors ============
    /// No output matches the fingerprint under the requested mode
    NotFound {
        fingerprint: AssetFingerprint,
        mode: MatchMode,
    },

    /// Several outputs match where a unique match is required
    AmbiguousMatch {
        fingerprint: AssetFingerprint,
        mode: MatchMode,
        matches: usize,
    },

    // ============ Datum Errors ============
    /// Datum does not parse, or its shape differs from the expected record
    MalformedDatum {
        /// Record being decoded when the check failed
        record: &'static str,
        reason: MalformedReason,
    },

    /// The located output carries no datum
    MissingDatum { tx_hash: String, output_index: u32 },

    // ============ Input Validation Errors ============
    /// Invalid input parameter (hex, lengths, timestamps)
    InvalidInput { param: &'static str, reason: String },
}

/// Structural check that rejected a datum
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    /// Bytes are not valid CBOR
    InvalidCbor(String),

    /// Bytes remain after the top-level value
    TrailingBytes { remaining: usize },

    /// CBOR value with no Plutus data counterpart (text, float, bool, null)
    UnsupportedValue { found: &'static str },

    /// CBOR tag that is neither a constructor nor a big integer
    UnknownTag { tag: u64 },

    /// Value of the wrong kind
    UnexpectedKind { expected: DataKind, found: DataKind },

    /// Constructor alternative differs from the record's tag
    UnexpectedTag { expected: u64, found: u64 },

    /// Constructor field count differs from the record's
    UnexpectedArity { expected: usize, found: usize },

    /// Field requested past the end of the constructor
    MissingField { index: usize },

    /// Integer does not fit the target width
    IntegerOutOfRange { target: &'static str },

    /// Required map key absent
    MissingKey { key: i128 },

    /// Map key present twice
    DuplicateKey { key: i128 },
}

impl FeedError {
    /// Shorthand for a decode failure in `record`
    pub fn malformed(record: &'static str, reason: MalformedReason) -> Self {
        Self::MalformedDatum { record, reason }
    }

    /// Returns a stable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "E001_OUTPUT_NOT_FOUND",
            Self::AmbiguousMatch { .. } => "E002_AMBIGUOUS_MATCH",
            Self::MalformedDatum { .. } => "E010_MALFORMED_DATUM",
            Self::MissingDatum { .. } => "E011_MISSING_DATUM",
            Self::InvalidInput { .. } => "E090_INVALID_INPUT",
        }
    }

    /// Returns true if the failure comes from the datum contents
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, Self::MalformedDatum { .. } | Self::MissingDatum { .. })
    }
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { fingerprint, mode } => {
                write!(f, "no output holds {fingerprint} ({mode} match)")
            }
            Self::AmbiguousMatch {
                fingerprint,
                mode,
                matches,
            } => write!(
                f,
                "{matches} outputs hold {fingerprint} ({mode} match), expected exactly one"
            ),
            Self::MalformedDatum { record, reason } => {
                write!(f, "malformed {record} datum: {reason}")
            }
            Self::MissingDatum {
                tx_hash,
                output_index,
            } => write!(f, "output {tx_hash}#{output_index} carries no datum"),
            Self::InvalidInput { param, reason } => write!(f, "invalid {param}: {reason}"),
        }
    }
}

impl std::error::Error for FeedError {}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCbor(err) => write!(f, "invalid CBOR: {err}"),
            Self::TrailingBytes { remaining } => {
                write!(f, "{remaining} trailing bytes after datum")
            }
            Self::UnsupportedValue { found } => write!(f, "unsupported CBOR {found}"),
            Self::UnknownTag { tag } => write!(f, "unknown CBOR tag {tag}"),
            Self::UnexpectedKind { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            Self::UnexpectedTag { expected, found } => {
                write!(f, "expected constructor {expected}, found constructor {found}")
            }
            Self::UnexpectedArity { expected, found } => {
                write!(f, "expected {expected} fields, found {found}")
            }
            Self::MissingField { index } => write!(f, "missing field {index}"),
            Self::IntegerOutOfRange { target } => write!(f, "integer does not fit {target}"),
            Self::MissingKey { key } => write!(f, "missing map key {key}"),
            Self::DuplicateKey { key } => write!(f, "duplicate map key {key}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crate::types::PolicyId;

    #[test]
    fn test_error_codes_unique() {
        let fingerprint = AssetFingerprint::oracle_feed(PolicyId::new([7u8; 28]));
        let errors = [
            FeedError::NotFound {
                fingerprint: fingerprint.clone(),
                mode: MatchMode::Exact,
            },
            FeedError::AmbiguousMatch {
                fingerprint,
                mode: MatchMode::Exact,
                matches: 2,
            },
            FeedError::malformed("PriceData", MalformedReason::MissingField { index: 0 }),
            FeedError::MissingDatum {
                tx_hash: "00".into(),
                output_index: 0,
            },
            FeedError::InvalidInput {
                param: "policy_id",
                reason: "bad hex".into(),
            },
        ];

        let codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        let unique: BTreeSet<_> = codes.iter().collect();
        assert_eq!(codes.len(), unique.len(), "Error codes must be unique");
    }

    #[test]
    fn test_malformed_display_carries_expected_and_found() {
        let err = FeedError::malformed(
            "OracleSettings",
            MalformedReason::UnexpectedArity {
                expected: 11,
                found: 10,
            },
        );
        assert_eq!(
            err.to_string(),
            "malformed OracleSettings datum: expected 11 fields, found 10"
        );
        assert!(err.is_decode_failure());
    }
}
