//! Error types for deterministic arithmetic and identifier validation
//!
//! Arithmetic in the ledger never panics. Operations that cannot produce a
//! value (a zero denominator, a result wider than 256 bits) return one of the
//! variants below so callers can surface a validation failure instead.

use thiserror::Error;

/// Errors raised while parsing or validating ledger identifiers and requests
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Asset string did not match `CHAIN<sep>SYMBOL`
    #[error("invalid asset '{input}': expected CHAIN.SYMBOL, CHAIN/SYMBOL, CHAIN~SYMBOL or CHAIN-SYMBOL")]
    InvalidAsset { input: String },

    /// Transaction reference was not 64 hex characters
    #[error("invalid tx id '{input}': expected 64 hex characters")]
    InvalidTxId { input: String },

    /// Address was empty
    #[error("address cannot be empty")]
    EmptyAddress,

    /// Amount was zero where a positive amount is required
    #[error("{field} amount cannot be zero")]
    ZeroAmount { field: &'static str },

    /// Basis points outside the accepted range
    #[error("basis points {value} is outside ({min}, {max}]")]
    InvalidBasisPoints { value: u64, min: u64, max: u64 },

    /// Custom validation failure with message
    #[error("validation failed: {message}")]
    Custom { message: String },
}

/// Errors that can occur during fixed-point and wide integer arithmetic
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MathError {
    /// Result does not fit in 256 bits
    #[error("arithmetic overflow in {operation}")]
    Overflow { operation: &'static str },

    /// Division by zero
    #[error("division by zero in {operation}")]
    DivisionByZero { operation: &'static str },

    /// Invalid integer or decimal string
    #[error("invalid number '{input}'")]
    InvalidNumber { input: String },
}
