//! Unified error type for the payment reconciliation core.
//!
//! Variants map to the error taxonomy the flows report to users and admins:
//! not-found, validation, business-rule conflict, external gateway failure,
//! and data-integrity anomalies. Struct-style variants carry the context a
//! caller needs to render a specific, corrective message.

use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration loading or validation failed.
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of the configuration problem
        message: String,
    },

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// No student with the given Telegram id exists.
    #[error("Student not found: {telegram_id}")]
    StudentNotFound {
        /// Telegram id used for the lookup
        telegram_id: String,
    },

    /// The student exists but has not completed registration.
    #[error("Student {telegram_id} has not completed registration")]
    NotRegistered {
        /// Telegram id of the unregistered account
        telegram_id: String,
    },

    /// The pricing table has no plan matching the student's class label.
    #[error("Cannot determine price for class '{class_label}'")]
    PriceNotFound {
        /// The free-text class/course label that failed to match
        class_label: String,
    },

    /// A completed payment already exists for this (student, month, year).
    #[error("Month {month}/{year} is already paid")]
    MonthAlreadyPaid {
        /// Target month (1-12)
        month: i32,
        /// Target year
        year: i32,
    },

    /// Month outside the 1-12 range reached a ledger operation.
    #[error("Invalid month: {month}")]
    InvalidMonth {
        /// The out-of-range month value
        month: i32,
    },

    /// Student balance does not cover the resolved price.
    #[error("Insufficient funds: required {required:.2}, available {available:.2}")]
    InsufficientFunds {
        /// Balance currently available
        available: f64,
        /// Amount the payment requires
        required: f64,
    },

    /// Free-text amount input that is not a positive decimal number.
    #[error("Invalid amount: '{input}'")]
    InvalidAmount {
        /// The raw text that failed to parse
        input: String,
    },

    /// Payment gateway create/query failure. Reported generically to the
    /// user; the detail here is for logs.
    #[error("Payment gateway error: {message}")]
    Gateway {
        /// Transport or gateway-side failure detail
        message: String,
    },

    /// A succeeded gateway intent has no matching local payment record.
    /// Data-integrity anomaly: logged, never papered over with a fabricated
    /// history record.
    #[error("Payment intent {gateway_id} not found locally")]
    IntentNotFound {
        /// Gateway-assigned payment id that failed the local lookup
        gateway_id: String,
    },
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
