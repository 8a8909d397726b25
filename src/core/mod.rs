//! Core business logic - framework-agnostic payment reconciliation.
//!
//! These modules hold the flows the transport layer drives: gateway-backed
//! payments, balance-backed payments, admin cash entries and balance
//! credits, and the ledgers they write to. Nothing in here knows about
//! Telegram; outcomes are returned as values and reported through the
//! [`crate::notify::Notifier`] capability.

/// Balance-backed payments and admin balance adjustments
pub mod balance;
/// Month-paid ledger access and the guarded history insert
pub mod history;
/// Gateway-backed payment flow: intent creation and confirmation polling
pub mod payment;
/// Student account lookups and atomic balance updates
pub mod student;
