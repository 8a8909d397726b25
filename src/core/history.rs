//! Month-paid ledger access.
//!
//! The payment history table is the source of truth for "has this month
//! been paid". All writes go through [`insert_completed_record`], which
//! re-checks the already-paid guard against the same connection it inserts
//! on - callers run it inside a database transaction so the guard and the
//! write are atomic with respect to concurrent polls or concurrent
//! admin+user payments of the same month.

use crate::{
    entities::{PaymentHistory, payment_history},
    errors::{Error, Result},
};
use sea_orm::{ActiveValue::Set, QueryOrder, prelude::*};
use tracing::info;

/// Status every history record carries once written
pub const STATUS_COMPLETED: &str = "completed";

/// Payment type for gateway-confirmed months
pub const TYPE_CARD: &str = "card";
/// Payment type for balance-debited months
pub const TYPE_BALANCE: &str = "balance";
/// Payment type for admin-recorded cash months
pub const TYPE_CASH: &str = "cash";

/// Russian month names, 1-indexed (index 0 unused)
const MONTH_NAMES: [&str; 13] = [
    "",
    "Январь",
    "Февраль",
    "Март",
    "Апрель",
    "Май",
    "Июнь",
    "Июль",
    "Август",
    "Сентябрь",
    "Октябрь",
    "Ноябрь",
    "Декабрь",
];

/// Russian name for a month number, or "?" outside 1-12.
#[must_use]
pub fn month_name(month: i32) -> &'static str {
    usize::try_from(month)
        .ok()
        .and_then(|m| MONTH_NAMES.get(m).copied())
        .filter(|name| !name.is_empty())
        .unwrap_or("?")
}

/// Rejects months outside 1-12 before they reach a ledger write.
pub fn validate_month(month: i32) -> Result<()> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(Error::InvalidMonth { month })
    }
}

/// Returns whether a completed record exists for (student, month, year).
pub async fn is_month_paid<C>(db: &C, student_id: i64, month: i32, year: i32) -> Result<bool>
where
    C: ConnectionTrait,
{
    let count = PaymentHistory::find()
        .filter(payment_history::Column::StudentId.eq(student_id))
        .filter(payment_history::Column::Month.eq(month))
        .filter(payment_history::Column::Year.eq(year))
        .filter(payment_history::Column::Status.eq(STATUS_COMPLETED))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Arguments for a guarded history insert
#[derive(Debug, Clone)]
pub struct NewHistoryRecord {
    /// Student the record belongs to
    pub student_id: i64,
    /// Back-reference to the gateway intent, None for balance/cash entries
    pub payment_id: Option<i64>,
    /// Paid month (1-12)
    pub month: i32,
    /// Paid year
    pub year: i32,
    /// Amount credited
    pub amount_paid: f64,
    /// Plan key (or fallback plan label for unmapped cash entries)
    pub pricing_plan: String,
    /// One of [`TYPE_CARD`], [`TYPE_BALANCE`], [`TYPE_CASH`]
    pub payment_type: String,
}

/// Writes one completed history record after re-checking the already-paid
/// guard on the same connection.
///
/// This is the single choke point for the "at most one completed record per
/// (student, month, year)" invariant. Run it inside a transaction together
/// with the matching balance mutation; a [`Error::MonthAlreadyPaid`] return
/// aborts the transaction before anything is committed.
pub async fn insert_completed_record<C>(
    db: &C,
    record: NewHistoryRecord,
) -> Result<payment_history::Model>
where
    C: ConnectionTrait,
{
    validate_month(record.month)?;

    if is_month_paid(db, record.student_id, record.month, record.year).await? {
        return Err(Error::MonthAlreadyPaid {
            month: record.month,
            year: record.year,
        });
    }

    let model = payment_history::ActiveModel {
        student_id: Set(record.student_id),
        payment_id: Set(record.payment_id),
        month: Set(record.month),
        year: Set(record.year),
        amount_paid: Set(record.amount_paid),
        pricing_plan: Set(record.pricing_plan),
        payment_type: Set(record.payment_type),
        status: Set(STATUS_COMPLETED.to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let result = model.insert(db).await?;
    info!(
        "Recorded {} payment for student_id {}: {}/{}, amount={:.2}",
        result.payment_type, result.student_id, result.month, result.year, result.amount_paid
    );
    Ok(result)
}

/// All completed records for a student, newest month first.
pub async fn list_for_student(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<Vec<payment_history::Model>> {
    PaymentHistory::find()
        .filter(payment_history::Column::StudentId.eq(student_id))
        .filter(payment_history::Column::Status.eq(STATUS_COMPLETED))
        .order_by_desc(payment_history::Column::Year)
        .order_by_desc(payment_history::Column::Month)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Payment status summary for the admin's student-info view
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSummary {
    /// Whether the given current month is paid
    pub current_month_paid: bool,
    /// Most recent paid (month, year), if any payments exist
    pub last_paid: Option<(i32, i32)>,
    /// Total completed payments on record
    pub total_payments: u64,
}

/// Summarizes a student's payment status relative to the given current
/// month and year.
pub async fn payment_summary(
    db: &DatabaseConnection,
    student_id: i64,
    current_month: i32,
    current_year: i32,
) -> Result<PaymentSummary> {
    let records = list_for_student(db, student_id).await?;
    let current_month_paid = records
        .iter()
        .any(|r| r.month == current_month && r.year == current_year);
    let last_paid = records.first().map(|r| (r.month, r.year));

    Ok(PaymentSummary {
        current_month_paid,
        last_paid,
        total_payments: records.len() as u64,
    })
}
