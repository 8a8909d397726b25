//! Student account operations.
//!
//! Lookups by Telegram id, account creation (driven by the external
//! registration flow and by tests), admin listing for broadcasts, and the
//! atomic balance update every money-moving flow goes through.

use crate::{
    entities::{Student, student},
    errors::{Error, Result},
};
use sea_orm::{ActiveValue::Set, prelude::*};

/// Finds a student by Telegram id.
pub async fn get_by_telegram_id(
    db: &DatabaseConnection,
    telegram_id: &str,
) -> Result<Option<student::Model>> {
    Student::find()
        .filter(student::Column::TelegramId.eq(telegram_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a student by Telegram id, failing with [`Error::StudentNotFound`]
/// if the account does not exist.
pub async fn require_by_telegram_id(
    db: &DatabaseConnection,
    telegram_id: &str,
) -> Result<student::Model> {
    get_by_telegram_id(db, telegram_id)
        .await?
        .ok_or_else(|| Error::StudentNotFound {
            telegram_id: telegram_id.to_string(),
        })
}

/// Creates a student account with a zero balance.
///
/// Accounts are created by the registration flow and never deleted.
pub async fn create_student(
    db: &DatabaseConnection,
    telegram_id: String,
    full_name: String,
    course_or_class: String,
    is_registered: bool,
    is_admin: bool,
) -> Result<student::Model> {
    if telegram_id.trim().is_empty() {
        return Err(Error::Config {
            message: "Telegram id cannot be empty".to_string(),
        });
    }

    let student = student::ActiveModel {
        telegram_id: Set(telegram_id),
        full_name: Set(full_name),
        course_or_class: Set(course_or_class),
        is_registered: Set(is_registered),
        is_admin: Set(is_admin),
        balance: Set(0.0),
        registered_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let result = student.insert(db).await?;
    Ok(result)
}

/// Lists all administrator accounts, used for payment broadcasts.
pub async fn get_admins(db: &DatabaseConnection) -> Result<Vec<student::Model>> {
    Student::find()
        .filter(student::Column::IsAdmin.eq(true))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Updates a student balance by atomically adding a delta.
///
/// Uses a single `UPDATE students SET balance = balance + ?` statement so
/// concurrent flows cannot lose updates. Debits that would take the balance
/// negative are rejected with [`Error::InsufficientFunds`] before any write;
/// callers invoke this inside the same database transaction as the matching
/// history insert so guard and write stay atomic.
///
/// # Returns
/// The updated student model
pub async fn update_balance_atomic<C>(
    db: &C,
    student_id: i64,
    amount_delta: f64,
) -> Result<student::Model>
where
    C: ConnectionTrait,
{
    use sea_orm::sea_query::Expr;

    let current = Student::find_by_id(student_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::StudentNotFound {
            telegram_id: student_id.to_string(),
        })?;

    if amount_delta < 0.0 && current.balance + amount_delta < 0.0 {
        return Err(Error::InsufficientFunds {
            available: current.balance,
            required: -amount_delta,
        });
    }

    Student::update_many()
        .col_expr(
            student::Column::Balance,
            Expr::col(student::Column::Balance).add(amount_delta),
        )
        .filter(student::Column::Id.eq(student_id))
        .exec(db)
        .await?;

    Student::find_by_id(student_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::StudentNotFound {
            telegram_id: student_id.to_string(),
        })
}
