//! Balance-backed payments and admin balance adjustments.
//!
//! Three flows live here. A student can pay a month straight from their
//! balance (debit + history record, no gateway involved). An admin can
//! record an externally collected cash payment, which *credits* the balance
//! by the plan price while writing the history record - deliberately
//! asymmetric with the gateway and balance paths, which never credit. And
//! an admin can credit an arbitrary amount through a persisted two-step
//! wait state, which touches the balance only and writes no history.

use crate::{
    config::pricing::{FALLBACK_PLAN_NAME, FALLBACK_PRICE, PricingTable},
    core::{history, payment, student},
    entities::{AdminState, admin_state, payment_history},
    errors::{Error, Result},
    notify::Notifier,
};
use sea_orm::{ActiveValue::Set, TransactionTrait, prelude::*, sea_query::OnConflict};
use tracing::{info, warn};

/// Pays a month from the student's balance.
///
/// Rejects when the month is already paid, the class label cannot be
/// priced, or the balance does not cover the full price - partial payments
/// are not allowed. Debit and history write share one transaction.
pub async fn pay_from_balance<N>(
    db: &DatabaseConnection,
    notifier: &N,
    pricing: &PricingTable,
    student_telegram_id: &str,
    month: i32,
    year: i32,
) -> Result<payment_history::Model>
where
    N: Notifier,
{
    history::validate_month(month)?;

    let paying_student = student::require_by_telegram_id(db, student_telegram_id).await?;

    if history::is_month_paid(db, paying_student.id, month, year).await? {
        return Err(Error::MonthAlreadyPaid { month, year });
    }

    let plan = pricing
        .resolve(&paying_student.course_or_class)
        .ok_or_else(|| Error::PriceNotFound {
            class_label: paying_student.course_or_class.clone(),
        })?;

    if paying_student.balance < plan.price {
        return Err(Error::InsufficientFunds {
            available: paying_student.balance,
            required: plan.price,
        });
    }

    let txn = db.begin().await?;
    student::update_balance_atomic(&txn, paying_student.id, -plan.price).await?;
    let record = history::insert_completed_record(
        &txn,
        history::NewHistoryRecord {
            student_id: paying_student.id,
            payment_id: None,
            month,
            year,
            amount_paid: plan.price,
            pricing_plan: plan.key.clone(),
            payment_type: history::TYPE_BALANCE.to_string(),
        },
    )
    .await?;
    txn.commit().await?;

    info!(
        "Balance payment for student {}: {}/{}, amount={:.2}",
        paying_student.telegram_id, month, year, plan.price
    );
    payment::notify_payment_recorded(db, notifier, &paying_student, month, year, plan.price)
        .await?;

    Ok(record)
}

/// Result of an admin cash entry
#[derive(Debug, Clone)]
pub struct CashPayment {
    /// The committed history record
    pub record: payment_history::Model,
    /// Plan display name, or the generic fallback label
    pub plan_name: String,
    /// Amount recorded and credited
    pub amount: f64,
    /// Student balance after the credit
    pub new_balance: f64,
}

/// Records an externally collected cash payment for (student, month, year).
///
/// The plan price is credited to the student's balance (cash was handed
/// over outside the platform and is deposited here for future use) and a
/// completed cash history record is written, both in one transaction. If
/// the student's class label cannot be priced, a fixed fallback price and a
/// generic plan label are applied - cash payments are never blocked by
/// unmapped classes.
pub async fn mark_cash_payment<N>(
    db: &DatabaseConnection,
    notifier: &N,
    pricing: &PricingTable,
    student_telegram_id: &str,
    month: i32,
    year: i32,
) -> Result<CashPayment>
where
    N: Notifier,
{
    history::validate_month(month)?;

    let paid_student = student::require_by_telegram_id(db, student_telegram_id).await?;

    if history::is_month_paid(db, paid_student.id, month, year).await? {
        return Err(Error::MonthAlreadyPaid { month, year });
    }

    let (amount, plan_name) = pricing.resolve(&paid_student.course_or_class).map_or_else(
        || {
            warn!(
                "No plan for class '{}' of student {}; applying fallback cash price",
                paid_student.course_or_class, paid_student.telegram_id
            );
            (FALLBACK_PRICE, FALLBACK_PLAN_NAME.to_string())
        },
        |plan| (plan.price, plan.name.clone()),
    );

    let txn = db.begin().await?;
    let updated = student::update_balance_atomic(&txn, paid_student.id, amount).await?;
    let record = history::insert_completed_record(
        &txn,
        history::NewHistoryRecord {
            student_id: paid_student.id,
            payment_id: None,
            month,
            year,
            amount_paid: amount,
            pricing_plan: plan_name.clone(),
            payment_type: history::TYPE_CASH.to_string(),
        },
    )
    .await?;
    txn.commit().await?;

    info!(
        "Cash payment recorded for student {}: {}/{}, amount={:.2}, balance={:.2}",
        paid_student.telegram_id, month, year, amount, updated.balance
    );

    notifier
        .send_message(
            &paid_student.telegram_id,
            &format!(
                "✅ Администратор отметил вашу оплату за {month}/{year}\n\
                 Тариф: {plan_name}\n\
                 Сумма: {amount:.2} руб.\n\
                 💰 Зачислено на баланс: {amount:.2} руб.\n\
                 💳 Ваш баланс: {:.2} руб.",
                updated.balance
            ),
        )
        .await;

    Ok(CashPayment {
        record,
        plan_name,
        amount,
        new_balance: updated.balance,
    })
}

/// Opens the "awaiting numeric amount" wait state for an admin, scoped to
/// one student. One wait state per admin; a repeated call overwrites the
/// previous one (last write wins).
pub async fn begin_balance_credit(
    db: &DatabaseConnection,
    admin_id: &str,
    student_telegram_id: &str,
) -> Result<admin_state::Model> {
    // The student is validated again on submit; checking here gives the
    // admin an immediate error instead of a dead wait state.
    student::require_by_telegram_id(db, student_telegram_id).await?;

    let model = admin_state::ActiveModel {
        admin_id: Set(admin_id.to_string()),
        state: Set(admin_state::WAITING_BALANCE_AMOUNT.to_string()),
        student_id: Set(student_telegram_id.to_string()),
        created_at: Set(chrono::Utc::now()),
    };

    AdminState::insert(model)
        .on_conflict(
            OnConflict::column(admin_state::Column::AdminId)
                .update_columns([
                    admin_state::Column::State,
                    admin_state::Column::StudentId,
                    admin_state::Column::CreatedAt,
                ])
                .to_owned(),
        )
        .exec(db)
        .await?;

    AdminState::find_by_id(admin_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| Error::Config {
            message: format!("admin state for {admin_id} vanished after upsert"),
        })
}

/// Outcome of feeding an admin's free-text message to the amount-entry flow
#[derive(Debug, Clone)]
pub enum AmountEntry {
    /// The admin has no pending wait state; the message is not for us
    Ignored,
    /// The balance was credited and the wait state cleared
    Credited {
        /// Student after the credit, with the updated balance
        student: crate::entities::student::Model,
        /// Amount parsed and credited
        amount: f64,
    },
}

/// Handles the admin's next free-text message while a balance-credit wait
/// state exists.
///
/// Accepts both `.` and `,` as the decimal separator. Non-numeric or
/// non-positive input fails with [`Error::InvalidAmount`] and *preserves*
/// the wait state so the admin can retry. A valid amount credits the
/// student's balance, clears the wait state and notifies both parties; no
/// history record is written. If the referenced student no longer exists
/// the wait state is cleared and the operation fails without mutating
/// anything.
pub async fn submit_balance_amount<N>(
    db: &DatabaseConnection,
    notifier: &N,
    admin_id: &str,
    text: &str,
) -> Result<AmountEntry>
where
    N: Notifier,
{
    let Some(state) = AdminState::find_by_id(admin_id.to_string())
        .filter(admin_state::Column::State.eq(admin_state::WAITING_BALANCE_AMOUNT))
        .one(db)
        .await?
    else {
        return Ok(AmountEntry::Ignored);
    };

    let amount: f64 = text
        .trim()
        .replace(',', ".")
        .parse()
        .map_err(|_| Error::InvalidAmount {
            input: text.to_string(),
        })?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount {
            input: text.to_string(),
        });
    }

    let Some(target) = student::get_by_telegram_id(db, &state.student_id).await? else {
        warn!(
            "Student {} referenced by admin {} wait state no longer exists",
            state.student_id, admin_id
        );
        let missing_id = state.student_id.clone();
        state.delete(db).await?;
        return Err(Error::StudentNotFound {
            telegram_id: missing_id,
        });
    };

    let txn = db.begin().await?;
    let updated = student::update_balance_atomic(&txn, target.id, amount).await?;
    state.delete(&txn).await?;
    txn.commit().await?;

    info!(
        "Admin {} credited {:.2} to student {}; balance={:.2}",
        admin_id, amount, updated.telegram_id, updated.balance
    );

    notifier
        .send_message(
            admin_id,
            &format!(
                "✅ Сумма успешно зачислена на баланс!\n\n\
                 Ученик: {}\n\
                 💰 Зачислено: {amount:.2} руб.\n\
                 💳 Новый баланс: {:.2} руб.",
                updated.full_name, updated.balance
            ),
        )
        .await;
    notifier
        .send_message(
            &updated.telegram_id,
            &format!(
                "💰 На ваш баланс зачислено {amount:.2} руб.\n💳 Ваш баланс: {:.2} руб.",
                updated.balance
            ),
        )
        .await;

    Ok(AmountEntry::Credited {
        student: updated,
        amount,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::config::pricing::default_table;
    use crate::core::student::update_balance_atomic;
    use crate::entities::PaymentHistory;
    use crate::test_utils::{RecordingNotifier, create_test_student, setup_test_db};

    #[tokio::test]
    async fn test_pay_from_balance_debits_and_records() -> Result<()> {
        let db = setup_test_db().await?;
        let pricing = default_table();
        let notifier = RecordingNotifier::new();
        let student = create_test_student(&db, "100", "9 класс").await?;
        update_balance_atomic(&db, student.id, 6000.0).await?;

        let record = pay_from_balance(&db, &notifier, &pricing, "100", 9, 2025).await?;
        assert_eq!(record.amount_paid, 5650.0);
        assert_eq!(record.payment_type, history::TYPE_BALANCE);
        assert!(record.payment_id.is_none());

        let updated = student::require_by_telegram_id(&db, "100").await?;
        assert_eq!(updated.balance, 350.0);
        assert_eq!(notifier.sent_to("100").len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_pay_from_balance_insufficient_funds() -> Result<()> {
        let db = setup_test_db().await?;
        let pricing = default_table();
        let notifier = RecordingNotifier::new();
        let student = create_test_student(&db, "100", "9 класс").await?;
        update_balance_atomic(&db, student.id, 5000.0).await?;

        let result = pay_from_balance(&db, &notifier, &pricing, "100", 9, 2025).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InsufficientFunds {
                available: 5000.0,
                required: 5650.0
            }
        ));

        // No debit, no record
        let unchanged = student::require_by_telegram_id(&db, "100").await?;
        assert_eq!(unchanged.balance, 5000.0);
        assert!(PaymentHistory::find().all(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_pay_from_balance_rejects_paid_month() -> Result<()> {
        let db = setup_test_db().await?;
        let pricing = default_table();
        let notifier = RecordingNotifier::new();
        let student = create_test_student(&db, "100", "9 класс").await?;
        update_balance_atomic(&db, student.id, 20000.0).await?;

        pay_from_balance(&db, &notifier, &pricing, "100", 9, 2025).await?;
        let result = pay_from_balance(&db, &notifier, &pricing, "100", 9, 2025).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::MonthAlreadyPaid {
                month: 9,
                year: 2025
            }
        ));

        // Exactly one debit happened
        let current = student::require_by_telegram_id(&db, "100").await?;
        assert_eq!(current.balance, 20000.0 - 5650.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_cash_payment_credits_balance() -> Result<()> {
        let db = setup_test_db().await?;
        let pricing = default_table();
        let notifier = RecordingNotifier::new();
        create_test_student(&db, "100", "9 класс").await?;

        let cash = mark_cash_payment(&db, &notifier, &pricing, "100", 10, 2025).await?;
        assert_eq!(cash.amount, 5650.0);
        assert_eq!(cash.new_balance, 5650.0);
        assert_eq!(cash.record.payment_type, history::TYPE_CASH);
        assert_eq!(cash.record.month, 10);

        // The asymmetry: cash credits the balance, unlike the other paths
        let updated = student::require_by_telegram_id(&db, "100").await?;
        assert_eq!(updated.balance, 5650.0);
        assert_eq!(notifier.sent_to("100").len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_cash_payment_falls_back_for_unmapped_class() -> Result<()> {
        let db = setup_test_db().await?;
        let pricing = default_table();
        let notifier = RecordingNotifier::new();
        create_test_student(&db, "100", "взрослая группа").await?;

        let cash = mark_cash_payment(&db, &notifier, &pricing, "100", 10, 2025).await?;
        assert_eq!(cash.amount, FALLBACK_PRICE);
        assert_eq!(cash.plan_name, FALLBACK_PLAN_NAME);
        assert_eq!(cash.record.pricing_plan, FALLBACK_PLAN_NAME);
        Ok(())
    }

    #[tokio::test]
    async fn test_cash_payment_rejects_paid_month() -> Result<()> {
        let db = setup_test_db().await?;
        let pricing = default_table();
        let notifier = RecordingNotifier::new();
        create_test_student(&db, "100", "9 класс").await?;

        mark_cash_payment(&db, &notifier, &pricing, "100", 10, 2025).await?;
        let result = mark_cash_payment(&db, &notifier, &pricing, "100", 10, 2025).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::MonthAlreadyPaid { .. }
        ));

        let records = PaymentHistory::find().all(&db).await?;
        assert_eq!(records.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_amount_entry_happy_path_with_comma() -> Result<()> {
        let db = setup_test_db().await?;
        let notifier = RecordingNotifier::new();
        create_test_student(&db, "100", "9 класс").await?;

        begin_balance_credit(&db, "admin-1", "100").await?;
        let outcome = submit_balance_amount(&db, &notifier, "admin-1", "1500,50").await?;
        let AmountEntry::Credited { student, amount } = outcome else {
            panic!("expected Credited, got {outcome:?}");
        };
        assert_eq!(amount, 1500.50);
        assert_eq!(student.balance, 1500.50);

        // Wait state cleared, no history written, both parties notified
        assert!(
            AdminState::find_by_id("admin-1".to_string())
                .one(&db)
                .await?
                .is_none()
        );
        assert!(PaymentHistory::find().all(&db).await?.is_empty());
        assert_eq!(notifier.sent_to("admin-1").len(), 1);
        assert_eq!(notifier.sent_to("100").len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_amount_entry_invalid_input_preserves_state() -> Result<()> {
        let db = setup_test_db().await?;
        let notifier = RecordingNotifier::new();
        create_test_student(&db, "100", "9 класс").await?;
        begin_balance_credit(&db, "admin-1", "100").await?;

        for bad in ["abc", "-5", "0", "nan"] {
            let result = submit_balance_amount(&db, &notifier, "admin-1", bad).await;
            assert!(
                matches!(result.unwrap_err(), Error::InvalidAmount { .. }),
                "input {bad:?} should be rejected"
            );
        }

        // Wait state intact, balance untouched
        assert!(
            AdminState::find_by_id("admin-1".to_string())
                .one(&db)
                .await?
                .is_some()
        );
        let unchanged = student::require_by_telegram_id(&db, "100").await?;
        assert_eq!(unchanged.balance, 0.0);

        // A valid retry still works
        let outcome = submit_balance_amount(&db, &notifier, "admin-1", "300").await?;
        assert!(matches!(outcome, AmountEntry::Credited { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_amount_entry_without_wait_state_is_ignored() -> Result<()> {
        let db = setup_test_db().await?;
        let notifier = RecordingNotifier::new();
        create_test_student(&db, "100", "9 класс").await?;

        let outcome = submit_balance_amount(&db, &notifier, "admin-1", "500").await?;
        assert!(matches!(outcome, AmountEntry::Ignored));
        assert_eq!(notifier.total_sent(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_begin_balance_credit_overwrites_previous_state() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_student(&db, "100", "9 класс").await?;
        create_test_student(&db, "200", "10 класс").await?;

        begin_balance_credit(&db, "admin-1", "100").await?;
        let state = begin_balance_credit(&db, "admin-1", "200").await?;
        assert_eq!(state.student_id, "200");

        let states = AdminState::find().all(&db).await?;
        assert_eq!(states.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_begin_balance_credit_requires_existing_student() -> Result<()> {
        let db = setup_test_db().await?;

        let result = begin_balance_credit(&db, "admin-1", "missing").await;
        assert!(matches!(
            result.unwrap_err(),
            Error::StudentNotFound { .. }
        ));
        Ok(())
    }
}
