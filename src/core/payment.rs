//! Gateway-backed payment flow.
//!
//! The state machine per (student, month, year) attempt:
//! month selection -> intent created on the gateway and persisted locally ->
//! user-triggered polling until the gateway reports `succeeded`, at which
//! point the intent status is updated and one history record is committed
//! inside a single database transaction. The guard re-check inside that
//! transaction makes the commit execute-at-most-once under concurrent polls.
//! Polling is always user-triggered; a pending or canceled poll changes no
//! local state, and each poll is independent - a canceled intent is never
//! invalidated, a fresh attempt simply creates a fresh intent.

use crate::{
    config::pricing::PricingTable,
    core::{history, student},
    entities::{Payment, payment, payment_history},
    errors::{Error, Result},
    gateway::{GatewayStatus, IntentMetadata, PaymentGateway},
    notify::{self, Notifier},
};
use sea_orm::{ActiveValue::Set, TransactionTrait, prelude::*};
use tracing::{error, info, warn};

/// A freshly created gateway payment, ready to hand to the payer
#[derive(Debug, Clone)]
pub struct StartedPayment {
    /// The locally persisted intent record
    pub payment: payment::Model,
    /// Hosted checkout URL for the payer
    pub confirmation_url: Option<String>,
}

/// Outcome of one confirmation poll
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// The gateway reported success and one history record was committed
    Confirmed(payment_history::Model),
    /// Payment not yet complete; try again later, nothing changed
    Pending,
    /// Payment canceled; nothing changed
    Canceled,
    /// A status this engine does not branch on, passed through verbatim
    Unrecognized(String),
}

/// Starts a gateway-backed payment for (student, month, year).
///
/// Rejects immediately if the month is already paid or the student's class
/// label cannot be priced. On success a payment intent exists both on the
/// gateway and in the local ledger, with the gateway's initial status.
pub async fn start_gateway_payment<G>(
    db: &DatabaseConnection,
    gateway: &G,
    pricing: &PricingTable,
    student_telegram_id: &str,
    month: i32,
    year: i32,
) -> Result<StartedPayment>
where
    G: PaymentGateway,
{
    history::validate_month(month)?;

    let student = student::require_by_telegram_id(db, student_telegram_id).await?;
    if !student.is_registered {
        return Err(Error::NotRegistered {
            telegram_id: student.telegram_id,
        });
    }

    if history::is_month_paid(db, student.id, month, year).await? {
        return Err(Error::MonthAlreadyPaid { month, year });
    }

    let plan = pricing
        .resolve(&student.course_or_class)
        .ok_or_else(|| Error::PriceNotFound {
            class_label: student.course_or_class.clone(),
        })?;

    let description = format!(
        "Оплата занятий за {} {} - {}",
        history::month_name(month),
        year,
        plan.name
    );
    let metadata = IntentMetadata {
        student_id: student.telegram_id.clone(),
        month,
        year,
        pricing_plan: plan.key.clone(),
    };

    let created = gateway
        .create_intent(plan.price, &description, &metadata)
        .await?;

    let model = payment::ActiveModel {
        student_id: Set(student.id),
        gateway_payment_id: Set(created.id.clone()),
        amount: Set(plan.price),
        status: Set(created.status.as_str().to_string()),
        description: Set(description),
        payment_month: Set(month),
        payment_year: Set(year),
        pricing_plan: Set(plan.key.clone()),
        payment_method: Set(None),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let persisted = model.insert(db).await?;

    info!(
        "Created payment intent {} for student {}: {}/{}, amount={:.2}",
        persisted.gateway_payment_id, student.telegram_id, month, year, persisted.amount
    );

    Ok(StartedPayment {
        payment: persisted,
        confirmation_url: created.confirmation_url,
    })
}

/// Polls the gateway for an intent's status and commits the ledger on
/// success.
///
/// The already-paid guard runs twice: once up front so a stale poll after a
/// commit reports "already paid" without a gateway round trip, and once more
/// inside the commit transaction so two concurrent success polls cannot both
/// write a history record. A gateway query failure surfaces as
/// [`Error::Gateway`] and leaves all local state unchanged - the user may
/// simply poll again.
pub async fn poll_gateway_payment<G, N>(
    db: &DatabaseConnection,
    gateway: &G,
    notifier: &N,
    student_telegram_id: &str,
    gateway_payment_id: &str,
    month: i32,
    year: i32,
) -> Result<PollOutcome>
where
    G: PaymentGateway,
    N: Notifier,
{
    let student = student::require_by_telegram_id(db, student_telegram_id).await?;

    if history::is_month_paid(db, student.id, month, year).await? {
        return Err(Error::MonthAlreadyPaid { month, year });
    }

    let state = gateway.get_intent(gateway_payment_id).await?;

    match state.status {
        GatewayStatus::Succeeded => {
            let Some(local_intent) = Payment::find()
                .filter(payment::Column::GatewayPaymentId.eq(gateway_payment_id))
                .one(db)
                .await?
            else {
                // The gateway confirmed a payment we have no record of.
                // Never fabricate a history row from a gateway response.
                error!(
                    "Gateway intent {} succeeded but has no local record (student {})",
                    gateway_payment_id, student.telegram_id
                );
                return Err(Error::IntentNotFound {
                    gateway_id: gateway_payment_id.to_string(),
                });
            };

            let amount = local_intent.amount;
            let pricing_plan = local_intent.pricing_plan.clone();
            let payment_id = local_intent.id;

            let txn = db.begin().await?;

            let mut active: payment::ActiveModel = local_intent.into();
            active.status = Set(GatewayStatus::Succeeded.as_str().to_string());
            active.payment_method = Set(state
                .payment_method
                .as_ref()
                .map(std::string::ToString::to_string));
            active.update(&txn).await?;

            // Guard re-check and insert share the transaction; a concurrent
            // commit for the same slot aborts here before anything lands.
            let record = history::insert_completed_record(
                &txn,
                history::NewHistoryRecord {
                    student_id: student.id,
                    payment_id: Some(payment_id),
                    month,
                    year,
                    amount_paid: amount,
                    pricing_plan,
                    payment_type: history::TYPE_CARD.to_string(),
                },
            )
            .await?;

            txn.commit().await?;

            info!(
                "Confirmed gateway payment {} for student {}: {}/{}",
                gateway_payment_id, student.telegram_id, month, year
            );
            notify_payment_recorded(db, notifier, &student, month, year, amount).await?;

            Ok(PollOutcome::Confirmed(record))
        }
        GatewayStatus::Pending => Ok(PollOutcome::Pending),
        GatewayStatus::Canceled => Ok(PollOutcome::Canceled),
        GatewayStatus::Other(raw) => {
            warn!(
                "Unrecognized gateway status '{}' for intent {}",
                raw, gateway_payment_id
            );
            Ok(PollOutcome::Unrecognized(raw))
        }
    }
}

/// Notifies the student and broadcasts to every administrator that a month
/// has been paid. Shared by the gateway and balance flows.
pub(crate) async fn notify_payment_recorded<N>(
    db: &DatabaseConnection,
    notifier: &N,
    paying_student: &crate::entities::student::Model,
    month: i32,
    year: i32,
    amount: f64,
) -> Result<()>
where
    N: Notifier,
{
    notifier
        .send_message(
            &paying_student.telegram_id,
            &notify::payment_success_text(month, year, amount),
        )
        .await;

    let admin_text = notify::admin_payment_text(paying_student, month, year, amount);
    for admin in student::get_admins(db).await? {
        notifier.send_message(&admin.telegram_id, &admin_text).await;
    }
    Ok(())
}
