//! Messaging transport boundary.
//!
//! The reconciliation core only ever *reports* outcomes - it never depends
//! on delivery results for correctness. Implementations (the Telegram
//! transport lives outside this crate) are expected to swallow their own
//! send failures; the trait therefore returns nothing.

use crate::core::history::month_name;
use crate::entities::student;
use chrono::Utc;
use tracing::debug;

/// Outbound message capability consumed by the core flows.
pub trait Notifier {
    /// Sends a text message to a platform user id. Delivery failures are
    /// the implementation's problem; the core does not observe them.
    fn send_message(&self, recipient_id: &str, text: &str) -> impl Future<Output = ()> + Send;
}

/// No-op notifier for wiring the core without a transport (and for flows
/// where the caller renders the outcome itself).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    async fn send_message(&self, recipient_id: &str, text: &str) {
        debug!("Dropping notification for {}: {}", recipient_id, text);
    }
}

/// Builds the success message sent to a student once a month is paid.
#[must_use]
pub fn payment_success_text(month: i32, year: i32, amount: f64) -> String {
    format!(
        "🎉 Оплата прошла успешно!\n\n\
         💰 Сумма: {amount:.2} руб.\n\
         📅 Оплачен месяц: {} {year}\n\
         ✅ Теперь вы можете посещать занятия в этом месяце!",
        month_name(month)
    )
}

/// Builds the broadcast sent to every administrator about a new payment.
#[must_use]
pub fn admin_payment_text(student: &student::Model, month: i32, year: i32, amount: f64) -> String {
    format!(
        "💰 Новая оплата!\n\n\
         👤 Ученик: {}\n\
         🆔 Telegram ID: {}\n\
         📚 Класс: {}\n\
         📅 Месяц: {} {year}\n\
         💰 Сумма: {amount:.2} руб.\n\
         ⏰ Время: {}",
        student.full_name,
        student.telegram_id,
        student.course_or_class,
        month_name(month),
        Utc::now().format("%d.%m.%Y %H:%M"),
    )
}
