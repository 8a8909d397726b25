//! Shared helpers for the test suites: an in-memory database factory, a
//! student fixture, a scripted gateway mock and a recording notifier.
#![allow(clippy::unwrap_used)]

use crate::{
    core::student::create_student,
    entities::student,
    errors::{Error, Result},
    gateway::{CreatedIntent, IntentMetadata, IntentState, PaymentGateway},
    notify::Notifier,
};
use sea_orm::{Database, DatabaseConnection};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Connects to a fresh in-memory `SQLite` database with all tables created.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a registered, non-admin student with a zero balance.
pub async fn create_test_student(
    db: &DatabaseConnection,
    telegram_id: &str,
    course_or_class: &str,
) -> Result<student::Model> {
    create_student(
        db,
        telegram_id.to_string(),
        format!("Student {telegram_id}"),
        course_or_class.to_string(),
        true,
        false,
    )
    .await
}

/// Scripted in-memory gateway.
///
/// Responses are queued per operation and consumed in order; an exhausted
/// queue fails the call, so a test that triggers an unexpected gateway round
/// trip fails loudly instead of silently succeeding.
#[derive(Debug, Default)]
pub struct MockGateway {
    create_responses: Mutex<VecDeque<Result<CreatedIntent>>>,
    get_responses: Mutex<VecDeque<Result<IntentState>>>,
    create_calls: Mutex<Vec<(f64, String, IntentMetadata)>>,
}

impl MockGateway {
    /// Creates a gateway with empty response queues.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful `create_intent` response.
    pub fn push_create_ok(&self, intent: CreatedIntent) {
        self.create_responses.lock().unwrap().push_back(Ok(intent));
    }

    /// Queues a `create_intent` failure.
    pub fn push_create_err(&self, message: &str) {
        self.create_responses
            .lock()
            .unwrap()
            .push_back(Err(Error::Gateway {
                message: message.to_string(),
            }));
    }

    /// Queues a successful `get_intent` response.
    pub fn push_get_ok(&self, state: IntentState) {
        self.get_responses.lock().unwrap().push_back(Ok(state));
    }

    /// Queues a `get_intent` failure.
    pub fn push_get_err(&self, message: &str) {
        self.get_responses
            .lock()
            .unwrap()
            .push_back(Err(Error::Gateway {
                message: message.to_string(),
            }));
    }

    /// The arguments of the most recent `create_intent` call, if any.
    #[must_use]
    pub fn last_create_call(&self) -> Option<(f64, String, IntentMetadata)> {
        self.create_calls.lock().unwrap().last().cloned()
    }
}

impl PaymentGateway for MockGateway {
    async fn create_intent(
        &self,
        amount: f64,
        description: &str,
        metadata: &IntentMetadata,
    ) -> Result<CreatedIntent> {
        self.create_calls.lock().unwrap().push((
            amount,
            description.to_string(),
            metadata.clone(),
        ));
        self.create_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(Error::Gateway {
                    message: "no scripted create_intent response".to_string(),
                })
            })
    }

    async fn get_intent(&self, _gateway_id: &str) -> Result<IntentState> {
        self.get_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(Error::Gateway {
                    message: "no scripted get_intent response".to_string(),
                })
            })
    }
}

/// Notifier that records every message for later assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All message texts delivered to the given recipient, in send order.
    #[must_use]
    pub fn sent_to(&self, recipient_id: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == recipient_id)
            .map(|(_, text)| text.clone())
            .collect()
    }

    /// Total number of messages sent to anyone.
    #[must_use]
    pub fn total_sent(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl Notifier for RecordingNotifier {
    async fn send_message(&self, recipient_id: &str, text: &str) {
        self.sent
            .lock()
            .unwrap()
            .push((recipient_id.to_string(), text.to_string()));
    }
}
