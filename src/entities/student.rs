//! Student entity - Represents a tutoring-service student account.
//!
//! Each student is keyed by their platform (Telegram) user id and carries a
//! class/course label used for price resolution, a registration flag, an
//! admin flag, and a rechargeable balance. Accounts are created at
//! registration and never deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Student database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    /// Unique identifier for the student row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Telegram user id, unique per account
    #[sea_orm(unique)]
    pub telegram_id: String,
    /// Student display name
    pub full_name: String,
    /// Free-text class/course label used for price resolution
    /// (e.g. "9 класс", "1 курс")
    pub course_or_class: String,
    /// Whether the registration flow has been completed
    pub is_registered: bool,
    /// Whether this account has administrator rights
    pub is_admin: bool,
    /// Rechargeable balance in rubles. Debited by balance-paid months,
    /// credited by admin cash entries and direct admin credits.
    pub balance: f64,
    /// When the account was registered
    pub registered_at: DateTimeUtc,
}

/// Defines relationships between Student and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One student has many gateway payment intents
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
    /// One student has many payment history records
    #[sea_orm(has_many = "super::payment_history::Entity")]
    PaymentHistory,
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl Related<super::payment_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
