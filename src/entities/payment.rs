//! Payment entity - Represents a payment intent created on the gateway.
//!
//! A row is written when a gateway-backed payment flow starts and is mutated
//! only by status transitions observed from the gateway. The
//! `gateway_payment_id` is assigned by the gateway and immutable once set.
//! Intents are never deleted; a canceled intent simply stays at its last
//! observed status.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment intent database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    /// Unique identifier for the payment row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Student this intent belongs to
    pub student_id: i64,
    /// Gateway-assigned payment id, unique and immutable
    #[sea_orm(unique)]
    pub gateway_payment_id: String,
    /// Amount in rubles, fixed at creation from the resolved price
    pub amount: f64,
    /// Last gateway status observed for this intent. Known values are
    /// "pending", "succeeded" and "canceled"; anything else is stored
    /// verbatim.
    pub status: String,
    /// Human-readable description embedding month, year and plan name
    pub description: String,
    /// Target month (1-12) this intent pays for
    pub payment_month: i32,
    /// Target year this intent pays for
    pub payment_year: i32,
    /// Pricing plan key resolved at creation
    pub pricing_plan: String,
    /// Payment-method metadata reported by the gateway, stored as JSON text
    pub payment_method: Option<String>,
    /// When the intent was created locally
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Payment and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each intent belongs to one student
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
    /// A succeeded intent yields exactly one history record
    #[sea_orm(has_many = "super::payment_history::Entity")]
    PaymentHistory,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::payment_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
