//! Payment history entity - Append-only proof that a month is paid.
//!
//! One completed row per (student, month, year) is the core consistency
//! invariant of the system; the reconciliation flows enforce it with a
//! guard check inside the same transaction as the insert. History never
//! records failed payments - `status` is always "completed" once written.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment history database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_history")]
pub struct Model {
    /// Unique identifier for the history row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Student this record belongs to
    pub student_id: i64,
    /// Back-reference to the gateway intent; None for balance-paid and
    /// cash-paid entries
    pub payment_id: Option<i64>,
    /// Paid month (1-12)
    pub month: i32,
    /// Paid year
    pub year: i32,
    /// Amount actually credited, in rubles
    pub amount_paid: f64,
    /// Pricing plan key (or fallback plan label for unmapped cash entries)
    pub pricing_plan: String,
    /// Payment type: `"card"`, `"balance"`, or `"cash"`
    pub payment_type: String,
    /// Always "completed" once written
    pub status: String,
    /// When the record was written
    pub created_at: DateTimeUtc,
}

/// Defines relationships between PaymentHistory and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each history record belongs to one student
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
    /// Optional back-reference to the gateway payment intent
    #[sea_orm(
        belongs_to = "super::payment::Entity",
        from = "Column::PaymentId",
        to = "super::payment::Column::Id"
    )]
    Payment,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
