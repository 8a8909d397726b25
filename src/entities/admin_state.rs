//! Admin state entity - Persisted session store for multi-step admin flows.
//!
//! Maps an admin id to the flow they are in the middle of (currently only
//! `waiting_balance_amount`) and the student it is scoped to. One row per
//! admin, last write wins; persisting the state means in-flight flows
//! survive process restarts.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Flow kind value for the "awaiting numeric amount" wait state
pub const WAITING_BALANCE_AMOUNT: &str = "waiting_balance_amount";

/// Admin flow state database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "admin_states")]
pub struct Model {
    /// Telegram id of the admin the wait state belongs to
    #[sea_orm(primary_key, auto_increment = false)]
    pub admin_id: String,
    /// Flow kind, e.g. [`WAITING_BALANCE_AMOUNT`]
    pub state: String,
    /// Telegram id of the student the flow is scoped to
    pub student_id: String,
    /// When the wait state was created
    pub created_at: DateTimeUtc,
}

/// Admin states have no relations to other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
