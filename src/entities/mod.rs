//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod admin_state;
pub mod payment;
pub mod payment_history;
pub mod student;

// Re-export specific types to avoid conflicts
pub use admin_state::{Column as AdminStateColumn, Entity as AdminState, Model as AdminStateModel};
pub use payment::{Column as PaymentColumn, Entity as Payment, Model as PaymentModel};
pub use payment_history::{
    Column as PaymentHistoryColumn, Entity as PaymentHistory, Model as PaymentHistoryModel,
};
pub use student::{Column as StudentColumn, Entity as Student, Model as StudentModel};
