pub mod mapper;
mod memory;
mod repository;
mod service;

pub use memory::*;
pub use repository::*;
pub use service::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account type given to every new account.
pub const SAVINGS: &str = "savings";
/// Branch address given to every new account.
pub const ADDRESS: &str = "123 Main Street, New York, NY";
/// Actor recorded in audit columns.
pub const AUDITOR: &str = "ACCOUNTS_MS";

/// Who touched a row, and when.
///
/// Stamped by the repository on insert and update, never by callers.
#[derive(
    Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow,
)]
pub struct AuditMetadata {
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
}

impl AuditMetadata {
    /// Metadata of a row inserted now.
    pub fn created() -> Self {
        Self {
            created_at: Utc::now(),
            created_by: AUDITOR.to_owned(),
            updated_at: None,
            updated_by: None,
        }
    }

    /// Mark row as updated now.
    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
        self.updated_by = Some(AUDITOR.to_owned());
    }
}

/// Customer as saved on database.
#[derive(
    Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow,
)]
pub struct Customer {
    pub customer_id: i64,
    pub name: String,
    pub email: String,
    pub mobile_number: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: AuditMetadata,
}

/// Account as saved on database, owned by a [`Customer`].
#[derive(
    Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow,
)]
pub struct Account {
    pub account_number: i64,
    pub customer_id: i64,
    pub account_type: String,
    pub branch_address: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: AuditMetadata,
}

impl Account {
    /// Fresh savings account at the default branch.
    pub fn new(account_number: i64) -> Self {
        Self {
            account_number,
            account_type: SAVINGS.to_owned(),
            branch_address: ADDRESS.to_owned(),
            ..Default::default()
        }
    }
}
