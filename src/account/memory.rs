//! In-process repository, used when no PostgreSQL is configured.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::account::{Account, AccountRepository, AuditMetadata, Customer};
use crate::error::{Result, ServerError};

#[derive(Debug, Default)]
struct Tables {
    next_customer_id: i64,
    customers: BTreeMap<i64, Customer>,
    accounts: BTreeMap<i64, Account>,
}

/// Memory-backed [`AccountRepository`].
///
/// A single lock spans each write, so writes are atomic like a transaction.
/// Enforces the same uniqueness rules as the SQL schema.
#[derive(Debug, Default)]
pub struct MemoryAccountRepository {
    tables: RwLock<Tables>,
}

impl MemoryAccountRepository {
    /// Create an empty [`MemoryAccountRepository`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored customers and accounts.
    pub async fn counts(&self) -> (usize, usize) {
        let tables = self.tables.read().await;
        (tables.customers.len(), tables.accounts.len())
    }

    /// Remove a customer row while keeping its accounts.
    #[cfg(test)]
    pub(crate) async fn detach_customer(&self, customer_id: i64) {
        self.tables.write().await.customers.remove(&customer_id);
    }

    /// Remove an account row while keeping its owner.
    #[cfg(test)]
    pub(crate) async fn detach_account(&self, account_number: i64) {
        self.tables.write().await.accounts.remove(&account_number);
    }
}

impl Tables {
    fn mobile_number_taken(&self, mobile_number: &str, except: i64) -> bool {
        self.customers.values().any(|c| {
            c.mobile_number == mobile_number && c.customer_id != except
        })
    }
}

#[async_trait]
impl AccountRepository for MemoryAccountRepository {
    async fn find_customer_by_mobile_number(
        &self,
        mobile_number: &str,
    ) -> Result<Option<Customer>> {
        let tables = self.tables.read().await;
        Ok(tables
            .customers
            .values()
            .find(|c| c.mobile_number == mobile_number)
            .cloned())
    }

    async fn find_customer_by_id(
        &self,
        customer_id: i64,
    ) -> Result<Option<Customer>> {
        Ok(self.tables.read().await.customers.get(&customer_id).cloned())
    }

    async fn find_account_by_customer_id(
        &self,
        customer_id: i64,
    ) -> Result<Option<Account>> {
        let tables = self.tables.read().await;
        Ok(tables
            .accounts
            .values()
            .filter(|a| a.customer_id == customer_id)
            .min_by_key(|a| a.audit.created_at)
            .cloned())
    }

    async fn find_account_by_number(
        &self,
        account_number: i64,
    ) -> Result<Option<Account>> {
        Ok(self
            .tables
            .read()
            .await
            .accounts
            .get(&account_number)
            .cloned())
    }

    async fn create(
        &self,
        mut customer: Customer,
        mut account: Account,
    ) -> Result<(Customer, Account)> {
        let mut tables = self.tables.write().await;

        if tables.mobile_number_taken(&customer.mobile_number, 0) {
            return Err(ServerError::CustomerAlreadyExists {
                mobile_number: customer.mobile_number,
            });
        }
        if tables.accounts.contains_key(&account.account_number) {
            return Err(ServerError::AccountNumberTaken {
                account_number: account.account_number,
            });
        }

        tables.next_customer_id += 1;
        customer.customer_id = tables.next_customer_id;
        customer.audit = AuditMetadata::created();

        account.customer_id = customer.customer_id;
        account.audit = AuditMetadata::created();

        tables
            .customers
            .insert(customer.customer_id, customer.clone());
        tables
            .accounts
            .insert(account.account_number, account.clone());

        Ok((customer, account))
    }

    async fn update(
        &self,
        account: &Account,
        customer: Option<&Customer>,
    ) -> Result<()> {
        let mut tables = self.tables.write().await;

        if let Some(customer) = customer {
            if tables
                .mobile_number_taken(&customer.mobile_number, customer.customer_id)
            {
                return Err(ServerError::CustomerAlreadyExists {
                    mobile_number: customer.mobile_number.clone(),
                });
            }
        }

        if let Some(stored) = tables.accounts.get_mut(&account.account_number) {
            stored.account_type = account.account_type.clone();
            stored.branch_address = account.branch_address.clone();
            stored.audit.touch();
        }

        if let Some(customer) = customer {
            if let Some(stored) = tables.customers.get_mut(&customer.customer_id)
            {
                stored.name = customer.name.clone();
                stored.email = customer.email.clone();
                stored.mobile_number = customer.mobile_number.clone();
                stored.audit.touch();
            }
        }

        Ok(())
    }

    async fn delete(&self, customer_id: i64) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.accounts.retain(|_, a| a.customer_id != customer_id);
        tables.customers.remove(&customer_id);
        Ok(())
    }
}
