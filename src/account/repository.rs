//! Handle database requests.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::account::{Account, AuditMetadata, Customer};
use crate::error::{Result, ServerError};

const MOBILE_NUMBER_CONSTRAINT: &str = "customer_mobile_number_key";
const ACCOUNT_NUMBER_CONSTRAINT: &str = "accounts_pkey";

/// Port for customer and account persistence.
///
/// Every write runs as a single transaction.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Find a customer by its mobile number.
    async fn find_customer_by_mobile_number(
        &self,
        mobile_number: &str,
    ) -> Result<Option<Customer>>;

    /// Find a customer by its identifier.
    async fn find_customer_by_id(
        &self,
        customer_id: i64,
    ) -> Result<Option<Customer>>;

    /// Find the account owned by a customer.
    async fn find_account_by_customer_id(
        &self,
        customer_id: i64,
    ) -> Result<Option<Account>>;

    /// Find an account by its number.
    async fn find_account_by_number(
        &self,
        account_number: i64,
    ) -> Result<Option<Account>>;

    /// Insert a customer and its account.
    ///
    /// Returns both rows as stored, with generated identifier and audit
    /// metadata.
    async fn create(
        &self,
        customer: Customer,
        account: Account,
    ) -> Result<(Customer, Account)>;

    /// Save an account and, if given, its owner.
    async fn update(
        &self,
        account: &Account,
        customer: Option<&Customer>,
    ) -> Result<()>;

    /// Delete accounts owned by a customer, then the customer.
    async fn delete(&self, customer_id: i64) -> Result<()>;
}

/// PostgreSQL account repository.
#[derive(Clone)]
pub struct PgAccountRepository {
    pool: Pool<Postgres>,
}

impl PgAccountRepository {
    /// Create a new [`PgAccountRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Translate unique violations into domain errors.
fn unique_violation(
    err: sqlx::Error,
    mobile_number: &str,
    account_number: i64,
) -> ServerError {
    let constraint = err
        .as_database_error()
        .and_then(|e| e.constraint())
        .map(str::to_owned);

    match constraint.as_deref() {
        Some(MOBILE_NUMBER_CONSTRAINT) => ServerError::CustomerAlreadyExists {
            mobile_number: mobile_number.to_owned(),
        },
        Some(ACCOUNT_NUMBER_CONSTRAINT) => {
            ServerError::AccountNumberTaken { account_number }
        },
        _ => err.into(),
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn find_customer_by_mobile_number(
        &self,
        mobile_number: &str,
    ) -> Result<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"SELECT customer_id, name, email, mobile_number,
                    created_at, created_by, updated_at, updated_by
                FROM customer WHERE mobile_number = $1"#,
        )
        .bind(mobile_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn find_customer_by_id(
        &self,
        customer_id: i64,
    ) -> Result<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"SELECT customer_id, name, email, mobile_number,
                    created_at, created_by, updated_at, updated_by
                FROM customer WHERE customer_id = $1"#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn find_account_by_customer_id(
        &self,
        customer_id: i64,
    ) -> Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            r#"SELECT account_number, customer_id, account_type, branch_address,
                    created_at, created_by, updated_at, updated_by
                FROM accounts WHERE customer_id = $1
                ORDER BY created_at LIMIT 1"#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn find_account_by_number(
        &self,
        account_number: i64,
    ) -> Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            r#"SELECT account_number, customer_id, account_type, branch_address,
                    created_at, created_by, updated_at, updated_by
                FROM accounts WHERE account_number = $1"#,
        )
        .bind(account_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn create(
        &self,
        mut customer: Customer,
        mut account: Account,
    ) -> Result<(Customer, Account)> {
        customer.audit = AuditMetadata::created();
        account.audit = AuditMetadata::created();

        let mut tx = self.pool.begin().await?;

        customer.customer_id = sqlx::query_scalar::<_, i64>(
            r#"INSERT INTO customer (name, email, mobile_number, created_at, created_by)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING customer_id"#,
        )
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.mobile_number)
        .bind(customer.audit.created_at)
        .bind(&customer.audit.created_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| {
            unique_violation(err, &customer.mobile_number, account.account_number)
        })?;

        account.customer_id = customer.customer_id;

        sqlx::query(
            r#"INSERT INTO accounts (account_number, customer_id, account_type, branch_address, created_at, created_by)
                VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(account.account_number)
        .bind(account.customer_id)
        .bind(&account.account_type)
        .bind(&account.branch_address)
        .bind(account.audit.created_at)
        .bind(&account.audit.created_by)
        .execute(&mut *tx)
        .await
        .map_err(|err| {
            unique_violation(err, &customer.mobile_number, account.account_number)
        })?;

        // Dropping `tx` on any early return rolls the customer back.
        tx.commit().await?;

        Ok((customer, account))
    }

    async fn update(
        &self,
        account: &Account,
        customer: Option<&Customer>,
    ) -> Result<()> {
        let mut audit = account.audit.clone();
        audit.touch();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"UPDATE accounts
                SET account_type = $1, branch_address = $2, updated_at = $3, updated_by = $4
                WHERE account_number = $5"#,
        )
        .bind(&account.account_type)
        .bind(&account.branch_address)
        .bind(audit.updated_at)
        .bind(&audit.updated_by)
        .bind(account.account_number)
        .execute(&mut *tx)
        .await?;

        if let Some(customer) = customer {
            let mut audit = customer.audit.clone();
            audit.touch();

            sqlx::query(
                r#"UPDATE customer
                    SET name = $1, email = $2, mobile_number = $3, updated_at = $4, updated_by = $5
                    WHERE customer_id = $6"#,
            )
            .bind(&customer.name)
            .bind(&customer.email)
            .bind(&customer.mobile_number)
            .bind(audit.updated_at)
            .bind(&audit.updated_by)
            .bind(customer.customer_id)
            .execute(&mut *tx)
            .await
            .map_err(|err| {
                unique_violation(
                    err,
                    &customer.mobile_number,
                    account.account_number,
                )
            })?;
        }

        tx.commit().await?;

        Ok(())
    }

    async fn delete(&self, customer_id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(r#"DELETE FROM accounts WHERE customer_id = $1"#)
            .bind(customer_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(r#"DELETE FROM customer WHERE customer_id = $1"#)
            .bind(customer_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}
