use std::sync::Arc;

use axum::extract::FromRef;
use rand::Rng;

use crate::account::{Account, AccountRepository, Customer, mapper};
use crate::error::{Result, ServerError};
use crate::model::body::CustomerDto;
use crate::{AppState, telemetry};

/// Attempts to draw an unused account number before giving up.
pub const ACCOUNT_NUMBER_ATTEMPTS: usize = 5;

const ACCOUNT_NUMBER_RANGE: std::ops::RangeInclusive<i64> =
    1_000_000_000..=9_999_999_999;

/// Draw a random 10-digit account number.
pub fn generate_account_number() -> i64 {
    rand::thread_rng().gen_range(ACCOUNT_NUMBER_RANGE)
}

/// Customer and account use cases.
#[derive(Clone)]
pub struct AccountService {
    repo: Arc<dyn AccountRepository>,
}

impl FromRef<AppState> for AccountService {
    fn from_ref(state: &AppState) -> AccountService {
        state.accounts.clone()
    }
}

impl AccountService {
    /// Create a new [`AccountService`].
    pub fn new(repo: Arc<dyn AccountRepository>) -> Self {
        Self { repo }
    }

    /// Register a customer with a new savings account.
    pub async fn create_account(&self, dto: CustomerDto) -> Result<()> {
        if self
            .repo
            .find_customer_by_mobile_number(&dto.mobile_number)
            .await?
            .is_some()
        {
            telemetry::record_account_operation("create", "conflict");
            return Err(ServerError::CustomerAlreadyExists {
                mobile_number: dto.mobile_number,
            });
        }

        let customer = mapper::to_customer(&dto, Customer::default());

        for attempt in 1..=ACCOUNT_NUMBER_ATTEMPTS {
            let account = Account::new(generate_account_number());

            match self.repo.create(customer.clone(), account).await {
                Ok((customer, account)) => {
                    tracing::info!(
                        customer_id = customer.customer_id,
                        account_number = account.account_number,
                        "account created"
                    );
                    telemetry::record_account_operation("create", "success");
                    return Ok(());
                },
                Err(ServerError::AccountNumberTaken { account_number }) => {
                    tracing::warn!(
                        account_number,
                        attempt,
                        "generated account number already taken"
                    );
                },
                Err(err) => {
                    if matches!(err, ServerError::CustomerAlreadyExists { .. }) {
                        telemetry::record_account_operation("create", "conflict");
                    }
                    return Err(err);
                },
            }
        }

        telemetry::record_account_operation("create", "failure");
        Err(ServerError::Internal {
            details: format!(
                "no free account number after {ACCOUNT_NUMBER_ATTEMPTS} attempts"
            ),
            source: None,
        })
    }

    /// Customer and account details of a mobile number.
    pub async fn fetch_account(&self, mobile_number: &str) -> Result<CustomerDto> {
        let customer = self
            .repo
            .find_customer_by_mobile_number(mobile_number)
            .await?
            .ok_or_else(|| {
                telemetry::record_account_operation("fetch", "not_found");
                ServerError::ResourceNotFound {
                    resource: "Customer",
                    field: "mobileNumber",
                    value: mobile_number.to_owned(),
                }
            })?;

        let account = self
            .repo
            .find_account_by_customer_id(customer.customer_id)
            .await?
            .ok_or_else(|| ServerError::IntegrityViolation {
                details: format!(
                    "customer {} has no account",
                    customer.customer_id
                ),
            })?;

        telemetry::record_account_operation("fetch", "success");
        Ok(mapper::to_customer_dto(&customer, &account))
    }

    /// Overwrite account and customer details.
    ///
    /// Returns `false` if no account carries the given number. A missing
    /// owner only skips the customer-side overwrite.
    pub async fn update_account(&self, dto: CustomerDto) -> Result<bool> {
        let Some(accounts_dto) = dto.accounts_dto.as_ref() else {
            return Ok(false);
        };
        let Some(account_number) = accounts_dto.account_number else {
            return Ok(false);
        };

        let Some(account) =
            self.repo.find_account_by_number(account_number).await?
        else {
            tracing::debug!(account_number, "no account to update");
            telemetry::record_account_operation("update", "not_found");
            return Ok(false);
        };
        let account = mapper::to_account(accounts_dto, account);

        let customer = self
            .repo
            .find_customer_by_id(account.customer_id)
            .await?
            .map(|customer| mapper::to_customer(&dto, customer));

        if customer.is_none() {
            tracing::warn!(
                account_number,
                customer_id = account.customer_id,
                "account owner not found, customer details left untouched"
            );
        }

        self.repo.update(&account, customer.as_ref()).await?;

        telemetry::record_account_operation("update", "success");
        Ok(true)
    }

    /// Delete the customer owning a mobile number, and its account.
    ///
    /// Returns `false` if no customer owns it.
    pub async fn delete_account(&self, mobile_number: &str) -> Result<bool> {
        let Some(customer) = self
            .repo
            .find_customer_by_mobile_number(mobile_number)
            .await?
        else {
            telemetry::record_account_operation("delete", "not_found");
            return Ok(false);
        };

        self.repo.delete(customer.customer_id).await?;

        tracing::info!(customer_id = customer.customer_id, "account deleted");
        telemetry::record_account_operation("delete", "success");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::account::{ADDRESS, MemoryAccountRepository, SAVINGS};
    use crate::model::body::AccountsDto;

    fn jhon() -> CustomerDto {
        CustomerDto {
            name: "Jhon Doe".into(),
            email: "jhon@mail.com".into(),
            mobile_number: "9876543210".into(),
            accounts_dto: None,
        }
    }

    fn service() -> (Arc<MemoryAccountRepository>, AccountService) {
        let repo = Arc::new(MemoryAccountRepository::new());
        (Arc::clone(&repo), AccountService::new(repo))
    }

    #[test]
    fn test_generated_account_number_has_ten_digits() {
        for _ in 0..1_000 {
            let number = generate_account_number();
            assert_eq!(number.to_string().len(), 10);
        }
    }

    #[tokio::test]
    async fn test_create_then_fetch() {
        let (_, service) = service();
        service.create_account(jhon()).await.unwrap();

        let dto = service.fetch_account("9876543210").await.unwrap();
        assert_eq!(dto.name, "Jhon Doe");
        assert_eq!(dto.email, "jhon@mail.com");
        assert_eq!(dto.mobile_number, "9876543210");

        let account = dto.accounts_dto.unwrap();
        assert_eq!(account.account_type, SAVINGS);
        assert_eq!(account.branch_address, ADDRESS);
        assert!(ACCOUNT_NUMBER_RANGE.contains(&account.account_number.unwrap()));
    }

    #[tokio::test]
    async fn test_create_ignores_account_input() {
        let (_, service) = service();
        let dto = CustomerDto {
            accounts_dto: Some(AccountsDto {
                account_number: Some(1234567890),
                account_type: "current".into(),
                branch_address: "Elsewhere".into(),
            }),
            ..jhon()
        };
        service.create_account(dto).await.unwrap();

        let account = service
            .fetch_account("9876543210")
            .await
            .unwrap()
            .accounts_dto
            .unwrap();
        assert_eq!(account.account_type, SAVINGS);
        assert_eq!(account.branch_address, ADDRESS);
    }

    #[tokio::test]
    async fn test_create_duplicate_mobile_number() {
        let (repo, service) = service();
        service.create_account(jhon()).await.unwrap();

        let err = service
            .create_account(CustomerDto {
                name: "Jane Doe".into(),
                ..jhon()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ServerError::CustomerAlreadyExists { .. }));
        assert_eq!(repo.counts().await, (1, 1));
        assert_eq!(
            service.fetch_account("9876543210").await.unwrap().name,
            "Jhon Doe"
        );
    }

    #[tokio::test]
    async fn test_fetch_unknown_mobile_number() {
        let (_, service) = service();
        let err = service.fetch_account("0000000000").await.unwrap_err();
        assert!(matches!(err, ServerError::ResourceNotFound { .. }));
    }

    #[tokio::test]
    async fn test_fetch_customer_without_account() {
        let (repo, service) = service();
        service.create_account(jhon()).await.unwrap();
        let account_number = service
            .fetch_account("9876543210")
            .await
            .unwrap()
            .accounts_dto
            .unwrap()
            .account_number
            .unwrap();
        repo.detach_account(account_number).await;

        let err = service.fetch_account("9876543210").await.unwrap_err();
        assert!(matches!(err, ServerError::IntegrityViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_unknown_account_number() {
        let (repo, service) = service();
        service.create_account(jhon()).await.unwrap();
        let before = service.fetch_account("9876543210").await.unwrap();

        let dto = CustomerDto {
            name: "Someone Else".into(),
            accounts_dto: Some(AccountsDto {
                account_number: Some(1),
                account_type: "current".into(),
                branch_address: "Elsewhere".into(),
            }),
            ..jhon()
        };
        assert!(!service.update_account(dto).await.unwrap());

        assert_eq!(service.fetch_account("9876543210").await.unwrap(), before);
        assert_eq!(repo.counts().await, (1, 1));
    }

    #[tokio::test]
    async fn test_update_overwrites_fields() {
        let (repo, service) = service();
        service.create_account(jhon()).await.unwrap();
        let account_number = service
            .fetch_account("9876543210")
            .await
            .unwrap()
            .accounts_dto
            .unwrap()
            .account_number;

        let dto = CustomerDto {
            name: "Jhon Smith".into(),
            email: "smith@mail.com".into(),
            mobile_number: "0123456789".into(),
            accounts_dto: Some(AccountsDto {
                account_number,
                account_type: "current".into(),
                branch_address: "5th Avenue".into(),
            }),
        };
        assert!(service.update_account(dto.clone()).await.unwrap());

        assert!(service.fetch_account("9876543210").await.is_err());
        assert_eq!(service.fetch_account("0123456789").await.unwrap(), dto);

        let customer = repo
            .find_customer_by_mobile_number("0123456789")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(customer.customer_id, 1);
        assert!(customer.audit.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_update_without_owner_still_succeeds() {
        let (repo, service) = service();
        service.create_account(jhon()).await.unwrap();
        let customer = repo
            .find_customer_by_mobile_number("9876543210")
            .await
            .unwrap()
            .unwrap();
        let account = repo
            .find_account_by_customer_id(customer.customer_id)
            .await
            .unwrap()
            .unwrap();
        repo.detach_customer(customer.customer_id).await;

        let dto = CustomerDto {
            name: "Jhon Smith".into(),
            accounts_dto: Some(AccountsDto {
                account_number: Some(account.account_number),
                account_type: "current".into(),
                branch_address: "5th Avenue".into(),
            }),
            ..jhon()
        };

        // Customer-side overwrite is silently skipped.
        assert!(service.update_account(dto).await.unwrap());

        let account = repo
            .find_account_by_number(account.account_number)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.account_type, "current");
        assert_eq!(repo.counts().await, (0, 1));
    }

    #[tokio::test]
    async fn test_update_to_taken_mobile_number() {
        let (_, service) = service();
        service.create_account(jhon()).await.unwrap();
        service
            .create_account(CustomerDto {
                mobile_number: "0123456789".into(),
                ..jhon()
            })
            .await
            .unwrap();
        let account_number = service
            .fetch_account("0123456789")
            .await
            .unwrap()
            .accounts_dto
            .unwrap()
            .account_number;

        let err = service
            .update_account(CustomerDto {
                accounts_dto: Some(AccountsDto {
                    account_number,
                    account_type: "current".into(),
                    branch_address: "5th Avenue".into(),
                }),
                ..jhon()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::CustomerAlreadyExists { .. }));

        let account = service
            .fetch_account("0123456789")
            .await
            .unwrap()
            .accounts_dto
            .unwrap();
        assert_eq!(account.account_type, SAVINGS);
    }

    #[tokio::test]
    async fn test_delete() {
        let (repo, service) = service();
        assert!(!service.delete_account("9876543210").await.unwrap());

        service.create_account(jhon()).await.unwrap();
        assert!(service.delete_account("9876543210").await.unwrap());
        assert_eq!(repo.counts().await, (0, 0));

        assert!(!service.delete_account("9876543210").await.unwrap());
    }

    /// Reports the first `collisions` account numbers as taken.
    struct Colliding {
        inner: MemoryAccountRepository,
        collisions: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AccountRepository for Colliding {
        async fn find_customer_by_mobile_number(
            &self,
            mobile_number: &str,
        ) -> Result<Option<Customer>> {
            self.inner.find_customer_by_mobile_number(mobile_number).await
        }

        async fn find_customer_by_id(
            &self,
            customer_id: i64,
        ) -> Result<Option<Customer>> {
            self.inner.find_customer_by_id(customer_id).await
        }

        async fn find_account_by_customer_id(
            &self,
            customer_id: i64,
        ) -> Result<Option<Account>> {
            self.inner.find_account_by_customer_id(customer_id).await
        }

        async fn find_account_by_number(
            &self,
            account_number: i64,
        ) -> Result<Option<Account>> {
            self.inner.find_account_by_number(account_number).await
        }

        async fn create(
            &self,
            customer: Customer,
            account: Account,
        ) -> Result<(Customer, Account)> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.collisions {
                return Err(ServerError::AccountNumberTaken {
                    account_number: account.account_number,
                });
            }
            self.inner.create(customer, account).await
        }

        async fn update(
            &self,
            account: &Account,
            customer: Option<&Customer>,
        ) -> Result<()> {
            self.inner.update(account, customer).await
        }

        async fn delete(&self, customer_id: i64) -> Result<()> {
            self.inner.delete(customer_id).await
        }
    }

    fn colliding(collisions: usize) -> Arc<Colliding> {
        Arc::new(Colliding {
            inner: MemoryAccountRepository::new(),
            collisions,
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_create_retries_taken_account_number() {
        let repo = colliding(ACCOUNT_NUMBER_ATTEMPTS - 1);
        let service = AccountService::new(repo.clone());

        service.create_account(jhon()).await.unwrap();
        assert_eq!(repo.calls.load(Ordering::SeqCst), ACCOUNT_NUMBER_ATTEMPTS);
        assert_eq!(repo.inner.counts().await, (1, 1));
    }

    #[tokio::test]
    async fn test_create_gives_up_after_attempts() {
        let repo = colliding(ACCOUNT_NUMBER_ATTEMPTS);
        let service = AccountService::new(repo.clone());

        let err = service.create_account(jhon()).await.unwrap_err();
        assert!(matches!(err, ServerError::Internal { .. }));
        assert_eq!(repo.inner.counts().await, (0, 0));
    }
}
