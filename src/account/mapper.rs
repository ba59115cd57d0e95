//! Conversions between stored entities and API bodies.

use crate::account::{Account, Customer};
use crate::model::body::{AccountsDto, CustomerDto};

/// Build the API view of an account.
pub fn to_accounts_dto(account: &Account) -> AccountsDto {
    AccountsDto {
        account_number: Some(account.account_number),
        account_type: account.account_type.clone(),
        branch_address: account.branch_address.clone(),
    }
}

/// Build the API view of a customer and its account.
pub fn to_customer_dto(customer: &Customer, account: &Account) -> CustomerDto {
    CustomerDto {
        name: customer.name.clone(),
        email: customer.email.clone(),
        mobile_number: customer.mobile_number.clone(),
        accounts_dto: Some(to_accounts_dto(account)),
    }
}

/// Overwrite customer fields with request values.
///
/// Identifier and audit metadata are kept.
pub fn to_customer(dto: &CustomerDto, customer: Customer) -> Customer {
    Customer {
        name: dto.name.clone(),
        email: dto.email.clone(),
        mobile_number: dto.mobile_number.clone(),
        ..customer
    }
}

/// Overwrite account fields with request values.
///
/// Number, owner and audit metadata are kept.
pub fn to_account(dto: &AccountsDto, account: Account) -> Account {
    Account {
        account_type: dto.account_type.clone(),
        branch_address: dto.branch_address.clone(),
        ..account
    }
}
