//! Request and response bodies of the accounts API.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

/// Customer and (optionally) account details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDto {
    #[validate(length(
        min = 5,
        max = 30,
        message = "The length of name should be between 5 to 30"
    ))]
    pub name: String,
    #[validate(
        length(min = 1, message = "email cannot be null or empty"),
        email(message = "email should be valid")
    )]
    pub email: String,
    #[serde(default)]
    #[validate(custom(
        function = crate::router::validate_mobile_number,
        message = "Invalid mobile number"
    ))]
    pub mobile_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accounts_dto: Option<AccountsDto>,
}

/// Account details of a [`CustomerDto`].
///
/// Missing fields deserialize empty; updates reject them through
/// [`CustomerDto::required_account`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct AccountsDto {
    #[validate(range(
        min = 1_000_000_000i64,
        max = 9_999_999_999i64,
        message = "Account number must be of 10 digit"
    ))]
    pub account_number: Option<i64>,
    #[validate(length(min = 1, message = "Account type cannot be null or empty"))]
    pub account_type: String,
    #[validate(length(
        min = 1,
        message = "Branch address cannot be null or empty"
    ))]
    pub branch_address: String,
}

impl CustomerDto {
    /// Account details an update must carry, validated.
    pub fn required_account(&self) -> Result<&AccountsDto, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let Some(account) = self.accounts_dto.as_ref() else {
            errors.add(
                "accounts_dto",
                ValidationError::new("required")
                    .with_message("Account details cannot be null".into()),
            );
            return Err(errors);
        };

        if let Err(nested) = account.validate() {
            errors = nested;
        }

        if account.account_number.is_none() {
            errors.add(
                "account_number",
                ValidationError::new("required").with_message(
                    "Account number cannot be null or empty".into(),
                ),
            );
        }

        if errors.is_empty() {
            Ok(account)
        } else {
            Err(errors)
        }
    }
}

/// Outcome of a write request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDto {
    pub status_code: String,
    pub status_message: String,
}

impl ResponseDto {
    pub fn new(status_code: &str, status_message: &str) -> Self {
        Self {
            status_code: status_code.to_owned(),
            status_message: status_message.to_owned(),
        }
    }
}
