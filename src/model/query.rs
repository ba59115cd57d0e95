use serde::{Deserialize, Serialize};
use validator::Validate;

/// Query string locating a customer, `?mobileNumber=`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MobileNumber {
    #[validate(custom(
        function = crate::router::validate_mobile_number,
        message = "Mobile number must be of 10 digit"
    ))]
    pub mobile_number: String,
}
