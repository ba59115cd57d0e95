use axum::extract::State;
use axum::Json;

use crate::account::AccountService;
use crate::error::Result;
use crate::model::body::CustomerDto;
use crate::model::query::MobileNumber;
use crate::router::ValidQuery;

/// Handler to get customer and account details.
pub async fn handler(
    State(accounts): State<AccountService>,
    ValidQuery(query): ValidQuery<MobileNumber>,
) -> Result<Json<CustomerDto>> {
    let customer = accounts.fetch_account(&query.mobile_number).await?;
    Ok(Json(customer))
}
