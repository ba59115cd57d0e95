use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::{MESSAGE_200, MESSAGE_417_DELETE, STATUS_200, STATUS_417};
use crate::account::AccountService;
use crate::error::Result;
use crate::model::body::ResponseDto;
use crate::model::query::MobileNumber;
use crate::router::ValidQuery;

/// Handler to delete a customer and its account.
pub async fn handler(
    State(accounts): State<AccountService>,
    ValidQuery(query): ValidQuery<MobileNumber>,
) -> Result<(StatusCode, Json<ResponseDto>)> {
    if accounts.delete_account(&query.mobile_number).await? {
        Ok((StatusCode::OK, Json(ResponseDto::new(STATUS_200, MESSAGE_200))))
    } else {
        Ok((
            StatusCode::EXPECTATION_FAILED,
            Json(ResponseDto::new(STATUS_417, MESSAGE_417_DELETE)),
        ))
    }
}
