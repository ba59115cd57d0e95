use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::{MESSAGE_201, STATUS_201};
use crate::account::AccountService;
use crate::error::Result;
use crate::model::body::{CustomerDto, ResponseDto};
use crate::router::Valid;

/// Handler to create a customer and its account.
pub async fn handler(
    State(accounts): State<AccountService>,
    Valid(body): Valid<CustomerDto>,
) -> Result<(StatusCode, Json<ResponseDto>)> {
    accounts.create_account(body).await?;

    Ok((
        StatusCode::CREATED,
        Json(ResponseDto::new(STATUS_201, MESSAGE_201)),
    ))
}
