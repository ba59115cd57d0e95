use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::{MESSAGE_200, MESSAGE_417_UPDATE, STATUS_200, STATUS_417};
use crate::account::AccountService;
use crate::error::Result;
use crate::model::body::{CustomerDto, ResponseDto};
use crate::router::Valid;

/// Handler to update customer and account details.
pub async fn handler(
    State(accounts): State<AccountService>,
    Valid(body): Valid<CustomerDto>,
) -> Result<(StatusCode, Json<ResponseDto>)> {
    body.required_account()?;

    if accounts.update_account(body).await? {
        Ok((StatusCode::OK, Json(ResponseDto::new(STATUS_200, MESSAGE_200))))
    } else {
        Ok((
            StatusCode::EXPECTATION_FAILED,
            Json(ResponseDto::new(STATUS_417, MESSAGE_417_UPDATE)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Method;
    use http_body_util::BodyExt;
    use serde_json::json;

    use super::*;
    use crate::*;

    async fn create(app: &axum::Router) -> i64 {
        let response = make_request(
            app.clone(),
            Method::POST,
            "/api/create",
            json!({
                "name": "Jhon Doe",
                "email": "jhon@mail.com",
                "mobileNumber": "9876543210",
            })
            .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = make_request(
            app.clone(),
            Method::GET,
            "/api/fetch?mobileNumber=9876543210",
            String::default(),
        )
        .await;
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: CustomerDto = serde_json::from_slice(&body).unwrap();
        body.accounts_dto.unwrap().account_number.unwrap()
    }

    #[tokio::test]
    async fn test_update_handler() {
        let (state, _) = test_state();
        let app = app(state);
        let account_number = create(&app).await;

        let response = make_request(
            app.clone(),
            Method::PUT,
            "/api/update",
            json!({
                "name": "Jhon Smith",
                "email": "smith@mail.com",
                "mobileNumber": "9876543210",
                "accountsDto": {
                    "accountNumber": account_number,
                    "accountType": "current",
                    "branchAddress": "5th Avenue, New York",
                },
            })
            .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: ResponseDto = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, ResponseDto::new(STATUS_200, MESSAGE_200));

        let response = make_request(
            app,
            Method::GET,
            "/api/fetch?mobileNumber=9876543210",
            String::default(),
        )
        .await;
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: CustomerDto = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.name, "Jhon Smith");
        assert_eq!(body.email, "smith@mail.com");

        let account = body.accounts_dto.unwrap();
        assert_eq!(account.account_number, Some(account_number));
        assert_eq!(account.account_type, "current");
        assert_eq!(account.branch_address, "5th Avenue, New York");
    }

    #[tokio::test]
    async fn test_update_unknown_account() {
        let (state, _) = test_state();
        let app = app(state);
        let account_number = create(&app).await;
        let unknown = if account_number == 1_000_000_000 {
            1_000_000_001
        } else {
            1_000_000_000
        };

        let response = make_request(
            app,
            Method::PUT,
            "/api/update",
            json!({
                "name": "Jhon Smith",
                "email": "smith@mail.com",
                "mobileNumber": "9876543210",
                "accountsDto": {
                    "accountNumber": unknown,
                    "accountType": "current",
                    "branchAddress": "5th Avenue, New York",
                },
            })
            .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::EXPECTATION_FAILED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: ResponseDto = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, ResponseDto::new(STATUS_417, MESSAGE_417_UPDATE));
    }

    #[tokio::test]
    async fn test_update_requires_account_number() {
        let (state, _) = test_state();
        let app = app(state);
        create(&app).await;

        for accounts in [
            serde_json::Value::Null,
            json!({ "accountType": "current", "branchAddress": "5th Avenue" }),
            json!({ "accountNumber": 1234567890, "accountType": "", "branchAddress": "" }),
        ] {
            let response = make_request(
                app.clone(),
                Method::PUT,
                "/api/update",
                json!({
                    "name": "Jhon Smith",
                    "email": "smith@mail.com",
                    "mobileNumber": "9876543210",
                    "accountsDto": accounts,
                })
                .to_string(),
            )
            .await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }
}
