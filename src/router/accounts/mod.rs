//! Customer and account HTTP API.
mod create;
mod delete;
mod fetch;
mod update;

use axum::Router;
use axum::routing::{delete, get, post, put};

use crate::AppState;

pub const STATUS_201: &str = "201";
pub const MESSAGE_201: &str = "Account created successfully";
pub const STATUS_200: &str = "200";
pub const MESSAGE_200: &str = "Request processed successfully";
pub const STATUS_417: &str = "417";
pub const MESSAGE_417_UPDATE: &str =
    "Update operation failed. Please try again OR contact dev team.";
pub const MESSAGE_417_DELETE: &str =
    "Delete operation failed. Please try again OR contact dev team.";

pub fn router() -> Router<AppState> {
    Router::new()
        // `POST /create` goes to `create`.
        .route("/create", post(create::handler))
        // `GET /fetch?mobileNumber=` goes to `fetch`.
        .route("/fetch", get(fetch::handler))
        // `PUT /update` goes to `update`.
        .route("/update", put(update::handler))
        // `DELETE /delete?mobileNumber=` goes to `delete`.
        .route("/delete", delete(delete::handler))
}
