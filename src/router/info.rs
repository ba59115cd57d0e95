//! Build and support information.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::config::{Configuration, ContactInfo};

/// Rust toolchain the service is built for.
pub const RUNTIME_VERSION: &str = env!("CARGO_PKG_RUST_VERSION");

/// Deployed build version.
pub async fn build_info(State(config): State<Arc<Configuration>>) -> String {
    config.build_version.clone()
}

/// Runtime the service is deployed on.
pub async fn runtime_version() -> &'static str {
    RUNTIME_VERSION
}

/// Who to reach in case of any issue.
pub async fn contact_info(
    State(config): State<Arc<Configuration>>,
) -> Json<ContactInfo> {
    Json(config.contact_info.clone())
}
