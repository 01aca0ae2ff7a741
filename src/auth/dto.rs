use serde::{Deserialize, Serialize};

use crate::auth::repo_types::Identity;

/// Request body for login. Fields are optional so that a missing field is a
/// 400 from the service rather than a deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: Identity,
}
