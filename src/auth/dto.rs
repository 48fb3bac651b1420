use serde::{Deserialize, Serialize};

use crate::users::model::{PublicUser, Role, Status};

/// Request body for registration. Required fields are optional here so that
/// every missing one can be reported at once.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub mobile: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub status: Status,
}

/// Request body for login; `identifier` is an email or a username.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub identifier: Option<String>,
    pub password: Option<String>,
}

/// Response returned after login or register.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}
