use serde::{Deserialize, Serialize};

use crate::users::model::{Role, Status};

/// Query string of `GET /users`. Role and status are parsed by the handler so
/// an unknown value gets the regular validation error body.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub role: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

/// Partial profile update. Unknown keys (including `id`) are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub mobile: Option<String>,
    pub role: Option<Role>,
    pub status: Option<Status>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
    pub id: u64,
}
