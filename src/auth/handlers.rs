use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, RegisterRequest},
        jwt::JwtKeys,
        password::{hash_password_async, verify_password_async, verify_unknown_account},
    },
    error::{ApiError, FieldViolation},
    state::AppState,
    users::{
        handlers::ensure_available,
        model::{NewUser, PublicUser},
    },
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/local/register", post(register))
        .route("/auth/local", post(login))
}

/// Treats empty strings the same as absent fields.
pub(crate) fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn invalid_credentials() -> ApiError {
    ApiError::validation("Invalid identifier or password")
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(payload) = payload?;

    let mut missing = Vec::new();
    let mut required = |value: Option<String>, path: &'static str, label: &str| {
        present(value).unwrap_or_else(|| {
            missing.push(FieldViolation {
                path: vec![path],
                message: format!("{label} is required"),
            });
            String::new()
        })
    };
    let username = required(payload.username, "username", "Username");
    let email = required(payload.email, "email", "Email");
    let password = required(payload.password, "password", "Password");
    let first_name = required(payload.first_name, "firstName", "First name");
    let last_name = required(payload.last_name, "lastName", "Last name");
    if !missing.is_empty() {
        warn!(missing = missing.len(), "registration missing fields");
        return Err(ApiError::missing_fields(missing));
    }

    // Fail fast before paying for the hash; re-checked under the write guard.
    ensure_available(&*state.store.read().await, Some(&email), Some(&username))?;

    let password_hash = hash_password_async(password).await?;

    let user = {
        let mut store = state.store.write().await;
        ensure_available(&store, Some(&email), Some(&username))?;
        store.create(NewUser {
            username,
            email,
            password_hash,
            first_name,
            last_name,
            mobile: present(payload.mobile),
            role: payload.role,
            status: payload.status,
        })
    };

    let token = JwtKeys::from_ref(&state).sign(&user)?;

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(payload) = payload?;
    let (Some(identifier), Some(password)) =
        (present(payload.identifier), present(payload.password))
    else {
        return Err(ApiError::validation("Missing credentials"));
    };

    let found = {
        let store = state.store.read().await;
        store
            .get_by_email(&identifier)
            .or_else(|| store.get_by_username(&identifier))
            .map(|u| (u.password_hash.clone(), PublicUser::from(u)))
    };

    let Some((password_hash, user)) = found else {
        // same argon2 cost as a wrong password
        verify_unknown_account(password).await?;
        warn!(identifier_len = identifier.len(), "login unknown identifier");
        return Err(invalid_credentials());
    };

    if !verify_password_async(password, password_hash).await? {
        warn!(user_id = user.id, "login invalid password");
        return Err(invalid_credentials());
    }

    let token = JwtKeys::from_ref(&state).sign(&user)?;

    info!(user_id = user.id, "user logged in");
    Ok(Json(AuthResponse { token, user }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn present_drops_empty_strings() {
        assert_eq!(present(Some(String::new())), None);
        assert_eq!(present(None), None);
        assert_eq!(present(Some("x".into())), Some("x".to_string()));
    }

    #[test]
    fn auth_response_serialization() {
        let now = time::OffsetDateTime::now_utc();
        let response = AuthResponse {
            token: "abc".into(),
            user: PublicUser {
                id: 1,
                username: "admin".into(),
                email: "admin@college.edu".into(),
                first_name: "Admin".into(),
                last_name: "User".into(),
                mobile: None,
                role: Default::default(),
                status: Default::default(),
                created_at: now,
                updated_at: now,
            },
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"token\":\"abc\""));
        assert!(json.contains("admin@college.edu"));
    }
}
