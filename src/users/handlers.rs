use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{handlers::present, jwt::AuthUser, password::hash_password_async},
    error::ApiError,
    state::AppState,
    users::{
        dto::{DeleteResponse, ListQuery, UpdateUserRequest},
        model::{PublicUser, Role, Stats, Status, UserChanges},
        repo::{ListFilter, UserStore},
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/me", get(get_me))
        .route("/users/stats/overview", get(get_stats))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

fn user_not_found() -> ApiError {
    ApiError::not_found("User not found")
}

/// A non-numeric id cannot name a member, so it is a plain miss.
fn user_id(path: Result<Path<u64>, PathRejection>) -> Result<u64, ApiError> {
    path.map(|Path(id)| id).map_err(|_| user_not_found())
}

/// Rejects an email or username that already belongs to some record.
/// Pass only the values that are new for the caller.
pub(crate) fn ensure_available(
    store: &UserStore,
    email: Option<&str>,
    username: Option<&str>,
) -> Result<(), ApiError> {
    if email.is_some_and(|e| store.get_by_email(e).is_some()) {
        warn!(email = email.unwrap_or_default(), "email already taken");
        return Err(ApiError::validation("Email already taken"));
    }
    if username.is_some_and(|u| store.get_by_username(u).is_some()) {
        warn!(username = username.unwrap_or_default(), "username already taken");
        return Err(ApiError::validation("Username already taken"));
    }
    Ok(())
}

#[instrument(skip(state, claims), fields(user_id = claims.id))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = state
        .store
        .read()
        .await
        .get_by_id(claims.id)
        .ok_or_else(user_not_found)?;
    Ok(Json(user))
}

#[instrument(skip(state, _auth, query))]
pub async fn list_users(
    State(state): State<AppState>,
    _auth: AuthUser,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let Query(query) = query?;
    let filter = ListFilter {
        role: present(query.role)
            .map(|r| r.parse::<Role>())
            .transpose()
            .map_err(|e| ApiError::validation(e.to_string()))?,
        status: present(query.status)
            .map(|s| s.parse::<Status>())
            .transpose()
            .map_err(|e| ApiError::validation(e.to_string()))?,
        search: present(query.search),
    };
    let users = state.store.read().await.list(&filter);
    Ok(Json(users))
}

#[instrument(skip(state, _auth, path))]
pub async fn get_user(
    State(state): State<AppState>,
    _auth: AuthUser,
    path: Result<Path<u64>, PathRejection>,
) -> Result<Json<PublicUser>, ApiError> {
    let id = user_id(path)?;
    let user = state
        .store
        .read()
        .await
        .get_by_id(id)
        .ok_or_else(user_not_found)?;
    Ok(Json(user))
}

#[instrument(skip(state, claims, path, payload), fields(caller = claims.id))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    path: Result<Path<u64>, PathRejection>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<PublicUser>, ApiError> {
    let id = user_id(path)?;
    let Json(payload) = payload?;

    let required = [
        (&payload.username, "Username"),
        (&payload.email, "Email"),
        (&payload.first_name, "First name"),
        (&payload.last_name, "Last name"),
    ];
    if let Some((_, label)) = required.iter().find(|(v, _)| v.as_deref() == Some("")) {
        return Err(ApiError::validation(format!("{label} cannot be empty")));
    }

    if state.store.read().await.get_by_id(id).is_none() {
        return Err(user_not_found());
    }

    // Hash outside the guard; an absent or empty password keeps the old hash.
    let password_hash = match present(payload.password) {
        Some(plain) => Some(hash_password_async(plain).await?),
        None => None,
    };

    let updated = {
        let mut store = state.store.write().await;
        let current = store.get_by_id(id).ok_or_else(user_not_found)?;
        let email = payload.email.filter(|e| *e != current.email);
        let username = payload.username.filter(|u| *u != current.username);
        ensure_available(&store, email.as_deref(), username.as_deref())?;

        store
            .update(
                id,
                UserChanges {
                    username,
                    email,
                    password_hash,
                    first_name: payload.first_name,
                    last_name: payload.last_name,
                    mobile: payload.mobile,
                    role: payload.role,
                    status: payload.status,
                },
            )
            .ok_or_else(user_not_found)?
    };

    info!(user_id = id, "user updated");
    Ok(Json(updated))
}

#[instrument(skip(state, claims, path), fields(caller = claims.id))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    path: Result<Path<u64>, PathRejection>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = user_id(path)?;
    let removed = state
        .store
        .write()
        .await
        .delete(id)
        .ok_or_else(user_not_found)?;

    info!(user_id = removed.id, "user deleted");
    Ok(Json(DeleteResponse {
        message: "User deleted successfully".into(),
        id: removed.id,
    }))
}

#[instrument(skip(state, _auth))]
pub async fn get_stats(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Stats>, ApiError> {
    Ok(Json(state.store.read().await.stats()))
}
