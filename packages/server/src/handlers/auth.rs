use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use sea_orm::*;
use tracing::instrument;

use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AuthUser, SESSION_COOKIE};
use crate::extractors::json::AppJson;
use crate::models::auth::{
    LoginRequest, MeResponse, RegisterRequest, SessionResponse, UserResponse,
    validate_login_request, validate_register_request,
};
use crate::models::shared::MessageResponse;
use crate::state::AppState;
use crate::utils::{hash, jwt};

fn issue_session(
    state: &AppState,
    jar: CookieJar,
    user: &user::Model,
) -> Result<(CookieJar, String), AppError> {
    let auth = &state.config.auth;
    let token = jwt::sign(
        user.id,
        &user.email,
        &user.role,
        user::permissions_for(&user.role),
        &auth.jwt_secret,
        auth.token_ttl_days,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(auth.secure_cookie)
        .max_age(time::Duration::days(auth.token_ttl_days));

    Ok((jar.add(cookie), token))
}

#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    operation_id = "registerUser",
    summary = "Create an account",
    description = "Creates a `user` account and starts a session. The token is returned in the body and set as the `session` cookie.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = SessionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "E-mail already registered (EMAIL_TAKEN)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, jar, payload))]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (name, email, password) = validate_register_request(&payload)?;

    let taken = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&state.db)
        .await?
        .is_some();
    if taken {
        return Err(AppError::EmailTaken);
    }

    let password_hash = hash::hash_password_blocking(password)
        .await
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let new_user = user::ActiveModel {
        name: Set(name),
        email: Set(email),
        password: Set(password_hash),
        role: Set(user::DEFAULT_ROLE.to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let user = new_user
        .insert(&state.db)
        .await
        .map_err(|e| AppError::unique_or(e, AppError::EmailTaken))?;

    tracing::info!(user_id = user.id, "Account created");

    let (jar, token) = issue_session(&state, jar, &user)?;
    Ok((
        StatusCode::CREATED,
        jar,
        Json(SessionResponse {
            user: UserResponse::from(user),
            token,
            message: "Registration successful".into(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in with e-mail and password",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; `session` cookie set", body = SessionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Wrong e-mail or password (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (email, password) = validate_login_request(&payload)?;

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password_blocking(password, user.password.clone())
        .await
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;

    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let (jar, token) = issue_session(&state, jar, &user)?;
    Ok((
        jar,
        Json(SessionResponse {
            user: UserResponse::from(user),
            token,
            message: "Login successful".into(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/logout",
    tag = "Auth",
    operation_id = "logout",
    summary = "End the cookie session",
    description = "Clears the `session` cookie. Bearer tokens stay valid until they expire.",
    responses(
        (status = 200, description = "Cookie cleared", body = MessageResponse),
    ),
)]
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Json(MessageResponse::new("Logged out successfully")))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    operation_id = "getCurrentUser",
    summary = "Get the current user",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Account no longer exists (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MeResponse>, AppError> {
    let user = user::Entity::find_by_id(auth_user.user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(Json(MeResponse {
        user: UserResponse::from(user),
        permissions: auth_user.permissions,
    }))
}
