use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Request body for account signup.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "Priya Sharma")]
    pub name: Option<String>,
    #[schema(example = "priya@example.com")]
    pub email: Option<String>,
    /// At least 6 characters.
    #[schema(example = "s3cret!")]
    pub password: Option<String>,
}

/// Validated signup fields: (name, lowercased email, password).
pub fn validate_register_request(
    payload: &RegisterRequest,
) -> Result<(String, String, String), AppError> {
    let name = payload.name.as_deref().map(str::trim).unwrap_or_default();
    let email = payload.email.as_deref().map(str::trim).unwrap_or_default();
    let password = payload.password.as_deref().unwrap_or_default();

    if name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "Name, email and password are required".into(),
        ));
    }
    if name.chars().count() > 100 {
        return Err(AppError::Validation(
            "Name must be at most 100 characters".into(),
        ));
    }
    if !email.contains('@') || email.chars().count() > 254 {
        return Err(AppError::Validation("Email address is invalid".into()));
    }
    if password.chars().count() < 6 || password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be 6-128 characters".into(),
        ));
    }
    Ok((name.to_string(), email.to_lowercase(), password.to_string()))
}

/// Request body for login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "john@example.com")]
    pub email: Option<String>,
    #[schema(example = "password123")]
    pub password: Option<String>,
}

/// Validated login fields: (lowercased email, password).
pub fn validate_login_request(payload: &LoginRequest) -> Result<(String, String), AppError> {
    let email = payload.email.as_deref().map(str::trim).unwrap_or_default();
    let password = payload.password.as_deref().unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "Email and password are required".into(),
        ));
    }
    Ok((email.to_lowercase(), password.to_string()))
}

/// Public view of an account. Never includes the password hash.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "John Doe")]
    pub name: String,
    #[schema(example = "john@example.com")]
    pub email: String,
    #[schema(example = "user")]
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::user::Model> for UserResponse {
    fn from(user: crate::entity::user::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Successful login or signup.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SessionResponse {
    pub user: UserResponse,
    /// Session token, also set as the `session` cookie.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    #[schema(example = "Login successful")]
    pub message: String,
}

/// Current authenticated user's profile.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    pub user: UserResponse,
    /// Permissions carried by the session.
    #[schema(example = json!(["stats:view"]))]
    pub permissions: Vec<String>,
}
