use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::upload::{ALLOWED_CONTENT_TYPES, UploadResponse, is_allowed_content_type};
use crate::state::AppState;
use crate::utils::filename::{stored_name, validate_flat_filename};

/// Room for multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn upload_body_limit(max_bytes: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_bytes + MULTIPART_OVERHEAD)
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Upload",
    operation_id = "uploadPaymentScreenshot",
    summary = "Upload a payment screenshot",
    description = "Accepts a JPEG or PNG image in the `file` multipart field and returns the URL to store as `paymentScreenshot`. Nothing is persisted yet; the URL is generated.",
    request_body(content_type = "multipart/form-data", description = "Image file in the `file` field"),
    responses(
        (status = 200, description = "File accepted", body = UploadResponse),
        (status = 400, description = "Missing file, bad type, too large or bad filename (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn upload_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let max_bytes = state.config.upload.max_bytes;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("Missing filename".into()))?;
        let original = validate_flat_filename(&original)
            .map_err(|e| AppError::Validation(e.message().into()))?
            .to_string();

        let content_type = field.content_type().unwrap_or_default().to_ascii_lowercase();
        if !is_allowed_content_type(&content_type) {
            return Err(AppError::Validation(format!(
                "Invalid file type. Allowed: {}",
                ALLOWED_CONTENT_TYPES.join(", ")
            )));
        }

        let data = field.bytes().await.map_err(|e| {
            AppError::Validation(format!("File too large or unreadable: {e}"))
        })?;
        if data.is_empty() {
            return Err(AppError::Validation("File is empty".into()));
        }
        if data.len() > max_bytes {
            return Err(AppError::Validation(format!(
                "File too large. Maximum size is {} bytes",
                max_bytes
            )));
        }

        let file_name = stored_name(&Uuid::now_v7().simple().to_string(), &original);
        let prefix = state.config.upload.public_prefix.trim_end_matches('/');

        tracing::info!(%file_name, size = data.len(), "Payment screenshot accepted");

        return Ok(Json(UploadResponse {
            url: format!("{prefix}/{file_name}"),
            file_name,
            size: data.len(),
            content_type,
        }));
    }

    Err(AppError::Validation("Missing 'file' field".into()))
}
