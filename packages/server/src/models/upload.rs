use serde::Serialize;

/// Image types accepted as payment screenshots.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png"];

pub fn is_allowed_content_type(content_type: &str) -> bool {
    ALLOWED_CONTENT_TYPES.contains(&content_type.trim().to_ascii_lowercase().as_str())
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Public URL of the stored file.
    #[schema(example = "/uploads/payments/0192d3f0c1a27b3e8d5f4a6b7c8d9e0f-receipt.png")]
    pub url: String,
    #[schema(example = "0192d3f0c1a27b3e8d5f4a6b7c8d9e0f-receipt.png")]
    pub file_name: String,
    /// Size in bytes.
    pub size: usize,
    #[serde(rename = "type")]
    #[schema(example = "image/png")]
    pub content_type: String,
}
