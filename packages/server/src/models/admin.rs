use chrono::{DateTime, Utc};
use common::{PaymentStatus, RegistrationStatus, RegistrationType, ReviewAction};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

use crate::entity::{registration, user, workshop};
use crate::error::AppError;

/// Admin decision on a submitted payment.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentDecisionRequest {
    #[schema(example = 1)]
    pub registration_id: Option<i32>,
    /// `approve` or `reject`.
    #[schema(example = "approve")]
    pub action: Option<String>,
    pub admin_notes: Option<String>,
}

pub fn validate_payment_decision(
    req: &VerifyPaymentDecisionRequest,
) -> Result<(i32, ReviewAction), AppError> {
    let (Some(registration_id), Some(action)) = (req.registration_id, req.action.as_deref())
    else {
        return Err(AppError::Validation(
            "Missing required fields: registrationId, action".into(),
        ));
    };
    let action = action
        .parse::<ReviewAction>()
        .map_err(|_| AppError::Validation("Invalid action. Must be 'approve' or 'reject'".into()))?;
    validate_admin_notes(req.admin_notes.as_deref())?;
    Ok((registration_id, action))
}

pub fn validate_admin_notes(notes: Option<&str>) -> Result<(), AppError> {
    if let Some(notes) = notes
        && notes.len() > 10_000
    {
        return Err(AppError::Validation(
            "Notes must be at most 10000 characters".into(),
        ));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDecisionResponse {
    pub success: bool,
    #[schema(example = "Payment approved and registration confirmed")]
    pub message: String,
    pub registration_id: i32,
    pub new_status: RegistrationStatus,
    pub admin_notes: Option<String>,
    pub verified_at: DateTime<Utc>,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct ApproveRegistrationRequest {
    pub notes: Option<String>,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct RejectRegistrationRequest {
    pub reason: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationDecisionResponse {
    #[schema(example = "Registration approved successfully")]
    pub message: String,
    pub registration_id: i32,
    pub status: RegistrationStatus,
    /// Notes on approval, reason on rejection.
    pub reason: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminRegistrationQuery {
    /// A registration status, or `all`.
    pub status: Option<String>,
    /// Case-insensitive match on registrant name, e-mail or workshop title.
    pub search: Option<String>,
}

/// Parse the admin `status` filter. `all` and blank mean no filter.
pub fn parse_status_filter(value: Option<&str>) -> Result<Option<RegistrationStatus>, AppError> {
    match value.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(s) => s
            .parse::<RegistrationStatus>()
            .map(Some)
            .map_err(|e| AppError::Validation(e.to_string())),
    }
}

/// Registration joined with its registrant and workshop.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminRegistrationItem {
    pub id: i32,
    pub user_id: i32,
    pub user_name: String,
    pub user_email: String,
    pub workshop_id: i32,
    pub workshop_title: String,
    pub workshop_price: i64,
    pub status: RegistrationStatus,
    pub registration_type: RegistrationType,
    pub payment_status: PaymentStatus,
    pub payment_amount: i64,
    pub transaction_id: Option<String>,
    pub payment_screenshot: Option<String>,
    pub upi_id: Option<String>,
    pub notes: String,
    pub admin_notes: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub registered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdminRegistrationItem {
    pub fn new(r: registration::Model, u: &user::Model, w: &workshop::Model) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            user_name: u.name.clone(),
            user_email: u.email.clone(),
            workshop_id: r.workshop_id,
            workshop_title: w.title.clone(),
            workshop_price: w.price,
            status: r.status,
            registration_type: r.registration_type,
            payment_status: r.payment_status,
            payment_amount: r.payment_amount,
            transaction_id: r.transaction_id,
            payment_screenshot: r.payment_screenshot,
            upi_id: r.upi_id,
            notes: r.notes,
            admin_notes: r.admin_notes,
            reviewed_at: r.reviewed_at,
            registered_at: r.registered_at,
            updated_at: r.updated_at,
        }
    }

    pub fn matches(&self, needle_lower: &str) -> bool {
        self.user_name.to_lowercase().contains(needle_lower)
            || self.user_email.to_lowercase().contains(needle_lower)
            || self.workshop_title.to_lowercase().contains(needle_lower)
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MonthlyRevenue {
    /// `YYYY-MM`.
    #[schema(example = "2024-01")]
    pub month: String,
    pub revenue: i64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CategoryCount {
    #[schema(example = "Technology")]
    pub category: String,
    pub count: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatsResponse {
    pub total_users: u64,
    pub total_workshops: u64,
    /// Sum of completed registration payments.
    pub total_revenue: i64,
    /// Registrations waiting for an admin or the gateway.
    pub pending_approvals: u64,
    pub total_registrations: u64,
    pub confirmed_registrations: u64,
    pub pending_registrations: u64,
    /// Includes rejected payments.
    pub rejected_registrations: u64,
    /// Completed payment revenue by registration month, oldest first.
    pub monthly_revenue: Vec<MonthlyRevenue>,
    /// Workshop counts per category, largest first.
    pub top_categories: Vec<CategoryCount>,
}
