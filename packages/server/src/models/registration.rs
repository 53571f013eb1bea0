use chrono::{DateTime, Utc};
use common::{PaymentStatus, RegistrationStatus, RegistrationType};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

use crate::entity::registration;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRegistrationRequest {
    #[schema(example = 1)]
    pub user_id: Option<i32>,
    #[schema(example = 1)]
    pub workshop_id: Option<i32>,
    /// `manual` always waits for admin approval.
    pub registration_type: Option<RegistrationType>,
    /// Defaults to the workshop price.
    #[schema(example = 2999)]
    pub payment_amount: Option<i64>,
    pub transaction_id: Option<String>,
    pub payment_screenshot: Option<String>,
    pub upi_id: Option<String>,
    pub notes: Option<String>,
}

/// The three required fields of a registration request.
pub fn validate_create_registration(
    req: &CreateRegistrationRequest,
) -> Result<(i32, i32, RegistrationType), AppError> {
    match (req.user_id, req.workshop_id, req.registration_type) {
        (Some(user_id), Some(workshop_id), Some(kind)) if user_id > 0 && workshop_id > 0 => {
            if let Some(amount) = req.payment_amount
                && amount < 0
            {
                return Err(AppError::Validation(
                    "paymentAmount must not be negative".into(),
                ));
            }
            validate_proof_fields(
                req.transaction_id.as_deref(),
                req.upi_id.as_deref(),
                req.notes.as_deref(),
            )?;
            Ok((user_id, workshop_id, kind))
        }
        _ => Err(AppError::Validation(
            "Missing required fields: userId, workshopId, registrationType".into(),
        )),
    }
}

/// Fields a registrant may change after signing up.
#[derive(Deserialize, Default, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRegistrationRequest {
    pub notes: Option<String>,
    #[schema(example = "TXN123456789")]
    pub transaction_id: Option<String>,
    #[schema(example = "/uploads/payments/0192-receipt.png")]
    pub payment_screenshot: Option<String>,
    #[schema(example = "user@paytm")]
    pub upi_id: Option<String>,
}

impl UpdateRegistrationRequest {
    /// True when the request carries evidence of a payment.
    pub fn submits_proof(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.transaction_id) || present(&self.payment_screenshot)
    }
}

pub fn validate_update_registration(req: &UpdateRegistrationRequest) -> Result<(), AppError> {
    validate_proof_fields(
        req.transaction_id.as_deref(),
        req.upi_id.as_deref(),
        req.notes.as_deref(),
    )?;
    if let Some(ref shot) = req.payment_screenshot
        && shot.len() > 512
    {
        return Err(AppError::Validation(
            "paymentScreenshot must be at most 512 characters".into(),
        ));
    }
    Ok(())
}

fn validate_proof_fields(
    transaction_id: Option<&str>,
    upi_id: Option<&str>,
    notes: Option<&str>,
) -> Result<(), AppError> {
    if let Some(txn) = transaction_id
        && txn.trim().chars().count() > 64
    {
        return Err(AppError::Validation(
            "transactionId must be at most 64 characters".into(),
        ));
    }
    if let Some(upi) = upi_id
        && !upi.trim().is_empty()
        && !upi.contains('@')
    {
        return Err(AppError::Validation(
            "upiId must look like name@bank".into(),
        ));
    }
    if let Some(notes) = notes
        && notes.len() > 10_000
    {
        return Err(AppError::Validation(
            "notes must be at most 10000 characters".into(),
        ));
    }
    Ok(())
}

/// Trim an optional text field, mapping blank to `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct RegistrationListQuery {
    /// Ignored for non-admins, who only see their own registrations.
    pub user_id: Option<i32>,
    pub workshop_id: Option<i32>,
    pub status: Option<RegistrationStatus>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub id: i32,
    pub user_id: i32,
    pub workshop_id: i32,
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

impl From<registration::Model> for RegistrationResponse {
    fn from(m: registration::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            workshop_id: m.workshop_id,
            status: m.status,
            registration_type: m.registration_type,
            payment_status: m.payment_status,
            payment_amount: m.payment_amount,
            transaction_id: m.transaction_id,
            payment_screenshot: m.payment_screenshot,
            upi_id: m.upi_id,
            notes: m.notes,
            admin_notes: m.admin_notes,
            reviewed_at: m.reviewed_at,
            registered_at: m.registered_at,
            updated_at: m.updated_at,
        }
    }
}
