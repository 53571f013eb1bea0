use chrono::{DateTime, Utc};
use common::{
    GatewayTransaction, PaymentMethod, PaymentStatus, RegistrationStatus, VerificationOutcome,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    #[schema(example = "TXN123456789")]
    pub transaction_id: Option<String>,
    #[schema(example = 2999)]
    pub amount: Option<i64>,
    #[schema(example = 1)]
    pub workshop_id: Option<i32>,
    #[schema(example = 1)]
    pub registration_id: Option<i32>,
}

pub struct VerifyPayment {
    pub transaction_id: String,
    pub amount: i64,
    pub workshop_id: i32,
    pub registration_id: i32,
}

pub fn validate_verify_request(req: VerifyPaymentRequest) -> Result<VerifyPayment, AppError> {
    let transaction_id = req
        .transaction_id
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    match (
        transaction_id,
        req.amount,
        req.workshop_id,
        req.registration_id,
    ) {
        (Some(transaction_id), Some(amount), Some(workshop_id), Some(registration_id))
            if amount > 0 && workshop_id > 0 && registration_id > 0 =>
        {
            Ok(VerifyPayment {
                transaction_id,
                amount,
                workshop_id,
                registration_id,
            })
        }
        _ => Err(AppError::Validation(
            "Missing required fields: transactionId, amount, workshopId, registrationId".into(),
        )),
    }
}

/// Gateway details echoed back for a verified payment.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedPayment {
    pub transaction_id: String,
    pub amount: i64,
    pub payment_method: PaymentMethod,
    pub timestamp: DateTime<Utc>,
    pub upi_id: Option<String>,
}

impl From<GatewayTransaction> for VerifiedPayment {
    fn from(t: GatewayTransaction) -> Self {
        Self {
            transaction_id: t.transaction_id,
            amount: t.amount,
            payment_method: t.payment_method,
            timestamp: t.timestamp,
            upi_id: t.upi_id,
        }
    }
}

/// Result of a payment verification. Only `status = success` carries `payment`.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResponse {
    pub verified: bool,
    /// `success`, `not_found`, `amount_mismatch`, `failed` or `pending`.
    #[schema(example = "success")]
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<VerifiedPayment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workshop_id: Option<i32>,
}

impl VerificationResponse {
    pub fn new(outcome: VerificationOutcome, registration_id: i32, workshop_id: i32) -> Self {
        let verified = outcome.is_verified();
        let status = outcome.as_str();
        let mut body = Self {
            verified,
            status,
            message: outcome.message().to_string(),
            expected_amount: None,
            actual_amount: None,
            payment: None,
            registration_id: None,
            workshop_id: None,
        };
        match outcome {
            VerificationOutcome::AmountMismatch { expected, actual } => {
                body.message = format!("Amount mismatch. Expected: {expected}, found: {actual}");
                body.expected_amount = Some(expected);
                body.actual_amount = Some(actual);
            }
            VerificationOutcome::Success(txn) => {
                body.payment = Some(txn.into());
                body.registration_id = Some(registration_id);
                body.workshop_id = Some(workshop_id);
            }
            _ => {}
        }
        body
    }
}

/// Payment gateway notification.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct WebhookRequest {
    /// `payment.success`, `payment.failed` or `payment.pending`. Others are ignored.
    #[schema(example = "payment.success")]
    pub event: String,
    pub data: Option<WebhookData>,
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookData {
    #[schema(example = "TXN123456789")]
    pub transaction_id: Option<String>,
    #[schema(example = 2999)]
    pub amount: Option<i64>,
    pub registration_id: Option<i32>,
    /// Defaults to `upi`.
    pub payment_method: Option<PaymentMethod>,
    pub upi_id: Option<String>,
    /// Failure reason reported by the gateway.
    pub reason: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    /// `received` or `ignored`.
    #[schema(example = "received")]
    pub status: &'static str,
    /// Whether a registration changed state.
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_status: Option<RegistrationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
}

impl WebhookResponse {
    pub fn ignored() -> Self {
        Self {
            status: "ignored",
            applied: false,
            registration_id: None,
            registration_status: None,
            payment_status: None,
        }
    }

    pub fn received() -> Self {
        Self {
            status: "received",
            ..Self::ignored()
        }
    }
}
