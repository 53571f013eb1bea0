use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use common::payment::{WebhookEvent, verify};
use common::{GatewayTransaction, PaymentMethod, VerificationOutcome};
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::{info, instrument, warn};

use crate::entity::payment_record;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::payment::*;
use crate::review::{self, find_registration};
use crate::state::AppState;

/// Header carrying the shared webhook secret.
pub const WEBHOOK_SECRET_HEADER: &str = "X-Webhook-Secret";

fn outcome_status(outcome: &VerificationOutcome) -> StatusCode {
    match outcome {
        VerificationOutcome::Success(_) => StatusCode::OK,
        VerificationOutcome::Pending => StatusCode::ACCEPTED,
        VerificationOutcome::NotFound => StatusCode::NOT_FOUND,
        VerificationOutcome::AmountMismatch { .. } | VerificationOutcome::Failed => {
            StatusCode::BAD_REQUEST
        }
    }
}

async fn find_transaction<C: ConnectionTrait>(
    db: &C,
    transaction_id: &str,
) -> Result<Option<GatewayTransaction>, DbErr> {
    Ok(payment_record::Entity::find_by_id(transaction_id.to_string())
        .one(db)
        .await?
        .map(GatewayTransaction::from))
}

#[utoipa::path(
    post,
    path = "/verify",
    tag = "Payments",
    operation_id = "verifyPayment",
    summary = "Check a payment against the gateway",
    description = "Looks up the transaction and compares the amount and gateway status. Checks run in order (existence, amount, status) and the first failure decides the result. Read-only.",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Payment verified", body = VerificationResponse),
        (status = 202, description = "Payment still processing", body = VerificationResponse),
        (status = 400, description = "Amount mismatch or failed payment", body = VerificationResponse),
        (status = 404, description = "Transaction not found", body = VerificationResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn verify_payment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<VerifyPaymentRequest>,
) -> Result<(StatusCode, Json<VerificationResponse>), AppError> {
    let req = validate_verify_request(payload)?;

    let record = find_transaction(&state.db, &req.transaction_id).await?;
    let outcome = verify(record.as_ref(), req.amount);

    info!(
        transaction_id = %req.transaction_id,
        outcome = outcome.as_str(),
        "Payment verification"
    );

    Ok((
        outcome_status(&outcome),
        Json(VerificationResponse::new(
            outcome,
            req.registration_id,
            req.workshop_id,
        )),
    ))
}

#[utoipa::path(
    post,
    path = "/webhook",
    tag = "Payments",
    operation_id = "paymentWebhook",
    summary = "Receive a payment gateway notification",
    description = "Stores the reported transaction and, when it names a registration awaiting payment whose amount matches, settles that registration. Unknown events are acknowledged and ignored. When a webhook secret is configured it must be sent in `X-Webhook-Secret`.",
    request_body = WebhookRequest,
    responses(
        (status = 200, description = "Event processed or ignored", body = WebhookResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Bad webhook secret (TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Registration not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers, payload), fields(event = %payload.event))]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(payload): AppJson<WebhookRequest>,
) -> Result<Json<WebhookResponse>, AppError> {
    if let Some(ref secret) = state.config.payments.webhook_secret {
        let provided = headers
            .get(WEBHOOK_SECRET_HEADER)
            .and_then(|v| v.to_str().ok());
        if provided != Some(secret.as_str()) {
            warn!("Rejected webhook with missing or wrong secret");
            return Err(AppError::TokenInvalid);
        }
    }

    let Some(event) = WebhookEvent::parse(&payload.event) else {
        info!("Ignoring unknown webhook event");
        return Ok(Json(WebhookResponse::ignored()));
    };

    let data = payload
        .data
        .ok_or_else(|| AppError::Validation("data is required".into()))?;
    let transaction_id = data
        .transaction_id
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("data.transactionId is required".into()))?;
    let amount = data
        .amount
        .filter(|a| *a > 0)
        .ok_or_else(|| AppError::Validation("data.amount must be a positive integer".into()))?;
    let gateway_status = event.gateway_status();

    let record = payment_record::ActiveModel {
        transaction_id: Set(transaction_id.clone()),
        amount: Set(amount),
        status: Set(gateway_status),
        payment_method: Set(data.payment_method.unwrap_or(PaymentMethod::Upi)),
        upi_id: Set(data.upi_id),
        timestamp: Set(chrono::Utc::now()),
    };
    payment_record::Entity::insert(record)
        .on_conflict(
            OnConflict::column(payment_record::Column::TransactionId)
                .update_columns([
                    payment_record::Column::Amount,
                    payment_record::Column::Status,
                    payment_record::Column::PaymentMethod,
                    payment_record::Column::UpiId,
                    payment_record::Column::Timestamp,
                ])
                .to_owned(),
        )
        .exec_without_returning(&state.db)
        .await?;

    info!(
        %transaction_id,
        amount,
        status = %gateway_status,
        reason = data.reason.as_deref().unwrap_or(""),
        "Gateway transaction recorded"
    );

    let mut response = WebhookResponse::received();
    let Some(registration_id) = data.registration_id else {
        return Ok(Json(response));
    };

    let current = find_registration(&state.db, registration_id).await?;
    response.registration_id = Some(registration_id);

    let record = find_transaction(&state.db, &transaction_id).await?;
    let outcome = verify(record.as_ref(), current.payment_amount);
    if let VerificationOutcome::AmountMismatch { expected, actual } = outcome {
        warn!(
            registration_id,
            expected, actual, "Webhook amount does not match registration, not settling"
        );
        response.registration_status = Some(current.status);
        response.payment_status = Some(current.payment_status);
        return Ok(Json(response));
    }

    let updated = match review::settle(&state, &current, gateway_status, transaction_id).await {
        Ok(updated) => updated,
        Err(AppError::InvalidTransition(reason)) => {
            warn!(registration_id, "Webhook not applied: {reason}");
            response.registration_status = Some(current.status);
            response.payment_status = Some(current.payment_status);
            return Ok(Json(response));
        }
        Err(e) => return Err(e),
    };

    response.applied = true;
    response.registration_status = Some(updated.status);
    response.payment_status = Some(updated.payment_status);
    Ok(Json(response))
}
