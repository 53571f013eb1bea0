use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::RegistrationStatus;
use common::registration::{initial_state, submit_proof};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{registration, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::models::registration::*;
use crate::models::shared::MessageResponse;
use crate::review::{
    TransitionFields, apply_transition, consume_seat, find_registration, find_workshop,
    release_seat,
};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Registrations",
    operation_id = "listRegistrations",
    summary = "List registrations",
    description = "Users holding `registration:view_all` may filter by any user; everyone else only sees their own registrations.",
    params(RegistrationListQuery),
    responses(
        (status = 200, description = "Registrations, newest first", body = Vec<RegistrationResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_registrations(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<RegistrationListQuery>,
) -> Result<Json<Vec<RegistrationResponse>>, AppError> {
    let mut select = registration::Entity::find();

    if auth_user.has_permission("registration:view_all") {
        if let Some(user_id) = query.user_id {
            select = select.filter(registration::Column::UserId.eq(user_id));
        }
    } else {
        select = select.filter(registration::Column::UserId.eq(auth_user.user_id));
    }
    if let Some(workshop_id) = query.workshop_id {
        select = select.filter(registration::Column::WorkshopId.eq(workshop_id));
    }
    if let Some(status) = query.status {
        select = select.filter(registration::Column::Status.eq(status));
    }

    let models = select
        .order_by_desc(registration::Column::RegisteredAt)
        .order_by_desc(registration::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(
        models.into_iter().map(RegistrationResponse::from).collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Registrations",
    operation_id = "createRegistration",
    summary = "Register for a workshop",
    description = "Creates a registration whose initial status follows the requested registration type and payment amount: manual registrations wait for approval regardless of amount, free automated ones are confirmed immediately and paid automated ones wait for payment. `paymentAmount` defaults to the workshop price. Users may only register themselves unless they hold `registration:view_all`.",
    request_body = CreateRegistrationRequest,
    responses(
        (status = 201, description = "Registration created", body = RegistrationResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User or workshop not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already registered or no seats left (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_registration(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateRegistrationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (user_id, workshop_id, registration_type) = validate_create_registration(&payload)?;
    auth_user.require_self_or(user_id, "registration:view_all")?;

    let txn = state.db.begin().await?;

    let workshop = find_workshop(&txn, workshop_id).await?;
    user::Entity::find_by_id(user_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    // The request decides the flow; an omitted amount falls back to the price.
    let payment_amount = payload.payment_amount.unwrap_or(workshop.price);

    let duplicate = registration::Entity::find()
        .filter(registration::Column::UserId.eq(user_id))
        .filter(registration::Column::WorkshopId.eq(workshop_id))
        .one(&txn)
        .await?;
    if duplicate.is_some() {
        return Err(AppError::Conflict(
            "User is already registered for this workshop".into(),
        ));
    }
    if workshop.available_seats() == 0 {
        return Err(AppError::Conflict(
            "No seats available for this workshop".into(),
        ));
    }

    let initial = initial_state(registration_type, payment_amount);
    let now = Utc::now();
    let new_registration = registration::ActiveModel {
        user_id: Set(user_id),
        workshop_id: Set(workshop_id),
        registration_type: Set(registration_type),
        status: Set(initial.status),
        payment_status: Set(initial.payment_status),
        payment_amount: Set(payment_amount),
        transaction_id: Set(non_blank(payload.transaction_id)),
        payment_screenshot: Set(non_blank(payload.payment_screenshot)),
        upi_id: Set(non_blank(payload.upi_id)),
        notes: Set(payload.notes.unwrap_or_default()),
        admin_notes: Set(None),
        reviewed_at: Set(None),
        version: Set(0),
        registered_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_registration
        .insert(&txn)
        .await
        .map_err(|e| {
            AppError::unique_or(
                e,
                AppError::Conflict("User is already registered for this workshop".into()),
            )
        })?;

    if model.status == RegistrationStatus::Confirmed {
        consume_seat(&txn, workshop_id).await?;
    }

    txn.commit().await?;

    tracing::info!(
        registration_id = model.id,
        workshop_id,
        status = %model.status,
        "Registration created"
    );

    Ok((StatusCode::CREATED, Json(RegistrationResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Registrations",
    operation_id = "getRegistration",
    summary = "Get a registration",
    params(("id" = i32, Path, description = "Registration ID")),
    responses(
        (status = 200, description = "Registration", body = RegistrationResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Registration not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_registration(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<RegistrationResponse>, AppError> {
    let model = find_visible_registration(&state.db, &auth_user, id).await?;
    Ok(Json(RegistrationResponse::from(model)))
}

/// Other users' registrations are reported as missing rather than forbidden.
async fn find_visible_registration<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    id: i32,
) -> Result<registration::Model, AppError> {
    let model = find_registration(db, id).await?;
    if model.user_id != auth_user.user_id && !auth_user.has_permission("registration:view_all") {
        return Err(AppError::NotFound("Registration not found".into()));
    }
    Ok(model)
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Registrations",
    operation_id = "updateRegistration",
    summary = "Update notes or payment proof",
    description = "Updates notes, transactionId, paymentScreenshot and upiId. Submitting a transaction ID or screenshot while payment is pending or failed moves the payment to `pending_verification`.",
    params(("id" = i32, Path, description = "Registration ID")),
    request_body = UpdateRegistrationRequest,
    responses(
        (status = 200, description = "Registration updated", body = RegistrationResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Registration not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Concurrent update (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_registration(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateRegistrationRequest>,
) -> Result<Json<RegistrationResponse>, AppError> {
    validate_update_registration(&payload)?;

    let txn = state.db.begin().await?;
    let current = find_visible_registration(&txn, &auth_user, id).await?;
    let submits_proof = payload.submits_proof();

    let mut active: registration::ActiveModel = current.clone().into();
    if let Some(notes) = payload.notes {
        active.notes = Set(notes);
    }
    if let Some(v) = payload.transaction_id {
        active.transaction_id = Set(non_blank(Some(v)));
    }
    if let Some(v) = payload.payment_screenshot {
        active.payment_screenshot = Set(non_blank(Some(v)));
    }
    if let Some(v) = payload.upi_id {
        active.upi_id = Set(non_blank(Some(v)));
    }
    active.updated_at = Set(Utc::now());
    let mut model = active.update(&txn).await?;

    // Proof only moves the payment forward while the registration awaits it.
    if submits_proof
        && let Ok(next) = submit_proof(model.state())
        && next != model.state()
    {
        model = apply_transition(&txn, &model, next, TransitionFields::default()).await?;
        tracing::info!(registration_id = id, "Payment proof submitted");
    }

    txn.commit().await?;
    Ok(Json(RegistrationResponse::from(model)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Registrations",
    operation_id = "deleteRegistration",
    summary = "Delete a registration",
    description = "Requires `registration:delete`. A confirmed registration gives its seat back.",
    params(("id" = i32, Path, description = "Registration ID")),
    responses(
        (status = 200, description = "Registration deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Registration not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_registration(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    auth_user.require_permission("registration:delete")?;

    let txn = state.db.begin().await?;
    let model = find_registration(&txn, id).await?;

    registration::Entity::delete_by_id(id).exec(&txn).await?;
    if model.status == RegistrationStatus::Confirmed {
        release_seat(&txn, model.workshop_id).await?;
    }
    txn.commit().await?;

    tracing::info!(registration_id = id, "Registration deleted");
    Ok(Json(MessageResponse::new("Registration deleted successfully")))
}
