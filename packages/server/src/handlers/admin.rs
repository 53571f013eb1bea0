use std::collections::{BTreeMap, HashMap};

use axum::{
    Json,
    extract::{Path, State},
};
use common::{PaymentStatus, RegistrationStatus, ReviewAction, ReviewKind};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{registration, user, workshop};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppQuery, OptionalJson};
use crate::models::admin::*;
use crate::review;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/payments/verify",
    tag = "Admin",
    operation_id = "decidePayment",
    summary = "Approve or reject a submitted payment",
    description = "Approving a payment under verification confirms the registration and takes a seat. Rejecting it rejects the registration. Requires `registration:review`.",
    request_body = VerifyPaymentDecisionRequest,
    responses(
        (status = 200, description = "Decision applied", body = PaymentDecisionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Registration not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Not awaiting payment review (INVALID_STATE_TRANSITION) or no seats left (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn verify_payment_decision(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<VerifyPaymentDecisionRequest>,
) -> Result<Json<PaymentDecisionResponse>, AppError> {
    auth_user.require_permission("registration:review")?;
    let (registration_id, action) = validate_payment_decision(&payload)?;

    let updated = review::review(
        &state,
        registration_id,
        ReviewKind::Payment,
        action,
        payload.admin_notes,
    )
    .await?;

    let message = match action {
        ReviewAction::Approve => "Payment approved and registration confirmed",
        ReviewAction::Reject => "Payment rejected",
    };

    Ok(Json(PaymentDecisionResponse {
        success: true,
        message: message.into(),
        registration_id,
        new_status: updated.status,
        admin_notes: updated.admin_notes,
        verified_at: updated.reviewed_at.unwrap_or(updated.updated_at),
    }))
}

#[utoipa::path(
    post,
    path = "/registrations/{id}/approve",
    tag = "Admin",
    operation_id = "approveRegistration",
    summary = "Approve a manual registration",
    description = "Confirms a registration pending approval and takes a seat. The body is optional. Requires `registration:review`.",
    params(("id" = i32, Path, description = "Registration ID")),
    request_body(content = Option<ApproveRegistrationRequest>),
    responses(
        (status = 200, description = "Registration approved", body = RegistrationDecisionResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Registration not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Not pending approval (INVALID_STATE_TRANSITION) or no seats left (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn approve_registration(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    OptionalJson(payload): OptionalJson<ApproveRegistrationRequest>,
) -> Result<Json<RegistrationDecisionResponse>, AppError> {
    auth_user.require_permission("registration:review")?;
    validate_admin_notes(payload.notes.as_deref())?;

    let updated = review::review(
        &state,
        id,
        ReviewKind::Registration,
        ReviewAction::Approve,
        payload.notes,
    )
    .await?;

    Ok(Json(RegistrationDecisionResponse {
        message: "Registration approved successfully".into(),
        registration_id: id,
        status: updated.status,
        reason: updated.admin_notes,
    }))
}

#[utoipa::path(
    post,
    path = "/registrations/{id}/reject",
    tag = "Admin",
    operation_id = "rejectRegistration",
    summary = "Reject a manual registration",
    description = "Rejects a registration pending approval. The body is optional. Requires `registration:review`.",
    params(("id" = i32, Path, description = "Registration ID")),
    request_body(content = Option<RejectRegistrationRequest>),
    responses(
        (status = 200, description = "Registration rejected", body = RegistrationDecisionResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Registration not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Not pending approval (INVALID_STATE_TRANSITION)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn reject_registration(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    OptionalJson(payload): OptionalJson<RejectRegistrationRequest>,
) -> Result<Json<RegistrationDecisionResponse>, AppError> {
    auth_user.require_permission("registration:review")?;
    validate_admin_notes(payload.reason.as_deref())?;

    let updated = review::review(
        &state,
        id,
        ReviewKind::Registration,
        ReviewAction::Reject,
        payload.reason,
    )
    .await?;

    Ok(Json(RegistrationDecisionResponse {
        message: "Registration rejected successfully".into(),
        registration_id: id,
        status: updated.status,
        reason: updated.admin_notes,
    }))
}

#[utoipa::path(
    get,
    path = "/registrations",
    tag = "Admin",
    operation_id = "listAdminRegistrations",
    summary = "List registrations with registrant and workshop details",
    description = "Newest first. Requires `registration:view_all`.",
    params(AdminRegistrationQuery),
    responses(
        (status = 200, description = "Registrations", body = Vec<AdminRegistrationItem>),
        (status = 400, description = "Unknown status filter (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_admin_registrations(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<AdminRegistrationQuery>,
) -> Result<Json<Vec<AdminRegistrationItem>>, AppError> {
    auth_user.require_permission("registration:view_all")?;

    let mut select = registration::Entity::find();
    if let Some(status) = parse_status_filter(query.status.as_deref())? {
        select = select.filter(registration::Column::Status.eq(status));
    }
    let registrations = select
        .order_by_desc(registration::Column::RegisteredAt)
        .order_by_desc(registration::Column::Id)
        .all(&state.db)
        .await?;

    let user_ids: Vec<i32> = registrations.iter().map(|r| r.user_id).collect();
    let workshop_ids: Vec<i32> = registrations.iter().map(|r| r.workshop_id).collect();

    let users: HashMap<i32, user::Model> = user::Entity::find()
        .filter(user::Column::Id.is_in(user_ids))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();
    let workshops: HashMap<i32, workshop::Model> = workshop::Entity::find()
        .filter(workshop::Column::Id.is_in(workshop_ids))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|w| (w.id, w))
        .collect();

    let needle = query
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let items = registrations
        .into_iter()
        .filter_map(|r| {
            let u = users.get(&r.user_id)?;
            let w = workshops.get(&r.workshop_id)?;
            Some(AdminRegistrationItem::new(r, u, w))
        })
        .filter(|item| needle.as_deref().is_none_or(|n| item.matches(n)))
        .collect();

    Ok(Json(items))
}

async fn count_status(
    db: &DatabaseConnection,
    statuses: &[RegistrationStatus],
) -> Result<u64, DbErr> {
    registration::Entity::find()
        .filter(registration::Column::Status.is_in(statuses.iter().copied()))
        .count(db)
        .await
}

#[utoipa::path(
    get,
    path = "/stats",
    tag = "Admin",
    operation_id = "getAdminStats",
    summary = "Dashboard statistics",
    description = "Requires `stats:view`.",
    responses(
        (status = 200, description = "Statistics", body = AdminStatsResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn stats(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AdminStatsResponse>, AppError> {
    auth_user.require_permission("stats:view")?;
    let db = &state.db;

    let total_users = user::Entity::find().count(db).await?;
    let total_workshops = workshop::Entity::find().count(db).await?;
    let total_registrations = registration::Entity::find().count(db).await?;

    let confirmed_registrations = count_status(db, &[RegistrationStatus::Confirmed]).await?;
    let pending_approvals = count_status(
        db,
        &[
            RegistrationStatus::PendingApproval,
            RegistrationStatus::PaymentPending,
        ],
    )
    .await?;
    let pending_registrations = pending_approvals;
    let rejected_registrations = count_status(
        db,
        &[
            RegistrationStatus::Rejected,
            RegistrationStatus::PaymentRejected,
        ],
    )
    .await?;

    let paid = registration::Entity::find()
        .filter(registration::Column::PaymentStatus.eq(PaymentStatus::Completed))
        .all(db)
        .await?;

    let total_revenue = paid.iter().map(|r| r.payment_amount).sum();
    let mut by_month: BTreeMap<String, i64> = BTreeMap::new();
    for r in &paid {
        *by_month
            .entry(r.registered_at.format("%Y-%m").to_string())
            .or_default() += r.payment_amount;
    }
    let monthly_revenue = by_month
        .into_iter()
        .map(|(month, revenue)| MonthlyRevenue { month, revenue })
        .collect();

    let categories: Vec<String> = workshop::Entity::find()
        .select_only()
        .column(workshop::Column::Category)
        .into_tuple()
        .all(db)
        .await?;
    let mut per_category: BTreeMap<String, u64> = BTreeMap::new();
    for category in categories {
        *per_category.entry(category).or_default() += 1;
    }
    let mut top_categories: Vec<CategoryCount> = per_category
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect();
    // Stable sort keeps ties alphabetical.
    top_categories.sort_by(|a, b| b.count.cmp(&a.count));

    Ok(Json(AdminStatsResponse {
        total_users,
        total_workshops,
        total_revenue,
        pending_approvals,
        total_registrations,
        confirmed_registrations,
        pending_registrations,
        rejected_registrations,
        monthly_revenue,
        top_categories,
    }))
}
