//! Persisted registration transitions shared by the admin, webhook and
//! registration handlers.

use chrono::Utc;
use common::registration as engine;
use common::{
    GatewayStatus, RegistrationState, RegistrationStatus, ReviewAction, ReviewKind,
};
use sea_orm::*;
use tracing::{info, warn};

use crate::entity::{registration, user, workshop};
use crate::error::AppError;
use crate::notify::Notification;
use crate::state::AppState;

/// Compare-and-set attempts before a busy workshop is reported as a conflict.
const SEAT_CAS_ATTEMPTS: usize = 5;

pub async fn find_registration<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<registration::Model, AppError> {
    registration::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Registration not found".into()))
}

pub async fn find_workshop<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<workshop::Model, AppError> {
    workshop::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Workshop not found".into()))
}

/// Take one seat of a workshop. Fails with `Conflict` when it is full.
pub async fn consume_seat<C: ConnectionTrait>(db: &C, workshop_id: i32) -> Result<(), AppError> {
    adjust_seats(db, workshop_id, 1).await
}

/// Give back a seat taken by a confirmed registration.
pub async fn release_seat<C: ConnectionTrait>(db: &C, workshop_id: i32) -> Result<(), AppError> {
    adjust_seats(db, workshop_id, -1).await
}

async fn adjust_seats<C: ConnectionTrait>(
    db: &C,
    workshop_id: i32,
    delta: i32,
) -> Result<(), AppError> {
    for _ in 0..SEAT_CAS_ATTEMPTS {
        let w = find_workshop(db, workshop_id).await?;
        let next = w.registered_seats + delta;
        if next > w.max_seats {
            return Err(AppError::Conflict(
                "No seats available for this workshop".into(),
            ));
        }
        let next = std::cmp::Ord::max(next, 0);

        let result = workshop::Entity::update_many()
            .set(workshop::ActiveModel {
                registered_seats: Set(next),
                updated_at: Set(Utc::now()),
                ..Default::default()
            })
            .filter(workshop::Column::Id.eq(workshop_id))
            .filter(workshop::Column::RegisteredSeats.eq(w.registered_seats))
            .exec(db)
            .await?;

        if result.rows_affected == 1 {
            return Ok(());
        }
    }
    Err(AppError::Conflict(
        "Workshop seats changed concurrently, please retry".into(),
    ))
}

/// Extra columns written together with a status change.
#[derive(Default)]
pub struct TransitionFields {
    pub admin_notes: Option<String>,
    pub reviewed: bool,
    /// Recorded only when the registration has no transaction yet.
    pub transaction_id: Option<String>,
}

/// Write `next` if the row still has the version `current` was read at.
///
/// Takes a seat when the registration becomes confirmed. Callers run this
/// inside a transaction so a full workshop rolls the status back.
pub async fn apply_transition<C: ConnectionTrait>(
    db: &C,
    current: &registration::Model,
    next: RegistrationState,
    fields: TransitionFields,
) -> Result<registration::Model, AppError> {
    let now = Utc::now();
    let mut changes = registration::ActiveModel {
        status: Set(next.status),
        payment_status: Set(next.payment_status),
        version: Set(current.version + 1),
        updated_at: Set(now),
        ..Default::default()
    };
    if fields.reviewed {
        changes.reviewed_at = Set(Some(now));
    }
    if let Some(notes) = fields.admin_notes {
        changes.admin_notes = Set(Some(notes));
    }
    if let Some(txn_id) = fields.transaction_id
        && current.transaction_id.is_none()
    {
        changes.transaction_id = Set(Some(txn_id));
    }

    let result = registration::Entity::update_many()
        .set(changes)
        .filter(registration::Column::Id.eq(current.id))
        .filter(registration::Column::Version.eq(current.version))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::Conflict(
            "Registration was modified by another request, reload and retry".into(),
        ));
    }

    if next.status == RegistrationStatus::Confirmed
        && current.status != RegistrationStatus::Confirmed
    {
        consume_seat(db, current.workshop_id).await?;
    }

    find_registration(db, current.id).await
}

/// Apply an admin decision and notify the registrant.
pub async fn review(
    state: &AppState,
    registration_id: i32,
    kind: ReviewKind,
    action: ReviewAction,
    notes: Option<String>,
) -> Result<registration::Model, AppError> {
    let txn = state.db.begin().await?;

    let current = find_registration(&txn, registration_id).await?;
    let next = engine::review(current.state(), kind, action)?;
    let updated = apply_transition(
        &txn,
        &current,
        next,
        TransitionFields {
            admin_notes: notes,
            reviewed: true,
            ..Default::default()
        },
    )
    .await?;

    txn.commit().await?;

    info!(
        registration_id,
        from = %current.status,
        to = %updated.status,
        action = action.as_str(),
        "Registration reviewed"
    );

    notify(state, &updated).await;
    Ok(updated)
}

/// Apply a gateway result to a registration awaiting payment, recording the
/// gateway transaction on it in the same write.
pub async fn settle(
    state: &AppState,
    current: &registration::Model,
    gateway: GatewayStatus,
    transaction_id: String,
) -> Result<registration::Model, AppError> {
    let next = engine::settle(current.state(), gateway)?;

    let txn = state.db.begin().await?;
    let updated = apply_transition(
        &txn,
        current,
        next,
        TransitionFields {
            transaction_id: Some(transaction_id),
            ..Default::default()
        },
    )
    .await?;
    txn.commit().await?;

    if updated.status != current.status {
        notify(state, &updated).await;
    }
    Ok(updated)
}

/// Send the decision notification. Failures are logged and otherwise ignored.
pub async fn notify(state: &AppState, registration: &registration::Model) {
    let lookup = async {
        let u = user::Entity::find_by_id(registration.user_id)
            .one(&state.db)
            .await?;
        let w = workshop::Entity::find_by_id(registration.workshop_id)
            .one(&state.db)
            .await?;
        Ok::<_, DbErr>(u.zip(w))
    };

    let (u, w) = match lookup.await {
        Ok(Some(pair)) => pair,
        Ok(None) => {
            warn!(
                registration_id = registration.id,
                "Skipping notification: user or workshop missing"
            );
            return;
        }
        Err(e) => {
            warn!(registration_id = registration.id, "Skipping notification: {e}");
            return;
        }
    };

    let notification = Notification {
        registration_id: registration.id,
        recipient_email: u.email,
        recipient_name: u.name,
        workshop_title: w.title,
        status: registration.status,
        notes: registration.admin_notes.clone(),
    };
    if let Err(e) = state.notifier.send(notification).await {
        warn!(
            registration_id = registration.id,
            "Failed to send notification: {e:#}"
        );
    }
}
