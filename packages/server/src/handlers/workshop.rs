use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::sea_query::LikeExpr;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{registration, workshop};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::models::shared::{MessageResponse, Pagination, escape_like, facet, page_and_limit};
use crate::models::workshop::*;
use crate::review::find_workshop;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: u64 = 10;

#[utoipa::path(
    get,
    path = "/",
    tag = "Workshops",
    operation_id = "listWorkshops",
    summary = "Browse the workshop catalogue",
    description = "Returns a page of workshops matching the search and facet filters, plus the distinct facet values of the whole catalogue. Facet values such as `All Categories` or `all` disable that filter.",
    params(WorkshopListQuery),
    responses(
        (status = 200, description = "Page of workshops", body = WorkshopListResponse),
        (status = 400, description = "Invalid query (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_workshops(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<WorkshopListQuery>,
) -> Result<Json<WorkshopListResponse>, AppError> {
    let (page, limit) = page_and_limit(query.page, query.limit, DEFAULT_PAGE_SIZE);
    let sort = WorkshopSort::parse(query.sort.as_deref())?;
    let price = PriceFilter::parse(query.price.as_deref())?;

    let mut select = workshop::Entity::find();

    if let Some(ref search) = query.search {
        let term = escape_like(&search.trim().to_lowercase());
        if !term.is_empty() {
            select = select.filter(
                workshop::Column::SearchText
                    .like(LikeExpr::new(format!("%{}%", term)).escape('\\')),
            );
        }
    }
    if let Some(category) = facet(&query.category) {
        select = select.filter(workshop::Column::Category.eq(category));
    }
    if let Some(city) = facet(&query.city) {
        select = select.filter(workshop::Column::City.eq(city));
    }
    if let Some(level) = facet(&query.level) {
        select = select.filter(workshop::Column::Level.eq(level));
    }
    if let Some(instructor) = facet(&query.instructor) {
        select = select.filter(workshop::Column::Instructor.eq(instructor));
    }
    select = match price {
        Some(PriceFilter::Free) => select.filter(workshop::Column::Price.eq(0)),
        Some(PriceFilter::Paid) => select.filter(workshop::Column::Price.gt(0)),
        None => select,
    };

    select = match sort {
        WorkshopSort::Relevance => select
            .order_by_desc(workshop::Column::Featured)
            .order_by_desc(workshop::Column::CreatedAt),
        WorkshopSort::PriceLow => select.order_by_asc(workshop::Column::Price),
        WorkshopSort::PriceHigh => select.order_by_desc(workshop::Column::Price),
        WorkshopSort::Date => select.order_by_asc(workshop::Column::Date),
        WorkshopSort::Popularity => select.order_by_desc(workshop::Column::RegisteredSeats),
        WorkshopSort::Title => select.order_by_asc(workshop::Column::Title),
        WorkshopSort::Newest => select.order_by_desc(workshop::Column::CreatedAt),
    };
    select = select.order_by_asc(workshop::Column::Id);

    let paginator = select.paginate(&state.db, limit);
    let total = paginator.num_items().await?;
    let models = paginator.fetch_page(page - 1).await?;

    Ok(Json(WorkshopListResponse {
        workshops: models.into_iter().map(WorkshopResponse::from).collect(),
        pagination: Pagination::new(page, limit, total),
        filters: load_filters(&state.db).await?,
    }))
}

async fn distinct_values(
    db: &DatabaseConnection,
    column: workshop::Column,
) -> Result<Vec<String>, DbErr> {
    workshop::Entity::find()
        .select_only()
        .column(column)
        .distinct()
        .order_by_asc(column)
        .into_tuple::<String>()
        .all(db)
        .await
}

async fn load_filters(db: &DatabaseConnection) -> Result<WorkshopFilters, AppError> {
    Ok(WorkshopFilters {
        categories: distinct_values(db, workshop::Column::Category).await?,
        cities: distinct_values(db, workshop::Column::City).await?,
        levels: distinct_values(db, workshop::Column::Level).await?,
        instructors: distinct_values(db, workshop::Column::Instructor).await?,
    })
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Workshops",
    operation_id = "createWorkshop",
    summary = "Create a workshop",
    description = "Requires `workshop:manage`. title, organizer, instructor, date, time, location, category and level are required.",
    request_body = CreateWorkshopRequest,
    responses(
        (status = 201, description = "Workshop created", body = WorkshopResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_workshop(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateWorkshopRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("workshop:manage")?;
    let w = validate_create_workshop(payload)?;

    let new_workshop = w.into_active_model(chrono::Utc::now());
    let model = new_workshop.insert(&state.db).await?;
    tracing::info!(workshop_id = model.id, "Workshop created");

    Ok((StatusCode::CREATED, Json(WorkshopResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Workshops",
    operation_id = "getWorkshop",
    summary = "Get a workshop",
    params(("id" = i32, Path, description = "Workshop ID")),
    responses(
        (status = 200, description = "Workshop", body = WorkshopResponse),
        (status = 404, description = "Workshop not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_workshop(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<WorkshopResponse>, AppError> {
    let model = find_workshop(&state.db, id).await?;
    Ok(Json(WorkshopResponse::from(model)))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Workshops",
    operation_id = "updateWorkshop",
    summary = "Update a workshop",
    description = "Partial update; absent fields are left unchanged. Requires `workshop:manage`. `maxSeats` cannot drop below the seats already taken.",
    params(("id" = i32, Path, description = "Workshop ID")),
    request_body = UpdateWorkshopRequest,
    responses(
        (status = 200, description = "Workshop updated", body = WorkshopResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Workshop not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_workshop(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateWorkshopRequest>,
) -> Result<Json<WorkshopResponse>, AppError> {
    auth_user.require_permission("workshop:manage")?;
    validate_update_workshop(&payload)?;

    let txn = state.db.begin().await?;
    let existing = find_workshop(&txn, id).await?;

    if let Some(max_seats) = payload.max_seats
        && max_seats < existing.registered_seats
    {
        return Err(AppError::Validation(format!(
            "maxSeats cannot be lower than the {} seats already taken",
            existing.registered_seats
        )));
    }

    let mut active: workshop::ActiveModel = existing.into();
    let trimmed = |s: String| s.trim().to_string();
    if let Some(v) = payload.title {
        active.title = Set(trimmed(v));
    }
    if let Some(v) = payload.description {
        active.description = Set(trimmed(v));
    }
    if let Some(v) = payload.organizer {
        active.organizer = Set(trimmed(v));
    }
    if let Some(v) = payload.instructor {
        active.instructor = Set(trimmed(v));
    }
    if let Some(ref v) = payload.date {
        active.date = Set(parse_date(v)?);
    }
    if let Some(v) = payload.time {
        active.time = Set(trimmed(v));
    }
    if let Some(v) = payload.duration {
        active.duration = Set(trimmed(v));
    }
    if let Some(v) = payload.location {
        active.location = Set(trimmed(v));
    }
    if let Some(v) = payload.city {
        active.city = Set(trimmed(v));
    }
    if let Some(v) = payload.price {
        active.price = Set(v);
    }
    if let Some(v) = payload.mode {
        active.mode = Set(v);
    }
    if let Some(v) = payload.category {
        active.category = Set(trimmed(v));
    }
    if let Some(v) = payload.level {
        active.level = Set(trimmed(v));
    }
    if let Some(v) = payload.max_seats {
        active.max_seats = Set(v);
    }
    if let Some(v) = payload.featured {
        active.featured = Set(v);
    }
    if let Some(v) = payload.image {
        active.image_url = Set(v.filter(|s| !s.trim().is_empty()));
    }
    if let Some(v) = payload.tags {
        active.tags = Set(serde_json::json!(v));
    }
    if let Some(v) = payload.prerequisites {
        active.prerequisites = Set(serde_json::json!(v));
    }
    if let Some(v) = payload.what_you_learn {
        active.what_you_learn = Set(serde_json::json!(v));
    }
    if let Some(v) = payload.agenda {
        active.agenda = Set(serde_json::Value::Array(v));
    }
    if let Some(text) = search_text_for(&active) {
        active.search_text = Set(text);
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(WorkshopResponse::from(model)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Workshops",
    operation_id = "deleteWorkshop",
    summary = "Delete a workshop",
    description = "Requires `workshop:manage`. Workshops that still have registrations cannot be deleted.",
    params(("id" = i32, Path, description = "Workshop ID")),
    responses(
        (status = 200, description = "Workshop deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Workshop not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Workshop has registrations (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_workshop(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    auth_user.require_permission("workshop:manage")?;

    let txn = state.db.begin().await?;
    find_workshop(&txn, id).await?;

    let registrations = registration::Entity::find()
        .filter(registration::Column::WorkshopId.eq(id))
        .count(&txn)
        .await?;
    if registrations > 0 {
        return Err(AppError::Conflict(format!(
            "Workshop has {registrations} registration(s) and cannot be deleted"
        )));
    }

    workshop::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(workshop_id = id, "Workshop deleted");
    Ok(Json(MessageResponse::new("Workshop deleted successfully")))
}
