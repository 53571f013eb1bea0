use chrono::{DateTime, NaiveDate, Utc};
use common::RegistrationType;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

use super::shared::{Pagination, double_option, required};
use crate::entity::workshop;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkshopRequest {
    #[schema(example = "Advanced React Development")]
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(example = "TechCorp Solutions")]
    pub organizer: Option<String>,
    #[schema(example = "Sarah Johnson")]
    pub instructor: Option<String>,
    /// `YYYY-MM-DD`.
    #[schema(value_type = Option<String>, example = "2024-02-15")]
    pub date: Option<String>,
    #[schema(example = "10:00 AM")]
    pub time: Option<String>,
    #[schema(example = "6 hours")]
    pub duration: Option<String>,
    #[schema(example = "Online")]
    pub location: Option<String>,
    #[schema(example = "Mumbai")]
    pub city: Option<String>,
    #[schema(example = 2999)]
    pub price: Option<i64>,
    /// Defaults to `automated`.
    pub mode: Option<RegistrationType>,
    #[schema(example = "Technology")]
    pub category: Option<String>,
    #[schema(example = "Advanced")]
    pub level: Option<String>,
    #[schema(example = 50)]
    pub max_seats: Option<i32>,
    pub featured: Option<bool>,
    pub image: Option<String>,
    pub tags: Option<Vec<String>>,
    pub prerequisites: Option<Vec<String>>,
    pub what_you_learn: Option<Vec<String>>,
    #[schema(value_type = Option<Vec<Object>>)]
    pub agenda: Option<Vec<serde_json::Value>>,
}

/// Fields of a workshop after create-time validation.
pub struct NewWorkshop {
    pub title: String,
    pub description: String,
    pub organizer: String,
    pub instructor: String,
    pub date: NaiveDate,
    pub time: String,
    pub duration: String,
    pub location: String,
    pub city: String,
    pub price: i64,
    pub mode: RegistrationType,
    pub category: String,
    pub level: String,
    pub max_seats: i32,
    pub featured: bool,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
    pub prerequisites: Vec<String>,
    pub what_you_learn: Vec<String>,
    pub agenda: Vec<serde_json::Value>,
}

impl NewWorkshop {
    pub fn into_active_model(self, now: DateTime<Utc>) -> workshop::ActiveModel {
        let search_text = search_text(
            &self.title,
            &self.description,
            &self.instructor,
            &self.organizer,
            &self.category,
            &self.tags,
        );
        workshop::ActiveModel {
            title: Set(self.title),
            description: Set(self.description),
            organizer: Set(self.organizer),
            instructor: Set(self.instructor),
            date: Set(self.date),
            time: Set(self.time),
            duration: Set(self.duration),
            location: Set(self.location),
            city: Set(self.city),
            price: Set(self.price),
            mode: Set(self.mode),
            category: Set(self.category),
            level: Set(self.level),
            max_seats: Set(self.max_seats),
            registered_seats: Set(0),
            featured: Set(self.featured),
            image_url: Set(self.image_url),
            tags: Set(serde_json::json!(self.tags)),
            prerequisites: Set(serde_json::json!(self.prerequisites)),
            what_you_learn: Set(serde_json::json!(self.what_you_learn)),
            agenda: Set(serde_json::Value::Array(self.agenda)),
            search_text: Set(search_text),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
    }
}

pub const DEFAULT_MAX_SEATS: i32 = 50;

pub fn validate_create_workshop(req: CreateWorkshopRequest) -> Result<NewWorkshop, AppError> {
    let title = required(req.title, "title")?;
    let organizer = required(req.organizer, "organizer")?;
    let instructor = required(req.instructor, "instructor")?;
    let date = parse_date(&required(req.date, "date")?)?;
    let time = required(req.time, "time")?;
    let location = required(req.location, "location")?;
    let category = required(req.category, "category")?;
    let level = required(req.level, "level")?;

    validate_title(&title)?;
    let price = req.price.unwrap_or(0);
    validate_price(price)?;
    let max_seats = req.max_seats.unwrap_or(DEFAULT_MAX_SEATS);
    validate_max_seats(max_seats)?;

    let city = req
        .city
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| location.clone());

    Ok(NewWorkshop {
        title,
        description: req.description.unwrap_or_default().trim().to_string(),
        organizer,
        instructor,
        date,
        time,
        duration: req.duration.unwrap_or_default().trim().to_string(),
        location,
        city,
        price,
        mode: req.mode.unwrap_or(RegistrationType::Automated),
        category,
        level,
        max_seats,
        featured: req.featured.unwrap_or(false),
        image_url: req.image.filter(|s| !s.trim().is_empty()),
        tags: req.tags.unwrap_or_default(),
        prerequisites: req.prerequisites.unwrap_or_default(),
        what_you_learn: req.what_you_learn.unwrap_or_default(),
        agenda: req.agenda.unwrap_or_default(),
    })
}

/// Partial update. Absent fields are left unchanged.
#[derive(Deserialize, Default, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkshopRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub organizer: Option<String>,
    pub instructor: Option<String>,
    #[schema(value_type = Option<String>, example = "2024-03-01")]
    pub date: Option<String>,
    pub time: Option<String>,
    pub duration: Option<String>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub price: Option<i64>,
    pub mode: Option<RegistrationType>,
    pub category: Option<String>,
    pub level: Option<String>,
    pub max_seats: Option<i32>,
    pub featured: Option<bool>,
    /// `null` clears the image.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub image: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub prerequisites: Option<Vec<String>>,
    pub what_you_learn: Option<Vec<String>>,
    #[schema(value_type = Option<Vec<Object>>)]
    pub agenda: Option<Vec<serde_json::Value>>,
}

pub fn validate_update_workshop(req: &UpdateWorkshopRequest) -> Result<(), AppError> {
    if let Some(ref title) = req.title {
        validate_title(title)?;
    }
    for (value, field) in [
        (&req.organizer, "organizer"),
        (&req.instructor, "instructor"),
        (&req.time, "time"),
        (&req.location, "location"),
        (&req.category, "category"),
        (&req.level, "level"),
    ] {
        if let Some(v) = value
            && v.trim().is_empty()
        {
            return Err(AppError::Validation(format!("{field} must not be empty")));
        }
    }
    if let Some(ref date) = req.date {
        parse_date(date)?;
    }
    if let Some(price) = req.price {
        validate_price(price)?;
    }
    if let Some(max_seats) = req.max_seats {
        validate_max_seats(max_seats)?;
    }
    Ok(())
}

pub fn parse_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation("date must be formatted as YYYY-MM-DD".into()))
}

fn validate_title(title: &str) -> Result<(), AppError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > 256 {
        return Err(AppError::Validation(
            "title must be 1-256 characters".into(),
        ));
    }
    Ok(())
}

fn validate_price(price: i64) -> Result<(), AppError> {
    if price < 0 {
        return Err(AppError::Validation("price must not be negative".into()));
    }
    Ok(())
}

fn validate_max_seats(max_seats: i32) -> Result<(), AppError> {
    if !(1..=100_000).contains(&max_seats) {
        return Err(AppError::Validation(
            "maxSeats must be between 1 and 100000".into(),
        ));
    }
    Ok(())
}

/// Lowercased text the catalogue search matches against.
pub fn search_text(
    title: &str,
    description: &str,
    instructor: &str,
    organizer: &str,
    category: &str,
    tags: &[String],
) -> String {
    let mut parts = vec![title, description, instructor, organizer, category];
    parts.extend(tags.iter().map(String::as_str));
    parts.join("\n").to_lowercase()
}

/// Rebuild the search text from a stored workshop.
pub fn search_text_for(model: &workshop::ActiveModel) -> Option<String> {
    use sea_orm::ActiveValue;

    fn get(v: &ActiveValue<String>) -> Option<&str> {
        match v {
            ActiveValue::Set(s) | ActiveValue::Unchanged(s) => Some(s.as_str()),
            ActiveValue::NotSet => None,
        }
    }

    let tags: Vec<String> = match &model.tags {
        ActiveValue::Set(v) | ActiveValue::Unchanged(v) => json_strings(v),
        ActiveValue::NotSet => return None,
    };
    Some(search_text(
        get(&model.title)?,
        get(&model.description)?,
        get(&model.instructor)?,
        get(&model.organizer)?,
        get(&model.category)?,
        &tags,
    ))
}

pub fn json_strings(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WorkshopListQuery {
    /// Case-insensitive match on title, description, instructor, organizer, category and tags.
    pub search: Option<String>,
    /// `All Categories` or `all` disables the filter.
    pub category: Option<String>,
    pub city: Option<String>,
    pub level: Option<String>,
    pub instructor: Option<String>,
    /// `free` or `paid`.
    pub price: Option<String>,
    /// `relevance` (default), `price-low`, `price-high`, `date`, `popularity`, `title` or `newest`.
    pub sort: Option<String>,
    pub page: Option<u64>,
    /// Items per page, 1-100 (default 10).
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkshopSort {
    Relevance,
    PriceLow,
    PriceHigh,
    Date,
    Popularity,
    Title,
    Newest,
}

impl WorkshopSort {
    pub fn parse(value: Option<&str>) -> Result<Self, AppError> {
        match value.map(str::trim).unwrap_or("relevance") {
            "" | "relevance" => Ok(Self::Relevance),
            "price-low" => Ok(Self::PriceLow),
            "price-high" => Ok(Self::PriceHigh),
            "date" => Ok(Self::Date),
            "popularity" => Ok(Self::Popularity),
            "title" => Ok(Self::Title),
            "newest" => Ok(Self::Newest),
            _ => Err(AppError::Validation(
                "sort must be one of: relevance, price-low, price-high, date, popularity, title, newest"
                    .into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceFilter {
    Free,
    Paid,
}

impl PriceFilter {
    pub fn parse(value: Option<&str>) -> Result<Option<Self>, AppError> {
        let Some(v) = value.map(str::trim) else {
            return Ok(None);
        };
        match v.to_ascii_lowercase().as_str() {
            "" | "all" | "all prices" => Ok(None),
            "free" => Ok(Some(Self::Free)),
            "paid" => Ok(Some(Self::Paid)),
            _ => Err(AppError::Validation(
                "price must be one of: free, paid".into(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkshopResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub organizer: String,
    pub instructor: String,
    #[schema(value_type = String, example = "2024-02-15")]
    pub date: NaiveDate,
    pub time: String,
    pub duration: String,
    pub location: String,
    pub city: String,
    pub price: i64,
    pub mode: RegistrationType,
    pub category: String,
    pub level: String,
    pub max_seats: i32,
    pub available_seats: i32,
    pub registered_seats: i32,
    pub featured: bool,
    pub image: Option<String>,
    pub tags: Vec<String>,
    pub prerequisites: Vec<String>,
    pub what_you_learn: Vec<String>,
    #[schema(value_type = Vec<Object>)]
    pub agenda: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<workshop::Model> for WorkshopResponse {
    fn from(m: workshop::Model) -> Self {
        Self {
            available_seats: m.available_seats(),
            tags: json_strings(&m.tags),
            prerequisites: json_strings(&m.prerequisites),
            what_you_learn: json_strings(&m.what_you_learn),
            id: m.id,
            title: m.title,
            description: m.description,
            organizer: m.organizer,
            instructor: m.instructor,
            date: m.date,
            time: m.time,
            duration: m.duration,
            location: m.location,
            city: m.city,
            price: m.price,
            mode: m.mode,
            category: m.category,
            level: m.level,
            max_seats: m.max_seats,
            registered_seats: m.registered_seats,
            featured: m.featured,
            image: m.image_url,
            agenda: m.agenda,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Distinct facet values across the whole catalogue.
#[derive(Serialize, utoipa::ToSchema)]
pub struct WorkshopFilters {
    pub categories: Vec<String>,
    pub cities: Vec<String>,
    pub levels: Vec<String>,
    pub instructors: Vec<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct WorkshopListResponse {
    pub workshops: Vec<WorkshopResponse>,
    pub pagination: Pagination,
    pub filters: WorkshopFilters,
}
