use common::RegistrationType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "workshop")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(indexed)]
    pub organizer: String,
    #[sea_orm(indexed)]
    pub instructor: String,

    pub date: Date,
    pub time: String,
    pub duration: String,
    pub location: String,
    #[sea_orm(indexed)]
    pub city: String,

    /// Whole currency units; 0 means free.
    pub price: i64,
    pub mode: RegistrationType,
    #[sea_orm(indexed)]
    pub category: String,
    pub level: String,

    pub max_seats: i32,
    /// Confirmed registrations. Never exceeds `max_seats`.
    pub registered_seats: i32,
    pub featured: bool,
    pub image_url: Option<String>,

    /// JSON arrays of strings.
    #[sea_orm(column_type = "Json")]
    pub tags: Json,
    #[sea_orm(column_type = "Json")]
    pub prerequisites: Json,
    #[sea_orm(column_type = "Json")]
    pub what_you_learn: Json,
    #[sea_orm(column_type = "Json")]
    pub agenda: Json,

    /// Lowercased title, description, instructor, organizer and tags, for search.
    #[sea_orm(column_type = "Text")]
    pub search_text: String,

    #[sea_orm(has_many)]
    pub registrations: HasMany<super::registration::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl Model {
    pub fn available_seats(&self) -> i32 {
        (self.max_seats - self.registered_seats).max(0)
    }
}

impl ActiveModelBehavior for ActiveModel {}
