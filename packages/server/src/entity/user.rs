use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role assigned to accounts created through signup.
pub const DEFAULT_ROLE: &str = "user";
pub const ADMIN_ROLE: &str = "admin";

/// Permissions granted to each role. Roles not listed have none.
pub const ROLE_PERMISSIONS: &[(&str, &[&str])] = &[(
    ADMIN_ROLE,
    &[
        "workshop:manage",
        "registration:view_all",
        "registration:review",
        "registration:delete",
        "stats:view",
    ],
)];

pub fn permissions_for(role: &str) -> Vec<String> {
    ROLE_PERMISSIONS
        .iter()
        .find(|(name, _)| *name == role)
        .map(|(_, perms)| perms.iter().map(|p| ToString::to_string(p)).collect())
        .unwrap_or_default()
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    /// Argon2 PHC string.
    pub password: String,
    pub role: String,

    #[sea_orm(has_many)]
    pub registrations: HasMany<super::registration::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
