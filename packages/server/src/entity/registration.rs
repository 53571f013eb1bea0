use common::{PaymentStatus, RegistrationState, RegistrationStatus, RegistrationType};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "registration")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique_key = "registration_user_workshop")]
    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    #[sea_orm(unique_key = "registration_user_workshop")]
    pub workshop_id: i32,
    #[sea_orm(belongs_to, from = "workshop_id", to = "id")]
    pub workshop: HasOne<super::workshop::Entity>,

    pub registration_type: RegistrationType,
    #[sea_orm(indexed)]
    pub status: RegistrationStatus,
    pub payment_status: PaymentStatus,
    pub payment_amount: i64,

    pub transaction_id: Option<String>,
    pub payment_screenshot: Option<String>,
    pub upi_id: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub notes: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub admin_notes: Option<String>,
    pub reviewed_at: Option<DateTimeUtc>,

    /// Bumped on every status change; reviews update only the version they read.
    pub version: i32,

    pub registered_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl Model {
    pub fn state(&self) -> RegistrationState {
        RegistrationState::new(self.status, self.payment_status)
    }
}

impl ActiveModelBehavior for ActiveModel {}
