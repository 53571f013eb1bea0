use common::{GatewayStatus, GatewayTransaction, PaymentMethod};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transaction as reported by the payment gateway.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_record")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub transaction_id: String,

    pub amount: i64,
    pub status: GatewayStatus,
    pub payment_method: PaymentMethod,
    pub upi_id: Option<String>,
    pub timestamp: DateTimeUtc,
}

impl From<Model> for GatewayTransaction {
    fn from(m: Model) -> Self {
        Self {
            transaction_id: m.transaction_id,
            amount: m.amount,
            status: m.status,
            payment_method: m.payment_method,
            upi_id: m.upi_id,
            timestamp: m.timestamp,
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
