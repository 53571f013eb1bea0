#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ParseEnumError;

/// Status reported by the payment gateway for a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum GatewayStatus {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "success"))]
    Success,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "failed"))]
    Failed,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "pending"))]
    Pending,
}

impl GatewayStatus {
    pub const ALL: &'static [GatewayStatus] = &[Self::Success, Self::Failed, Self::Pending];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Pending => "pending",
        }
    }
}

impl fmt::Display for GatewayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "upi"))]
    Upi,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "bank_transfer"))]
    BankTransfer,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "card"))]
    Card,
}

impl PaymentMethod {
    pub const ALL: &'static [PaymentMethod] = &[Self::Upi, Self::BankTransfer, Self::Card];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upi => "upi",
            Self::BankTransfer => "bank_transfer",
            Self::Card => "card",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|m| m.as_str() == s)
            .copied()
            .ok_or_else(|| {
                ParseEnumError::new("payment method", s, Self::ALL.iter().map(|m| m.as_str()))
            })
    }
}

/// Gateway transaction as seen by the verification check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayTransaction {
    pub transaction_id: String,
    pub amount: i64,
    pub status: GatewayStatus,
    pub payment_method: PaymentMethod,
    pub upi_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Result of checking a claimed payment against the gateway record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerificationOutcome {
    Success(GatewayTransaction),
    NotFound,
    /// `expected` is the claimed amount, `actual` the amount on record.
    AmountMismatch { expected: i64, actual: i64 },
    Failed,
    Pending,
}

impl VerificationOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Wire name of the outcome.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::NotFound => "not_found",
            Self::AmountMismatch { .. } => "amount_mismatch",
            Self::Failed => "failed",
            Self::Pending => "pending",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Success(_) => "Payment verified successfully",
            Self::NotFound => "Transaction not found. Please check your transaction ID.",
            Self::AmountMismatch { .. } => "Payment amount does not match the workshop fee",
            Self::Failed => "Payment failed. Please try again or contact support.",
            Self::Pending => "Payment is still being processed. Please wait.",
        }
    }
}

/// Check a claimed payment against the gateway record, if any.
///
/// Checks run in order: existence, amount, then the gateway status. The first
/// failing check decides the outcome.
pub fn verify(record: Option<&GatewayTransaction>, claimed_amount: i64) -> VerificationOutcome {
    let Some(record) = record else {
        return VerificationOutcome::NotFound;
    };
    if record.amount != claimed_amount {
        return VerificationOutcome::AmountMismatch {
            expected: claimed_amount,
            actual: record.amount,
        };
    }
    match record.status {
        GatewayStatus::Failed => VerificationOutcome::Failed,
        GatewayStatus::Pending => VerificationOutcome::Pending,
        GatewayStatus::Success => VerificationOutcome::Success(record.clone()),
    }
}

/// Events accepted from the payment gateway webhook.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WebhookEvent {
    PaymentSuccess,
    PaymentFailed,
    PaymentPending,
}

impl WebhookEvent {
    /// Parse an event name, returning `None` for events this service ignores.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "payment.success" => Some(Self::PaymentSuccess),
            "payment.failed" => Some(Self::PaymentFailed),
            "payment.pending" => Some(Self::PaymentPending),
            _ => None,
        }
    }

    pub fn gateway_status(&self) -> GatewayStatus {
        match self {
            Self::PaymentSuccess => GatewayStatus::Success,
            Self::PaymentFailed => GatewayStatus::Failed,
            Self::PaymentPending => GatewayStatus::Pending,
        }
    }
}
