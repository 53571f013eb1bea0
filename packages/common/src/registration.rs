#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ParseEnumError;
use crate::payment::GatewayStatus;

/// How a workshop (and therefore a registration for it) gets confirmed.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationType {
    /// Self-confirms when free, otherwise waits for the payment gateway.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "automated"))]
    Automated,
    /// Always waits for an admin decision.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "manual"))]
    Manual,
}

impl RegistrationType {
    pub const ALL: &'static [RegistrationType] = &[Self::Automated, Self::Manual];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Automated => "automated",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for RegistrationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistrationType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "automated" => Ok(Self::Automated),
            "manual" => Ok(Self::Manual),
            _ => Err(ParseEnumError::new(
                "registration type",
                s,
                Self::ALL.iter().map(|t| t.as_str()),
            )),
        }
    }
}

/// Lifecycle status of a registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    /// Waiting for an admin to approve or reject.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "pending_approval"))]
    PendingApproval,
    /// Waiting for the payment to be verified.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "payment_pending"))]
    PaymentPending,
    /// Seat secured.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "confirmed"))]
    Confirmed,
    /// Admin rejected the submitted payment.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "payment_rejected"))]
    PaymentRejected,
    /// Admin rejected the registration.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "rejected"))]
    Rejected,
}

impl RegistrationStatus {
    /// Returns true if no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Confirmed | Self::Rejected | Self::PaymentRejected
        )
    }

    /// Returns true if the registration is waiting for an admin or the gateway.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::PendingApproval | Self::PaymentPending)
    }

    pub const ALL: &'static [RegistrationStatus] = &[
        Self::PendingApproval,
        Self::PaymentPending,
        Self::Confirmed,
        Self::PaymentRejected,
        Self::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingApproval => "pending_approval",
            Self::PaymentPending => "payment_pending",
            Self::Confirmed => "confirmed",
            Self::PaymentRejected => "payment_rejected",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistrationStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|status| status.as_str() == s)
            .copied()
            .ok_or_else(|| {
                ParseEnumError::new(
                    "registration status",
                    s,
                    Self::ALL.iter().map(|t| t.as_str()),
                )
            })
    }
}

/// Payment progress attached to a registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "not_required"))]
    NotRequired,
    /// Payment expected, nothing submitted yet.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "pending"))]
    Pending,
    /// Proof submitted, waiting for the gateway or an admin.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "pending_verification"))]
    PendingVerification,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "completed"))]
    Completed,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "failed"))]
    Failed,
}

impl PaymentStatus {
    /// Returns true if money is (or was) expected for this registration.
    pub fn is_required(&self) -> bool {
        !matches!(self, Self::NotRequired)
    }

    pub const ALL: &'static [PaymentStatus] = &[
        Self::NotRequired,
        Self::Pending,
        Self::PendingVerification,
        Self::Completed,
        Self::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotRequired => "not_required",
            Self::Pending => "pending",
            Self::PendingVerification => "pending_verification",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the admin is reviewing. Only the reject outcome differs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReviewKind {
    Registration,
    Payment,
}

/// Admin decision on a pending registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Approve,
    Reject,
}

impl ReviewAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }
}

impl FromStr for ReviewAction {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            _ => Err(ParseEnumError::new(
                "action",
                s,
                ["approve", "reject"].into_iter(),
            )),
        }
    }
}

/// Status pair produced by every transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegistrationState {
    pub status: RegistrationStatus,
    pub payment_status: PaymentStatus,
}

impl RegistrationState {
    pub fn new(status: RegistrationStatus, payment_status: PaymentStatus) -> Self {
        Self {
            status,
            payment_status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("Registration is already {0} and can no longer change")]
    Terminal(RegistrationStatus),
    #[error("Registration in status {status} cannot be settled by the payment gateway")]
    NotAwaitingPayment { status: RegistrationStatus },
    #[error("Payment proof cannot be submitted while payment status is {0}")]
    ProofNotExpected(PaymentStatus),
}

/// Compute the state of a freshly created registration.
pub fn initial_state(registration_type: RegistrationType, payment_amount: i64) -> RegistrationState {
    match registration_type {
        RegistrationType::Manual => {
            RegistrationState::new(RegistrationStatus::PendingApproval, PaymentStatus::NotRequired)
        }
        RegistrationType::Automated if payment_amount > 0 => {
            RegistrationState::new(RegistrationStatus::PaymentPending, PaymentStatus::Pending)
        }
        RegistrationType::Automated => {
            RegistrationState::new(RegistrationStatus::Confirmed, PaymentStatus::NotRequired)
        }
    }
}

/// Apply an admin decision to a pending registration.
pub fn review(
    current: RegistrationState,
    kind: ReviewKind,
    action: ReviewAction,
) -> Result<RegistrationState, TransitionError> {
    if current.status.is_terminal() {
        return Err(TransitionError::Terminal(current.status));
    }

    let required = current.payment_status.is_required();
    let next = match (action, kind) {
        (ReviewAction::Approve, _) => RegistrationState::new(
            RegistrationStatus::Confirmed,
            if required {
                PaymentStatus::Completed
            } else {
                current.payment_status
            },
        ),
        (ReviewAction::Reject, ReviewKind::Registration) => {
            RegistrationState::new(RegistrationStatus::Rejected, current.payment_status)
        }
        (ReviewAction::Reject, ReviewKind::Payment) => RegistrationState::new(
            RegistrationStatus::PaymentRejected,
            if required {
                PaymentStatus::Failed
            } else {
                current.payment_status
            },
        ),
    };
    Ok(next)
}

/// Apply a payment gateway notification to a registration awaiting payment.
pub fn settle(
    current: RegistrationState,
    gateway: GatewayStatus,
) -> Result<RegistrationState, TransitionError> {
    if current.status != RegistrationStatus::PaymentPending {
        return Err(TransitionError::NotAwaitingPayment {
            status: current.status,
        });
    }

    let next = match gateway {
        GatewayStatus::Success => {
            RegistrationState::new(RegistrationStatus::Confirmed, PaymentStatus::Completed)
        }
        GatewayStatus::Failed => {
            RegistrationState::new(RegistrationStatus::PaymentPending, PaymentStatus::Failed)
        }
        GatewayStatus::Pending => RegistrationState::new(
            RegistrationStatus::PaymentPending,
            PaymentStatus::PendingVerification,
        ),
    };
    Ok(next)
}

/// Record that the user submitted a payment proof (transaction id or screenshot).
pub fn submit_proof(current: RegistrationState) -> Result<RegistrationState, TransitionError> {
    if current.status != RegistrationStatus::PaymentPending {
        return Err(TransitionError::NotAwaitingPayment {
            status: current.status,
        });
    }
    match current.payment_status {
        PaymentStatus::Pending | PaymentStatus::Failed => Ok(RegistrationState::new(
            current.status,
            PaymentStatus::PendingVerification,
        )),
        PaymentStatus::PendingVerification => Ok(current),
        other => Err(TransitionError::ProofNotExpected(other)),
    }
}
