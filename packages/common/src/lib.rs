pub mod payment;
pub mod registration;

pub use payment::{GatewayStatus, GatewayTransaction, PaymentMethod, VerificationOutcome};
pub use registration::{
    PaymentStatus, RegistrationState, RegistrationStatus, RegistrationType, ReviewAction,
    ReviewKind, TransitionError,
};

/// Error returned when a string does not name a known enum variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {kind} '{value}'. Expected one of: {expected}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

impl ParseEnumError {
    pub(crate) fn new<'a>(
        kind: &'static str,
        value: &str,
        expected: impl Iterator<Item = &'a str>,
    ) -> Self {
        Self {
            kind,
            value: value.to_string(),
            expected: expected.collect::<Vec<_>>().join(", "),
        }
    }
}
