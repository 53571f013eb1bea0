use async_trait::async_trait;
use common::RegistrationStatus;
use tracing::info;

/// A message to a registrant about a decision on their registration.
#[derive(Debug, Clone)]
pub struct Notification {
    pub registration_id: i32,
    pub recipient_email: String,
    pub recipient_name: String,
    pub workshop_title: String,
    pub status: RegistrationStatus,
    pub notes: Option<String>,
}

impl Notification {
    pub fn subject(&self) -> String {
        match self.status {
            RegistrationStatus::Confirmed => {
                format!("Your registration for {} is confirmed", self.workshop_title)
            }
            RegistrationStatus::PaymentRejected => {
                format!("Payment for {} could not be verified", self.workshop_title)
            }
            RegistrationStatus::Rejected => {
                format!("Your registration for {} was declined", self.workshop_title)
            }
            _ => format!("Update on your registration for {}", self.workshop_title),
        }
    }
}

/// Delivers registration notifications (e-mail, SMS, ...).
///
/// Called after the decision is committed; an error is logged by the caller
/// and never undoes the decision.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: Notification) -> anyhow::Result<()>;
}

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: Notification) -> anyhow::Result<()> {
        info!(
            registration_id = notification.registration_id,
            to = %notification.recipient_email,
            status = %notification.status,
            "{}",
            notification.subject()
        );
        Ok(())
    }
}
