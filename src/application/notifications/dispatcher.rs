//! Best-effort notification dispatch
//!
//! Every notification runs on its own detached task. Delivery failures are
//! counted and logged there; the caller only ever gets a `JoinHandle` it is
//! free to drop.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::mailer::{EmailMessage, Mailer};
use crate::application::data_management::CollectionCounts;

#[derive(Debug, Clone)]
pub enum Notification {
    PasswordResetOtp {
        email: String,
        name: String,
        otp: String,
    },
    BackupCompleted {
        recipients: Vec<String>,
        filename: String,
        counts: CollectionCounts,
        size_bytes: u64,
    },
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::PasswordResetOtp { .. } => "password_reset_otp",
            Notification::BackupCompleted { .. } => "backup_completed",
        }
    }

    /// One message per recipient.
    pub fn messages(&self) -> Vec<EmailMessage> {
        match self {
            Notification::PasswordResetOtp { email, name, otp } => vec![EmailMessage {
                to: email.clone(),
                subject: "Your password reset code".to_string(),
                body: format!(
                    "Hello {},\n\nYour password reset code is {}.\nIt expires in 10 minutes.\n\n\
                     If you did not request a reset, you can ignore this email.",
                    name, otp
                ),
            }],
            Notification::BackupCompleted {
                recipients,
                filename,
                counts,
                size_bytes,
            } => {
                let body = format!(
                    "A backup was created.\n\nFile: {}\nSize: {}\nUsers: {}\nRide routes: {}\nRide bills: {}",
                    filename,
                    crate::application::data_management::human_size(*size_bytes),
                    counts.users,
                    counts.ride_locations,
                    counts.ride_bills
                );
                recipients
                    .iter()
                    .map(|to| EmailMessage {
                        to: to.clone(),
                        subject: "Campus transport backup completed".to_string(),
                        body: body.clone(),
                    })
                    .collect()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub sent: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    mailer: Arc<dyn Mailer>,
}

impl NotificationDispatcher {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }

    /// Send in the background. Never fails; the handle is only for callers
    /// (tests) that want to observe the outcome.
    pub fn dispatch(&self, notification: Notification) -> JoinHandle<DeliveryReport> {
        let mailer = self.mailer.clone();
        tokio::spawn(async move { deliver(mailer.as_ref(), &notification).await })
    }
}

async fn deliver(mailer: &dyn Mailer, notification: &Notification) -> DeliveryReport {
    let kind = notification.kind();
    let mut report = DeliveryReport::default();

    for message in notification.messages() {
        let to = message.to.clone();
        match mailer.send(message).await {
            Ok(()) => report.sent += 1,
            Err(e) => {
                report.failed += 1;
                warn!(kind, to = %to, error = %e, "Notification delivery failed");
            }
        }
    }

    metrics::counter!("notifications_sent_total", "kind" => kind).increment(report.sent as u64);
    metrics::counter!("notifications_failed_total", "kind" => kind)
        .increment(report.failed as u64);
    info!(kind, sent = report.sent, failed = report.failed, "Notification dispatched");
    report
}


#[cfg(test)]
mod tests {
    use super::test_support::RecordingMailer;
    use super::*;

    #[tokio::test]
    async fn one_failing_recipient_does_not_stop_the_rest() {
        let mailer = Arc::new(RecordingMailer {
            failing: vec!["broken@campus.edu".into()],
            ..Default::default()
        });
        let dispatcher = NotificationDispatcher::new(mailer.clone());

        let report = dispatcher
            .dispatch(Notification::BackupCompleted {
                recipients: vec![
                    "broken@campus.edu".into(),
                    "admin@campus.edu".into(),
                ],
                filename: "backup-2025-01-01T00-00-00-000Z.json".into(),
                counts: CollectionCounts::default(),
                size_bytes: 2048,
            })
            .await
            .unwrap();

        assert_eq!(report, DeliveryReport { sent: 1, failed: 1 });
        assert_eq!(mailer.sent()[0].to, "admin@campus.edu");
    }

    #[test]
    fn otp_message_contains_code() {
        let messages = Notification::PasswordResetOtp {
            email: "s@campus.edu".into(),
            name: "Asha".into(),
            otp: "482913".into(),
        }
        .messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].body.contains("482913"));
    }
}
