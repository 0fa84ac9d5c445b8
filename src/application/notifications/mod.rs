//! Email notifications

pub mod dispatcher;
pub mod mailer;

pub use dispatcher::{DeliveryReport, Notification, NotificationDispatcher};
pub use mailer::{EmailMessage, MailError, Mailer};
