//! User change feed events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::User;

/// Published on every user mutation; consumers never see credential fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum UserEvent {
    UserCreated(UserSummary),
    UserUpdated(UserSummary),
    UserDeleted(UserDeletedEvent),
    /// Full listing, sent to a subscriber when it connects.
    UsersSnapshot(Vec<UserSummary>),
}

impl UserEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            UserEvent::UserCreated(_) => "user_created",
            UserEvent::UserUpdated(_) => "user_updated",
            UserEvent::UserDeleted(_) => "user_deleted",
            UserEvent::UsersSnapshot(_) => "users_snapshot",
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            UserEvent::UserCreated(u) | UserEvent::UserUpdated(u) => Some(&u.id),
            UserEvent::UserDeleted(e) => Some(&e.id),
            UserEvent::UsersSnapshot(_) => None,
        }
    }

    pub fn created(user: &User) -> Self {
        UserEvent::UserCreated(UserSummary::from(user))
    }

    pub fn updated(user: &User) -> Self {
        UserEvent::UserUpdated(UserSummary::from(user))
    }

    pub fn deleted(id: &str) -> Self {
        UserEvent::UserDeleted(UserDeletedEvent { id: id.to_string() })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub is_active: bool,
    pub phone: Option<String>,
    pub entry_number: Option<String>,
    pub is_expired: bool,
    pub has_photo: bool,
    pub has_qr_code: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserSummary {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.clone(),
            email: u.email.clone(),
            name: u.name.clone(),
            role: u.role.as_str().to_string(),
            is_active: u.is_active,
            phone: u.phone.clone(),
            entry_number: u.student.entry_number.clone(),
            is_expired: u.is_expired,
            has_photo: u.profile_photo.is_some(),
            has_qr_code: u.qr_code.is_some(),
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserDeletedEvent {
    pub id: String,
}

/// Envelope sent to subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: UserEvent,
}

impl EventMessage {
    pub fn new(event: UserEvent) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserRole;

    #[test]
    fn message_serializes_with_type_tag() {
        let user = User::new("d@campus.edu", "Ravi", UserRole::Driver);
        let json = serde_json::to_value(EventMessage::new(UserEvent::created(&user))).unwrap();
        assert_eq!(json["type"], "UserCreated");
        assert_eq!(json["data"]["email"], "d@campus.edu");
        assert!(json["data"].get("passwordHash").is_none());
    }
}
