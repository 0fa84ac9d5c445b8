//! Back-office user administration
//!
//! Every mutation publishes a change event so connected dashboards stay in sync.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::hash_new_password;
use crate::application::events::{SharedEventBus, UserEvent};
use crate::domain::user::{CreateUserDto, GetUserDto, UpdateUserDto};
use crate::domain::{
    DomainError, DomainResult, ProfilePhoto, RepositoryProvider, StudentProfile, User, UserRole,
};
use crate::shared::{is_valid_email, normalize_email, PaginatedResult};

pub struct UserService {
    repos: Arc<dyn RepositoryProvider>,
    events: SharedEventBus,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl UserService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, events: SharedEventBus) -> Self {
        Self { repos, events }
    }

    async fn load(&self, id: &str) -> DomainResult<User> {
        self.repos
            .users()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", "id", id))
    }

    async fn store(&self, user: &User) -> DomainResult<()> {
        self.repos.users().update(user.clone()).await?;
        self.events.publish(UserEvent::updated(user));
        Ok(())
    }

    // ── Queries ─────────────────────────────────────────────────

    /// List users with search, role filter and pagination. Student expiry is
    /// refreshed on the way out.
    pub async fn list_users(&self, query: GetUserDto) -> DomainResult<PaginatedResult<User>> {
        let mut page = self.repos.users().list(query).await?;
        let now = Utc::now();
        for user in page.items.iter_mut() {
            if user.refresh_expiry(now) {
                self.repos.users().update(user.clone()).await?;
            }
        }
        Ok(page)
    }

    pub async fn get_user(&self, id: &str) -> DomainResult<User> {
        let mut user = self.load(id).await?;
        if user.refresh_expiry(Utc::now()) {
            self.repos.users().update(user.clone()).await?;
        }
        Ok(user)
    }

    pub async fn get_photo(&self, id: &str) -> DomainResult<ProfilePhoto> {
        self.load(id)
            .await?
            .profile_photo
            .ok_or_else(|| DomainError::not_found("Profile photo", "user_id", id))
    }

    // ── Commands ────────────────────────────────────────────────

    pub async fn create_user(&self, dto: CreateUserDto) -> DomainResult<User> {
        let email = normalize_email(&dto.email);
        if !is_valid_email(&email) {
            return Err(DomainError::Validation("Invalid email address".into()));
        }
        let name = dto.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::Validation("Name is required".into()));
        }
        let password_hash = hash_new_password(&dto.password)?;

        let mut user = User::new(&email, name, dto.role);
        user.password_hash = Some(password_hash);
        user.phone = non_blank(dto.phone);
        if dto.role.tracks_expiry() {
            user.student = dto.student;
        }
        user.refresh_expiry(Utc::now());

        let user = self.repos.users().save(user).await?;
        self.events.publish(UserEvent::created(&user));
        info!(user_id = %user.id, role = %user.role, "User created");
        Ok(user)
    }

    pub async fn update_user(&self, id: &str, dto: UpdateUserDto) -> DomainResult<User> {
        let mut user = self.load(id).await?;

        if let Some(email) = dto.email {
            let email = normalize_email(&email);
            if !is_valid_email(&email) {
                return Err(DomainError::Validation("Invalid email address".into()));
            }
            user.email = email;
        }
        if let Some(name) = dto.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(DomainError::Validation("Name is required".into()));
            }
            user.name = name;
        }
        if let Some(phone) = dto.phone {
            user.phone = non_blank(Some(phone));
        }

        if user.role.tracks_expiry() {
            let student = &mut user.student;
            let fields = [
                (&mut student.entry_number, dto.entry_number),
                (&mut student.programme, dto.programme),
                (&mut student.department, dto.department),
                (&mut student.hostel, dto.hostel),
                (&mut student.emergency_contact, dto.emergency_contact),
                (&mut student.disability_info, dto.disability_info),
            ];
            for (slot, value) in fields {
                if value.is_some() {
                    *slot = non_blank(value);
                }
            }
            if dto.expiry_date.is_some() {
                student.expiry_date = dto.expiry_date;
            }
        }

        user.refresh_expiry(Utc::now());
        user.touch();
        self.store(&user).await?;
        info!(user_id = %user.id, "User updated");
        Ok(user)
    }

    /// Flip the active flag. Nobody can disable their own account.
    pub async fn toggle_status(&self, id: &str, actor_id: &str) -> DomainResult<User> {
        if id == actor_id {
            return Err(DomainError::Validation(
                "You cannot change the status of your own account".into(),
            ));
        }
        let mut user = self.load(id).await?;
        user.is_active = !user.is_active;
        user.touch();
        self.store(&user).await?;
        info!(user_id = %user.id, is_active = user.is_active, "User status changed");
        Ok(user)
    }

    pub async fn change_role(&self, id: &str, role: UserRole, actor_id: &str) -> DomainResult<User> {
        if id == actor_id {
            return Err(DomainError::Validation(
                "You cannot change your own role".into(),
            ));
        }
        let mut user = self.load(id).await?;
        let previous = user.role;
        user.change_role(role);
        if !role.tracks_expiry() {
            user.student = StudentProfile::default();
        }
        self.store(&user).await?;
        info!(user_id = %user.id, from = %previous, to = %role, "User role changed");
        Ok(user)
    }

    pub async fn upload_photo(
        &self,
        id: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> DomainResult<User> {
        let photo = ProfilePhoto::new(data, content_type)?;
        let mut user = self.load(id).await?;
        let size = photo.size;
        user.profile_photo = Some(photo);
        user.touch();
        self.store(&user).await?;
        info!(user_id = %user.id, size, "Profile photo uploaded");
        Ok(user)
    }

    pub async fn delete_user(&self, id: &str, actor_id: &str) -> DomainResult<()> {
        if id == actor_id {
            return Err(DomainError::Validation(
                "You cannot delete your own account".into(),
            ));
        }
        self.repos.users().delete(id).await?;
        self.events.publish(UserEvent::deleted(id));
        info!(user_id = id, "User deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::create_event_bus;
    use crate::infrastructure::crypto::verify_password;
    use crate::infrastructure::InMemoryRepositoryProvider;
    use chrono::Duration;

    fn service() -> (UserService, SharedEventBus) {
        let events = create_event_bus();
        let service = UserService::new(Arc::new(InMemoryRepositoryProvider::new()), events.clone());
        (service, events)
    }

    fn create_dto(email: &str, role: UserRole) -> CreateUserDto {
        CreateUserDto {
            email: email.to_string(),
            name: "Test User".to_string(),
            password: "secret1".to_string(),
            role,
            phone: Some("  ".to_string()),
            student: StudentProfile {
                entry_number: Some("2021CS001".into()),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn create_hashes_password_and_publishes() {
        let (service, events) = service();
        let mut feed = events.subscribe();

        let user = service
            .create_user(create_dto("New@Campus.edu", UserRole::Student))
            .await
            .unwrap();
        assert_eq!(user.email, "new@campus.edu");
        assert!(user.phone.is_none());
        assert_eq!(user.student.entry_number.as_deref(), Some("2021CS001"));
        assert!(verify_password("secret1", user.password_hash.as_deref().unwrap()).unwrap());

        let message = feed.recv().await.unwrap();
        assert_eq!(message.event.event_type(), "user_created");
        assert_eq!(message.event.user_id(), Some(user.id.as_str()));
    }

    #[tokio::test]
    async fn create_validates_input() {
        let (service, _) = service();
        let mut short = create_dto("a@campus.edu", UserRole::Staff);
        short.password = "12345".into();
        assert!(matches!(
            service.create_user(short).await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            service.create_user(create_dto("not-an-email", UserRole::Staff)).await,
            Err(DomainError::Validation(_))
        ));

        service
            .create_user(create_dto("a@campus.edu", UserRole::Staff))
            .await
            .unwrap();
        assert!(matches!(
            service.create_user(create_dto("A@campus.edu", UserRole::Driver)).await,
            Err(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn non_students_keep_no_student_fields() {
        let (service, _) = service();
        let user = service
            .create_user(create_dto("d@campus.edu", UserRole::Driver))
            .await
            .unwrap();
        assert_eq!(user.student, StudentProfile::default());
    }

    #[tokio::test]
    async fn reads_refresh_student_expiry() {
        let (service, _) = service();
        let mut dto = create_dto("s@campus.edu", UserRole::Student);
        dto.student.expiry_date = Some(Utc::now() + Duration::days(30));
        let user = service.create_user(dto).await.unwrap();
        assert!(!user.is_expired);

        let user = service
            .update_user(
                &user.id,
                UpdateUserDto {
                    expiry_date: Some(Utc::now() - Duration::days(1)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(user.is_expired);
        assert!(service.get_user(&user.id).await.unwrap().is_expired);

        let page = service
            .list_users(GetUserDto {
                role: Some(UserRole::Student),
                page: 1,
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert!(page.items[0].is_expired);
    }

    #[tokio::test]
    async fn toggle_and_delete_refuse_own_account() {
        let (service, events) = service();
        let user = service
            .create_user(create_dto("t@campus.edu", UserRole::Staff))
            .await
            .unwrap();

        assert!(service.toggle_status(&user.id, &user.id).await.is_err());
        assert!(service.delete_user(&user.id, &user.id).await.is_err());

        let toggled = service.toggle_status(&user.id, "admin-id").await.unwrap();
        assert!(!toggled.is_active);

        let mut feed = events.subscribe();
        service.delete_user(&user.id, "admin-id").await.unwrap();
        assert_eq!(feed.recv().await.unwrap().event.event_type(), "user_deleted");
        assert!(matches!(
            service.get_user(&user.id).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn role_change_away_from_driver_clears_qr() {
        let (service, _) = service();
        let user = service
            .create_user(create_dto("d@campus.edu", UserRole::Driver))
            .await
            .unwrap();
        let mut stored = service.get_user(&user.id).await.unwrap();
        stored.qr_code = Some("data:image/png;base64,AAAA".into());
        service.repos.users().update(stored).await.unwrap();

        let changed = service
            .change_role(&user.id, UserRole::Staff, "admin-id")
            .await
            .unwrap();
        assert_eq!(changed.role, UserRole::Staff);
        assert!(changed.qr_code.is_none());
    }

    #[tokio::test]
    async fn photo_upload_and_fetch() {
        let (service, _) = service();
        let user = service
            .create_user(create_dto("p@campus.edu", UserRole::Staff))
            .await
            .unwrap();
        assert!(matches!(
            service.get_photo(&user.id).await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(service
            .upload_photo(&user.id, vec![1, 2, 3], "text/plain")
            .await
            .is_err());

        service
            .upload_photo(&user.id, vec![0x89, b'P', b'N', b'G'], "image/png")
            .await
            .unwrap();
        let photo = service.get_photo(&user.id).await.unwrap();
        assert_eq!(photo.content_type, "image/png");
        assert_eq!(photo.size, 4);
    }
}
