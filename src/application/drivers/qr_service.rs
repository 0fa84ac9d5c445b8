//! Driver QR code generation and the public verification lookup
//!
//! A driver's QR code encodes
//! `{base_url}/verify-driver/{id}?name={name}&email={email}` and is stored on
//! the driver record as a PNG data URL. Scanning it leads to a page backed by
//! [`DriverQrService::verify_driver`], which exposes only non-sensitive fields.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::application::events::{SharedEventBus, UserEvent};
use crate::domain::{DomainError, DomainResult, RepositoryProvider, User, UserRole};
use crate::infrastructure::qr_code::render_png_data_url;

pub const DEFAULT_QR_WIDTH: u32 = 300;

#[derive(Debug, Clone)]
pub struct DriverQrConfig {
    /// Public frontend origin, e.g. `https://transport.campus.edu`.
    pub base_url: String,
    /// Minimum rendered width in pixels.
    pub width: u32,
}

impl Default for DriverQrConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            width: DEFAULT_QR_WIDTH,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DriverQrCode {
    pub driver_id: String,
    pub qr_code: String,
    pub verification_url: String,
}

/// What an anonymous scanner may learn about a driver.
#[derive(Debug, Clone)]
pub struct DriverVerification {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    /// `data:<mime>;base64,...`
    pub profile_photo: Option<String>,
    pub is_active: bool,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<User> for DriverVerification {
    fn from(user: User) -> Self {
        let profile_photo = user
            .profile_photo
            .map(|p| format!("data:{};base64,{}", p.content_type, STANDARD.encode(&p.data)));
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            profile_photo,
            is_active: user.is_active,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

pub struct DriverQrService {
    repos: Arc<dyn RepositoryProvider>,
    events: SharedEventBus,
    config: DriverQrConfig,
}

impl DriverQrService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        events: SharedEventBus,
        config: DriverQrConfig,
    ) -> Self {
        Self {
            repos,
            events,
            config,
        }
    }

    pub fn verification_url(&self, driver: &User) -> String {
        format!(
            "{}/verify-driver/{}?name={}&email={}",
            self.config.base_url.trim_end_matches('/'),
            driver.id,
            urlencoding::encode(&driver.name),
            urlencoding::encode(&driver.email),
        )
    }

    async fn load_driver(&self, driver_id: &str) -> DomainResult<User> {
        self.repos
            .users()
            .find_by_id(driver_id)
            .await?
            .filter(|u| u.role == UserRole::Driver)
            .ok_or_else(|| DomainError::not_found("Driver", "id", driver_id))
    }

    /// Render and store a fresh QR code, replacing any previous one.
    pub async fn generate_qr_code(&self, driver_id: &str) -> DomainResult<DriverQrCode> {
        let driver = self.load_driver(driver_id).await?;
        self.render_and_store(driver).await
    }

    /// Stored QR code, generated first when the driver has none.
    pub async fn ensure_qr_code(&self, driver_id: &str) -> DomainResult<DriverQrCode> {
        let driver = self.load_driver(driver_id).await?;
        match driver.qr_code.clone() {
            Some(qr_code) => Ok(DriverQrCode {
                verification_url: self.verification_url(&driver),
                driver_id: driver.id,
                qr_code,
            }),
            None => self.render_and_store(driver).await,
        }
    }

    async fn render_and_store(&self, mut driver: User) -> DomainResult<DriverQrCode> {
        let verification_url = self.verification_url(&driver);
        let qr_code = render_png_data_url(&verification_url, self.config.width)
            .map_err(|e| DomainError::operation("Failed to generate QR code", e))?;

        driver.qr_code = Some(qr_code.clone());
        driver.touch();
        self.repos.users().update(driver.clone()).await?;
        self.events.publish(UserEvent::updated(&driver));

        metrics::counter!("driver_qr_codes_generated_total").increment(1);
        info!(driver_id = %driver.id, "Driver QR code generated");

        Ok(DriverQrCode {
            driver_id: driver.id,
            qr_code,
            verification_url,
        })
    }

    /// Public lookup behind the scanned URL.
    pub async fn verify_driver(&self, driver_id: &str) -> DomainResult<DriverVerification> {
        Ok(self.load_driver(driver_id).await?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::create_event_bus;
    use crate::domain::ProfilePhoto;
    use crate::infrastructure::qr_code::test_support::decode_data_url;
    use crate::infrastructure::InMemoryRepositoryProvider;

    async fn setup() -> (DriverQrService, Arc<InMemoryRepositoryProvider>, User) {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let mut driver = User::new("ravi.k@campus.edu", "Ravi Kumar", UserRole::Driver);
        driver.phone = Some("+91 98765 43210".into());
        driver.password_hash = Some("$2b$04$secret".into());
        let driver = repos.users().save(driver).await.unwrap();
        let service = DriverQrService::new(
            repos.clone(),
            create_event_bus(),
            DriverQrConfig {
                base_url: "https://transport.campus.edu/".into(),
                width: 200,
            },
        );
        (service, repos, driver)
    }

    #[tokio::test]
    async fn qr_decodes_to_verification_url() {
        let (service, repos, driver) = setup().await;
        let qr = service.generate_qr_code(&driver.id).await.unwrap();

        let expected = format!(
            "https://transport.campus.edu/verify-driver/{}?name=Ravi%20Kumar&email=ravi.k%40campus.edu",
            driver.id
        );
        assert_eq!(qr.verification_url, expected);
        assert_eq!(decode_data_url(&qr.qr_code), expected);

        let stored = repos.users().find_by_id(&driver.id).await.unwrap().unwrap();
        assert_eq!(stored.qr_code.as_deref(), Some(qr.qr_code.as_str()));
    }

    #[tokio::test]
    async fn non_driver_is_not_found() {
        let (service, repos, _) = setup().await;
        let student = repos
            .users()
            .save(User::new("s@campus.edu", "S", UserRole::Student))
            .await
            .unwrap();

        for id in [student.id.as_str(), "missing"] {
            let err = service.generate_qr_code(id).await.unwrap_err();
            assert_eq!(err.to_string(), "Driver not found");
            assert!(service.verify_driver(id).await.is_err());
        }
    }

    #[tokio::test]
    async fn ensure_reuses_stored_code() {
        let (service, repos, driver) = setup().await;
        let first = service.ensure_qr_code(&driver.id).await.unwrap();

        let mut stored = repos.users().find_by_id(&driver.id).await.unwrap().unwrap();
        stored.qr_code = Some("data:image/png;base64,STORED".into());
        repos.users().update(stored).await.unwrap();

        let second = service.ensure_qr_code(&driver.id).await.unwrap();
        assert_eq!(second.qr_code, "data:image/png;base64,STORED");
        assert_eq!(second.verification_url, first.verification_url);
    }

    #[tokio::test]
    async fn verification_exposes_public_fields_only() {
        let (service, repos, driver) = setup().await;
        let mut stored = repos.users().find_by_id(&driver.id).await.unwrap().unwrap();
        stored.profile_photo = Some(ProfilePhoto::new(vec![1, 2, 3], "image/png").unwrap());
        repos.users().update(stored).await.unwrap();

        let view = service.verify_driver(&driver.id).await.unwrap();
        assert_eq!(view.name, "Ravi Kumar");
        assert_eq!(view.phone.as_deref(), Some("+91 98765 43210"));
        assert_eq!(view.profile_photo.as_deref(), Some("data:image/png;base64,AQID"));
        assert_eq!(view.role, UserRole::Driver);
    }
}
