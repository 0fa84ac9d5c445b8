use async_trait::async_trait;

use super::BackupSettings;
use crate::domain::DomainResult;

#[async_trait]
pub trait BackupSettingsRepository: Send + Sync {
    /// Stored settings, or defaults when none were ever saved.
    async fn load(&self) -> DomainResult<BackupSettings>;
    async fn store(&self, settings: &BackupSettings) -> DomainResult<()>;
}
