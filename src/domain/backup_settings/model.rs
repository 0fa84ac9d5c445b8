use std::ops::RangeInclusive;

use chrono::{DateTime, Duration, Utc};

use crate::domain::{DomainError, DomainResult};

pub const INTERVAL_HOURS: RangeInclusive<u32> = 1..=168;
pub const MAX_BACKUPS: RangeInclusive<u32> = 1..=100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSettings {
    pub enabled: bool,
    /// Hours between scheduled backups.
    pub interval_hours: u32,
    /// Retention limit; older files are pruned after each backup.
    pub max_backups: u32,
    pub email_notifications: bool,
    pub last_backup: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_hours: 24,
            max_backups: 30,
            email_notifications: true,
            last_backup: None,
            updated_at: Utc::now(),
        }
    }
}

/// Partial update; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct BackupSettingsUpdate {
    pub enabled: Option<bool>,
    pub interval_hours: Option<u32>,
    pub max_backups: Option<u32>,
    pub email_notifications: Option<bool>,
}

impl BackupSettings {
    /// Validate and apply `update`. Nothing changes when validation fails.
    pub fn apply(&mut self, update: BackupSettingsUpdate) -> DomainResult<()> {
        if let Some(interval) = update.interval_hours {
            if !INTERVAL_HOURS.contains(&interval) {
                return Err(DomainError::Validation(format!(
                    "Backup interval must be between {} and {} hours",
                    INTERVAL_HOURS.start(),
                    INTERVAL_HOURS.end()
                )));
            }
        }
        if let Some(max) = update.max_backups {
            if !MAX_BACKUPS.contains(&max) {
                return Err(DomainError::Validation(format!(
                    "Max backups must be between {} and {}",
                    MAX_BACKUPS.start(),
                    MAX_BACKUPS.end()
                )));
            }
        }

        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }
        if let Some(interval) = update.interval_hours {
            self.interval_hours = interval;
        }
        if let Some(max) = update.max_backups {
            self.max_backups = max;
        }
        if let Some(email) = update.email_notifications {
            self.email_notifications = email;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// `(last_backup or now) + interval` while enabled.
    pub fn next_backup(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if !self.enabled {
            return None;
        }
        let base = self.last_backup.unwrap_or(now);
        Some(base + Duration::hours(i64::from(self.interval_hours)))
    }

    /// A backup is due when enabled and either none ran yet or the interval elapsed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if !self.enabled {
            return false;
        }
        match self.last_backup {
            None => true,
            Some(last) => now >= last + Duration::hours(i64::from(self.interval_hours)),
        }
    }
}
