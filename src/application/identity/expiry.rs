//! Background task that keeps students' `is_expired` flag current.
//!
//! Reads already refresh the flag; this pass catches records nobody reads.

use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{info, warn};

use crate::application::events::{SharedEventBus, UserEvent};
use crate::domain::{DomainResult, RepositoryProvider, UserRole};
use crate::shared::ShutdownSignal;

pub const DAILY_SECS: u64 = 24 * 60 * 60;

/// Start the student expiry task. The first pass runs immediately.
pub fn start_student_expiry_task(
    repos: Arc<dyn RepositoryProvider>,
    events: SharedEventBus,
    shutdown: ShutdownSignal,
    check_interval_secs: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(check_interval = check_interval_secs, "Student expiry task started");

        let mut interval = tokio::time::interval(Duration::from_secs(check_interval_secs));

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match refresh_student_expiry(repos.as_ref(), &events).await {
                        Ok(0) => {}
                        Ok(changed) => info!(changed, "Student expiry flags refreshed"),
                        Err(e) => warn!(error = %e, "Student expiry check error"),
                    }
                }
                _ = shutdown.notified().wait() => {
                    info!("Student expiry task shutting down");
                    break;
                }
            }
        }

        info!("Student expiry task stopped");
    })
}

/// Recompute `is_expired` for every student; returns how many changed.
pub async fn refresh_student_expiry(
    repos: &dyn RepositoryProvider,
    events: &SharedEventBus,
) -> DomainResult<usize> {
    let now = Utc::now();
    let mut changed = 0;

    for mut student in repos.users().find_by_role(UserRole::Student).await? {
        if !student.refresh_expiry(now) {
            continue;
        }
        student.touch();
        match repos.users().update(student.clone()).await {
            Ok(()) => {
                changed += 1;
                events.publish(UserEvent::updated(&student));
            }
            Err(e) => warn!(user_id = %student.id, error = %e, "Failed to refresh student expiry"),
        }
    }

    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::create_event_bus;
    use crate::domain::User;
    use crate::infrastructure::InMemoryRepositoryProvider;
    use chrono::Duration as ChronoDuration;

    #[tokio::test]
    async fn flags_lapsed_students_only() {
        let repos = InMemoryRepositoryProvider::new();
        let events = create_event_bus();

        let mut lapsed = User::new("old@campus.edu", "Old", UserRole::Student);
        lapsed.student.expiry_date = Some(Utc::now() - ChronoDuration::days(2));
        let lapsed = repos.users().save(lapsed).await.unwrap();

        let mut current = User::new("new@campus.edu", "New", UserRole::Student);
        current.student.expiry_date = Some(Utc::now() + ChronoDuration::days(200));
        repos.users().save(current).await.unwrap();

        let mut driver = User::new("d@campus.edu", "D", UserRole::Driver);
        driver.student.expiry_date = Some(Utc::now() - ChronoDuration::days(2));
        repos.users().save(driver).await.unwrap();

        let mut feed = events.subscribe();
        assert_eq!(refresh_student_expiry(&repos, &events).await.unwrap(), 1);
        assert_eq!(feed.recv().await.unwrap().event.user_id(), Some(lapsed.id.as_str()));
        assert!(repos.users().find_by_id(&lapsed.id).await.unwrap().unwrap().is_expired);

        // Second pass has nothing left to do.
        assert_eq!(refresh_student_expiry(&repos, &events).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn task_stops_on_shutdown() {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositoryProvider::new());
        let shutdown = ShutdownSignal::new();
        let handle = start_student_expiry_task(repos, create_event_bus(), shutdown.clone(), 3600);
        shutdown.trigger();
        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .expect("task did not stop")
            .unwrap();
    }
}
