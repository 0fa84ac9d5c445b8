//! Re-hydrating the stores from an export payload or backup file
//!
//! Each collection and each record is handled on its own: a record that
//! already exists is skipped, a record that fails to parse, validate or
//! insert is counted as an error, and processing moves on. There is no
//! transaction; a partial import is a valid outcome.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::documents::{RideBillDocument, RideRouteDocument, UserProfileDocument};
use crate::application::events::{EventBus, UserEvent};
use crate::domain::{DomainError, DomainResult, RepositoryProvider};
use crate::shared::normalize_email;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportCounts {
    pub imported: u64,
    pub skipped: u64,
    pub errors: u64,
}

impl ImportCounts {
    fn record(&mut self, result: DomainResult<RecordOutcome>, collection: &str, index: usize) {
        match result {
            Ok(RecordOutcome::Imported) => self.imported += 1,
            Ok(RecordOutcome::Skipped) => self.skipped += 1,
            Err(e) => {
                self.errors += 1;
                warn!(collection, index, error = %e, "Import record failed");
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    pub users: ImportCounts,
    pub ride_locations: ImportCounts,
    pub ride_bills: ImportCounts,
    pub message: String,
    /// `exportDate` of the source file
    pub export_date: String,
}

enum RecordOutcome {
    Imported,
    Skipped,
}

fn invalid_format() -> DomainError {
    DomainError::Validation("Invalid import file format".to_string())
}

/// Records of one collection; a missing collection is empty.
fn collection<'a>(data: &'a Value, key: &str) -> DomainResult<&'a [Value]> {
    match data.get(key) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(invalid_format()),
    }
}

fn parse<T: DeserializeOwned>(record: &Value) -> DomainResult<T> {
    serde_json::from_value(record.clone())
        .map_err(|e| DomainError::Validation(format!("Malformed record: {}", e)))
}

pub async fn import_payload(
    repos: &dyn RepositoryProvider,
    events: &EventBus,
    bytes: &[u8],
) -> DomainResult<ImportOutcome> {
    let root: Value = serde_json::from_slice(bytes).map_err(|_| invalid_format())?;
    let (Some(data), Some(export_date)) = (root.get("data"), root.get("exportDate")) else {
        return Err(invalid_format());
    };
    if !data.is_object() {
        return Err(invalid_format());
    }
    let export_date = match export_date {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    let user_records = collection(data, "users")?;
    let route_records = collection(data, "rideLocations")?;
    let bill_records = collection(data, "rideBills")?;

    let mut users = ImportCounts::default();
    for (i, record) in user_records.iter().enumerate() {
        users.record(import_user(repos, events, record).await, "users", i);
    }

    let mut ride_locations = ImportCounts::default();
    for (i, record) in route_records.iter().enumerate() {
        ride_locations.record(import_route(repos, record).await, "rideLocations", i);
    }

    let mut ride_bills = ImportCounts::default();
    for (i, record) in bill_records.iter().enumerate() {
        ride_bills.record(import_bill(repos, record).await, "rideBills", i);
    }

    let message = format!(
        "Import completed: {} users, {} routes and {} bills imported; {} skipped; {} errors",
        users.imported,
        ride_locations.imported,
        ride_bills.imported,
        users.skipped + ride_locations.skipped + ride_bills.skipped,
        users.errors + ride_locations.errors + ride_bills.errors,
    );
    info!(%export_date, "{}", message);

    Ok(ImportOutcome {
        users,
        ride_locations,
        ride_bills,
        message,
        export_date,
    })
}

async fn import_user(
    repos: &dyn RepositoryProvider,
    events: &EventBus,
    record: &Value,
) -> DomainResult<RecordOutcome> {
    let doc: UserProfileDocument = parse(record)?;
    let email = normalize_email(&doc.email);
    if repos.users().find_by_email(&email).await?.is_some() {
        debug!(%email, "User exists, skipping");
        return Ok(RecordOutcome::Skipped);
    }
    let user = repos.users().save(doc.into_new_user()?).await?;
    events.publish(UserEvent::created(&user));
    Ok(RecordOutcome::Imported)
}

async fn import_route(
    repos: &dyn RepositoryProvider,
    record: &Value,
) -> DomainResult<RecordOutcome> {
    let route = parse::<RideRouteDocument>(record)?.into_new_route()?;
    if repos
        .ride_routes()
        .find_by_pair(&route.from_location, &route.to_location)
        .await?
        .is_some()
    {
        return Ok(RecordOutcome::Skipped);
    }
    repos.ride_routes().save(route).await?;
    Ok(RecordOutcome::Imported)
}

async fn import_bill(
    repos: &dyn RepositoryProvider,
    record: &Value,
) -> DomainResult<RecordOutcome> {
    let doc: RideBillDocument = parse(record)?;
    if repos
        .ride_bills()
        .find_by_ride_id(&doc.ride_id)
        .await?
        .is_some()
    {
        return Ok(RecordOutcome::Skipped);
    }
    repos.ride_bills().save(doc.into_new_bill()?).await?;
    Ok(RecordOutcome::Imported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::InMemoryRepositoryProvider;
    use serde_json::json;

    fn payload() -> Value {
        json!({
            "exportDate": "2025-01-01T00:00:00.000Z",
            "version": "1.0",
            "data": {
                "users": [
                    { "_id": "u1", "email": "asha@campus.edu", "name": "Asha", "role": "student" },
                    { "_id": "u2", "email": "ravi@campus.edu", "name": "Ravi", "role": "driver",
                      "password": "$2b$10$secret" }
                ],
                "rideLocations": [
                    { "_id": "r1", "fromLocation": "Gate", "toLocation": "Library", "fare": 20 }
                ],
                "rideBills": [
                    { "_id": "b1", "rideId": "R-1", "studentId": "u1", "studentName": "Asha",
                      "driverId": "u2", "driverName": "Ravi", "location": "Gate - Library",
                      "fare": 20, "date": "2025-01-01T09:00:00Z", "time": "09:00",
                      "status": "completed" }
                ]
            }
        })
    }

    #[tokio::test]
    async fn second_import_skips_everything() {
        let repos = InMemoryRepositoryProvider::new();
        let bus = EventBus::new();
        let bytes = serde_json::to_vec(&payload()).unwrap();

        let first = import_payload(&repos, &bus, &bytes).await.unwrap();
        assert_eq!(first.users.imported, 2);
        assert_eq!(first.ride_locations.imported, 1);
        assert_eq!(first.ride_bills.imported, 1);
        assert_eq!(first.export_date, "2025-01-01T00:00:00.000Z");

        let second = import_payload(&repos, &bus, &bytes).await.unwrap();
        assert_eq!(second.users, ImportCounts { imported: 0, skipped: 2, errors: 0 });
        assert_eq!(second.ride_locations.skipped, 1);
        assert_eq!(second.ride_bills.skipped, 1);
        assert_eq!(repos.users().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn imported_users_never_carry_passwords() {
        let repos = InMemoryRepositoryProvider::new();
        let bytes = serde_json::to_vec(&payload()).unwrap();
        import_payload(&repos, &EventBus::new(), &bytes).await.unwrap();

        let ravi = repos
            .users()
            .find_by_email("ravi@campus.edu")
            .await
            .unwrap()
            .unwrap();
        assert!(ravi.password_hash.is_none());
        assert_ne!(ravi.id, "u2");
    }

    #[tokio::test]
    async fn padded_route_names_match_on_reimport() {
        let repos = InMemoryRepositoryProvider::new();
        let bus = EventBus::new();
        let doc = json!({
            "exportDate": "2025-01-01T00:00:00.000Z",
            "data": {
                "rideLocations": [
                    { "fromLocation": "Gate ", "toLocation": "  Library", "fare": 20 }
                ]
            }
        });
        let bytes = serde_json::to_vec(&doc).unwrap();

        let first = import_payload(&repos, &bus, &bytes).await.unwrap();
        assert_eq!(first.ride_locations, ImportCounts { imported: 1, skipped: 0, errors: 0 });

        let second = import_payload(&repos, &bus, &bytes).await.unwrap();
        assert_eq!(second.ride_locations, ImportCounts { imported: 0, skipped: 1, errors: 0 });

        let routes = repos.ride_routes().find_all().await.unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].from_location, "Gate");
        assert_eq!(routes[0].to_location, "Library");
    }

    #[tokio::test]
    async fn bad_records_are_counted_not_fatal() {
        let repos = InMemoryRepositoryProvider::new();
        let mut doc = payload();
        doc["data"]["users"]
            .as_array_mut()
            .unwrap()
            .push(json!({ "email": "broken" }));
        doc["data"]["rideBills"].as_array_mut().unwrap().push(json!({
            "rideId": "R-2", "studentId": "u1", "studentName": "Asha",
            "driverId": "u2", "driverName": "Ravi", "location": "Gate - Library",
            "fare": 20, "date": "2025-01-01T09:00:00Z", "time": "9am"
        }));

        let outcome = import_payload(&repos, &EventBus::new(), &serde_json::to_vec(&doc).unwrap())
            .await
            .unwrap();
        assert_eq!(outcome.users, ImportCounts { imported: 2, skipped: 0, errors: 1 });
        assert_eq!(outcome.ride_bills, ImportCounts { imported: 1, skipped: 0, errors: 1 });
    }

    #[tokio::test]
    async fn payload_without_export_date_is_rejected() {
        let repos = InMemoryRepositoryProvider::new();
        let backup_shaped = json!({ "timestamp": "2025-01-01T00:00:00Z", "data": {} });
        for bytes in [
            serde_json::to_vec(&backup_shaped).unwrap(),
            b"not json".to_vec(),
            serde_json::to_vec(&json!({ "exportDate": "x" })).unwrap(),
        ] {
            let err = import_payload(&repos, &EventBus::new(), &bytes)
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), "Invalid import file format");
        }
    }

    #[tokio::test]
    async fn imported_users_are_published() {
        let repos = InMemoryRepositoryProvider::new();
        let bus = EventBus::new();
        let mut sub = bus.subscribe();
        import_payload(&repos, &bus, &serde_json::to_vec(&payload()).unwrap())
            .await
            .unwrap();
        let msg = sub.recv().await.unwrap();
        assert_eq!(msg.event.event_type(), "user_created");
    }
}
