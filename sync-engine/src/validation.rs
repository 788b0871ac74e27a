//! Validators (C3): pure predicates per entity. Every `sync` body passes
//! through here before the SyncEngine ever looks at the document store.

use crate::entity::EntityKind;
use crate::error::SyncError;
use crate::record::{Record, RecordExt};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^[0-9+\-\s]{10,20}$").unwrap();
}

/// Entry point: validate a record against its entity's rules (§4.3).
/// Returns the first failing field, wrapped as a [`SyncError::Validation`].
pub fn validate(kind: EntityKind, record: &Record) -> Result<(), SyncError> {
    require_field(record, kind.primary_key_field())?;
    require_field(record, "updated_at")?;

    match kind {
        EntityKind::User => validate_user(record),
        EntityKind::Registration => validate_registration(record),
        EntityKind::Supply => validate_supply(record),
        EntityKind::Task => validate_task(record),
        EntityKind::TaskAssignment => validate_task_assignment(record),
        EntityKind::Location => validate_location(record),
        EntityKind::Alert => validate_alert(record),
        EntityKind::Notification => validate_notification(record),
    }
}

fn require_field(record: &Record, field: &str) -> Result<(), SyncError> {
    if record.is_present(field) {
        Ok(())
    } else {
        Err(SyncError::validation(field, "required field is missing"))
    }
}

fn validate_email(record: &Record, field: &str) -> Result<(), SyncError> {
    match record.str_field(field) {
        Some(v) if EMAIL_RE.is_match(v.trim()) => Ok(()),
        Some(_) => Err(SyncError::validation(field, "not a valid email address")),
        None => Ok(()),
    }
}

fn validate_phone(record: &Record, field: &str) -> Result<(), SyncError> {
    match record.str_field(field) {
        Some(v) => {
            let digits: String = v.chars().filter(|c| c.is_ascii_digit()).collect();
            if PHONE_RE.is_match(v) && (10..=15).contains(&digits.len()) {
                Ok(())
            } else {
                Err(SyncError::validation(field, "not a valid phone number"))
            }
        }
        None => Ok(()),
    }
}

fn validate_enum(record: &Record, field: &str, allowed: &[&str]) -> Result<(), SyncError> {
    match record.str_field(field) {
        Some(v) => {
            if allowed.iter().any(|a| a.eq_ignore_ascii_case(v)) {
                Ok(())
            } else {
                Err(SyncError::validation(
                    field,
                    format!("must be one of {:?}", allowed),
                ))
            }
        }
        None => Ok(()),
    }
}

fn validate_range_i64(record: &Record, field: &str, min: i64, max: i64) -> Result<(), SyncError> {
    match record.get(field) {
        Some(v) if v.is_null() => Ok(()),
        Some(v) => match v.as_i64() {
            Some(n) if (min..=max).contains(&n) => Ok(()),
            _ => Err(SyncError::validation(
                field,
                format!("must be an integer between {} and {}", min, max),
            )),
        },
        None => Ok(()),
    }
}

fn validate_name_length(record: &Record, field: &str, min: usize, max: usize) -> Result<(), SyncError> {
    match record.str_field(field) {
        Some(v) => {
            let len = v.trim().chars().count();
            if (min..=max).contains(&len) {
                Ok(())
            } else {
                Err(SyncError::validation(
                    field,
                    format!("length must be between {} and {} characters", min, max),
                ))
            }
        }
        None => Ok(()),
    }
}

fn validate_coordinates(record: &Record) -> Result<(), SyncError> {
    let lat = record.get("latitude").filter(|v| !v.is_null());
    let lng = record.get("longitude").filter(|v| !v.is_null());
    match (lat, lng) {
        (Some(lat), Some(lng)) => {
            let lat = lat
                .as_f64()
                .ok_or_else(|| SyncError::validation("latitude", "must be numeric"))?;
            let lng = lng
                .as_f64()
                .ok_or_else(|| SyncError::validation("longitude", "must be numeric"))?;
            if !(-90.0..=90.0).contains(&lat) {
                return Err(SyncError::validation("latitude", "must be within [-90, 90]"));
            }
            if !(-180.0..=180.0).contains(&lng) {
                return Err(SyncError::validation(
                    "longitude",
                    "must be within [-180, 180]",
                ));
            }
            Ok(())
        }
        (None, None) => Ok(()),
        _ => Err(SyncError::validation(
            "latitude",
            "latitude and longitude must both be present or both be absent",
        )),
    }
}

fn validate_user(record: &Record) -> Result<(), SyncError> {
    require_field(record, "name")?;
    require_field(record, "email")?;
    validate_email(record, "email")?;
    validate_phone(record, "phone_number")?;
    validate_enum(
        record,
        "role",
        &["admin", "fieldworker", "volunteer", "coordinator"],
    )?;
    validate_name_length(record, "name", 2, 100)
}

fn validate_registration(record: &Record) -> Result<(), SyncError> {
    require_field(record, "user_id")?;
    require_field(record, "person_name")?;
    validate_name_length(record, "person_name", 2, 100)?;
    require_field(record, "location_id")?;
    validate_range_i64(record, "age", 0, 150)?;
    validate_enum(
        record,
        "gender",
        &["male", "female", "other", "prefer_not_to_say"],
    )?;
    validate_enum(
        record,
        "status",
        &["pending", "in_progress", "completed", "transferred", "discharged"],
    )
}

fn validate_supply(record: &Record) -> Result<(), SyncError> {
    require_field(record, "user_id")?;
    require_field(record, "item_name")?;
    require_field(record, "location_id")?;
    require_field(record, "expiry_date")?;
    match record.get("quantity").and_then(|v| v.as_i64()) {
        Some(n) if n >= 0 => {}
        Some(_) => return Err(SyncError::validation("quantity", "must be >= 0")),
        None if record.is_present("quantity") => {
            return Err(SyncError::validation("quantity", "must be an integer"))
        }
        None => {}
    }
    validate_enum(record, "status", &["active", "expired", "used"])
}

fn validate_task(record: &Record) -> Result<(), SyncError> {
    require_field(record, "title")?;
    require_field(record, "created_by")?;
    require_field(record, "due_date")?;
    validate_enum(
        record,
        "status",
        &["todo", "pending", "in_progress", "review", "completed", "cancelled"],
    )?;
    validate_enum(record, "priority", &["low", "normal", "high"])
}

fn validate_task_assignment(record: &Record) -> Result<(), SyncError> {
    require_field(record, "task_id")?;
    require_field(record, "user_id")?;
    require_field(record, "assigned_at")?;
    validate_enum(
        record,
        "status",
        &["assigned", "accepted", "in_progress", "completed", "rejected", "declined"],
    )
}

fn validate_location(record: &Record) -> Result<(), SyncError> {
    require_field(record, "user_id")?;
    require_field(record, "name")?;
    validate_enum(
        record,
        "type",
        &["hospital", "clinic", "pharmacy", "laboratory", "emergency", "other"],
    )?;
    validate_coordinates(record)
}

fn validate_alert(record: &Record) -> Result<(), SyncError> {
    require_field(record, "user_id")?;
    require_field(record, "type")?;
    require_field(record, "location_id")?;
    require_field(record, "description")?;
    validate_enum(record, "priority", &["low", "normal", "high"])?;
    validate_enum(record, "sent_via", &["app", "sms", "email"])
}

fn validate_notification(record: &Record) -> Result<(), SyncError> {
    require_field(record, "user_id")?;
    require_field(record, "title")?;
    require_field(record, "body")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: serde_json::Value) -> Record {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn accepts_valid_user() {
        let r = obj(json!({
            "user_id": "u1", "name": "Ana", "email": "ana@x.io",
            "role": "volunteer", "updated_at": "2024-03-01T10:00:00Z"
        }));
        assert!(validate(EntityKind::User, &r).is_ok());
    }

    #[test]
    fn rejects_bad_email() {
        let r = obj(json!({
            "user_id": "u1", "name": "Ana", "email": "not-an-email",
            "role": "volunteer", "updated_at": "2024-03-01T10:00:00Z"
        }));
        assert!(validate(EntityKind::User, &r).is_err());
    }

    #[test]
    fn age_boundaries() {
        for age in [0, 150] {
            let r = obj(json!({
                "registration_id": "r1", "user_id": "u1", "person_name": "Ram",
                "age": age, "gender": "male", "location_id": "l1",
                "updated_at": "2024-03-01T10:00:00Z"
            }));
            assert!(validate(EntityKind::Registration, &r).is_ok(), "age {} should be valid", age);
        }
        for age in [-1, 151] {
            let r = obj(json!({
                "registration_id": "r1", "user_id": "u1", "person_name": "Ram",
                "age": age, "gender": "male", "location_id": "l1",
                "updated_at": "2024-03-01T10:00:00Z"
            }));
            assert!(validate(EntityKind::Registration, &r).is_err(), "age {} should be invalid", age);
        }
    }

    #[test]
    fn coordinates_both_or_neither() {
        let r = obj(json!({
            "location_id": "l1", "user_id": "u1", "name": "Clinic A",
            "type": "clinic", "latitude": 10.0, "updated_at": "2024-03-01T10:00:00Z"
        }));
        assert!(validate(EntityKind::Location, &r).is_err());

        let r = obj(json!({
            "location_id": "l1", "user_id": "u1", "name": "Clinic A",
            "type": "clinic", "updated_at": "2024-03-01T10:00:00Z"
        }));
        assert!(validate(EntityKind::Location, &r).is_ok());
    }

    #[test]
    fn latitude_out_of_range_rejected() {
        let r = obj(json!({
            "location_id": "l1", "user_id": "u1", "name": "Clinic A",
            "type": "clinic", "latitude": 91.0, "longitude": 0.0,
            "updated_at": "2024-03-01T10:00:00Z"
        }));
        assert!(validate(EntityKind::Location, &r).is_err());
    }

    #[test]
    fn missing_primary_key_rejected() {
        let r = obj(json!({"name": "Ana", "updated_at": "2024-03-01T10:00:00Z"}));
        assert!(validate(EntityKind::User, &r).is_err());
    }
}
