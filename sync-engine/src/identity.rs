//! Identity heuristics (C6): per-entity "is this the same real-world thing"
//! predicates used to decide whether a secondary-uniqueness collision is a
//! genuine duplicate that can be auto-merged, or a real conflict to report.
//!
//! Scoring is transparent by design (§9): count matches out of comparable
//! fields, declare same-entity when either a primary criterion holds or the
//! match ratio is >= 0.8.

use crate::entity::EntityKind;
use crate::record::{Record, RecordExt};
use crate::timestamp::to_instant;
use serde_json::Value;

const MATCH_THRESHOLD: f64 = 0.8;

/// Same calendar day, per the parsed instant's UTC date — used for
/// `assigned_at`, where the exact instant routinely drifts across an
/// offline-first sync but the day it happened on should not.
fn same_day(a: &str, b: &str) -> bool {
    let a = to_instant(Some(&Value::String(a.to_string())));
    let b = to_instant(Some(&Value::String(b.to_string())));
    match (a, b) {
        (Some(a), Some(b)) => a.date_naive() == b.date_naive(),
        _ => false,
    }
}

fn norm(s: &str) -> String {
    s.trim().to_lowercase()
}

fn contains_either_way(a: &str, b: &str) -> bool {
    let (a, b) = (norm(a), norm(b));
    a == b || a.contains(&b) || b.contains(&a)
}

fn digits_last_n(s: &str, n: usize) -> String {
    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() > n {
        digits[digits.len() - n..].to_string()
    } else {
        digits
    }
}

/// Is `client` plausibly the same real-world entity as `server`, given a
/// secondary-uniqueness collision between them? `password_matches` is
/// supplied by the caller (via `AuthStore.verifyPassword`) for the User
/// entity's password-hash primary criterion — the heuristic never handles
/// plaintext or hashes itself, and per §9 this signal is used ONLY to
/// decide whether to merge two profile rows, never to grant access.
pub fn is_same_entity(kind: EntityKind, client: &Record, server: &Record, password_matches: bool) -> bool {
    match kind {
        EntityKind::User => is_same_user(client, server, password_matches),
        EntityKind::Registration => is_same_registration(client, server),
        EntityKind::Location => is_same_location(client, server),
        EntityKind::Task => is_same_task(client, server),
        EntityKind::TaskAssignment => is_same_task_assignment(client, server),
        EntityKind::Supply => is_same_supply(client, server),
        EntityKind::Alert | EntityKind::Notification => false,
    }
}

fn is_same_user(client: &Record, server: &Record, password_matches: bool) -> bool {
    if client.str_field("user_id").is_some()
        && client.str_field("user_id") == server.str_field("user_id")
    {
        return true;
    }
    if password_matches {
        return true;
    }
    score_matches(
        &[
            field_match(client, server, "name", contains_either_way),
            field_match(client, server, "role", |a, b| norm(a) == norm(b)),
            field_match(client, server, "email", |a, b| norm(a) == norm(b)),
            field_match(client, server, "phone_number", |a, b| {
                digits_last_n(a, 10) == digits_last_n(b, 10)
            }),
        ],
    ) >= MATCH_THRESHOLD
}

fn is_same_registration(client: &Record, server: &Record) -> bool {
    let name_eq = client
        .str_field("person_name")
        .zip(server.str_field("person_name"))
        .map(|(a, b)| contains_either_way(a, b))
        .unwrap_or(false);
    let gender_eq = client
        .str_field("gender")
        .zip(server.str_field("gender"))
        .map(|(a, b)| norm(a) == norm(b))
        .unwrap_or(false);

    let age_close = age_match(client, server, 1);
    let criticals = [
        field_match(client, server, "person_name", contains_either_way),
        age_close,
        field_match(client, server, "gender", |a, b| norm(a) == norm(b)),
    ];
    let critical_matches = criticals.iter().filter(|m| matches!(m, Some(true))).count();

    if name_eq && gender_eq && critical_matches >= 2 {
        return true;
    }

    score_matches(&[
        field_match(client, server, "person_name", contains_either_way),
        age_match(client, server, 0),
        field_match(client, server, "gender", |a, b| norm(a) == norm(b)),
        field_match(client, server, "contact", contains_either_way),
        field_match(client, server, "location_id", |a, b| a == b),
    ]) >= MATCH_THRESHOLD
}

fn is_same_location(client: &Record, server: &Record) -> bool {
    let name_eq = client
        .str_field("name")
        .zip(server.str_field("name"))
        .map(|(a, b)| contains_either_way(a, b))
        .unwrap_or(false);
    let address_eq = client
        .str_field("address")
        .zip(server.str_field("address"))
        .map(|(a, b)| contains_either_way(a, b))
        .unwrap_or(false);

    let criticals = [
        field_match(client, server, "type", |a, b| norm(a) == norm(b)),
        coords_match(client, server),
    ];
    let critical_matches = criticals.iter().filter(|m| matches!(m, Some(true))).count();

    if name_eq && (address_eq || critical_matches >= 2) {
        return true;
    }

    score_matches(&[
        field_match(client, server, "name", contains_either_way),
        field_match(client, server, "address", contains_either_way),
        field_match(client, server, "type", |a, b| norm(a) == norm(b)),
        coords_match(client, server),
    ]) >= MATCH_THRESHOLD
}

fn is_same_task(client: &Record, server: &Record) -> bool {
    let title_eq = client
        .str_field("title")
        .zip(server.str_field("title"))
        .map(|(a, b)| contains_either_way(a, b))
        .unwrap_or(false);
    let criticals = [
        field_match(client, server, "location_id", |a, b| a == b),
        field_match(client, server, "created_by", |a, b| a == b),
        field_match(client, server, "due_date", |a, b| a == b),
        field_match(client, server, "priority", |a, b| norm(a) == norm(b)),
    ];
    let critical_matches = criticals.iter().filter(|m| matches!(m, Some(true))).count();

    if title_eq && critical_matches >= 2 {
        return true;
    }

    score_matches(&[
        field_match(client, server, "title", contains_either_way),
        field_match(client, server, "location_id", |a, b| a == b),
        field_match(client, server, "created_by", |a, b| a == b),
        field_match(client, server, "due_date", |a, b| a == b),
        field_match(client, server, "priority", |a, b| norm(a) == norm(b)),
    ]) >= MATCH_THRESHOLD
}

fn is_same_task_assignment(client: &Record, server: &Record) -> bool {
    let task_eq = field_match(client, server, "task_id", |a, b| a == b).unwrap_or(false);
    let user_eq = field_match(client, server, "user_id", |a, b| a == b).unwrap_or(false);
    if task_eq && user_eq {
        return true;
    }

    score_matches(&[
        field_match(client, server, "task_id", |a, b| a == b),
        field_match(client, server, "user_id", |a, b| a == b),
        field_match(client, server, "assigned_by", |a, b| a == b),
        field_match(client, server, "assigned_at", same_day),
        field_match(client, server, "status", |a, b| norm(a) == norm(b)),
    ]) >= MATCH_THRESHOLD
}

fn is_same_supply(client: &Record, server: &Record) -> bool {
    let barcode_eq = client
        .str_field("barcode")
        .zip(server.str_field("barcode"))
        .map(|(a, b)| a == b)
        .unwrap_or(false);
    let sku_eq = client
        .str_field("sku")
        .zip(server.str_field("sku"))
        .map(|(a, b)| a == b)
        .unwrap_or(false);
    if barcode_eq || sku_eq {
        return true;
    }

    score_matches(&[
        field_match(client, server, "item_name", contains_either_way),
        field_match(client, server, "barcode", |a, b| a == b),
        field_match(client, server, "sku", |a, b| a == b),
        field_match(client, server, "category", |a, b| norm(a) == norm(b)),
        field_match(client, server, "unit", |a, b| norm(a) == norm(b)),
        field_match(client, server, "location_id", |a, b| a == b),
    ]) >= MATCH_THRESHOLD
}

fn age_match(client: &Record, server: &Record, tolerance: i64) -> Option<bool> {
    let c = client.i64_field("age")?;
    let s = server.i64_field("age")?;
    Some((c - s).abs() <= tolerance)
}

fn coords_match(client: &Record, server: &Record) -> Option<bool> {
    let cl = client.f64_field("latitude")?;
    let cg = client.f64_field("longitude")?;
    let sl = server.f64_field("latitude")?;
    let sg = server.f64_field("longitude")?;
    Some((cl - sl).abs() <= 0.001 && (cg - sg).abs() <= 0.001)
}

fn field_match(
    client: &Record,
    server: &Record,
    field: &str,
    cmp: impl Fn(&str, &str) -> bool,
) -> Option<bool> {
    let c = client.str_field(field)?;
    let s = server.str_field(field)?;
    Some(cmp(c, s))
}

fn score_matches(matches: &[Option<bool>]) -> f64 {
    let comparable: Vec<bool> = matches.iter().filter_map(|m| *m).collect();
    if comparable.is_empty() {
        return 0.0;
    }
    let hits = comparable.iter().filter(|b| **b).count();
    hits as f64 / comparable.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: serde_json::Value) -> Record {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn same_user_by_id() {
        let a = obj(json!({"user_id": "u1"}));
        let b = obj(json!({"user_id": "u1"}));
        assert!(is_same_entity(EntityKind::User, &a, &b, false));
    }

    #[test]
    fn same_user_by_password_heuristic() {
        let a = obj(json!({"user_id": "u1"}));
        let b = obj(json!({"user_id": "u2"}));
        assert!(is_same_entity(EntityKind::User, &a, &b, true));
    }

    #[test]
    fn registration_same_name_age_gender() {
        let a = obj(json!({"person_name": "Ram", "age": 40, "gender": "male"}));
        let b = obj(json!({"person_name": "ram", "age": 40, "gender": "Male"}));
        assert!(is_same_entity(EntityKind::Registration, &a, &b, false));
    }

    #[test]
    fn alert_never_auto_merges() {
        let a = obj(json!({"type": "fire"}));
        let b = obj(json!({"type": "fire"}));
        assert!(!is_same_entity(EntityKind::Alert, &a, &b, false));
    }

    #[test]
    fn supply_matches_on_barcode() {
        let a = obj(json!({"barcode": "123", "item_name": "Bandages"}));
        let b = obj(json!({"barcode": "123", "item_name": "Gauze"}));
        assert!(is_same_entity(EntityKind::Supply, &a, &b, false));
    }

    #[test]
    fn task_assignment_requires_both_ids_equal() {
        let a = obj(json!({"task_id": "t1", "user_id": "u1"}));
        let b = obj(json!({"task_id": "t1", "user_id": "u2"}));
        assert!(!is_same_entity(EntityKind::TaskAssignment, &a, &b, false));
    }
}
