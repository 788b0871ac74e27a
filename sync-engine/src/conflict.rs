//! Conflict algebra (C5): the pure reducers applied to a `(client, server)`
//! pair once a conflict has been detected, either automatically (staleness,
//! §4.7 step 3) or by explicit client choice (`resolve-conflict`, §4.7).

use crate::entity::EntityKind;
use crate::error::SyncError;
use crate::record::{Record, RecordExt};
use crate::timestamp::to_instant_or_now;
use serde_json::Value;

pub const CLIENT_WINS: &str = "client_wins";
pub const SERVER_WINS: &str = "server_wins";
pub const MERGE: &str = "merge";
pub const UPDATE_DATA: &str = "update_data";
pub const SUM_QUANTITIES: &str = "sum_quantities";
pub const AVERAGE_QUANTITIES: &str = "average_quantities";

/// The strategies offered for a given entity and server-existence state,
/// in the order the spec lists them (§4.7, §4.8).
pub fn allowed_strategies(kind: EntityKind, server_exists: bool) -> Vec<&'static str> {
    if !server_exists {
        return vec![CLIENT_WINS];
    }
    let mut strategies = vec![CLIENT_WINS, SERVER_WINS, MERGE];
    if kind.identity_defining_fields().is_some() {
        strategies.push(UPDATE_DATA);
    }
    if kind.has_quantity() {
        strategies.push(SUM_QUANTITIES);
        strategies.push(AVERAGE_QUANTITIES);
    }
    strategies
}

/// Applies a named strategy to a client/server pair. `server` is `None` only
/// when the resolve-conflict create path (§4.7 step 2) is in play, in which
/// case only `client_wins` is legal.
pub fn apply(
    kind: EntityKind,
    strategy: &str,
    client: &Record,
    server: Option<&Record>,
) -> Result<Record, SyncError> {
    match (strategy, server) {
        (CLIENT_WINS, _) => Ok(client.clone()),
        (_, None) => Err(SyncError::UnknownStrategy(format!(
            "{} requires an existing server document",
            strategy
        ))),
        (SERVER_WINS, Some(server)) => Ok(server.clone()),
        (UPDATE_DATA, Some(server)) => Ok(update_data(kind, client, server)),
        (MERGE, Some(server)) => Ok(merge(kind, client, server)),
        (SUM_QUANTITIES, Some(server)) if kind.has_quantity() => {
            Ok(combine_quantities(client, server, |a, b| a + b))
        }
        (AVERAGE_QUANTITIES, Some(server)) if kind.has_quantity() => {
            Ok(combine_quantities(client, server, |a, b| {
                ((a as f64 + b as f64) / 2.0).round() as i64
            }))
        }
        (SUM_QUANTITIES | AVERAGE_QUANTITIES, Some(_)) => Err(SyncError::UnknownStrategy(format!(
            "{} is only offered for supply",
            strategy
        ))),
        _ => Err(SyncError::UnknownStrategy(strategy.to_string())),
    }
}

/// `update_data`: client overlays server, but the identity-defining subset
/// is preserved from server verbatim, and `updated_at` is stamped to now.
fn update_data(kind: EntityKind, client: &Record, server: &Record) -> Record {
    let mut merged = server.clone();
    for (k, v) in client {
        merged.insert(k.clone(), v.clone());
    }
    if let Some(identity_fields) = kind.identity_defining_fields() {
        for field in identity_fields {
            match server.get(*field) {
                Some(v) => {
                    merged.insert((*field).to_string(), v.clone());
                }
                None => {
                    merged.remove(*field);
                }
            }
        }
    }
    merged.insert("updated_at".to_string(), Value::String(chrono::Utc::now().to_rfc3339()));
    merged
}

fn combine_quantities(client: &Record, server: &Record, f: impl Fn(i64, i64) -> i64) -> Record {
    let mut merged = server.clone();
    for (k, v) in client {
        merged.insert(k.clone(), v.clone());
    }
    let client_qty = client.i64_field("quantity").unwrap_or(0);
    let server_qty = server.i64_field("quantity").unwrap_or(0);
    merged.insert("quantity".to_string(), Value::from(f(client_qty, server_qty)));
    merged.insert("updated_at".to_string(), Value::String(chrono::Utc::now().to_rfc3339()));
    merged
}

/// `merge`: the field-by-field reconciliation rule of §4.5.
pub fn merge(kind: EntityKind, client: &Record, server: &Record) -> Record {
    let c_t = to_instant_or_now(client.get("updated_at"));
    let s_t = to_instant_or_now(server.get("updated_at"));
    let client_is_newer = c_t > s_t;

    let mut merged = server.clone();
    let text_fields = kind.text_merge_fields();
    let status_field_name = "status";
    let has_lattice = kind.status_lattice().is_some();

    let mut keys: Vec<&String> = client.keys().chain(server.keys()).collect();
    keys.sort();
    keys.dedup();

    for key in keys {
        if key == "updated_at" || key == "created_at" {
            continue;
        }
        if text_fields.contains(&key.as_str()) {
            let merged_text = text_append_merge(server.str_field(key), client.str_field(key));
            match merged_text {
                Some(v) => {
                    merged.insert(key.clone(), Value::String(v));
                }
                None => {
                    merged.remove(key);
                }
            }
            continue;
        }
        if has_lattice && key == status_field_name {
            if let Some(joined) = status_join(kind, client.str_field(key), server.str_field(key)) {
                merged.insert(key.clone(), Value::String(joined));
            }
            continue;
        }
        if kind.has_quantity() && key == "quantity" {
            if let (Some(c), Some(s)) = (client.i64_field(key), server.i64_field(key)) {
                merged.insert(key.clone(), Value::from(c.min(s)));
            }
            continue;
        }

        // Critical and non-critical fields share one adoption rule per §4.5:
        // the client value is adopted only when newer and different.
        let client_val = client.get(key);
        let server_val = server.get(key);
        let differ = client_val != server_val;

        if client_val.is_some() && client_is_newer && differ {
            merged.insert(key.clone(), client_val.cloned().unwrap());
        } else if server_val.is_none() {
            if let Some(v) = client_val {
                merged.insert(key.clone(), v.clone());
            }
        }
    }

    let resolved_updated_at = if client_is_newer { c_t } else { s_t };
    merged.insert(
        "updated_at".to_string(),
        Value::String(resolved_updated_at.to_rfc3339()),
    );
    merged
}

/// Status-lattice join (§4.5): the higher-rank value wins; missing on one
/// side defers to the other. Guarantees non-regression (invariant I4).
pub fn status_join(kind: EntityKind, client: Option<&str>, server: Option<&str>) -> Option<String> {
    let lattice = kind.status_lattice()?;
    let rank = |s: &str| -> Option<u8> {
        lattice
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s))
            .map(|(_, r)| *r)
    };
    match (client, server) {
        (Some(c), Some(s)) => {
            let (cr, sr) = (rank(c), rank(s));
            match (cr, sr) {
                (Some(cr), Some(sr)) => Some(if cr >= sr { c.to_string() } else { s.to_string() }),
                (Some(_), None) => Some(c.to_string()),
                (None, Some(_)) => Some(s.to_string()),
                (None, None) => Some(s.to_string()),
            }
        }
        (Some(c), None) => Some(c.to_string()),
        (None, Some(s)) => Some(s.to_string()),
        (None, None) => None,
    }
}

/// Text-append merge (§4.5), for free-text fields like medical_history/notes.
pub fn text_append_merge(server: Option<&str>, client: Option<&str>) -> Option<String> {
    match (server, client) {
        (None | Some(""), None | Some("")) => None,
        (Some(s), None) | (Some(s), Some("")) => Some(s.to_string()),
        (None, Some(c)) | (Some(""), Some(c)) => Some(c.to_string()),
        (Some(s), Some(c)) => {
            if s == c {
                Some(s.to_string())
            } else if s.contains(c) {
                Some(s.to_string())
            } else if c.contains(s) {
                Some(c.to_string())
            } else {
                Some(format!("{}\n\n[SYNC MERGE] Client update:\n{}", s, c))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: serde_json::Value) -> Record {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn client_wins_returns_client_verbatim() {
        let client = obj(json!({"a": 1}));
        let server = obj(json!({"a": 2}));
        let result = apply(EntityKind::User, CLIENT_WINS, &client, Some(&server)).unwrap();
        assert_eq!(result, client);
    }

    #[test]
    fn server_wins_returns_server_verbatim() {
        let client = obj(json!({"a": 1}));
        let server = obj(json!({"a": 2}));
        let result = apply(EntityKind::User, SERVER_WINS, &client, Some(&server)).unwrap();
        assert_eq!(result, server);
    }

    #[test]
    fn sum_quantities_adds() {
        let client = obj(json!({"quantity": 3, "updated_at": "2024-01-01T00:00:00Z"}));
        let server = obj(json!({"quantity": 5, "updated_at": "2024-01-01T00:00:00Z"}));
        let result = apply(EntityKind::Supply, SUM_QUANTITIES, &client, Some(&server)).unwrap();
        assert_eq!(result.i64_field("quantity"), Some(8));
    }

    #[test]
    fn average_quantities_rounds() {
        let client = obj(json!({"quantity": 3}));
        let server = obj(json!({"quantity": 4}));
        let result = apply(EntityKind::Supply, AVERAGE_QUANTITIES, &client, Some(&server)).unwrap();
        assert_eq!(result.i64_field("quantity"), Some(4));
    }

    #[test]
    fn update_data_preserves_identity_fields() {
        let client = obj(json!({
            "email": "new@x.io", "phone_number": "555", "role": "volunteer",
        }));
        let server = obj(json!({
            "email": "old@x.io", "phone_number": "111", "role": "admin",
        }));
        let result = update_data(EntityKind::User, &client, &server);
        assert_eq!(result.str_field("email"), Some("old@x.io"));
        assert_eq!(result.str_field("phone_number"), Some("111"));
        assert_eq!(result.str_field("role"), Some("volunteer"));
    }

    #[test]
    fn status_lattice_join_never_regresses() {
        let joined = status_join(EntityKind::Task, Some("completed"), Some("in_progress")).unwrap();
        assert_eq!(joined, "completed");
        let joined2 = status_join(EntityKind::Task, Some("in_progress"), Some("completed")).unwrap();
        assert_eq!(joined2, "completed");
    }

    #[test]
    fn status_join_is_commutative() {
        let a = status_join(EntityKind::Task, Some("review"), Some("todo"));
        let b = status_join(EntityKind::Task, Some("todo"), Some("review"));
        assert_eq!(a, b);
    }

    #[test]
    fn text_append_merge_handles_containment() {
        assert_eq!(text_append_merge(Some("hello world"), Some("hello")), Some("hello world".to_string()));
        assert_eq!(text_append_merge(Some(""), Some("new")), Some("new".to_string()));
        assert_eq!(text_append_merge(Some("same"), Some("same")), Some("same".to_string()));
    }

    #[test]
    fn text_append_merge_appends_when_disjoint() {
        let merged = text_append_merge(Some("server note"), Some("client note")).unwrap();
        assert!(merged.starts_with("server note"));
        assert!(merged.contains("[SYNC MERGE] Client update:"));
        assert!(merged.ends_with("client note"));
    }

    #[test]
    fn merge_is_idempotent_on_equal_inputs() {
        let x = obj(json!({
            "title": "Fix pump", "status": "in_progress",
            "updated_at": "2024-01-01T00:00:00Z"
        }));
        let merged = merge(EntityKind::Task, &x, &x);
        assert_eq!(merged.str_field("status"), Some("in_progress"));
    }

    #[test]
    fn merge_updated_at_is_max_of_both() {
        let client = obj(json!({"title": "A", "updated_at": "2024-02-01T00:00:00Z"}));
        let server = obj(json!({"title": "B", "updated_at": "2024-01-01T00:00:00Z"}));
        let merged = merge(EntityKind::Task, &client, &server);
        assert_eq!(merged.str_field("updated_at"), Some("2024-02-01T00:00:00+00:00"));
    }

    #[test]
    fn supply_quantity_merge_takes_minimum() {
        let client = obj(json!({"quantity": 10, "updated_at": "2024-02-01T00:00:00Z"}));
        let server = obj(json!({"quantity": 4, "updated_at": "2024-01-01T00:00:00Z"}));
        let merged = merge(EntityKind::Supply, &client, &server);
        assert_eq!(merged.i64_field("quantity"), Some(4));
    }
}
