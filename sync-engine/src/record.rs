//! The document shape moved around by the engine. Every entity kind is
//! schema-flexible JSON at this layer (DocStore is a document store, not a
//! relational one); typed field access is layered on top where it matters
//! (validators, conflict algebra, identity heuristics).

use serde_json::{Map, Value};

pub type Record = Map<String, Value>;

pub trait RecordExt {
    fn str_field(&self, field: &str) -> Option<&str>;
    fn bool_field(&self, field: &str) -> Option<bool>;
    fn i64_field(&self, field: &str) -> Option<i64>;
    fn f64_field(&self, field: &str) -> Option<f64>;
    fn is_present(&self, field: &str) -> bool;
}

impl RecordExt for Record {
    fn str_field(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    fn bool_field(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(Value::as_bool)
    }

    fn i64_field(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_i64)
    }

    fn f64_field(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    fn is_present(&self, field: &str) -> bool {
        matches!(self.get(field), Some(v) if !v.is_null())
    }
}
