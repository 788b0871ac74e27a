//! The seven mandatory entity kinds plus the optional Notification kind, and
//! the per-entity configuration tables (§4.5, §4.6, §4.8) expressed as data
//! rather than as a match arm per entity, per the design note in §9: adding
//! an entity means adding a row to these tables, not new control flow.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Registration,
    Supply,
    Task,
    TaskAssignment,
    Location,
    Alert,
    Notification,
}

impl EntityKind {
    pub const ALL: [EntityKind; 8] = [
        EntityKind::User,
        EntityKind::Registration,
        EntityKind::Supply,
        EntityKind::Task,
        EntityKind::TaskAssignment,
        EntityKind::Location,
        EntityKind::Alert,
        EntityKind::Notification,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Registration => "registration",
            EntityKind::Supply => "supply",
            EntityKind::Task => "task",
            EntityKind::TaskAssignment => "task-assignment",
            EntityKind::Location => "location",
            EntityKind::Alert => "alert",
            EntityKind::Notification => "notification",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "user" => EntityKind::User,
            "registration" => EntityKind::Registration,
            "supply" => EntityKind::Supply,
            "task" => EntityKind::Task,
            "task-assignment" | "taskassignment" => EntityKind::TaskAssignment,
            "location" => EntityKind::Location,
            "alert" => EntityKind::Alert,
            "notification" => EntityKind::Notification,
            _ => return None,
        })
    }

    /// The field name serving as this entity's primary key.
    pub fn primary_key_field(&self) -> &'static str {
        match self {
            EntityKind::User => "user_id",
            EntityKind::Registration => "registration_id",
            EntityKind::Supply => "supply_id",
            EntityKind::Task => "task_id",
            EntityKind::TaskAssignment => "assignment_id",
            EntityKind::Location => "location_id",
            EntityKind::Alert => "alert_id",
            EntityKind::Notification => "notification_id",
        }
    }

    /// Single-field secondary-unique constraints (§3, §4.8). Composite
    /// uniqueness (Registration's name+age+gender, Task's title+location_id,
    /// TaskAssignment's task_id+user_id) is handled separately in
    /// [`composite_unique_fields`] since it requires multiple DocStore
    /// lookups intersected, not a single `whereEquals`.
    pub fn secondary_unique_fields(&self) -> &'static [&'static str] {
        match self {
            EntityKind::User => &["email", "phone_number"],
            EntityKind::Location => &["name"],
            EntityKind::Supply => &["barcode", "sku"],
            _ => &[],
        }
    }

    /// Composite secondary-unique tuples (§3, §4.8).
    pub fn composite_unique_fields(&self) -> Option<&'static [&'static str]> {
        match self {
            EntityKind::Registration => Some(&["person_name", "age", "gender"]),
            EntityKind::Task => Some(&["title", "location_id"]),
            EntityKind::TaskAssignment => Some(&["task_id", "user_id"]),
            _ => None,
        }
    }

    /// Critical fields for the merge rule (§4.5, §4.8): adopted from the
    /// client only when the client's `updated_at` is strictly newer AND the
    /// values differ.
    pub fn critical_fields(&self) -> &'static [&'static str] {
        match self {
            EntityKind::User => &["email", "role", "password_hash"],
            EntityKind::Registration => &["person_name", "age", "gender", "status"],
            EntityKind::Location => &["name", "type"],
            EntityKind::Task => &["title", "status"],
            EntityKind::TaskAssignment => &["status"],
            EntityKind::Supply => &["item_name", "category", "unit", "expiry_date", "status"],
            EntityKind::Alert => &["type", "priority", "is_active"],
            EntityKind::Notification => &["read"],
        }
    }

    /// Identity-defining subset preserved verbatim by `update_data` (§4.5).
    /// `None` means the strategy is not offered for this entity.
    pub fn identity_defining_fields(&self) -> Option<&'static [&'static str]> {
        match self {
            EntityKind::User => Some(&["email", "phone_number"]),
            EntityKind::Registration => Some(&["person_name", "age", "gender"]),
            EntityKind::Location => Some(&["name"]),
            _ => None,
        }
    }

    /// Free-text fields subject to the text-append merge rule (§4.5).
    pub fn text_merge_fields(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Registration => &["medical_history", "notes"],
            EntityKind::TaskAssignment => &["notes"],
            _ => &[],
        }
    }

    /// The status field's rank table for the status-lattice join (§4.5),
    /// if this entity has a lattice-ordered status field.
    pub fn status_lattice(&self) -> Option<&'static [(&'static str, u8)]> {
        match self {
            EntityKind::Task => Some(&[
                ("todo", 1),
                ("pending", 1),
                ("in_progress", 2),
                ("review", 3),
                ("completed", 4),
                ("cancelled", 5),
            ]),
            EntityKind::TaskAssignment => Some(&[
                ("assigned", 1),
                ("accepted", 2),
                ("in_progress", 3),
                ("completed", 4),
                ("rejected", 5),
                ("declined", 5),
            ]),
            EntityKind::Registration => Some(&[
                ("pending", 1),
                ("in_progress", 2),
                ("completed", 3),
                ("transferred", 4),
                ("discharged", 5),
            ]),
            _ => None,
        }
    }

    /// True for Supply: the only entity offering `sum_quantities` /
    /// `average_quantities`, and whose bare `quantity` merge falls back to
    /// the conservative minimum (§4.5).
    pub fn has_quantity(&self) -> bool {
        matches!(self, EntityKind::Supply)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
