/// Identifiers are opaque strings (UUID v7 for anything created at runtime).
pub type EntityId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Generate a fresh, time-ordered identifier.
pub fn new_id() -> EntityId {
    uuid::Uuid::now_v7().to_string()
}
