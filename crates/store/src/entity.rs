use serde::{Serialize, de::DeserializeOwned};

/// An entity that can be persisted by a [`Repository`](crate::Repository)
/// and cached as a JSON document.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Returns the entity type name (e.g. `"Order"`).
    ///
    /// Used in error messages, metric labels and cache keys.
    fn entity_type() -> &'static str;

    /// Returns the name of the table holding this entity.
    ///
    /// Must be a plain SQL identifier; it is interpolated into statements.
    fn table_name() -> &'static str;

    /// Returns the entity's stable identifier.
    fn id(&self) -> &str;
}
