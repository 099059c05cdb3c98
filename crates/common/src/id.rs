use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Source of fresh textual identifiers.
pub trait IdGenerator: Send + Sync {
    /// Returns a new identifier.
    fn generate(&self) -> String;
}

/// Generates `{prefix}{12 uppercase hex chars}` identifiers from random UUIDs.
#[derive(Debug, Clone)]
pub struct PrefixedIdGenerator {
    prefix: String,
}

impl PrefixedIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl IdGenerator for PrefixedIdGenerator {
    fn generate(&self) -> String {
        let hex = Uuid::new_v4().simple().to_string().to_uppercase();
        format!("{}{}", self.prefix, &hex[..12])
    }
}

/// Deterministic `{prefix}{n:07}` identifiers, starting at 1.
///
/// Counters are process-local, so this is only suitable for tests and
/// single-process in-memory runs.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}{:07}", self.prefix, n)
    }
}
