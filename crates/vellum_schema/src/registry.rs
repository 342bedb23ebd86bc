//! # Schema Registry
//!
//! An explicit name -> schema lookup shared by builders and accessors.
//!
//! ## Design
//!
//! No implicit global state: callers construct a registry and pass it where
//! it is needed. One registry may be shared process-wide behind an `Arc`;
//! the interior lock makes concurrent registration and lookup safe.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{SchemaError, SchemaResult};
use crate::record::RecordSchema;

/// Registry of record schemas, keyed by record type name.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    records: RwLock<HashMap<String, Arc<RecordSchema>>>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema under its record name.
    ///
    /// Re-registering an identical definition is a no-op, so independent
    /// subsystems may register the message types they use without
    /// coordinating.
    ///
    /// # Errors
    ///
    /// [`SchemaError::ConflictingRegistration`] if the name is already bound
    /// to a different definition.
    pub fn register(&self, schema: RecordSchema) -> SchemaResult<()> {
        let mut records = self.records.write();
        if let Some(existing) = records.get(&schema.name) {
            if **existing == schema {
                return Ok(());
            }
            return Err(SchemaError::ConflictingRegistration(schema.name));
        }
        records.insert(schema.name.clone(), Arc::new(schema));
        Ok(())
    }

    /// Looks up a schema by record type name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<RecordSchema>> {
        self.records.read().get(name).cloned()
    }

    /// Looks up a schema, failing if the name is unknown.
    ///
    /// # Errors
    ///
    /// [`SchemaError::UnknownRecord`] if no schema is registered under `name`.
    pub fn resolve(&self, name: &str) -> SchemaResult<Arc<RecordSchema>> {
        self.get(name)
            .ok_or_else(|| SchemaError::UnknownRecord(name.to_string()))
    }

    /// Number of registered record types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldSlot;
    use crate::types::{DefaultValue, FieldType, ScalarType};

    fn score_entry() -> RecordSchema {
        RecordSchema::new(
            "TeamScoreEntry",
            vec![
                FieldSlot::new(0, "team_id", FieldType::Scalar(ScalarType::U32))
                    .with_default(DefaultValue::Int(0)),
                FieldSlot::new(1, "score", FieldType::Scalar(ScalarType::U32))
                    .with_default(DefaultValue::Int(0)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn register_and_resolve() {
        let registry = SchemaRegistry::new();
        registry.register(score_entry()).unwrap();
        let schema = registry.resolve("TeamScoreEntry").unwrap();
        assert_eq!(schema.slot_count(), 2);
        assert!(registry.resolve("Nope").is_err());
    }

    #[test]
    fn identical_re_registration_is_noop() {
        let registry = SchemaRegistry::new();
        registry.register(score_entry()).unwrap();
        registry.register(score_entry()).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn conflicting_registration_is_rejected() {
        let registry = SchemaRegistry::new();
        registry.register(score_entry()).unwrap();

        let conflicting = RecordSchema::new(
            "TeamScoreEntry",
            vec![FieldSlot::new(0, "team_id", FieldType::Scalar(ScalarType::U64))
                .with_default(DefaultValue::Int(0))],
        )
        .unwrap();

        assert_eq!(
            registry.register(conflicting).unwrap_err(),
            SchemaError::ConflictingRegistration("TeamScoreEntry".to_string())
        );
    }

    #[test]
    fn shared_across_threads() {
        let registry = Arc::new(SchemaRegistry::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.register(score_entry()))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }
        assert_eq!(registry.len(), 1);
    }
}
