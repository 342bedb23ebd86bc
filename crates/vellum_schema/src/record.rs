//! # Record Schemas
//!
//! Ordered slot lists per record type.
//!
//! ## Invariants
//!
//! - Slot indices equal declaration order and are never reused or reordered
//!   across schema versions; new slots are only ever appended
//! - The slot index is the wire-compatibility key; names are presentation

use serde::{Deserialize, Serialize};

use crate::error::{SchemaError, SchemaResult};
use crate::types::{DefaultValue, FieldType};

/// One field slot of a record type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldSlot {
    /// Stable slot index (position in declaration order).
    pub index: u16,
    /// Human-readable name - diagnostics only, never used on the wire.
    pub name: String,
    /// Semantic type of the slot.
    pub field_type: FieldType,
    /// Declared default for scalar slots; `None` for reference slots.
    pub default: DefaultValue,
}

impl FieldSlot {
    /// Creates a slot with no scalar default.
    #[must_use]
    pub fn new(index: u16, name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            index,
            name: name.into(),
            field_type,
            default: DefaultValue::None,
        }
    }

    /// Attaches a declared default to the slot.
    #[must_use]
    pub const fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = default;
        self
    }
}

/// A named record type: the ordered slot table the engine agrees on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordSchema {
    /// Record type name, unique within a registry.
    pub name: String,
    /// Slots in declaration order.
    slots: Vec<FieldSlot>,
}

impl RecordSchema {
    /// Assembles a schema, validating slot ordering and defaults.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::SlotOutOfOrder`] if a slot's index disagrees with its
    ///   position in the list
    /// - [`SchemaError::DefaultMismatch`] if a declared default does not fit
    ///   its slot's type
    pub fn new(name: impl Into<String>, slots: Vec<FieldSlot>) -> SchemaResult<Self> {
        let name = name.into();
        for (position, slot) in slots.iter().enumerate() {
            let expected = position as u16;
            if slot.index != expected {
                return Err(SchemaError::SlotOutOfOrder {
                    record: name,
                    expected,
                    found: slot.index,
                });
            }
            if !slot.default.fits(&slot.field_type) {
                return Err(SchemaError::DefaultMismatch {
                    record: name,
                    slot: slot.index,
                });
            }
        }
        Ok(Self { name, slots })
    }

    /// Number of declared slots.
    #[inline]
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Looks up a slot by its stable index.
    #[inline]
    #[must_use]
    pub fn slot(&self, index: u16) -> Option<&FieldSlot> {
        self.slots.get(index as usize)
    }

    /// Slots in declaration order.
    #[inline]
    #[must_use]
    pub fn slots(&self) -> &[FieldSlot] {
        &self.slots
    }
}
