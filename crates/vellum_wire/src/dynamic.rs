//! # Dynamic Records
//!
//! Schema-driven building and reading without generated code.
//!
//! ## Where This Fits
//!
//! The typed message layer compiles slot knowledge into Rust code. This
//! module is the general path: hand it a [`SchemaRegistry`] and a record
//! name and it drives the same [`Builder`] and [`Table`] machinery from the
//! registered slot table - the registry is consumed by both sides, which is
//! what keeps writer and reader agreeing on slot -> offset semantics.
//!
//! ## Limits
//!
//! The data model allows one level of record nesting and sequences of
//! scalars, text or records. Sequences of sequences are rejected as a
//! [`WireError::ValueMismatch`].

use std::sync::Arc;

use vellum_schema::{DefaultValue, FieldSlot, FieldType, RecordSchema, ScalarType, SchemaRegistry};

use crate::builder::{Builder, WireOffset};
use crate::error::{WireError, WireResult};
use crate::table::{root_table, Table};

/// A dynamically typed field value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Any integer scalar slot, widened to i64.
    Int(i64),
    /// Any float slot.
    Float(f64),
    /// A boolean slot.
    Bool(bool),
    /// A text slot.
    Text(String),
    /// A nested record as (slot, value) pairs.
    Record(Vec<(u16, Value)>),
    /// A sequence slot.
    Sequence(Vec<Value>),
}

/// Builds a finished buffer for `record` from (slot, value) pairs.
///
/// Children are assembled before the table that references them, and scalar
/// slots equal to their declared default are pruned, exactly as the typed
/// path does.
///
/// # Errors
///
/// - [`WireError::UnknownSlot`] / [`WireError::ValueMismatch`] on input that
///   disagrees with the schema
/// - [`vellum_schema::SchemaError::UnknownRecord`] (wrapped) when `record`
///   or a nested record name is not registered
pub fn encode_record(
    registry: &SchemaRegistry,
    record: &str,
    fields: &[(u16, Value)],
) -> WireResult<Vec<u8>> {
    let schema = registry.resolve(record)?;
    let mut builder = Builder::new();
    let root = write_record(&mut builder, registry, &schema, fields)?;
    builder.finish(root);
    Ok(builder.finished_data().to_vec())
}

/// Writes one record (children first) and returns its offset.
fn write_record(
    builder: &mut Builder,
    registry: &SchemaRegistry,
    schema: &RecordSchema,
    fields: &[(u16, Value)],
) -> WireResult<WireOffset> {
    // Pass 1: out-of-line children.
    let mut references: Vec<(u16, WireOffset)> = Vec::new();
    for (slot, value) in fields {
        let declared = lookup(schema, *slot)?;
        match (&declared.field_type, value) {
            (FieldType::Scalar(_), Value::Int(_) | Value::Float(_) | Value::Bool(_)) => {}
            (FieldType::Text, Value::Text(text)) => {
                references.push((*slot, builder.create_string(text)));
            }
            (FieldType::Record(name), Value::Record(nested)) => {
                let nested_schema = registry.resolve(name)?;
                let offset = write_record(builder, registry, &nested_schema, nested)?;
                references.push((*slot, offset));
            }
            (FieldType::Sequence(element), Value::Sequence(items)) => {
                let offset = write_sequence(builder, registry, schema, declared, element, items)?;
                references.push((*slot, offset));
            }
            _ => return Err(mismatch(schema, *slot)),
        }
    }

    // Pass 2: the table itself.
    builder.start_table(schema.slot_count() as u16);
    for (slot, value) in fields {
        let declared = lookup(schema, *slot)?;
        if let FieldType::Scalar(scalar) = &declared.field_type {
            write_scalar_slot(builder, schema, declared, *scalar, value)?;
        }
    }
    for (slot, offset) in references {
        builder.push_slot_offset(slot, offset);
    }
    Ok(builder.end_table())
}

/// Writes one out-of-line sequence and returns its offset.
fn write_sequence(
    builder: &mut Builder,
    registry: &SchemaRegistry,
    schema: &RecordSchema,
    declared: &FieldSlot,
    element: &FieldType,
    items: &[Value],
) -> WireResult<WireOffset> {
    match element {
        FieldType::Scalar(scalar) => write_scalar_sequence(builder, schema, declared, *scalar, items),
        FieldType::Text => {
            let mut texts = Vec::with_capacity(items.len());
            for item in items {
                let Value::Text(text) = item else {
                    return Err(mismatch(schema, declared.index));
                };
                texts.push(text.as_str());
            }
            Ok(builder.create_vector_of_strings(&texts))
        }
        FieldType::Record(name) => {
            let nested_schema = registry.resolve(name)?;
            let mut offsets = Vec::with_capacity(items.len());
            for item in items {
                let Value::Record(nested) = item else {
                    return Err(mismatch(schema, declared.index));
                };
                offsets.push(write_record(builder, registry, &nested_schema, nested)?);
            }
            Ok(builder.create_vector_of_offsets(&offsets))
        }
        FieldType::Sequence(_) => Err(mismatch(schema, declared.index)),
    }
}

fn write_scalar_sequence(
    builder: &mut Builder,
    schema: &RecordSchema,
    declared: &FieldSlot,
    scalar: ScalarType,
    items: &[Value],
) -> WireResult<WireOffset> {
    macro_rules! collect_ints {
        ($ty:ty) => {{
            let mut packed: Vec<$ty> = Vec::with_capacity(items.len());
            for item in items {
                let Value::Int(v) = item else {
                    return Err(mismatch(schema, declared.index));
                };
                packed.push(*v as $ty);
            }
            builder.create_vector(&packed)
        }};
    }

    Ok(match scalar {
        ScalarType::U8 => collect_ints!(u8),
        ScalarType::I8 => collect_ints!(i8),
        ScalarType::U16 => collect_ints!(u16),
        ScalarType::I16 => collect_ints!(i16),
        ScalarType::U32 => collect_ints!(u32),
        ScalarType::I32 => collect_ints!(i32),
        ScalarType::U64 => collect_ints!(u64),
        ScalarType::I64 => collect_ints!(i64),
        ScalarType::F32 => {
            let mut packed: Vec<f32> = Vec::with_capacity(items.len());
            for item in items {
                let Value::Float(v) = item else {
                    return Err(mismatch(schema, declared.index));
                };
                packed.push(*v as f32);
            }
            builder.create_vector(&packed)
        }
        ScalarType::F64 => {
            let mut packed: Vec<f64> = Vec::with_capacity(items.len());
            for item in items {
                let Value::Float(v) = item else {
                    return Err(mismatch(schema, declared.index));
                };
                packed.push(*v);
            }
            builder.create_vector(&packed)
        }
        ScalarType::Bool => {
            let mut packed: Vec<bool> = Vec::with_capacity(items.len());
            for item in items {
                let Value::Bool(v) = item else {
                    return Err(mismatch(schema, declared.index));
                };
                packed.push(*v);
            }
            builder.create_vector(&packed)
        }
    })
}

fn write_scalar_slot(
    builder: &mut Builder,
    schema: &RecordSchema,
    declared: &FieldSlot,
    scalar: ScalarType,
    value: &Value,
) -> WireResult<()> {
    let default_int = match declared.default {
        DefaultValue::Int(d) => d,
        _ => 0,
    };
    let default_float = match declared.default {
        DefaultValue::Float(d) => d,
        _ => 0.0,
    };

    match (scalar, value) {
        (ScalarType::U8, Value::Int(v)) => {
            builder.push_slot_scalar(declared.index, *v as u8, default_int as u8);
        }
        (ScalarType::I8, Value::Int(v)) => {
            builder.push_slot_scalar(declared.index, *v as i8, default_int as i8);
        }
        (ScalarType::U16, Value::Int(v)) => {
            builder.push_slot_scalar(declared.index, *v as u16, default_int as u16);
        }
        (ScalarType::I16, Value::Int(v)) => {
            builder.push_slot_scalar(declared.index, *v as i16, default_int as i16);
        }
        (ScalarType::U32, Value::Int(v)) => {
            builder.push_slot_scalar(declared.index, *v as u32, default_int as u32);
        }
        (ScalarType::I32, Value::Int(v)) => {
            builder.push_slot_scalar(declared.index, *v as i32, default_int as i32);
        }
        (ScalarType::U64, Value::Int(v)) => {
            builder.push_slot_scalar(declared.index, *v as u64, default_int as u64);
        }
        (ScalarType::I64, Value::Int(v)) => {
            builder.push_slot_scalar(declared.index, *v, default_int);
        }
        (ScalarType::F32, Value::Float(v)) => {
            builder.push_slot_scalar(declared.index, *v as f32, default_float as f32);
        }
        (ScalarType::F64, Value::Float(v)) => {
            builder.push_slot_scalar(declared.index, *v, default_float);
        }
        (ScalarType::Bool, Value::Bool(v)) => {
            let default = matches!(declared.default, DefaultValue::Bool(true));
            builder.push_slot_scalar(declared.index, *v, default);
        }
        _ => return Err(mismatch(schema, declared.index)),
    }
    Ok(())
}

/// A lazy reader that interprets a table through its registered schema.
#[derive(Debug)]
pub struct DynamicRecord<'a> {
    schema: Arc<RecordSchema>,
    registry: &'a SchemaRegistry,
    table: Table<'a>,
}

/// Binds the root record of `buf` under the registered schema for `record`.
///
/// # Errors
///
/// Schema resolution and root binding faults.
pub fn decode_record<'a>(
    registry: &'a SchemaRegistry,
    record: &str,
    buf: &'a [u8],
) -> WireResult<DynamicRecord<'a>> {
    let schema = registry.resolve(record)?;
    let table = root_table(buf)?;
    Ok(DynamicRecord {
        schema,
        registry,
        table,
    })
}

impl DynamicRecord<'_> {
    /// The schema this reader interprets through.
    #[must_use]
    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    /// Reads one slot.
    ///
    /// Scalar slots always produce a value (the declared default when
    /// absent); reference slots produce `None` when absent.
    ///
    /// # Errors
    ///
    /// [`WireError::UnknownSlot`] for an undeclared slot, plus any
    /// resolution faults from the underlying accessor.
    pub fn get(&self, slot: u16) -> WireResult<Option<Value>> {
        let declared = lookup(&self.schema, slot)?;
        self.read_slot(self.table, declared)
    }

    /// Reads every declared slot: scalars always, references when present.
    ///
    /// # Errors
    ///
    /// As [`DynamicRecord::get`].
    pub fn read_all(&self) -> WireResult<Vec<(u16, Value)>> {
        read_all_fields(self.registry, &self.schema, self.table)
    }

    fn read_slot(&self, table: Table<'_>, declared: &FieldSlot) -> WireResult<Option<Value>> {
        read_one(self.registry, &self.schema, table, declared)
    }
}

fn read_all_fields(
    registry: &SchemaRegistry,
    schema: &RecordSchema,
    table: Table<'_>,
) -> WireResult<Vec<(u16, Value)>> {
    let mut fields = Vec::with_capacity(schema.slot_count());
    for declared in schema.slots() {
        if let Some(value) = read_one(registry, schema, table, declared)? {
            fields.push((declared.index, value));
        }
    }
    Ok(fields)
}

fn read_one(
    registry: &SchemaRegistry,
    schema: &RecordSchema,
    table: Table<'_>,
    declared: &FieldSlot,
) -> WireResult<Option<Value>> {
    match &declared.field_type {
        FieldType::Scalar(scalar) => read_scalar_slot(table, declared, *scalar).map(Some),
        FieldType::Text => Ok(table
            .get_string(declared.index)?
            .map(|text| Value::Text(text.to_string()))),
        FieldType::Record(name) => {
            let nested_schema = registry.resolve(name)?;
            match table.get_table(declared.index)? {
                None => Ok(None),
                Some(nested) => Ok(Some(Value::Record(read_all_fields(
                    registry,
                    &nested_schema,
                    nested,
                )?))),
            }
        }
        FieldType::Sequence(element) => {
            read_sequence_slot(registry, schema, table, declared, element)
        }
    }
}

fn read_sequence_slot(
    registry: &SchemaRegistry,
    schema: &RecordSchema,
    table: Table<'_>,
    declared: &FieldSlot,
    element: &FieldType,
) -> WireResult<Option<Value>> {
    match element {
        FieldType::Scalar(scalar) => read_scalar_sequence(table, declared, *scalar),
        FieldType::Text => match table.get_string_vector(declared.index)? {
            None => Ok(None),
            Some(vector) => {
                let mut items = Vec::with_capacity(vector.len());
                for index in 0..vector.len() {
                    items.push(Value::Text(vector.get(index)?.to_string()));
                }
                Ok(Some(Value::Sequence(items)))
            }
        },
        FieldType::Record(name) => {
            let nested_schema = registry.resolve(name)?;
            match table.get_table_vector(declared.index)? {
                None => Ok(None),
                Some(vector) => {
                    let mut items = Vec::with_capacity(vector.len());
                    for index in 0..vector.len() {
                        let nested = vector.get(index)?;
                        items.push(Value::Record(read_all_fields(
                            registry,
                            &nested_schema,
                            nested,
                        )?));
                    }
                    Ok(Some(Value::Sequence(items)))
                }
            }
        }
        FieldType::Sequence(_) => Err(mismatch(schema, declared.index)),
    }
}

fn read_scalar_slot(table: Table<'_>, declared: &FieldSlot, scalar: ScalarType) -> WireResult<Value> {
    let default_int = match declared.default {
        DefaultValue::Int(d) => d,
        _ => 0,
    };
    let default_float = match declared.default {
        DefaultValue::Float(d) => d,
        _ => 0.0,
    };

    Ok(match scalar {
        ScalarType::U8 => Value::Int(i64::from(
            table.get_scalar::<u8>(declared.index, default_int as u8)?,
        )),
        ScalarType::I8 => Value::Int(i64::from(
            table.get_scalar::<i8>(declared.index, default_int as i8)?,
        )),
        ScalarType::U16 => Value::Int(i64::from(
            table.get_scalar::<u16>(declared.index, default_int as u16)?,
        )),
        ScalarType::I16 => Value::Int(i64::from(
            table.get_scalar::<i16>(declared.index, default_int as i16)?,
        )),
        ScalarType::U32 => Value::Int(i64::from(
            table.get_scalar::<u32>(declared.index, default_int as u32)?,
        )),
        ScalarType::I32 => Value::Int(i64::from(
            table.get_scalar::<i32>(declared.index, default_int as i32)?,
        )),
        ScalarType::U64 => {
            Value::Int(table.get_scalar::<u64>(declared.index, default_int as u64)? as i64)
        }
        ScalarType::I64 => Value::Int(table.get_scalar::<i64>(declared.index, default_int)?),
        ScalarType::F32 => Value::Float(f64::from(
            table.get_scalar::<f32>(declared.index, default_float as f32)?,
        )),
        ScalarType::F64 => Value::Float(table.get_scalar::<f64>(declared.index, default_float)?),
        ScalarType::Bool => {
            let default = matches!(declared.default, DefaultValue::Bool(true));
            Value::Bool(table.get_scalar::<bool>(declared.index, default)?)
        }
    })
}

fn read_scalar_sequence(
    table: Table<'_>,
    declared: &FieldSlot,
    scalar: ScalarType,
) -> WireResult<Option<Value>> {
    macro_rules! collect_ints {
        ($ty:ty) => {
            table
                .get_vector::<$ty>(declared.index)?
                .map(|v| Value::Sequence(v.iter().map(|x| Value::Int(x as i64)).collect()))
        };
    }

    Ok(match scalar {
        ScalarType::U8 => collect_ints!(u8),
        ScalarType::I8 => collect_ints!(i8),
        ScalarType::U16 => collect_ints!(u16),
        ScalarType::I16 => collect_ints!(i16),
        ScalarType::U32 => collect_ints!(u32),
        ScalarType::I32 => collect_ints!(i32),
        ScalarType::U64 => collect_ints!(u64),
        ScalarType::I64 => table
            .get_vector::<i64>(declared.index)?
            .map(|v| Value::Sequence(v.iter().map(Value::Int).collect())),
        ScalarType::F32 => table
            .get_vector::<f32>(declared.index)?
            .map(|v| Value::Sequence(v.iter().map(|x| Value::Float(f64::from(x))).collect())),
        ScalarType::F64 => table
            .get_vector::<f64>(declared.index)?
            .map(|v| Value::Sequence(v.iter().map(Value::Float).collect())),
        ScalarType::Bool => table
            .get_vector::<bool>(declared.index)?
            .map(|v| Value::Sequence(v.iter().map(Value::Bool).collect())),
    })
}

fn lookup<'s>(schema: &'s RecordSchema, slot: u16) -> WireResult<&'s FieldSlot> {
    schema.slot(slot).ok_or_else(|| WireError::UnknownSlot {
        record: schema.name.clone(),
        slot,
    })
}

fn mismatch(schema: &RecordSchema, slot: u16) -> WireError {
    WireError::ValueMismatch {
        record: schema.name.clone(),
        slot,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_schema::FieldSlot;

    fn registry() -> SchemaRegistry {
        let registry = SchemaRegistry::new();
        registry
            .register(
                RecordSchema::new(
                    "Vec2",
                    vec![
                        FieldSlot::new(0, "x", FieldType::Scalar(ScalarType::F32))
                            .with_default(DefaultValue::Float(0.0)),
                        FieldSlot::new(1, "y", FieldType::Scalar(ScalarType::F32))
                            .with_default(DefaultValue::Float(0.0)),
                    ],
                )
                .unwrap(),
            )
            .unwrap();
        registry
            .register(
                RecordSchema::new(
                    "PlayerState",
                    vec![
                        FieldSlot::new(0, "player_id", FieldType::Text),
                        FieldSlot::new(1, "position", FieldType::Record("Vec2".to_string())),
                        FieldSlot::new(2, "score", FieldType::Scalar(ScalarType::U32))
                            .with_default(DefaultValue::Int(0)),
                        FieldSlot::new(
                            3,
                            "recent_pings",
                            FieldType::Sequence(Box::new(FieldType::Scalar(ScalarType::U16))),
                        ),
                    ],
                )
                .unwrap(),
            )
            .unwrap();
        registry
    }

    #[test]
    fn dynamic_round_trip() {
        let registry = registry();
        let buf = encode_record(
            &registry,
            "PlayerState",
            &[
                (0, Value::Text("p-42".to_string())),
                (
                    1,
                    Value::Record(vec![(0, Value::Float(1.5)), (1, Value::Float(-2.0))]),
                ),
                (2, Value::Int(180)),
                (
                    3,
                    Value::Sequence(vec![Value::Int(32), Value::Int(41), Value::Int(28)]),
                ),
            ],
        )
        .unwrap();

        let record = decode_record(&registry, "PlayerState", &buf).unwrap();
        assert_eq!(
            record.get(0).unwrap(),
            Some(Value::Text("p-42".to_string()))
        );
        assert_eq!(
            record.get(1).unwrap(),
            Some(Value::Record(vec![
                (0, Value::Float(1.5)),
                (1, Value::Float(-2.0)),
            ]))
        );
        assert_eq!(record.get(2).unwrap(), Some(Value::Int(180)));
        assert_eq!(
            record.get(3).unwrap(),
            Some(Value::Sequence(vec![
                Value::Int(32),
                Value::Int(41),
                Value::Int(28),
            ]))
        );
    }

    #[test]
    fn absent_slots_follow_the_schema() {
        let registry = registry();
        let buf = encode_record(&registry, "PlayerState", &[(2, Value::Int(0))]).unwrap();

        let record = decode_record(&registry, "PlayerState", &buf).unwrap();
        // Scalar at its default was pruned yet reads back as the default.
        assert_eq!(record.get(2).unwrap(), Some(Value::Int(0)));
        // Absent references read as None.
        assert_eq!(record.get(0).unwrap(), None);
        assert_eq!(record.get(1).unwrap(), None);
        assert_eq!(record.get(3).unwrap(), None);
    }

    #[test]
    fn read_all_skips_absent_references() {
        let registry = registry();
        let buf = encode_record(
            &registry,
            "PlayerState",
            &[(0, Value::Text("p-7".to_string()))],
        )
        .unwrap();

        let record = decode_record(&registry, "PlayerState", &buf).unwrap();
        assert_eq!(
            record.read_all().unwrap(),
            vec![
                (0, Value::Text("p-7".to_string())),
                (2, Value::Int(0)),
            ]
        );
    }

    #[test]
    fn mismatched_value_is_rejected() {
        let registry = registry();
        let err = encode_record(&registry, "PlayerState", &[(2, Value::Text("no".into()))])
            .unwrap_err();
        assert_eq!(
            err,
            WireError::ValueMismatch {
                record: "PlayerState".to_string(),
                slot: 2,
            }
        );
    }

    #[test]
    fn undeclared_slot_is_rejected() {
        let registry = registry();
        let err = encode_record(&registry, "PlayerState", &[(9, Value::Int(1))]).unwrap_err();
        assert_eq!(
            err,
            WireError::UnknownSlot {
                record: "PlayerState".to_string(),
                slot: 9,
            }
        );
    }

    #[test]
    fn unknown_record_is_rejected() {
        let registry = registry();
        assert!(matches!(
            encode_record(&registry, "Ghost", &[]).unwrap_err(),
            WireError::Schema(_)
        ));
    }
}
