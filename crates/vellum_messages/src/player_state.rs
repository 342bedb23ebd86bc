//! # Player State Message
//!
//! Server -> Client: one player's replicated state.
//!
//! The position rides as a nested record so future spatial fields (facing,
//! velocity) append to the Vec2 record without touching this message's
//! slots.

use vellum_schema::{DefaultValue, FieldSlot, FieldType, RecordSchema, ScalarType};
use vellum_wire::{root_table, Builder, Table, WireOffset, WireResult};

use crate::math::Vec2;

/// Lazy accessor over a received position record.
#[derive(Clone, Copy, Debug)]
pub struct Vec2Ref<'a> {
    table: Table<'a>,
}

impl<'a> Vec2Ref<'a> {
    /// Slot: X component.
    pub const SLOT_X: u16 = 0;
    /// Slot: Y component.
    pub const SLOT_Y: u16 = 1;
    /// Declared slots.
    pub const SLOT_COUNT: u16 = 2;

    /// Wraps an already-bound record.
    #[must_use]
    pub const fn from_table(table: Table<'a>) -> Self {
        Self { table }
    }

    /// The X component.
    ///
    /// # Errors
    ///
    /// Field resolution faults.
    pub fn x(&self) -> WireResult<f32> {
        self.table.get_scalar(Self::SLOT_X, 0.0)
    }

    /// The Y component.
    ///
    /// # Errors
    ///
    /// Field resolution faults.
    pub fn y(&self) -> WireResult<f32> {
        self.table.get_scalar(Self::SLOT_Y, 0.0)
    }

    /// Materializes the math type.
    ///
    /// # Errors
    ///
    /// Field resolution faults.
    pub fn value(&self) -> WireResult<Vec2> {
        Ok(Vec2::new(self.x()?, self.y()?))
    }

    /// Writes one position record into `builder`.
    pub fn encode(builder: &mut Builder, position: Vec2) -> WireOffset {
        builder.start_table(Self::SLOT_COUNT);
        builder.push_slot_scalar(Self::SLOT_X, position.x, 0.0);
        builder.push_slot_scalar(Self::SLOT_Y, position.y, 0.0);
        builder.end_table()
    }

    /// The resolved slot table for this record type.
    ///
    /// # Panics
    ///
    /// Never - the definition is validated at compile-fixed indices.
    #[must_use]
    pub fn schema() -> RecordSchema {
        RecordSchema::new(
            "Vec2",
            vec![
                FieldSlot::new(Self::SLOT_X, "x", FieldType::Scalar(ScalarType::F32))
                    .with_default(DefaultValue::Float(0.0)),
                FieldSlot::new(Self::SLOT_Y, "y", FieldType::Scalar(ScalarType::F32))
                    .with_default(DefaultValue::Float(0.0)),
            ],
        )
        .expect("vec2 slot table is declaration-ordered")
    }
}

/// Lazy accessor over a received player state.
#[derive(Clone, Copy, Debug)]
pub struct PlayerState<'a> {
    table: Table<'a>,
}

impl<'a> PlayerState<'a> {
    /// Slot: player identifier.
    pub const SLOT_PLAYER_ID: u16 = 0;
    /// Slot: current world position.
    pub const SLOT_POSITION: u16 = 1;
    /// Slot: current score.
    pub const SLOT_SCORE: u16 = 2;
    /// Declared slots.
    pub const SLOT_COUNT: u16 = 3;

    /// Binds the root record of a finished buffer.
    ///
    /// # Errors
    ///
    /// Root resolution faults.
    pub fn read(buf: &'a [u8]) -> WireResult<Self> {
        Ok(Self {
            table: root_table(buf)?,
        })
    }

    /// The player identifier; `None` if the writer omitted it.
    ///
    /// # Errors
    ///
    /// Field resolution faults.
    pub fn player_id(&self) -> WireResult<Option<&'a str>> {
        self.table.get_string(Self::SLOT_PLAYER_ID)
    }

    /// The world position; `None` if the writer omitted it.
    ///
    /// # Errors
    ///
    /// Field resolution faults.
    pub fn position(&self) -> WireResult<Option<Vec2Ref<'a>>> {
        Ok(self
            .table
            .get_table(Self::SLOT_POSITION)?
            .map(Vec2Ref::from_table))
    }

    /// The current score.
    ///
    /// # Errors
    ///
    /// Field resolution faults.
    pub fn score(&self) -> WireResult<u32> {
        self.table.get_scalar(Self::SLOT_SCORE, 0)
    }

    /// Writes one player-state record (position first) into `builder`.
    pub fn encode(
        builder: &mut Builder,
        player_id: &str,
        position: Vec2,
        score: u32,
    ) -> WireOffset {
        let player_id = builder.create_string(player_id);
        let position = Vec2Ref::encode(builder, position);
        builder.start_table(Self::SLOT_COUNT);
        builder.push_slot_scalar(Self::SLOT_SCORE, score, 0);
        builder.push_slot_offset(Self::SLOT_POSITION, position);
        builder.push_slot_offset(Self::SLOT_PLAYER_ID, player_id);
        builder.end_table()
    }

    /// Builds a complete, finished buffer holding one player state.
    #[must_use]
    pub fn build(player_id: &str, position: Vec2, score: u32) -> Vec<u8> {
        let mut builder = Builder::new();
        let root = Self::encode(&mut builder, player_id, position, score);
        builder.finish(root);
        builder.finished_data().to_vec()
    }

    /// The resolved slot table for this message type.
    ///
    /// # Panics
    ///
    /// Never - the definition is validated at compile-fixed indices.
    #[must_use]
    pub fn schema() -> RecordSchema {
        RecordSchema::new(
            "PlayerState",
            vec![
                FieldSlot::new(Self::SLOT_PLAYER_ID, "player_id", FieldType::Text),
                FieldSlot::new(
                    Self::SLOT_POSITION,
                    "position",
                    FieldType::Record("Vec2".to_string()),
                ),
                FieldSlot::new(Self::SLOT_SCORE, "score", FieldType::Scalar(ScalarType::U32))
                    .with_default(DefaultValue::Int(0)),
            ],
        )
        .expect("player state slot table is declaration-ordered")
    }
}
