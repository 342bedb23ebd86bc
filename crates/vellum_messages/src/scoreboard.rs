//! # Scoreboard Messages
//!
//! Server -> Client: per-team standings, broadcast at round boundaries.
//!
//! Entries ride as a sequence of two-field records. Most entries in a match
//! share a field-presence pattern, so their vtables collapse to one on the
//! wire - a scoreboard of N teams pays for N tables but only one or two
//! vtables.

use vellum_schema::{DefaultValue, FieldSlot, FieldType, RecordSchema, ScalarType};
use vellum_wire::{root_table, Builder, Table, TableVector, WireOffset, WireResult};

/// One team's standing, builder-side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TeamScore {
    /// Team identifier.
    pub team_id: u32,
    /// Accumulated score.
    pub score: u32,
}

impl TeamScore {
    /// Creates a standing entry.
    #[must_use]
    pub const fn new(team_id: u32, score: u32) -> Self {
        Self { team_id, score }
    }
}

/// Lazy accessor over one received score entry.
#[derive(Clone, Copy, Debug)]
pub struct TeamScoreEntry<'a> {
    table: Table<'a>,
}

impl<'a> TeamScoreEntry<'a> {
    /// Slot: team identifier.
    pub const SLOT_TEAM_ID: u16 = 0;
    /// Slot: accumulated score.
    pub const SLOT_SCORE: u16 = 1;
    /// Declared slots.
    pub const SLOT_COUNT: u16 = 2;

    /// Wraps an already-bound record.
    #[must_use]
    pub const fn from_table(table: Table<'a>) -> Self {
        Self { table }
    }

    /// The team identifier.
    ///
    /// # Errors
    ///
    /// Field resolution faults.
    pub fn team_id(&self) -> WireResult<u32> {
        self.table.get_scalar(Self::SLOT_TEAM_ID, 0)
    }

    /// The accumulated score.
    ///
    /// # Errors
    ///
    /// Field resolution faults.
    pub fn score(&self) -> WireResult<u32> {
        self.table.get_scalar(Self::SLOT_SCORE, 0)
    }

    /// Writes one entry record into `builder`.
    pub fn encode(builder: &mut Builder, entry: TeamScore) -> WireOffset {
        builder.start_table(Self::SLOT_COUNT);
        builder.push_slot_scalar(Self::SLOT_TEAM_ID, entry.team_id, 0);
        builder.push_slot_scalar(Self::SLOT_SCORE, entry.score, 0);
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
            "TeamScoreEntry",
            vec![
                FieldSlot::new(
                    Self::SLOT_TEAM_ID,
                    "team_id",
                    FieldType::Scalar(ScalarType::U32),
                )
                .with_default(DefaultValue::Int(0)),
                FieldSlot::new(Self::SLOT_SCORE, "score", FieldType::Scalar(ScalarType::U32))
                    .with_default(DefaultValue::Int(0)),
            ],
        )
        .expect("score entry slot table is declaration-ordered")
    }
}

/// Lazy accessor over a received scoreboard.
#[derive(Clone, Copy, Debug)]
pub struct Scoreboard<'a> {
    table: Table<'a>,
}

impl<'a> Scoreboard<'a> {
    /// Slot: the sequence of entries.
    pub const SLOT_ENTRIES: u16 = 0;
    /// Declared slots.
    pub const SLOT_COUNT: u16 = 1;

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

    /// The entry sequence; `None` if the writer omitted it.
    ///
    /// # Errors
    ///
    /// Field resolution faults.
    pub fn entries(&self) -> WireResult<Option<TableVector<'a>>> {
        self.table.get_table_vector(Self::SLOT_ENTRIES)
    }

    /// Writes one scoreboard record (entries first) into `builder`.
    pub fn encode(builder: &mut Builder, standings: &[TeamScore]) -> WireOffset {
        let entries: Vec<WireOffset> = standings
            .iter()
            .map(|entry| TeamScoreEntry::encode(builder, *entry))
            .collect();
        let entries = builder.create_vector_of_offsets(&entries);
        builder.start_table(Self::SLOT_COUNT);
        builder.push_slot_offset(Self::SLOT_ENTRIES, entries);
        builder.end_table()
    }

    /// Builds a complete, finished buffer holding one scoreboard.
    #[must_use]
    pub fn build(standings: &[TeamScore]) -> Vec<u8> {
        let mut builder = Builder::new();
        let root = Self::encode(&mut builder, standings);
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
            "Scoreboard",
            vec![FieldSlot::new(
                Self::SLOT_ENTRIES,
                "entries",
                FieldType::Sequence(Box::new(FieldType::Record("TeamScoreEntry".to_string()))),
            )],
        )
        .expect("scoreboard slot table is declaration-ordered")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoreboard_round_trip() {
        let buf = Scoreboard::build(&[
            TeamScore::new(1, 10),
            TeamScore::new(2, 7),
            TeamScore::new(3, 0),
        ]);

        let board = Scoreboard::read(&buf).unwrap();
        let entries = board.entries().unwrap().unwrap();
        assert_eq!(entries.len(), 3);

        let entry = |i| TeamScoreEntry::from_table(entries.get(i).unwrap());
        assert_eq!(entry(0).team_id().unwrap(), 1);
        assert_eq!(entry(0).score().unwrap(), 10);
        assert_eq!(entry(1).score().unwrap(), 7);
        // Entry 3's score was pruned as a default - it still reads 0.
        assert_eq!(entry(2).team_id().unwrap(), 3);
        assert_eq!(entry(2).score().unwrap(), 0);
    }

    #[test]
    fn empty_scoreboard() {
        let buf = Scoreboard::build(&[]);
        let board = Scoreboard::read(&buf).unwrap();
        assert_eq!(board.entries().unwrap().unwrap().len(), 0);
    }
}
