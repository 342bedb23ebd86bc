//! # Welcome Message
//!
//! Server -> Client: the handshake acknowledgment.
//!
//! Carries the assigned player identifier, a free-text greeting, and the
//! server's tick rate so the client can pace its prediction loop.

use vellum_schema::{DefaultValue, FieldSlot, FieldType, RecordSchema, ScalarType};
use vellum_wire::{root_table, Builder, Table, WireOffset, WireResult};

/// Lazy accessor over a received welcome message.
#[derive(Clone, Copy, Debug)]
pub struct Welcome<'a> {
    table: Table<'a>,
}

impl<'a> Welcome<'a> {
    /// Slot: assigned player identifier.
    pub const SLOT_PLAYER_ID: u16 = 0;
    /// Slot: free-text greeting.
    pub const SLOT_MESSAGE: u16 = 1;
    /// Slot: server simulation rate in ticks per second.
    pub const SLOT_SERVER_TICK_RATE: u16 = 2;
    /// Declared slots.
    pub const SLOT_COUNT: u16 = 3;

    /// Declared default for the tick-rate slot.
    pub const DEFAULT_SERVER_TICK_RATE: u16 = 0;

    /// Binds the root record of a finished buffer.
    ///
    /// # Errors
    ///
    /// Root resolution faults; see [`vellum_wire::WireError`].
    pub fn read(buf: &'a [u8]) -> WireResult<Self> {
        Ok(Self {
            table: root_table(buf)?,
        })
    }

    /// Wraps an already-bound record, e.g. one nested in another message.
    #[must_use]
    pub const fn from_table(table: Table<'a>) -> Self {
        Self { table }
    }

    /// The assigned player identifier; `None` if the writer omitted it.
    ///
    /// # Errors
    ///
    /// Field resolution faults.
    pub fn player_id(&self) -> WireResult<Option<&'a str>> {
        self.table.get_string(Self::SLOT_PLAYER_ID)
    }

    /// The free-text greeting; `None` if the writer omitted it.
    ///
    /// # Errors
    ///
    /// Field resolution faults.
    pub fn message(&self) -> WireResult<Option<&'a str>> {
        self.table.get_string(Self::SLOT_MESSAGE)
    }

    /// The server tick rate.
    ///
    /// # Errors
    ///
    /// Field resolution faults.
    pub fn server_tick_rate(&self) -> WireResult<u16> {
        self.table
            .get_scalar(Self::SLOT_SERVER_TICK_RATE, Self::DEFAULT_SERVER_TICK_RATE)
    }

    /// Writes one welcome record into `builder`, children first.
    pub fn encode(
        builder: &mut Builder,
        player_id: &str,
        message: &str,
        server_tick_rate: u16,
    ) -> WireOffset {
        let player_id = builder.create_string(player_id);
        let message = builder.create_string(message);
        builder.start_table(Self::SLOT_COUNT);
        builder.push_slot_scalar(
            Self::SLOT_SERVER_TICK_RATE,
            server_tick_rate,
            Self::DEFAULT_SERVER_TICK_RATE,
        );
        builder.push_slot_offset(Self::SLOT_MESSAGE, message);
        builder.push_slot_offset(Self::SLOT_PLAYER_ID, player_id);
        builder.end_table()
    }

    /// Builds a complete, finished buffer holding one welcome message.
    #[must_use]
    pub fn build(player_id: &str, message: &str, server_tick_rate: u16) -> Vec<u8> {
        let mut builder = Builder::new();
        let root = Self::encode(&mut builder, player_id, message, server_tick_rate);
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
            "Welcome",
            vec![
                FieldSlot::new(Self::SLOT_PLAYER_ID, "player_id", FieldType::Text),
                FieldSlot::new(Self::SLOT_MESSAGE, "message", FieldType::Text),
                FieldSlot::new(
                    Self::SLOT_SERVER_TICK_RATE,
                    "server_tick_rate",
                    FieldType::Scalar(ScalarType::U16),
                )
                .with_default(DefaultValue::Int(i64::from(Self::DEFAULT_SERVER_TICK_RATE))),
            ],
        )
        .expect("welcome slot table is declaration-ordered")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welcome_round_trip() {
        let buf = Welcome::build("p-42", "welcome", 60);
        let welcome = Welcome::read(&buf).unwrap();
        assert_eq!(welcome.player_id().unwrap(), Some("p-42"));
        assert_eq!(welcome.message().unwrap(), Some("welcome"));
        assert_eq!(welcome.server_tick_rate().unwrap(), 60);
    }

    #[test]
    fn default_tick_rate_is_pruned() {
        let explicit = Welcome::build("p-1", "hi", 60);
        let defaulted = Welcome::build("p-1", "hi", Welcome::DEFAULT_SERVER_TICK_RATE);
        assert!(defaulted.len() < explicit.len());

        let welcome = Welcome::read(&defaulted).unwrap();
        assert_eq!(
            welcome.server_tick_rate().unwrap(),
            Welcome::DEFAULT_SERVER_TICK_RATE
        );
    }
}
