//! # Message Schema Registration
//!
//! The compile-time-fixed record kinds of the protocol and their entry into
//! a shared [`SchemaRegistry`].

use vellum_schema::{RecordSchema, SchemaRegistry, SchemaResult};

use crate::player_state::{PlayerState, Vec2Ref};
use crate::scoreboard::{Scoreboard, TeamScoreEntry};
use crate::welcome::Welcome;

/// Every record kind the protocol exchanges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// 2D vector record nested in spatial messages.
    Vec2,
    /// Handshake acknowledgment.
    Welcome,
    /// One team's standing.
    TeamScoreEntry,
    /// Per-team standings broadcast.
    Scoreboard,
    /// One player's replicated state.
    PlayerState,
}

impl MessageKind {
    /// All kinds, in registration order (nested records first).
    pub const ALL: [Self; 5] = [
        Self::Vec2,
        Self::Welcome,
        Self::TeamScoreEntry,
        Self::Scoreboard,
        Self::PlayerState,
    ];

    /// The record type name used on the registry.
    #[must_use]
    pub const fn record_name(self) -> &'static str {
        match self {
            Self::Vec2 => "Vec2",
            Self::Welcome => "Welcome",
            Self::TeamScoreEntry => "TeamScoreEntry",
            Self::Scoreboard => "Scoreboard",
            Self::PlayerState => "PlayerState",
        }
    }

    /// The resolved slot table for this kind.
    #[must_use]
    pub fn schema(self) -> RecordSchema {
        match self {
            Self::Vec2 => Vec2Ref::schema(),
            Self::Welcome => Welcome::schema(),
            Self::TeamScoreEntry => TeamScoreEntry::schema(),
            Self::Scoreboard => Scoreboard::schema(),
            Self::PlayerState => PlayerState::schema(),
        }
    }
}

/// Registers every protocol record into `registry`.
///
/// Safe to call from several subsystems - identical re-registration is a
/// no-op.
///
/// # Errors
///
/// [`vellum_schema::SchemaError::ConflictingRegistration`] if a foreign
/// schema already claimed one of the protocol's record names.
pub fn register_all(registry: &SchemaRegistry) -> SchemaResult<()> {
    for kind in MessageKind::ALL {
        registry.register(kind.schema())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_every_kind_under_its_name() {
        let registry = SchemaRegistry::new();
        register_all(&registry).unwrap();
        assert_eq!(registry.len(), MessageKind::ALL.len());

        for kind in MessageKind::ALL {
            let schema = registry.resolve(kind.record_name()).unwrap();
            assert_eq!(schema.name, kind.record_name());
        }
    }

    #[test]
    fn re_registration_from_another_subsystem_is_fine() {
        let registry = SchemaRegistry::new();
        register_all(&registry).unwrap();
        register_all(&registry).unwrap();
        assert_eq!(registry.len(), MessageKind::ALL.len());
    }
}
