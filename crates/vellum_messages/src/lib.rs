//! # VELLUM Messages
//!
//! The typed message surface of the multiplayer protocol.
//!
//! ## What Lives Here
//!
//! Every message both client and server exchange, as thin wrappers over the
//! wire engine: a builder-side `encode` per type and a lazy accessor that
//! resolves fields straight out of the received bytes.
//!
//! ## CRITICAL RULE
//!
//! Slot indices are the wire contract. They are append-only: never reuse,
//! never reorder. A renamed field is free; a renumbered field is a protocol
//! break against every shipped client.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod math;
pub mod player_state;
pub mod schemas;
pub mod scoreboard;
pub mod welcome;

pub use math::Vec2;
pub use player_state::{PlayerState, Vec2Ref};
pub use schemas::{register_all, MessageKind};
pub use scoreboard::{Scoreboard, TeamScore, TeamScoreEntry};
pub use welcome::Welcome;
