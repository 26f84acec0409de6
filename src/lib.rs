//! Quadrant Server Library
//!
//! The authoritative real-time simulation core of a four-team multiplayer
//! space-combat game. Owns the shared galaxy state, advances it on a fixed
//! 10 Hz tick, resolves weapons fire and collisions, and drives autonomous
//! bot combatants.
//!
//! The network transport is not part of this crate; the session layer ends
//! at typed commands in and a broadcast event stream out.

pub mod config;
pub mod util;
pub mod game;
pub mod net;
