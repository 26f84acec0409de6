//! Events emitted by the simulation during a tick.
//!
//! These are internal notifications; the session layer translates them into
//! the wire-level broadcast stream.

use crate::game::state::{PlanetId, PlayerId, ProjectileKind, Team, VictoryOutcome};
use crate::util::vec2::Vec2;

/// What a phaser shot ended up hitting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaserHit {
    Miss,
    Ship(PlayerId),
    /// An enemy plasma was destroyed; the shot resolves no further
    Plasma,
}

/// One simulation event
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    TorpedoLaunched {
        owner: PlayerId,
        pos: Vec2,
        heading: f32,
    },
    PlasmaLaunched {
        owner: PlayerId,
        pos: Vec2,
        heading: f32,
    },
    PhaserFired {
        owner: PlayerId,
        heading: f32,
        hit: PhaserHit,
    },
    ProjectileDetonated {
        kind: ProjectileKind,
        pos: Vec2,
    },
    ShipDestroyed {
        victim: PlayerId,
        killer: Option<PlayerId>,
    },
    PlanetBombed {
        planet: PlanetId,
        by: PlayerId,
        armies_left: u32,
    },
    PlanetCaptured {
        planet: PlanetId,
        team: Team,
    },
    TournamentStarted,
    TournamentTimeRemaining {
        secs: u64,
    },
    TournamentCancelled,
    Victory {
        outcome: VictoryOutcome,
    },
    GalaxyReset,
}
