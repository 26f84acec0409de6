//! Wire-level command and event types
//!
//! `GameCommand` is the validated input boundary: the transport layer has
//! already normalized directions and range-checked ids before anything
//! reaches the core, which still re-checks actor status and no-ops
//! silently. `ServerEvent` is the typed broadcast stream pushed to every
//! consumer's bounded outbox.

use serde::{Deserialize, Serialize};

use crate::game::events::{GameEvent, PhaserHit};
use crate::game::ships::ShipClass;
use crate::game::state::{
    BeamDirection, Galaxy, GamePhase, PlanetId, PlayerId, PlayerStatus, ProjectileKind,
    ProjectileStatus, Team, VictoryKind,
};
use crate::game::systems::weapons::PhaserAim;
use crate::util::vec2::Vec2;

/// A validated command from a connected player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameCommand {
    /// Set desired course and speed
    SetCourse { heading: f32, speed: f32 },
    FireTorpedo { heading: f32 },
    FirePlasma { heading: f32 },
    FirePhaser { aim: PhaserAim },
    ToggleShields,
    ToggleCloak,
    ToggleRepair,
    /// Enter orbit around the nearest planet in range
    Orbit,
    ToggleBomb,
    Beam { direction: BeamDirection },
    LockPlanet { planet: PlanetId },
    LockPlayer { player: PlayerId },
    Tractor { target: PlayerId },
    Pressor { target: PlayerId },
    TractorOff,
    /// Detonate own torpedoes in flight
    Detonate,
    Quit,
}

/// Typed notification broadcast to every consumer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServerEvent {
    /// Periodic full state snapshot
    Snapshot(GalaxySnapshot),
    TorpedoFired {
        owner: PlayerId,
        pos: Vec2,
        heading: f32,
    },
    PlasmaFired {
        owner: PlayerId,
        pos: Vec2,
        heading: f32,
    },
    PhaserBeam {
        owner: PlayerId,
        heading: f32,
        hit_ship: Option<PlayerId>,
        hit_plasma: bool,
    },
    Explosion {
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
    PlayerJoined {
        player: PlayerId,
        name: String,
        team: Team,
    },
    PlayerLeft {
        player: PlayerId,
    },
    /// Chat and system announcements
    Message {
        text: String,
    },
    TournamentStarted,
    TournamentTimeRemaining {
        secs: u64,
    },
    TournamentCancelled,
    Victory {
        kind: VictoryKind,
        winners: Vec<Team>,
    },
    GalaxyReset,
}

impl From<GameEvent> for ServerEvent {
    fn from(event: GameEvent) -> Self {
        match event {
            GameEvent::TorpedoLaunched { owner, pos, heading } => {
                ServerEvent::TorpedoFired { owner, pos, heading }
            }
            GameEvent::PlasmaLaunched { owner, pos, heading } => {
                ServerEvent::PlasmaFired { owner, pos, heading }
            }
            GameEvent::PhaserFired { owner, heading, hit } => {
                let (hit_ship, hit_plasma) = match hit {
                    PhaserHit::Ship(id) => (Some(id), false),
                    PhaserHit::Plasma => (None, true),
                    PhaserHit::Miss => (None, false),
                };
                ServerEvent::PhaserBeam {
                    owner,
                    heading,
                    hit_ship,
                    hit_plasma,
                }
            }
            GameEvent::ProjectileDetonated { kind, pos } => ServerEvent::Explosion { kind, pos },
            GameEvent::ShipDestroyed { victim, killer } => {
                ServerEvent::ShipDestroyed { victim, killer }
            }
            GameEvent::PlanetBombed {
                planet,
                by,
                armies_left,
            } => ServerEvent::PlanetBombed {
                planet,
                by,
                armies_left,
            },
            GameEvent::PlanetCaptured { planet, team } => {
                ServerEvent::PlanetCaptured { planet, team }
            }
            GameEvent::TournamentStarted => ServerEvent::TournamentStarted,
            GameEvent::TournamentTimeRemaining { secs } => {
                ServerEvent::TournamentTimeRemaining { secs }
            }
            GameEvent::TournamentCancelled => ServerEvent::TournamentCancelled,
            GameEvent::Victory { outcome } => ServerEvent::Victory {
                kind: outcome.kind,
                winners: outcome.winners,
            },
            GameEvent::GalaxyReset => ServerEvent::GalaxyReset,
        }
    }
}

/// Player state as broadcast to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub team: Team,
    pub class: ShipClass,
    pub status: PlayerStatus,
    pub pos: Vec2,
    pub heading: f32,
    pub speed: f32,
    pub shields_up: bool,
    pub cloaked: bool,
    pub orbiting: Option<PlanetId>,
    pub armies: u32,
    pub kills: f32,
    pub deaths: u32,
    pub damage_fraction: f32,
}

/// Planet state as broadcast to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetSnapshot {
    pub id: PlanetId,
    pub name: String,
    pub pos: Vec2,
    pub owner: Option<Team>,
    pub armies: u32,
}

/// Projectile state as broadcast to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    pub kind: ProjectileKind,
    pub team: Team,
    pub pos: Vec2,
    pub heading: f32,
    pub status: ProjectileStatus,
}

/// Full galaxy snapshot, captured under the state lock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalaxySnapshot {
    pub frame: u64,
    pub phase: GamePhase,
    pub tourney_remaining_secs: u64,
    pub players: Vec<PlayerSnapshot>,
    pub planets: Vec<PlanetSnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
}

impl GalaxySnapshot {
    pub fn capture(galaxy: &Galaxy) -> Self {
        Self {
            frame: galaxy.frame,
            phase: galaxy.phase,
            tourney_remaining_secs: galaxy.tourney_remaining
                / crate::game::constants::time::TICK_RATE as u64,
            players: galaxy
                .players
                .iter()
                .filter(|p| p.is_occupied())
                .map(|p| PlayerSnapshot {
                    id: p.id,
                    name: p.name.clone(),
                    team: p.team,
                    class: p.class,
                    status: p.status,
                    pos: p.pos,
                    heading: p.heading,
                    speed: p.speed,
                    shields_up: p.shields_up,
                    cloaked: p.cloaked,
                    orbiting: p.orbiting,
                    armies: p.armies,
                    kills: p.kills,
                    deaths: p.deaths,
                    damage_fraction: p.damage_fraction(),
                })
                .collect(),
            planets: galaxy
                .planets
                .iter()
                .map(|pl| PlanetSnapshot {
                    id: pl.id,
                    name: pl.name.clone(),
                    pos: pl.pos,
                    owner: pl.owner,
                    armies: pl.armies,
                })
                .collect(),
            projectiles: galaxy
                .projectiles
                .iter()
                .filter(|t| t.status != ProjectileStatus::Consumed)
                .map(|t| ProjectileSnapshot {
                    kind: t.kind,
                    team: t.team,
                    pos: t.pos,
                    heading: t.heading,
                    status: t.status,
                })
                .collect(),
        }
    }
}

/// Encode a server event for the wire
pub fn encode(event: &ServerEvent) -> Result<Vec<u8>, bincode::error::EncodeError> {
    bincode::serde::encode_to_vec(event, bincode::config::standard())
}

/// Decode a server event from the wire
pub fn decode(bytes: &[u8]) -> Result<ServerEvent, bincode::error::DecodeError> {
    let (event, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
    Ok(event)
}
