//! Galaxy state definitions and structures
//!
//! Contains the fixed player and planet tables, projectiles, per-team
//! counters and tournament fields. The whole aggregate is owned by the
//! simulation loop and only mutated under its lock.

// Allow dead_code for accessor methods that are part of the public API
#![allow(dead_code)]

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::game::constants::{galaxy, orbit, planets as planet_rules};
use crate::game::ships::{ShipClass, ShipStats, ShipTable};
use crate::util::vec2::Vec2;

/// Dense player slot index
pub type PlayerId = u8;

/// Dense planet slot index
pub type PlanetId = u8;

/// The four combatant teams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Federation,
    Romulan,
    Klingon,
    Orion,
}

impl Team {
    pub const COUNT: usize = 4;
    pub const ALL: [Team; 4] = [Team::Federation, Team::Romulan, Team::Klingon, Team::Orion];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Team::Federation => 0,
            Team::Romulan => 1,
            Team::Klingon => 2,
            Team::Orion => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Team::Federation => "Federation",
            Team::Romulan => "Romulan",
            Team::Klingon => "Klingon",
            Team::Orion => "Orion",
        }
    }
}

/// Player slot lifecycle. Exactly one state holds at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerStatus {
    /// Slot unoccupied
    Free,
    /// Slot claimed, ship not yet launched
    Outfit,
    /// In play
    Alive,
    /// Destroyed, explosion animation running
    Explode,
    /// Explosion finished, awaiting re-outfit or slot release
    Dead,
}

/// Army transfer direction while beaming
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeamDirection {
    Up,
    Down,
}

/// Tractor beam polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TractorMode {
    /// Pull the target toward us
    Tractor,
    /// Push the target away
    Pressor,
}

/// Navigation lock target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockTarget {
    Planet(PlanetId),
    Player(PlayerId),
}

/// Player state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    // Kinematics (hot path, touched every tick)
    pub pos: Vec2,
    pub heading: f32,
    pub des_heading: f32,
    pub speed: f32,
    pub des_speed: f32,

    // Resources
    pub shields: f32,
    pub hull_damage: f32,
    pub fuel: f32,
    pub weapon_heat: f32,

    // Status and combat-mode flags
    pub status: PlayerStatus,
    pub shields_up: bool,
    pub cloaked: bool,
    pub repairing: bool,
    pub bombing: bool,
    pub orbiting: Option<PlanetId>,
    pub beaming: Option<BeamDirection>,
    pub tractor: Option<(TractorMode, PlayerId)>,
    pub lock: Option<LockTarget>,
    pub armies: u32,
    pub explode_timer: u32,
    /// Ticks until a dead ship may re-outfit
    pub respawn_timer: u32,

    // Bookkeeping
    pub kills: f32,
    pub kills_since_death: f32,
    pub deaths: u32,
    pub connected: bool,
    pub is_bot: bool,

    // Identity (cold)
    pub id: PlayerId,
    pub name: String,
    pub team: Team,
    pub class: ShipClass,
    pub stats: ShipStats,
}

impl Player {
    /// An unoccupied slot
    pub fn free_slot(id: PlayerId) -> Self {
        let table = ShipTable::builtin();
        Self {
            pos: Vec2::ZERO,
            heading: 0.0,
            des_heading: 0.0,
            speed: 0.0,
            des_speed: 0.0,
            shields: 0.0,
            hull_damage: 0.0,
            fuel: 0.0,
            weapon_heat: 0.0,
            status: PlayerStatus::Free,
            shields_up: false,
            cloaked: false,
            repairing: false,
            bombing: false,
            orbiting: None,
            beaming: None,
            tractor: None,
            lock: None,
            armies: 0,
            explode_timer: 0,
            respawn_timer: 0,
            kills: 0.0,
            kills_since_death: 0.0,
            deaths: 0,
            connected: false,
            is_bot: false,
            id,
            name: String::new(),
            team: Team::Federation,
            class: ShipClass::Cruiser,
            stats: table.get(ShipClass::Cruiser).clone(),
        }
    }

    /// Claim this slot with a fresh ship in Outfit status
    pub fn outfit(&mut self, name: String, team: Team, class: ShipClass, stats: ShipStats, is_bot: bool) {
        let id = self.id;
        *self = Self {
            shields: stats.max_shields,
            fuel: stats.max_fuel,
            status: PlayerStatus::Outfit,
            shields_up: true,
            connected: true,
            is_bot,
            id,
            name,
            team,
            class,
            stats,
            ..Player::free_slot(id)
        };
    }

    /// Put a fresh ship in play at the given position
    pub fn launch(&mut self, pos: Vec2, heading: f32) {
        self.pos = pos;
        self.heading = heading;
        self.des_heading = heading;
        self.speed = 0.0;
        self.des_speed = 0.0;
        self.status = PlayerStatus::Alive;
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.status == PlayerStatus::Alive
    }

    /// Slot is claimed by someone (any non-Free status)
    #[inline]
    pub fn is_occupied(&self) -> bool {
        self.status != PlayerStatus::Free
    }

    /// Armies this ship may carry right now. Capacity is earned per life:
    /// two armies per kill since last death, capped by the hull.
    pub fn army_capacity(&self) -> u32 {
        let earned = (self.kills_since_death * planet_rules::ARMIES_PER_KILL).floor() as u32;
        earned.min(self.stats.max_armies)
    }

    /// Fraction of hull integrity lost, 0.0 (pristine) to 1.0 (destroyed)
    pub fn damage_fraction(&self) -> f32 {
        (self.hull_damage / self.stats.max_hull).clamp(0.0, 1.0)
    }

    /// Clear every combat-mode flag. Used on destruction and re-outfit.
    pub fn clear_combat_modes(&mut self) {
        self.shields_up = false;
        self.cloaked = false;
        self.repairing = false;
        self.bombing = false;
        self.orbiting = None;
        self.beaming = None;
        self.tractor = None;
        self.lock = None;
    }
}

/// Planet state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Planet {
    pub id: PlanetId,
    pub name: String,
    pub pos: Vec2,
    pub owner: Option<Team>,
    pub armies: u32,
    /// One bit per team: that team has scouted this planet
    pub info_mask: u8,
    /// Team whose quadrant this planet belongs to at reset
    pub home_of: Option<Team>,
}

impl Planet {
    pub fn scouted_by(&self, team: Team) -> bool {
        self.info_mask & (1 << team.index()) != 0
    }

    pub fn mark_scouted(&mut self, team: Team) {
        self.info_mask |= 1 << team.index();
    }
}

/// Projectile kind. Torpedoes and plasmas share one advance/fuse contract
/// and differ only in acquisition and profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileKind {
    Torpedo,
    Plasma,
}

/// Projectile lifecycle. Consumed entries are only compacted between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileStatus {
    Moving,
    Exploding,
    Consumed,
}

/// A torpedo or plasma in flight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub kind: ProjectileKind,
    pub owner: PlayerId,
    pub team: Team,
    pub pos: Vec2,
    pub heading: f32,
    pub speed: f32,
    pub damage: f32,
    /// Ticks until forced detonation
    pub fuse: u32,
    pub status: ProjectileStatus,
}

impl Projectile {
    pub fn torpedo(owner: &Player, heading: f32) -> Self {
        Self {
            kind: ProjectileKind::Torpedo,
            owner: owner.id,
            team: owner.team,
            pos: owner.pos,
            heading,
            speed: owner.stats.torp_speed,
            damage: owner.stats.torp_damage,
            fuse: owner.stats.torp_fuse,
            status: ProjectileStatus::Moving,
        }
    }

    pub fn plasma(owner: &Player, heading: f32) -> Self {
        Self {
            kind: ProjectileKind::Plasma,
            owner: owner.id,
            team: owner.team,
            pos: owner.pos,
            heading,
            speed: owner.stats.plasma_speed,
            damage: owner.stats.plasma_damage,
            fuse: owner.stats.plasma_fuse,
            status: ProjectileStatus::Moving,
        }
    }
}

/// How a finished game was won
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VictoryKind {
    /// Exactly one team still has living players
    Genocide,
    /// One team owns every planet
    Conquest,
    /// One team owns all owned planets and no living enemy can retake them
    Domination,
    /// Tournament clock expired; most planets wins, ties co-win
    Timeout,
}

/// Final result of a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VictoryOutcome {
    pub kind: VictoryKind,
    pub winners: Vec<Team>,
}

/// Coarse game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Normal,
    Tournament,
    GameOver,
}

impl Default for GamePhase {
    fn default() -> Self {
        Self::Normal
    }
}

/// Complete galaxy state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Galaxy {
    /// Monotonically increasing tick counter
    pub frame: u64,
    pub phase: GamePhase,
    pub players: Vec<Player>,
    pub planets: Vec<Planet>,
    pub projectiles: Vec<Projectile>,

    // Derived aggregates, recomputed by the loop each tick
    pub team_alive: [u32; Team::COUNT],
    pub team_planets: [u32; Team::COUNT],
    pub team_ever_fielded: [bool; Team::COUNT],

    // Tournament-mode fields
    pub tourney_active: bool,
    pub tourney_start: u64,
    /// Remaining tournament ticks, recomputed from frame every tick
    pub tourney_remaining: u64,

    pub outcome: Option<VictoryOutcome>,
}

/// Planet name table, ten per quadrant, home world first
const PLANET_NAMES: [[&str; 10]; 4] = [
    [
        "Earth", "Altair", "Vega", "Procyon", "Sirius", "Castor", "Pollux", "Deneb", "Wolf",
        "Fomalhaut",
    ],
    [
        "Romulus", "Remus", "Algol", "Mirach", "Sheliak", "Draconis", "Alphard", "Sadr", "Cygni",
        "Tauri",
    ],
    [
        "Klingus", "Praxis", "Regulus", "Adhara", "Lyrae", "Mintaka", "Hydrae", "Skath", "Thule",
        "Khitom",
    ],
    [
        "Orion", "Antares", "Bellatrix", "Rigel", "Saiph", "Alnitak", "Meissa", "Hatysa", "Nair",
        "Sulafat",
    ],
];

/// Planet placement inside a quadrant, as fractions of the quadrant edge.
/// Index 0 is the home world; the last two slots start independent.
const PLANET_OFFSETS: [(f32, f32); 10] = [
    (0.50, 0.50),
    (0.20, 0.20),
    (0.80, 0.20),
    (0.20, 0.80),
    (0.80, 0.80),
    (0.50, 0.15),
    (0.15, 0.50),
    (0.85, 0.50),
    (0.50, 0.85),
    (0.35, 0.65),
];

/// Armies on a home world at reset
const HOME_ARMIES: u32 = 30;
/// Armies on an owned colony at reset
const COLONY_ARMIES: u32 = 17;
/// Armies on an independent planet at reset
const INDEPENDENT_ARMIES: u32 = 8;
/// Planets per quadrant that start independent (taken from the tail slots)
const INDEPENDENT_PER_QUADRANT: usize = 2;

impl Galaxy {
    pub fn new() -> Self {
        let players = (0..galaxy::MAX_PLAYERS)
            .map(|i| Player::free_slot(i as PlayerId))
            .collect();
        Self {
            frame: 0,
            phase: GamePhase::Normal,
            players,
            planets: Self::planet_template(),
            projectiles: Vec::new(),
            team_alive: [0; Team::COUNT],
            team_planets: [0; Team::COUNT],
            team_ever_fielded: [false; Team::COUNT],
            tourney_active: false,
            tourney_start: 0,
            tourney_remaining: 0,
            outcome: None,
        }
    }

    /// Deterministic initial planet layout: four quadrants of ten planets,
    /// eight owned by the quadrant team and two independent.
    pub fn planet_template() -> Vec<Planet> {
        let mut planets = Vec::with_capacity(galaxy::MAX_PLANETS);
        // Quadrant origins: Federation SW, Romulan NW, Klingon NE, Orion SE
        let origins = [
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, galaxy::QUADRANT),
            Vec2::new(galaxy::QUADRANT, galaxy::QUADRANT),
            Vec2::new(galaxy::QUADRANT, 0.0),
        ];
        for team in Team::ALL {
            let origin = origins[team.index()];
            for (slot, &(fx, fy)) in PLANET_OFFSETS.iter().enumerate() {
                let id = (team.index() * galaxy::PLANETS_PER_TEAM + slot) as PlanetId;
                let independent = slot >= PLANET_OFFSETS.len() - INDEPENDENT_PER_QUADRANT;
                let (owner, armies) = if independent {
                    (None, INDEPENDENT_ARMIES)
                } else if slot == 0 {
                    (Some(team), HOME_ARMIES)
                } else {
                    (Some(team), COLONY_ARMIES)
                };
                planets.push(Planet {
                    id,
                    name: PLANET_NAMES[team.index()][slot].to_string(),
                    pos: Vec2::new(origin.x + fx * galaxy::QUADRANT, origin.y + fy * galaxy::QUADRANT),
                    owner,
                    armies,
                    // A team always knows its own quadrant
                    info_mask: if independent { 0 } else { 1 << team.index() },
                    home_of: Some(team),
                });
            }
        }
        planets
    }

    /// The home world of a team
    pub fn home_planet(&self, team: Team) -> &Planet {
        &self.planets[team.index() * galaxy::PLANETS_PER_TEAM]
    }

    /// A launch position near the team's home world
    pub fn spawn_point<R: Rng>(&self, team: Team, rng: &mut R) -> Vec2 {
        let home = self.home_planet(team).pos;
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let dist = rng.gen_range(orbit::RADIUS * 2.0..orbit::RADIUS * 5.0);
        let p = home + Vec2::from_heading(angle) * dist;
        Vec2::new(
            p.x.clamp(0.0, galaxy::SIZE),
            p.y.clamp(0.0, galaxy::SIZE),
        )
    }

    #[inline]
    pub fn get_player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id as usize)
    }

    #[inline]
    pub fn get_player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id as usize)
    }

    #[inline]
    pub fn get_planet(&self, id: PlanetId) -> Option<&Planet> {
        self.planets.get(id as usize)
    }

    #[inline]
    pub fn get_planet_mut(&mut self, id: PlanetId) -> Option<&mut Planet> {
        self.planets.get_mut(id as usize)
    }

    pub fn alive_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_alive())
    }

    /// Occupied slots (any status but Free)
    pub fn occupied_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_occupied()).count()
    }

    /// First free slot, if any
    pub fn free_slot(&self) -> Option<PlayerId> {
        self.players
            .iter()
            .find(|p| p.status == PlayerStatus::Free)
            .map(|p| p.id)
    }

    /// Connected players per team (any living status)
    pub fn team_connected_counts(&self) -> [usize; Team::COUNT] {
        let mut counts = [0; Team::COUNT];
        for p in &self.players {
            if p.is_occupied() && p.connected {
                counts[p.team.index()] += 1;
            }
        }
        counts
    }

    /// Torpedoes in flight owned by a player
    pub fn torp_count(&self, owner: PlayerId) -> usize {
        self.projectiles
            .iter()
            .filter(|t| {
                t.owner == owner
                    && t.kind == ProjectileKind::Torpedo
                    && t.status != ProjectileStatus::Consumed
            })
            .count()
    }

    /// Plasmas in flight owned by a player
    pub fn plasma_count(&self, owner: PlayerId) -> usize {
        self.projectiles
            .iter()
            .filter(|t| {
                t.owner == owner
                    && t.kind == ProjectileKind::Plasma
                    && t.status != ProjectileStatus::Consumed
            })
            .count()
    }

    /// Recompute the per-team aggregates. The tick loop is the sole caller.
    pub fn recount(&mut self) {
        self.team_alive = [0; Team::COUNT];
        self.team_planets = [0; Team::COUNT];
        for p in &self.players {
            if p.is_occupied() {
                self.team_ever_fielded[p.team.index()] = true;
            }
            if p.is_alive() && p.connected {
                self.team_alive[p.team.index()] += 1;
            }
        }
        for planet in &self.planets {
            if let Some(owner) = planet.owner {
                self.team_planets[owner.index()] += 1;
            }
        }
    }

    /// Living players of any team other than `team` that carry armies
    pub fn enemy_carriers_alive(&self, team: Team) -> bool {
        self.players
            .iter()
            .any(|p| p.is_alive() && p.team != team && p.armies > 0)
    }

    fn reset_common(&mut self) {
        self.planets = Self::planet_template();
        self.projectiles.clear();
        self.frame = 0;
        self.phase = GamePhase::Normal;
        self.tourney_active = false;
        self.tourney_start = 0;
        self.tourney_remaining = 0;
        self.outcome = None;
        self.team_alive = [0; Team::COUNT];
        self.team_planets = [0; Team::COUNT];
        self.team_ever_fielded = [false; Team::COUNT];
    }

    /// Fair-start reset for tournament entry: every connected player (human
    /// or bot) gets a fresh ship and relaunches at home; disconnected slots
    /// are released.
    pub fn reset_fair_start(&mut self, table: &ShipTable) {
        self.reset_common();
        let mut rng = rand::thread_rng();
        for i in 0..self.players.len() {
            let p = &self.players[i];
            if !p.is_occupied() {
                continue;
            }
            if p.connected {
                let (name, team, class, is_bot) = (p.name.clone(), p.team, p.class, p.is_bot);
                self.players[i].outfit(name, team, class, table.get(class).clone(), is_bot);
                let spawn = self.spawn_point(team, &mut rng);
                self.players[i].launch(spawn, 0.0);
            } else {
                self.players[i] = Player::free_slot(i as PlayerId);
            }
        }
        self.recount();
    }

    /// Post-victory reset. Connected humans keep their slot and return to
    /// Outfit with a fresh ship; bots and disconnected players are released.
    pub fn reset_after_victory(&mut self, table: &ShipTable) {
        self.reset_common();
        for p in &mut self.players {
            if p.is_occupied() && p.connected && !p.is_bot {
                let (name, team, class) = (p.name.clone(), p.team, p.class);
                p.outfit(name, team, class, table.get(class).clone(), false);
            } else if p.is_occupied() {
                *p = Player::free_slot(p.id);
            }
        }
        self.recount();
    }
}

impl Default for Galaxy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outfit_slot(galaxy: &mut Galaxy, id: PlayerId, team: Team, is_bot: bool) {
        let table = ShipTable::builtin();
        let stats = table.get(ShipClass::Cruiser).clone();
        let p = galaxy.get_player_mut(id).unwrap();
        p.outfit(format!("P{}", id), team, ShipClass::Cruiser, stats, is_bot);
        let spawn = Vec2::new(10_000.0, 10_000.0 + id as f32 * 500.0);
        galaxy.get_player_mut(id).unwrap().launch(spawn, 0.0);
    }

    #[test]
    fn test_new_galaxy_shape() {
        let galaxy = Galaxy::new();
        assert_eq!(galaxy.players.len(), galaxy::MAX_PLAYERS);
        assert_eq!(galaxy.planets.len(), galaxy::MAX_PLANETS);
        assert_eq!(galaxy.frame, 0);
        assert!(galaxy.projectiles.is_empty());
        assert!(galaxy.players.iter().all(|p| p.status == PlayerStatus::Free));
    }

    #[test]
    fn test_planet_template_ownership() {
        let planets = Galaxy::planet_template();
        for team in Team::ALL {
            let owned = planets.iter().filter(|p| p.owner == Some(team)).count();
            assert_eq!(owned, galaxy::PLANETS_PER_TEAM - INDEPENDENT_PER_QUADRANT);
        }
        let independent = planets.iter().filter(|p| p.owner.is_none()).count();
        assert_eq!(independent, INDEPENDENT_PER_QUADRANT * 4);
    }

    #[test]
    fn test_home_planet_armies() {
        let galaxy = Galaxy::new();
        for team in Team::ALL {
            let home = galaxy.home_planet(team);
            assert_eq!(home.owner, Some(team));
            assert_eq!(home.armies, HOME_ARMIES);
        }
    }

    #[test]
    fn test_planet_positions_in_bounds() {
        for p in Galaxy::planet_template() {
            assert!(p.pos.x >= 0.0 && p.pos.x <= galaxy::SIZE);
            assert!(p.pos.y >= 0.0 && p.pos.y <= galaxy::SIZE);
        }
    }

    #[test]
    fn test_outfit_and_launch() {
        let mut galaxy = Galaxy::new();
        outfit_slot(&mut galaxy, 0, Team::Romulan, false);
        let p = galaxy.get_player(0).unwrap();
        assert_eq!(p.status, PlayerStatus::Alive);
        assert_eq!(p.team, Team::Romulan);
        assert_eq!(p.shields, p.stats.max_shields);
        assert_eq!(p.fuel, p.stats.max_fuel);
        assert!(p.connected);
    }

    #[test]
    fn test_recount_teams() {
        let mut galaxy = Galaxy::new();
        outfit_slot(&mut galaxy, 0, Team::Federation, false);
        outfit_slot(&mut galaxy, 1, Team::Federation, true);
        outfit_slot(&mut galaxy, 2, Team::Klingon, true);
        galaxy.recount();

        assert_eq!(galaxy.team_alive[Team::Federation.index()], 2);
        assert_eq!(galaxy.team_alive[Team::Klingon.index()], 1);
        assert_eq!(galaxy.team_alive[Team::Orion.index()], 0);
        assert!(galaxy.team_ever_fielded[Team::Federation.index()]);
        assert!(!galaxy.team_ever_fielded[Team::Romulan.index()]);
        assert_eq!(
            galaxy.team_planets[Team::Federation.index()] as usize,
            galaxy::PLANETS_PER_TEAM - INDEPENDENT_PER_QUADRANT
        );
    }

    #[test]
    fn test_ever_fielded_sticky_after_death() {
        let mut galaxy = Galaxy::new();
        outfit_slot(&mut galaxy, 0, Team::Orion, false);
        galaxy.recount();
        galaxy.get_player_mut(0).unwrap().status = PlayerStatus::Dead;
        galaxy.recount();
        assert_eq!(galaxy.team_alive[Team::Orion.index()], 0);
        assert!(galaxy.team_ever_fielded[Team::Orion.index()]);
    }

    #[test]
    fn test_projectile_counts_per_owner() {
        let mut galaxy = Galaxy::new();
        outfit_slot(&mut galaxy, 0, Team::Federation, false);
        let shooter = galaxy.get_player(0).unwrap().clone();
        galaxy.projectiles.push(Projectile::torpedo(&shooter, 0.0));
        galaxy.projectiles.push(Projectile::torpedo(&shooter, 1.0));
        galaxy.projectiles.push(Projectile::plasma(&shooter, 0.5));
        let mut spent = Projectile::torpedo(&shooter, 2.0);
        spent.status = ProjectileStatus::Consumed;
        galaxy.projectiles.push(spent);

        assert_eq!(galaxy.torp_count(0), 2);
        assert_eq!(galaxy.plasma_count(0), 1);
        assert_eq!(galaxy.torp_count(1), 0);
    }

    #[test]
    fn test_army_capacity_per_life() {
        let mut galaxy = Galaxy::new();
        outfit_slot(&mut galaxy, 0, Team::Federation, false);
        let p = galaxy.get_player_mut(0).unwrap();
        assert_eq!(p.army_capacity(), 0);
        p.kills_since_death = 1.0;
        assert_eq!(p.army_capacity(), 2);
        p.kills_since_death = 30.0;
        // Capped by ship capacity regardless of kills this life
        assert_eq!(p.army_capacity(), p.stats.max_armies);
        // Total career kills do not unlock capacity on their own
        p.kills_since_death = 0.0;
        p.kills = 50.0;
        assert_eq!(p.army_capacity(), 0);
    }

    #[test]
    fn test_reset_preserves_connected_humans() {
        let table = ShipTable::builtin();
        let mut galaxy = Galaxy::new();
        outfit_slot(&mut galaxy, 0, Team::Federation, false); // human
        outfit_slot(&mut galaxy, 1, Team::Klingon, true); // bot
        outfit_slot(&mut galaxy, 2, Team::Romulan, false); // human, disconnects
        galaxy.get_player_mut(2).unwrap().connected = false;
        galaxy.phase = GamePhase::GameOver;
        galaxy.frame = 5_000;

        galaxy.reset_after_victory(&table);

        assert_eq!(galaxy.frame, 0);
        assert_eq!(galaxy.phase, GamePhase::Normal);
        assert!(galaxy.outcome.is_none());
        let human = galaxy.get_player(0).unwrap();
        assert_eq!(human.status, PlayerStatus::Outfit);
        assert_eq!(human.name, "P0");
        assert_eq!(human.team, Team::Federation);
        assert_eq!(galaxy.get_player(1).unwrap().status, PlayerStatus::Free);
        assert_eq!(galaxy.get_player(2).unwrap().status, PlayerStatus::Free);
    }

    #[test]
    fn test_fair_start_reset_relaunches_everyone_connected() {
        let table = ShipTable::builtin();
        let mut galaxy = Galaxy::new();
        outfit_slot(&mut galaxy, 0, Team::Federation, false); // human
        outfit_slot(&mut galaxy, 1, Team::Klingon, true); // bot
        outfit_slot(&mut galaxy, 2, Team::Romulan, false); // disconnected human
        galaxy.get_player_mut(2).unwrap().connected = false;
        galaxy.get_player_mut(0).unwrap().hull_damage = 50.0;

        galaxy.reset_fair_start(&table);

        let human = galaxy.get_player(0).unwrap();
        assert_eq!(human.status, PlayerStatus::Alive);
        assert_eq!(human.hull_damage, 0.0);
        let bot = galaxy.get_player(1).unwrap();
        assert_eq!(bot.status, PlayerStatus::Alive);
        assert!(bot.is_bot);
        assert_eq!(galaxy.get_player(2).unwrap().status, PlayerStatus::Free);
    }

    #[test]
    fn test_spawn_point_near_home() {
        let galaxy = Galaxy::new();
        let mut rng = rand::thread_rng();
        for team in Team::ALL {
            let home = galaxy.home_planet(team).pos;
            for _ in 0..20 {
                let spawn = galaxy.spawn_point(team, &mut rng);
                assert!(spawn.distance_to(home) <= orbit::RADIUS * 5.0 + 1.0);
            }
        }
    }

    #[test]
    fn test_enemy_carriers_alive() {
        let mut galaxy = Galaxy::new();
        outfit_slot(&mut galaxy, 0, Team::Federation, false);
        outfit_slot(&mut galaxy, 1, Team::Klingon, false);
        assert!(!galaxy.enemy_carriers_alive(Team::Federation));
        galaxy.get_player_mut(1).unwrap().armies = 3;
        assert!(galaxy.enemy_carriers_alive(Team::Federation));
        // Own team carrying armies does not count
        assert!(!galaxy.enemy_carriers_alive(Team::Klingon));
    }

    #[test]
    fn test_clear_combat_modes() {
        let mut galaxy = Galaxy::new();
        outfit_slot(&mut galaxy, 0, Team::Federation, false);
        let p = galaxy.get_player_mut(0).unwrap();
        p.orbiting = Some(3);
        p.bombing = true;
        p.cloaked = true;
        p.tractor = Some((TractorMode::Pressor, 5));
        p.lock = Some(LockTarget::Planet(2));
        p.clear_combat_modes();
        assert!(p.orbiting.is_none());
        assert!(!p.bombing);
        assert!(!p.cloaked);
        assert!(p.tractor.is_none());
        assert!(p.lock.is_none());
    }

    #[test]
    fn test_serialization() {
        let galaxy = Galaxy::new();
        let encoded =
            bincode::serde::encode_to_vec(&galaxy, bincode::config::standard()).unwrap();
        let (decoded, _): (Galaxy, usize) =
            bincode::serde::decode_from_slice(&encoded, bincode::config::standard()).unwrap();
        assert_eq!(decoded.frame, galaxy.frame);
        assert_eq!(decoded.planets.len(), galaxy.planets.len());
    }

    #[test]
    fn test_weapon_limits_reference_constants() {
        use crate::game::constants::weapons;
        // Guard against the outstanding-projectile caps drifting apart from
        // the counting helpers
        assert!(weapons::MAX_TORPS >= 1);
        assert_eq!(weapons::MAX_PLASMAS, 1);
    }
}
