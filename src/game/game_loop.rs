//! Tick orchestration
//!
//! `GameLoop` owns the galaxy, the bot registry and the spatial grid, and
//! advances everything in a fixed per-tick order: movement, projectiles,
//! bot decisions, aggregate recount, victory evaluation. Command handlers
//! from the session layer mutate the same state through `apply_command`
//! between ticks; the session's lock guarantees the two never interleave.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::game::constants::{orbit, time};
use crate::game::events::GameEvent;
use crate::game::ships::{ShipClass, ShipTable};
use crate::game::spatial::PlayerGrid;
use crate::game::state::{
    Galaxy, LockTarget, PlanetId, PlayerId, PlayerStatus, Team, TractorMode,
};
use crate::game::systems::bots::BotRegistry;
use crate::game::systems::{bots, movement, victory, weapons};
use crate::net::protocol::GameCommand;
use crate::util::vec2::Vec2;

/// Bot call signs, suffixed with the slot id on spawn
const BOT_NAMES: [&str; 8] = [
    "Vulture", "Jackal", "Mantis", "Cossack", "Reaper", "Banshee", "Hornet", "Drake",
];

/// Tunables owned by the session layer
#[derive(Debug, Clone)]
pub struct GameLoopConfig {
    /// The loop keeps at least this many occupied slots by adding bots
    pub bot_fill: usize,
}

impl Default for GameLoopConfig {
    fn default() -> Self {
        Self { bot_fill: 8 }
    }
}

/// The simulation core. One instance per galaxy, owned behind the session
/// lock.
pub struct GameLoop {
    galaxy: Galaxy,
    bots: BotRegistry,
    grid: PlayerGrid,
    table: ShipTable,
    config: GameLoopConfig,
}

impl GameLoop {
    pub fn new(table: ShipTable, config: GameLoopConfig) -> Self {
        Self {
            galaxy: Galaxy::new(),
            bots: BotRegistry::new(),
            grid: PlayerGrid::default(),
            table,
            config,
        }
    }

    pub fn state(&self) -> &Galaxy {
        &self.galaxy
    }

    pub fn state_mut(&mut self) -> &mut Galaxy {
        &mut self.galaxy
    }

    pub fn ship_table(&self) -> &ShipTable {
        &self.table
    }

    pub fn bot_count(&self) -> usize {
        self.galaxy
            .players
            .iter()
            .filter(|p| p.is_occupied() && p.is_bot)
            .count()
    }

    /// Advance the simulation one tick. Caller holds the state lock.
    pub fn tick(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        self.galaxy.frame += 1;

        // (1) Kinematics, orbit mechanics, per-tick resource bookkeeping
        movement::update(&mut self.galaxy, &mut events);

        // (2) Projectiles advance and resolve against the fresh grid
        self.grid
            .rebuild(self.galaxy.alive_players().map(|p| (p.id, p.pos)));
        weapons::advance_projectiles(&mut self.galaxy, &self.grid, &mut events);

        // (3) Bot decisions
        bots::run(&mut self.galaxy, &mut self.bots, &mut events);

        // Slot churn: respawns, released slots, bot refill
        self.maintain_slots();
        self.ensure_bot_fill();

        // (4) Derived aggregates
        self.galaxy.recount();

        // (5) Tournament transitions and victory conditions
        victory::update(&mut self.galaxy, &self.table, &mut events);

        events
    }

    /// Walk dead/abandoned slots: bots re-outfit after their respawn delay,
    /// connected humans return to Outfit, disconnected slots are released.
    fn maintain_slots(&mut self) {
        let mut rng = rand::thread_rng();
        for i in 0..self.galaxy.players.len() {
            let p = &self.galaxy.players[i];
            if p.status != PlayerStatus::Dead {
                continue;
            }
            if p.respawn_timer > 0 {
                self.galaxy.players[i].respawn_timer -= 1;
                continue;
            }
            let id = p.id;
            if !p.connected {
                self.galaxy.players[i] = crate::game::state::Player::free_slot(id);
                self.bots.unregister(id);
            } else if p.is_bot {
                let (name, team, class) = (p.name.clone(), p.team, p.class);
                self.galaxy.players[i].outfit(
                    name,
                    team,
                    class,
                    self.table.get(class).clone(),
                    true,
                );
                let spawn = self.galaxy.spawn_point(team, &mut rng);
                self.galaxy.players[i].launch(spawn, 0.0);
                self.bots.reset(id);
            } else {
                let (name, team, class) = (p.name.clone(), p.team, p.class);
                self.galaxy.players[i].outfit(
                    name,
                    team,
                    class,
                    self.table.get(class).clone(),
                    false,
                );
            }
        }
    }

    /// Keep the galaxy populated up to the configured fill
    fn ensure_bot_fill(&mut self) {
        while self.galaxy.occupied_count() < self.config.bot_fill {
            if self.add_bot().is_none() {
                break;
            }
        }
    }

    /// Add one bot on the currently weakest team. Returns its slot id.
    pub fn add_bot(&mut self) -> Option<PlayerId> {
        let slot = self.galaxy.free_slot()?;
        let counts = self.galaxy.team_connected_counts();
        let team = *Team::ALL
            .iter()
            .min_by_key(|t| counts[t.index()])
            .expect("teams are non-empty");

        let mut rng = rand::thread_rng();
        // Mostly line ships; the occasional starbase anchors a quadrant
        let class = if rng.gen_bool(0.1) {
            ShipClass::Starbase
        } else {
            *[
                ShipClass::Scout,
                ShipClass::Destroyer,
                ShipClass::Cruiser,
                ShipClass::Cruiser,
                ShipClass::Battleship,
                ShipClass::Assault,
            ]
            .choose(&mut rng)
            .expect("class list is non-empty")
        };
        let name = format!(
            "{}-{}",
            BOT_NAMES.choose(&mut rng).expect("names are non-empty"),
            slot
        );

        self.galaxy.players[slot as usize].outfit(
            name,
            team,
            class,
            self.table.get(class).clone(),
            true,
        );
        let spawn = self.galaxy.spawn_point(team, &mut rng);
        self.galaxy.players[slot as usize].launch(spawn, 0.0);
        self.bots.register(slot);
        tracing::debug!(slot, ?team, ?class, "bot added");
        Some(slot)
    }

    /// Mark a player disconnected. Alive ships linger for reconnection;
    /// anything else releases the slot.
    pub fn disconnect(&mut self, id: PlayerId) {
        let Some(p) = self.galaxy.get_player_mut(id) else {
            return;
        };
        match p.status {
            PlayerStatus::Alive | PlayerStatus::Explode => {
                p.connected = false;
            }
            PlayerStatus::Outfit | PlayerStatus::Dead => {
                *p = crate::game::state::Player::free_slot(id);
                self.bots.unregister(id);
            }
            PlayerStatus::Free => {}
        }
    }

    /// Post-victory deferred reset: humans back to Outfit, bots gone
    pub fn reset_after_victory(&mut self) -> Vec<GameEvent> {
        self.galaxy.reset_after_victory(&self.table);
        // Every bot slot was released by the reset
        for id in 0..self.galaxy.players.len() as u8 {
            if !self.galaxy.players[id as usize].is_occupied() {
                self.bots.unregister(id);
            }
        }
        tracing::info!("galaxy reset after victory");
        vec![GameEvent::GalaxyReset]
    }

    /// Apply one validated command from the session layer. The core
    /// re-checks actor status and silently no-ops anything that does not
    /// apply (spec'd fail-soft behavior).
    pub fn apply_command(&mut self, actor: PlayerId, command: GameCommand) -> Vec<GameEvent> {
        let mut events = Vec::new();

        // Quit is legal in every status
        if matches!(command, GameCommand::Quit) {
            self.disconnect(actor);
            return events;
        }

        let Some(p) = self.galaxy.get_player(actor) else {
            return events;
        };
        if !p.is_alive() {
            return events;
        }

        match command {
            GameCommand::SetCourse { heading, speed } => {
                self.with_actor(actor, |p| {
                    p.des_heading = heading;
                    p.des_speed = speed;
                    // A new course leaves orbit and drops planet interaction
                    p.orbiting = None;
                    p.bombing = false;
                    p.beaming = None;
                    p.lock = None;
                });
            }
            GameCommand::FireTorpedo { heading } => {
                weapons::fire_torpedo(&mut self.galaxy, actor, heading, &mut events);
            }
            GameCommand::FirePlasma { heading } => {
                weapons::fire_plasma(&mut self.galaxy, actor, heading, &mut events);
            }
            GameCommand::FirePhaser { aim } => {
                weapons::fire_phaser(&mut self.galaxy, actor, aim, &mut events);
            }
            GameCommand::ToggleShields => {
                self.with_actor(actor, |p| p.shields_up = !p.shields_up);
            }
            GameCommand::ToggleCloak => {
                self.with_actor(actor, |p| p.cloaked = !p.cloaked);
            }
            GameCommand::ToggleRepair => {
                self.with_actor(actor, |p| {
                    p.repairing = !p.repairing;
                    if p.repairing {
                        p.shields_up = false;
                        p.des_speed = 0.0;
                    }
                });
            }
            GameCommand::Orbit => {
                self.enter_orbit(actor);
            }
            GameCommand::ToggleBomb => {
                self.with_actor(actor, |p| {
                    if p.orbiting.is_some() {
                        p.bombing = !p.bombing;
                        if p.bombing {
                            p.beaming = None;
                        }
                    }
                });
            }
            GameCommand::Beam { direction } => {
                self.with_actor(actor, |p| {
                    if p.orbiting.is_some() {
                        p.beaming = if p.beaming == Some(direction) {
                            None
                        } else {
                            Some(direction)
                        };
                        if p.beaming.is_some() {
                            p.bombing = false;
                        }
                    }
                });
            }
            GameCommand::LockPlanet { planet } => {
                if (planet as usize) < self.galaxy.planets.len() {
                    self.with_actor(actor, |p| p.lock = Some(LockTarget::Planet(planet)));
                }
            }
            GameCommand::LockPlayer { player } => {
                let valid = player != actor
                    && self
                        .galaxy
                        .get_player(player)
                        .map(|t| t.is_alive())
                        .unwrap_or(false);
                if valid {
                    self.with_actor(actor, |p| p.lock = Some(LockTarget::Player(player)));
                }
            }
            GameCommand::Tractor { target } => {
                self.engage_tractor(actor, target, TractorMode::Tractor);
            }
            GameCommand::Pressor { target } => {
                self.engage_tractor(actor, target, TractorMode::Pressor);
            }
            GameCommand::TractorOff => {
                self.with_actor(actor, |p| p.tractor = None);
            }
            GameCommand::Detonate => {
                weapons::detonate_own_torpedoes(&mut self.galaxy, actor, &mut events);
            }
            GameCommand::Quit => unreachable!("handled above"),
        }
        events
    }

    fn with_actor(&mut self, actor: PlayerId, f: impl FnOnce(&mut crate::game::state::Player)) {
        if let Some(p) = self.galaxy.get_player_mut(actor) {
            f(p);
        }
    }

    fn enter_orbit(&mut self, actor: PlayerId) {
        let Some(p) = self.galaxy.get_player(actor) else {
            return;
        };
        if p.speed > orbit::ENTRY_MAX_SPEED {
            return;
        }
        let pos = p.pos;
        let team = p.team;
        let nearest: Option<(PlanetId, Vec2, f32)> = self
            .galaxy
            .planets
            .iter()
            .map(|pl| (pl.id, pl.pos, pl.pos.distance_to(pos)))
            .min_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal));
        let Some((planet_id, planet_pos, dist)) = nearest else {
            return;
        };
        if dist > orbit::ENTRY_RANGE {
            return;
        }

        self.with_actor(actor, |p| {
            p.orbiting = Some(planet_id);
            p.tractor = None;
            p.lock = None;
            p.speed = 0.0;
            p.des_speed = 0.0;
            // Snap onto the orbit circle at the current bearing
            let bearing = (p.pos - planet_pos).heading();
            p.pos = planet_pos + Vec2::from_heading(bearing) * orbit::RADIUS;
        });
        if let Some(planet) = self.galaxy.get_planet_mut(planet_id) {
            planet.mark_scouted(team);
        }
    }

    fn engage_tractor(&mut self, actor: PlayerId, target: PlayerId, mode: TractorMode) {
        if actor == target {
            return;
        }
        let in_range = {
            let Some(p) = self.galaxy.get_player(actor) else {
                return;
            };
            match self.galaxy.get_player(target) {
                Some(t) if t.is_alive() => {
                    t.pos.distance_to(p.pos) <= p.stats.tractor_range
                }
                _ => false,
            }
        };
        if !in_range {
            return;
        }
        self.with_actor(actor, |p| {
            p.tractor = Some((mode, target));
            p.orbiting = None;
        });
    }

    /// Ticks elapsed as whole seconds, for status logging
    pub fn elapsed_secs(&self) -> u64 {
        self.galaxy.frame / time::TICK_RATE as u64
    }
}
