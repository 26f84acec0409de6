//! Bot decision engine
//!
//! Every tick each eligible bot runs an ordered pipeline: planet defense,
//! combat target selection (with teammate coordination), maneuver, weapons
//! trigger. Earlier stages short-circuit later selection stages when they
//! commit the bot to an action; maneuver and fire always run against
//! whatever target the pipeline settled on.
//!
//! Decisions are computed in parallel over an immutable snapshot of the
//! galaxy, then applied sequentially, mirroring the two-phase shape the
//! rest of the tick uses.

use hashbrown::HashMap;
use rand::Rng;
use rayon::prelude::*;

use crate::game::constants::bots::*;
use crate::game::constants::galaxy as galaxy_bounds;
use crate::game::constants::weapons::MAX_TORPS;
use crate::game::events::GameEvent;
use crate::game::intercept;
use crate::game::state::{Galaxy, PlanetId, Player, PlayerId};
use crate::game::systems::weapons::{self, PhaserAim};
use crate::util::vec2::{angle_diff, Vec2};

/// Bot-only state, kept out of the Player record and keyed by slot id
#[derive(Debug, Clone)]
pub struct BotControl {
    /// Current combat target
    pub target: Option<PlayerId>,
    /// Ticks the current target has been held
    pub lock_ticks: u32,
    /// Persistent defense assignment; survives the threat disappearing
    pub defend_planet: Option<PlanetId>,
    /// Ticks until the next shot is allowed
    pub cooldown: u32,
    /// Where to wander when nothing demands attention
    pub patrol_goal: Vec2,
}

impl Default for BotControl {
    fn default() -> Self {
        Self {
            target: None,
            lock_ticks: 0,
            defend_planet: None,
            cooldown: 0,
            patrol_goal: Vec2::ZERO,
        }
    }
}

/// Registry of bot state, one entry per bot-controlled slot
pub struct BotRegistry {
    states: HashMap<PlayerId, BotControl>,
}

impl BotRegistry {
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
        }
    }

    pub fn register(&mut self, id: PlayerId) {
        self.states.insert(id, BotControl::default());
    }

    pub fn unregister(&mut self, id: PlayerId) {
        self.states.remove(&id);
    }

    /// Fresh control state, e.g. after a respawn
    pub fn reset(&mut self, id: PlayerId) {
        if let Some(ctl) = self.states.get_mut(&id) {
            *ctl = BotControl::default();
        }
    }

    pub fn get(&self, id: PlayerId) -> Option<&BotControl> {
        self.states.get(&id)
    }

    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut BotControl> {
        self.states.get_mut(&id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.states.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl Default for BotRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A teammate's held lock, used for fire concentration
#[derive(Debug, Clone, Copy)]
struct TeammateLock {
    holder: PlayerId,
    team: crate::game::state::Team,
    pos: Vec2,
    target: PlayerId,
}

/// What a bot decided to shoot this tick
#[derive(Debug, Clone, Copy)]
enum FireOrder {
    Torpedo { heading: f32 },
    Phaser { target: PlayerId },
}

/// One bot's decision, computed read-only and applied afterwards
struct Decision {
    bot: PlayerId,
    control: BotControl,
    des_heading: Option<f32>,
    des_speed: Option<f32>,
    raise_shields: bool,
    break_orbit: bool,
    fire: Option<FireOrder>,
}

/// Run the decision engine for every bot-controlled, alive, connected
/// player.
pub fn run(galaxy: &mut Galaxy, bots: &mut BotRegistry, events: &mut Vec<GameEvent>) {
    // Snapshot eligible bots with their current control state
    let snapshot: Vec<(PlayerId, BotControl)> = bots
        .states
        .iter()
        .filter(|(id, _)| {
            galaxy
                .get_player(**id)
                .map(|p| p.is_bot && p.is_alive() && p.connected)
                .unwrap_or(false)
        })
        .map(|(&id, ctl)| (id, ctl.clone()))
        .collect();

    // Teammate locks feed the coordination bias
    let locks: Vec<TeammateLock> = snapshot
        .iter()
        .filter_map(|(id, ctl)| {
            let target = ctl.target?;
            let holder = galaxy.get_player(*id)?;
            Some(TeammateLock {
                holder: *id,
                team: holder.team,
                pos: holder.pos,
                target,
            })
        })
        .collect();

    // Compute decisions in parallel over the immutable galaxy
    let decisions: Vec<Decision> = {
        let galaxy_ref: &Galaxy = galaxy;
        snapshot
            .into_par_iter()
            .map(|(id, ctl)| decide(galaxy_ref, id, ctl, &locks))
            .collect()
    };

    // Apply decisions sequentially
    for d in decisions {
        bots.states.insert(d.bot, d.control);
        let Some(p) = galaxy.get_player_mut(d.bot) else {
            continue;
        };
        if !p.is_alive() {
            continue;
        }
        if d.break_orbit {
            p.orbiting = None;
            p.bombing = false;
            p.beaming = None;
        }
        if d.raise_shields {
            p.shields_up = true;
        }
        if let Some(h) = d.des_heading {
            p.des_heading = h;
        }
        if let Some(s) = d.des_speed {
            p.des_speed = s;
        }
        match d.fire {
            Some(FireOrder::Torpedo { heading }) => {
                weapons::fire_torpedo(galaxy, d.bot, heading, events);
            }
            Some(FireOrder::Phaser { target }) => {
                weapons::fire_phaser(galaxy, d.bot, PhaserAim::Target(target), events);
            }
            None => {}
        }
    }
}

fn decide(galaxy: &Galaxy, bot_id: PlayerId, mut ctl: BotControl, locks: &[TeammateLock]) -> Decision {
    ctl.cooldown = ctl.cooldown.saturating_sub(1);

    let mut d = Decision {
        bot: bot_id,
        control: BotControl::default(),
        des_heading: None,
        des_speed: None,
        raise_shields: false,
        break_orbit: false,
        fire: None,
    };

    let Some(bot) = galaxy.get_player(bot_id) else {
        d.control = ctl;
        return d;
    };

    // Stage 1: planet defense. A live threat commits the bot and skips
    // target scoring entirely.
    if let Some((planet_id, enemy_id)) = assess_planet_defense(galaxy, bot) {
        ctl.defend_planet = Some(planet_id);
        if ctl.target == Some(enemy_id) {
            ctl.lock_ticks += 1;
        } else {
            ctl.target = Some(enemy_id);
            ctl.lock_ticks = 0;
        }
        d.raise_shields = true;
        d.break_orbit = true;
    } else {
        // Stage 2 + 2a: scored target selection with teammate bias
        select_target(galaxy, bot, &mut ctl, locks);
    }

    // Stage 3: maneuver
    maneuver(galaxy, bot, &mut ctl, &mut d);

    // Stage 4: weapons trigger
    weapons_trigger(galaxy, bot, &mut ctl, &mut d);

    d.control = ctl;
    d
}

/// Candidate enemies for a bot: alive, connected, visible, uncloaked
fn visible_enemy(bot: &Player, other: &Player) -> bool {
    other.is_alive()
        && other.connected
        && other.team != bot.team
        && !other.cloaked
        && other.pos.distance_to(bot.pos) <= VISION_RADIUS
}

/// Scan friendly planets for an approaching or orbiting enemy. Returns the
/// nearest threatened planet (by distance to the bot) with its nearest
/// intruder.
fn assess_planet_defense(galaxy: &Galaxy, bot: &Player) -> Option<(PlanetId, PlayerId)> {
    let mut best: Option<(f32, PlanetId, PlayerId)> = None;
    for planet in galaxy.planets.iter().filter(|pl| pl.owner == Some(bot.team)) {
        let mut nearest_enemy: Option<(f32, PlayerId)> = None;
        for enemy in galaxy.players.iter() {
            if !enemy.is_alive() || !enemy.connected || enemy.team == bot.team || enemy.cloaked {
                continue;
            }
            let on_planet = enemy.orbiting == Some(planet.id);
            let dist = enemy.pos.distance_to(planet.pos);
            if on_planet || dist <= THREAT_RADIUS {
                if nearest_enemy.map_or(true, |(d, _)| dist < d) {
                    nearest_enemy = Some((dist, enemy.id));
                }
            }
        }
        if let Some((_, enemy_id)) = nearest_enemy {
            let planet_dist = bot.pos.distance_to(planet.pos);
            if best.map_or(true, |(d, _, _)| planet_dist < d) {
                best = Some((planet_dist, planet.id, enemy_id));
            }
        }
    }
    best.map(|(_, planet, enemy)| (planet, enemy))
}

/// Score a candidate for target selection. Closer, more damaged, and
/// army-carrying enemies score higher; starbases slightly lower.
fn score_candidate(bot: &Player, candidate: &Player, locks: &[TeammateLock]) -> f32 {
    let dist = bot.pos.distance_to(candidate.pos);
    let mut score = (1.0 - dist / VISION_RADIUS).max(0.0) + 0.5 * candidate.damage_fraction();
    if candidate.armies > 0 {
        score += CARRIER_BIAS;
    }
    if candidate.class.is_stationary() {
        score -= 0.1;
    }
    // Fire concentration: adopt what a nearby teammate already locked
    let supported = locks.iter().any(|l| {
        l.holder != bot.id
            && l.team == bot.team
            && l.target == candidate.id
            && l.pos.distance_to(bot.pos) <= SUPPORT_RADIUS
    });
    if supported {
        score += SUPPORT_BIAS;
    }
    score
}

/// Scored selection with hysteresis: the held target is kept unless a
/// rival beats it by more than the lock margin.
fn select_target(galaxy: &Galaxy, bot: &Player, ctl: &mut BotControl, locks: &[TeammateLock]) {
    let mut best: Option<(f32, PlayerId)> = None;
    for candidate in galaxy.players.iter() {
        if !visible_enemy(bot, candidate) {
            continue;
        }
        let score = score_candidate(bot, candidate, locks);
        if best.map_or(true, |(s, _)| score > s) {
            best = Some((score, candidate.id));
        }
    }

    let current_score = ctl
        .target
        .and_then(|id| galaxy.get_player(id))
        .filter(|t| visible_enemy(bot, t))
        .map(|t| score_candidate(bot, t, locks));

    match (current_score, best) {
        (Some(held), Some((best_score, best_id))) => {
            if Some(best_id) != ctl.target && best_score > held + LOCK_MARGIN {
                ctl.target = Some(best_id);
                ctl.lock_ticks = 0;
            } else {
                ctl.lock_ticks += 1;
            }
        }
        (None, Some((_, best_id))) => {
            ctl.target = Some(best_id);
            ctl.lock_ticks = 0;
        }
        (Some(_), None) => {
            // Held target fell out of sight and nothing else is visible
            ctl.target = None;
            ctl.lock_ticks = 0;
        }
        (None, None) => {
            ctl.target = None;
            ctl.lock_ticks = 0;
        }
    }
}

/// A torpedo on a collision course inside the dodge window. Returns the
/// evasion heading perpendicular to the torpedo's path, away from it.
fn assess_torpedo_threat(galaxy: &Galaxy, bot: &Player) -> Option<f32> {
    let mut nearest: Option<(f32, f32)> = None; // (distance, dodge heading)
    for proj in galaxy.projectiles.iter() {
        if proj.team == bot.team
            || proj.status != crate::game::state::ProjectileStatus::Moving
        {
            continue;
        }
        let to_bot = bot.pos - proj.pos;
        let dist = to_bot.length();
        if dist > DODGE_DISTANCE {
            continue;
        }
        let dir = Vec2::from_heading(proj.heading);
        // Closing at all?
        if dir.dot(to_bot) <= 0.0 {
            continue;
        }
        // Closest approach within the remaining fuse
        let t_ca = dir.dot(to_bot) / proj.speed;
        if t_ca > proj.fuse as f32 {
            continue;
        }
        let closest = proj.pos + dir * (t_ca * proj.speed);
        let miss = closest.distance_to(bot.pos);
        if miss > DODGE_MISS_DISTANCE {
            continue;
        }
        // Step aside on whichever side of the track we already are
        let side = dir.perpendicular().dot(to_bot);
        let dodge = if side >= 0.0 {
            dir.perpendicular().heading()
        } else {
            (-dir.perpendicular()).heading()
        };
        if nearest.map_or(true, |(d, _)| dist < d) {
            nearest = Some((dist, dodge));
        }
    }
    nearest.map(|(_, heading)| heading)
}

/// Choose an approach/evasion course. Stationary defenders hold position
/// but still run the weapons stage.
fn maneuver(galaxy: &Galaxy, bot: &Player, ctl: &mut BotControl, d: &mut Decision) {
    if bot.class.is_stationary() {
        d.des_speed = Some(0.0);
        return;
    }

    let target = ctl.target.and_then(|id| galaxy.get_player(id)).filter(|t| t.is_alive());

    if target.is_some() {
        // Dodging a live torpedo beats closing distance
        if let Some(dodge) = assess_torpedo_threat(galaxy, bot) {
            d.des_heading = Some(dodge);
            d.des_speed = Some(bot.stats.max_speed);
            d.break_orbit = true;
            return;
        }
    }

    match target {
        Some(t) => {
            let bearing = (t.pos - bot.pos).heading();
            let dist = bot.pos.distance_to(t.pos);
            d.des_heading = Some(bearing);
            d.des_speed = Some(if dist > ENGAGE_RANGE {
                bot.stats.max_speed
            } else {
                bot.stats.max_speed * 0.5
            });
            d.break_orbit = true;
        }
        None => {
            // Patrol/defend fallback; a persistent defense assignment
            // anchors the patrol to that planet
            let goal = ctl
                .defend_planet
                .and_then(|pid| galaxy.get_planet(pid))
                .map(|pl| pl.pos)
                .unwrap_or(ctl.patrol_goal);
            let goal = if goal.is_zero(1.0) || bot.pos.distance_to(goal) <= PATROL_REACHED {
                let mut rng = rand::thread_rng();
                let fresh = Vec2::new(
                    rng.gen_range(0.0..galaxy_bounds::SIZE),
                    rng.gen_range(0.0..galaxy_bounds::SIZE),
                );
                ctl.patrol_goal = fresh;
                fresh
            } else {
                goal
            };
            d.des_heading = Some((goal - bot.pos).heading());
            d.des_speed = Some(bot.stats.max_speed * 0.6);
        }
    }
}

/// Fire when in range, facing, and off cooldown. The lead comes from the
/// intercept solver; on solver failure the bot falls back to the direct
/// bearing. Resource shortfalls skip the shot without touching the lock.
fn weapons_trigger(galaxy: &Galaxy, bot: &Player, ctl: &mut BotControl, d: &mut Decision) {
    if ctl.cooldown > 0 {
        return;
    }
    let Some(target) = ctl.target.and_then(|id| galaxy.get_player(id)).filter(|t| t.is_alive())
    else {
        return;
    };

    let dist = bot.pos.distance_to(target.pos);
    let bearing = (target.pos - bot.pos).heading();

    if dist <= PHASER_TRIGGER_RANGE {
        if bot.fuel >= bot.stats.phaser_cost && bot.weapon_heat < bot.stats.max_weapon_heat {
            d.fire = Some(FireOrder::Phaser { target: target.id });
            ctl.cooldown = PHASER_COOLDOWN;
        }
        return;
    }

    if dist <= TORP_RANGE
        && angle_diff(bot.heading, bearing).abs() <= FACING_TOLERANCE
        && bot.fuel >= bot.stats.torp_cost
        && bot.weapon_heat < bot.stats.max_weapon_heat
        && galaxy.torp_count(bot.id) < MAX_TORPS
    {
        let lead = intercept::solve(
            bot.pos,
            target.pos,
            intercept::target_velocity(target, galaxy),
            bot.stats.torp_speed,
        );
        let heading = lead.map(|s| s.heading).unwrap_or(bearing);
        d.fire = Some(FireOrder::Torpedo { heading });
        ctl.cooldown = TORP_COOLDOWN;
    }
}
