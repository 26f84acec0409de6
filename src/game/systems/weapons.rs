//! Weapons fire and hit detection
//!
//! Torpedoes and plasmas share one advance/fuse/hit-test lifecycle and
//! differ in acquisition; phasers are instantaneous line-vs-circle tests
//! with linear range falloff. All firing paths fail soft: a blocked shot
//! is a silent no-op that leaves every other field untouched.

use serde::{Deserialize, Serialize};

use crate::game::constants::weapons::*;
use crate::game::events::{GameEvent, PhaserHit};
use crate::game::spatial::PlayerGrid;
use crate::game::state::{
    Galaxy, Player, PlayerId, PlayerStatus, Projectile, ProjectileKind, ProjectileStatus,
};
use crate::util::vec2::Vec2;

/// Phaser aiming input: an explicit heading or the bearing to a target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PhaserAim {
    Heading(f32),
    Target(PlayerId),
}

/// Shared firing preconditions: alive, visible, not repairing, cool enough
/// and with fuel for the shot
fn weapon_ready(p: &Player, fuel_cost: f32) -> bool {
    p.is_alive()
        && !p.cloaked
        && !p.repairing
        && p.fuel >= fuel_cost
        && p.weapon_heat < p.stats.max_weapon_heat
}

/// Fire a torpedo along `heading`. Returns false when blocked.
pub fn fire_torpedo(
    galaxy: &mut Galaxy,
    shooter: PlayerId,
    heading: f32,
    events: &mut Vec<GameEvent>,
) -> bool {
    let Some(p) = galaxy.get_player(shooter) else {
        return false;
    };
    if !weapon_ready(p, p.stats.torp_cost) || galaxy.torp_count(shooter) >= MAX_TORPS {
        return false;
    }

    let Some(p) = galaxy.get_player_mut(shooter) else {
        return false;
    };
    p.fuel -= p.stats.torp_cost;
    p.weapon_heat += p.stats.torp_heat;
    let torp = Projectile::torpedo(p, heading);
    events.push(GameEvent::TorpedoLaunched {
        owner: shooter,
        pos: torp.pos,
        heading,
    });
    galaxy.projectiles.push(torp);
    true
}

/// Fire the single heavy plasma along `heading`. Returns false when blocked.
pub fn fire_plasma(
    galaxy: &mut Galaxy,
    shooter: PlayerId,
    heading: f32,
    events: &mut Vec<GameEvent>,
) -> bool {
    let Some(p) = galaxy.get_player(shooter) else {
        return false;
    };
    if !p.stats.has_plasma
        || !weapon_ready(p, p.stats.plasma_cost)
        || galaxy.plasma_count(shooter) >= MAX_PLASMAS
    {
        return false;
    }

    let Some(p) = galaxy.get_player_mut(shooter) else {
        return false;
    };
    p.fuel -= p.stats.plasma_cost;
    p.weapon_heat += p.stats.plasma_heat;
    let plasma = Projectile::plasma(p, heading);
    events.push(GameEvent::PlasmaLaunched {
        owner: shooter,
        pos: plasma.pos,
        heading,
    });
    galaxy.projectiles.push(plasma);
    true
}

/// Project `candidate` onto the firing ray and accept the hit if its
/// perpendicular offset is within `radius` (boundary inclusive). Returns
/// the candidate's true distance from the origin.
fn ray_hit(origin: Vec2, dir: Vec2, candidate: Vec2, radius: f32) -> Option<f32> {
    let rel = candidate - origin;
    // Clamp the projection parameter to the forward half-line, range-capped
    let t = rel.dot(dir).clamp(0.0, PHASER_RANGE);
    let closest = origin + dir * t;
    if closest.distance_to(candidate) <= radius {
        Some(rel.length())
    } else {
        None
    }
}

/// Fire a phaser. The beam is instantaneous: an enemy plasma anywhere on
/// the ray dies first and ends the shot; otherwise the nearest enemy ship
/// on the ray takes range-attenuated damage. A miss still costs fuel and
/// heat.
pub fn fire_phaser(
    galaxy: &mut Galaxy,
    shooter: PlayerId,
    aim: PhaserAim,
    events: &mut Vec<GameEvent>,
) -> bool {
    let Some(p) = galaxy.get_player(shooter) else {
        return false;
    };
    if !weapon_ready(p, p.stats.phaser_cost) {
        return false;
    }
    let origin = p.pos;
    let team = p.team;
    let base_damage = p.stats.phaser_damage;

    let heading = match aim {
        PhaserAim::Heading(h) => h,
        PhaserAim::Target(tid) => match galaxy.get_player(tid) {
            Some(t) if t.is_alive() && tid != shooter => (t.pos - origin).heading(),
            // Bad target id: discard with no state change
            _ => return false,
        },
    };
    let dir = Vec2::from_heading(heading);

    if let Some(p) = galaxy.get_player_mut(shooter) {
        p.fuel -= p.stats.phaser_cost;
        p.weapon_heat += p.stats.phaser_heat;
    }

    // Enemy plasma on the beam dies first and absorbs the whole shot
    let mut plasma_hit: Option<(usize, f32)> = None;
    for (i, proj) in galaxy.projectiles.iter().enumerate() {
        if proj.kind != ProjectileKind::Plasma
            || proj.team == team
            || proj.status != ProjectileStatus::Moving
        {
            continue;
        }
        if let Some(dist) = ray_hit(origin, dir, proj.pos, PHASER_PLASMA_RADIUS) {
            if plasma_hit.map_or(true, |(_, best)| dist < best) {
                plasma_hit = Some((i, dist));
            }
        }
    }
    if let Some((i, _)) = plasma_hit {
        galaxy.projectiles[i].status = ProjectileStatus::Consumed;
        events.push(GameEvent::PhaserFired {
            owner: shooter,
            heading,
            hit: PhaserHit::Plasma,
        });
        return true;
    }

    // Nearest enemy ship on the beam; ties broken by first found
    let mut ship_hit: Option<(PlayerId, f32)> = None;
    for t in galaxy.players.iter() {
        if !t.is_alive() || t.team == team || t.cloaked {
            continue;
        }
        if let Some(dist) = ray_hit(origin, dir, t.pos, PHASER_SHIP_RADIUS) {
            if dist <= PHASER_RANGE && ship_hit.map_or(true, |(_, best)| dist < best) {
                ship_hit = Some((t.id, dist));
            }
        }
    }

    match ship_hit {
        Some((victim, dist)) => {
            let damage = base_damage * (1.0 - dist / PHASER_RANGE);
            apply_damage(galaxy, victim, damage, Some(shooter), events);
            events.push(GameEvent::PhaserFired {
                owner: shooter,
                heading,
                hit: PhaserHit::Ship(victim),
            });
        }
        None => {
            events.push(GameEvent::PhaserFired {
                owner: shooter,
                heading,
                hit: PhaserHit::Miss,
            });
        }
    }
    true
}

/// Pilot-triggered early detonation of the owner's torpedoes in flight.
/// Each detonated torpedo costs fuel; stops when fuel runs out.
pub fn detonate_own_torpedoes(galaxy: &mut Galaxy, owner: PlayerId, events: &mut Vec<GameEvent>) {
    let Some(p) = galaxy.get_player(owner) else {
        return;
    };
    if !p.is_alive() {
        return;
    }

    let indices: Vec<usize> = galaxy
        .projectiles
        .iter()
        .enumerate()
        .filter(|(_, t)| {
            t.owner == owner
                && t.kind == ProjectileKind::Torpedo
                && t.status == ProjectileStatus::Moving
        })
        .map(|(i, _)| i)
        .collect();

    for i in indices {
        let Some(p) = galaxy.get_player_mut(owner) else {
            break;
        };
        if p.fuel < DETONATE_COST {
            break;
        }
        p.fuel -= DETONATE_COST;
        detonate(galaxy, i, events);
    }
}

/// Trigger a projectile's blast: full damage to every enemy ship within the
/// hit radius, then one visible Exploding tick before compaction.
fn detonate(galaxy: &mut Galaxy, index: usize, events: &mut Vec<GameEvent>) {
    let (pos, damage, team, kind, owner) = {
        let proj = &mut galaxy.projectiles[index];
        if proj.status != ProjectileStatus::Moving {
            return;
        }
        proj.status = ProjectileStatus::Exploding;
        (proj.pos, proj.damage, proj.team, proj.kind, proj.owner)
    };

    events.push(GameEvent::ProjectileDetonated { kind, pos });

    let victims: Vec<PlayerId> = galaxy
        .players
        .iter()
        .filter(|t| t.is_alive() && t.team != team && t.pos.distance_to(pos) <= TORP_HIT_RADIUS)
        .map(|t| t.id)
        .collect();
    for victim in victims {
        apply_damage(galaxy, victim, damage, Some(owner), events);
    }
}

/// Advance all projectiles one tick and resolve hits. Consumed entries are
/// compacted only here, after iteration is complete.
pub fn advance_projectiles(galaxy: &mut Galaxy, grid: &PlayerGrid, events: &mut Vec<GameEvent>) {
    for index in 0..galaxy.projectiles.len() {
        match galaxy.projectiles[index].status {
            ProjectileStatus::Consumed => continue,
            ProjectileStatus::Exploding => {
                galaxy.projectiles[index].status = ProjectileStatus::Consumed;
                continue;
            }
            ProjectileStatus::Moving => {}
        }

        let (pos, team) = {
            let proj = &mut galaxy.projectiles[index];
            proj.fuse = proj.fuse.saturating_sub(1);
            proj.pos += Vec2::from_heading(proj.heading) * proj.speed;
            (proj.pos, proj.team)
        };

        // Forced detonation on fuse expiry
        if galaxy.projectiles[index].fuse == 0 {
            detonate(galaxy, index, events);
            continue;
        }

        // Planet surface contact
        let planet_hit = galaxy
            .planets
            .iter()
            .any(|pl| pl.pos.distance_to(pos) <= PLANET_COLLISION_RADIUS);
        if planet_hit {
            detonate(galaxy, index, events);
            continue;
        }

        // Proximity to any enemy ship. The grid gives a superset of
        // candidates; the exact radius test decides.
        let triggered = grid.nearby(pos).iter().any(|&pid| {
            galaxy
                .get_player(pid)
                .map(|t| t.is_alive() && t.team != team && t.pos.distance_to(pos) <= TORP_HIT_RADIUS)
                .unwrap_or(false)
        });
        if triggered {
            detonate(galaxy, index, events);
        }
    }

    galaxy
        .projectiles
        .retain(|t| t.status != ProjectileStatus::Consumed);
}

/// Apply damage to a ship: raised shields absorb first, the remainder goes
/// to the hull; a hull at its maximum destroys the ship.
pub fn apply_damage(
    galaxy: &mut Galaxy,
    victim: PlayerId,
    amount: f32,
    killer: Option<PlayerId>,
    events: &mut Vec<GameEvent>,
) {
    if amount <= 0.0 {
        return;
    }
    let destroyed = {
        let Some(v) = galaxy.get_player_mut(victim) else {
            return;
        };
        if !v.is_alive() {
            return;
        }
        let mut remaining = amount;
        if v.shields_up {
            let absorbed = v.shields.min(remaining);
            v.shields -= absorbed;
            remaining -= absorbed;
        }
        v.hull_damage += remaining;
        v.hull_damage >= v.stats.max_hull
    };

    if destroyed {
        destroy_ship(galaxy, victim, killer, events);
    }
}

fn destroy_ship(
    galaxy: &mut Galaxy,
    victim: PlayerId,
    killer: Option<PlayerId>,
    events: &mut Vec<GameEvent>,
) {
    {
        let Some(v) = galaxy.get_player_mut(victim) else {
            return;
        };
        v.status = PlayerStatus::Explode;
        v.explode_timer = EXPLODE_TICKS;
        v.respawn_timer = crate::game::constants::bots::RESPAWN_TICKS;
        v.clear_combat_modes();
        v.speed = 0.0;
        v.des_speed = 0.0;
        v.armies = 0;
        v.deaths += 1;
        v.kills_since_death = 0.0;
    }

    if let Some(k) = killer {
        if k != victim {
            if let Some(killer_player) = galaxy.get_player_mut(k) {
                killer_player.kills += 1.0;
                killer_player.kills_since_death += 1.0;
            }
        }
    }

    tracing::debug!(victim, ?killer, "ship destroyed");
    events.push(GameEvent::ShipDestroyed { victim, killer });
}
