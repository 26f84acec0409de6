//! Per-tick kinematics and resource bookkeeping
//!
//! Integrates desired-vs-actual heading and speed for every ship in play,
//! runs orbit kinematics (a circular path at fixed angular velocity that
//! overrides linear motion), advances explosion timers, and applies the
//! per-tick resource trickle: fuel recharge, weapon cooling, shield
//! regeneration, repair, cloak and tractor drain, bombing and beaming.

use crate::game::constants::{galaxy, orbit, planets as planet_rules};
use crate::game::events::GameEvent;
use crate::game::state::{BeamDirection, Galaxy, PlayerStatus, TractorMode};
use crate::util::vec2::{angle_diff, norm_angle, Vec2};

/// Advance every player one tick
pub fn update(galaxy: &mut Galaxy, events: &mut Vec<GameEvent>) {
    steer_locks(galaxy);
    integrate_motion(galaxy);
    apply_tractors(galaxy);
    update_resources(galaxy);
    update_planet_interaction(galaxy, events);
    scout_planets(galaxy);
}

/// A held navigation lock keeps the desired course pointed at its target
fn steer_locks(galaxy: &mut Galaxy) {
    let bearings: Vec<(usize, f32)> = galaxy
        .players
        .iter()
        .enumerate()
        .filter(|(_, p)| p.is_alive() && p.orbiting.is_none())
        .filter_map(|(i, p)| {
            let goal = match p.lock? {
                crate::game::state::LockTarget::Planet(pid) => {
                    galaxy.get_planet(pid).map(|pl| pl.pos)
                }
                crate::game::state::LockTarget::Player(tid) => galaxy
                    .get_player(tid)
                    .filter(|t| t.is_alive())
                    .map(|t| t.pos),
            }?;
            Some((i, (goal - p.pos).heading()))
        })
        .collect();
    for (i, bearing) in bearings {
        galaxy.players[i].des_heading = bearing;
    }
}

fn integrate_motion(galaxy: &mut Galaxy) {
    let Galaxy {
        players, planets, ..
    } = galaxy;

    for p in players.iter_mut() {
        match p.status {
            PlayerStatus::Alive => {}
            PlayerStatus::Explode => {
                p.explode_timer = p.explode_timer.saturating_sub(1);
                if p.explode_timer == 0 {
                    p.status = PlayerStatus::Dead;
                }
                continue;
            }
            _ => continue,
        }

        if let Some(pid) = p.orbiting {
            // Circular path at fixed angular velocity; the linear speed
            // field does not apply while in orbit
            if let Some(planet) = planets.get(pid as usize) {
                let angle = (p.pos - planet.pos).heading() + orbit::ANGULAR_RATE;
                p.pos = planet.pos + Vec2::from_heading(angle) * orbit::RADIUS;
                p.heading = norm_angle(angle + std::f32::consts::FRAC_PI_2);
                p.des_heading = p.heading;
            } else {
                p.orbiting = None;
            }
            continue;
        }

        // Turn toward the desired course, rate-limited per class
        let diff = angle_diff(p.heading, p.des_heading);
        let turn = diff.abs().min(p.stats.turn_rate);
        p.heading = norm_angle(p.heading + turn.copysign(diff));

        // Accelerate/decelerate toward the desired speed
        let target_speed = p.des_speed.clamp(0.0, p.stats.max_speed);
        let delta = (target_speed - p.speed).clamp(-p.stats.accel, p.stats.accel);
        p.speed += delta;

        p.pos += Vec2::from_heading(p.heading) * p.speed;
        p.pos.x = p.pos.x.clamp(0.0, galaxy::SIZE);
        p.pos.y = p.pos.y.clamp(0.0, galaxy::SIZE);
    }
}

/// Tractor/pressor beams displace the target and burn the holder's fuel.
/// Computed in a read pass, then applied, since two ships are involved.
fn apply_tractors(galaxy: &mut Galaxy) {
    struct Pull {
        holder: usize,
        target: usize,
        delta: Vec2,
        cost: f32,
    }
    let mut pulls: Vec<Pull> = Vec::new();
    let mut released: Vec<usize> = Vec::new();

    for (i, p) in galaxy.players.iter().enumerate() {
        let Some((mode, tid)) = p.tractor else { continue };
        if !p.is_alive() {
            continue;
        }
        let target = match galaxy.get_player(tid) {
            Some(t) if t.is_alive() => t,
            _ => {
                released.push(i);
                continue;
            }
        };
        let span = target.pos - p.pos;
        let dist = span.length();
        if dist > p.stats.tractor_range || p.fuel < p.stats.tractor_cost {
            released.push(i);
            continue;
        }
        let dir = span.normalize();
        let delta = match mode {
            TractorMode::Tractor => -dir * p.stats.tractor_strength,
            TractorMode::Pressor => dir * p.stats.tractor_strength,
        };
        pulls.push(Pull {
            holder: i,
            target: tid as usize,
            delta,
            cost: p.stats.tractor_cost,
        });
    }

    for i in released {
        galaxy.players[i].tractor = None;
    }
    for pull in pulls {
        galaxy.players[pull.holder].fuel -= pull.cost;
        let t = &mut galaxy.players[pull.target];
        t.pos += pull.delta;
        t.pos.x = t.pos.x.clamp(0.0, galaxy::SIZE);
        t.pos.y = t.pos.y.clamp(0.0, galaxy::SIZE);
        // Being dragged breaks orbit
        t.orbiting = None;
    }
}

fn update_resources(galaxy: &mut Galaxy) {
    let Galaxy {
        players, planets, ..
    } = galaxy;

    for p in players.iter_mut() {
        if !p.is_alive() {
            continue;
        }

        // Fuel recharge, boosted while orbiting a friendly planet
        let mut recharge = p.stats.recharge;
        if let Some(pid) = p.orbiting {
            if let Some(planet) = planets.get(pid as usize) {
                if planet.owner == Some(p.team) {
                    recharge *= planet_rules::FRIENDLY_ORBIT_REFUEL;
                }
            }
        }
        p.fuel = (p.fuel + recharge).min(p.stats.max_fuel);

        p.weapon_heat = (p.weapon_heat - p.stats.weapon_cooling).max(0.0);

        if p.cloaked {
            p.fuel -= p.stats.cloak_cost;
            if p.fuel <= 0.0 {
                p.fuel = 0.0;
                p.cloaked = false;
            }
        }

        if p.repairing {
            // Repair only proceeds at rest; moving cancels it
            if p.speed > 0.0 || p.des_speed > 0.0 {
                p.repairing = false;
            } else {
                p.hull_damage = (p.hull_damage - p.stats.repair_rate).max(0.0);
                p.shields =
                    (p.shields + p.stats.shield_regen * 2.0).min(p.stats.max_shields);
            }
        } else if !p.cloaked {
            p.shields = (p.shields + p.stats.shield_regen).min(p.stats.max_shields);
        }
    }
}

fn update_planet_interaction(galaxy: &mut Galaxy, events: &mut Vec<GameEvent>) {
    let frame = galaxy.frame;
    let Galaxy {
        players, planets, ..
    } = galaxy;

    for p in players.iter_mut() {
        if !p.is_alive() {
            continue;
        }
        let Some(pid) = p.orbiting else {
            p.bombing = false;
            p.beaming = None;
            continue;
        };
        let Some(planet) = planets.get_mut(pid as usize) else {
            continue;
        };

        // Bombing: one army per interval, enemy or independent planets only
        if p.bombing {
            if planet.owner == Some(p.team) {
                p.bombing = false;
            } else if planet.armies > 0 && frame % planet_rules::BOMB_INTERVAL == 0 {
                planet.armies -= 1;
                planet.mark_scouted(p.team);
                events.push(GameEvent::PlanetBombed {
                    planet: planet.id,
                    by: p.id,
                    armies_left: planet.armies,
                });
            }
        }

        // Beaming: one army per interval
        if let Some(dir) = p.beaming {
            if frame % planet_rules::BEAM_INTERVAL == 0 {
                match dir {
                    BeamDirection::Up => {
                        if planet.owner == Some(p.team)
                            && planet.armies > 0
                            && p.armies < p.army_capacity()
                        {
                            planet.armies -= 1;
                            p.armies += 1;
                        }
                    }
                    BeamDirection::Down => {
                        if p.armies == 0 {
                            p.beaming = None;
                        } else if planet.owner == Some(p.team) {
                            planet.armies += 1;
                            p.armies -= 1;
                        } else if planet.armies > 0 {
                            // Ground combat: one of ours for one of theirs
                            planet.armies -= 1;
                            p.armies -= 1;
                        } else {
                            // Defenseless planet: this army takes it
                            planet.owner = Some(p.team);
                            planet.armies = planet_rules::CAPTURE_GARRISON;
                            planet.mark_scouted(p.team);
                            p.armies -= 1;
                            events.push(GameEvent::PlanetCaptured {
                                planet: planet.id,
                                team: p.team,
                            });
                        }
                    }
                }
            }
        }
    }
}

/// Reveal planets a ship flies near
fn scout_planets(galaxy: &mut Galaxy) {
    let Galaxy {
        players, planets, ..
    } = galaxy;
    for p in players.iter().filter(|p| p.is_alive()) {
        for planet in planets.iter_mut() {
            if !planet.scouted_by(p.team)
                && planet.pos.distance_sq_to(p.pos)
                    <= planet_rules::SCOUT_RANGE * planet_rules::SCOUT_RANGE
            {
                planet.mark_scouted(p.team);
            }
        }
    }
}
