//! Lead-pursuit intercept solver
//!
//! Pure geometry: given shooter position, target position, target velocity
//! (world units per tick) and projectile speed, find the firing heading and
//! flight time at which the projectile and the linearly-extrapolated target
//! coincide.
//!
//! With `r` the target offset relative to the shooter, `v` the target
//! velocity and `s` the projectile speed, the intercept time solves
//!
//! ```text
//! (|v|^2 - s^2) * t^2  +  2 (r . v) * t  +  |r|^2  =  0
//! ```
//!
//! Infeasibility (target outrunning the projectile) is a value, not an
//! error: callers fall back to firing at the target's current position.

use crate::game::constants::orbit::ANGULAR_RATE;
use crate::game::state::{Galaxy, Player};
use crate::util::vec2::Vec2;

/// Treat |coefficient| below this as zero when classifying the quadratic
const COEFF_EPSILON: f32 = 1e-6;

/// Flight time returned for a target already at the shooter's position
const CONTACT_TIME: f32 = 1e-3;

/// A feasible firing solution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterceptSolution {
    /// Firing heading in radians
    pub heading: f32,
    /// Projectile flight time in ticks
    pub ticks: f32,
}

/// Solve for the lead-pursuit firing direction.
///
/// Returns `None` when no forward-time intercept exists at this projectile
/// speed. Degenerate cases, in order: coincident target, stationary target,
/// vanishing quadratic coefficient, then the full quadratic with the
/// earliest feasible (smallest positive) root.
pub fn solve(
    shooter: Vec2,
    target: Vec2,
    target_vel: Vec2,
    projectile_speed: f32,
) -> Option<InterceptSolution> {
    if projectile_speed <= 0.0 {
        return None;
    }

    let r = target - shooter;

    // Target on top of us: any heading works, report contact in negligible
    // positive time rather than exactly zero
    if r.is_zero(COEFF_EPSILON) {
        return Some(InterceptSolution {
            heading: 0.0,
            ticks: CONTACT_TIME,
        });
    }

    // Stationary target: fire straight at it
    if target_vel.is_zero(COEFF_EPSILON) {
        let dist = r.length();
        return Some(InterceptSolution {
            heading: r.heading(),
            ticks: dist / projectile_speed,
        });
    }

    let a = target_vel.length_sq() - projectile_speed * projectile_speed;
    let b = r.dot(target_vel); // half the linear coefficient
    let c = r.length_sq();

    let t = if a.abs() < COEFF_EPSILON {
        // Linear: 2bt + c = 0
        let t = -c / (2.0 * b);
        if t < 0.0 {
            return None;
        }
        t
    } else {
        let disc = b * b - a * c;
        if disc < 0.0 {
            // Target unreachable at this speed
            return None;
        }
        let sqrt_disc = disc.sqrt();
        let t1 = (-b - sqrt_disc) / a;
        let t2 = (-b + sqrt_disc) / a;
        // Earliest feasible intercept
        match (t1 >= 0.0, t2 >= 0.0) {
            (true, true) => t1.min(t2),
            (true, false) => t1,
            (false, true) => t2,
            (false, false) => return None,
        }
    };

    let aim_point = target + target_vel * t;
    Some(InterceptSolution {
        heading: (aim_point - shooter).heading(),
        ticks: t,
    })
}

/// True per-tick velocity of a player for lead calculations.
///
/// An orbiting ship moves tangentially at angular-rate x orbit-radius,
/// perpendicular to the radius vector - its stored linear speed field is
/// meaningless while in orbit and would make every lead systematically
/// wrong.
pub fn target_velocity(target: &Player, galaxy: &Galaxy) -> Vec2 {
    if let Some(pid) = target.orbiting {
        if let Some(planet) = galaxy.get_planet(pid) {
            let radial = target.pos - planet.pos;
            return radial.perpendicular().normalize() * (ANGULAR_RATE * radial.length());
        }
    }
    Vec2::from_heading(target.heading) * target.speed
}
