//! Victory conditions and the tournament state machine
//!
//! Evaluated once per tick after all other updates, against the aggregate
//! counters the loop just recomputed. Reaching game-over freezes further
//! evaluation; the session layer schedules the deferred reset.

use crate::game::constants::time::secs_to_ticks;
use crate::game::constants::{tourney, victory as victory_rules};
use crate::game::events::GameEvent;
use crate::game::ships::ShipTable;
use crate::game::state::{Galaxy, GamePhase, Team, VictoryKind, VictoryOutcome};

/// Tournament transitions plus victory evaluation for one tick. Returns
/// the outcome when this tick ended the game.
pub fn update(
    galaxy: &mut Galaxy,
    table: &ShipTable,
    events: &mut Vec<GameEvent>,
) -> Option<VictoryOutcome> {
    if galaxy.phase == GamePhase::GameOver {
        // Frozen until the deferred reset runs
        return None;
    }

    update_tournament(galaxy, table, events);

    let outcome = evaluate_victory(galaxy)?;
    galaxy.phase = GamePhase::GameOver;
    galaxy.outcome = Some(outcome.clone());
    let names: Vec<&str> = outcome.winners.iter().map(|t| t.name()).collect();
    tracing::info!(kind = ?outcome.kind, winners = ?names, "game over");
    events.push(GameEvent::Victory {
        outcome: outcome.clone(),
    });
    Some(outcome)
}

/// Teams currently fielding enough connected, alive players for tournament
/// play
fn teams_at_strength(galaxy: &Galaxy) -> usize {
    let counts = galaxy.team_connected_counts();
    Team::ALL
        .iter()
        .filter(|t| {
            counts[t.index()] >= tourney::MIN_PLAYERS_PER_TEAM
                && galaxy.team_alive[t.index()] > 0
        })
        .count()
}

fn update_tournament(galaxy: &mut Galaxy, table: &ShipTable, events: &mut Vec<GameEvent>) {
    let at_strength = teams_at_strength(galaxy);

    match galaxy.phase {
        GamePhase::Normal => {
            if at_strength >= tourney::MIN_TEAMS {
                // Fair start: full galaxy and ship reset, then the clock
                tracing::info!("tournament mode: {} teams at strength", at_strength);
                galaxy.reset_fair_start(table);
                galaxy.phase = GamePhase::Tournament;
                galaxy.tourney_active = true;
                galaxy.tourney_start = galaxy.frame;
                galaxy.tourney_remaining = secs_to_ticks(tourney::DURATION_SECS);
                events.push(GameEvent::TournamentStarted);
            }
        }
        GamePhase::Tournament => {
            if at_strength < tourney::MIN_TEAMS {
                tracing::info!("tournament mode cancelled: teams fell below strength");
                galaxy.phase = GamePhase::Normal;
                galaxy.tourney_active = false;
                galaxy.tourney_remaining = 0;
                events.push(GameEvent::TournamentCancelled);
                return;
            }
            // Remaining time is recomputed from the tick count, never from
            // wall clock, so replays stay deterministic
            let elapsed = galaxy.frame.saturating_sub(galaxy.tourney_start);
            let total = secs_to_ticks(tourney::DURATION_SECS);
            galaxy.tourney_remaining = total.saturating_sub(elapsed);

            for &mark in tourney::ANNOUNCE_SECS.iter() {
                if galaxy.tourney_remaining == secs_to_ticks(mark) {
                    events.push(GameEvent::TournamentTimeRemaining { secs: mark });
                }
            }
        }
        GamePhase::GameOver => {}
    }
}

/// The four victory conditions in strict priority order, gated on the
/// elapsed-tick and player-count floors.
fn evaluate_victory(galaxy: &Galaxy) -> Option<VictoryOutcome> {
    if galaxy.frame < victory_rules::MIN_FRAMES
        || galaxy.occupied_count() < victory_rules::MIN_PLAYERS
    {
        return None;
    }

    let teams_ever = galaxy.team_ever_fielded.iter().filter(|&&f| f).count();
    let teams_with_living: Vec<Team> = Team::ALL
        .iter()
        .copied()
        .filter(|t| galaxy.team_alive[t.index()] > 0)
        .collect();

    // Genocide: at least two teams have ever fielded players and exactly
    // one still has living ones
    if teams_ever >= 2 && teams_with_living.len() == 1 {
        return Some(VictoryOutcome {
            kind: VictoryKind::Genocide,
            winners: teams_with_living,
        });
    }

    let total_planets = galaxy.planets.len() as u32;
    let owning_teams: Vec<Team> = Team::ALL
        .iter()
        .copied()
        .filter(|t| galaxy.team_planets[t.index()] > 0)
        .collect();

    // Conquest: one team owns every planet
    if let Some(&team) = owning_teams.first() {
        if owning_teams.len() == 1 && galaxy.team_planets[team.index()] == total_planets {
            return Some(VictoryOutcome {
                kind: VictoryKind::Conquest,
                winners: vec![team],
            });
        }
    }

    // Domination: a single owner, independents remain, and no living enemy
    // carries armies that could retake anything
    if owning_teams.len() == 1 {
        let team = owning_teams[0];
        let independents = total_planets - galaxy.team_planets[team.index()];
        if independents > 0 && !galaxy.enemy_carriers_alive(team) {
            return Some(VictoryOutcome {
                kind: VictoryKind::Domination,
                winners: vec![team],
            });
        }
    }

    // Timeout: tournament clock expired; teams tied for most planets co-win
    if galaxy.tourney_active && galaxy.tourney_remaining == 0 {
        let most = galaxy.team_planets.iter().copied().max().unwrap_or(0);
        let winners: Vec<Team> = Team::ALL
            .iter()
            .copied()
            .filter(|t| galaxy.team_planets[t.index()] == most && most > 0)
            .collect();
        if !winners.is_empty() {
            return Some(VictoryOutcome {
                kind: VictoryKind::Timeout,
                winners,
            });
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::time::TICK_RATE;
    use crate::game::ships::ShipClass;
    use crate::game::state::{PlayerId, PlayerStatus};
    use crate::util::vec2::Vec2;

    fn add_ship(galaxy: &mut Galaxy, id: PlayerId, team: Team, connected: bool) {
        let table = ShipTable::builtin();
        let p = galaxy.get_player_mut(id).unwrap();
        p.outfit(
            format!("P{}", id),
            team,
            ShipClass::Cruiser,
            table.get(ShipClass::Cruiser).clone(),
            true,
        );
        galaxy
            .get_player_mut(id)
            .unwrap()
            .launch(Vec2::new(10_000.0 + id as f32 * 500.0, 10_000.0), 0.0);
        galaxy.get_player_mut(id).unwrap().connected = connected;
    }

    fn run_tick(galaxy: &mut Galaxy) -> (Option<VictoryOutcome>, Vec<GameEvent>) {
        let table = ShipTable::builtin();
        let mut events = Vec::new();
        galaxy.recount();
        let outcome = update(galaxy, &table, &mut events);
        (outcome, events)
    }

    fn two_team_galaxy() -> Galaxy {
        let mut galaxy = Galaxy::new();
        add_ship(&mut galaxy, 0, Team::Federation, true);
        add_ship(&mut galaxy, 1, Team::Klingon, true);
        galaxy.frame = victory_rules::MIN_FRAMES + 1;
        galaxy
    }

    #[test]
    fn test_no_victory_before_floor() {
        let mut galaxy = two_team_galaxy();
        galaxy.frame = victory_rules::MIN_FRAMES - 1;
        galaxy.get_player_mut(1).unwrap().status = PlayerStatus::Dead;
        let (outcome, _) = run_tick(&mut galaxy);
        assert!(outcome.is_none());
    }

    #[test]
    fn test_genocide_for_sole_survivor() {
        let mut galaxy = two_team_galaxy();
        galaxy.get_player_mut(1).unwrap().status = PlayerStatus::Dead;

        let (outcome, events) = run_tick(&mut galaxy);

        let outcome = outcome.expect("genocide declared");
        assert_eq!(outcome.kind, VictoryKind::Genocide);
        assert_eq!(outcome.winners, vec![Team::Federation]);
        assert_eq!(galaxy.phase, GamePhase::GameOver);
        assert!(events.iter().any(|e| matches!(e, GameEvent::Victory { .. })));
    }

    #[test]
    fn test_genocide_requires_two_teams_ever() {
        let mut galaxy = Galaxy::new();
        add_ship(&mut galaxy, 0, Team::Federation, true);
        add_ship(&mut galaxy, 1, Team::Federation, true);
        galaxy.frame = victory_rules::MIN_FRAMES + 1;
        let (outcome, _) = run_tick(&mut galaxy);
        assert!(outcome.is_none());
    }

    #[test]
    fn test_conquest_on_total_ownership() {
        let mut galaxy = two_team_galaxy();
        for planet in galaxy.planets.iter_mut() {
            planet.owner = Some(Team::Klingon);
        }
        let (outcome, _) = run_tick(&mut galaxy);
        let outcome = outcome.expect("conquest declared");
        assert_eq!(outcome.kind, VictoryKind::Conquest);
        assert_eq!(outcome.winners, vec![Team::Klingon]);
    }

    #[test]
    fn test_genocide_outranks_conquest() {
        let mut galaxy = two_team_galaxy();
        for planet in galaxy.planets.iter_mut() {
            planet.owner = Some(Team::Klingon);
        }
        // Klingon also wiped out the Federation: genocide wins the tie
        galaxy.get_player_mut(0).unwrap().status = PlayerStatus::Dead;
        let (outcome, _) = run_tick(&mut galaxy);
        assert_eq!(outcome.unwrap().kind, VictoryKind::Genocide);
    }

    #[test]
    fn test_domination_requires_no_enemy_carriers() {
        let mut galaxy = two_team_galaxy();
        // Klingon owns everything it can; the rest are independent
        for planet in galaxy.planets.iter_mut() {
            planet.owner = if planet.id % 2 == 0 {
                Some(Team::Klingon)
            } else {
                None
            };
        }
        // A living Federation player carrying armies blocks domination
        galaxy.get_player_mut(0).unwrap().armies = 2;
        let (outcome, _) = run_tick(&mut galaxy);
        assert!(outcome.is_none());

        galaxy.get_player_mut(0).unwrap().armies = 0;
        let (outcome, _) = run_tick(&mut galaxy);
        let outcome = outcome.expect("domination declared");
        assert_eq!(outcome.kind, VictoryKind::Domination);
        assert_eq!(outcome.winners, vec![Team::Klingon]);
    }

    #[test]
    fn test_timeout_co_victory_on_tie() {
        let mut galaxy = two_team_galaxy();
        // Even planet split between two teams
        for planet in galaxy.planets.iter_mut() {
            planet.owner = if planet.id % 2 == 0 {
                Some(Team::Federation)
            } else {
                Some(Team::Klingon)
            };
        }
        galaxy.tourney_active = true;
        galaxy.tourney_remaining = 0;

        let (outcome, _) = run_tick(&mut galaxy);
        let outcome = outcome.expect("timeout declared");
        assert_eq!(outcome.kind, VictoryKind::Timeout);
        assert_eq!(outcome.winners.len(), 2);
        assert!(outcome.winners.contains(&Team::Federation));
        assert!(outcome.winners.contains(&Team::Klingon));
    }

    #[test]
    fn test_game_over_freezes_evaluation() {
        let mut galaxy = two_team_galaxy();
        galaxy.get_player_mut(1).unwrap().status = PlayerStatus::Dead;
        let (first, _) = run_tick(&mut galaxy);
        assert!(first.is_some());
        // Second tick: still game over, but no second declaration
        let (second, events) = run_tick(&mut galaxy);
        assert!(second.is_none());
        assert!(events.is_empty());
    }

    #[test]
    fn test_tournament_entry_resets_and_starts_clock() {
        let mut galaxy = Galaxy::new();
        // Four connected alive players on each of two teams
        for id in 0..4 {
            add_ship(&mut galaxy, id, Team::Federation, true);
        }
        for id in 4..8 {
            add_ship(&mut galaxy, id, Team::Klingon, true);
        }
        galaxy.frame = 50;
        // Scar the galaxy so the reset is observable
        galaxy.planets[0].armies = 1;

        let (_, events) = run_tick(&mut galaxy);

        assert_eq!(galaxy.phase, GamePhase::Tournament);
        assert!(galaxy.tourney_active);
        assert_eq!(
            galaxy.tourney_remaining,
            secs_to_ticks(tourney::DURATION_SECS)
        );
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::TournamentStarted)));
        // Reset restored the planet template
        assert_ne!(galaxy.planets[0].armies, 1);
    }

    #[test]
    fn test_tournament_exit_below_strength() {
        let mut galaxy = Galaxy::new();
        for id in 0..4 {
            add_ship(&mut galaxy, id, Team::Federation, true);
        }
        for id in 4..8 {
            add_ship(&mut galaxy, id, Team::Klingon, true);
        }
        let (_, _) = run_tick(&mut galaxy);
        assert_eq!(galaxy.phase, GamePhase::Tournament);

        // A Klingon disconnects: below strength, tournament cancels
        galaxy.get_player_mut(4).unwrap().connected = false;
        let (_, events) = run_tick(&mut galaxy);
        assert_eq!(galaxy.phase, GamePhase::Normal);
        assert!(!galaxy.tourney_active);
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::TournamentCancelled)));
    }

    #[test]
    fn test_tournament_announces_marks() {
        let mut galaxy = Galaxy::new();
        for id in 0..4 {
            add_ship(&mut galaxy, id, Team::Federation, true);
        }
        for id in 4..8 {
            add_ship(&mut galaxy, id, Team::Klingon, true);
        }
        let (_, _) = run_tick(&mut galaxy);
        assert_eq!(galaxy.phase, GamePhase::Tournament);

        // Advance to exactly the 15-minute mark
        let total = secs_to_ticks(tourney::DURATION_SECS);
        galaxy.frame = galaxy.tourney_start + (total - secs_to_ticks(900));
        let (_, events) = run_tick(&mut galaxy);
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::TournamentTimeRemaining { secs: 900 })));
    }

    #[test]
    fn test_remaining_recomputed_from_ticks() {
        let mut galaxy = Galaxy::new();
        for id in 0..4 {
            add_ship(&mut galaxy, id, Team::Federation, true);
        }
        for id in 4..8 {
            add_ship(&mut galaxy, id, Team::Klingon, true);
        }
        let (_, _) = run_tick(&mut galaxy);
        let start = galaxy.tourney_start;

        galaxy.frame = start + 5 * TICK_RATE as u64; // five seconds in
        let (_, _) = run_tick(&mut galaxy);
        assert_eq!(
            galaxy.tourney_remaining,
            secs_to_ticks(tourney::DURATION_SECS) - 5 * TICK_RATE as u64
        );
    }
}
