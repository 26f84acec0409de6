//! Session hub and tick driver
//!
//! Owns the single exclusive lock over the simulation. The tick driver and
//! every command handler take the same `parking_lot::Mutex`, scoped to the
//! critical section - nothing holds it across an await point. Outbound
//! notifications go through the bounded best-effort outbox.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;
use uuid::Uuid;

use crate::game::constants::time::{TICK_DURATION_MS, TICK_RATE};
use crate::game::constants::victory::RESET_DELAY_SECS;
use crate::game::events::GameEvent;
use crate::game::game_loop::GameLoop;
use crate::game::performance::PerformanceMonitor;
use crate::game::ships::ShipClass;
use crate::game::state::{PlayerId, PlayerStatus, Team};
use crate::net::outbox::Outbox;
use crate::net::protocol::{GalaxySnapshot, GameCommand, ServerEvent};

/// The shared simulation state behind its exclusive lock
pub type SharedGame = Arc<Mutex<GameLoop>>;

/// Snapshots go out every third tick
const SNAPSHOT_INTERVAL: u64 = 3;

/// Why a login was rejected. Slot exhaustion is the only hard failure the
/// core surfaces to a joining player.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JoinError {
    #[error("server full")]
    ServerFull,
    #[error("team {0} is over strength, join a smaller team")]
    TeamImbalance(&'static str),
}

/// A login/outfit request, already validated by the transport
#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub name: String,
    pub team: Team,
    pub class: ShipClass,
}

/// A successful login: slot, session token, and the event stream
#[derive(Debug)]
pub struct LoginTicket {
    pub player: PlayerId,
    pub token: Uuid,
    pub events: Receiver<ServerEvent>,
    pub reconnected: bool,
}

/// Session hub: login/outfit flow plus event fan-out
pub struct SessionHub {
    game: SharedGame,
    outbox: Mutex<Outbox>,
    sessions: Mutex<hashbrown::HashMap<Uuid, PlayerId>>,
}

impl SessionHub {
    pub fn new(game: SharedGame, queue_capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            game,
            outbox: Mutex::new(Outbox::new(queue_capacity)),
            sessions: Mutex::new(hashbrown::HashMap::new()),
        })
    }

    pub fn game(&self) -> &SharedGame {
        &self.game
    }

    /// Allocate or reconnect a player slot.
    ///
    /// Reconnection matches identity: same name, team and ship class on a
    /// currently disconnected but still-living slot. Fresh joins enforce
    /// team balance: a team already larger than the smallest team rejects
    /// new members.
    pub fn login(&self, request: LoginRequest) -> Result<LoginTicket, JoinError> {
        let (player, reconnected, name, team) = {
            let mut game = self.game.lock();
            let galaxy = game.state_mut();

            let reconnect_slot = galaxy.players.iter().find(|p| {
                !p.connected
                    && matches!(p.status, PlayerStatus::Alive | PlayerStatus::Explode)
                    && p.name == request.name
                    && p.team == request.team
                    && p.class == request.class
                    && !p.is_bot
            });

            if let Some(id) = reconnect_slot.map(|p| p.id) {
                if let Some(p) = galaxy.get_player_mut(id) {
                    p.connected = true;
                }
                info!(player = id, name = %request.name, "player reconnected");
                (id, true, request.name.clone(), request.team)
            } else {
                // Team balance before slot allocation: joining a team that
                // is strictly larger than some other team is rejected
                let counts = galaxy.team_connected_counts();
                let smallest = counts.iter().copied().min().unwrap_or(0);
                if counts[request.team.index()] > smallest {
                    return Err(JoinError::TeamImbalance(request.team.name()));
                }

                let slot = galaxy.free_slot().ok_or(JoinError::ServerFull)?;
                let stats = game.ship_table().get(request.class).clone();
                game.state_mut().players[slot as usize].outfit(
                    request.name.clone(),
                    request.team,
                    request.class,
                    stats,
                    false,
                );
                info!(player = slot, name = %request.name, team = request.team.name(), "player joined");
                (slot, false, request.name.clone(), request.team)
            }
        };

        let token = Uuid::new_v4();
        self.sessions.lock().insert(token, player);
        let events = self.outbox.lock().subscribe(token);
        self.broadcast(&ServerEvent::PlayerJoined { player, name, team });

        Ok(LoginTicket {
            player,
            token,
            events,
            reconnected,
        })
    }

    /// Put an outfitted ship into play near its home world
    pub fn launch(&self, token: Uuid) {
        let Some(player) = self.player_for(token) else {
            return;
        };
        let mut game = self.game.lock();
        let galaxy = game.state_mut();
        let Some(p) = galaxy.get_player(player) else {
            return;
        };
        if p.status != PlayerStatus::Outfit {
            return;
        }
        let team = p.team;
        let spawn = galaxy.spawn_point(team, &mut rand::thread_rng());
        if let Some(p) = galaxy.get_player_mut(player) {
            p.launch(spawn, 0.0);
        }
    }

    /// Apply one command for the session's player and broadcast whatever
    /// it produced
    pub fn submit(&self, token: Uuid, command: GameCommand) {
        let Some(player) = self.player_for(token) else {
            return;
        };
        let events = {
            let mut game = self.game.lock();
            game.apply_command(player, command)
        };
        self.broadcast_game_events(events);
        if matches!(command, GameCommand::Quit) {
            self.drop_session(token, player);
        }
    }

    /// Disconnect a session (transport closed, player quit)
    pub fn logout(&self, token: Uuid) {
        let Some(player) = self.player_for(token) else {
            return;
        };
        {
            let mut game = self.game.lock();
            game.disconnect(player);
        }
        self.drop_session(token, player);
    }

    fn drop_session(&self, token: Uuid, player: PlayerId) {
        self.sessions.lock().remove(&token);
        self.outbox.lock().unsubscribe(token);
        self.broadcast(&ServerEvent::PlayerLeft { player });
    }

    fn player_for(&self, token: Uuid) -> Option<PlayerId> {
        self.sessions.lock().get(&token).copied()
    }

    pub fn broadcast(&self, event: &ServerEvent) {
        self.outbox.lock().broadcast(event);
    }

    fn broadcast_game_events(&self, events: Vec<GameEvent>) {
        if events.is_empty() {
            return;
        }
        let mut outbox = self.outbox.lock();
        for event in events {
            outbox.broadcast(&ServerEvent::from(event));
        }
    }

    /// Announce a victory outcome as a human-readable system message
    fn announce(&self, event: &GameEvent) {
        if let GameEvent::Victory { outcome } = event {
            let names: Vec<&str> = outcome.winners.iter().map(|t| t.name()).collect();
            self.broadcast(&ServerEvent::Message {
                text: format!("{:?} victory: {}", outcome.kind, names.join(", ")),
            });
        }
    }
}

/// Spawn the fixed-rate tick driver. Each firing takes the lock for
/// exactly one tick's critical section, then broadcasts outside it. The
/// post-victory reset re-acquires the lock from an independent delayed
/// task.
pub fn start_tick_driver(hub: Arc<SessionHub>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_millis(TICK_DURATION_MS));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut perf = PerformanceMonitor::new(TICK_RATE);

        loop {
            ticker.tick().await;

            // Critical section: one simulation tick, no awaits inside
            let (events, snapshot) = {
                let mut game = hub.game.lock();
                perf.tick_start();
                let events = game.tick();
                perf.tick_end();
                let snapshot = if game.state().frame % SNAPSHOT_INTERVAL == 0 {
                    Some(GalaxySnapshot::capture(game.state()))
                } else {
                    None
                };
                (events, snapshot)
            };

            let game_over = events
                .iter()
                .any(|e| matches!(e, GameEvent::Victory { .. }));
            for event in &events {
                hub.announce(event);
            }
            hub.broadcast_game_events(events);
            if let Some(snapshot) = snapshot {
                hub.broadcast(&ServerEvent::Snapshot(snapshot));
            }

            if game_over {
                schedule_reset(hub.clone());
            }

            // Periodic one-line status
            let frame = { hub.game.lock().state().frame };
            if frame % (TICK_RATE as u64 * 30) == 0 {
                let (players, bots, projectiles) = {
                    let game = hub.game.lock();
                    (
                        game.state().occupied_count(),
                        game.bot_count(),
                        game.state().projectiles.len(),
                    )
                };
                info!(
                    frame,
                    players,
                    bots,
                    projectiles,
                    budget_pct = perf.budget_used_pct() as u32,
                    "tick status"
                );
            }
        }
    })
}

/// Deferred full-state reset after game over: an independent delayed task
/// that re-acquires the lock when it runs.
fn schedule_reset(hub: Arc<SessionHub>) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(RESET_DELAY_SECS)).await;
        let events = {
            let mut game = hub.game.lock();
            game.reset_after_victory()
        };
        hub.broadcast_game_events(events);
        info!("post-victory reset complete");
    });
}
