mod config;
mod game;
mod net;
mod util;

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, Level};

use crate::config::ServerConfig;
use crate::game::game_loop::{GameLoop, GameLoopConfig};
use crate::game::ships::ShipTable;
use crate::net::session::{start_tick_driver, SessionHub};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    info!("Quadrant Server v{}", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::load_or_default();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;
    info!(
        "Configuration loaded: bot_fill={}, event_queue_capacity={}",
        config.bot_fill, config.event_queue_capacity
    );

    let table = ShipTable::load_or_builtin();
    table
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid ship table: {}", e))?;

    let game = Arc::new(Mutex::new(GameLoop::new(
        table,
        GameLoopConfig {
            bot_fill: config.bot_fill,
        },
    )));
    let hub = SessionHub::new(game, config.event_queue_capacity);

    let driver = start_tick_driver(hub.clone());
    info!("simulation running; transport attaches via SessionHub");

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    driver.abort();

    let game = hub.game().lock();
    info!(
        "final state: frame={}, players={}",
        game.state().frame,
        game.state().occupied_count()
    );
    Ok(())
}
