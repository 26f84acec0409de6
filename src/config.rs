//! Server configuration loaded from the environment

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The loop keeps at least this many occupied slots by adding bots
    pub bot_fill: usize,
    /// Bounded per-consumer event queue capacity
    pub event_queue_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bot_fill: 8,
            event_queue_capacity: 256,
        }
    }
}

impl ServerConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("BOT_FILL") {
            if let Ok(parsed) = raw.parse::<usize>() {
                config.bot_fill = parsed;
            } else {
                tracing::warn!("Invalid BOT_FILL '{}', using default", raw);
            }
        }

        if let Ok(raw) = std::env::var("EVENT_QUEUE_CAPACITY") {
            if let Ok(parsed) = raw.parse::<usize>() {
                if parsed > 0 {
                    config.event_queue_capacity = parsed;
                } else {
                    tracing::warn!("EVENT_QUEUE_CAPACITY must be > 0, using default");
                }
            } else {
                tracing::warn!("Invalid EVENT_QUEUE_CAPACITY '{}', using default", raw);
            }
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        use crate::game::constants::galaxy::MAX_PLAYERS;
        if self.bot_fill > MAX_PLAYERS {
            return Err(format!(
                "bot_fill {} exceeds the {} player slots",
                self.bot_fill, MAX_PLAYERS
            ));
        }
        if self.event_queue_capacity == 0 {
            return Err("event_queue_capacity must be at least 1".to_string());
        }
        Ok(())
    }
}
