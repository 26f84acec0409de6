pub mod constants;
pub mod ships;
pub mod state;
pub mod events;
pub mod spatial;
pub mod intercept;
pub mod systems;
pub mod game_loop;
pub mod performance;
