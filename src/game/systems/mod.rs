pub mod movement;
pub mod weapons;
pub mod bots;
pub mod victory;
