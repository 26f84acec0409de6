//! Per-ship-class parameter table.
//!
//! The table is immutable input data: the simulation copies a row into each
//! player at outfit time and never writes it back. A JSON file pointed at by
//! `SHIP_TABLE_PATH` may override the builtin values.

use serde::{Deserialize, Serialize};

/// Ship class, ordered roughly by tonnage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShipClass {
    Scout,
    Destroyer,
    Cruiser,
    Battleship,
    Assault,
    Starbase,
}

impl ShipClass {
    pub const ALL: [ShipClass; 6] = [
        ShipClass::Scout,
        ShipClass::Destroyer,
        ShipClass::Cruiser,
        ShipClass::Battleship,
        ShipClass::Assault,
        ShipClass::Starbase,
    ];

    pub fn index(self) -> usize {
        match self {
            ShipClass::Scout => 0,
            ShipClass::Destroyer => 1,
            ShipClass::Cruiser => 2,
            ShipClass::Battleship => 3,
            ShipClass::Assault => 4,
            ShipClass::Starbase => 5,
        }
    }

    /// Starbases hold position; they defend without maneuvering
    pub fn is_stationary(self) -> bool {
        matches!(self, ShipClass::Starbase)
    }
}

/// One row of the class table. Speeds are world units per tick, turn rates
/// radians per tick, costs in fuel units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipStats {
    pub class: ShipClass,
    pub max_speed: f32,
    pub turn_rate: f32,
    pub accel: f32,
    pub max_shields: f32,
    pub max_hull: f32,
    pub max_fuel: f32,
    pub recharge: f32,
    pub shield_regen: f32,
    pub repair_rate: f32,
    pub weapon_cooling: f32,
    pub max_weapon_heat: f32,
    pub max_armies: u32,
    pub torp_speed: f32,
    pub torp_damage: f32,
    pub torp_fuse: u32,
    pub torp_cost: f32,
    pub torp_heat: f32,
    pub has_plasma: bool,
    pub plasma_speed: f32,
    pub plasma_damage: f32,
    pub plasma_fuse: u32,
    pub plasma_cost: f32,
    pub plasma_heat: f32,
    pub phaser_damage: f32,
    pub phaser_cost: f32,
    pub phaser_heat: f32,
    pub cloak_cost: f32,
    pub tractor_strength: f32,
    pub tractor_range: f32,
    pub tractor_cost: f32,
}

/// The full class table, indexable by [`ShipClass`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipTable {
    rows: Vec<ShipStats>,
}

impl ShipTable {
    /// Builtin rule-set values
    pub fn builtin() -> Self {
        let rows = vec![
            ShipStats {
                class: ShipClass::Scout,
                max_speed: 240.0,
                turn_rate: 0.35,
                accel: 20.0,
                max_shields: 75.0,
                max_hull: 75.0,
                max_fuel: 5_000.0,
                recharge: 8.0,
                shield_regen: 0.6,
                repair_rate: 0.8,
                weapon_cooling: 20.0,
                max_weapon_heat: 1_000.0,
                max_armies: 2,
                torp_speed: 320.0,
                torp_damage: 25.0,
                torp_fuse: 16,
                torp_cost: 175.0,
                torp_heat: 50.0,
                has_plasma: false,
                plasma_speed: 0.0,
                plasma_damage: 0.0,
                plasma_fuse: 0,
                plasma_cost: 0.0,
                plasma_heat: 0.0,
                phaser_damage: 75.0,
                phaser_cost: 525.0,
                phaser_heat: 70.0,
                cloak_cost: 17.0,
                tractor_strength: 16.0,
                tractor_range: 3_000.0,
                tractor_cost: 20.0,
            },
            ShipStats {
                class: ShipClass::Destroyer,
                max_speed: 200.0,
                turn_rate: 0.30,
                accel: 16.0,
                max_shields: 85.0,
                max_hull: 85.0,
                max_fuel: 7_000.0,
                recharge: 9.0,
                shield_regen: 0.7,
                repair_rate: 1.0,
                weapon_cooling: 20.0,
                max_weapon_heat: 1_000.0,
                max_armies: 5,
                torp_speed: 300.0,
                torp_damage: 30.0,
                torp_fuse: 18,
                torp_cost: 210.0,
                torp_heat: 50.0,
                has_plasma: true,
                plasma_speed: 300.0,
                plasma_damage: 75.0,
                plasma_fuse: 30,
                plasma_cost: 1_500.0,
                plasma_heat: 210.0,
                phaser_damage: 85.0,
                phaser_cost: 595.0,
                phaser_heat: 80.0,
                cloak_cost: 20.0,
                tractor_strength: 19.0,
                tractor_range: 3_200.0,
                tractor_cost: 24.0,
            },
            ShipStats {
                class: ShipClass::Cruiser,
                max_speed: 180.0,
                turn_rate: 0.25,
                accel: 15.0,
                max_shields: 100.0,
                max_hull: 100.0,
                max_fuel: 10_000.0,
                recharge: 10.0,
                shield_regen: 0.8,
                repair_rate: 1.1,
                weapon_cooling: 20.0,
                max_weapon_heat: 1_000.0,
                max_armies: 10,
                torp_speed: 300.0,
                torp_damage: 40.0,
                torp_fuse: 20,
                torp_cost: 280.0,
                torp_heat: 50.0,
                has_plasma: true,
                plasma_speed: 300.0,
                plasma_damage: 100.0,
                plasma_fuse: 35,
                plasma_cost: 2_000.0,
                plasma_heat: 230.0,
                phaser_damage: 100.0,
                phaser_cost: 700.0,
                phaser_heat: 90.0,
                cloak_cost: 26.0,
                tractor_strength: 21.0,
                tractor_range: 3_500.0,
                tractor_cost: 30.0,
            },
            ShipStats {
                class: ShipClass::Battleship,
                max_speed: 160.0,
                turn_rate: 0.20,
                accel: 12.0,
                max_shields: 130.0,
                max_hull: 130.0,
                max_fuel: 14_000.0,
                recharge: 12.0,
                shield_regen: 0.9,
                repair_rate: 1.3,
                weapon_cooling: 25.0,
                max_weapon_heat: 1_000.0,
                max_armies: 6,
                torp_speed: 300.0,
                torp_damage: 40.0,
                torp_fuse: 20,
                torp_cost: 280.0,
                torp_heat: 50.0,
                has_plasma: true,
                plasma_speed: 300.0,
                plasma_damage: 130.0,
                plasma_fuse: 35,
                plasma_cost: 2_600.0,
                plasma_heat: 250.0,
                phaser_damage: 105.0,
                phaser_cost: 735.0,
                phaser_heat: 95.0,
                cloak_cost: 30.0,
                tractor_strength: 25.0,
                tractor_range: 3_800.0,
                tractor_cost: 35.0,
            },
            ShipStats {
                class: ShipClass::Assault,
                max_speed: 170.0,
                turn_rate: 0.22,
                accel: 13.0,
                max_shields: 80.0,
                max_hull: 200.0,
                max_fuel: 6_000.0,
                recharge: 8.0,
                shield_regen: 0.6,
                repair_rate: 1.2,
                weapon_cooling: 20.0,
                max_weapon_heat: 1_000.0,
                max_armies: 20,
                torp_speed: 280.0,
                torp_damage: 30.0,
                torp_fuse: 18,
                torp_cost: 210.0,
                torp_heat: 50.0,
                has_plasma: false,
                plasma_speed: 0.0,
                plasma_damage: 0.0,
                plasma_fuse: 0,
                plasma_cost: 0.0,
                plasma_heat: 0.0,
                phaser_damage: 80.0,
                phaser_cost: 560.0,
                phaser_heat: 75.0,
                cloak_cost: 17.0,
                tractor_strength: 18.0,
                tractor_range: 3_000.0,
                tractor_cost: 24.0,
            },
            ShipStats {
                class: ShipClass::Starbase,
                max_speed: 40.0,
                turn_rate: 0.10,
                accel: 4.0,
                max_shields: 500.0,
                max_hull: 600.0,
                max_fuel: 60_000.0,
                recharge: 35.0,
                shield_regen: 2.0,
                repair_rate: 2.5,
                weapon_cooling: 40.0,
                max_weapon_heat: 1_300.0,
                max_armies: 25,
                torp_speed: 300.0,
                torp_damage: 30.0,
                torp_fuse: 30,
                torp_cost: 300.0,
                torp_heat: 50.0,
                has_plasma: true,
                plasma_speed: 300.0,
                plasma_damage: 150.0,
                plasma_fuse: 25,
                plasma_cost: 3_000.0,
                plasma_heat: 300.0,
                phaser_damage: 120.0,
                phaser_cost: 840.0,
                phaser_heat: 100.0,
                cloak_cost: 75.0,
                tractor_strength: 30.0,
                tractor_range: 4_500.0,
                tractor_cost: 40.0,
            },
        ];
        Self { rows }
    }

    /// Load the table, honoring a `SHIP_TABLE_PATH` JSON override if set
    pub fn load_or_builtin() -> Self {
        match std::env::var("SHIP_TABLE_PATH") {
            Ok(path) => match Self::from_json_file(&path) {
                Ok(table) => {
                    tracing::info!("Loaded ship table override from {}", path);
                    table
                }
                Err(e) => {
                    tracing::warn!("Ignoring ship table at {}: {}", path, e);
                    Self::builtin()
                }
            },
            Err(_) => Self::builtin(),
        }
    }

    pub fn from_json_file(path: &str) -> Result<Self, String> {
        let data = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        let table: ShipTable = serde_json::from_str(&data).map_err(|e| e.to_string())?;
        table.validate()?;
        Ok(table)
    }

    /// Reject tables that would break simulation invariants
    pub fn validate(&self) -> Result<(), String> {
        if self.rows.len() != ShipClass::ALL.len() {
            return Err(format!(
                "ship table must have {} rows, has {}",
                ShipClass::ALL.len(),
                self.rows.len()
            ));
        }
        for (i, class) in ShipClass::ALL.iter().enumerate() {
            let row = &self.rows[i];
            if row.class != *class {
                return Err(format!("row {} must describe {:?}", i, class));
            }
            if row.max_speed < 0.0 || row.max_hull <= 0.0 || row.max_fuel <= 0.0 {
                return Err(format!("{:?}: non-positive core stats", class));
            }
            if row.torp_speed <= 0.0 || row.torp_fuse == 0 {
                return Err(format!("{:?}: torpedoes must move and expire", class));
            }
            if row.has_plasma && (row.plasma_speed <= 0.0 || row.plasma_fuse == 0) {
                return Err(format!("{:?}: plasma profile incomplete", class));
            }
        }
        Ok(())
    }

    #[inline]
    pub fn get(&self, class: ShipClass) -> &ShipStats {
        &self.rows[class.index()]
    }
}

impl Default for ShipTable {
    fn default() -> Self {
        Self::builtin()
    }
}
