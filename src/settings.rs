/*
Skygrid, new-island placement for skyblock-style voxel servers.
Copyright (c) 2021  Galaxtone, Exopteron

This program is free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/
use super::grid;
use super::location::{Location, WorldId};
use chrono::Local;
use env_logger::Builder;
use log::LevelFilter;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_CONFIG: &str = r#"# Default config

# Amount of threads to use. Defaults to logical core count.
# worker_threads = 8
# One of off, error, warn, info, debug, trace.
log_level = "info"

[placement]
# How many cells with unknown blocks around their centre to skip before
# giving up on a world. Cells holding known islands are not counted.
max_obstructions = 20
# Record an island at cells found obstructed so later searches skip them.
reserve_obstructed = true

# One table per world that hosts islands.
[worlds.skyblock]
# Half the side of an island square, in blocks.
island_distance = 400
island_height = 120
island_start_x = 0
island_start_z = 0
island_x_offset = 0
island_z_offset = 0
# Worlds generated by this server's own generator skip the terrain check.
use_own_generator = false
"#;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not access configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Keeps the grid step (twice the distance) inside `i32`.
pub const MAX_ISLAND_DISTANCE: i32 = i32::MAX / 4;

fn default_log_level() -> String {
    "info".to_string()
}
fn default_max_obstructions() -> u32 {
    20
}
fn default_reserve_obstructed() -> bool {
    true
}

#[derive(serde_derive::Deserialize, Clone, Debug)]
pub struct PlacementOptions {
    #[serde(default = "default_max_obstructions")]
    pub max_obstructions: u32,
    #[serde(default = "default_reserve_obstructed")]
    pub reserve_obstructed: bool,
}
impl Default for PlacementOptions {
    fn default() -> Self {
        PlacementOptions {
            max_obstructions: default_max_obstructions(),
            reserve_obstructed: default_reserve_obstructed(),
        }
    }
}

/// Island grid parameters of one world.
#[derive(serde_derive::Deserialize, Clone, Debug, PartialEq)]
pub struct WorldOptions {
    pub island_distance: i32,
    pub island_height: i32,
    #[serde(default)]
    pub island_start_x: i32,
    #[serde(default)]
    pub island_start_z: i32,
    #[serde(default)]
    pub island_x_offset: i32,
    #[serde(default)]
    pub island_z_offset: i32,
    #[serde(default)]
    pub use_own_generator: bool,
}
impl WorldOptions {
    /// Where the first island of an empty world goes.
    pub fn start_location(&self, world: &WorldId) -> Location {
        Location::new(
            world.clone(),
            self.island_start_x + self.island_x_offset,
            self.island_height,
            self.island_start_z + self.island_z_offset,
        )
    }
}

#[derive(serde_derive::Deserialize, Clone, Debug)]
pub struct Settings {
    pub worker_threads: Option<usize>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub placement: PlacementOptions,
    #[serde(default)]
    pub worlds: HashMap<String, WorldOptions>,
}

/// Source of per-world grid parameters.
pub trait WorldConfig: Send + Sync {
    fn world_options(&self, world: &WorldId) -> Option<WorldOptions>;
}
impl WorldConfig for Settings {
    fn world_options(&self, world: &WorldId) -> Option<WorldOptions> {
        self.worlds.get(world.name()).cloned()
    }
}

impl Settings {
    pub fn parse(file: &str) -> Result<Settings, ConfigError> {
        let settings: Settings = toml::from_str(file)?;
        settings.validate()?;
        Ok(settings)
    }
    /// Reads `path`, writing the default configuration there first if it is missing.
    pub fn load(path: &Path) -> Result<Settings, ConfigError> {
        let file = if path.exists() {
            std::fs::read_to_string(path)?
        } else {
            log::info!("Generating configuration file.");
            std::fs::write(path, DEFAULT_CONFIG)?;
            DEFAULT_CONFIG.to_string()
        };
        Settings::parse(&file)
    }
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, world) in &self.worlds {
            if world.island_distance <= 0 || world.island_distance > MAX_ISLAND_DISTANCE {
                return Err(ConfigError::Invalid(format!(
                    "island_distance of world {} must be between 1 and {}",
                    name, MAX_ISLAND_DISTANCE
                )));
            }
            let start_x = world.island_start_x.checked_add(world.island_x_offset);
            let start_z = world.island_start_z.checked_add(world.island_z_offset);
            let fits = match (start_x, start_z) {
                (Some(x), Some(z)) => grid::cell_fits(
                    &Location::new(WorldId::new(name), x, world.island_height, z),
                    world.island_distance,
                ),
                _ => false,
            };
            if !fits {
                return Err(ConfigError::Invalid(format!(
                    "first island of world {} lies outside the world",
                    name
                )));
            }
        }
        if self.placement.max_obstructions == 0 {
            return Err(ConfigError::Invalid(
                "max_obstructions must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
    pub fn log_filter(&self) -> LevelFilter {
        LevelFilter::from_str(&self.log_level).unwrap_or(LevelFilter::Info)
    }
}

pub fn init_logger(level: LevelFilter) {
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] - {}",
                Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_parses() {
        let settings = Settings::parse(DEFAULT_CONFIG).unwrap();
        assert_eq!(settings.worker_threads, None);
        assert_eq!(settings.log_filter(), LevelFilter::Info);
        assert_eq!(settings.placement.max_obstructions, 20);
        assert!(settings.placement.reserve_obstructed);
        let world = settings.world_options(&WorldId::new("skyblock")).unwrap();
        assert_eq!(world.island_distance, 400);
        assert_eq!(world.island_height, 120);
        assert!(!world.use_own_generator);
    }

    #[test]
    fn start_location_adds_offsets() {
        let settings = Settings::parse(
            r#"
            [worlds.oneblock]
            island_distance = 64
            island_height = 80
            island_start_x = 1000
            island_start_z = -1000
            island_x_offset = 3
            island_z_offset = 4
            "#,
        )
        .unwrap();
        let world = WorldId::new("oneblock");
        let start = settings.world_options(&world).unwrap().start_location(&world);
        assert_eq!(start, Location::new(world, 1003, 80, -996));
        assert!(settings.world_options(&WorldId::new("skyblock")).is_none());
    }

    #[test]
    fn rejects_non_positive_distance() {
        let res = Settings::parse(
            r#"
            [worlds.skyblock]
            island_distance = 0
            island_height = 120
            "#,
        );
        assert!(matches!(res, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_oversized_distance() {
        let res = Settings::parse(
            r#"
            [worlds.skyblock]
            island_distance = 1500000000
            island_height = 120
            "#,
        );
        assert!(matches!(res, Err(ConfigError::Invalid(_))));
        let at_limit = format!(
            "[worlds.skyblock]\nisland_distance = {}\nisland_height = 120\n",
            MAX_ISLAND_DISTANCE
        );
        assert!(Settings::parse(&at_limit).is_ok());
    }

    #[test]
    fn rejects_start_outside_the_world() {
        let overflowing = Settings::parse(
            r#"
            [worlds.skyblock]
            island_distance = 400
            island_height = 120
            island_start_x = 2147483000
            island_x_offset = 1000
            "#,
        );
        assert!(matches!(overflowing, Err(ConfigError::Invalid(_))));
        let at_edge = Settings::parse(
            r#"
            [worlds.skyblock]
            island_distance = 400
            island_height = 120
            island_start_z = -2147483500
            "#,
        );
        assert!(matches!(at_edge, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            Settings::parse("worlds = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let settings = Settings::parse(r#"log_level = "chatty""#).unwrap();
        assert_eq!(settings.log_filter(), LevelFilter::Info);
    }
}
