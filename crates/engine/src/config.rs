//! Simulation configuration.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub food: FoodConfig,
    #[serde(default)]
    pub virus: VirusConfig,
    #[serde(default)]
    pub eject: EjectConfig,
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub collision: CollisionConfig,
    #[serde(default)]
    pub bots: BotConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl Config {
    /// Load configuration from `path`, writing the defaults there if the file
    /// does not exist yet.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<Self>(&contents)?
        } else {
            info!("No {} found, creating default config", path.display());
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            default_config
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.world.size.is_finite() && self.world.size > 0.0) {
            return Err(ConfigError::InvalidWorldSize(self.world.size));
        }
        let bucket = self.simulation.bucket_size;
        if !(bucket.is_finite() && bucket > 0.0) {
            return Err(ConfigError::InvalidBucketSize(bucket));
        }
        if self.player.max_cells == 0 {
            return Err(ConfigError::NoCellCapacity);
        }
        if self.collision.eat_ratio <= 1.0 {
            return Err(ConfigError::EatRatio(self.collision.eat_ratio));
        }

        check_range("food radius", self.food.min_radius, self.food.max_radius)?;
        check_range("virus radius", self.virus.min_radius, self.virus.max_radius)?;
        check_range("physics speed", self.physics.speed_min, self.physics.speed_max)?;
        check_range("physics drag", self.physics.drag_min, self.physics.drag_max)?;
        check_range(
            "burst speed",
            self.collision.burst_speed_min,
            self.collision.burst_speed_max,
        )?;

        check_absorb("collision.food_absorb", self.collision.food_absorb)?;
        check_absorb("collision.engulf_absorb", self.collision.engulf_absorb)?;
        Ok(())
    }
}

fn check_range(field: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    if min > max {
        return Err(ConfigError::InvertedRange { field, min, max });
    }
    Ok(())
}

fn check_absorb(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::AbsorbFactor { field, value });
    }
    Ok(())
}

/// World geometry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorldConfig {
    /// Edge length of the square arena; coordinates live in `[0, size]`.
    #[serde(default = "default_world_size")]
    pub size: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            size: default_world_size(),
        }
    }
}

fn default_world_size() -> f32 {
    8000.0
}

/// Player cell configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerConfig {
    /// Radius of a freshly spawned cell.
    #[serde(default = "default_player_start_radius")]
    pub start_radius: f32,
    /// Cells below this radius are removed.
    #[serde(default = "default_player_min_radius")]
    pub min_radius: f32,
    #[serde(default = "default_player_max_cells")]
    pub max_cells: usize,
    #[serde(default = "default_player_split_min_radius")]
    pub split_min_radius: f32,
    /// Cooldown after a split or burst before same-owner cells may merge.
    #[serde(default = "default_player_merge_delay_ms")]
    pub merge_delay_ms: u64,
    /// Fraction of the child's launch speed applied backwards to the parent.
    #[serde(default = "default_player_split_recoil")]
    pub split_recoil: f32,
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
}

impl PlayerConfig {
    pub fn merge_delay(&self) -> Duration {
        Duration::from_millis(self.merge_delay_ms)
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            start_radius: default_player_start_radius(),
            min_radius: default_player_min_radius(),
            max_cells: default_player_max_cells(),
            split_min_radius: default_player_split_min_radius(),
            merge_delay_ms: default_player_merge_delay_ms(),
            split_recoil: default_player_split_recoil(),
            max_name_length: default_max_name_length(),
        }
    }
}

fn default_player_start_radius() -> f32 {
    35.0
}
fn default_player_min_radius() -> f32 {
    10.0
}
fn default_player_max_cells() -> usize {
    16
}
fn default_player_split_min_radius() -> f32 {
    24.0
}
fn default_player_merge_delay_ms() -> u64 {
    6000
}
fn default_player_split_recoil() -> f32 {
    0.25
}
fn default_max_name_length() -> usize {
    15
}

/// Food configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FoodConfig {
    /// Pool size the respawner works toward.
    #[serde(default = "default_food_target_count")]
    pub target_count: usize,
    /// Maximum pellets respawned per tick.
    #[serde(default = "default_food_respawn_batch")]
    pub respawn_batch: usize,
    #[serde(default = "default_food_min_radius")]
    pub min_radius: f32,
    #[serde(default = "default_food_max_radius")]
    pub max_radius: f32,
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self {
            target_count: default_food_target_count(),
            respawn_batch: default_food_respawn_batch(),
            min_radius: default_food_min_radius(),
            max_radius: default_food_max_radius(),
        }
    }
}

fn default_food_target_count() -> usize {
    2200
}
fn default_food_respawn_batch() -> usize {
    30
}
fn default_food_min_radius() -> f32 {
    3.0
}
fn default_food_max_radius() -> f32 {
    6.0
}

/// Virus configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VirusConfig {
    #[serde(default = "default_virus_count")]
    pub count: usize,
    #[serde(default = "default_virus_min_radius")]
    pub min_radius: f32,
    #[serde(default = "default_virus_max_radius")]
    pub max_radius: f32,
}

impl Default for VirusConfig {
    fn default() -> Self {
        Self {
            count: default_virus_count(),
            min_radius: default_virus_min_radius(),
            max_radius: default_virus_max_radius(),
        }
    }
}

fn default_virus_count() -> usize {
    20
}
fn default_virus_min_radius() -> f32 {
    36.0
}
fn default_virus_max_radius() -> f32 {
    52.0
}

/// Ejected pellet configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EjectConfig {
    #[serde(default = "default_eject_pellet_radius")]
    pub pellet_radius: f32,
    /// Launch speed of the pellet.
    #[serde(default = "default_eject_speed")]
    pub speed: f32,
    /// A cell must exceed `player.min_radius` by this much to eject.
    #[serde(default = "default_eject_min_margin")]
    pub min_margin: f32,
    /// Per-tick multiplicative velocity decay of a drifting pellet.
    #[serde(default = "default_eject_pellet_decay")]
    pub pellet_decay: f32,
}

impl Default for EjectConfig {
    fn default() -> Self {
        Self {
            pellet_radius: default_eject_pellet_radius(),
            speed: default_eject_speed(),
            min_margin: default_eject_min_margin(),
            pellet_decay: default_eject_pellet_decay(),
        }
    }
}

fn default_eject_pellet_radius() -> f32 {
    6.0
}
fn default_eject_speed() -> f32 {
    18.0
}
fn default_eject_min_margin() -> f32 {
    4.0
}
fn default_eject_pellet_decay() -> f32 {
    0.94
}

/// Movement tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PhysicsConfig {
    /// `K` in `max_speed = clamp(K / sqrt(r), speed_min, speed_max)`.
    #[serde(default = "default_speed_constant")]
    pub speed_constant: f32,
    #[serde(default = "default_speed_min")]
    pub speed_min: f32,
    #[serde(default = "default_speed_max")]
    pub speed_max: f32,
    /// Fraction of the speed cap added to the velocity per tick of intent.
    #[serde(default = "default_accel")]
    pub accel: f32,
    #[serde(default = "default_base_drag")]
    pub base_drag: f32,
    #[serde(default = "default_drag_scale")]
    pub drag_scale: f32,
    #[serde(default = "default_drag_factor")]
    pub drag_factor: f32,
    #[serde(default = "default_drag_min")]
    pub drag_min: f32,
    #[serde(default = "default_drag_max")]
    pub drag_max: f32,
    /// Upper bound on a single tick's `dt`.
    #[serde(default = "default_max_dt_ms")]
    pub max_dt_ms: u64,
}

impl PhysicsConfig {
    pub fn max_dt(&self) -> Duration {
        Duration::from_millis(self.max_dt_ms)
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            speed_constant: default_speed_constant(),
            speed_min: default_speed_min(),
            speed_max: default_speed_max(),
            accel: default_accel(),
            base_drag: default_base_drag(),
            drag_scale: default_drag_scale(),
            drag_factor: default_drag_factor(),
            drag_min: default_drag_min(),
            drag_max: default_drag_max(),
            max_dt_ms: default_max_dt_ms(),
        }
    }
}

fn default_speed_constant() -> f32 {
    140.0
}
fn default_speed_min() -> f32 {
    12.0
}
fn default_speed_max() -> f32 {
    80.0
}
fn default_accel() -> f32 {
    0.12
}
fn default_base_drag() -> f32 {
    0.86
}
fn default_drag_scale() -> f32 {
    300.0
}
fn default_drag_factor() -> f32 {
    0.15
}
fn default_drag_min() -> f32 {
    0.7
}
fn default_drag_max() -> f32 {
    0.96
}
fn default_max_dt_ms() -> u64 {
    50
}

/// Consumption, burst and merge tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CollisionConfig {
    /// Extra query padding around a cell when looking for food.
    #[serde(default = "default_food_query_margin")]
    pub food_query_margin: f32,
    /// Share of a pellet's squared radius kept when eaten.
    #[serde(default = "default_food_absorb")]
    pub food_absorb: f32,
    /// Radius ratio needed to eat another player's cell or to burst on a virus.
    #[serde(default = "default_eat_ratio")]
    pub eat_ratio: f32,
    #[serde(default = "default_burst_max_pieces")]
    pub burst_max_pieces: usize,
    #[serde(default = "default_burst_speed_min")]
    pub burst_speed_min: f32,
    #[serde(default = "default_burst_speed_max")]
    pub burst_speed_max: f32,
    /// Same-owner cells merge when `d² <= merge_overlap * (ra + rb)²`.
    #[serde(default = "default_merge_overlap")]
    pub merge_overlap: f32,
    #[serde(default = "default_repel_strength")]
    pub repel_strength: f32,
    /// Share of the victim's squared radius kept when engulfed.
    #[serde(default = "default_engulf_absorb")]
    pub engulf_absorb: f32,
    /// Query radius multiplier for cell-vs-cell lookups.
    #[serde(default = "default_cell_query_scale")]
    pub cell_query_scale: f32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            food_query_margin: default_food_query_margin(),
            food_absorb: default_food_absorb(),
            eat_ratio: default_eat_ratio(),
            burst_max_pieces: default_burst_max_pieces(),
            burst_speed_min: default_burst_speed_min(),
            burst_speed_max: default_burst_speed_max(),
            merge_overlap: default_merge_overlap(),
            repel_strength: default_repel_strength(),
            engulf_absorb: default_engulf_absorb(),
            cell_query_scale: default_cell_query_scale(),
        }
    }
}

fn default_food_query_margin() -> f32 {
    8.0
}
fn default_food_absorb() -> f32 {
    0.8
}
fn default_eat_ratio() -> f32 {
    1.12
}
fn default_burst_max_pieces() -> usize {
    8
}
fn default_burst_speed_min() -> f32 {
    20.0
}
fn default_burst_speed_max() -> f32 {
    34.0
}
fn default_merge_overlap() -> f32 {
    0.9
}
fn default_repel_strength() -> f32 {
    0.02
}
fn default_engulf_absorb() -> f32 {
    0.92
}
fn default_cell_query_scale() -> f32 {
    1.2
}

/// Bot population and heuristic tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    /// Number of bots seeded into the world at startup.
    #[serde(default = "default_bot_count")]
    pub count: usize,
    #[serde(default = "default_sense_radius")]
    pub sense_radius: f32,
    #[serde(default = "default_chase_radius")]
    pub chase_radius: f32,
    /// A cell is prey when its radius is below this fraction of the bot cell's.
    #[serde(default = "default_prey_ratio")]
    pub prey_ratio: f32,
    /// Intent magnitude while wandering without a target.
    #[serde(default = "default_wander_weight")]
    pub wander_weight: f32,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            count: default_bot_count(),
            sense_radius: default_sense_radius(),
            chase_radius: default_chase_radius(),
            prey_ratio: default_prey_ratio(),
            wander_weight: default_wander_weight(),
        }
    }
}

fn default_bot_count() -> usize {
    25
}
fn default_sense_radius() -> f32 {
    600.0
}
fn default_chase_radius() -> f32 {
    500.0
}
fn default_prey_ratio() -> f32 {
    0.9
}
fn default_wander_weight() -> f32 {
    0.25
}

/// Tick loop and indexing settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    /// Tick interval in milliseconds used by the runner.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Edge length of a spatial index bucket.
    #[serde(default = "default_bucket_size")]
    pub bucket_size: f32,
    /// Fixed RNG seed; entropy-seeded when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Emit a per-tick statistics line every this many ticks (0 disables).
    #[serde(default = "default_log_interval_ticks")]
    pub log_interval_ticks: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
            bucket_size: default_bucket_size(),
            seed: None,
            log_interval_ticks: default_log_interval_ticks(),
        }
    }
}

fn default_tick_interval() -> u64 {
    16
}
fn default_bucket_size() -> f32 {
    220.0
}
fn default_log_interval_ticks() -> u64 {
    400
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert_eq!(Config::default().validate(), Ok(()));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml(
            r#"
            [world]
            size = 2000.0

            [simulation]
            seed = 7
            "#,
        )
        .unwrap();

        assert_eq!(config.world.size, 2000.0);
        assert_eq!(config.simulation.seed, Some(7));
        assert_eq!(config.player.max_cells, 16);
        assert_eq!(config.simulation.bucket_size, 220.0);
    }

    #[test]
    fn test_rejects_bad_bucket_size() {
        let mut config = Config::default();
        config.simulation.bucket_size = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidBucketSize(0.0)));
    }

    #[test]
    fn test_rejects_inflating_absorb_factor() {
        let mut config = Config::default();
        config.collision.food_absorb = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::AbsorbFactor { .. })
        ));
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed = Config::from_toml(&text).unwrap();
        assert_eq!(parsed.food.target_count, 2200);
        assert_eq!(parsed.player.merge_delay(), Duration::from_millis(6000));
    }
}
