//! Simulation configuration.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;

/// Tunables for a simulation run.
///
/// Every field has a default, so a config file only needs to mention what it
/// changes:
///
/// ```json
/// { "seed": 7, "zombie_wander_chance": 0.5 }
/// ```
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
  /// Seed for the simulation RNG. A given seed always replays the same game.
  pub seed: u64,
  /// The player's speed; 1.0 is baseline.
  pub player_speed: f64,
  /// How far the player can see without the help of a light source.
  pub player_vision_radius: i64,
  /// Chance that an idle zombie shuffles somewhere instead of groaning.
  pub zombie_wander_chance: f64,
  /// Maximum dispatches in a single [`Scheduler::run()`] call.
  ///
  /// [`Scheduler::run()`]: crate::schedule::Scheduler::run
  pub dispatch_budget: usize,
  /// Maximum A* expansions per path search.
  pub path_node_limit: usize,
  /// Maximum number of commands the player may have queued.
  pub command_queue_capacity: usize,
}

impl Default for SimConfig {
  fn default() -> Self {
    Self {
      seed: 0x5eed,
      player_speed: 1.0,
      player_vision_radius: 8,
      zombie_wander_chance: 0.3,
      dispatch_budget: 10_000,
      path_node_limit: 4096,
      command_queue_capacity: 32,
    }
  }
}

impl SimConfig {
  /// Parses a config from JSON text.
  pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
    let config: Self = serde_json::from_str(text)?;
    config.validate()?;
    Ok(config)
  }

  /// Reads and parses a JSON config file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    Self::from_json_str(&fs::read_to_string(path)?)
  }

  fn validate(&self) -> Result<(), ConfigError> {
    let invalid = |field, reason: &str| {
      Err(ConfigError::Invalid {
        field,
        reason: reason.to_string(),
      })
    };

    if !(self.player_speed > 0.0 && self.player_speed.is_finite()) {
      return invalid("player_speed", "must be a positive number");
    }
    if !(0.0..=1.0).contains(&self.zombie_wander_chance) {
      return invalid("zombie_wander_chance", "must be within 0..=1");
    }
    if self.player_vision_radius < 0 {
      return invalid("player_vision_radius", "must not be negative");
    }
    if self.dispatch_budget == 0 {
      return invalid("dispatch_budget", "must be at least 1");
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partial_configs_fill_in_defaults() {
    let config = SimConfig::from_json_str(r#"{ "seed": 7 }"#).unwrap();
    assert_eq!(config.seed, 7);
    assert_eq!(config.zombie_wander_chance, 0.3);
    assert_eq!(config.player_speed, 1.0);
  }

  #[test]
  fn rejects_bad_values() {
    assert!(matches!(
      SimConfig::from_json_str(r#"{ "player_speed": 0 }"#),
      Err(ConfigError::Invalid { field: "player_speed", .. })
    ));
    assert!(matches!(
      SimConfig::from_json_str(r#"{ "zombie_wander_chance": 1.5 }"#),
      Err(ConfigError::Invalid { .. })
    ));
    assert!(matches!(
      SimConfig::from_json_str(r#"{ "sed": 1 }"#),
      Err(ConfigError::Parse(_))
    ));
  }
}
