use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::utils::Range;

pub mod overrides;
pub mod rewards;

pub use overrides::*;
pub use rewards::*;

/// Behaviour preset used for the uncontrolled traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OtherVehiclesType {
    #[default]
    Idm,
    Aggressive,
    Defensive,
}

/// Full configuration of a highway scenario.
///
/// Loading a full file requires every key; partial files go through
/// [`EnvConfigOverride`] instead.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnvConfig {
    #[serde(default)]
    pub seed: Option<u64>,
    /// Physics updates per simulated second.
    pub simulation_frequency: u32,
    /// Agent decisions per simulated second.
    pub policy_frequency: u32,
    pub lanes_count: usize,
    pub vehicles_count: usize,
    pub controlled_vehicles: usize,
    /// Lane of the controlled vehicles, random when absent.
    #[serde(default)]
    pub initial_lane_id: Option<usize>,
    /// Episode length in simulated seconds.
    pub duration: f64,
    pub ego_spacing: f64,
    pub vehicles_density: f64,
    pub other_vehicles_type: OtherVehiclesType,
    pub reward_speed_range: Range,
    pub front_distance_range: Range,
    pub rear_distance_range: Range,
    pub normalize_reward: bool,
    pub offroad_terminal: bool,
    pub rewards: RewardWeights,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            seed: None,
            simulation_frequency: 15,
            policy_frequency: 1,
            lanes_count: 4,
            vehicles_count: 50,
            controlled_vehicles: 1,
            initial_lane_id: None,
            duration: 40.0,
            ego_spacing: 2.0,
            vehicles_density: 1.0,
            other_vehicles_type: OtherVehiclesType::Idm,
            reward_speed_range: [-40.0, 40.0],
            front_distance_range: [0.0, 30.0],
            rear_distance_range: [0.0, 30.0],
            normalize_reward: true,
            offroad_terminal: false,
            rewards: RewardWeights::default(),
        }
    }
}

impl EnvConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("loading config {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EnvConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Simulation frames integrated per agent decision.
    pub fn frames_per_action(&self) -> u32 {
        (self.simulation_frequency / self.policy_frequency).max(1)
    }

    /// Bounds of the combined reward before normalization onto `[0, 1]`.
    pub fn normalization_bounds(&self) -> Range {
        [
            self.rewards.collision_reward,
            self.rewards.high_speed_reward + self.rewards.right_lane_reward,
        ]
    }
}

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn validate_range(name: &str, range: &Range) -> Result<()> {
    if !(range[1] > range[0]) {
        return Err(anyhow!("{} must satisfy max > min, got [{}, {}]", name, range[0], range[1]));
    }
    Ok(())
}

impl Validate for EnvConfig {
    fn validate(&self) -> Result<()> {
        if self.simulation_frequency == 0 || self.policy_frequency == 0 {
            return Err(anyhow!("Simulation and policy frequencies must be positive"));
        }

        if self.policy_frequency > self.simulation_frequency {
            return Err(anyhow!(
                "Policy frequency {} exceeds simulation frequency {}",
                self.policy_frequency,
                self.simulation_frequency
            ));
        }

        if self.lanes_count == 0 {
            return Err(anyhow!("Lanes count must be greater than zero"));
        }

        if self.controlled_vehicles == 0 {
            return Err(anyhow!("At least one controlled vehicle is required"));
        }

        if let Some(lane) = self.initial_lane_id {
            if lane >= self.lanes_count {
                return Err(anyhow!("Initial lane {} is out of range (0-{})", lane, self.lanes_count - 1));
            }
        }

        if !(self.duration > 0.0) {
            return Err(anyhow!("Duration must be positive"));
        }

        if !(self.ego_spacing > 0.0) {
            return Err(anyhow!("Ego spacing must be positive"));
        }

        if !(self.vehicles_density > 0.0) {
            return Err(anyhow!("Vehicles density must be positive"));
        }

        validate_range("reward_speed_range", &self.reward_speed_range)?;
        validate_range("front_distance_range", &self.front_distance_range)?;
        validate_range("rear_distance_range", &self.rear_distance_range)?;

        self.rewards.validate()?;

        if self.normalize_reward {
            let [low, high] = self.normalization_bounds();
            if low == high {
                return Err(anyhow!(
                    "Normalization bounds collapse to {}: collision_reward equals high_speed_reward + right_lane_reward",
                    low
                ));
            }
        }

        Ok(())
    }
}
