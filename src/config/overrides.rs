use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{EnvConfig, OtherVehiclesType, RewardWeightsOverride, Validate};
use crate::utils::Range;

/// A partial configuration layered over a base [`EnvConfig`].
///
/// Variant presets and user files are both expressed this way, so
/// `user.apply(&variant.default_config())` gives the effective config.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnvConfigOverride {
    pub seed: Option<u64>,
    pub simulation_frequency: Option<u32>,
    pub policy_frequency: Option<u32>,
    pub lanes_count: Option<usize>,
    pub vehicles_count: Option<usize>,
    pub controlled_vehicles: Option<usize>,
    pub initial_lane_id: Option<usize>,
    pub duration: Option<f64>,
    pub ego_spacing: Option<f64>,
    pub vehicles_density: Option<f64>,
    pub other_vehicles_type: Option<OtherVehiclesType>,
    pub reward_speed_range: Option<Range>,
    pub front_distance_range: Option<Range>,
    pub rear_distance_range: Option<Range>,
    pub normalize_reward: Option<bool>,
    pub offroad_terminal: Option<bool>,
    pub rewards: RewardWeightsOverride,
}

impl EnvConfigOverride {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config override {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing config override {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn apply(&self, base: &EnvConfig) -> EnvConfig {
        EnvConfig {
            seed: self.seed.or(base.seed),
            simulation_frequency: self.simulation_frequency.unwrap_or(base.simulation_frequency),
            policy_frequency: self.policy_frequency.unwrap_or(base.policy_frequency),
            lanes_count: self.lanes_count.unwrap_or(base.lanes_count),
            vehicles_count: self.vehicles_count.unwrap_or(base.vehicles_count),
            controlled_vehicles: self.controlled_vehicles.unwrap_or(base.controlled_vehicles),
            initial_lane_id: self.initial_lane_id.or(base.initial_lane_id),
            duration: self.duration.unwrap_or(base.duration),
            ego_spacing: self.ego_spacing.unwrap_or(base.ego_spacing),
            vehicles_density: self.vehicles_density.unwrap_or(base.vehicles_density),
            other_vehicles_type: self.other_vehicles_type.unwrap_or(base.other_vehicles_type),
            reward_speed_range: self.reward_speed_range.unwrap_or(base.reward_speed_range),
            front_distance_range: self.front_distance_range.unwrap_or(base.front_distance_range),
            rear_distance_range: self.rear_distance_range.unwrap_or(base.rear_distance_range),
            normalize_reward: self.normalize_reward.unwrap_or(base.normalize_reward),
            offroad_terminal: self.offroad_terminal.unwrap_or(base.offroad_terminal),
            rewards: self.rewards.apply(&base.rewards),
        }
    }

    /// Apply and validate in one go.
    pub fn apply_validated(&self, base: &EnvConfig) -> Result<EnvConfig> {
        let config = self.apply(base);
        config.validate()?;
        Ok(config)
    }

    /// Layer `other` on top of `self`; keys set in `other` win.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            seed: other.seed.or(self.seed),
            simulation_frequency: other.simulation_frequency.or(self.simulation_frequency),
            policy_frequency: other.policy_frequency.or(self.policy_frequency),
            lanes_count: other.lanes_count.or(self.lanes_count),
            vehicles_count: other.vehicles_count.or(self.vehicles_count),
            controlled_vehicles: other.controlled_vehicles.or(self.controlled_vehicles),
            initial_lane_id: other.initial_lane_id.or(self.initial_lane_id),
            duration: other.duration.or(self.duration),
            ego_spacing: other.ego_spacing.or(self.ego_spacing),
            vehicles_density: other.vehicles_density.or(self.vehicles_density),
            other_vehicles_type: other.other_vehicles_type.or(self.other_vehicles_type),
            reward_speed_range: other.reward_speed_range.or(self.reward_speed_range),
            front_distance_range: other.front_distance_range.or(self.front_distance_range),
            rear_distance_range: other.rear_distance_range.or(self.rear_distance_range),
            normalize_reward: other.normalize_reward.or(self.normalize_reward),
            offroad_terminal: other.offroad_terminal.or(self.offroad_terminal),
            rewards: self.rewards.merge(&other.rewards),
        }
    }
}

/// Scenario variants sharing the highway construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    #[default]
    Highway,
    /// Lower simulation frequency, smaller scene, and collision checks only
    /// on the controlled vehicles.
    HighwayFast,
}

impl Variant {
    pub fn name(&self) -> &'static str {
        match self {
            Variant::Highway => "highway",
            Variant::HighwayFast => "highway-fast",
        }
    }

    /// Defaults this variant layers over [`EnvConfig::default`].
    pub fn preset(&self) -> EnvConfigOverride {
        match self {
            Variant::Highway => EnvConfigOverride::default(),
            Variant::HighwayFast => EnvConfigOverride {
                simulation_frequency: Some(5),
                lanes_count: Some(3),
                vehicles_count: Some(20),
                duration: Some(30.0),
                ego_spacing: Some(1.5),
                ..EnvConfigOverride::default()
            },
        }
    }

    pub fn default_config(&self) -> EnvConfig {
        self.preset().apply(&EnvConfig::default())
    }

    /// Whether uncontrolled vehicles keep their collision checks.
    pub fn checks_uncontrolled_collisions(&self) -> bool {
        matches!(self, Variant::Highway)
    }
}
