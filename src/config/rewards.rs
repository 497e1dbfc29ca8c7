use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use super::Validate;
use crate::env::RewardTerm;

/// Weights of the reward terms, keyed by the same names as the terms.
///
/// `high_speed_reward` and `right_lane_reward` weight no active term; they
/// only set the upper normalization bound.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RewardWeights {
    pub speed_reward: f64,
    pub collision_reward: f64,
    pub safe_distance_reward: f64,
    pub on_road_reward: f64,
    pub torque_reward: f64,
    pub high_speed_reward: f64,
    pub right_lane_reward: f64,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            speed_reward: 25.0,
            collision_reward: -50.0,
            safe_distance_reward: 5.0,
            on_road_reward: 20.0,
            torque_reward: 0.0,
            high_speed_reward: 0.4,
            right_lane_reward: 0.1,
        }
    }
}

impl RewardWeights {
    pub fn weight(&self, term: RewardTerm) -> f64 {
        match term {
            RewardTerm::Speed => self.speed_reward,
            RewardTerm::Collision => self.collision_reward,
            RewardTerm::SafeDistance => self.safe_distance_reward,
            RewardTerm::OnRoad => self.on_road_reward,
            RewardTerm::Torque => self.torque_reward,
        }
    }

    /// Weights with every term disabled.
    pub fn zeroed() -> Self {
        Self {
            speed_reward: 0.0,
            collision_reward: 0.0,
            safe_distance_reward: 0.0,
            on_road_reward: 0.0,
            torque_reward: 0.0,
            high_speed_reward: 0.0,
            right_lane_reward: 0.0,
        }
    }
}

impl Validate for RewardWeights {
    fn validate(&self) -> Result<()> {
        let all = [
            ("speed_reward", self.speed_reward),
            ("collision_reward", self.collision_reward),
            ("safe_distance_reward", self.safe_distance_reward),
            ("on_road_reward", self.on_road_reward),
            ("torque_reward", self.torque_reward),
            ("high_speed_reward", self.high_speed_reward),
            ("right_lane_reward", self.right_lane_reward),
        ];
        for (name, weight) in all {
            if !weight.is_finite() {
                return Err(anyhow!("Reward weight '{}' must be finite, got {}", name, weight));
            }
        }
        Ok(())
    }
}

/// Partial [`RewardWeights`]; absent keys keep the base value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RewardWeightsOverride {
    pub speed_reward: Option<f64>,
    pub collision_reward: Option<f64>,
    pub safe_distance_reward: Option<f64>,
    pub on_road_reward: Option<f64>,
    pub torque_reward: Option<f64>,
    pub high_speed_reward: Option<f64>,
    pub right_lane_reward: Option<f64>,
}

impl RewardWeightsOverride {
    pub fn apply(&self, base: &RewardWeights) -> RewardWeights {
        RewardWeights {
            speed_reward: self.speed_reward.unwrap_or(base.speed_reward),
            collision_reward: self.collision_reward.unwrap_or(base.collision_reward),
            safe_distance_reward: self.safe_distance_reward.unwrap_or(base.safe_distance_reward),
            on_road_reward: self.on_road_reward.unwrap_or(base.on_road_reward),
            torque_reward: self.torque_reward.unwrap_or(base.torque_reward),
            high_speed_reward: self.high_speed_reward.unwrap_or(base.high_speed_reward),
            right_lane_reward: self.right_lane_reward.unwrap_or(base.right_lane_reward),
        }
    }

    /// Layer `other` on top of `self`.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            speed_reward: other.speed_reward.or(self.speed_reward),
            collision_reward: other.collision_reward.or(self.collision_reward),
            safe_distance_reward: other.safe_distance_reward.or(self.safe_distance_reward),
            on_road_reward: other.on_road_reward.or(self.on_road_reward),
            torque_reward: other.torque_reward.or(self.torque_reward),
            high_speed_reward: other.high_speed_reward.or(self.high_speed_reward),
            right_lane_reward: other.right_lane_reward.or(self.right_lane_reward),
        }
    }
}
