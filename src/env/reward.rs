use std::ops::Index;

use super::torque::torque_reward;
use super::Action;
use crate::config::{EnvConfig, RewardWeights};
use crate::simulation::{Road, Vehicle};
use crate::utils::{lmap, Range};

/// The named partial rewards, in breakdown order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RewardTerm {
    Speed,
    Collision,
    SafeDistance,
    OnRoad,
    Torque,
}

impl RewardTerm {
    pub const ALL: [RewardTerm; 5] = [
        RewardTerm::Speed,
        RewardTerm::Collision,
        RewardTerm::SafeDistance,
        RewardTerm::OnRoad,
        RewardTerm::Torque,
    ];

    /// Key of the term's weight in the configuration.
    pub fn name(&self) -> &'static str {
        match self {
            RewardTerm::Speed => "speed_reward",
            RewardTerm::Collision => "collision_reward",
            RewardTerm::SafeDistance => "safe_distance_reward",
            RewardTerm::OnRoad => "on_road_reward",
            RewardTerm::Torque => "torque_reward",
        }
    }

    fn slot(&self) -> usize {
        *self as usize
    }
}

/// Value of every [`RewardTerm`] for one step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RewardBreakdown {
    values: [f64; 5],
}

impl RewardBreakdown {
    pub fn get(&self, term: RewardTerm) -> f64 {
        self.values[term.slot()]
    }

    pub fn set(&mut self, term: RewardTerm, value: f64) {
        self.values[term.slot()] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (RewardTerm, f64)> + '_ {
        RewardTerm::ALL.into_iter().map(move |term| (term, self.get(term)))
    }

    pub fn weighted_sum(&self, weights: &RewardWeights) -> f64 {
        self.iter().map(|(term, value)| weights.weight(term) * value).sum()
    }
}

impl Index<RewardTerm> for RewardBreakdown {
    type Output = f64;

    fn index(&self, term: RewardTerm) -> &f64 {
        &self.values[term.slot()]
    }
}

/// Computes the per-step reward of the ego vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardEvaluator {
    speed_range: Range,
    front_distance_range: Range,
    rear_distance_range: Range,
    weights: RewardWeights,
    normalization: Option<Range>,
}

impl RewardEvaluator {
    /// Front gaps beyond this many metres are as good as this many.
    pub const MINIMUM_SAFE_DISTANCE: f64 = 30.0;

    pub fn new(config: &EnvConfig) -> Self {
        Self {
            speed_range: config.reward_speed_range,
            front_distance_range: config.front_distance_range,
            rear_distance_range: config.rear_distance_range,
            weights: config.rewards.clone(),
            normalization: config.normalize_reward.then(|| config.normalization_bounds()),
        }
    }

    pub fn weights(&self) -> &RewardWeights {
        &self.weights
    }

    /// Scalar reward and its breakdown for `ego` after `action`.
    pub fn reward(&self, road: &Road, ego: &Vehicle, action: &Action) -> (f64, RewardBreakdown) {
        let rewards = self.rewards(road, ego, action);
        (self.combine(&rewards), rewards)
    }

    pub fn rewards(&self, road: &Road, ego: &Vehicle, action: &Action) -> RewardBreakdown {
        let (front, rear) = road.neighbour_vehicles(ego, ego.lane_index);
        let front_gap = front.map(|front| road.lane_distance_to(ego, front));
        let rear_gap = rear.map(|rear| road.lane_distance_to(ego, rear));

        let mut rewards = RewardBreakdown::default();
        rewards.set(RewardTerm::Speed, self.speed_reward(ego.speed));
        rewards.set(RewardTerm::Collision, Self::collision_reward(ego.crashed));
        rewards.set(RewardTerm::SafeDistance, self.safe_distance_reward(front_gap, rear_gap));
        rewards.set(RewardTerm::OnRoad, Self::on_road_reward(ego.on_road));
        rewards.set(RewardTerm::Torque, torque_reward(ego.speed, action.acceleration()));
        rewards
    }

    /// Weighted sum, rescaled onto `[0, 1]` when normalization is on.
    pub fn combine(&self, rewards: &RewardBreakdown) -> f64 {
        let reward = rewards.weighted_sum(&self.weights);
        match self.normalization {
            Some(bounds) => lmap(reward, bounds, [0.0, 1.0]),
            None => reward,
        }
    }

    pub fn speed_reward(&self, speed: f64) -> f64 {
        lmap(speed, self.speed_range, [0.0, 1.0]).clamp(0.0, 1.0)
    }

    pub fn collision_reward(crashed: bool) -> f64 {
        if crashed {
            1.0
        } else {
            0.0
        }
    }

    /// Reward for the gaps to the vehicles ahead and behind.
    ///
    /// An absent neighbour counts as a gap at the top of its range.
    pub fn safe_distance_reward(&self, front_gap: Option<f64>, rear_gap: Option<f64>) -> f64 {
        let front = front_gap
            .map(|gap| gap.min(Self::MINIMUM_SAFE_DISTANCE))
            .unwrap_or(self.front_distance_range[1]);
        let rear = rear_gap.map(f64::abs).unwrap_or(self.rear_distance_range[1]);

        let front = lmap(front, self.front_distance_range, [0.0, 0.5]);
        let rear = lmap(rear, self.rear_distance_range, [0.0, 0.5]);
        (front + rear).clamp(0.0, 1.0)
    }

    pub fn on_road_reward(on_road: bool) -> f64 {
        if on_road {
            1.0
        } else {
            0.0
        }
    }
}
