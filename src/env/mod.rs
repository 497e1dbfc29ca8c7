use anyhow::Context;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::f64::consts::FRAC_PI_4;

use crate::config::{EnvConfig, Validate, Variant};
use crate::error::{HighwayError, Result};
use crate::simulation::{
    BehaviorEngine, Control, PhysicsEngine, Road, Scenario, ScenarioBuilder, Vehicle, VehicleId,
};
use crate::utils::{lmap, Range};

pub mod lifecycle;
pub mod reward;
pub mod torque;

pub use lifecycle::*;
pub use reward::*;

/// Agent command, both components normalized to `[0, 1]`.
///
/// `0.5` is neutral on both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Action {
    pub throttle: f64,
    pub steering: f64,
}

impl Action {
    pub const ACCELERATION_RANGE: Range = [-5.0, 5.0];
    pub const STEERING_RANGE: Range = [-FRAC_PI_4, FRAC_PI_4];

    pub fn new(throttle: f64, steering: f64) -> Self {
        Self { throttle, steering }
    }

    pub fn idle() -> Self {
        Self::new(0.5, 0.5)
    }

    /// Commanded acceleration [m/s²].
    pub fn acceleration(&self) -> f64 {
        lmap(self.throttle.clamp(0.0, 1.0), [0.0, 1.0], Self::ACCELERATION_RANGE)
    }

    /// Commanded front wheel angle [rad].
    pub fn steering_angle(&self) -> f64 {
        lmap(self.steering.clamp(0.0, 1.0), [0.0, 1.0], Self::STEERING_RANGE)
    }

    pub fn to_control(&self) -> Control {
        Control {
            steering: self.steering_angle(),
            acceleration: self.acceleration(),
        }
    }
}

impl Default for Action {
    fn default() -> Self {
        Self::idle()
    }
}

impl From<[f64; 2]> for Action {
    fn from(action: [f64; 2]) -> Self {
        Self::new(action[0], action[1])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResetInfo {
    pub vehicles: usize,
    pub controlled: usize,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepInfo {
    pub speed: f64,
    pub crashed: bool,
    pub on_road: bool,
    pub action: Action,
    pub time: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub reward: f64,
    pub rewards: RewardBreakdown,
    pub terminated: bool,
    pub truncated: bool,
    pub info: StepInfo,
}

impl StepOutcome {
    pub fn is_done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// A steppable driving scenario.
pub trait Environment {
    fn reset(&mut self, seed: Option<u64>) -> Result<ResetInfo>;
    fn step(&mut self, action: Action) -> Result<StepOutcome>;
    fn get_name(&self) -> &'static str;
}

/// Straight multi-lane highway with random IDM traffic.
pub struct HighwayEnv {
    variant: Variant,
    config: EnvConfig,
    rng: StdRng,
    scenario: Option<Scenario>,
    physics_engine: PhysicsEngine,
    behavior_engine: BehaviorEngine,
    reward_evaluator: RewardEvaluator,
    steps: u64,
}

impl HighwayEnv {
    /// Validates `config`; an invalid configuration never reaches `reset`.
    pub fn new(variant: Variant, config: EnvConfig) -> anyhow::Result<Self> {
        config
            .validate()
            .with_context(|| format!("invalid {} configuration", variant.name()))?;

        let rng = if let Some(seed) = config.seed {
            StdRng::seed_from_u64(seed)
        } else {
            StdRng::from_entropy()
        };

        Ok(Self {
            variant,
            physics_engine: PhysicsEngine::new(config.simulation_frequency),
            behavior_engine: BehaviorEngine::new(),
            reward_evaluator: RewardEvaluator::new(&config),
            config,
            rng,
            scenario: None,
            steps: 0,
        })
    }

    /// Environment with the variant's default configuration.
    pub fn with_defaults(variant: Variant) -> anyhow::Result<Self> {
        Self::new(variant, variant.default_config())
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn reward_evaluator(&self) -> &RewardEvaluator {
        &self.reward_evaluator
    }

    /// Simulated seconds since the last reset.
    pub fn time(&self) -> f64 {
        self.steps as f64 / self.config.policy_frequency as f64
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn scenario(&self) -> Option<&Scenario> {
        self.scenario.as_ref()
    }

    pub fn road(&self) -> Option<&Road> {
        self.scenario.as_ref().map(|s| &s.road)
    }

    pub fn controlled_vehicles(&self) -> &[VehicleId] {
        self.scenario
            .as_ref()
            .map(|s| s.controlled.as_slice())
            .unwrap_or(&[])
    }

    /// The ego vehicle, first of the controlled vehicles.
    pub fn vehicle(&self) -> Option<&Vehicle> {
        self.scenario.as_ref().and_then(|s| s.ego())
    }

    pub fn status(&self) -> Result<EpisodeStatus> {
        let ego = self.vehicle().ok_or(HighwayError::NotReset)?;
        Ok(EpisodeStatus::evaluate(ego, self.time(), &self.config))
    }

    fn create_scenario(&mut self) -> Result<Scenario> {
        let mut scenario = ScenarioBuilder::new(&self.config, &mut self.rng).build()?;
        if !self.variant.checks_uncontrolled_collisions() {
            scenario.disable_uncontrolled_collisions();
        }
        Ok(scenario)
    }
}

impl Environment for HighwayEnv {
    fn reset(&mut self, seed: Option<u64>) -> Result<ResetInfo> {
        if let Some(seed) = seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        self.steps = 0;
        let scenario = self.create_scenario()?;

        let info = ResetInfo {
            vehicles: scenario.road.vehicles.len(),
            controlled: scenario.controlled.len(),
            seed,
        };
        info!(
            "Reset {}: {} lanes, {} vehicles ({} controlled), seed {:?}",
            self.variant.name(),
            self.config.lanes_count,
            info.vehicles,
            info.controlled,
            seed
        );

        self.scenario = Some(scenario);
        Ok(info)
    }

    fn step(&mut self, action: Action) -> Result<StepOutcome> {
        let scenario = self.scenario.as_mut().ok_or(HighwayError::NotReset)?;
        let ego_id = scenario.ego_id().ok_or(HighwayError::NotReset)?;

        for frame in 0..self.config.frames_per_action() {
            if frame == 0 {
                let ego = scenario
                    .road
                    .vehicle_mut(ego_id)
                    .ok_or(HighwayError::UnknownVehicle(ego_id))?;
                ego.control = action.to_control();
            }
            self.behavior_engine.update(&mut scenario.road);
            self.physics_engine.update(&mut scenario.road);
        }
        self.steps += 1;

        let time = self.time();
        let scenario = self.scenario.as_ref().ok_or(HighwayError::NotReset)?;
        let ego = scenario.ego().ok_or(HighwayError::UnknownVehicle(ego_id))?;

        let (reward, rewards) = self.reward_evaluator.reward(&scenario.road, ego, &action);
        let status = EpisodeStatus::evaluate(ego, time, &self.config);

        debug!(
            "t={:.2}s reward={:.4} speed={:.2} crashed={} breakdown={:?}",
            time, reward, ego.speed, ego.crashed, rewards
        );

        Ok(StepOutcome {
            reward,
            rewards,
            terminated: status.terminated,
            truncated: status.truncated,
            info: StepInfo {
                speed: ego.speed,
                crashed: ego.crashed,
                on_road: ego.on_road,
                action,
                time,
            },
        })
    }

    fn get_name(&self) -> &'static str {
        self.variant.name()
    }
}
