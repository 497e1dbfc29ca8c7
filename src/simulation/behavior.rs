use super::{steering_control, Control, Driver, Road, Vehicle};
use crate::config::OtherVehiclesType;
use crate::utils::not_zero;
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};

/// Intelligent Driver Model parameters of one traffic vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct IdmProfile {
    pub kind: OtherVehiclesType,
    /// Desired speed [m/s].
    pub target_speed: f64,
    /// Velocity exponent.
    pub delta: f64,
    /// Desired time headway [s].
    pub time_wanted: f64,
    /// Weight given to other drivers' loss when changing lanes.
    pub politeness: f64,
    /// 0 keeps long headways, 1 tailgates.
    pub aggressiveness: f64,
}

impl IdmProfile {
    pub const ACC_MAX: f64 = 6.0;
    pub const COMFORT_ACC_MAX: f64 = 3.0;
    pub const COMFORT_ACC_MIN: f64 = -5.0;
    pub const DISTANCE_WANTED: f64 = 5.0 + Vehicle::LENGTH;
    pub const TIME_WANTED: f64 = 1.5;
    pub const DELTA: f64 = 4.0;
    pub const DELTA_RANGE: [f64; 2] = [3.5, 4.5];
    pub const TARGET_SPEED_STD: f64 = 2.0;
    pub const TARGET_SPEED_RANGE: [f64; 2] = [20.0, 30.0];

    pub fn preset(kind: OtherVehiclesType, target_speed: f64) -> Self {
        let aggressiveness = match kind {
            OtherVehiclesType::Idm => 0.5,
            OtherVehiclesType::Aggressive => 1.0,
            OtherVehiclesType::Defensive => 0.0,
        };
        Self {
            kind,
            target_speed,
            delta: Self::DELTA,
            time_wanted: Self::time_wanted_for(aggressiveness),
            politeness: 0.0,
            aggressiveness,
        }
    }

    fn time_wanted_for(aggressiveness: f64) -> f64 {
        2.0 - aggressiveness
    }

    fn aggressiveness_range(&self) -> (f64, f64) {
        match self.kind {
            OtherVehiclesType::Idm => (0.0, 1.0),
            OtherVehiclesType::Aggressive => (0.7, 1.0),
            OtherVehiclesType::Defensive => (0.0, 0.3),
        }
    }

    /// Draw a new driver personality around the current target speed.
    pub fn randomize(&mut self, rng: &mut StdRng) {
        self.delta = rng.gen_range(Self::DELTA_RANGE[0]..=Self::DELTA_RANGE[1]);
        self.politeness = rng.gen_range(0.0..=1.0);

        let (low, high) = self.aggressiveness_range();
        self.aggressiveness = Uniform::new_inclusive(low, high).sample(rng);
        self.time_wanted = Self::time_wanted_for(self.aggressiveness);

        let speed = match Normal::new(self.target_speed, Self::TARGET_SPEED_STD) {
            Ok(normal) => normal.sample(rng),
            Err(_) => self.target_speed,
        };
        self.target_speed = speed.clamp(Self::TARGET_SPEED_RANGE[0], Self::TARGET_SPEED_RANGE[1]);
    }

    /// Longitudinal acceleration given the vehicle ahead and the gap to it.
    pub fn acceleration(&self, ego: &Vehicle, front: Option<(&Vehicle, f64)>, speed_limit: f64) -> f64 {
        let target_speed = self.target_speed.clamp(0.0, speed_limit);
        let mut acceleration = Self::COMFORT_ACC_MAX
            * (1.0 - (ego.speed.max(0.0) / not_zero(target_speed).abs()).powf(self.delta));

        if let Some((front, gap)) = front {
            acceleration -= Self::COMFORT_ACC_MAX * (self.desired_gap(ego, front) / not_zero(gap)).powi(2);
        }

        acceleration.clamp(-Self::ACC_MAX, Self::ACC_MAX)
    }

    pub fn desired_gap(&self, ego: &Vehicle, front: &Vehicle) -> f64 {
        let ab = -Self::COMFORT_ACC_MAX * Self::COMFORT_ACC_MIN;
        let dv = (ego.velocity() - front.velocity()).dot(&ego.direction());
        Self::DISTANCE_WANTED + ego.speed * self.time_wanted + ego.speed * dv / (2.0 * ab.sqrt())
    }
}

/// Decides the controls of every IDM vehicle on the road.
///
/// Controlled vehicles are left alone; their control comes from the agent.
pub struct BehaviorEngine;

impl BehaviorEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn update(&self, road: &mut Road) {
        let mut updates = Vec::new();

        // Collect behavior updates
        for (i, vehicle) in road.vehicles.iter().enumerate() {
            if let Driver::Idm(profile) = &vehicle.driver {
                updates.push((i, self.calculate_control(road, vehicle, profile)));
            }
        }

        // Apply updates
        for (i, control) in updates {
            if let Some(vehicle) = road.vehicles.get_mut(i) {
                vehicle.control = control;
            }
        }
    }

    fn calculate_control(&self, road: &Road, vehicle: &Vehicle, profile: &IdmProfile) -> Control {
        if vehicle.crashed {
            return Control::default();
        }
        let (front, _) = road.neighbour_vehicles(vehicle, vehicle.lane_index);
        let front = front.map(|front| (front, road.lane_distance_to(vehicle, front)));
        let speed_limit = road.network.lane(vehicle.lane_index).speed_limit();

        Control {
            steering: steering_control(vehicle, &road.network),
            acceleration: profile.acceleration(vehicle, front, speed_limit),
        }
    }
}

impl Default for BehaviorEngine {
    fn default() -> Self {
        Self::new()
    }
}
