use super::{Driver, IdmProfile, Road, RoadNetwork, Vehicle, VehicleId};
use crate::config::EnvConfig;
use crate::error::{HighwayError, Result};
use crate::utils::near_split;
use rand::rngs::StdRng;
use rand::Rng;

/// Road and vehicles of one episode, as produced by [`ScenarioBuilder`].
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub road: Road,
    /// Controlled vehicles in creation order; the first one is the ego.
    pub controlled: Vec<VehicleId>,
}

impl Scenario {
    pub fn ego_id(&self) -> Option<VehicleId> {
        self.controlled.first().copied()
    }

    pub fn ego(&self) -> Option<&Vehicle> {
        self.ego_id().and_then(|id| self.road.vehicle(id))
    }

    pub fn is_controlled(&self, id: VehicleId) -> bool {
        self.controlled.contains(&id)
    }

    /// Only controlled vehicles keep paying for collision checks.
    pub fn disable_uncontrolled_collisions(&mut self) {
        let controlled = &self.controlled;
        for vehicle in &mut self.road.vehicles {
            if !controlled.contains(&vehicle.id) {
                vehicle.check_collisions = false;
            }
        }
    }
}

/// Populates a straight highway from an [`EnvConfig`].
///
/// Draws from `rng` in a fixed order: for each group, the controlled vehicle
/// first, then its traffic.
pub struct ScenarioBuilder<'a> {
    config: &'a EnvConfig,
    rng: &'a mut StdRng,
    network: RoadNetwork,
    vehicles: Vec<Vehicle>,
    controlled: Vec<VehicleId>,
}

impl<'a> ScenarioBuilder<'a> {
    pub const SPEED_LIMIT: f64 = 30.0;
    pub const EGO_SPEED: f64 = 25.0;

    pub fn new(config: &'a EnvConfig, rng: &'a mut StdRng) -> Self {
        let network = RoadNetwork::straight_road_network(config.lanes_count, Self::SPEED_LIMIT);
        Self {
            config,
            rng,
            network,
            vehicles: Vec::with_capacity(config.vehicles_count + config.controlled_vehicles),
            controlled: Vec::with_capacity(config.controlled_vehicles),
        }
    }

    pub fn build(mut self) -> Result<Scenario> {
        if self.network.lanes_count() == 0 {
            return Err(HighwayError::InvalidConfig("a highway needs at least one lane".to_string()));
        }
        let others_per_controlled = near_split(self.config.vehicles_count, self.config.controlled_vehicles)?;
        let other_type = self.config.other_vehicles_type;
        let traffic_spacing = 1.0 / self.config.vehicles_density;

        for others in others_per_controlled {
            let ego = self.create_random(
                Some(Self::EGO_SPEED),
                self.config.initial_lane_id,
                self.config.ego_spacing,
                Driver::Controlled,
            )?;
            let id = self.push(ego);
            self.controlled.push(id);

            for _ in 0..others {
                let mut vehicle = self.create_random(None, None, traffic_spacing, Driver::Controlled)?;
                let mut profile = IdmProfile::preset(other_type, vehicle.speed);
                profile.randomize(self.rng);
                vehicle.driver = Driver::Idm(profile);
                self.push(vehicle);
            }
        }

        log::debug!(
            "Built scenario: {} lanes, {} vehicles ({} controlled)",
            self.network.lanes_count(),
            self.vehicles.len(),
            self.controlled.len()
        );

        Ok(Scenario {
            road: Road::new(self.network, self.vehicles),
            controlled: self.controlled,
        })
    }

    /// A vehicle placed ahead of every vehicle built so far.
    ///
    /// `lane_id` and `speed` are drawn when absent; `spacing` scales the
    /// nominal gap of `12 + speed` metres.
    pub fn create_random(
        &mut self,
        speed: Option<f64>,
        lane_id: Option<usize>,
        spacing: f64,
        driver: Driver,
    ) -> Result<Vehicle> {
        let lane_id = match lane_id {
            Some(id) => id,
            None => self.rng.gen_range(0..self.network.lanes_count()),
        };
        let lane_index = self.network.lane_index(lane_id).ok_or_else(|| {
            HighwayError::InvalidConfig(format!(
                "lane {} does not exist on a {}-lane road",
                lane_id,
                self.network.lanes_count()
            ))
        })?;
        let lane = self.network.lane(lane_index);

        let speed = match speed {
            Some(speed) => speed,
            None => self.rng.gen_range(0.7 * lane.speed_limit()..0.8 * lane.speed_limit()),
        };

        let default_spacing = 12.0 + speed;
        let offset = spacing * default_spacing * (-5.0 / 40.0 * self.network.lanes_count() as f64).exp();

        let mut x0 = self
            .vehicles
            .iter()
            .map(|v| lane.local_coordinates(&v.position).0)
            .reduce(f64::max)
            .unwrap_or(3.0 * offset);
        x0 += offset * self.rng.gen_range(0.95..1.05);

        let position = lane.position(x0, 0.0);
        let heading = lane.heading_at(x0);
        let id = VehicleId(self.vehicles.len());
        Ok(Vehicle::new(id, &self.network, position, heading, speed, driver))
    }

    fn push(&mut self, vehicle: Vehicle) -> VehicleId {
        let id = vehicle.id;
        self.vehicles.push(vehicle);
        id
    }
}
