use nalgebra::{Point2, Vector2};

pub mod behavior;
pub mod physics;
pub mod road;
pub mod traffic;

pub use behavior::*;
pub use physics::*;
pub use road::*;
pub use traffic::*;

pub type Vec2 = Vector2<f64>;
pub type Point = Point2<f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VehicleId(pub usize);

/// Low-level command applied during integration.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Control {
    /// Front wheel angle [rad].
    pub steering: f64,
    /// Longitudinal acceleration [m/s²].
    pub acceleration: f64,
}

/// Who decides a vehicle's [`Control`].
#[derive(Debug, Clone, PartialEq)]
pub enum Driver {
    /// Commanded from outside through the environment action.
    Controlled,
    /// Intelligent Driver Model keeping its lane.
    Idm(IdmProfile),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    pub id: VehicleId,
    pub position: Point,
    pub heading: f64,
    pub speed: f64,
    pub length: f64,
    pub width: f64,
    pub lane_index: LaneIndex,
    pub target_lane_index: LaneIndex,
    pub control: Control,
    pub crashed: bool,
    pub on_road: bool,
    pub check_collisions: bool,
    pub driver: Driver,
}

impl Vehicle {
    pub const LENGTH: f64 = 5.0;
    pub const WIDTH: f64 = 2.0;
    pub const MAX_SPEED: f64 = 40.0;
    pub const MIN_SPEED: f64 = -40.0;

    pub fn new(
        id: VehicleId,
        network: &RoadNetwork,
        position: Point,
        heading: f64,
        speed: f64,
        driver: Driver,
    ) -> Self {
        let lane_index = network.closest_lane_index(&position);
        let on_road = network.lane(lane_index).on_lane(&position, 0.0);
        Self {
            id,
            position,
            heading,
            speed,
            length: Self::LENGTH,
            width: Self::WIDTH,
            lane_index,
            target_lane_index: lane_index,
            control: Control::default(),
            crashed: false,
            on_road,
            check_collisions: true,
            driver,
        }
    }

    pub fn is_controlled(&self) -> bool {
        matches!(self.driver, Driver::Controlled)
    }

    pub fn direction(&self) -> Vec2 {
        Vec2::new(self.heading.cos(), self.heading.sin())
    }

    pub fn velocity(&self) -> Vec2 {
        self.direction() * self.speed
    }

    pub fn diagonal(&self) -> f64 {
        (self.length * self.length + self.width * self.width).sqrt()
    }

    /// Refresh the lane bookkeeping after the position changed.
    pub fn on_state_update(&mut self, network: &RoadNetwork) {
        self.lane_index = network.closest_lane_index(&self.position);
        self.on_road = network.lane(self.lane_index).on_lane(&self.position, 0.0);
        if self.is_controlled() {
            self.target_lane_index = self.lane_index;
        }
    }
}
