use super::{Control, Point, Road, RoadNetwork, Vec2, Vehicle};
use crate::utils::{not_zero, wrap_to_pi};
use std::f64::consts::{FRAC_PI_3, FRAC_PI_4};

/// Integrates vehicle kinematics and resolves collisions on a [`Road`].
pub struct PhysicsEngine {
    dt: f64,
}

impl PhysicsEngine {
    pub fn new(simulation_frequency: u32) -> Self {
        Self {
            dt: 1.0 / simulation_frequency as f64,
        }
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn update(&self, road: &mut Road) {
        let dt = self.dt;
        for vehicle in &mut road.vehicles {
            integrate(vehicle, &road.network, dt);
        }

        // Each pair once, the earlier vehicle owning the check
        for i in 0..road.vehicles.len() {
            let (head, tail) = road.vehicles.split_at_mut(i + 1);
            let vehicle = &mut head[i];
            for other in tail.iter_mut() {
                handle_collisions(vehicle, other, dt);
            }
        }
    }
}

/// Clamp the command to what the vehicle can do in its current state.
pub fn clip_control(vehicle: &Vehicle) -> Control {
    let mut control = vehicle.control;
    if vehicle.crashed {
        control.steering = 0.0;
        control.acceleration = -vehicle.speed;
    }
    if vehicle.speed > Vehicle::MAX_SPEED {
        control.acceleration = control.acceleration.min(Vehicle::MAX_SPEED - vehicle.speed);
    } else if vehicle.speed < Vehicle::MIN_SPEED {
        control.acceleration = control.acceleration.max(Vehicle::MIN_SPEED - vehicle.speed);
    }
    control
}

/// Kinematic bicycle step of `dt` seconds.
pub fn integrate(vehicle: &mut Vehicle, network: &RoadNetwork, dt: f64) {
    let control = clip_control(vehicle);
    vehicle.control = control;

    let beta = (0.5 * control.steering.tan()).atan();
    let velocity = Vec2::new((vehicle.heading + beta).cos(), (vehicle.heading + beta).sin()) * vehicle.speed;
    vehicle.position += velocity * dt;
    vehicle.heading += vehicle.speed * beta.sin() / (vehicle.length / 2.0) * dt;
    vehicle.speed += control.acceleration * dt;
    vehicle.on_state_update(network);
}

const TAU_HEADING: f64 = 0.2;
const TAU_LATERAL: f64 = 0.6;
const TAU_PURSUIT: f64 = 0.5 * TAU_HEADING;
const KP_HEADING: f64 = 1.0 / TAU_HEADING;
const KP_LATERAL: f64 = 1.0 / TAU_LATERAL;
pub const MAX_STEERING_ANGLE: f64 = FRAC_PI_3;

/// Front wheel angle that brings the vehicle onto its target lane centre.
pub fn steering_control(vehicle: &Vehicle, network: &RoadNetwork) -> f64 {
    let lane = network.lane(vehicle.target_lane_index);
    let (longitudinal, lateral) = lane.local_coordinates(&vehicle.position);
    let future_heading = lane.heading_at(longitudinal + vehicle.speed * TAU_PURSUIT);

    let lateral_speed_command = -KP_LATERAL * lateral;
    let heading_command = (lateral_speed_command / not_zero(vehicle.speed)).clamp(-1.0, 1.0).asin();
    let heading_ref = future_heading + heading_command.clamp(-FRAC_PI_4, FRAC_PI_4);

    let heading_rate_command = KP_HEADING * wrap_to_pi(heading_ref - vehicle.heading);
    let slip_angle = (vehicle.length / 2.0 / not_zero(vehicle.speed) * heading_rate_command)
        .clamp(-1.0, 1.0)
        .asin();
    let steering = (2.0 * slip_angle.tan()).atan();
    steering.clamp(-MAX_STEERING_ANGLE, MAX_STEERING_ANGLE)
}

/// Corners of the vehicle footprint.
pub fn polygon(vehicle: &Vehicle) -> [Point; 4] {
    let half_length = vehicle.length / 2.0;
    let half_width = vehicle.width / 2.0;
    let (sin, cos) = vehicle.heading.sin_cos();
    let corner = |x: f64, y: f64| vehicle.position + Vec2::new(cos * x - sin * y, sin * x + cos * y);
    [
        corner(-half_length, -half_width),
        corner(-half_length, half_width),
        corner(half_length, half_width),
        corner(half_length, -half_width),
    ]
}

fn project(polygon: &[Point; 4], axis: &Vec2) -> (f64, f64) {
    polygon.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), p| {
        let d = p.coords.dot(axis);
        (min.min(d), max.max(d))
    })
}

/// Separating axis test on two convex quadrilaterals.
pub fn are_polygons_intersecting(a: &[Point; 4], b: &[Point; 4]) -> bool {
    for polygon in [a, b] {
        for i in 0..polygon.len() {
            let edge = polygon[(i + 1) % polygon.len()] - polygon[i];
            let axis = Vec2::new(-edge.y, edge.x);
            if axis.norm_squared() == 0.0 {
                continue;
            }
            let (min_a, max_a) = project(a, &axis);
            let (min_b, max_b) = project(b, &axis);
            if max_a <= min_b || max_b <= min_a {
                return false;
            }
        }
    }
    true
}

pub fn is_colliding(vehicle: &Vehicle, other: &Vehicle, dt: f64) -> bool {
    let reach = (vehicle.diagonal() + other.diagonal()) / 2.0 + vehicle.speed.abs() * dt;
    if (other.position - vehicle.position).magnitude() > reach {
        return false;
    }
    are_polygons_intersecting(&polygon(vehicle), &polygon(other))
}

/// Flag both vehicles crashed when they overlap and either one checks collisions.
pub fn handle_collisions(vehicle: &mut Vehicle, other: &mut Vehicle, dt: f64) {
    if !(vehicle.check_collisions || other.check_collisions) {
        return;
    }
    if is_colliding(vehicle, other, dt) {
        if !(vehicle.crashed && other.crashed) {
            log::debug!(
                "Collision between vehicle {} and vehicle {} at x={:.1}",
                vehicle.id.0,
                other.id.0,
                vehicle.position.x
            );
        }
        vehicle.crashed = true;
        other.crashed = true;
    }
}
