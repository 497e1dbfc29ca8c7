//! Wheel torque proxy for energy use.
//!
//! Constants describe a class D electric sedan; the wheel mass is assumed.

pub const VEHICLE_MASS: f64 = 1458.0; // [kg]
pub const ROLLING_RESISTANCE_COEFFICIENT: f64 = 0.012;
pub const GRAVITY: f64 = 9.81; // [m/s²]
pub const WHEEL_RADIUS: f64 = 0.33; // [m]
pub const WHEEL_MASS: f64 = 20.0; // [kg]

/// Torque at the wheel needed to hold `acceleration` at `speed` against
/// rolling resistance.
///
/// `None` at zero speed, where the wheel inertia estimate divides by zero.
pub fn total_torque(speed: f64, acceleration: f64) -> Option<f64> {
    if speed == 0.0 {
        return None;
    }
    let normal_force = VEHICLE_MASS * GRAVITY;
    let rolling_resistance = ROLLING_RESISTANCE_COEFFICIENT * normal_force;
    let load_torque = rolling_resistance * WHEEL_RADIUS;

    let angular_momentum = WHEEL_MASS * speed * WHEEL_RADIUS;
    let angular_velocity = speed / WHEEL_RADIUS;
    let moment_of_inertia = angular_momentum / angular_velocity;
    let angular_acceleration = acceleration / WHEEL_RADIUS;
    let acceleration_torque = moment_of_inertia * angular_acceleration;

    Some(acceleration_torque + load_torque)
}

/// Torque clipped to `[0, 1]`; zero when the torque is undefined.
///
/// There is no validated torque range to normalize with, so any realistic
/// load saturates at 1.
pub fn torque_reward(speed: f64, acceleration: f64) -> f64 {
    match total_torque(speed, acceleration) {
        Some(torque) => torque.clamp(0.0, 1.0),
        None => {
            log::debug!("Torque undefined at zero speed, torque reward set to 0");
            0.0
        }
    }
}
