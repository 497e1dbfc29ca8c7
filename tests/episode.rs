use anyhow::Result;
use highway_env::{
    config::{EnvConfig, EnvConfigOverride, OtherVehiclesType, Variant},
    env::{is_terminated, is_truncated, Action, Environment, HighwayEnv},
    simulation::{
        are_polygons_intersecting, polygon, steering_control, BehaviorEngine, Driver, IdmProfile,
        PhysicsEngine, Point, Road, RoadNetwork, Vehicle, VehicleId,
    },
    HighwayError,
};

fn vehicle_at(network: &RoadNetwork, id: usize, x: f64, y: f64, speed: f64) -> Vehicle {
    Vehicle::new(VehicleId(id), network, Point::new(x, y), 0.0, speed, Driver::Controlled)
}

/// Single ego vehicle, no traffic.
fn lonely_config(duration: f64) -> EnvConfig {
    EnvConfig {
        seed: Some(3),
        vehicles_count: 0,
        duration,
        ..EnvConfig::default()
    }
}

#[test]
fn test_termination_conditions() {
    let network = RoadNetwork::straight_road_network(2, 30.0);
    let off_road = vehicle_at(&network, 0, 50.0, 40.0, 20.0);
    assert!(!off_road.on_road);
    assert!(!off_road.crashed);

    assert!(!is_terminated(&off_road, false));
    assert!(is_terminated(&off_road, true));

    let mut crashed = vehicle_at(&network, 1, 50.0, 0.0, 20.0);
    assert!(crashed.on_road);
    assert!(!is_terminated(&crashed, true));
    crashed.crashed = true;
    assert!(is_terminated(&crashed, false));
    assert!(is_terminated(&crashed, true));
}

#[test]
fn test_truncation_at_duration() {
    assert!(is_truncated(40.0, 40.0));
    assert!(is_truncated(41.0, 40.0));
    assert!(!is_truncated(39.0, 40.0));
}

#[test]
fn test_episode_truncates_exactly_at_duration() -> Result<()> {
    let mut env = HighwayEnv::new(Variant::Highway, lonely_config(3.0))?;
    env.reset(None)?;

    for expected_time in [1.0, 2.0] {
        let outcome = env.step(Action::idle())?;
        assert_eq!(outcome.info.time, expected_time);
        assert!(!outcome.truncated, "truncated early at t={}", expected_time);
        assert!(!outcome.terminated);
    }

    let outcome = env.step(Action::idle())?;
    assert_eq!(env.time(), 3.0);
    assert!(outcome.truncated);
    assert!(!outcome.terminated);
    Ok(())
}

#[test]
fn test_step_requires_reset() -> Result<()> {
    let mut env = HighwayEnv::with_defaults(Variant::Highway)?;
    assert_eq!(env.step(Action::idle()), Err(HighwayError::NotReset));
    assert!(env.status().is_err());
    Ok(())
}

#[test]
fn test_idle_ego_keeps_speed_and_lane() -> Result<()> {
    let mut env = HighwayEnv::new(Variant::Highway, lonely_config(10.0))?;
    env.reset(Some(21))?;
    let start = env.vehicle().unwrap().clone();

    let outcome = env.step(Action::idle())?;
    let ego = env.vehicle().unwrap();

    assert!((ego.speed - 25.0).abs() < 1e-9);
    assert!((ego.position.x - start.position.x - 25.0).abs() < 1e-6);
    assert_eq!(ego.lane_index, start.lane_index);
    assert!(outcome.info.on_road);
    assert_eq!(outcome.reward, env.reward_evaluator().combine(&outcome.rewards));
    Ok(())
}

#[test]
fn test_full_throttle_accelerates() -> Result<()> {
    let mut env = HighwayEnv::new(Variant::Highway, lonely_config(10.0))?;
    env.reset(None)?;

    let outcome = env.step(Action::new(1.0, 0.5))?;
    // One policy step integrates 15 frames of 5 m/s²
    assert!((outcome.info.speed - 30.0).abs() < 1e-6, "speed {}", outcome.info.speed);
    Ok(())
}

#[test]
fn test_same_seed_replays_episode() -> Result<()> {
    let mut first = HighwayEnv::with_defaults(Variant::Highway)?;
    let mut second = HighwayEnv::with_defaults(Variant::Highway)?;

    first.reset(Some(11))?;
    second.reset(Some(11))?;
    assert_eq!(first.road(), second.road());

    let actions = [Action::idle(), Action::new(0.2, 0.5), Action::new(0.8, 0.55)];
    for action in actions {
        let a = first.step(action)?;
        let b = second.step(action)?;
        assert_eq!(a, b);
    }
    assert_eq!(first.road(), second.road());
    Ok(())
}

#[test]
fn test_fast_variant_only_checks_controlled_collisions() -> Result<()> {
    let overrides = EnvConfigOverride {
        controlled_vehicles: Some(2),
        ..Default::default()
    };
    let config = overrides.apply_validated(&Variant::HighwayFast.default_config())?;
    let mut env = HighwayEnv::new(Variant::HighwayFast, config)?;
    env.reset(Some(5))?;

    let controlled = env.controlled_vehicles().to_vec();
    assert_eq!(controlled.len(), 2);
    let road = env.road().unwrap();
    assert_eq!(road.vehicles.len(), 22);
    for vehicle in &road.vehicles {
        assert_eq!(vehicle.check_collisions, controlled.contains(&vehicle.id));
    }

    let mut standard = HighwayEnv::with_defaults(Variant::Highway)?;
    standard.reset(Some(5))?;
    assert!(standard.road().unwrap().vehicles.iter().all(|v| v.check_collisions));
    Ok(())
}

#[test]
fn test_overlapping_vehicles_crash() {
    let network = RoadNetwork::straight_road_network(2, 30.0);
    let vehicles = vec![
        vehicle_at(&network, 0, 100.0, 0.0, 20.0),
        vehicle_at(&network, 1, 103.0, 0.0, 20.0),
        vehicle_at(&network, 2, 200.0, 0.0, 20.0),
    ];
    let mut road = Road::new(network, vehicles);
    PhysicsEngine::new(15).update(&mut road);

    assert!(road.vehicles[0].crashed);
    assert!(road.vehicles[1].crashed);
    assert!(!road.vehicles[2].crashed);
}

#[test]
fn test_collision_needs_one_checking_vehicle() {
    let network = RoadNetwork::straight_road_network(2, 30.0);
    let mut vehicles = vec![
        vehicle_at(&network, 0, 100.0, 0.0, 20.0),
        vehicle_at(&network, 1, 103.0, 0.0, 20.0),
    ];
    vehicles[0].check_collisions = false;
    vehicles[1].check_collisions = false;
    let mut road = Road::new(network.clone(), vehicles.clone());
    PhysicsEngine::new(15).update(&mut road);
    assert!(road.vehicles.iter().all(|v| !v.crashed));

    vehicles[1].check_collisions = true;
    let mut road = Road::new(network, vehicles);
    PhysicsEngine::new(15).update(&mut road);
    assert!(road.vehicles.iter().all(|v| v.crashed));
}

#[test]
fn test_crashed_vehicle_stops() {
    let network = RoadNetwork::straight_road_network(1, 30.0);
    let mut vehicle = vehicle_at(&network, 0, 100.0, 0.0, 20.0);
    vehicle.crashed = true;
    vehicle.control.acceleration = 5.0;
    let mut road = Road::new(network, vec![vehicle]);

    let physics = PhysicsEngine::new(15);
    for _ in 0..200 {
        physics.update(&mut road);
    }
    assert!(road.vehicles[0].speed.abs() < 0.01);
}

#[test]
fn test_polygons_intersect_only_when_overlapping() {
    let network = RoadNetwork::straight_road_network(2, 30.0);
    let a = vehicle_at(&network, 0, 0.0, 0.0, 0.0);
    let touching_lane = vehicle_at(&network, 1, 0.0, 4.0, 0.0);
    let mut rotated = vehicle_at(&network, 2, 3.0, 2.5, 0.0);
    rotated.heading = std::f64::consts::FRAC_PI_2;

    assert!(!are_polygons_intersecting(&polygon(&a), &polygon(&touching_lane)));
    assert!(are_polygons_intersecting(&polygon(&a), &polygon(&rotated)));
}

#[test]
fn test_traffic_slows_behind_a_close_leader() {
    let network = RoadNetwork::straight_road_network(1, 30.0);
    let mut follower = vehicle_at(&network, 0, 100.0, 0.0, 25.0);
    follower.driver = Driver::Idm(IdmProfile::preset(OtherVehiclesType::Idm, 25.0));
    let leader = vehicle_at(&network, 1, 112.0, 0.0, 10.0);
    let mut road = Road::new(network, vec![follower, leader]);

    BehaviorEngine::new().update(&mut road);
    assert!(road.vehicles[0].control.acceleration < -1.0);
    // Controlled vehicles are not touched
    assert_eq!(road.vehicles[1].control.acceleration, 0.0);
}

#[test]
fn test_free_road_idm_holds_target_speed() {
    let network = RoadNetwork::straight_road_network(1, 30.0);
    let vehicle = vehicle_at(&network, 0, 100.0, 0.0, 22.0);
    let profile = IdmProfile::preset(OtherVehiclesType::Defensive, 22.0);
    assert!(profile.acceleration(&vehicle, None, 30.0).abs() < 1e-9);

    let slow = vehicle_at(&network, 1, 100.0, 0.0, 10.0);
    assert!(profile.acceleration(&slow, None, 30.0) > 0.0);
}

#[test]
fn test_lane_keeping_steers_back_to_centre() {
    let network = RoadNetwork::straight_road_network(2, 30.0);
    let mut vehicle = vehicle_at(&network, 0, 100.0, 1.0, 20.0);
    vehicle.driver = Driver::Idm(IdmProfile::preset(OtherVehiclesType::Idm, 20.0));
    assert!(steering_control(&vehicle, &network) < 0.0);

    vehicle.position.y = -1.0;
    assert!(steering_control(&vehicle, &network) > 0.0);
}
