use highway_env::{
    config::{EnvConfig, RewardWeights},
    env::{
        torque::{torque_reward, total_torque},
        Action, RewardBreakdown, RewardEvaluator, RewardTerm,
    },
    simulation::{Driver, Point, Road, RoadNetwork, Vehicle, VehicleId},
    utils::{lmap, near_split},
    HighwayError,
};

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {:.12}, got {:.12}",
        expected,
        actual
    );
}

fn vehicle_at(network: &RoadNetwork, id: usize, x: f64, y: f64, speed: f64) -> Vehicle {
    Vehicle::new(VehicleId(id), network, Point::new(x, y), 0.0, speed, Driver::Controlled)
}

#[test]
fn test_near_split_known_values() {
    assert_eq!(near_split(50, 1).unwrap(), vec![50]);
    assert_eq!(near_split(7, 3).unwrap(), vec![3, 2, 2]);
    assert_eq!(near_split(0, 2).unwrap(), vec![0, 0]);
    assert_eq!(near_split(5, 0), Err(HighwayError::InvalidSplit { count: 5, bins: 0 }));
}

#[test]
fn test_near_split_is_balanced_and_complete() {
    for count in 0..40 {
        for bins in 1..9 {
            let split = near_split(count, bins).unwrap();
            assert_eq!(split.len(), bins);
            assert_eq!(split.iter().sum::<usize>(), count, "split({}, {})", count, bins);
            let max = *split.iter().max().unwrap();
            let min = *split.iter().min().unwrap();
            assert!(max - min <= 1, "split({}, {}) = {:?}", count, bins, split);
            // Larger bins come first
            assert!(split.windows(2).all(|w| w[0] >= w[1]));
        }
    }
}

#[test]
fn test_speed_reward_is_monotonic_and_saturates() {
    let evaluator = RewardEvaluator::new(&EnvConfig::default());

    assert_eq!(evaluator.speed_reward(-40.0), 0.0);
    assert_eq!(evaluator.speed_reward(-55.0), 0.0);
    assert_eq!(evaluator.speed_reward(40.0), 1.0);
    assert_eq!(evaluator.speed_reward(70.0), 1.0);
    assert_close(evaluator.speed_reward(0.0), 0.5);

    let mut previous = f64::NEG_INFINITY;
    for i in -60..=60 {
        let reward = evaluator.speed_reward(i as f64);
        assert!(reward >= previous, "speed reward decreased at {}", i);
        previous = reward;
    }
}

#[test]
fn test_collision_and_on_road_rewards_are_binary() {
    assert_eq!(RewardEvaluator::collision_reward(true), 1.0);
    assert_eq!(RewardEvaluator::collision_reward(false), 0.0);
    assert_eq!(RewardEvaluator::on_road_reward(true), 1.0);
    assert_eq!(RewardEvaluator::on_road_reward(false), 0.0);
}

#[test]
fn test_safe_distance_reward_bounds() {
    let evaluator = RewardEvaluator::new(&EnvConfig::default());

    assert_eq!(evaluator.safe_distance_reward(Some(0.0), Some(0.0)), 0.0);
    assert_close(evaluator.safe_distance_reward(Some(30.0), Some(-30.0)), 1.0);
    assert_close(evaluator.safe_distance_reward(Some(15.0), Some(-15.0)), 0.5);

    // The front gap is capped, the rear gap may overshoot until the final clip
    assert_close(evaluator.safe_distance_reward(Some(300.0), Some(0.0)), 0.5);
    assert_close(evaluator.safe_distance_reward(Some(0.0), Some(-300.0)), 1.0);

    for front in [0.0, 3.0, 12.5, 29.0, 45.0, 1000.0] {
        for rear in [0.0, -1.0, -20.0, -70.0] {
            let reward = evaluator.safe_distance_reward(Some(front), Some(rear));
            assert!((0.0..=1.0).contains(&reward), "front {} rear {} gave {}", front, rear, reward);
        }
    }
}

#[test]
fn test_absent_neighbours_count_as_out_of_range() {
    let evaluator = RewardEvaluator::new(&EnvConfig::default());

    assert_close(evaluator.safe_distance_reward(None, None), 1.0);
    assert_close(evaluator.safe_distance_reward(None, Some(0.0)), 0.5);
    assert_close(evaluator.safe_distance_reward(Some(0.0), None), 0.5);
}

#[test]
fn test_rewards_read_neighbours_in_ego_lane() {
    let network = RoadNetwork::straight_road_network(3, 30.0);
    let vehicles = vec![
        vehicle_at(&network, 0, 100.0, 0.0, 20.0),
        vehicle_at(&network, 1, 120.0, 0.0, 20.0),
        vehicle_at(&network, 2, 90.0, 0.0, 20.0),
        // Adjacent lane, closer but ignored
        vehicle_at(&network, 3, 105.0, 4.0, 20.0),
    ];
    let road = Road::new(network, vehicles);
    let ego = &road.vehicles[0];

    let (front, rear) = road.neighbour_vehicles(ego, ego.lane_index);
    assert_eq!(front.map(|v| v.id), Some(VehicleId(1)));
    assert_eq!(rear.map(|v| v.id), Some(VehicleId(2)));

    let evaluator = RewardEvaluator::new(&EnvConfig::default());
    let rewards = evaluator.rewards(&road, ego, &Action::idle());

    assert_close(rewards[RewardTerm::SafeDistance], 20.0 / 60.0 + 10.0 / 60.0);
    assert_close(rewards[RewardTerm::Speed], 0.75);
    assert_eq!(rewards[RewardTerm::Collision], 0.0);
    assert_eq!(rewards[RewardTerm::OnRoad], 1.0);
    assert_eq!(rewards[RewardTerm::Torque], 1.0);
}

#[test]
fn test_lone_vehicle_has_full_safe_distance() {
    let network = RoadNetwork::straight_road_network(2, 30.0);
    let vehicles = vec![vehicle_at(&network, 0, 50.0, 4.0, 10.0)];
    let road = Road::new(network, vehicles);

    let evaluator = RewardEvaluator::new(&EnvConfig::default());
    let rewards = evaluator.rewards(&road, &road.vehicles[0], &Action::idle());
    assert_close(rewards[RewardTerm::SafeDistance], 1.0);
}

#[test]
fn test_torque_is_guarded_at_zero_speed() {
    assert_eq!(total_torque(0.0, 3.0), None);
    assert_eq!(torque_reward(0.0, 3.0), 0.0);
}

#[test]
fn test_torque_physics() {
    let load_torque = 0.012 * 1458.0 * 9.81 * 0.33;
    assert_close(total_torque(20.0, 0.0).unwrap(), load_torque);
    // Wheel inertia is m_w * r², independent of speed
    assert_close(total_torque(5.0, 5.0).unwrap(), 20.0 * 0.33 * 5.0 + load_torque);
    assert_close(total_torque(-5.0, 5.0).unwrap(), 20.0 * 0.33 * 5.0 + load_torque);

    // Realistic loads saturate the clip
    assert_eq!(torque_reward(20.0, -5.0), 1.0);
    assert_eq!(torque_reward(20.0, -10.0), 0.0);
}

#[test]
fn test_action_maps_onto_physical_ranges() {
    assert_close(Action::new(0.0, 0.5).acceleration(), -5.0);
    assert_close(Action::new(1.0, 0.5).acceleration(), 5.0);
    assert_close(Action::idle().acceleration(), 0.0);
    assert_close(Action::idle().steering_angle(), 0.0);
    assert_close(Action::new(0.5, 1.0).steering_angle(), std::f64::consts::FRAC_PI_4);
    // Out-of-range inputs are clipped
    assert_close(Action::new(3.0, -2.0).acceleration(), 5.0);
    assert_close(Action::new(3.0, -2.0).steering_angle(), -std::f64::consts::FRAC_PI_4);
}

#[test]
fn test_weighted_sum_uses_each_term_weight() {
    let mut breakdown = RewardBreakdown::default();
    breakdown.set(RewardTerm::Speed, 0.5);
    breakdown.set(RewardTerm::Collision, 1.0);
    breakdown.set(RewardTerm::SafeDistance, 0.2);
    breakdown.set(RewardTerm::OnRoad, 1.0);
    breakdown.set(RewardTerm::Torque, 1.0);

    let weights = RewardWeights::default();
    assert_close(breakdown.weighted_sum(&weights), 25.0 * 0.5 - 50.0 + 5.0 * 0.2 + 20.0);

    // A zero weight disables the term
    let mut only_torque = RewardWeights::zeroed();
    only_torque.torque_reward = 2.0;
    assert_close(breakdown.weighted_sum(&only_torque), 2.0);
}

#[test]
fn test_crash_normalizes_to_zero() {
    let mut config = EnvConfig::default();
    config.rewards = RewardWeights::zeroed();
    config.rewards.collision_reward = -50.0;
    config.rewards.high_speed_reward = 0.4;
    config.rewards.right_lane_reward = 0.1;
    config.normalize_reward = true;
    assert_eq!(config.normalization_bounds(), [-50.0, 0.5]);

    let network = RoadNetwork::straight_road_network(2, 30.0);
    let mut ego = vehicle_at(&network, 0, 10.0, 0.0, 15.0);
    ego.crashed = true;
    let road = Road::new(network, vec![ego]);

    let evaluator = RewardEvaluator::new(&config);
    let (reward, rewards) = evaluator.reward(&road, &road.vehicles[0], &Action::idle());
    assert_eq!(rewards.weighted_sum(evaluator.weights()), -50.0);
    assert_eq!(reward, 0.0);
}

#[test]
fn test_normalization_is_optional() {
    let mut config = EnvConfig::default();
    config.normalize_reward = false;
    let evaluator = RewardEvaluator::new(&config);

    let mut breakdown = RewardBreakdown::default();
    breakdown.set(RewardTerm::OnRoad, 1.0);
    assert_close(evaluator.combine(&breakdown), 20.0);

    config.normalize_reward = true;
    let evaluator = RewardEvaluator::new(&config);
    assert_close(evaluator.combine(&breakdown), lmap(20.0, [-50.0, 0.5], [0.0, 1.0]));
}

#[test]
fn test_term_names_match_config_keys() {
    let names: Vec<_> = RewardTerm::ALL.iter().map(|t| t.name()).collect();
    assert_eq!(
        names,
        ["speed_reward", "collision_reward", "safe_distance_reward", "on_road_reward", "torque_reward"]
    );
}
