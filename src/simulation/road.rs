use super::{Point, Vec2, Vehicle, VehicleId};

/// Identifies a lane as (from node, to node, lane id).
///
/// Only a [`RoadNetwork`] hands these out, so an index is always valid for
/// the network that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LaneIndex {
    from: usize,
    to: usize,
    id: usize,
}

impl LaneIndex {
    pub fn from(&self) -> usize {
        self.from
    }

    pub fn to(&self) -> usize {
        self.to
    }

    pub fn id(&self) -> usize {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StraightLane {
    start: Point,
    end: Point,
    width: f64,
    speed_limit: f64,
    length: f64,
    heading: f64,
    direction: Vec2,
    direction_lateral: Vec2,
}

impl StraightLane {
    pub const DEFAULT_WIDTH: f64 = 4.0;
    /// Longitudinal slack past both ends of a lane that still counts as on it.
    pub const VEHICLE_LENGTH: f64 = 5.0;

    pub fn new(start: Point, end: Point, width: f64, speed_limit: f64) -> Self {
        let delta = end - start;
        let length = delta.magnitude();
        let direction = delta / length;
        Self {
            start,
            end,
            width,
            speed_limit,
            length,
            heading: direction.y.atan2(direction.x),
            direction,
            direction_lateral: Vec2::new(-direction.y, direction.x),
        }
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn end(&self) -> Point {
        self.end
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn speed_limit(&self) -> f64 {
        self.speed_limit
    }

    /// World position of a (longitudinal, lateral) lane coordinate.
    pub fn position(&self, longitudinal: f64, lateral: f64) -> Point {
        self.start + self.direction * longitudinal + self.direction_lateral * lateral
    }

    pub fn heading_at(&self, _longitudinal: f64) -> f64 {
        self.heading
    }

    /// Project a world position onto (longitudinal, lateral) lane coordinates.
    pub fn local_coordinates(&self, position: &Point) -> (f64, f64) {
        let delta = position - self.start;
        (delta.dot(&self.direction), delta.dot(&self.direction_lateral))
    }

    pub fn on_lane(&self, position: &Point, margin: f64) -> bool {
        let (longitudinal, lateral) = self.local_coordinates(position);
        lateral.abs() <= self.width / 2.0 + margin
            && -Self::VEHICLE_LENGTH <= longitudinal
            && longitudinal < self.length + Self::VEHICLE_LENGTH
    }

    /// Distance from a position to the lane surface, zero inside it.
    pub fn distance(&self, position: &Point) -> f64 {
        let (longitudinal, lateral) = self.local_coordinates(position);
        lateral.abs() - self.width / 2.0
            + (longitudinal - self.length).max(0.0)
            + (-longitudinal).max(0.0)
    }
}

/// Lanes of a single straight road segment between node 0 and node 1.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadNetwork {
    lanes: Vec<StraightLane>,
}

impl RoadNetwork {
    pub const STRAIGHT_ROAD_LENGTH: f64 = 10_000.0;

    /// Parallel lanes along +x, lane `i` centred at `y = i * width`.
    pub fn straight_road_network(lanes_count: usize, speed_limit: f64) -> Self {
        let lanes = (0..lanes_count)
            .map(|i| {
                let y = i as f64 * StraightLane::DEFAULT_WIDTH;
                StraightLane::new(
                    Point::new(0.0, y),
                    Point::new(Self::STRAIGHT_ROAD_LENGTH, y),
                    StraightLane::DEFAULT_WIDTH,
                    speed_limit,
                )
            })
            .collect();
        Self { lanes }
    }

    pub fn lanes_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn lane_index(&self, id: usize) -> Option<LaneIndex> {
        (id < self.lanes.len()).then_some(LaneIndex { from: 0, to: 1, id })
    }

    pub fn lane(&self, index: LaneIndex) -> &StraightLane {
        &self.lanes[index.id]
    }

    /// Every lane sharing the segment of `index`, itself included.
    pub fn all_side_lanes(&self, index: LaneIndex) -> Vec<LaneIndex> {
        (0..self.lanes.len())
            .map(|id| LaneIndex { id, ..index })
            .collect()
    }

    /// The lanes directly left and right of `index`.
    pub fn side_lanes(&self, index: LaneIndex) -> Vec<LaneIndex> {
        let mut lanes = Vec::with_capacity(2);
        if index.id > 0 {
            lanes.push(LaneIndex { id: index.id - 1, ..index });
        }
        if index.id + 1 < self.lanes.len() {
            lanes.push(LaneIndex { id: index.id + 1, ..index });
        }
        lanes
    }

    pub fn closest_lane_index(&self, position: &Point) -> LaneIndex {
        let mut closest = 0;
        let mut closest_distance = f64::INFINITY;
        for (id, lane) in self.lanes.iter().enumerate() {
            let distance = lane.distance(position);
            if distance < closest_distance {
                closest_distance = distance;
                closest = id;
            }
        }
        LaneIndex { from: 0, to: 1, id: closest }
    }
}

/// Lane network plus every vehicle on it.
///
/// Vehicle ids equal their position in `vehicles`; vehicles are never removed
/// during an episode.
#[derive(Debug, Clone, PartialEq)]
pub struct Road {
    pub network: RoadNetwork,
    pub vehicles: Vec<Vehicle>,
}

impl Road {
    pub fn new(network: RoadNetwork, vehicles: Vec<Vehicle>) -> Self {
        Self { network, vehicles }
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(id.0).filter(|v| v.id == id)
    }

    pub fn vehicle_mut(&mut self, id: VehicleId) -> Option<&mut Vehicle> {
        self.vehicles.get_mut(id.0).filter(|v| v.id == id)
    }

    /// Closest vehicles ahead of and behind `vehicle` on `lane_index`.
    pub fn neighbour_vehicles(
        &self,
        vehicle: &Vehicle,
        lane_index: LaneIndex,
    ) -> (Option<&Vehicle>, Option<&Vehicle>) {
        let lane = self.network.lane(lane_index);
        let (s, _) = lane.local_coordinates(&vehicle.position);

        let mut front: Option<(f64, &Vehicle)> = None;
        let mut rear: Option<(f64, &Vehicle)> = None;

        for other in &self.vehicles {
            if other.id == vehicle.id || !lane.on_lane(&other.position, 1.0) {
                continue;
            }
            let (s_other, _) = lane.local_coordinates(&other.position);
            if s <= s_other && front.map_or(true, |(s_front, _)| s_other <= s_front) {
                front = Some((s_other, other));
            }
            if s_other < s && rear.map_or(true, |(s_rear, _)| s_other > s_rear) {
                rear = Some((s_other, other));
            }
        }

        (front.map(|(_, v)| v), rear.map(|(_, v)| v))
    }

    /// Signed gap from `vehicle` to `other` along `vehicle`'s lane.
    pub fn lane_distance_to(&self, vehicle: &Vehicle, other: &Vehicle) -> f64 {
        let lane = self.network.lane(vehicle.lane_index);
        lane.local_coordinates(&other.position).0 - lane.local_coordinates(&vehicle.position).0
    }
}
