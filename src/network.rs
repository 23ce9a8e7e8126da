use crate::lane::{Lane, LaneCurve, LaneKind};
use crate::math::{rot90, LineSegment2d, Point2d, QuadraticBezier2d};
use crate::signal::{Axis, Signal, SignalTiming};
use crate::{LaneId, LaneSet, NodeId};
use cgmath::prelude::*;
use itertools::iproduct;
use log::info;
use rand::rngs::StdRng;
use rand::Rng;
use slotmap::{SecondaryMap, SlotMap};
use std::f64::consts::PI;

/// The widest turn a junction connector may make, in radians.
const MAX_TURN_ANGLE: f64 = 0.8 * PI;

/// The parameters of a grid network.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NetworkConfig {
    /// The number of intersections along each side of the grid.
    pub grid_size: usize,
    /// The spacing between adjacent intersections in m.
    pub block_size: f64,
    /// The lateral offset of a lane from its road's centre line in m.
    pub lane_offset: f64,
    /// The distance from an intersection centre at which its roads end, in m.
    pub junction_radius: f64,
    /// The signal timing plan shared by every intersection.
    pub timing: SignalTiming,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            grid_size: 6,
            block_size: 40.0,
            lane_offset: 2.0,
            junction_radius: 6.0,
            timing: SignalTiming::default(),
        }
    }
}

/// A signalised intersection of the grid.
pub struct Intersection {
    /// The world position of the intersection's centre.
    position: Point2d,
    /// The signal controlling entry to the intersection.
    signal: Signal,
}

impl Intersection {
    fn new(position: Point2d, signal: Signal) -> Self {
        Self { position, signal }
    }

    /// The world position of the intersection's centre.
    pub fn position(&self) -> Point2d {
        self.position
    }

    /// The signal controlling entry to the intersection.
    pub fn signal(&self) -> &Signal {
        &self.signal
    }

    #[cfg(test)]
    pub(crate) fn signal_mut(&mut self) -> &mut Signal {
        &mut self.signal
    }
}

/// A road network: a square grid of signalised intersections joined by
/// one-way lanes, with connector lanes blending each permitted turn.
pub struct Network {
    /// The lanes in the network.
    lanes: LaneSet,
    /// The intersections in the network.
    intersections: SlotMap<NodeId, Intersection>,
    /// Every road lane, for uniform random picks.
    road_lanes: Vec<LaneId>,
}

impl Network {
    /// Builds a grid network from the given parameters.
    ///
    /// Every adjacent pair of intersections is joined by two opposing road
    /// lanes, each offset to its side of the shared centre line and ending
    /// short of the intersections. A connector is threaded through the
    /// intersection for every entry/exit pairing that does not double back.
    pub fn grid(config: &NetworkConfig, rng: &mut StdRng) -> Self {
        let n = config.grid_size;
        assert!(n >= 2, "a grid needs at least 2x2 intersections");

        let mut lanes = LaneSet::with_key();
        let mut intersections: SlotMap<NodeId, Intersection> = SlotMap::with_key();
        let mut road_lanes = vec![];

        // Intersections, with their signal cycles scattered in time
        let half = 0.5 * (n - 1) as f64;
        let mut nodes = Vec::with_capacity(n * n);
        for y in 0..n {
            for x in 0..n {
                let position = Point2d::new(
                    (x as f64 - half) * config.block_size,
                    (y as f64 - half) * config.block_size,
                );
                let offset = rng.gen_range(0.0..config.timing.cycle());
                let signal = Signal::new(config.timing, offset);
                nodes.push(intersections.insert(Intersection::new(position, signal)));
            }
        }
        let node = |x: usize, y: usize| nodes[y * n + x];

        // Two opposing road lanes per adjacent pair of intersections
        let mut links_out = SecondaryMap::new();
        let mut links_in = SecondaryMap::new();
        for id in intersections.keys() {
            links_out.insert(id, Vec::new());
            links_in.insert(id, Vec::new());
        }
        let mut pairs = vec![];
        for y in 0..n {
            for x in 0..n {
                if x + 1 < n {
                    pairs.push((node(x, y), node(x + 1, y)));
                }
                if y + 1 < n {
                    pairs.push((node(x, y), node(x, y + 1)));
                }
            }
        }
        for (a, b) in pairs {
            for (from, to) in [(a, b), (b, a)] {
                let from_pos = intersections[from].position;
                let to_pos = intersections[to].position;
                let dir = (to_pos - from_pos).normalize();
                // Keep to the right of the road's centre line
                let side = -config.lane_offset * rot90(dir);
                let start = from_pos + config.junction_radius * dir + side;
                let end = to_pos - config.junction_radius * dir + side;
                let axis = if dir.x.abs() > dir.y.abs() {
                    Axis::EastWest
                } else {
                    Axis::NorthSouth
                };
                let curve = LaneCurve::new(&LineSegment2d::from_ends(start, end));
                let id =
                    lanes.insert_with_key(|id| Lane::new(id, LaneKind::Road { to, axis }, curve));
                links_out[from].push(id);
                links_in[to].push(id);
                road_lanes.push(id);
            }
        }

        // Connectors for every turn that does not double back
        let mut turns = 0;
        let mut rejected = 0;
        for id in intersections.keys() {
            for (&lane_in, &lane_out) in iproduct!(links_in[id].iter(), links_out[id].iter()) {
                let entry = {
                    let curve = lanes[lane_in].curve();
                    curve.sample_centre(curve.length())
                };
                let exit = lanes[lane_out].curve().sample_centre(0.0);
                if entry.tan.angle(exit.tan).0.abs() > MAX_TURN_ANGLE {
                    rejected += 1;
                    continue;
                }
                let chord = (exit.pos - entry.pos).magnitude();
                let control = entry.pos + 0.5 * chord * entry.tan;
                let curve = LaneCurve::new(&QuadraticBezier2d::new(&[entry.pos, control, exit.pos]));
                let junction = lanes.insert_with_key(|id| Lane::new(id, LaneKind::Junction, curve));
                connect(&mut lanes, lane_in, junction);
                connect(&mut lanes, junction, lane_out);
                turns += 1;
            }
        }

        info!(
            "built {n}x{n} grid: {} intersections, {} road lanes, {} turns ({} rejected)",
            intersections.len(),
            road_lanes.len(),
            turns,
            rejected
        );

        Self {
            lanes,
            intersections,
            road_lanes,
        }
    }

    /// Gets a reference to the lane with the given ID.
    pub fn lane(&self, lane_id: LaneId) -> &Lane {
        &self.lanes[lane_id]
    }

    /// Gets a reference to the intersection with the given ID.
    pub fn intersection(&self, node_id: NodeId) -> &Intersection {
        &self.intersections[node_id]
    }

    /// Returns an iterator over all the lanes in the network.
    pub fn iter_lanes(&self) -> impl Iterator<Item = &Lane> {
        self.lanes.values()
    }

    /// Returns an iterator over all the intersections in the network.
    pub fn iter_intersections(&self) -> impl Iterator<Item = (NodeId, &Intersection)> {
        self.intersections.iter()
    }

    /// Every road lane in the network.
    pub fn road_lanes(&self) -> &[LaneId] {
        &self.road_lanes
    }

    /// Picks a uniformly random road lane.
    pub(crate) fn random_road_lane(&self, rng: &mut StdRng) -> LaneId {
        self.road_lanes[rng.gen_range(0..self.road_lanes.len())]
    }

    /// Advances every signal in the network.
    ///
    /// # Parameters
    /// * `dt` - The time step in s
    pub(crate) fn step_signals(&mut self, dt: f64) {
        for (_, intersection) in &mut self.intersections {
            intersection.signal.step(dt);
        }
    }

    #[cfg(test)]
    pub(crate) fn intersection_mut(&mut self, node_id: NodeId) -> &mut Intersection {
        &mut self.intersections[node_id]
    }
}

/// Records that the end of `from` leads onto the start of `to`.
fn connect(lanes: &mut LaneSet, from: LaneId, to: LaneId) {
    lanes[from].add_link_out(to);
    lanes[to].add_link_in(from);
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::SeedableRng;

    fn build(grid_size: usize) -> Network {
        let config = NetworkConfig {
            grid_size,
            ..Default::default()
        };
        Network::grid(&config, &mut StdRng::seed_from_u64(1))
    }

    #[test]
    fn grid_has_expected_counts() {
        let network = build(4);
        assert_eq!(network.intersections.len(), 16);
        assert_eq!(network.road_lanes.len(), 48);
        let junctions = network
            .iter_lanes()
            .filter(|lane| lane.kind() == LaneKind::Junction)
            .count();
        assert_eq!(junctions, 104);
    }

    #[test]
    fn junction_lanes_join_exactly_two_roads() {
        let network = build(3);
        for lane in network.iter_lanes() {
            if lane.kind() != LaneKind::Junction {
                continue;
            }
            assert_eq!(lane.links_in().len(), 1);
            assert_eq!(lane.links_out().len(), 1);
            let prev = network.lane(lane.links_in()[0]);
            let next = network.lane(lane.links_out()[0]);
            assert!(matches!(prev.kind(), LaneKind::Road { .. }));
            assert!(matches!(next.kind(), LaneKind::Road { .. }));
        }
    }

    #[test]
    fn turns_are_never_too_sharp() {
        let network = build(3);
        for lane in network.iter_lanes() {
            if lane.kind() != LaneKind::Junction {
                continue;
            }
            let prev = network.lane(lane.links_in()[0]);
            let next = network.lane(lane.links_out()[0]);
            let entry = prev.curve().sample_centre(prev.length()).tan;
            let exit = next.curve().sample_centre(0.0).tan;
            assert!(entry.angle(exit).0.abs() <= MAX_TURN_ANGLE + 1e-9);
        }
    }

    #[test]
    fn junction_geometry_is_continuous() {
        let network = build(3);
        for lane in network.iter_lanes() {
            if lane.kind() != LaneKind::Junction {
                continue;
            }
            let prev = network.lane(lane.links_in()[0]);
            let next = network.lane(lane.links_out()[0]);
            let entry = prev.curve().sample_centre(prev.length()).pos;
            let exit = next.curve().sample_centre(0.0).pos;
            let start = lane.curve().sample_centre(0.0).pos;
            let end = lane.curve().sample_centre(lane.length()).pos;
            assert!((start - entry).magnitude() < 0.05);
            assert!((end - exit).magnitude() < 0.05);
        }
    }

    #[test]
    fn roads_are_inset_from_intersections() {
        let config = NetworkConfig::default();
        let network = build(3);
        let expected = config.block_size - 2.0 * config.junction_radius;
        for &lane_id in network.road_lanes() {
            assert_approx_eq!(network.lane(lane_id).length(), expected, 0.01);
        }
    }

    #[test]
    fn every_road_has_an_exit() {
        for grid_size in [2, 3] {
            let network = build(grid_size);
            for &lane_id in network.road_lanes() {
                assert!(!network.lane(lane_id).links_out().is_empty());
            }
        }
    }
}
