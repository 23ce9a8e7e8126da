pub use curve::{LaneCurve, LaneSample};
use smallvec::SmallVec;
use crate::signal::Axis;
use crate::{LaneId, NodeId};

mod curve;

/// A lane represents a single one-way strip of traffic.
#[derive(Clone)]
pub struct Lane {
    /// The lane ID.
    id: LaneId,
    /// Whether this is a road or a connector through an intersection.
    kind: LaneKind,
    /// The geometry of the lane.
    curve: LaneCurve,
    /// The lanes that precede this one.
    links_in: SmallVec<[LaneId; 4]>,
    /// The lanes that succeed this one.
    links_out: SmallVec<[LaneId; 4]>,
}

/// The two kinds of lane in a grid network.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaneKind {
    /// A straight lane between two intersections.
    Road {
        /// The intersection the lane runs towards.
        to: NodeId,
        /// The travel axis, which selects the signal window at `to`.
        axis: Axis,
    },
    /// A connector through an intersection, with exactly one lane in and one out.
    Junction,
}

impl Lane {
    /// Creates a new lane.
    pub(crate) fn new(id: LaneId, kind: LaneKind, curve: LaneCurve) -> Self {
        Self {
            id,
            kind,
            curve,
            links_in: SmallVec::new(),
            links_out: SmallVec::new(),
        }
    }

    /// Gets the lane's ID.
    pub fn id(&self) -> LaneId {
        self.id
    }

    /// Gets the lane's kind.
    pub fn kind(&self) -> LaneKind {
        self.kind
    }

    /// Gets the length of the lane in m.
    pub fn length(&self) -> f64 {
        self.curve.length()
    }

    /// Gets the curve representing the lane's centre line.
    pub fn curve(&self) -> &LaneCurve {
        &self.curve
    }

    /// The lanes feeding into the start of this one.
    pub fn links_in(&self) -> &[LaneId] {
        &self.links_in
    }

    /// The lanes leading on from the end of this one.
    pub fn links_out(&self) -> &[LaneId] {
        &self.links_out
    }

    /// Adds a successor lane.
    pub(crate) fn add_link_out(&mut self, lane_id: LaneId) {
        self.links_out.push(lane_id);
    }

    /// Adds a predecessor lane.
    pub(crate) fn add_link_in(&mut self, lane_id: LaneId) {
        self.links_in.push(lane_id);
    }
}
