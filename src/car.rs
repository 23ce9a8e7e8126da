pub use following::DriverParams;
use following::DriverModel;
use std::cell::Cell;

use crate::debug::debug_circle;
use crate::math::{Point2d, Vector2d};
use crate::network::Network;
use crate::{CarId, LaneId};

mod following;

/// Progress along a lane is clamped just short of 1,
/// so presentation always samples inside the lane.
const MAX_PROGRESS: f64 = 0.999;

/// Planned accelerations below this classify a car as braking, in m/s^2.
const BRAKING_THRESHOLD: f64 = -0.5;

/// Cars below this fraction of their desired speed classify as slow.
const LOW_SPEED_FRACTION: f64 = 0.5;

/// A presentation hint describing a car's state of motion.
/// It has no effect on the physics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FlowState {
    /// Moving at or near the desired speed.
    FreeFlow,
    /// Actively slowing down.
    Braking,
    /// Well below the desired speed; queued or crawling.
    LowSpeed,
}

/// A simulated car.
#[derive(Clone, Debug)]
pub struct Car {
    /// The car's ID.
    id: CarId,
    /// The lane the car is currently on.
    lane: LaneId,
    /// The longitudinal position along the lane, in m.
    pos: f64,
    /// The velocity in m/s.
    vel: f64,
    /// The next lane the car has committed to, if any.
    target: Cell<Option<LaneId>>,
    /// The car following model.
    driver: DriverModel,
    /// The world space coordinates of the car.
    world_pos: Point2d,
    /// A world space unit vector along the car's lane.
    world_dir: Vector2d,
    /// The normalised position along the lane, clamped to [0, 0.999].
    progress: f64,
}

impl Car {
    /// Creates a new car.
    pub(crate) fn new(id: CarId, lane: LaneId, pos: f64, vel: f64, params: &DriverParams) -> Self {
        Self {
            id,
            lane,
            pos,
            vel,
            target: Cell::new(None),
            driver: DriverModel::new(params),
            world_pos: Point2d::new(0.0, 0.0),
            world_dir: Vector2d::new(0.0, 0.0),
            progress: 0.0,
        }
    }

    /// Gets the car's ID.
    pub fn id(&self) -> CarId {
        self.id
    }

    /// The ID of the lane the car is currently on.
    pub fn lane(&self) -> LaneId {
        self.lane
    }

    /// The longitudinal position along the lane, in m.
    pub fn pos(&self) -> f64 {
        self.pos
    }

    /// The car's velocity in m/s.
    pub fn vel(&self) -> f64 {
        self.vel
    }

    /// The car's planned acceleration in m/s^2.
    pub fn acc(&self) -> f64 {
        self.driver.acc()
    }

    /// The next lane the car has committed to, if any.
    pub fn target(&self) -> Option<LaneId> {
        self.target.get()
    }

    /// The coordinates in world space of the centre of the car.
    pub fn position(&self) -> Point2d {
        self.world_pos
    }

    /// A unit vector in world space aligned with the car's lane.
    pub fn direction(&self) -> Vector2d {
        self.world_dir
    }

    /// The normalised position along the lane, clamped to [0, 0.999].
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Classifies the car's state of motion for presentation.
    pub fn flow_state(&self) -> FlowState {
        if self.driver.acc() < BRAKING_THRESHOLD {
            FlowState::Braking
        } else if self.vel < LOW_SPEED_FRACTION * self.driver.desired_speed() {
            FlowState::LowSpeed
        } else {
            FlowState::FreeFlow
        }
    }

    /// The car's following model.
    pub(crate) fn driver(&self) -> &DriverModel {
        &self.driver
    }

    pub(crate) fn driver_mut(&mut self) -> &mut DriverModel {
        &mut self.driver
    }

    /// Commits the car to the given next lane.
    pub(crate) fn commit(&self, lane_id: LaneId) {
        self.target.set(Some(lane_id));
    }

    /// Takes the committed next lane, leaving no commitment.
    pub(crate) fn take_target(&self) -> Option<LaneId> {
        self.target.take()
    }

    /// Integrates the car's velocity and position.
    ///
    /// # Parameters
    /// * `dt` - The time step in s
    pub(crate) fn integrate(&mut self, dt: f64) {
        if self.driver.take_halt() {
            // Inside the minimum gap; the car stops on the spot
            debug_circle("halt", self.world_pos, 1.0);
            self.vel = 0.0;
            return;
        }
        let mut acc = self.driver.acc();
        if self.vel == 0.0 && acc < 0.0 {
            acc = 0.0;
        }
        self.vel = f64::max(self.vel + acc * dt, 0.0);
        self.pos += self.vel * dt;
    }

    /// Moves the car onto the given lane.
    pub(crate) fn set_location(&mut self, lane: LaneId, pos: f64) {
        self.lane = lane;
        self.pos = pos;
    }

    /// Updates the car's world space coordinates and lane progress.
    pub(crate) fn update_coords(&mut self, network: &Network) {
        let lane = network.lane(self.lane);
        self.progress = f64::min(self.pos / lane.length(), MAX_PROGRESS);
        let sample = lane.curve().sample_centre(self.progress * lane.length());
        self.world_pos = sample.pos;
        self.world_dir = sample.tan;
    }
}
