pub use car::{Car, DriverParams, FlowState};
pub use cgmath;
pub use lane::{Lane, LaneCurve, LaneKind, LaneSample};
pub use network::{Intersection, Network, NetworkConfig};
pub use signal::{Axis, Signal, SignalColor, SignalTiming};
pub use simulation::{SimConfig, Simulation};
use slotmap::{new_key_type, SlotMap};
pub use slotmap::{Key, KeyData};
pub use util::Interval;

mod car;
mod debug;
mod lane;
pub mod math;
mod network;
mod obstacle;
mod signal;
mod simulation;
mod util;

new_key_type! {
    /// Unique ID of a [Lane].
    pub struct LaneId;
    /// Unique ID of an [Intersection].
    pub struct NodeId;
    /// Unique ID of a [Car].
    pub struct CarId;
}

type LaneSet = SlotMap<LaneId, Lane>;
type CarSet = SlotMap<CarId, Car>;
