/// Represents a vehicle, stop line or other object a car
/// may need to follow or stop before reaching.
#[derive(Clone, Copy)]
pub struct Obstacle {
    /// The net distance to the obstacle, in m.
    pub gap: f64,
    /// The velocity of the obstacle, in m/s.
    pub vel: f64,
}
