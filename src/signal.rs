/// The travel axis a road approaches an intersection along.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    /// Roads running along the vertical axis of the grid.
    NorthSouth,
    /// Roads running along the horizontal axis of the grid.
    EastWest,
}

/// The state a signal shows to one axis of traffic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SignalColor {
    Red,
    Yellow,
    Green,
}

/// The timing plan of an intersection signal.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignalTiming {
    /// The duration of the green window in s.
    pub green: f64,
    /// The duration of the yellow window in s.
    pub yellow: f64,
    /// The duration of the all-red clearance window in s.
    pub all_red: f64,
}

impl SignalTiming {
    /// The length of the full cycle in s, covering both axes' windows.
    pub fn cycle(&self) -> f64 {
        2.0 * (self.green + self.yellow + self.all_red)
    }
}

impl Default for SignalTiming {
    fn default() -> Self {
        Self {
            green: 10.0,
            yellow: 4.0,
            all_red: 2.0,
        }
    }
}

/// A fixed-cycle signal serving two perpendicular axes of traffic.
///
/// Only the cycle timer is stored; both colours are derived from it,
/// so a signal can never show conflicting states.
#[derive(Clone, Debug)]
pub struct Signal {
    /// The timing plan.
    timing: SignalTiming,
    /// The time elapsed within the repeating cycle in s.
    timer: f64,
}

impl Signal {
    /// Creates a new signal with its cycle already advanced by `offset` seconds.
    pub fn new(timing: SignalTiming, offset: f64) -> Self {
        Self {
            timing,
            timer: offset % timing.cycle(),
        }
    }

    /// Advances the signal timing.
    ///
    /// # Parameters
    /// * `dt` - The time step in s
    pub fn step(&mut self, dt: f64) {
        self.timer = (self.timer + dt) % self.timing.cycle();
    }

    /// The colour currently shown to traffic approaching along the given axis.
    pub fn permission(&self, axis: Axis) -> SignalColor {
        match axis {
            Axis::NorthSouth => self.ns_color(),
            Axis::EastWest => self.ew_color(),
        }
    }

    /// The colour currently shown to north-south traffic.
    pub fn ns_color(&self) -> SignalColor {
        let SignalTiming { green, yellow, .. } = self.timing;
        if self.timer < green {
            SignalColor::Green
        } else if self.timer < green + yellow {
            SignalColor::Yellow
        } else {
            SignalColor::Red
        }
    }

    /// The colour currently shown to east-west traffic.
    pub fn ew_color(&self) -> SignalColor {
        let SignalTiming {
            green,
            yellow,
            all_red,
        } = self.timing;
        let start = green + yellow + all_red;
        if self.timer < start {
            SignalColor::Red
        } else if self.timer < start + green {
            SignalColor::Green
        } else if self.timer < start + green + yellow {
            SignalColor::Yellow
        } else {
            SignalColor::Red
        }
    }

    /// Rewinds the cycle to the given elapsed time.
    #[cfg(test)]
    pub(crate) fn set_offset(&mut self, offset: f64) {
        self.timer = offset % self.timing.cycle();
    }
}
