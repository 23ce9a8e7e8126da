use std::cell::Cell;

/// The deceleration applied inside the minimum gap,
/// as a multiple of the comfortable deceleration.
const EMERGENCY_FACTOR: f64 = 4.0;

/// A small floor on the following gap, to keep the model finite.
const GAP_EPSILON: f64 = 0.1;

/// The calibration constants of the car following model.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DriverParams {
    /// The desired cruising speed in m/s.
    pub desired_speed: f64,
    /// The desired time gap to the vehicle in front in s.
    pub time_headway: f64,
    /// The maximum acceleration in m/s<sup>2</sup>.
    pub max_acceleration: f64,
    /// The comfortable decelleration in m/s<sup>2</sup>.
    pub comf_deceleration: f64,
    /// The minimum gap to maintain when queued, in m.
    pub jam_distance: f64,
}

impl Default for DriverParams {
    fn default() -> Self {
        Self {
            desired_speed: 14.0,
            time_headway: 1.6,
            max_acceleration: 1.5,
            comf_deceleration: 2.5,
            jam_distance: 3.0,
        }
    }
}

/// The car following model of a single driver.
///
/// The planned acceleration is stored interiorly, so an entire population
/// can be planned against a frozen snapshot of positions and velocities
/// before any of them are integrated.
#[derive(Clone, Debug)]
pub(crate) struct DriverModel {
    /// The desired cruising speed in m/s.
    desired_speed: f64,
    /// The desired time gap to the vehicle in front in s.
    headway: f64,
    /// The maximum acceleration in m/s^2.
    max_acc: f64,
    /// The comfortable decelleration in m/s^2.
    comf_dec: f64,
    /// The minimum gap to maintain when queued, in m.
    jam_dist: f64,
    /// The multiplier applied to the desired speed.
    speed_adj: f64,
    /// The acceleration planned for the current step, in m/s^2.
    acc: Cell<f64>,
    /// Set when the planned response is to stop on the spot.
    halt: Cell<bool>,
}

impl DriverModel {
    /// Creates a new driver model.
    pub fn new(params: &DriverParams) -> Self {
        Self {
            desired_speed: params.desired_speed,
            headway: params.time_headway,
            max_acc: params.max_acceleration,
            comf_dec: params.comf_deceleration,
            jam_dist: params.jam_distance,
            speed_adj: 1.0,
            acc: Cell::new(0.0),
            halt: Cell::new(false),
        }
    }

    /// Sets the multiplier applied to the desired speed.
    pub fn set_speed_adjust(&mut self, factor: f64) {
        self.speed_adj = factor;
    }

    /// The driver's adjusted desired speed in m/s.
    pub fn desired_speed(&self) -> f64 {
        self.speed_adj * self.desired_speed
    }

    /// The acceleration planned for the current step, in m/s^2.
    pub fn acc(&self) -> f64 {
        self.acc.get()
    }

    /// Takes the halt flag, leaving it cleared.
    pub fn take_halt(&self) -> bool {
        self.halt.replace(false)
    }

    /// Plans an acceleration with nothing ahead of the car.
    ///
    /// # Parameters
    /// * `vel` - The car's velocity in m/s
    pub fn cruise(&self, vel: f64) {
        self.follow(vel, f64::INFINITY, vel);
    }

    /// Plans an acceleration in response to an obstacle ahead of the car.
    ///
    /// # Parameters
    /// * `vel` - The car's velocity in m/s
    /// * `gap` - The net distance to the obstacle in m
    /// * `obstacle_vel` - The obstacle's velocity in m/s
    pub fn follow(&self, vel: f64, gap: f64, obstacle_vel: f64) {
        if gap < self.jam_dist {
            self.acc.set(-EMERGENCY_FACTOR * self.comf_dec);
            self.halt.set(true);
            return;
        }
        self.acc.set(self.idm(vel, gap, obstacle_vel));
    }

    /// Computes an acceleration using the intelligent driver model.
    fn idm(&self, vel: f64, gap: f64, their_vel: f64) -> f64 {
        let appr = vel - their_vel;
        let factor = 1. / (2. * self.max_acc * self.comf_dec).sqrt();
        let ss = self.jam_dist + f64::max(0., (vel * self.headway) + (vel * appr * factor));
        let term = ss / f64::max(gap, GAP_EPSILON);
        let free = vel / self.desired_speed();
        self.max_acc * (1. - free.powi(4) - (term * term))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn model() -> DriverModel {
        DriverModel::new(&DriverParams::default())
    }

    #[test]
    fn decelerates_when_closing_on_a_slower_car() {
        // Follower doing 14 m/s, leader 45.4 m ahead doing 10 m/s
        let model = model();
        model.follow(14.0, 45.4, 10.0);
        assert_approx_eq!(model.acc(), -1.53, 0.01);
        assert!(!model.take_halt());
    }

    #[test]
    fn holds_steady_at_the_desired_speed() {
        let model = model();
        model.cruise(14.0);
        assert_approx_eq!(model.acc(), 0.0);
    }

    #[test]
    fn free_acceleration_tapers_quartically() {
        let model = model();
        for vel in [0.0, 3.5, 7.0, 10.5] {
            model.cruise(vel);
            let expected = 1.5 * (1.0 - (vel / 14.0_f64).powi(4));
            assert_approx_eq!(model.acc(), expected);
        }
    }

    #[test]
    fn halts_inside_the_minimum_gap() {
        let model = model();
        model.follow(7.0, 2.9, 0.0);
        assert_approx_eq!(model.acc(), -10.0);
        assert!(model.take_halt());
        assert!(!model.take_halt());
    }

    #[test]
    fn speed_adjust_moves_the_equilibrium() {
        let mut model = model();
        model.set_speed_adjust(0.8);
        model.cruise(0.8 * 14.0);
        assert_approx_eq!(model.acc(), 0.0);
    }
}
