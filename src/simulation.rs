use crate::car::{Car, DriverParams};
#[cfg(feature = "debug")]
use crate::debug::take_debug_frame;
use crate::debug::debug_line;
use crate::lane::{Lane, LaneKind};
use crate::network::{Network, NetworkConfig};
use crate::obstacle::Obstacle;
use crate::signal::SignalColor;
use crate::{CarId, CarSet, LaneId};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::Distribution;
use slotmap::SecondaryMap;

/// The configuration of a [Simulation].
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// The parameters of the road network.
    pub network: NetworkConfig,
    /// The car following calibration shared by every car.
    pub driver: DriverParams,
    /// The number of cars created at startup.
    pub car_count: usize,
    /// The length of every car in m.
    pub car_length: f64,
    /// The distance within which a car reacts to traffic on its next lane, in m.
    pub lookahead: f64,
    /// The distance short of a road's end at which cars stop for a signal, in m.
    pub stop_margin: f64,
    /// The fixed physics time step in s.
    pub time_step: f64,
    /// The most elapsed time a single frame may contribute, in s.
    pub max_frame_time: f64,
    /// The seed for the simulation's random number generator.
    /// `None` seeds it from entropy.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            driver: DriverParams::default(),
            car_count: 120,
            car_length: 4.6,
            lookahead: 50.0,
            stop_margin: 2.0,
            time_step: 1.0 / 60.0,
            max_frame_time: 0.1,
            seed: None,
        }
    }
}

/// A traffic simulation over a grid of signalised intersections.
pub struct Simulation {
    /// The configuration the simulation was created with.
    config: SimConfig,
    /// The road network.
    network: Network,
    /// The cars being simulated.
    cars: CarSet,
    /// The cars on each lane, ordered front to back.
    lane_queues: SecondaryMap<LaneId, Vec<CarId>>,
    /// The simulation's random number generator.
    rng: StdRng,
    /// Elapsed frame time not yet consumed by a physics step, in s.
    accumulator: f64,
    /// The current frame of simulation.
    frame: usize,
    /// The simulated time in s.
    time: f64,
    /// Debugging information from the previously simulated frame.
    #[cfg(feature = "debug")]
    debug: serde_json::Value,
}

impl Simulation {
    /// Creates a new simulation, building the network and scattering
    /// the initial population of stationary cars over its road lanes.
    pub fn new(config: &SimConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let network = Network::grid(&config.network, &mut rng);

        let mut lane_queues = SecondaryMap::new();
        for lane in network.iter_lanes() {
            lane_queues.insert(lane.id(), Vec::new());
        }

        let mut sim = Self {
            config: *config,
            network,
            cars: CarSet::with_key(),
            lane_queues,
            rng,
            accumulator: 0.0,
            frame: 0,
            time: 0.0,
            #[cfg(feature = "debug")]
            debug: serde_json::Value::Null,
        };
        for _ in 0..config.car_count {
            let lane = sim.network.random_road_lane(&mut sim.rng);
            let pos = sim.rng.gen_range(0.0..sim.network.lane(lane).length());
            sim.insert_car(lane, pos, 0.0);
        }
        info!(
            "spawned {} cars over {} road lanes",
            sim.cars.len(),
            sim.network.road_lanes().len()
        );
        sim
    }

    /// Creates a car on the given lane.
    pub(crate) fn insert_car(&mut self, lane: LaneId, pos: f64, vel: f64) -> CarId {
        let driver = self.config.driver;
        let car_id = self
            .cars
            .insert_with_key(|id| Car::new(id, lane, pos, vel, &driver));
        self.cars[car_id].update_coords(&self.network);
        car_id
    }

    /// Advances the simulation by a frame's worth of elapsed time,
    /// running as many fixed steps as the accumulated time covers.
    /// Returns the number of steps that were run.
    pub fn advance(&mut self, elapsed: f64) -> usize {
        self.accumulator += elapsed.clamp(0.0, self.config.max_frame_time);
        let mut steps = 0;
        while self.accumulator >= self.config.time_step {
            self.accumulator -= self.config.time_step;
            self.step(self.config.time_step);
            steps += 1;
        }
        steps
    }

    /// Advances the simulation by `dt` seconds in a single step.
    pub fn step(&mut self, dt: f64) {
        self.network.step_signals(dt);
        self.rebuild_queues();
        self.plan_accelerations();
        self.integrate(dt);
        self.advance_cars();
        self.update_car_coords();
        self.frame += 1;
        self.time += dt;

        #[cfg(feature = "debug")]
        {
            self.debug = take_debug_frame();
        }
    }

    /// Gets the current simulation frame index.
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Gets the simulated time in s.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// The configuration the simulation was created with.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// The road network.
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Returns an iterator over all the cars in the simulation.
    pub fn iter_cars(&self) -> impl Iterator<Item = &Car> {
        self.cars.values()
    }

    /// Gets a reference to the car with the given ID.
    pub fn get_car(&self, car_id: CarId) -> &Car {
        &self.cars[car_id]
    }

    /// Randomly assigns a desired speed adjustment factor to each car,
    /// which is sampled from a normal distribution with a mean of 1 (no adjustment)
    /// and standard deviation of `stddev`.
    pub fn randomise_speed_adjusts(&mut self, stddev: f64) {
        let distr = rand_distr::Normal::new(1.0, stddev).expect("Invalid standard deviation");
        for (_, car) in &mut self.cars {
            let factor = distr.sample(&mut self.rng).clamp(0.75, 1.25);
            car.driver_mut().set_speed_adjust(factor);
        }
    }

    /// Gets the debugging information for the previously simulated frame as a JSON array.
    #[cfg(feature = "debug")]
    pub fn debug(&mut self) -> serde_json::Value {
        self.debug.clone()
    }

    /// Groups the cars by lane, ordered from the front of each lane to the back.
    fn rebuild_queues(&mut self) {
        for (_, queue) in self.lane_queues.iter_mut() {
            queue.clear();
        }
        for (car_id, car) in self.cars.iter() {
            self.lane_queues[car.lane()].push(car_id);
        }
        let cars = &self.cars;
        for (_, queue) in self.lane_queues.iter_mut() {
            queue.sort_unstable_by(|a, b| cars[*b].pos().partial_cmp(&cars[*a].pos()).unwrap());
        }
    }

    /// Plans every car's acceleration against a frozen snapshot of
    /// positions and velocities, without moving anything.
    fn plan_accelerations(&mut self) {
        for (lane_id, queue) in self.lane_queues.iter() {
            let lane = self.network.lane(lane_id);
            for (idx, &car_id) in queue.iter().enumerate() {
                let car = &self.cars[car_id];
                let obstacle = if idx > 0 {
                    let leader = &self.cars[queue[idx - 1]];
                    Some(Obstacle {
                        gap: leader.pos() - car.pos() - self.config.car_length,
                        vel: leader.vel(),
                    })
                } else {
                    front_obstacle(
                        &self.network,
                        &self.cars,
                        &self.lane_queues,
                        &self.config,
                        &mut self.rng,
                        lane,
                        car,
                    )
                };
                match obstacle {
                    Some(obstacle) => car.driver().follow(car.vel(), obstacle.gap, obstacle.vel),
                    None => car.driver().cruise(car.vel()),
                }
            }
        }
    }

    /// Integrates the velocities and positions of all the cars.
    fn integrate(&mut self, dt: f64) {
        for (_, car) in &mut self.cars {
            car.integrate(dt);
        }
    }

    /// Moves cars that have run off the end of their lane onto their
    /// committed next lane, or recycles them onto a random road lane.
    fn advance_cars(&mut self) {
        for (car_id, car) in self.cars.iter_mut() {
            let length = self.network.lane(car.lane()).length();
            if car.pos() < length {
                continue;
            }
            match car.take_target() {
                Some(next) => {
                    let pos = car.pos() - length;
                    car.set_location(next, pos);
                }
                None => {
                    debug!("car {:?} ran out of road, recycling", car_id);
                    let lane = self.network.random_road_lane(&mut self.rng);
                    car.set_location(lane, 0.0);
                }
            }
        }
    }

    /// Updates the world coordinates of all the cars.
    fn update_car_coords(&mut self) {
        for (_, car) in self.cars.iter_mut() {
            car.update_coords(&self.network);
        }
    }
}

/// Determines what the front car of a lane must not run into, if anything:
/// the stop line of a red or yellow signal, or the rearmost car on the
/// lane it will take next. On a green, this is also where the car commits
/// to its next lane.
fn front_obstacle(
    network: &Network,
    cars: &CarSet,
    lane_queues: &SecondaryMap<LaneId, Vec<CarId>>,
    config: &SimConfig,
    rng: &mut StdRng,
    lane: &Lane,
    car: &Car,
) -> Option<Obstacle> {
    match lane.kind() {
        LaneKind::Road { to, axis } => {
            match network.intersection(to).signal().permission(axis) {
                SignalColor::Red | SignalColor::Yellow => {
                    let gap = lane.length() - car.pos() - config.stop_margin;
                    debug_line(
                        "stop line",
                        car.position(),
                        car.position() + gap * car.direction(),
                    );
                    Some(Obstacle { gap, vel: 0.0 })
                }
                SignalColor::Green => {
                    if car.target().is_none() {
                        if let Some(&next) = lane.links_out().choose(rng) {
                            car.commit(next);
                        }
                    }
                    let rear = rearmost_car(cars, lane_queues, car.target()?)?;
                    let gap = lane.length() - car.pos() + rear.pos() - config.car_length;
                    if gap >= config.lookahead {
                        return None;
                    }
                    debug_line("bridged gap", car.position(), rear.position());
                    Some(Obstacle {
                        gap,
                        vel: rear.vel(),
                    })
                }
            }
        }
        LaneKind::Junction => {
            if car.target().is_none() {
                car.commit(lane.links_out()[0]);
            }
            let rear = rearmost_car(cars, lane_queues, car.target()?)?;
            debug_line("bridged gap", car.position(), rear.position());
            Some(Obstacle {
                gap: lane.length() - car.pos() + rear.pos() - config.car_length,
                vel: rear.vel(),
            })
        }
    }
}

/// The rearmost car on the given lane, if it is occupied.
fn rearmost_car<'a>(
    cars: &'a CarSet,
    lane_queues: &SecondaryMap<LaneId, Vec<CarId>>,
    lane_id: LaneId,
) -> Option<&'a Car> {
    lane_queues[lane_id].last().map(|id| &cars[*id])
}
