use std::time::{Duration, Instant};

use grid_traffic::{FlowState, SimConfig, Simulation};

fn main() {
    env_logger::init();

    let config = SimConfig::default();
    let mut sim = Simulation::new(&config);
    sim.randomise_speed_adjusts(0.08);

    println!(
        "Simulating {} cars on a {}x{} grid...",
        config.car_count, config.network.grid_size, config.network.grid_size
    );

    let mut last = Instant::now();
    let mut next_report = 5.0;
    while sim.time() < 30.0 {
        // Stands in for a frame of render work
        std::thread::sleep(Duration::from_millis(15));

        let now = Instant::now();
        sim.advance(now.duration_since(last).as_secs_f64());
        last = now;

        if sim.time() >= next_report {
            next_report += 5.0;
            report(&sim);
        }
    }
}

fn report(sim: &Simulation) {
    let mut braking = 0;
    let mut queued = 0;
    let mut count = 0;
    let mut speed = 0.0;
    for car in sim.iter_cars() {
        match car.flow_state() {
            FlowState::Braking => braking += 1,
            FlowState::LowSpeed => queued += 1,
            FlowState::FreeFlow => {}
        }
        speed += car.vel();
        count += 1;
    }
    println!(
        "t={:.0}s: avg speed {:.1} m/s, {} braking, {} queued ({} cars)",
        sim.time(),
        speed / f64::max(count as f64, 1.0),
        braking,
        queued,
        count,
    );
}
