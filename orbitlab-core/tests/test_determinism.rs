//! Determinism tests - identical drivers fed identical calls agree bit for bit

use orbitlab_core::config::{default_table, Color, SimulationConfig};
use orbitlab_core::driver::{SimulationDriver, Snapshot};
use orbitlab_core::engine::GravityField;

fn build() -> SimulationDriver<GravityField, Color> {
    SimulationDriver::new(
        GravityField::default(),
        SimulationConfig::default(),
        default_table(),
    )
    .expect("default setup is valid")
}

/// reset, a few warp changes, and a run of frames
fn drive(driver: &mut SimulationDriver<GravityField, Color>) -> Vec<Snapshot<Color>> {
    let mut snapshots = Vec::new();
    driver.reset();
    driver.set_warp(3);
    for frame in 0..40 {
        if frame == 10 {
            driver.set_warp(-1);
        }
        if frame == 25 {
            driver.set_warp(4);
        }
        driver.advance_frame(&mut snapshots);
    }
    snapshots
}

#[test]
fn test_identical_drivers_identical_snapshots() {
    let mut a = build();
    let mut b = build();

    let run_a = drive(&mut a);
    let run_b = drive(&mut b);

    assert_eq!(run_a.len(), 10 * 3 + 15 * 2 + 15 * 6);
    assert_eq!(run_a, run_b);
    assert_eq!(a.particles(), b.particles());
}

#[test]
fn test_reset_replays_the_same_trajectory() {
    let mut driver = build();
    let first = drive(&mut driver);

    // Warp survives reset, so bring it back to where the first run began
    driver.stop();
    let second = drive(&mut driver);

    assert_eq!(first, second);
}
