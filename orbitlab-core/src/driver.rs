//! Simulation driver
//!
//! Owns one particle per configured slot and advances all of them through
//! a shared simulated timeline. Every outer repetition moves each slot
//! forward by `1 / base_frame_rate` seconds, split into that slot's
//! sub-steps, and then emits a snapshot.

use crate::config::{ConfigError, SimulationConfig, SlotTable};
use crate::engine::{ForceField, Particle};
use glam::Vec2;
use log::{debug, info, trace};

/// One slot's entry in a snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotEntry<T> {
    pub position: Vec2,
    pub tag: T,
}

/// Positions of every slot, in slot order
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub entries: Vec<SnapshotEntry<T>>,
}

impl<T> Snapshot<T> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Receives snapshots as the driver emits them
pub trait SnapshotSink<T> {
    fn accept(&mut self, snapshot: Snapshot<T>);
}

impl<T> SnapshotSink<T> for Vec<Snapshot<T>> {
    fn accept(&mut self, snapshot: Snapshot<T>) {
        self.push(snapshot);
    }
}

/// Sink that drops everything
impl<T> SnapshotSink<T> for () {
    fn accept(&mut self, _snapshot: Snapshot<T>) {}
}

/// Advances every slot's particle through the shared timeline
#[derive(Debug)]
pub struct SimulationDriver<F, T> {
    field: F,
    config: SimulationConfig,
    slots: SlotTable<T>,
    particles: Vec<Particle>,
    /// Simulated seconds each slot has advanced since the last reset
    elapsed: Vec<f64>,
    warp: u32,
    frames: u64,
}

impl<F: ForceField, T: Clone> SimulationDriver<F, T> {
    /// Build a driver with all particles at the initial condition and warp 0
    pub fn new(
        field: F,
        config: SimulationConfig,
        slots: SlotTable<T>,
    ) -> Result<Self, ConfigError> {
        validate(&field, &config, &slots)?;

        info!(
            "driver: {} slots at {} Hz base rate",
            slots.len(),
            config.base_frame_rate
        );

        let n = slots.len();
        let mut driver = Self {
            field,
            config,
            slots,
            particles: vec![Particle::default(); n],
            elapsed: vec![0.0; n],
            warp: 0,
            frames: 0,
        };
        driver.reset();
        Ok(driver)
    }

    /// Swap in a new table and configuration, keeping warp
    ///
    /// The particle buffer is reallocated only when the slot count
    /// changes. All particles are reset.
    pub fn reconfigure(
        &mut self,
        config: SimulationConfig,
        slots: SlotTable<T>,
    ) -> Result<(), ConfigError> {
        validate(&self.field, &config, &slots)?;

        let n = slots.len();
        if n != self.particles.len() {
            self.particles = vec![Particle::default(); n];
            self.elapsed = vec![0.0; n];
        }
        info!(
            "driver reconfigured: {} slots at {} Hz base rate",
            n, config.base_frame_rate
        );

        self.config = config;
        self.slots = slots;
        self.reset();
        Ok(())
    }

    /// Put every particle back at the shared initial condition
    pub fn reset(&mut self) {
        let start = Particle::new(self.config.initial_position, self.config.initial_velocity);
        self.particles.fill(start);
        self.elapsed.fill(0.0);
        self.frames = 0;
        debug!("reset {} particles, warp stays {}", self.particles.len(), self.warp);
    }

    /// Change warp by `delta`, clamping at zero
    pub fn set_warp(&mut self, delta: i32) {
        let warp = (i64::from(self.warp) + i64::from(delta)).clamp(0, i64::from(u32::MAX));
        self.warp = warp as u32;
        debug!("warp {}", self.warp);
    }

    /// Drop warp straight to zero
    pub fn stop(&mut self) {
        self.warp = 0;
        debug!("warp {}", self.warp);
    }

    /// Run `warp` repetitions, emitting one snapshot after each
    ///
    /// Returns the number of snapshots emitted.
    pub fn advance_frame<S: SnapshotSink<T> + ?Sized>(&mut self, sink: &mut S) -> u32 {
        for _ in 0..self.warp {
            self.step_all();
            let snapshot = self.snapshot();
            trace!("frame {}: snapshot of {} slots", self.frames, snapshot.len());
            sink.accept(snapshot);
        }
        self.warp
    }

    /// Advance and collect the emitted snapshots
    pub fn advance_frame_collect(&mut self) -> Vec<Snapshot<T>> {
        let mut snapshots = Vec::new();
        self.advance_frame(&mut snapshots);
        snapshots
    }

    /// One outer repetition: every slot advances `1 / base_frame_rate`
    fn step_all(&mut self) {
        for ((slot, particle), elapsed) in self
            .slots
            .iter()
            .zip(self.particles.iter_mut())
            .zip(self.elapsed.iter_mut())
        {
            let dt = self.config.sub_step_dt(slot.sub_steps);
            for _ in 0..slot.sub_steps {
                slot.integrator.step(particle, dt, &self.field);
            }
            *elapsed += f64::from(dt) * f64::from(slot.sub_steps);
        }
        self.frames += 1;
    }

    /// Current positions without advancing
    pub fn snapshot(&self) -> Snapshot<T> {
        Snapshot {
            entries: self
                .slots
                .iter()
                .zip(&self.particles)
                .map(|(slot, p)| SnapshotEntry {
                    position: p.pos,
                    tag: slot.tag.clone(),
                })
                .collect(),
        }
    }
}

impl<F, T> SimulationDriver<F, T> {
    pub fn warp(&self) -> u32 {
        self.warp
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn slots(&self) -> &SlotTable<T> {
        &self.slots
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn field(&self) -> &F {
        &self.field
    }

    /// Outer repetitions performed since the last reset
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Simulated seconds slot `index` has advanced since the last reset
    pub fn elapsed(&self, index: usize) -> Option<f64> {
        self.elapsed.get(index).copied()
    }
}

fn validate<F: ForceField, T>(
    field: &F,
    config: &SimulationConfig,
    slots: &SlotTable<T>,
) -> Result<(), ConfigError> {
    config.validate()?;
    // A finite rate can still overflow or underflow once split into sub-steps
    for (slot, cfg) in slots.iter().enumerate() {
        let dt = config.sub_step_dt(cfg.sub_steps);
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ConfigError::InvalidSubStep { slot, dt });
        }
    }
    if field.is_singular_at(config.initial_position) {
        return Err(ConfigError::SingularStart(config.initial_position));
    }
    Ok(())
}
