pub mod config;
pub mod diagnostics;
pub mod driver;
pub mod engine;
pub mod integrator;
pub mod parser;

pub use config::{default_table, Color, ConfigError, SimulationConfig, SlotConfig, SlotTable};
pub use diagnostics::Span;
pub use driver::{SimulationDriver, Snapshot, SnapshotEntry, SnapshotSink};
pub use engine::{ForceField, GravityField, Particle, ZeroField};
pub use integrator::IntegratorKind;
pub use parser::{parse_scene, ParseError, Scene, SceneError};
