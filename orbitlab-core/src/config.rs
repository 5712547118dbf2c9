//! Slot table and run configuration
//!
//! A slot pairs one particle with an integrator, a sub-step count and a
//! display tag. The table is validated once, before any driver runs it.

use crate::integrator::IntegratorKind;
use glam::Vec2;
use std::fmt;
use thiserror::Error;

/// Configuration rejected before the simulation starts
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("slot {slot}: sub-step count must be at least 1")]
    ZeroSubSteps { slot: usize },
    #[error("base frame rate must be finite and positive, got {0}")]
    InvalidFrameRate(f32),
    #[error("slot {slot}: sub-step duration {dt} is not finite and positive")]
    InvalidSubStep { slot: usize, dt: f32 },
    #[error("field mass must be finite, got {0}")]
    InvalidMass(f32),
    #[error("slot table is empty")]
    EmptyTable,
    #[error("initial position {0} is a singularity of the force field")]
    SingularStart(Vec2),
}

/// One configured (integrator, sub-steps, tag) unit
#[derive(Debug, Clone, PartialEq)]
pub struct SlotConfig<T> {
    pub sub_steps: u32,
    pub integrator: IntegratorKind,
    /// Passed through to snapshots untouched
    pub tag: T,
}

impl<T> SlotConfig<T> {
    pub fn new(sub_steps: u32, integrator: IntegratorKind, tag: T) -> Self {
        Self {
            sub_steps,
            integrator,
            tag,
        }
    }
}

/// Fixed-length, validated list of slots
#[derive(Debug, Clone, PartialEq)]
pub struct SlotTable<T> {
    slots: Vec<SlotConfig<T>>,
}

impl<T> SlotTable<T> {
    pub fn new(slots: Vec<SlotConfig<T>>) -> Result<Self, ConfigError> {
        if slots.is_empty() {
            return Err(ConfigError::EmptyTable);
        }
        if let Some(slot) = slots.iter().position(|s| s.sub_steps == 0) {
            return Err(ConfigError::ZeroSubSteps { slot });
        }
        Ok(Self { slots })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SlotConfig<T>> {
        self.slots.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SlotConfig<T>> {
        self.slots.iter()
    }
}

impl<'a, T> IntoIterator for &'a SlotTable<T> {
    type Item = &'a SlotConfig<T>;
    type IntoIter = std::slice::Iter<'a, SlotConfig<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter()
    }
}

/// Timing and initial conditions shared by every slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    /// Outer repetitions per simulated second
    pub base_frame_rate: f32,
    pub initial_position: Vec2,
    pub initial_velocity: Vec2,
}

impl SimulationConfig {
    pub const DEFAULT_FRAME_RATE: f32 = 60.0;

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_frame_rate.is_finite() || self.base_frame_rate <= 0.0 {
            return Err(ConfigError::InvalidFrameRate(self.base_frame_rate));
        }
        Ok(())
    }

    /// Duration of one sub-step for a slot running `sub_steps` per repetition
    pub fn sub_step_dt(&self, sub_steps: u32) -> f32 {
        1.0 / (self.base_frame_rate * sub_steps as f32)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            base_frame_rate: Self::DEFAULT_FRAME_RATE,
            initial_position: Vec2::new(200.0, 0.0),
            initial_velocity: Vec2::new(0.0, 100.0),
        }
    }
}

/// RGBA display tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    // raylib palette
    pub const LIGHTGRAY: Color = Color::rgb(200, 200, 200);
    pub const GRAY: Color = Color::rgb(130, 130, 130);
    pub const DARKGRAY: Color = Color::rgb(80, 80, 80);
    pub const YELLOW: Color = Color::rgb(253, 249, 0);
    pub const GOLD: Color = Color::rgb(255, 203, 0);
    pub const ORANGE: Color = Color::rgb(255, 161, 0);
    pub const PINK: Color = Color::rgb(255, 109, 194);
    pub const RED: Color = Color::rgb(230, 41, 55);
    pub const MAROON: Color = Color::rgb(190, 33, 55);
    pub const GREEN: Color = Color::rgb(0, 228, 48);
    pub const LIME: Color = Color::rgb(0, 158, 47);
    pub const DARKGREEN: Color = Color::rgb(0, 117, 44);
    pub const SKYBLUE: Color = Color::rgb(102, 191, 255);
    pub const BLUE: Color = Color::rgb(0, 121, 241);
    pub const DARKBLUE: Color = Color::rgb(0, 82, 172);
    pub const PURPLE: Color = Color::rgb(200, 122, 255);
    pub const VIOLET: Color = Color::rgb(135, 60, 190);
    pub const DARKPURPLE: Color = Color::rgb(112, 31, 126);
    pub const BEIGE: Color = Color::rgb(211, 176, 131);
    pub const BROWN: Color = Color::rgb(127, 106, 79);
    pub const DARKBROWN: Color = Color::rgb(76, 63, 47);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const MAGENTA: Color = Color::rgb(255, 0, 255);

    const NAMED: [(&'static str, Color); 23] = [
        ("lightgray", Color::LIGHTGRAY),
        ("gray", Color::GRAY),
        ("darkgray", Color::DARKGRAY),
        ("yellow", Color::YELLOW),
        ("gold", Color::GOLD),
        ("orange", Color::ORANGE),
        ("pink", Color::PINK),
        ("red", Color::RED),
        ("maroon", Color::MAROON),
        ("green", Color::GREEN),
        ("lime", Color::LIME),
        ("darkgreen", Color::DARKGREEN),
        ("skyblue", Color::SKYBLUE),
        ("blue", Color::BLUE),
        ("darkblue", Color::DARKBLUE),
        ("purple", Color::PURPLE),
        ("violet", Color::VIOLET),
        ("darkpurple", Color::DARKPURPLE),
        ("beige", Color::BEIGE),
        ("brown", Color::BROWN),
        ("darkbrown", Color::DARKBROWN),
        ("white", Color::WHITE),
        ("magenta", Color::MAGENTA),
    ];

    /// Look up a palette name (case-insensitive)
    pub fn named(name: &str) -> Option<Color> {
        let name = name.to_ascii_lowercase();
        Self::NAMED
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, c)| *c)
    }

    /// Parse `#rrggbb` or `#rrggbbaa`
    pub fn from_hex(text: &str) -> Option<Color> {
        let hex = text.strip_prefix('#')?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Color::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some((name, _)) = Self::NAMED.iter().find(|(_, c)| c == self) {
            return f.write_str(name);
        }
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

/// The reference comparison: Euler at several resolutions against Heun and RK4
pub fn default_table() -> SlotTable<Color> {
    use IntegratorKind::*;

    SlotTable {
        slots: vec![
            SlotConfig::new(100, ExplicitEuler, Color::YELLOW),
            SlotConfig::new(1000, ExplicitEuler, Color::GREEN),
            SlotConfig::new(1, Heun, Color::RED),
            SlotConfig::new(10, Heun, Color::PINK),
            SlotConfig::new(100, Heun, Color::VIOLET),
            SlotConfig::new(1000, ExplicitEuler, Color::BLUE),
            SlotConfig::new(10, Rk4, Color::ORANGE),
            SlotConfig::new(1000, Rk4, Color::YELLOW),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_sub_steps() {
        let slots = vec![
            SlotConfig::new(10, IntegratorKind::Heun, ()),
            SlotConfig::new(0, IntegratorKind::Rk4, ()),
        ];
        assert_eq!(
            SlotTable::new(slots).unwrap_err(),
            ConfigError::ZeroSubSteps { slot: 1 }
        );
    }

    #[test]
    fn rejects_empty_table() {
        let slots: Vec<SlotConfig<()>> = Vec::new();
        assert_eq!(SlotTable::new(slots).unwrap_err(), ConfigError::EmptyTable);
    }

    #[test]
    fn rejects_bad_frame_rates() {
        for rate in [0.0, -60.0, f32::NAN, f32::INFINITY] {
            let config = SimulationConfig {
                base_frame_rate: rate,
                ..SimulationConfig::default()
            };
            assert!(config.validate().is_err(), "rate {} accepted", rate);
        }
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn sub_step_dt_splits_one_frame() {
        let config = SimulationConfig::default();
        assert_eq!(config.sub_step_dt(1), 1.0 / 60.0);
        assert!((config.sub_step_dt(100) * 100.0 - 1.0 / 60.0).abs() < 1e-7);
    }

    #[test]
    fn default_table_is_valid() {
        let table = default_table();
        assert_eq!(table.len(), 8);
        assert!(SlotTable::new(table.iter().cloned().collect()).is_ok());
    }

    #[test]
    fn colors_by_name_and_hex() {
        assert_eq!(Color::named("Violet"), Some(Color::VIOLET));
        assert_eq!(Color::named("chartreuse"), None);
        assert_eq!(Color::from_hex("#ffa100"), Some(Color::ORANGE));
        assert_eq!(
            Color::from_hex("#01020304"),
            Some(Color::rgba(1, 2, 3, 4))
        );
        assert_eq!(Color::from_hex("ffa100"), None);
        assert_eq!(Color::from_hex("#ffa1"), None);
        // from_str_radix alone would take a sign
        assert_eq!(Color::from_hex("#+f+f+f"), None);
        assert_eq!(Color::from_hex("#ffa10g"), None);
        assert_eq!(Color::ORANGE.to_string(), "orange");
        assert_eq!(Color::rgb(1, 2, 3).to_string(), "#010203");
    }
}
