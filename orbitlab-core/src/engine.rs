use glam::Vec2;

/// A point mass advanced by the integrators (unit mass)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Acceleration from the most recent force evaluation
    pub acc: Vec2,
}

impl Particle {
    pub fn new(pos: Vec2, vel: Vec2) -> Self {
        Self {
            pos,
            vel,
            acc: Vec2::ZERO,
        }
    }
}

/// Maps a position to the acceleration felt there
///
/// Implementations capture their parameters by value, so every
/// integrator can be handed any field without knowing what it models.
pub trait ForceField {
    fn evaluate(&self, position: Vec2) -> Vec2;

    /// Whether `position` is a point the field cannot be evaluated at
    fn is_singular_at(&self, _position: Vec2) -> bool {
        false
    }
}

impl<F> ForceField for F
where
    F: Fn(Vec2) -> Vec2,
{
    fn evaluate(&self, position: Vec2) -> Vec2 {
        self(position)
    }
}

/// Central inverse-square attraction toward the origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityField {
    /// Mass-like constant (G·M folded into one number)
    pub mass: f32,
}

impl GravityField {
    pub const DEFAULT_MASS: f32 = 1.0e7;

    pub fn new(mass: f32) -> Self {
        Self { mass }
    }

    /// Potential energy per unit mass at `position`
    pub fn potential(&self, position: Vec2) -> f32 {
        -self.mass / position.length()
    }

    /// Kinetic plus potential energy per unit mass
    pub fn specific_energy(&self, particle: &Particle) -> f32 {
        0.5 * particle.vel.length_squared() + self.potential(particle.pos)
    }
}

impl Default for GravityField {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MASS)
    }
}

impl ForceField for GravityField {
    fn evaluate(&self, position: Vec2) -> Vec2 {
        // Division by zero at the origin is left to IEEE semantics
        let r = position.length();
        let direction = position / r;
        direction * (-self.mass / (r * r))
    }

    fn is_singular_at(&self, position: Vec2) -> bool {
        position == Vec2::ZERO
    }
}

/// A field with no force anywhere
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ZeroField;

impl ForceField for ZeroField {
    fn evaluate(&self, _position: Vec2) -> Vec2 {
        Vec2::ZERO
    }
}
