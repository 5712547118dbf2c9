//! Fixed-step integrators for a single particle
//!
//! Every stepper advances one [`Particle`] by `dt` in place, querying the
//! force field 1, 2 or 4 times. None of them estimate error or adapt the
//! step; their stability limits are what the comparison is meant to show.

use crate::engine::{ForceField, Particle};
use glam::Vec2;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The stepping algorithms a slot can be configured with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegratorKind {
    ExplicitEuler,
    SemiImplicitEuler,
    VelocityVerlet,
    Heun,
    Rk4,
}

impl IntegratorKind {
    pub const ALL: [IntegratorKind; 5] = [
        IntegratorKind::ExplicitEuler,
        IntegratorKind::SemiImplicitEuler,
        IntegratorKind::VelocityVerlet,
        IntegratorKind::Heun,
        IntegratorKind::Rk4,
    ];

    /// Advance `particle` by one sub-step of length `dt`
    pub fn step<F: ForceField + ?Sized>(self, particle: &mut Particle, dt: f32, field: &F) {
        match self {
            IntegratorKind::ExplicitEuler => explicit_euler(particle, dt, field),
            IntegratorKind::SemiImplicitEuler => semi_implicit_euler(particle, dt, field),
            IntegratorKind::VelocityVerlet => velocity_verlet(particle, dt, field),
            IntegratorKind::Heun => heun(particle, dt, field),
            IntegratorKind::Rk4 => rk4(particle, dt, field),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IntegratorKind::ExplicitEuler => "explicit_euler",
            IntegratorKind::SemiImplicitEuler => "semi_implicit_euler",
            IntegratorKind::VelocityVerlet => "velocity_verlet",
            IntegratorKind::Heun => "heun",
            IntegratorKind::Rk4 => "rk4",
        }
    }

    /// Force evaluations consumed per sub-step
    pub fn evaluations(self) -> usize {
        match self {
            IntegratorKind::ExplicitEuler
            | IntegratorKind::SemiImplicitEuler
            | IntegratorKind::VelocityVerlet => 1,
            IntegratorKind::Heun => 2,
            IntegratorKind::Rk4 => 4,
        }
    }
}

impl fmt::Display for IntegratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown integrator '{0}'")]
pub struct UnknownIntegrator(pub String);

impl FromStr for IntegratorKind {
    type Err = UnknownIntegrator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "euler" | "explicit_euler" => Ok(IntegratorKind::ExplicitEuler),
            "euler2" | "semi_implicit_euler" | "symplectic_euler" => {
                Ok(IntegratorKind::SemiImplicitEuler)
            }
            "verlet" | "velocity_verlet" => Ok(IntegratorKind::VelocityVerlet),
            "heun" => Ok(IntegratorKind::Heun),
            "rk4" | "runge_kutta" => Ok(IntegratorKind::Rk4),
            _ => Err(UnknownIntegrator(s.to_string())),
        }
    }
}

/// Forward Euler: position advances with the velocity from before the kick
pub fn explicit_euler<F: ForceField + ?Sized>(p: &mut Particle, dt: f32, field: &F) {
    p.acc = field.evaluate(p.pos);

    let vel = p.vel;
    p.vel += p.acc * dt;
    p.pos += vel * dt;
}

/// Symplectic Euler: kick first, then drift with the new velocity
pub fn semi_implicit_euler<F: ForceField + ?Sized>(p: &mut Particle, dt: f32, field: &F) {
    p.acc = field.evaluate(p.pos);

    p.vel += p.acc * dt;
    p.pos += p.vel * dt;
}

/// Velocity Verlet reusing the acceleration stored by the previous step
///
/// Right after a reset the stored acceleration is zero, so the first
/// position update is a plain drift.
pub fn velocity_verlet<F: ForceField + ?Sized>(p: &mut Particle, dt: f32, field: &F) {
    let new_pos = p.pos + p.vel * dt + p.acc * (dt * dt * 0.5);
    let new_acc = field.evaluate(new_pos);
    let new_vel = p.vel + (p.acc + new_acc) * (dt * 0.5);

    p.pos = new_pos;
    p.vel = new_vel;
    p.acc = new_acc;
}

/// Heun's predictor-corrector on the second-order system
///
/// Keeps the predictor's acceleration, not the corrector's.
pub fn heun<F: ForceField + ?Sized>(p: &mut Particle, dt: f32, field: &F) {
    let a0 = field.evaluate(p.pos);
    // The predicted velocity v + a0·dt never enters the corrector
    let pos_bar = p.pos + p.vel * dt;

    let a1 = field.evaluate(pos_bar);
    let new_vel = p.vel + (a0 + a1) * (dt * 0.5);
    let new_pos = p.pos + (p.vel + new_vel) * (dt * 0.5);

    p.pos = new_pos;
    p.vel = new_vel;
    p.acc = a0;
}

/// Phase-space state `[x, v]` used by the Runge-Kutta stages
#[derive(Debug, Clone, Copy)]
struct State {
    pos: Vec2,
    vel: Vec2,
}

impl State {
    fn offset(self, k: State, scale: f32) -> State {
        State {
            pos: self.pos + k.pos * scale,
            vel: self.vel + k.vel * scale,
        }
    }

    /// `dt · [v, F(x)]`
    fn derivative<F: ForceField + ?Sized>(self, dt: f32, field: &F) -> State {
        State {
            pos: self.vel * dt,
            vel: field.evaluate(self.pos) * dt,
        }
    }
}

/// Classical fourth-order Runge-Kutta
///
/// The first stage's force is kept as the particle's acceleration.
pub fn rk4<F: ForceField + ?Sized>(p: &mut Particle, dt: f32, field: &F) {
    let x = State {
        pos: p.pos,
        vel: p.vel,
    };

    let a0 = field.evaluate(p.pos);
    let k1 = State {
        pos: x.vel * dt,
        vel: a0 * dt,
    };
    let k2 = x.offset(k1, 0.5).derivative(dt, field);
    let k3 = x.offset(k2, 0.5).derivative(dt, field);
    let k4 = x.offset(k3, 1.0).derivative(dt, field);

    p.pos += (k1.pos + k2.pos * 2.0 + k3.pos * 2.0 + k4.pos) * (1.0 / 6.0);
    p.vel += (k1.vel + k2.vel * 2.0 + k3.vel * 2.0 + k4.vel) * (1.0 / 6.0);
    p.acc = a0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Constant field that counts how often it is queried
    struct Counting {
        accel: Vec2,
        calls: Cell<usize>,
    }

    impl ForceField for Counting {
        fn evaluate(&self, _position: Vec2) -> Vec2 {
            self.calls.set(self.calls.get() + 1);
            self.accel
        }
    }

    #[test]
    fn evaluation_counts_match_metadata() {
        for kind in IntegratorKind::ALL {
            let field = Counting {
                accel: Vec2::new(0.0, -1.0),
                calls: Cell::new(0),
            };
            let mut p = Particle::new(Vec2::new(1.0, 0.0), Vec2::ZERO);
            kind.step(&mut p, 0.1, &field);
            assert_eq!(field.calls.get(), kind.evaluations(), "{}", kind);
        }
    }

    #[test]
    fn explicit_euler_drifts_with_old_velocity() {
        let spring = |p: Vec2| -p;
        let mut p = Particle::new(Vec2::new(1.0, 0.0), Vec2::ZERO);
        explicit_euler(&mut p, 0.1, &spring);

        // Velocity was zero before the kick, so the position stays put
        assert_eq!(p.pos, Vec2::new(1.0, 0.0));
        assert_eq!(p.vel, Vec2::new(-0.1, 0.0));
        assert_eq!(p.acc, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn semi_implicit_euler_drifts_with_new_velocity() {
        let spring = |p: Vec2| -p;
        let mut p = Particle::new(Vec2::new(1.0, 0.0), Vec2::ZERO);
        semi_implicit_euler(&mut p, 0.1, &spring);

        assert!((p.vel - Vec2::new(-0.1, 0.0)).length() < 1e-7);
        assert!((p.pos - Vec2::new(0.99, 0.0)).length() < 1e-6);
    }

    #[test]
    fn verlet_first_step_uses_stored_acceleration() {
        let field = |_: Vec2| Vec2::new(0.0, -2.0);
        let mut p = Particle::new(Vec2::ZERO, Vec2::new(1.0, 0.0));
        velocity_verlet(&mut p, 0.5, &field);

        // acc was zero: plain drift, then half of the new force in the kick
        assert_eq!(p.pos, Vec2::new(0.5, 0.0));
        assert_eq!(p.vel, Vec2::new(1.0, -0.5));
        assert_eq!(p.acc, Vec2::new(0.0, -2.0));

        velocity_verlet(&mut p, 0.5, &field);
        assert_eq!(p.pos, Vec2::new(1.0, -0.5));
        assert_eq!(p.vel, Vec2::new(1.0, -1.5));
    }

    #[test]
    fn heun_stores_predictor_acceleration() {
        let spring = |p: Vec2| -p;
        let mut p = Particle::new(Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0));
        heun(&mut p, 0.1, &spring);

        // a0 = F(1, 0); a1 = F(1, 0.1)
        assert_eq!(p.acc, Vec2::new(-1.0, 0.0));
        assert!((p.vel - Vec2::new(-0.1, 0.995)).length() < 1e-6);
        assert!((p.pos - Vec2::new(0.995, 0.09975)).length() < 1e-6);
    }

    #[test]
    fn rk4_stores_acceleration_at_step_start() {
        let field = crate::engine::GravityField::default();
        let start = Vec2::new(200.0, 0.0);
        let mut p = Particle::new(start, Vec2::new(0.0, 100.0));
        rk4(&mut p, 1.0 / 60.0, &field);

        assert_eq!(p.acc, field.evaluate(start));
        assert!((p.acc - Vec2::new(-250.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn rk4_is_exact_for_constant_acceleration() {
        let field = |_: Vec2| Vec2::new(0.0, -10.0);
        let mut p = Particle::new(Vec2::ZERO, Vec2::new(2.0, 5.0));
        rk4(&mut p, 0.5, &field);

        // x = v t + a t² / 2
        assert!((p.pos - Vec2::new(1.0, 1.25)).length() < 1e-5);
        assert!((p.vel - Vec2::new(2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn parses_names_and_aliases() {
        assert_eq!("euler".parse::<IntegratorKind>(), Ok(IntegratorKind::ExplicitEuler));
        assert_eq!("euler2".parse::<IntegratorKind>(), Ok(IntegratorKind::SemiImplicitEuler));
        assert_eq!("Verlet".parse::<IntegratorKind>(), Ok(IntegratorKind::VelocityVerlet));
        assert_eq!("runge_kutta".parse::<IntegratorKind>(), Ok(IntegratorKind::Rk4));
        for kind in IntegratorKind::ALL {
            assert_eq!(kind.name().parse::<IntegratorKind>(), Ok(kind));
        }
        assert_eq!(
            "leapfrog".parse::<IntegratorKind>(),
            Err(UnknownIntegrator("leapfrog".to_string()))
        );
    }
}
