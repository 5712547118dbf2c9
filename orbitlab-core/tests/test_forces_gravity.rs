//! Unit tests for the gravity force field

use glam::Vec2;
use orbitlab_core::engine::{ForceField, GravityField, Particle};
use orbitlab_core::integrator::IntegratorKind;
use orbitlab_core::tests::test_helpers::{approx_eq_f32, vec_approx_eq};

#[test]
fn test_gravity_force_magnitude() {
    let field = GravityField::new(50.0);

    // r = 5, |a| = M / r² = 2
    let accel = field.evaluate(Vec2::new(3.0, 4.0));
    assert!(approx_eq_f32(accel.length(), 2.0, 1e-5));
}

#[test]
fn test_gravity_force_direction() {
    let field = GravityField::new(1.0);
    let pos = Vec2::new(-7.0, 2.0);
    let accel = field.evaluate(pos);

    // Acceleration points from the particle back to the origin
    assert!(vec_approx_eq(accel.normalize(), -pos.normalize(), 1e-6));
}

#[test]
fn test_gravity_inverse_square() {
    let field = GravityField::default();
    let near = field.evaluate(Vec2::new(100.0, 0.0)).length();
    let far = field.evaluate(Vec2::new(200.0, 0.0)).length();

    assert!(approx_eq_f32(near / far, 4.0, 1e-4));
    assert!(approx_eq_f32(near, 1000.0, 1e-2));
}

#[test]
fn test_gravity_potential_matches_energy() {
    let field = GravityField::new(4.0);
    let particle = Particle::new(Vec2::new(0.0, 2.0), Vec2::new(3.0, 0.0));

    assert!(approx_eq_f32(field.potential(particle.pos), -2.0, 1e-6));
    assert!(approx_eq_f32(field.specific_energy(&particle), 2.5, 1e-6));
}

#[test]
fn test_fields_swap_without_touching_integrators() {
    // A harmonic well plugged in where gravity usually goes
    let spring = |p: Vec2| p * -4.0;
    let mut a = Particle::new(Vec2::new(1.0, 0.0), Vec2::ZERO);
    let mut b = a;

    IntegratorKind::Rk4.step(&mut a, 0.01, &spring);
    IntegratorKind::Rk4.step(&mut b, 0.01, &GravityField::new(1.0));

    assert!(a.pos.x < 1.0);
    assert!(b.pos.x < 1.0);
    assert_ne!(a.pos, b.pos);
}
