use crate::ensemble::Ensemble;
use crate::{Scalar, Vec3};
use itertools::izip;

/// Advances one particle by one semi-implicit (symplectic) Euler step.
#[inline]
pub fn integrate_single(
    position: &mut Vec3,
    velocity: &mut Vec3,
    force: Vec3,
    mass: Scalar,
    delta_time: Scalar,
) {
    // v(t + dt) = v(t) + F(t) / m * dt
    *velocity += force / mass * delta_time;
    // x(t + dt) = x(t) + v(t + dt) * dt, using the velocity we just updated
    *position += *velocity * delta_time;
}

/// Applies `forces` to every particle of the ensemble for one step of length `delta_time`.
/// `forces[i]` must be the force on particle `i`.
pub fn step(ensemble: &mut Ensemble, forces: &[Vec3], delta_time: Scalar) {
    let particles = ensemble.particles_mut();
    assert_eq!(
        forces.len(),
        particles.len(),
        "Expected one force per particle"
    );

    for (x, v, &m, &f) in izip!(
        &mut particles.position,
        &mut particles.velocity,
        &particles.mass,
        forces
    ) {
        integrate_single(x, v, f, m, delta_time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::assert_vec_close;
    use crate::ParticleSet;

    #[test]
    fn test_velocity_is_updated_before_position() {
        let mut x = Vec3::new(1., 0., 0.);
        let mut v = Vec3::new(0., 1., 0.);
        let f = Vec3::new(0., 0., -19.62);

        integrate_single(&mut x, &mut v, f, 2., 0.01);

        assert_vec_close(v, Vec3::new(0., 1., -0.0981), 1., 1e-12);
        // explicit Euler would leave z at 0
        assert_vec_close(x, Vec3::new(1., 0.01, -0.000981), 1., 1e-12);
    }

    #[test]
    fn test_step_from_rest_moves_particles() {
        let mut ensemble = Ensemble::from_sets(
            ParticleSet::from_positions(vec![Vec3::zeros()], 1.),
            ParticleSet::from_positions(vec![Vec3::new(5., 0., 0.)], 10.),
        );
        let forces = [Vec3::new(2., 0., 0.), Vec3::new(-2., 0., 0.)];

        step(&mut ensemble, &forces, 0.5);

        let p = ensemble.particles();
        assert_vec_close(p.velocities()[0], Vec3::new(1., 0., 0.), 1., 1e-15);
        assert_vec_close(p.velocities()[1], Vec3::new(-0.1, 0., 0.), 1., 1e-15);
        assert_vec_close(p.positions()[0], Vec3::new(0.5, 0., 0.), 1., 1e-15);
        assert_vec_close(p.positions()[1], Vec3::new(4.95, 0., 0.), 5., 1e-15);
        // masses never change
        assert_eq!(p.masses(), &[1., 10.]);
    }

    #[test]
    fn test_zero_force_drifts() {
        let mut ensemble = Ensemble::from_sets(
            ParticleSet::from_positions(vec![Vec3::zeros()], 1.),
            ParticleSet::default(),
        );
        ensemble.particles_mut().velocity[0] = Vec3::new(1., 2., 3.);

        step(&mut ensemble, &[Vec3::zeros()], 0.1);

        let p = ensemble.particles();
        assert_eq!(p.velocities()[0], Vec3::new(1., 2., 3.));
        assert_vec_close(p.positions()[0], Vec3::new(0.1, 0.2, 0.3), 1., 1e-15);
    }

    #[test]
    #[should_panic]
    fn test_mismatched_forces() {
        let mut ensemble = Ensemble::from_sets(
            ParticleSet::from_positions(vec![Vec3::zeros(); 2], 1.),
            ParticleSet::default(),
        );
        step(&mut ensemble, &[Vec3::zeros()], 0.1);
    }
}
