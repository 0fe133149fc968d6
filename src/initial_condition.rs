//! Seeded particle distributions, for producing input tables to run the simulation on.

use crate::{Scalar, Vec3};
use rand::{rngs::StdRng, Rng, SeedableRng};

pub trait InitialCondition {
    fn positions(&self) -> Vec<Vec3>;
}

/// Particles dropped at random integer lattice points inside the cube `[0, size)^3`. Several
/// particles may land on the same point.
pub struct UniformLattice {
    pub num_particles: usize,
    pub size: usize,
    pub seed: u64,
}

impl Default for UniformLattice {
    fn default() -> Self {
        UniformLattice {
            num_particles: 1000,
            size: 100,
            seed: 0,
        }
    }
}

impl InitialCondition for UniformLattice {
    fn positions(&self) -> Vec<Vec3> {
        assert!(self.size > 0, "UniformLattice needs a nonzero size");
        let mut rng = StdRng::seed_from_u64(self.seed);

        (0..self.num_particles)
            .map(|_| {
                Vec3::new(
                    rng.gen_range(0..self.size) as Scalar,
                    rng.gen_range(0..self.size) as Scalar,
                    rng.gen_range(0..self.size) as Scalar,
                )
            })
            .collect()
    }
}

/// Particles distributed uniformly inside a ball.
pub struct Sphere {
    pub num_particles: usize,
    pub center: Vec3,
    pub radius: Scalar,
    pub seed: u64,
}

impl Default for Sphere {
    fn default() -> Self {
        Sphere {
            num_particles: 1000,
            center: Vec3::from_element(50.),
            radius: 25.,
            seed: 0,
        }
    }
}

impl InitialCondition for Sphere {
    fn positions(&self) -> Vec<Vec3> {
        let mut rng = StdRng::seed_from_u64(self.seed);

        (0..self.num_particles)
            .map(|_| loop {
                let rand: Vec3 = rng.gen::<[Scalar; 3]>().into();
                let pos = rand * 2. - Vec3::from_element(1.);

                // rejection sample the unit ball
                if pos.magnitude_squared() < 1. {
                    break pos * self.radius + self.center;
                }
            })
            .collect()
    }
}
