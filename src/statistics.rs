use crate::ensemble::Ensemble;
use crate::{Scalar, Vec3};
use itertools::izip;
use rayon::prelude::*;

/// Conserved (or nearly conserved) quantities of a gravitating system, used to see how much a
/// run has drifted.
pub trait SimulationStatistics {
    fn total_mass(&self) -> Scalar;
    fn total_linear_momentum(&self) -> Vec3;
    fn total_angular_momentum(&self) -> Vec3;
    fn kinetic_energy(&self) -> Scalar;
    fn potential_energy(&self, g: Scalar) -> Scalar;

    fn total_energy(&self, g: Scalar) -> Scalar {
        self.kinetic_energy() + self.potential_energy(g)
    }
}

impl SimulationStatistics for Ensemble {
    fn total_mass(&self) -> Scalar {
        self.particles().total_mass()
    }

    fn total_linear_momentum(&self) -> Vec3 {
        let p = self.particles();
        p.masses()
            .iter()
            .zip(p.velocities())
            .map(|(&m, v)| m * v)
            .sum()
    }

    fn total_angular_momentum(&self) -> Vec3 {
        let p = self.particles();
        izip!(p.masses(), p.velocities(), p.positions())
            .map(|(&m, v, x)| m * x.cross(v))
            .sum()
    }

    fn kinetic_energy(&self) -> Scalar {
        let p = self.particles();
        p.masses()
            .iter()
            .zip(p.velocities())
            .map(|(&m, v)| 0.5 * m * v.magnitude_squared())
            .sum()
    }

    /// Sum of `-G m_i m_j / r` over every unordered pair. Coincident pairs contribute nothing,
    /// matching the force law.
    fn potential_energy(&self, g: Scalar) -> Scalar {
        let p = self.particles();
        let (mass, position) = (p.masses(), p.positions());

        (0..p.len())
            .into_par_iter()
            .map(|i| {
                (i + 1..p.len())
                    .map(|j| {
                        let dist = (position[j] - position[i]).magnitude();
                        if dist == 0. {
                            0.
                        } else {
                            -g * mass[i] * mass[j] / dist
                        }
                    })
                    .sum::<Scalar>()
            })
            .sum()
    }
}
