use crate::{Scalar, Vec3};
use serde::{Deserialize, Serialize};

/// Unit mass of an ordinary matter particle.
pub const UNIT_MASS: Scalar = 1.;

/// The two particle populations. They differ only in how their mass is assigned; forces and
/// integration treat every particle the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Population {
    Matter,
    DarkMatter,
}

impl Population {
    /// Mass assigned to every particle of this population.
    pub fn particle_mass(self, dark_matter_factor: Scalar) -> Scalar {
        match self {
            Population::Matter => UNIT_MASS,
            Population::DarkMatter => dark_matter_factor * UNIT_MASS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Population::Matter => "matter",
            Population::DarkMatter => "dark_matter",
        }
    }
}

/// Contains all of the particle data for one population, stored as parallel arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleSet {
    pub(crate) mass: Vec<Scalar>,
    pub(crate) position: Vec<Vec3>,
    pub(crate) velocity: Vec<Vec3>,
}

impl ParticleSet {
    /// Creates a set with every particle at rest and carrying the same `mass`. Panics if `mass`
    /// isn't positive.
    pub fn from_positions(positions: Vec<Vec3>, mass: Scalar) -> Self {
        assert!(mass > 0., "Particle mass must be positive, got {:?}", mass);
        Self {
            mass: vec![mass; positions.len()],
            velocity: vec![Vec3::zeros(); positions.len()],
            position: positions,
        }
    }

    /// Adds a new particle. Panics if `mass` isn't positive.
    pub fn add_particle(&mut self, mass: Scalar, position: Vec3, velocity: Vec3) {
        assert!(mass > 0., "Particle mass must be positive, got {:?}", mass);
        self.mass.push(mass);
        self.position.push(position);
        self.velocity.push(velocity);
    }

    /// Appends every particle of `other` after the particles already in `self`.
    pub(crate) fn extend(&mut self, other: ParticleSet) {
        self.mass.extend(other.mass);
        self.position.extend(other.position);
        self.velocity.extend(other.velocity);
    }

    pub fn len(&self) -> usize {
        self.mass.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mass.is_empty()
    }

    pub fn masses(&self) -> &[Scalar] {
        &self.mass
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.position
    }

    pub fn velocities(&self) -> &[Vec3] {
        &self.velocity
    }

    pub fn total_mass(&self) -> Scalar {
        self.mass.iter().sum()
    }
}
