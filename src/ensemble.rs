use crate::error::{Result, SimulationError};
use crate::io::TableSource;
use crate::particles::{ParticleSet, Population};
use crate::Scalar;
use std::io::Read;
use std::ops::Range;

/// Every simulated particle in one index space: the matter population first, followed by the
/// dark matter population. Masses and populations are fixed once the ensemble is built; only
/// positions and velocities change during a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Ensemble {
    particles: ParticleSet,
    /// Number of matter particles. Indices `0..num_matter` are matter, the rest dark matter.
    num_matter: usize,
}

impl Ensemble {
    /// Reads both populations and merges them. Matter particles get unit mass, dark matter
    /// particles `dark_matter_factor` times that, and everything starts at rest. If either source
    /// fails to load, no ensemble is produced.
    pub fn build<M: Read, D: Read>(
        matter: TableSource<M>,
        dark_matter: TableSource<D>,
        dark_matter_factor: Scalar,
    ) -> Result<Self> {
        check_factor(dark_matter_factor)?;

        let matter = load(matter, Population::Matter, dark_matter_factor)?;
        let dark_matter = load(dark_matter, Population::DarkMatter, dark_matter_factor)?;

        Ok(Self::from_sets(matter, dark_matter))
    }

    /// Builds an ensemble with no dark matter at all.
    pub fn build_matter_only<M: Read>(matter: TableSource<M>) -> Result<Self> {
        let matter = load(matter, Population::Matter, 1.)?;
        Ok(Self::from_sets(matter, ParticleSet::default()))
    }

    /// Concatenates two already populated sets, keeping the order of each.
    pub fn from_sets(matter: ParticleSet, dark_matter: ParticleSet) -> Self {
        let num_matter = matter.len();
        let mut particles = matter;
        particles.extend(dark_matter);

        tracing::info!(
            "Combined {} matter and {} dark matter particles",
            num_matter,
            particles.len() - num_matter
        );

        Self {
            particles,
            num_matter,
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn num_matter(&self) -> usize {
        self.num_matter
    }

    pub fn num_dark_matter(&self) -> usize {
        self.len() - self.num_matter
    }

    /// Index range occupied by `population`.
    pub fn range(&self, population: Population) -> Range<usize> {
        match population {
            Population::Matter => 0..self.num_matter,
            Population::DarkMatter => self.num_matter..self.len(),
        }
    }

    pub fn population(&self, index: usize) -> Population {
        if index < self.num_matter {
            Population::Matter
        } else {
            Population::DarkMatter
        }
    }

    pub fn populations(&self) -> impl Iterator<Item = Population> + '_ {
        (0..self.len()).map(move |i| self.population(i))
    }

    pub fn particles(&self) -> &ParticleSet {
        &self.particles
    }

    pub(crate) fn particles_mut(&mut self) -> &mut ParticleSet {
        &mut self.particles
    }
}

fn check_factor(dark_matter_factor: Scalar) -> Result<()> {
    if dark_matter_factor.is_finite() && dark_matter_factor > 0. {
        Ok(())
    } else {
        Err(SimulationError::InvalidParameter {
            name: "dark_matter_factor",
            value: dark_matter_factor,
        })
    }
}

fn load<R: Read>(
    source: TableSource<R>,
    population: Population,
    dark_matter_factor: Scalar,
) -> Result<ParticleSet> {
    let positions = source.read_positions()?;
    Ok(ParticleSet::from_positions(
        positions,
        population.particle_mass(dark_matter_factor),
    ))
}
