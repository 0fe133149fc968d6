//! Newtonian gravity between every pair of particles.
//!
//! The force on particle `i` is the sum over all `j != i` of
//!
//! ```text
//! F_ij = G m_i m_j / |r|^2 * r / |r|,    r = x_j - x_i
//! ```
//!
//! which is O(n^2) no matter how it is evaluated. [`compute_forces`] splits the index range into
//! contiguous blocks and evaluates one block of targets against one block of sources at a time,
//! so only two blocks of positions are hot at once. Each target block owns its slice of the
//! output, so blocks are accumulated in parallel without sharing any accumulator.

use crate::ensemble::Ensemble;
use crate::{Scalar, Vec3};
use rayon::prelude::*;
use std::ops::Range;

/// Force exerted on a particle of mass `m_i` at `x_i` by one of mass `m_j` at `x_j`. Coincident
/// particles exert no force on each other.
#[inline]
pub fn pair_force(g: Scalar, m_i: Scalar, x_i: Vec3, m_j: Scalar, x_j: Vec3) -> Vec3 {
    let r = x_j - x_i;
    if r == Vec3::zeros() {
        return Vec3::zeros();
    }

    // may underflow to zero for distinct particles, which overflows the force below
    let dist_squared = r.magnitude_squared();
    let dist = dist_squared.sqrt();
    (g * m_i * m_j / dist_squared / dist) * r
}

/// Net gravitational force on every particle in the ensemble, evaluated block by block.
///
/// Every particle's sum visits its sources in index order, so the result matches
/// [`compute_forces_direct`] up to the rounding of the pairwise terms themselves.
pub fn compute_forces(ensemble: &Ensemble, block_size: usize, g: Scalar) -> Vec<Vec3> {
    assert!(block_size > 0, "block_size must be at least 1");

    let particles = ensemble.particles();
    let n = particles.len();
    let num_blocks = (n + block_size - 1) / block_size;
    let mut forces = vec![Vec3::zeros(); n];

    tracing::trace!(
        "Computing forces on {} particles in {} blocks of {}",
        n,
        num_blocks,
        block_size
    );

    forces
        .par_chunks_mut(block_size)
        .enumerate()
        .for_each(|(block, accumulator)| {
            let targets = block_range(block, block_size, n);

            for source_block in 0..num_blocks {
                let sources = block_range(source_block, block_size, n);
                accumulate_block(
                    accumulator,
                    targets.clone(),
                    sources,
                    particles.masses(),
                    particles.positions(),
                    g,
                );
            }

            tracing::trace!("Finished block {}/{}", block + 1, num_blocks);
        });

    forces
}

/// The same sum as [`compute_forces`], as one plain double loop.
pub fn compute_forces_direct(ensemble: &Ensemble, g: Scalar) -> Vec<Vec3> {
    let particles = ensemble.particles();
    let mass = particles.masses();
    let position = particles.positions();

    (0..particles.len())
        .map(|i| {
            (0..particles.len())
                .filter(|&j| j != i)
                .map(|j| pair_force(g, mass[i], position[i], mass[j], position[j]))
                .sum::<Vec3>()
        })
        .collect()
}

fn block_range(block: usize, block_size: usize, n: usize) -> Range<usize> {
    let start = block * block_size;
    start..usize::min(start + block_size, n)
}

/// Adds the force from every particle in `sources` onto every particle in `targets`.
/// `accumulator[0]` holds the force on particle `targets.start`.
fn accumulate_block(
    accumulator: &mut [Vec3],
    targets: Range<usize>,
    sources: Range<usize>,
    mass: &[Scalar],
    position: &[Vec3],
    g: Scalar,
) {
    debug_assert_eq!(accumulator.len(), targets.len());

    for (force, i) in accumulator.iter_mut().zip(targets) {
        let (m_i, x_i) = (mass[i], position[i]);
        for j in sources.clone() {
            if i == j {
                continue;
            }
            *force += pair_force(g, m_i, x_i, mass[j], position[j]);
        }
    }
}
