//! A small gravitational N-body simulator. Two particle populations (ordinary matter and a
//! heavier dark-matter component) are read from CSV tables, merged into one ensemble, advanced
//! with a blocked all-pairs force computation and semi-implicit Euler, and written back out as a
//! CSV table for an external visualizer.

pub mod ensemble;
pub mod error;
pub mod forces;
pub mod initial_condition;
pub mod integrator;
pub mod io;
pub mod parameters;
pub mod particles;
pub mod simulation;
pub mod statistics;
pub mod util;

extern crate nalgebra as na;

pub type Scalar = f64;
pub type Vec3 = na::Vector3<Scalar>;

pub use ensemble::Ensemble;
pub use error::{Result, SimulationError};
pub use parameters::SimulationParameters;
pub use particles::{ParticleSet, Population};
pub use simulation::{NBodySimulation, RunOutcome, SimulationState, Snapshot};
