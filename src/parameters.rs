use crate::error::{Result, SimulationError};
use crate::Scalar;
use serde::{Deserialize, Serialize};

/// Newton's gravitational constant, in m^3 kg^-1 s^-2.
pub const GRAVITATIONAL_CONSTANT: Scalar = 6.67430e-11;

/// A struct containing all of the high-level parameters for a gravity simulation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    /// The gravitational constant `G`.
    pub gravitational_constant: Scalar,
    /// Mass of each dark matter particle, as a multiple of the unit mass of ordinary matter.
    pub dark_matter_factor: Scalar,
    /// Whether the dark matter source is loaded at all. When this is false, the ensemble is
    /// built from ordinary matter alone.
    pub include_dark_matter: bool,
    /// Number of particles in each block of the force computation. Only affects the working set,
    /// not the result.
    pub block_size: usize,
    /// The time step
    pub delta_time: Scalar,
    pub num_steps: usize,
    /// Record the ensemble every `snapshot_interval` steps. `None` records nothing but the final
    /// state.
    pub snapshot_interval: Option<usize>,
    /// Size of a dedicated thread pool for the force computation. `None` uses the global pool.
    pub num_threads: Option<usize>,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            gravitational_constant: GRAVITATIONAL_CONSTANT,
            dark_matter_factor: 10.,
            include_dark_matter: true,
            block_size: 500,
            delta_time: 1e-3,
            num_steps: 10,
            snapshot_interval: None,
            num_threads: None,
        }
    }
}

impl SimulationParameters {
    pub fn validate(&self) -> Result<()> {
        positive("gravitational_constant", self.gravitational_constant)?;
        positive("dark_matter_factor", self.dark_matter_factor)?;
        positive("delta_time", self.delta_time)?;
        nonzero("block_size", Some(self.block_size))?;
        nonzero("snapshot_interval", self.snapshot_interval)?;
        nonzero("num_threads", self.num_threads)?;
        Ok(())
    }

    /// The smallest snapshot interval that records at most `max_frames` frames after the initial
    /// one (the final step is always recorded too).
    pub fn interval_for_frames(&self, max_frames: usize) -> usize {
        let max_frames = max_frames.max(1);
        ((self.num_steps + max_frames - 1) / max_frames).max(1)
    }
}

fn positive(name: &'static str, value: Scalar) -> Result<()> {
    if value.is_finite() && value > 0. {
        Ok(())
    } else {
        Err(SimulationError::InvalidParameter { name, value })
    }
}

fn nonzero(name: &'static str, value: Option<usize>) -> Result<()> {
    match value {
        Some(0) => Err(SimulationError::InvalidParameter { name, value: 0. }),
        _ => Ok(()),
    }
}
