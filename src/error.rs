use crate::Scalar;
use std::fmt;

pub type Result<T> = std::result::Result<T, SimulationError>;

/// Which per-particle quantity became non-finite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Force,
    Velocity,
    Position,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Quantity::Force => "force",
            Quantity::Velocity => "velocity",
            Quantity::Position => "position",
        };
        f.write_str(name)
    }
}

/// Every error here is fatal to the run that produced it. Nothing is retried, and no partial
/// ensemble or output survives a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// A particle table could not be opened, was missing one of the `x, y, z` columns, or held a
    /// value that isn't a number.
    SourceRead { source_name: String, reason: String },
    /// A force, velocity or position stopped being finite. `step` is zero-based.
    NumericOverflow {
        step: usize,
        particle: usize,
        quantity: Quantity,
    },
    InvalidParameter { name: &'static str, value: Scalar },
    SinkWrite { reason: String },
    /// The caller asked the run to stop. Only ever observed between steps.
    Cancelled { step: usize },
}

impl SimulationError {
    pub(crate) fn source_read(source_name: &str, reason: impl fmt::Display) -> Self {
        SimulationError::SourceRead {
            source_name: source_name.to_owned(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn sink_write(reason: impl fmt::Display) -> Self {
        SimulationError::SinkWrite {
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::SourceRead {
                source_name,
                reason,
            } => write!(f, "failed to read particle source {}: {}", source_name, reason),
            SimulationError::NumericOverflow {
                step,
                particle,
                quantity,
            } => write!(
                f,
                "{} of particle {} became non-finite at step {}",
                quantity, particle, step
            ),
            SimulationError::InvalidParameter { name, value } => {
                write!(f, "invalid value for parameter `{}`: {}", name, value)
            }
            SimulationError::SinkWrite { reason } => {
                write!(f, "failed to write simulation results: {}", reason)
            }
            SimulationError::Cancelled { step } => write!(f, "run cancelled before step {}", step),
        }
    }
}

impl std::error::Error for SimulationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = SimulationError::NumericOverflow {
            step: 3,
            particle: 7,
            quantity: Quantity::Velocity,
        };
        assert_eq!(
            err.to_string(),
            "velocity of particle 7 became non-finite at step 3"
        );

        let err = SimulationError::source_read("matter.csv", "missing column `z`");
        assert_eq!(
            err.to_string(),
            "failed to read particle source matter.csv: missing column `z`"
        );
    }
}
