use crate::ensemble::Ensemble;
use crate::error::{Quantity, Result, SimulationError};
use crate::forces::compute_forces;
use crate::integrator;
use crate::parameters::SimulationParameters;
use crate::statistics::SimulationStatistics;
use crate::util::first_non_finite;
use crate::{Scalar, Vec3};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationState {
    Initialized,
    Running,
    Complete,
    Failed,
}

/// The ensemble as it was after `step` steps.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub step: usize,
    pub time: Scalar,
    pub ensemble: Ensemble,
}

/// Everything a completed run hands back.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub ensemble: Ensemble,
    /// Recorded states, oldest first. Empty unless `snapshot_interval` was set.
    pub snapshots: Vec<Snapshot>,
}

/// Owns the ensemble for the duration of one run and steps it forward.
pub struct NBodySimulation {
    ensemble: Ensemble,
    params: SimulationParameters,
    state: SimulationState,
    /// Number of steps taken so far
    step: usize,
    pool: Option<rayon::ThreadPool>,
    snapshots: Vec<Snapshot>,
}

impl NBodySimulation {
    pub fn new(ensemble: Ensemble, params: SimulationParameters) -> Result<Self> {
        params.validate()?;

        let pool = match params.num_threads {
            Some(num_threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(num_threads)
                    .build()
                    .map_err(|err| {
                        tracing::error!("Failed to build thread pool: {}", err);
                        SimulationError::InvalidParameter {
                            name: "num_threads",
                            value: num_threads as Scalar,
                        }
                    })?;
                Some(pool)
            }
            None => None,
        };

        Ok(Self {
            ensemble,
            params,
            state: SimulationState::Initialized,
            step: 0,
            pool,
            snapshots: Vec::new(),
        })
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn ensemble(&self) -> &Ensemble {
        &self.ensemble
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    /// Simulated time elapsed so far.
    pub fn time(&self) -> Scalar {
        self.step as Scalar * self.params.delta_time
    }

    /// Computes forces on the current configuration and advances every particle by one step. If
    /// a force, velocity or position becomes non-finite the simulation moves to `Failed` and
    /// refuses to step again.
    pub fn simulate_frame(&mut self) -> Result<()> {
        assert_ne!(
            self.state,
            SimulationState::Failed,
            "simulate_frame called on a failed simulation"
        );
        self.state = SimulationState::Running;

        let result = self.advance();
        if result.is_err() {
            self.state = SimulationState::Failed;
        }
        result
    }

    fn advance(&mut self) -> Result<()> {
        let forces = self.forces();
        self.check_finite(&forces, Quantity::Force)?;

        integrator::step(&mut self.ensemble, &forces, self.params.delta_time);

        let particles = self.ensemble.particles();
        self.check_finite(particles.velocities(), Quantity::Velocity)?;
        self.check_finite(particles.positions(), Quantity::Position)?;

        self.step += 1;
        Ok(())
    }

    fn forces(&self) -> Vec<Vec3> {
        let (block_size, g) = (self.params.block_size, self.params.gravitational_constant);
        match &self.pool {
            Some(pool) => pool.install(|| compute_forces(&self.ensemble, block_size, g)),
            None => compute_forces(&self.ensemble, block_size, g),
        }
    }

    fn check_finite(&self, values: &[Vec3], quantity: Quantity) -> Result<()> {
        match first_non_finite(values) {
            Some(particle) => Err(SimulationError::NumericOverflow {
                step: self.step,
                particle,
                quantity,
            }),
            None => Ok(()),
        }
    }

    /// Runs all `num_steps` steps. Either every step succeeds and the final ensemble is
    /// returned, or the first error is and the ensemble is dropped.
    pub fn run(self) -> Result<RunOutcome> {
        self.run_until(|| false)
    }

    /// Like [`NBodySimulation::run`], but checks `cancelled` before every step and gives up with
    /// [`SimulationError::Cancelled`] once it is set.
    pub fn run_cancellable(self, cancelled: &AtomicBool) -> Result<RunOutcome> {
        self.run_until(|| cancelled.load(Ordering::Relaxed))
    }

    fn run_until<F: Fn() -> bool>(mut self, cancelled: F) -> Result<RunOutcome> {
        let num_steps = self.params.num_steps;

        tracing::info!(
            "Starting simulation of {} particles for {} steps (dt = {})",
            self.ensemble.len(),
            num_steps,
            self.params.delta_time
        );
        log_statistics(&self.ensemble, self.params.gravitational_constant);
        self.record_snapshot();

        for step in 0..num_steps {
            if cancelled() {
                tracing::warn!("Simulation cancelled before step {}", step + 1);
                self.state = SimulationState::Failed;
                return Err(SimulationError::Cancelled { step });
            }

            tracing::debug!("Simulation step {}/{}", step + 1, num_steps);
            if let Err(err) = self.simulate_frame() {
                tracing::error!("Simulation failed: {}", err);
                return Err(err);
            }
            self.record_snapshot();
        }

        self.state = SimulationState::Complete;
        tracing::info!("Simulation complete after {} steps", self.step);
        log_statistics(&self.ensemble, self.params.gravitational_constant);

        Ok(RunOutcome {
            ensemble: self.ensemble,
            snapshots: self.snapshots,
        })
    }

    fn record_snapshot(&mut self) {
        let interval = match self.params.snapshot_interval {
            Some(interval) => interval,
            None => return,
        };

        if self.step % interval == 0 || self.step == self.params.num_steps {
            self.snapshots.push(Snapshot {
                step: self.step,
                time: self.time(),
                ensemble: self.ensemble.clone(),
            });
        }
    }
}

/// Runs `params.num_steps` steps on `ensemble`. On failure nothing of the run survives.
pub fn run(ensemble: Ensemble, params: &SimulationParameters) -> Result<Ensemble> {
    NBodySimulation::new(ensemble, params.clone())?
        .run()
        .map(|outcome| outcome.ensemble)
}

fn log_statistics(ensemble: &Ensemble, g: Scalar) {
    tracing::info!(
        mass = ensemble.total_mass(),
        momentum = ensemble.total_linear_momentum().magnitude(),
        kinetic = ensemble.kinetic_energy(),
        potential = ensemble.potential_energy(g),
        "Ensemble statistics"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initial_condition::{InitialCondition, Sphere};
    use crate::parameters::GRAVITATIONAL_CONSTANT as G;
    use crate::util::assert_vec_close;
    use crate::ParticleSet;

    fn two_bodies() -> Ensemble {
        Ensemble::from_sets(
            ParticleSet::from_positions(vec![Vec3::zeros(), Vec3::new(1., 0., 0.)], 1.),
            ParticleSet::default(),
        )
    }

    fn params(num_steps: usize) -> SimulationParameters {
        SimulationParameters {
            num_steps,
            ..Default::default()
        }
    }

    #[test]
    fn test_two_body_single_step() {
        let dt = 1e-3;
        let result = run(two_bodies(), &params(1)).unwrap();
        let p = result.particles();

        let dv = G * dt;
        assert_vec_close(p.velocities()[0], Vec3::new(dv, 0., 0.), dv, 1e-12);
        assert_vec_close(p.velocities()[1], Vec3::new(-dv, 0., 0.), dv, 1e-12);

        // semi-implicit Euler moves by the new velocity
        assert_vec_close(p.positions()[0], Vec3::new(dv * dt, 0., 0.), dv * dt, 1e-12);
        assert_vec_close(
            p.positions()[1],
            Vec3::new(1. - dv * dt, 0., 0.),
            1.,
            1e-15,
        );
    }

    #[test]
    fn test_zero_steps_is_identity() {
        let ensemble = Ensemble::from_sets(
            ParticleSet::from_positions(
                Sphere {
                    num_particles: 30,
                    center: Vec3::zeros(),
                    radius: 2.,
                    seed: 0,
                }
                .positions(),
                1.,
            ),
            ParticleSet::from_positions(vec![Vec3::new(1., 1., 1.)], 10.),
        );

        let result = run(ensemble.clone(), &params(0)).unwrap();
        assert_eq!(result, ensemble);
    }

    #[test]
    fn test_isolated_particle_stays_put() {
        let x = Vec3::new(-4., 0.25, 9.);
        let ensemble = Ensemble::from_sets(
            ParticleSet::default(),
            ParticleSet::from_positions(vec![x], 10.),
        );

        let result = run(ensemble, &params(25)).unwrap();
        assert_eq!(result.particles().positions(), &[x]);
        assert_eq!(result.particles().velocities(), &[Vec3::zeros()]);
    }

    #[test]
    fn test_population_order_is_preserved() {
        let matter = vec![Vec3::new(0., 0., 0.), Vec3::new(0., 3., 0.)];
        let ensemble = Ensemble::from_sets(
            ParticleSet::from_positions(matter, 1.),
            ParticleSet::from_positions(vec![Vec3::new(3., 0., 0.)], 10.),
        );

        let result = run(ensemble, &params(5)).unwrap();
        assert_eq!(result.num_matter(), 2);
        assert_eq!(result.particles().masses(), &[1., 1., 10.]);
    }

    #[test]
    fn test_block_size_does_not_change_result() {
        let positions = Sphere {
            num_particles: 60,
            center: Vec3::zeros(),
            radius: 1.,
            seed: 9,
        }
        .positions();
        let ensemble = Ensemble::from_sets(
            ParticleSet::from_positions(positions, 1.),
            ParticleSet::default(),
        );

        let small = run(
            ensemble.clone(),
            &SimulationParameters {
                block_size: 7,
                num_steps: 3,
                ..Default::default()
            },
        )
        .unwrap();
        let large = run(ensemble, &params(3)).unwrap();

        for (a, b) in small
            .particles()
            .positions()
            .iter()
            .zip(large.particles().positions())
        {
            assert_vec_close(*a, *b, 1., 1e-12);
        }
    }

    #[test]
    fn test_overflow_fails_the_run() {
        let ensemble = Ensemble::from_sets(
            ParticleSet::from_positions(vec![Vec3::zeros(), Vec3::new(1e-10, 0., 0.)], 1.),
            ParticleSet::default(),
        );
        let params = SimulationParameters {
            gravitational_constant: 1e300,
            num_steps: 5,
            ..Default::default()
        };

        let err = run(ensemble, &params).unwrap_err();
        assert_eq!(
            err,
            SimulationError::NumericOverflow {
                step: 0,
                particle: 0,
                quantity: Quantity::Force,
            }
        );
    }

    #[test]
    fn test_failed_frame_marks_simulation_failed() {
        let ensemble = Ensemble::from_sets(
            ParticleSet::from_positions(vec![Vec3::zeros(), Vec3::new(1e-10, 0., 0.)], 1.),
            ParticleSet::default(),
        );
        let mut sim = NBodySimulation::new(
            ensemble,
            SimulationParameters {
                gravitational_constant: 1e300,
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(sim.state(), SimulationState::Initialized);
        assert!(sim.simulate_frame().is_err());
        assert_eq!(sim.state(), SimulationState::Failed);
    }

    #[test]
    fn test_invalid_parameters_are_rejected() {
        let err = NBodySimulation::new(
            two_bodies(),
            SimulationParameters {
                delta_time: -1.,
                ..Default::default()
            },
        )
        .err()
        .unwrap();

        assert!(matches!(err, SimulationError::InvalidParameter { .. }));
    }

    #[test]
    fn test_snapshots() {
        let sim = NBodySimulation::new(
            two_bodies(),
            SimulationParameters {
                num_steps: 7,
                snapshot_interval: Some(3),
                ..Default::default()
            },
        )
        .unwrap();

        let outcome = sim.run().unwrap();
        let steps = outcome.snapshots.iter().map(|s| s.step).collect::<Vec<_>>();
        assert_eq!(steps, vec![0, 3, 6, 7]);
        assert_eq!(outcome.snapshots[0].ensemble, two_bodies());
        assert_eq!(outcome.snapshots[3].ensemble, outcome.ensemble);
        assert!((outcome.snapshots[1].time - 3e-3).abs() < 1e-15);
    }

    #[test]
    fn test_cancelled_run() {
        let cancelled = AtomicBool::new(true);
        let err = NBodySimulation::new(two_bodies(), params(3))
            .unwrap()
            .run_cancellable(&cancelled)
            .unwrap_err();
        assert_eq!(err, SimulationError::Cancelled { step: 0 });

        let cancelled = AtomicBool::new(false);
        let outcome = NBodySimulation::new(two_bodies(), params(3))
            .unwrap()
            .run_cancellable(&cancelled)
            .unwrap();
        assert_eq!(outcome.ensemble.len(), 2);
    }

    #[test]
    fn test_dedicated_thread_pool() {
        let ensemble = two_bodies();
        let pooled = NBodySimulation::new(
            ensemble.clone(),
            SimulationParameters {
                num_threads: Some(2),
                num_steps: 2,
                ..Default::default()
            },
        )
        .unwrap()
        .run()
        .unwrap();

        let global = run(ensemble, &params(2)).unwrap();
        assert_eq!(pooled.ensemble, global);
    }
}
