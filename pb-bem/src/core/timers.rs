//! Coarse wall-clock timers around the solve phases

use std::time::{Duration, Instant};

/// Accumulated phase durations of one run
#[derive(Debug, Default, Clone)]
pub struct Timers {
    /// Molecule + mesh input (or mesher invocation)
    pub input: Duration,
    /// Source-term assembly
    pub source_term: Duration,
    /// Tree, cluster and interaction-list construction
    pub setup: Duration,
    /// Preconditioner assembly and factorization
    pub preconditioner: Duration,
    /// GMRES solve
    pub solve: Duration,
    /// Energy integration
    pub energy: Duration,
    /// Output writing
    pub output: Duration,
}

impl Timers {
    /// Time a closure into the given slot
    pub fn time<T>(slot: &mut Duration, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = f();
        *slot += start.elapsed();
        result
    }

    /// Total of all recorded phases
    pub fn total(&self) -> Duration {
        self.input
            + self.source_term
            + self.setup
            + self.preconditioner
            + self.solve
            + self.energy
            + self.output
    }

    /// Log the phase report
    pub fn report(&self) {
        log::info!("Timing (s):");
        log::info!("  input................: {:12.5}", self.input.as_secs_f64());
        log::info!("  source term..........: {:12.5}", self.source_term.as_secs_f64());
        log::info!("  tree/cluster setup...: {:12.5}", self.setup.as_secs_f64());
        log::info!("  preconditioner.......: {:12.5}", self.preconditioner.as_secs_f64());
        log::info!("  solve................: {:12.5}", self.solve.as_secs_f64());
        log::info!("  energy...............: {:12.5}", self.energy.as_secs_f64());
        log::info!("  output...............: {:12.5}", self.output.as_secs_f64());
        log::info!("  total................: {:12.5}", self.total().as_secs_f64());
    }
}
