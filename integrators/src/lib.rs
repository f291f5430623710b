//! Integrators

#[macro_use]
extern crate log;

mod path;
mod pbr_path;
mod rr_path;

pub use path::*;
pub use pbr_path::*;
pub use rr_path::*;

#[cfg(test)]
mod fixtures;

use aurora_core::integrator::Integrator;

/// Selects a light-transport strategy by name; used by callers that switch
/// integrators at run time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IntegratorKind {
    /// Fixed-depth path tracing.
    Path,

    /// Path tracing with Russian roulette termination.
    RussianRoulette,

    /// Path tracing with explicit light sampling and roulette termination.
    Pbr,
}

impl IntegratorKind {
    /// Instantiates the selected integrator.
    ///
    /// * `max_depth` - Maximum number of bounces.
    pub fn create(self, max_depth: usize) -> Box<dyn Integrator> {
        debug!("Creating {self:?} integrator with max depth {max_depth}");
        match self {
            Self::Path => Box::new(PathIntegrator::new(max_depth)),
            Self::RussianRoulette => Box::new(RRPathIntegrator::new(max_depth)),
            Self::Pbr => Box::new(PbrPathIntegrator::new(max_depth)),
        }
    }
}
