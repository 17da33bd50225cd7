mod error;
pub mod kepler;
mod propagator;
mod state;

pub use error::PropagationError;
pub use kepler::solve_kepler;
pub use propagator::{OrbitalPropagator, PreparedSatellite, PropagatorKind, StateSeries, StepResult};
pub use state::OrbitalState;
