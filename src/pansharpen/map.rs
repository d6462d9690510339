//! Bayesian MAP pansharpening
//!
//! The energy couples blurred-data fidelity, a Laplacian smoothness prior
//! and pan consistency; the optimizer runs fixed-step gradient descent on it
//! for a fixed iteration budget.

mod config;
mod energy;
mod optimizer;

pub use config::{MapConfig, MapConfigBuilder};
pub use energy::{EnergyTerms, MapEnergyModel};
pub use optimizer::{MapOptimizer, MapOutcome};
