//! Within-host immune/virus dynamics for the outbreak simulation.
//!
//! This crate contains the pure numeric model with no agents, environments,
//! or randomness. It is a dependency for the simulation crates.

pub mod error;
pub mod multi;
pub mod params;
pub mod single;
pub mod strain;
pub mod timeseries;

pub use error::ModelError;
pub use multi::{MultiStrainImmuneState, StrainTrack};
pub use params::{ImmuneParams, VIRUS_STEP_DECAY};
pub use single::ImmuneState;
pub use strain::{Strain, StrainId};
pub use timeseries::TimeSeries;
