//! Core simulation logic: agents, environments, transmission, scenarios.
//!
//! Public API for the outbreak simulation engine. The within-host equations
//! live in the `immune-model` crate; this crate adds the spatial layer and
//! the per-tick loop.

use rand::rngs::SmallRng;

pub mod agent;
pub mod config;
pub mod environment;
pub mod setup;
pub mod snapshot;

pub use agent::{Agent, AgentId, ExposureSnapshot, Position};
pub use config::{Config, ConfigError};
pub use environment::{Environment, EnvironmentId, MapSize, TransmissionRule, VenueProfile};
pub use snapshot::{AgentSnapshot, EnvironmentSnapshot, WorldSnapshot};

// Re-export the model types drivers commonly touch.
pub use immune_model::{ImmuneParams, ImmuneState, MultiStrainImmuneState, Strain, StrainId};

/// Seeded random number generator for the whole run.
///
/// All random decisions (placement, movement, sampling) draw from this in a
/// fixed order, so a run is reproducible from its seed.
pub struct SimRng(pub SmallRng);

impl SimRng {
    pub fn seed_from_u64(seed: u64) -> Self {
        use rand::SeedableRng;
        Self(SmallRng::seed_from_u64(seed))
    }
}
