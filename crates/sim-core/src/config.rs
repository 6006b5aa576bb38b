//! Configuration System
//!
//! Loads tuning parameters from tuning.toml for easy adjustment without
//! recompiling. Every section has defaults so a missing file or section
//! still yields a runnable setup.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use immune_model::{ImmuneParams, ModelError};

use crate::environment::TransmissionRule;

/// Default tuning file path
pub const DEFAULT_TUNING_PATH: &str = "tuning.toml";

/// Top-level configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub transmission: TransmissionConfig,
    #[serde(default)]
    pub immune: ImmuneConfig,
}

/// Run-level parameters
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Ticks to simulate by default.
    pub ticks: u64,
    /// Seed for the run RNG.
    pub seed: u64,
    /// Simulated time per tick; each tick runs `tick_duration / dt` immune
    /// sub-steps.
    pub tick_duration: f64,
    /// Ticks between snapshot writes (0 disables periodic snapshots).
    pub snapshot_interval: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ticks: 300,
            seed: 42,
            tick_duration: 0.1,
            snapshot_interval: 0,
        }
    }
}

/// Transmission parameters
#[derive(Debug, Clone, Deserialize)]
pub struct TransmissionConfig {
    pub max_range: f64,
    pub colocation_coefficient: f64,
    pub infection_threshold: f64,
}

impl Default for TransmissionConfig {
    fn default() -> Self {
        Self {
            max_range: 5.0,
            colocation_coefficient: 0.9,
            infection_threshold: 10.0,
        }
    }
}

impl TransmissionConfig {
    pub fn rule(&self) -> TransmissionRule {
        TransmissionRule {
            max_range: self.max_range,
            colocation_coefficient: self.colocation_coefficient,
        }
    }
}

/// Immune model coefficients
#[derive(Debug, Clone, Deserialize)]
pub struct ImmuneConfig {
    pub max_cells: f64,
    pub virus_growth: f64,
    pub infection_gain: f64,
    pub virus_loss: f64,
    pub immune_gain: f64,
    pub antibody_efficiency: f64,
    pub antibody_decay: f64,
    pub antibody_growth: f64,
    pub immune_death: f64,
    pub response_delay: f64,
    pub dt: f64,
}

impl Default for ImmuneConfig {
    fn default() -> Self {
        let p = ImmuneParams::default();
        Self {
            max_cells: p.max_cells,
            virus_growth: p.virus_growth,
            infection_gain: p.infection_gain,
            virus_loss: p.virus_loss,
            immune_gain: p.immune_gain,
            antibody_efficiency: p.antibody_efficiency,
            antibody_decay: p.antibody_decay,
            antibody_growth: p.antibody_growth,
            immune_death: p.immune_death,
            response_delay: p.response_delay,
            dt: p.dt,
        }
    }
}

impl ImmuneConfig {
    /// Validated model parameters; surfaces the model's configuration error.
    pub fn params(&self) -> Result<ImmuneParams, ModelError> {
        ImmuneParams {
            max_cells: self.max_cells,
            virus_growth: self.virus_growth,
            infection_gain: self.infection_gain,
            virus_loss: self.virus_loss,
            immune_gain: self.immune_gain,
            antibody_efficiency: self.antibody_efficiency,
            antibody_decay: self.antibody_decay,
            antibody_growth: self.antibody_growth,
            immune_death: self.immune_death,
            response_delay: self.response_delay,
            dt: self.dt,
        }
        .validated()
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Loads from a file if it exists, otherwise falls back to defaults.
    pub fn from_file_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Configuration error type
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid model parameters: {0}")]
    Model(#[from] ModelError),
}
