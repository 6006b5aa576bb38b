//! Immune Model Parameters
//!
//! The coefficients of the within-host virus/immune equations. Values are
//! validated once at construction; the delay is stored in time units and
//! converted to an integer step count on demand.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Per-step virus decay applied after the differential update.
///
/// A small fixed subtraction that keeps a trace virus load from persisting
/// forever. Preserved from the reference model; under review as a candidate
/// for a principled clearance term.
pub const VIRUS_STEP_DECAY: f64 = 1e-4;

/// Coefficients of the within-host immune/virus equations.
///
/// Single-letter names from the model are noted on each field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImmuneParams {
    /// Maximum cell count of the host tissue (N).
    pub max_cells: f64,
    /// Virus growth rate (s).
    pub virus_growth: f64,
    /// Infected-cell increase coefficient (a).
    pub infection_gain: f64,
    /// Virus loss coefficient from infecting healthy cells (u).
    pub virus_loss: f64,
    /// Immune-cell increase coefficient (i).
    pub immune_gain: f64,
    /// Antibody efficiency against free virus (g1).
    pub antibody_efficiency: f64,
    /// Antibody decay rate (g2).
    pub antibody_decay: f64,
    /// Antibody production per immune cell (g3).
    pub antibody_growth: f64,
    /// Immune-cell natural death coefficient (m).
    pub immune_death: f64,
    /// Immune response delay in time units (d).
    pub response_delay: f64,
    /// Integration step size.
    pub dt: f64,
}

impl ImmuneParams {
    /// Validates the coefficients, returning the parameter set if usable.
    ///
    /// `max_cells` appears as a denominator and must be positive; `dt` must
    /// be positive; the delay must be non-negative.
    pub fn validated(self) -> Result<Self, ModelError> {
        if self.max_cells <= 0.0 {
            return Err(ModelError::InvalidParameter {
                name: "max_cells",
                value: self.max_cells,
                reason: "must be positive, used as a denominator",
            });
        }
        if self.dt <= 0.0 {
            return Err(ModelError::InvalidParameter {
                name: "dt",
                value: self.dt,
                reason: "must be positive",
            });
        }
        if self.response_delay < 0.0 {
            return Err(ModelError::InvalidParameter {
                name: "response_delay",
                value: self.response_delay,
                reason: "must be non-negative",
            });
        }
        Ok(self)
    }

    /// The response delay as a whole number of integration steps, rounded down.
    pub fn delay_steps(&self) -> usize {
        (self.response_delay / self.dt) as usize
    }
}

impl Default for ImmuneParams {
    /// Reference parameter set: N=100, s=0.8, a=0.5, u=0.001, i=0.1, g1=0.1,
    /// g2=0.01, g3=1.0, m=0.02, dt=0.01, delay of 500 steps.
    fn default() -> Self {
        Self {
            max_cells: 100.0,
            virus_growth: 0.8,
            infection_gain: 0.5,
            virus_loss: 0.001,
            immune_gain: 0.1,
            antibody_efficiency: 0.1,
            antibody_decay: 0.01,
            antibody_growth: 1.0,
            immune_death: 0.02,
            response_delay: 5.0,
            dt: 0.01,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_are_valid() {
        let params = ImmuneParams::default().validated().unwrap();
        assert_eq!(params.max_cells, 100.0);
        assert_eq!(params.delay_steps(), 500);
    }

    #[test]
    fn test_zero_max_cells_rejected() {
        let params = ImmuneParams {
            max_cells: 0.0,
            ..ImmuneParams::default()
        };
        assert!(matches!(
            params.validated(),
            Err(ModelError::InvalidParameter {
                name: "max_cells",
                ..
            })
        ));
    }

    #[test]
    fn test_non_positive_dt_rejected() {
        let params = ImmuneParams {
            dt: 0.0,
            ..ImmuneParams::default()
        };
        assert!(params.validated().is_err());
    }

    #[test]
    fn test_negative_delay_rejected() {
        let params = ImmuneParams {
            response_delay: -1.0,
            ..ImmuneParams::default()
        };
        assert!(params.validated().is_err());
    }

    #[test]
    fn test_delay_steps_rounds_down() {
        let params = ImmuneParams {
            response_delay: 0.057,
            dt: 0.01,
            ..ImmuneParams::default()
        };
        assert_eq!(params.delay_steps(), 5);
    }
}
