//! Virus Strains
//!
//! A strain is a distinguishable virus variant with its own parameter set.
//! Strains are immutable once created; per-host trajectories live in the
//! host's immune state, not here.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::params::ImmuneParams;

/// Unique identifier for a virus strain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StrainId(pub String);

impl StrainId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StrainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StrainId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A virus variant: identity, cross-reactivity, and its own coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strain {
    /// Strain identity.
    pub id: StrainId,
    /// How strongly the host's native antibodies recognize this strain.
    ///
    /// 1.0 means full native recognition; 0.0 means the native antibody pool
    /// contributes nothing against it.
    pub reactivity: f64,
    /// The strain's own growth/loss/antibody coefficients.
    pub params: ImmuneParams,
}

impl Strain {
    /// Creates a strain with explicit reactivity and parameters.
    pub fn new(id: impl Into<StrainId>, reactivity: f64, params: ImmuneParams) -> Self {
        Self {
            id: id.into(),
            reactivity,
            params,
        }
    }

    /// A strain fully recognized by the host, using the reference parameters.
    pub fn native(id: impl Into<StrainId>) -> Self {
        Self {
            id: id.into(),
            reactivity: 1.0,
            params: ImmuneParams::default(),
        }
    }

    /// Builder-style override of the parameter set.
    pub fn with_params(mut self, params: ImmuneParams) -> Self {
        self.params = params;
        self
    }
}

impl From<String> for StrainId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
