//! Model error types.

use thiserror::Error;

use crate::strain::StrainId;

/// Errors raised by the immune model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// A coefficient fails validation at construction time.
    #[error("invalid parameter {name}: {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// A per-strain trajectory was requested for a strain that was never
    /// registered on this host.
    #[error("strain '{0}' is not tracked by this host")]
    StrainNotFound(StrainId),
}
