//! Error types for device construction, simulation and file collaborators.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Error, Debug)]
pub enum SimError {
    /// A device parameter is outside its valid domain.
    #[error("invalid device parameter `{parameter}`: {reason}")]
    Configuration {
        parameter: &'static str,
        reason: String,
    },

    /// The rate sequence cannot support derivation of the initial age distribution.
    #[error("cannot derive microcell age distribution: {0}")]
    Distribution(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed binary or CSV input.
    #[error("format error: {0}")]
    Format(String),
}

impl SimError {
    pub fn config(parameter: &'static str, reason: impl Into<String>) -> Self {
        SimError::Configuration {
            parameter,
            reason: reason.into(),
        }
    }

    pub fn distribution(message: impl Into<String>) -> Self {
        SimError::Distribution(message.into())
    }

    pub fn format(message: impl Into<String>) -> Self {
        SimError::Format(message.into())
    }

    /// Name of the offending parameter for configuration errors.
    pub fn parameter(&self) -> Option<&'static str> {
        match self {
            SimError::Configuration { parameter, .. } => Some(*parameter),
            _ => None,
        }
    }
}
