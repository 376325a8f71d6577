//! Error types for the laser-motion crate.

use std::error::Error as StdError;
use std::fmt;

/// Error type shared by the planner, compiler and pipeline.
#[derive(Debug)]
pub enum Error {
    /// Invalid configuration or API misuse (zero budget, zero rate, ...).
    InvalidConfig(String),

    /// A coordinate falls outside the addressable 12-bit galvo range.
    CoordinateOutOfRange { x: f64, y: f64 },

    /// The point budget cannot hold the mandatory segments plus the
    /// minimum visible feature.
    BudgetExhausted { required: usize, available: usize },

    /// No DAC devices were found; the pipeline refuses to start.
    NoDevices,

    /// The device reported a negative status code.
    Device { device: usize, code: i32 },

    /// The pipeline was cancelled.
    Stopped,

    /// A pipeline thread panicked.
    WorkerPanicked(&'static str),

    /// Backend/device error (wrapped).
    Backend(Box<dyn StdError + Send + Sync>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            Error::CoordinateOutOfRange { x, y } => {
                write!(f, "coordinate out of range: ({}, {}) not within 0-4095", x, y)
            }
            Error::BudgetExhausted {
                required,
                available,
            } => write!(
                f,
                "point budget exhausted: {} points required, {} available",
                required, available
            ),
            Error::NoDevices => write!(f, "no devices: DAC reported zero devices"),
            Error::Device { device, code } => {
                write!(f, "device {} reported error status {}", device, code)
            }
            Error::Stopped => write!(f, "stopped: pipeline was cancelled"),
            Error::WorkerPanicked(name) => write!(f, "{} thread panicked", name),
            Error::Backend(e) => write!(f, "backend error: {}", e),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Backend(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl Error {
    /// Create an invalid config error with a message.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }

    /// Create a backend error from any error type.
    pub fn backend(err: impl StdError + Send + Sync + 'static) -> Self {
        Error::Backend(Box::new(err))
    }

    /// Returns true if this is an InvalidConfig or CoordinateOutOfRange error.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Error::InvalidConfig(_) | Error::CoordinateOutOfRange { .. }
        )
    }

    /// Returns true if this is a BudgetExhausted error.
    pub fn is_budget_exhausted(&self) -> bool {
        matches!(self, Error::BudgetExhausted { .. })
    }

    /// Returns true if this is a Stopped error.
    pub fn is_stopped(&self) -> bool {
        matches!(self, Error::Stopped)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Backend(Box::new(err))
    }
}

/// Result type for planning and streaming operations.
pub type Result<T> = std::result::Result<T, Error>;
