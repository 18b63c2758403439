//! Error and status types shared by every globe operation.
//!
//! Nothing in the globe panics on bad input. Operations either report what
//! they did through [`Outcome`] or hand back a recoverable [`GlobeError`].

use thiserror::Error;

/// Errors that can occur while loading data or driving the globe.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GlobeError {
    /// A country or region name was not found in the dataset.
    #[error("unknown country or region: {0}")]
    UnknownName(String),
    /// The drawing surface has zero area, so no projection can be fitted.
    #[error("degenerate viewport: {width}x{height}")]
    DegenerateViewport { width: u32, height: u32 },
    /// The boundary dataset could not be parsed.
    #[error("dataset error: {0}")]
    Dataset(String),
    /// The configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result of a mutating operation that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// State changed.
    Applied,
    /// The request was already satisfied; nothing changed.
    Unchanged,
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }

    /// Combines two outcomes; applied wins.
    pub fn merge(self, other: Outcome) -> Outcome {
        if self.is_applied() || other.is_applied() {
            Outcome::Applied
        } else {
            Outcome::Unchanged
        }
    }
}

pub type GlobeResult<T> = Result<T, GlobeError>;
