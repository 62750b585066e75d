use std::fmt;

/// Construction-time configuration error.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConfigError {
    /// Skip-list level decay must be a finite probability in `(0, 1)`.
    InvalidDecay(f64),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDecay(decay) => {
                write!(f, "skip list level decay must lie in (0, 1), got {decay}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
