use thiserror::Error;

use crate::point::Coord;

/// Lookup failures inside the planning tree. A correct planning run never produces them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error("coordinate {0} was never inserted in the tree")]
    KeyNotFound(Coord),

    #[error("walking parent links did not reach the root")]
    CycleOrMissingRoot,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("safety distance must be finite and non-negative, but was {0}")]
    NegativeSafetyDistance(f64),

    #[error("timeout must be a positive, finite number of seconds, but was {0}")]
    InvalidTimeout(f64),

    #[error("branch size must be positive, but was {0}")]
    NonPositiveBranchSize(f64),

    #[error("gaussian stddev inflation must be positive, but was {0}")]
    NonPositiveInflation(f64),

    #[error("RRT* neighborhood radius must be positive, but was {0}")]
    NonPositiveNeighborhood(f64),

    #[error("line discretization must be positive, but was {0}")]
    NonPositiveDiscretization(f64),

    #[error("bounds corners must be finite, but were {min} and {max}")]
    NonFiniteBounds { min: Coord, max: Coord },

    #[error("bounds minimum corner {min} exceeds maximum corner {max}")]
    InvertedBounds { min: Coord, max: Coord },
}

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("invalid planner configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("could not build the sampling distribution: {0}")]
    Distribution(#[from] statrs::StatsError),
}
