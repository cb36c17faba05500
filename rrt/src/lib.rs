//! Sampling based path planning in 3-D space with RRT and RRT*.
//!
//! A [`PlannerBuilder`] bundles the world bounds, an [`ObstacleIndex`] and the search options.
//! The resulting [`Planner`] grows a tree from the start until the goal can be seen from one of
//! its nodes, and reports the path through the tree.

pub mod builder;
pub mod error;
pub mod obstacle;
pub mod planner;
pub mod point;
pub mod sampler;
pub mod space;
pub mod star;
pub mod steering;
pub mod straighten;
pub mod tree;
pub mod validation;

use std::time::Duration;

pub use builder::PlannerBuilder;
pub use error::{ConfigError, PlanError, TreeError};
pub use obstacle::{Cuboid, EmptySpace, ObstacleIndex, Sphere};
pub use planner::{Algorithm, Planner};
pub use point::{Coord, Waypoint};
pub use sampler::SamplingMethod;
pub use space::{BBox, Bounds};

use steering::polyline_length;

#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub waypoints: Vec<Waypoint>,
    /// Summed length of the segments between consecutive waypoints.
    pub distance: f64,
}

impl Path {
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        let distance = polyline_length(waypoints.iter().map(|w| &w.point));
        Path { waypoints, distance }
    }
}

/// Outcome of a single planning call.
#[derive(Debug, Clone)]
pub struct PlanResult {
    /// `None` when the timeout ran out before the goal was connected.
    pub result: Option<Path>,
    /// Number of nodes in the tree when the search ended.
    pub n_points: usize,
    pub elapsed: Duration,
}

impl PlanResult {
    pub fn is_solved(&self) -> bool {
        self.result.is_some()
    }

    /// The waypoints and path length, or `(None, None)` when no path was found.
    pub fn into_parts(self) -> (Option<Vec<Waypoint>>, Option<f64>) {
        match self.result {
            Some(Path { waypoints, distance }) => (Some(waypoints), Some(distance)),
            None => (None, None),
        }
    }
}
