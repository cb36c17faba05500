//! Obstacle map construction: point cloud files, synthetic surfaces and the k-d tree index the
//! planner queries.

use nalgebra as na;

pub mod point_cloud;
pub mod surface;

pub use point_cloud::{build_index, parse_point_cloud, thin_points};
pub use surface::{box_surface, sphere_surface};

pub type Coord = na::Point3<f64>;
