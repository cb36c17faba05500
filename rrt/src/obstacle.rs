use nalgebra as na;

use kd_tree::{visitor::NearestVisitor, KDTree};

use crate::point::Coord;

/// A nearest-obstacle distance query service. The planner only ever asks how far the closest
/// obstacle is from a point.
pub trait ObstacleIndex {
    /// Distance from `p` to the nearest obstacle, or `f64::INFINITY` when there is none.
    fn nearest_distance(&self, p: &Coord) -> f64;
}

impl<T: ObstacleIndex + ?Sized> ObstacleIndex for &T {
    #[inline(always)]
    fn nearest_distance(&self, p: &Coord) -> f64 {
        (**self).nearest_distance(p)
    }
}

impl<T: ObstacleIndex + ?Sized> ObstacleIndex for Box<T> {
    #[inline(always)]
    fn nearest_distance(&self, p: &Coord) -> f64 {
        (**self).nearest_distance(p)
    }
}

impl<T: ObstacleIndex> ObstacleIndex for [T] {
    fn nearest_distance(&self, p: &Coord) -> f64 {
        self.iter()
            .map(|o| o.nearest_distance(p))
            .fold(f64::INFINITY, f64::min)
    }
}

impl<T: ObstacleIndex> ObstacleIndex for Vec<T> {
    #[inline(always)]
    fn nearest_distance(&self, p: &Coord) -> f64 {
        self.as_slice().nearest_distance(p)
    }
}

/// Point cloud obstacles, the usual output of a mapping pipeline.
impl ObstacleIndex for KDTree<Coord, 3> {
    fn nearest_distance(&self, p: &Coord) -> f64 {
        self.query(p, NearestVisitor::new())
            .map(|nearest| na::distance(nearest, p))
            .unwrap_or(f64::INFINITY)
    }
}

/// An obstacle free world.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptySpace;

impl ObstacleIndex for EmptySpace {
    #[inline(always)]
    fn nearest_distance(&self, _: &Coord) -> f64 {
        f64::INFINITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Coord,
    pub radius: f64,
}

impl Sphere {
    pub fn new(center: Coord, radius: f64) -> Self {
        Self { center, radius }
    }
}

impl ObstacleIndex for Sphere {
    fn nearest_distance(&self, p: &Coord) -> f64 {
        (na::distance(&self.center, p) - self.radius).max(0.0)
    }
}

/// A solid axis aligned box given by its lowest corner and its size along each axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cuboid {
    pub corner: Coord,
    pub size: na::Vector3<f64>,
}

impl Cuboid {
    pub fn new(corner: Coord, size: na::Vector3<f64>) -> Self {
        Self { corner, size }
    }
}

impl ObstacleIndex for Cuboid {
    fn nearest_distance(&self, p: &Coord) -> f64 {
        let far = self.corner + self.size;
        let outside = na::Vector3::from_iterator(
            itertools::izip!(p.iter(), self.corner.iter(), far.iter())
                .map(|(&v, &lo, &hi)| (lo - v).max(v - hi).max(0.0)),
        );
        outside.norm()
    }
}
