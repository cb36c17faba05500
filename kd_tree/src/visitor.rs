use std::borrow::Borrow;

use nalgebra as na;

use crate::HasCoords;

macro_rules! impl_default_with_new {
    (impl$(<$($generics:tt),*>)? Default for $($type:tt)*) => {
        impl$(<$($generics),*>)? Default for $($type)* {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

/// Search state of a [`crate::KDTree::query`]. The tree walks towards the query point `other`,
/// hands every node it reaches to `accept`, and skips subtrees that lie farther from `other`
/// than `radius`.
///
/// `'a` is the lifetime of the tree, so results may borrow its points.
pub trait Visitor<'a, P> {
    type Result;

    /// Search radius around `other`. Must never grow during a query.
    fn radius<Q, const N: usize>(&self, other: &Q) -> f64
    where
        Q: HasCoords<N> + ?Sized,
        P: Borrow<Q>;

    /// Offers a point of the tree that lies within `radius` of `other`.
    fn accept<Q, const N: usize>(&mut self, point: &'a P, other: &Q)
    where
        Q: HasCoords<N> + ?Sized,
        P: Borrow<Q>;

    fn result(self) -> Self::Result;

    fn radius_sq<Q, const N: usize>(&self, other: &Q) -> f64
    where
        Q: HasCoords<N> + ?Sized,
        P: Borrow<Q>,
    {
        self.radius(other).powi(2)
    }
}

/// Finds the point closest to the query point. Ties keep the first point reached.
pub struct NearestVisitor<'a, P> {
    /// Best point so far, with its squared distance to the query point.
    best: Option<(&'a P, f64)>,
}

impl<'a, P> NearestVisitor<'a, P> {
    pub fn new() -> Self {
        NearestVisitor { best: None }
    }
}

impl<'a, P> Visitor<'a, P> for NearestVisitor<'a, P> {
    type Result = Option<&'a P>;

    fn radius<Q, const N: usize>(&self, other: &Q) -> f64
    where
        Q: HasCoords<N> + ?Sized,
        P: Borrow<Q>,
    {
        self.radius_sq(other).sqrt()
    }

    fn accept<Q, const N: usize>(&mut self, point: &'a P, other: &Q)
    where
        Q: HasCoords<N> + ?Sized,
        P: Borrow<Q>,
    {
        let dist_sq = na::distance_squared(&point.borrow().point(), &other.point());
        if self.best.map_or(true, |(_, best)| dist_sq < best) {
            self.best = Some((point, dist_sq));
        }
    }

    fn result(self) -> Option<&'a P> {
        self.best.map(|(point, _)| point)
    }

    // The query point is fixed for the whole search, so the cached distance stays valid.
    fn radius_sq<Q, const N: usize>(&self, _: &Q) -> f64
    where
        Q: HasCoords<N> + ?Sized,
        P: Borrow<Q>,
    {
        self.best.map_or(f64::INFINITY, |(_, dist_sq)| dist_sq)
    }
}

impl_default_with_new! { impl<'a, P> Default for NearestVisitor<'a, P> }

/// Collects every point within `radius` (inclusive) of the query point, in visiting order.
pub struct WithinRadiusVisitor<'a, P> {
    found: Vec<&'a P>,
    radius: f64,
}

impl<'a, P> WithinRadiusVisitor<'a, P> {
    pub fn new(radius: f64) -> Self {
        WithinRadiusVisitor {
            found: Vec::new(),
            radius,
        }
    }
}

impl<'a, P> Visitor<'a, P> for WithinRadiusVisitor<'a, P> {
    type Result = Vec<&'a P>;

    fn radius<Q, const N: usize>(&self, _: &Q) -> f64
    where
        Q: HasCoords<N> + ?Sized,
        P: Borrow<Q>,
    {
        self.radius
    }

    fn accept<Q, const N: usize>(&mut self, point: &'a P, other: &Q)
    where
        Q: HasCoords<N> + ?Sized,
        P: Borrow<Q>,
    {
        if na::distance_squared(&point.borrow().point(), &other.point()) <= self.radius_sq(other) {
            self.found.push(point);
        }
    }

    fn result(self) -> Vec<&'a P> {
        self.found
    }
}
