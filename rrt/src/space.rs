use crate::point::Coord;

/// The volume the planner is allowed to sample and travel in.
pub trait Bounds {
    fn contains(&self, p: &Coord) -> bool;

    fn min_corner(&self) -> Coord;
    fn max_corner(&self) -> Coord;
}

impl<T: Bounds + ?Sized> Bounds for &T {
    #[inline(always)]
    fn contains(&self, p: &Coord) -> bool {
        (**self).contains(p)
    }

    #[inline(always)]
    fn min_corner(&self) -> Coord {
        (**self).min_corner()
    }

    #[inline(always)]
    fn max_corner(&self) -> Coord {
        (**self).max_corner()
    }
}

/// Axis aligned box, inclusive on every face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min_corner: Coord,
    pub max_corner: Coord,
}

impl BBox {
    pub fn new(min_corner: Coord, max_corner: Coord) -> BBox {
        BBox {
            min_corner,
            max_corner,
        }
    }

    pub fn volume(&self) -> f64 {
        self.min_corner
            .iter()
            .zip(self.max_corner.iter())
            .map(|(min, max)| max - min)
            .product()
    }

    pub fn diagonal(&self) -> f64 {
        nalgebra::distance(&self.min_corner, &self.max_corner)
    }
}

impl Bounds for BBox {
    fn contains(&self, p: &Coord) -> bool {
        itertools::izip!(p.iter(), self.min_corner.iter(), self.max_corner.iter())
            .all(|(&v, &min, &max)| (min..=max).contains(&v))
    }

    fn min_corner(&self) -> Coord {
        self.min_corner
    }

    fn max_corner(&self) -> Coord {
        self.max_corner
    }
}
