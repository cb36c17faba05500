use crate::obstacle::ObstacleIndex;
use crate::point::Coord;
use crate::space::Bounds;

/// Extra clearance added on top of the configured safety distance.
pub const SAFETY_MARGIN: f64 = 0.1;

/// Default step used when marching along a segment.
pub const DEFAULT_DISCRETIZATION: f64 = 0.1;

/// Answers whether points and straight segments are free, given the world bounds and the
/// obstacle index.
///
/// Segment checks are sampled: obstacles thinner than `discretization` can slip between two
/// samples.
pub struct Validator<'a, B: ?Sized, O: ?Sized> {
    bounds: &'a B,
    obstacles: &'a O,
    safety_distance: f64,
    discretization: f64,
}

impl<'a, B, O> Validator<'a, B, O>
where
    B: Bounds + ?Sized,
    O: ObstacleIndex + ?Sized,
{
    pub fn new(bounds: &'a B, obstacles: &'a O, safety_distance: f64) -> Self {
        Validator {
            bounds,
            obstacles,
            safety_distance,
            discretization: DEFAULT_DISCRETIZATION,
        }
    }

    pub fn with_discretization(mut self, discretization: f64) -> Self {
        self.discretization = discretization;
        self
    }

    pub fn bounds(&self) -> &'a B {
        self.bounds
    }

    pub fn discretization(&self) -> f64 {
        self.discretization
    }

    pub fn point_valid(&self, p: &Coord, check_bounds: bool) -> bool {
        if check_bounds && !self.bounds.contains(p) {
            return false;
        }

        self.obstacles.nearest_distance(p) > self.safety_distance + SAFETY_MARGIN
    }

    /// Marches from `from` to `to` in steps of `discretization`, then checks `to` itself.
    pub fn validate_line_path(&self, from: &Coord, to: &Coord, check_bounds: bool) -> bool {
        let from_to = to - from;
        let len = from_to.norm();

        if len > 0.0 {
            let dir = from_to / len;
            let mut len_ptr = 0.0;
            while len_ptr < len {
                if !self.point_valid(&(from + dir * len_ptr), check_bounds) {
                    return false;
                }
                len_ptr += self.discretization;
            }
        }

        self.point_valid(to, check_bounds)
    }
}
