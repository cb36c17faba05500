use nalgebra as na;

/// A position in the planning space. Also the identity of a tree node.
pub type Coord = na::Point3<f64>;

/// An element of a planned path. Only the first waypoint of a path carries a heading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub point: Coord,
    pub heading: Option<f64>,
}

impl Waypoint {
    pub fn new(point: Coord) -> Self {
        Waypoint { point, heading: None }
    }

    pub fn with_heading(point: Coord, heading: f64) -> Self {
        Waypoint {
            point,
            heading: Some(heading),
        }
    }
}

impl From<Coord> for Waypoint {
    #[inline]
    fn from(point: Coord) -> Self {
        Waypoint::new(point)
    }
}

/// Key used for exact coordinate lookups. Both zeros map to the same key, so that `-0.0` and
/// `0.0` are the same node.
pub(crate) fn coord_key(p: &Coord) -> [u64; 3] {
    let bits = |v: f64| if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() };
    [bits(p.x), bits(p.y), bits(p.z)]
}
