use nalgebra as na;

use crate::point::Coord;

/// Caps the distance of `to` from `from` at `length`. When `to` is already close enough it is
/// returned unchanged, otherwise the result lies on the segment at exactly `length` from `from`.
pub fn set_distance(from: &Coord, to: &Coord, length: f64) -> Coord {
    let vec = to - from;
    let norm = vec.norm();
    if norm <= length {
        return *to;
    }

    from + vec * (length / norm)
}

/// Summed euclidean length of a polyline.
pub fn polyline_length<'a, I>(points: I) -> f64
where
    I: IntoIterator<Item = &'a Coord>,
{
    use itertools::Itertools;

    points
        .into_iter()
        .tuple_windows()
        .map(|(a, b)| na::distance(a, b))
        .sum()
}
