use nalgebra as na;

use kd_tree::visitor::NearestVisitor;
use kd_tree::KDTree;

use crate::Coord;

const HEADER: &str = "<number of points>";

/// Parses a point cloud of the form
///
/// ```text
/// <number of points>
/// 2
/// 1.0, 2.0, 3.0
/// -0.5, 4.25, 0.0
/// ```
///
/// Blank lines and lines starting with `#` are skipped. Returns `None` if the header is
/// missing, a row does not hold exactly three numbers, or the row count does not match.
pub fn parse_point_cloud(s: &str) -> Option<Vec<Coord>> {
    let mut lines = s
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'));

    if lines.next()? != HEADER {
        return None;
    }

    let n_points: usize = lines.next()?.parse().ok()?;
    let points = lines
        .map(|line| {
            let coords: Vec<f64> = line
                .split(',')
                .map(|coord| coord.trim().parse().ok())
                .collect::<Option<_>>()?;

            match coords[..] {
                [x, y, z] => Some(Coord::new(x, y, z)),
                _ => None,
            }
        })
        .collect::<Option<Vec<_>>>()?;

    (points.len() == n_points).then_some(points)
}

/// Drops points closer than `min_spacing` to a point kept before them. The first point of every
/// cluster survives, so the result depends on the input order.
pub fn thin_points<I>(points: I, min_spacing: f64) -> Vec<Coord>
where
    I: IntoIterator<Item = Coord>,
{
    let mut kept: KDTree<Coord, 3> = KDTree::new();

    for p in points {
        let too_close = kept
            .query(&p, NearestVisitor::new())
            .map_or(false, |nearest| na::distance(nearest, &p) < min_spacing);

        if !too_close {
            kept.insert(p);
        }
    }

    kept.iter().copied().collect()
}

/// Balanced obstacle index over `points`.
pub fn build_index(points: Vec<Coord>) -> KDTree<Coord, 3> {
    KDTree::from_vec(points)
}
