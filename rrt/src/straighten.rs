use crate::obstacle::ObstacleIndex;
use crate::point::Waypoint;
use crate::space::Bounds;
use crate::validation::Validator;

/// Greedy shortcut removal. Keeps leading waypoints until the segment from the current one to the
/// last waypoint is obstacle free, then jumps straight to the end. Bounds are not checked.
///
/// Paths with two waypoints or less are returned as they are.
pub fn halve_and_test<B, O>(path: &[Waypoint], validator: &Validator<B, O>) -> Vec<Waypoint>
where
    B: Bounds + ?Sized,
    O: ObstacleIndex + ?Sized,
{
    let Some(last) = path.last() else {
        return Vec::new();
    };

    let mut straightened = Vec::with_capacity(path.len());
    let mut rest = path;
    while rest.len() > 2 {
        let first = rest[0];
        straightened.push(first);
        if validator.validate_line_path(&first.point, &last.point, false) {
            straightened.push(*last);
            return straightened;
        }
        rest = &rest[1..];
    }

    straightened.extend_from_slice(rest);
    straightened
}

/// Two rounds of [`halve_and_test`], each one forward and then on the reversed path, as the
/// greedy pass misses shortcuts depending on the direction it runs in.
pub fn straighten<B, O>(path: Vec<Waypoint>, validator: &Validator<B, O>) -> Vec<Waypoint>
where
    B: Bounds + ?Sized,
    O: ObstacleIndex + ?Sized,
{
    let mut path = path;
    for _ in 0..2 {
        path = halve_and_test(&path, validator);

        path.reverse();
        path = halve_and_test(&path, validator);
        path.reverse();
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obstacle::{EmptySpace, Sphere};
    use crate::point::Coord;
    use crate::space::BBox;
    use crate::steering::polyline_length;

    fn waypoints(points: &[(f64, f64, f64)]) -> Vec<Waypoint> {
        points
            .iter()
            .map(|&(x, y, z)| Waypoint::new(Coord::new(x, y, z)))
            .collect()
    }

    fn length(path: &[Waypoint]) -> f64 {
        polyline_length(path.iter().map(|w| &w.point))
    }

    fn bounds() -> BBox {
        BBox::new(Coord::new(0.0, 0.0, 0.0), Coord::new(10.0, 10.0, 10.0))
    }

    #[test]
    fn short_paths_are_unchanged() {
        let bounds = bounds();
        let sphere = Sphere::new(Coord::new(5.0, 5.0, 5.0), 1.0);
        let validator = Validator::new(&bounds, &sphere, 0.0);

        // Even if the single segment is blocked.
        let path = waypoints(&[(0.0, 5.0, 5.0), (10.0, 5.0, 5.0)]);
        assert_eq!(halve_and_test(&path, &validator), path);
        assert_eq!(straighten(path.clone(), &validator), path);

        let path = waypoints(&[(0.0, 5.0, 5.0)]);
        assert_eq!(straighten(path.clone(), &validator), path);
    }

    #[test]
    fn free_paths_collapse_to_endpoints() {
        let bounds = bounds();
        let validator = Validator::new(&bounds, &EmptySpace, 0.0);

        let mut path = waypoints(&[(0.0, 0.0, 0.0), (1.0, 3.0, 0.0), (4.0, 1.0, 2.0), (6.0, 6.0, 6.0), (10.0, 10.0, 10.0)]);
        path[0].heading = Some(1.0);

        let straightened = straighten(path.clone(), &validator);
        assert_eq!(straightened, vec![path[0], path[4]]);
        assert_eq!(straightened[0].heading, Some(1.0));
    }

    #[test]
    fn obstacles_keep_detours() {
        let bounds = bounds();
        let sphere = Sphere::new(Coord::new(5.0, 5.0, 5.0), 1.0);
        let validator = Validator::new(&bounds, &sphere, 0.0);

        let path = waypoints(&[
            (0.0, 5.0, 5.0),
            (1.0, 5.5, 5.0),
            (3.0, 8.0, 5.0),
            (5.0, 8.0, 5.0),
            (7.0, 8.0, 5.0),
            (9.0, 5.5, 5.0),
            (10.0, 5.0, 5.0),
        ]);

        let straightened = straighten(path.clone(), &validator);
        assert_eq!(straightened.first(), path.first());
        assert_eq!(straightened.last(), path.last());
        assert!(straightened.len() < path.len());
        assert!(straightened.len() > 2);
        assert!(length(&straightened) <= length(&path));

        for pair in straightened.windows(2) {
            assert!(validator.validate_line_path(&pair[0].point, &pair[1].point, false));
        }
    }
}
