use std::fmt::{self, Display};
use std::time::{Duration, Instant};

use log::{debug, error, info, trace};
use nalgebra as na;
use rand::rngs::StdRng;

use crate::error::PlanError;
use crate::obstacle::ObstacleIndex;
use crate::point::{Coord, Waypoint};
use crate::sampler::{Sampler, SamplingMethod};
use crate::space::Bounds;
use crate::steering::set_distance;
use crate::straighten::straighten;
use crate::tree::{NodeId, NodeSearch, Tree};
use crate::validation::Validator;
use crate::{star, Path, PlanResult};

/// Samples closer than this to their nearest tree node are drawn again.
pub const MIN_NODE_SEPARATION: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Algorithm {
    /// Plain RRT, new nodes hang from their nearest node.
    Rrt,
    /// RRT*, with parent selection and rewiring among the nodes within `neighborhood`.
    RrtStar { neighborhood: f64 },
}

/// What a single tree growing iteration did.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Growth {
    /// The deadline passed before a usable sample was found.
    Stalled,
    Blocked,
    Added(NodeId),
    /// The goal node is in the tree.
    Reached(NodeId),
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Rrt => write!(f, "RRT"),
            Algorithm::RrtStar { .. } => write!(f, "RRT*"),
        }
    }
}

/// A configured planner, see [`crate::PlannerBuilder`]. The planner owns its random source, so
/// a seeded planner replays the same searches.
pub struct Planner<'a, B: ?Sized, O: ?Sized> {
    pub(crate) validator: Validator<'a, B, O>,
    pub(crate) branch_size: f64,
    pub(crate) timeout: Duration,
    pub(crate) sampling: SamplingMethod,
    pub(crate) algorithm: Algorithm,
    pub(crate) straighten: bool,
    pub(crate) rng: StdRng,
}

impl<'a, B, O> Planner<'a, B, O>
where
    B: Bounds + ?Sized,
    O: ObstacleIndex + ?Sized,
{
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn validator(&self) -> &Validator<'a, B, O> {
        &self.validator
    }

    /// Searches for a path from `start` to `goal`. Running out of time is not an error, the
    /// returned [`PlanResult`] simply has no path.
    pub fn generate_path(&mut self, start: Waypoint, goal: Coord) -> Result<PlanResult, PlanError> {
        let started = Instant::now();
        info!(
            "{}: Searching for path from [{:.2}, {:.2}, {:.2}] to [{:.2}, {:.2}, {:.2}] (distance: {:.2}).",
            self.algorithm,
            start.point.x,
            start.point.y,
            start.point.z,
            goal.x,
            goal.y,
            goal.z,
            na::distance(&start.point, &goal),
        );

        let mut tree = Tree::new(start.point);
        let Some(goal_id) = self.build_tree(&mut tree, &goal)? else {
            return Ok(PlanResult {
                result: None,
                n_points: tree.len(),
                elapsed: started.elapsed(),
            });
        };

        let mut waypoints = tree.path_to(goal_id, start.heading)?;
        if self.straighten {
            let before = waypoints.len();
            waypoints = straighten(waypoints, &self.validator);
            debug!("{}: Straightened path from {} to {} waypoints.", self.algorithm, before, waypoints.len());
        }

        let path = Path::new(waypoints);
        info!(
            "{}: Found path with {} waypoints and length {:.2} ({} tree nodes).",
            self.algorithm,
            path.waypoints.len(),
            path.distance,
            tree.len(),
        );

        Ok(PlanResult {
            result: Some(path),
            n_points: tree.len(),
            elapsed: started.elapsed(),
        })
    }

    /// Grows `tree` until it connects to `goal` or the timeout runs out. Returns the goal node.
    pub fn build_tree(&mut self, tree: &mut Tree, goal: &Coord) -> Result<Option<NodeId>, PlanError> {
        let start_time = Instant::now();
        let deadline = start_time + self.timeout;

        if let Some(id) = tree.find(goal) {
            return Ok(Some(id));
        }

        let mut sampler = Sampler::new(self.sampling);
        let mut latest = *tree.point(Tree::ROOT);

        loop {
            let elapsed = start_time.elapsed();
            if elapsed > self.timeout {
                error!(
                    "{}: Timeout limit in build_tree exceeded ({:.3} s > {:.3} s). Ending.",
                    self.algorithm,
                    elapsed.as_secs_f64(),
                    self.timeout.as_secs_f64(),
                );
                return Ok(None);
            }

            match self.grow(tree, &mut sampler, &mut latest, goal, deadline)? {
                Growth::Reached(goal_id) => return Ok(Some(goal_id)),
                Growth::Added(node) => trace!("Added node {} to the tree.", node.index()),
                Growth::Blocked | Growth::Stalled => {}
            }
        }
    }

    /// A single iteration of [`Planner::build_tree`]: samples a candidate, steers towards it and
    /// tries to connect the new node to `goal`. `latest` is moved to every inserted node.
    fn grow(
        &mut self,
        tree: &mut Tree,
        sampler: &mut Sampler,
        latest: &mut Coord,
        goal: &Coord,
        deadline: Instant,
    ) -> Result<Growth, PlanError> {
        let Some((candidate, nearest)) = self.next_candidate(tree, sampler, latest, goal, deadline)? else {
            return Ok(Growth::Stalled);
        };

        // Steering
        let nearest_point = *tree.point(nearest);
        let point = set_distance(&nearest_point, &candidate, self.branch_size);

        if !self.validator.validate_line_path(&nearest_point, &point, true) {
            trace!("Branch to [{:.2}, {:.2}, {:.2}] is blocked.", point.x, point.y, point.z);
            sampler.escalate();
            return Ok(Growth::Blocked);
        }

        let node = match self.algorithm {
            Algorithm::Rrt => {
                let cost = tree.cost(nearest) + na::distance(&nearest_point, &point);
                tree.add_node(point, Some(nearest), cost)
            }
            Algorithm::RrtStar { neighborhood } => {
                // The segments from `point` do not change once it is inserted, so the same
                // neighborhood serves both steps.
                let neighbors = star::points_in_neighborhood(tree, &self.validator, &point, neighborhood);
                let (parent, cost) = star::optimal_parent(tree, &neighbors, &point, nearest);
                let node = tree.add_node(point, Some(parent), cost);
                star::rewire(tree, node, &neighbors);
                node
            }
        };
        *latest = point;

        if point == *goal {
            return Ok(Growth::Reached(node));
        }

        // The goal may be any distance away, as long as the straight line to it is free.
        if self.validator.validate_line_path(&point, goal, true) {
            let cost = tree.cost(node) + na::distance(&point, goal);
            return Ok(Growth::Reached(tree.add_node(*goal, Some(node), cost)));
        }

        Ok(Growth::Added(node))
    }

    /// Draws samples until one is far enough from its nearest tree node. Returns `None` once the
    /// deadline has passed.
    fn next_candidate(
        &mut self,
        tree: &Tree,
        sampler: &mut Sampler,
        latest: &Coord,
        goal: &Coord,
        deadline: Instant,
    ) -> Result<Option<(Coord, NodeId)>, PlanError> {
        loop {
            let Some(candidate) = sampler.sample(&mut self.rng, &self.validator, latest, goal, deadline)? else {
                return Ok(None);
            };

            let nearest = tree.nearest(&candidate);
            if na::distance(tree.point(nearest), &candidate) > MIN_NODE_SEPARATION {
                sampler.reset();
                return Ok(Some((candidate, nearest)));
            }

            sampler.escalate();
            if Instant::now() >= deadline {
                return Ok(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::obstacle::{EmptySpace, Sphere};
    use crate::space::BBox;
    use crate::steering::polyline_length;
    use crate::PlannerBuilder;

    fn coord(x: f64, y: f64, z: f64) -> Coord {
        Coord::new(x, y, z)
    }

    fn bounds() -> BBox {
        BBox::new(coord(0.0, 0.0, 0.0), coord(10.0, 10.0, 10.0))
    }

    fn assert_segments_free<B: Bounds + ?Sized, O: ObstacleIndex + ?Sized>(path: &Path, validator: &Validator<B, O>) {
        for pair in path.waypoints.windows(2) {
            assert!(
                validator.validate_line_path(&pair[0].point, &pair[1].point, false),
                "segment {} -> {} is blocked",
                pair[0].point,
                pair[1].point
            );
        }
    }

    #[test]
    fn empty_world_diagonal() {
        let bounds = bounds();
        let start = Waypoint::with_heading(coord(0.0, 0.0, 0.0), 0.0);
        let goal = coord(10.0, 10.0, 10.0);

        let mut planner = PlannerBuilder::new(&bounds, &EmptySpace)
            .with_branch_size(1.0)
            .with_timeout_secs(5.0)
            .with_seed(42)
            .build()
            .unwrap();
        let result = planner.generate_path(start, goal).unwrap();
        let path = result.result.expect("no path in an empty world");

        assert!(path.distance.is_finite());
        assert_eq!(path.waypoints.first(), Some(&start));
        assert_eq!(path.waypoints.last().map(|w| w.point), Some(goal));
        assert!(path.waypoints.iter().skip(1).all(|w| w.heading.is_none()));
        assert_segments_free(&path, planner.validator());
        assert!(result.n_points >= path.waypoints.len());
    }

    #[test]
    fn straightening_never_lengthens() {
        let bounds = bounds();
        let sphere = Sphere::new(coord(5.0, 5.0, 5.0), 2.0);
        let start = Waypoint::with_heading(coord(0.0, 0.0, 0.0), 0.0);
        let goal = coord(10.0, 10.0, 10.0);

        let plan = |straighten: bool| {
            PlannerBuilder::new(&bounds, &sphere)
                .with_branch_size(1.0)
                .with_timeout_secs(5.0)
                .with_safety_distance(0.5)
                .with_straightening(straighten)
                .with_seed(7)
                .solve(start, goal)
                .unwrap()
                .result
                .expect("no path found")
        };

        let raw = plan(false);
        let straight = plan(true);

        assert!(straight.distance <= raw.distance + 1e-9);
        assert_eq!(straight.waypoints.first(), raw.waypoints.first());
        assert_eq!(straight.waypoints.last(), raw.waypoints.last());
    }

    #[test]
    fn straightening_collapses_free_paths() {
        let bounds = bounds();
        let result = PlannerBuilder::new(&bounds, &EmptySpace)
            .with_branch_size(0.5)
            .with_straightening(true)
            .with_seed(3)
            .solve(Waypoint::with_heading(coord(1.0, 1.0, 1.0), 1.5), coord(9.0, 1.0, 9.0))
            .unwrap();
        let path = result.result.unwrap();

        assert_eq!(path.waypoints.len(), 2);
        assert_eq!(path.waypoints[0].heading, Some(1.5));
        assert!((path.distance - 128f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn straightening_never_lengthens_in_empty_field() {
        let bounds = bounds();
        let start = Waypoint::with_heading(coord(0.0, 0.0, 0.0), 0.0);
        let goal = coord(10.0, 10.0, 10.0);

        for seed in [0, 1, 2, 3] {
            let plan = |straighten: bool| {
                PlannerBuilder::new(&bounds, &EmptySpace)
                    .with_branch_size(1.0)
                    .with_straightening(straighten)
                    .with_seed(seed)
                    .solve(start, goal)
                    .unwrap()
                    .result
                    .expect("no path in an empty world")
            };

            let raw = plan(false);
            let straight = plan(true);

            assert!(raw.distance.is_finite());
            assert!(straight.distance <= raw.distance + 1e-9);
            assert_eq!(straight.waypoints.first(), Some(&start));
            assert_eq!(straight.waypoints.last().map(|w| w.point), Some(goal));
        }
    }

    fn gaussian_planner<'a, O: ObstacleIndex + ?Sized>(
        bounds: &'a BBox,
        obstacles: &'a O,
        inflation: f64,
    ) -> Planner<'a, BBox, O> {
        PlannerBuilder::new(bounds, obstacles)
            .with_branch_size(1.0)
            .with_gaussian_sampling(inflation)
            .with_seed(21)
            .build()
            .unwrap()
    }

    #[test]
    fn close_samples_widen_the_spread_until_one_is_accepted() {
        let bounds = bounds();
        let mut planner = gaussian_planner(&bounds, &EmptySpace, 0.01);
        let center = coord(5.0, 5.0, 5.0);
        let tree = Tree::new(center);
        let mut sampler = Sampler::new(planner.sampling);

        // Around a tree node with a tiny spread, every draw is too close to the node. With the
        // deadline already gone each call gives up after one rejection.
        for expected in [0.02, 0.03, 0.04] {
            let candidate = planner
                .next_candidate(&tree, &mut sampler, &center, &center, Instant::now())
                .unwrap();
            assert_eq!(candidate, None);
            assert!((sampler.sigma_offset() - expected).abs() < 1e-12);
        }

        let far_deadline = Instant::now() + Duration::from_secs(60);
        let (candidate, nearest) = planner
            .next_candidate(&tree, &mut sampler, &center, &center, far_deadline)
            .unwrap()
            .expect("spread never grew past the node separation");
        assert_eq!(nearest, Tree::ROOT);
        assert!(na::distance(&candidate, &center) > MIN_NODE_SEPARATION);
        assert_eq!(sampler.sigma_offset(), 0.01);
    }

    #[test]
    fn blocked_branches_widen_the_spread() {
        let bounds = bounds();
        // Nothing is free, so every candidate comes from the escape valve and its branch fails.
        let everywhere = Sphere::new(coord(5.0, 5.0, 5.0), 100.0);
        let mut planner = gaussian_planner(&bounds, &everywhere, 0.5);
        let mut tree = Tree::new(coord(1.0, 1.0, 1.0));
        let mut sampler = Sampler::new(planner.sampling);
        let mut latest = coord(1.0, 1.0, 1.0);
        let goal = coord(9.0, 9.0, 9.0);
        let far_deadline = Instant::now() + Duration::from_secs(60);

        for _ in 0..3 {
            let growth = planner
                .grow(&mut tree, &mut sampler, &mut latest, &goal, far_deadline)
                .unwrap();
            assert_eq!(growth, Growth::Blocked);
            // Reset by the accepted candidate, then widened once by the blocked branch.
            assert!((sampler.sigma_offset() - 1.0).abs() < 1e-12);
        }
        assert_eq!(tree.len(), 1);
        assert_eq!(latest, coord(1.0, 1.0, 1.0));
    }

    #[test]
    fn grow_moves_latest_and_reaches_visible_goals() {
        let bounds = bounds();
        let mut planner = gaussian_planner(&bounds, &EmptySpace, 0.5);
        let mut tree = Tree::new(coord(1.0, 1.0, 1.0));
        let mut sampler = Sampler::new(planner.sampling);
        let mut latest = coord(1.0, 1.0, 1.0);
        let goal = coord(9.0, 9.0, 9.0);
        let far_deadline = Instant::now() + Duration::from_secs(60);

        let growth = planner
            .grow(&mut tree, &mut sampler, &mut latest, &goal, far_deadline)
            .unwrap();

        let Growth::Reached(goal_id) = growth else {
            panic!("goal is visible from anywhere, got {:?}", growth);
        };
        assert_eq!(tree.point(goal_id), &goal);
        assert_eq!(tree.len(), 3);
        assert_ne!(latest, coord(1.0, 1.0, 1.0));
        assert_eq!(tree.parent(goal_id).map(|id| *tree.point(id)), Some(latest));
        assert_eq!(sampler.sigma_offset(), 0.5);
    }

    fn sphere_between(algorithm: Option<f64>, sampling: SamplingMethod) {
        let bounds = bounds();
        let center = coord(5.0, 5.0, 5.0);
        let sphere = Sphere::new(center, 2.0);

        let mut builder = PlannerBuilder::new(&bounds, &sphere)
            .with_safety_distance(0.5)
            .with_branch_size(1.0)
            .with_timeout_secs(10.0)
            .with_sampling(sampling)
            .with_seed(5);
        if let Some(neighborhood) = algorithm {
            builder = builder.with_rrt_star_neighborhood(neighborhood);
        }
        let mut planner = builder.build().unwrap();

        let path = planner
            .generate_path(Waypoint::with_heading(coord(0.0, 5.0, 5.0), 0.0), coord(10.0, 5.0, 5.0))
            .unwrap()
            .result
            .expect("no path around the sphere");

        for waypoint in &path.waypoints {
            assert!(na::distance(&waypoint.point, &center) > 2.6, "{} is too close", waypoint.point);
        }
        assert_segments_free(&path, planner.validator());
        assert!((path.distance - polyline_length(path.waypoints.iter().map(|w| &w.point))).abs() < 1e-9);
    }

    #[test]
    fn rrt_goes_around_sphere() {
        sphere_between(None, SamplingMethod::Uniform);
    }

    #[test]
    fn rrt_star_goes_around_sphere() {
        sphere_between(Some(2.0), SamplingMethod::Uniform);
    }

    #[test]
    fn gaussian_rrt_goes_around_sphere() {
        sphere_between(None, SamplingMethod::Gaussian { stddev_inflation: 0.5 });
    }

    #[test]
    fn gaussian_rrt_star_goes_around_sphere() {
        sphere_between(Some(2.0), SamplingMethod::Gaussian { stddev_inflation: 0.5 });
    }

    #[test]
    fn unreachable_goal_times_out() {
        let bounds = bounds();
        let timeout = Duration::from_millis(10);

        for sampling in [SamplingMethod::Uniform, SamplingMethod::Gaussian { stddev_inflation: 1.0 }] {
            let started = Instant::now();
            let result = PlannerBuilder::new(&bounds, &EmptySpace)
                .with_timeout(timeout)
                .with_branch_size(1.0)
                .with_sampling(sampling)
                .with_seed(1)
                .solve(Waypoint::new(coord(5.0, 5.0, 5.0)), coord(20.0, 5.0, 5.0))
                .unwrap();

            assert!(result.result.is_none());
            assert!(result.n_points >= 1);
            assert!(started.elapsed() < Duration::from_secs(1));
        }
    }

    #[test]
    fn blocked_world_times_out() {
        let bounds = bounds();
        let everywhere = Sphere::new(coord(5.0, 5.0, 5.0), 100.0);

        let result = PlannerBuilder::new(&bounds, &everywhere)
            .with_timeout_secs(0.01)
            .with_seed(1)
            .solve(Waypoint::new(coord(1.0, 1.0, 1.0)), coord(9.0, 9.0, 9.0))
            .unwrap();

        assert!(result.result.is_none());
        assert_eq!(result.n_points, 1);
    }

    #[test]
    fn start_equal_to_goal() {
        let bounds = bounds();
        let start = Waypoint::with_heading(coord(2.0, 2.0, 2.0), 0.3);

        let path = PlannerBuilder::new(&bounds, &EmptySpace)
            .with_seed(1)
            .solve(start, start.point)
            .unwrap()
            .result
            .unwrap();

        assert_eq!(path.waypoints, vec![start]);
        assert_eq!(path.distance, 0.0);
    }

    #[test]
    fn rrt_costs_accumulate_along_branches() {
        let bounds = bounds();
        let sphere = Sphere::new(coord(5.0, 5.0, 5.0), 2.0);
        let mut planner = PlannerBuilder::new(&bounds, &sphere)
            .with_branch_size(1.0)
            .with_seed(9)
            .build()
            .unwrap();

        let mut tree = Tree::new(coord(0.0, 5.0, 5.0));
        let goal = planner.build_tree(&mut tree, &coord(10.0, 5.0, 5.0)).unwrap().unwrap();

        for (id, node) in tree.iter() {
            match node.parent() {
                None => assert_eq!(id, Tree::ROOT),
                Some(parent) => {
                    let edge = na::distance(tree.point(parent), node.point());
                    assert!((node.cost() - (tree.cost(parent) + edge)).abs() < 1e-9);
                }
            }
        }
        let path = tree.path_to(goal, None).unwrap();
        let length = polyline_length(path.iter().map(|w| &w.point));
        assert!((tree.cost(goal) - length).abs() < 1e-9);
    }

    #[test]
    fn rrt_star_tree_stays_acyclic() {
        let bounds = bounds();
        let sphere = Sphere::new(coord(5.0, 5.0, 5.0), 2.0);
        let mut planner = PlannerBuilder::new(&bounds, &sphere)
            .with_branch_size(1.0)
            .with_rrt_star_neighborhood(2.5)
            .with_seed(13)
            .build()
            .unwrap();

        let mut tree = Tree::new(coord(0.0, 5.0, 5.0));
        planner.build_tree(&mut tree, &coord(10.0, 5.0, 5.0)).unwrap().unwrap();

        for (id, node) in tree.iter() {
            assert!(tree.path_to(id, None).is_ok());
            if let Some(parent) = node.parent() {
                // Stored costs only decrease, so a child always costs more than its parent.
                assert!(node.cost() > tree.cost(parent));
            }
        }
    }
}
