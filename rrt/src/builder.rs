use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{ConfigError, PlanError};
use crate::obstacle::ObstacleIndex;
use crate::planner::{Algorithm, Planner};
use crate::point::{Coord, Waypoint};
use crate::sampler::SamplingMethod;
use crate::space::Bounds;
use crate::validation::{Validator, DEFAULT_DISCRETIZATION};
use crate::PlanResult;

/// Collects the planner configuration. Every option has a default, see the `get_*` methods,
/// and `build` checks the whole bundle before handing out a [`Planner`].
pub struct PlannerBuilder<'a, B: ?Sized, O: ?Sized> {
    bounds: &'a B,
    obstacles: &'a O,
    safety_distance: Option<f64>,
    timeout_secs: Option<f64>,
    branch_size: Option<f64>,
    sampling: Option<SamplingMethod>,
    rrt_star_neighborhood: Option<f64>,
    straighten: bool,
    line_discretization: Option<f64>,
    seed: Option<u64>,
}

impl<'a, B, O> PlannerBuilder<'a, B, O>
where
    B: Bounds + ?Sized,
    O: ObstacleIndex + ?Sized,
{
    pub const DEFAULT_TIMEOUT_SECS: f64 = 1.0;

    pub fn new(bounds: &'a B, obstacles: &'a O) -> PlannerBuilder<'a, B, O> {
        PlannerBuilder {
            bounds,
            obstacles,
            safety_distance: None,
            timeout_secs: None,
            branch_size: None,
            sampling: None,
            rrt_star_neighborhood: None,
            straighten: false,
            line_discretization: None,
            seed: None,
        }
    }

    pub fn with_safety_distance(mut self, safety_distance: f64) -> Self {
        self.safety_distance.replace(safety_distance);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs.replace(timeout.as_secs_f64());
        self
    }

    pub fn with_timeout_secs(mut self, secs: f64) -> Self {
        self.timeout_secs.replace(secs);
        self
    }

    pub fn with_branch_size(mut self, branch_size: f64) -> Self {
        self.branch_size.replace(branch_size);
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingMethod) -> Self {
        self.sampling.replace(sampling);
        self
    }

    pub fn with_uniform_sampling(self) -> Self {
        self.with_sampling(SamplingMethod::Uniform)
    }

    pub fn with_gaussian_sampling(self, stddev_inflation: f64) -> Self {
        self.with_sampling(SamplingMethod::Gaussian { stddev_inflation })
    }

    /// Switches the planner to RRT*.
    pub fn with_rrt_star_neighborhood(mut self, radius: f64) -> Self {
        self.rrt_star_neighborhood.replace(radius);
        self
    }

    pub fn with_straightening(mut self, straighten: bool) -> Self {
        self.straighten = straighten;
        self
    }

    pub fn with_line_discretization(mut self, step: f64) -> Self {
        self.line_discretization.replace(step);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed.replace(seed);
        self
    }

    pub fn get_safety_distance(&self) -> f64 {
        self.safety_distance.unwrap_or(0.0)
    }

    pub fn get_timeout_secs(&self) -> f64 {
        self.timeout_secs.unwrap_or(Self::DEFAULT_TIMEOUT_SECS)
    }

    pub fn get_branch_size(&self) -> f64 {
        self.branch_size.unwrap_or_else(|| {
            nalgebra::distance(&self.bounds.min_corner(), &self.bounds.max_corner()) / 10.0
        })
    }

    pub fn get_sampling(&self) -> SamplingMethod {
        self.sampling.unwrap_or_default()
    }

    pub fn get_algorithm(&self) -> Algorithm {
        match self.rrt_star_neighborhood {
            Some(neighborhood) => Algorithm::RrtStar { neighborhood },
            None => Algorithm::Rrt,
        }
    }

    pub fn get_straightening(&self) -> bool {
        self.straighten
    }

    pub fn get_line_discretization(&self) -> f64 {
        self.line_discretization.unwrap_or(DEFAULT_DISCRETIZATION)
    }

    fn check(&self) -> Result<Duration, ConfigError> {
        let min = self.bounds.min_corner();
        let max = self.bounds.max_corner();
        if min.iter().chain(max.iter()).any(|v| !v.is_finite()) {
            return Err(ConfigError::NonFiniteBounds { min, max });
        }
        if min.iter().zip(max.iter()).any(|(lo, hi)| !(lo <= hi)) {
            return Err(ConfigError::InvertedBounds { min, max });
        }

        let safety_distance = self.get_safety_distance();
        if !(safety_distance.is_finite() && safety_distance >= 0.0) {
            return Err(ConfigError::NegativeSafetyDistance(safety_distance));
        }

        let timeout_secs = self.get_timeout_secs();
        let timeout = Duration::try_from_secs_f64(timeout_secs)
            .ok()
            .filter(|timeout| !timeout.is_zero())
            .ok_or(ConfigError::InvalidTimeout(timeout_secs))?;

        let branch_size = self.get_branch_size();
        if !(branch_size > 0.0) {
            return Err(ConfigError::NonPositiveBranchSize(branch_size));
        }

        if let SamplingMethod::Gaussian { stddev_inflation } = self.get_sampling() {
            if !(stddev_inflation > 0.0) {
                return Err(ConfigError::NonPositiveInflation(stddev_inflation));
            }
        }

        if let Algorithm::RrtStar { neighborhood } = self.get_algorithm() {
            if !(neighborhood > 0.0) {
                return Err(ConfigError::NonPositiveNeighborhood(neighborhood));
            }
        }

        let step = self.get_line_discretization();
        if !(step > 0.0) {
            return Err(ConfigError::NonPositiveDiscretization(step));
        }

        Ok(timeout)
    }

    pub fn build(self) -> Result<Planner<'a, B, O>, ConfigError> {
        let timeout = self.check()?;

        let validator = Validator::new(self.bounds, self.obstacles, self.get_safety_distance())
            .with_discretization(self.get_line_discretization());
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Planner {
            validator,
            branch_size: self.get_branch_size(),
            timeout,
            sampling: self.get_sampling(),
            algorithm: self.get_algorithm(),
            straighten: self.straighten,
            rng,
        })
    }

    /// Builds a planner and runs it once.
    pub fn solve(self, start: Waypoint, goal: Coord) -> Result<PlanResult, PlanError> {
        let mut planner = self.build()?;
        planner.generate_path(start, goal)
    }
}
