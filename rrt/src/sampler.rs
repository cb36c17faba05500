use std::time::Instant;

use nalgebra as na;
use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use statrs::distribution::Normal;

use crate::obstacle::ObstacleIndex;
use crate::point::Coord;
use crate::space::Bounds;
use crate::validation::Validator;

/// Largest multiplier the gaussian spread may be inflated to.
pub const MAX_SIGMA_OFFSET: f64 = 5.0;

/// Axes whose spread is below this are considered degenerate...
pub const MIN_SPREAD: f64 = 1e-3;

/// ...and get this spread instead.
pub const DEGENERATE_SPREAD: f64 = 0.1;

/// Number of rejected gaussian samples after which the next draw is returned regardless.
pub const MAX_GAUSSIAN_ATTEMPTS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplingMethod {
    /// Uniform over the bounds volume.
    Uniform,
    /// Normal distribution around the segment joining the latest accepted node and the goal.
    /// `stddev_inflation` is both the initial spread multiplier and its growth step.
    Gaussian { stddev_inflation: f64 },
}

impl Default for SamplingMethod {
    fn default() -> Self {
        SamplingMethod::Uniform
    }
}

/// Sampling state of a single planning call.
#[derive(Debug, Clone)]
pub struct Sampler {
    method: SamplingMethod,
    sigma_offset: f64,
}

impl Sampler {
    pub fn new(method: SamplingMethod) -> Self {
        let sigma_offset = match method {
            SamplingMethod::Uniform => 0.0,
            SamplingMethod::Gaussian { stddev_inflation } => stddev_inflation,
        };
        Sampler { method, sigma_offset }
    }

    pub fn method(&self) -> SamplingMethod {
        self.method
    }

    pub fn sigma_offset(&self) -> f64 {
        self.sigma_offset
    }

    /// Widens the gaussian spread after a failed attempt. No-op for uniform sampling.
    pub fn escalate(&mut self) {
        if let SamplingMethod::Gaussian { stddev_inflation } = self.method {
            self.sigma_offset = (self.sigma_offset + stddev_inflation).min(MAX_SIGMA_OFFSET);
        }
    }

    pub fn reset(&mut self) {
        if let SamplingMethod::Gaussian { stddev_inflation } = self.method {
            self.sigma_offset = stddev_inflation;
        }
    }

    /// Draws a candidate point. `latest` and `goal` only matter for gaussian sampling.
    ///
    /// Returns `Ok(None)` if `deadline` passes while uniform sampling is still looking for a free
    /// point.
    pub fn sample<R, B, O>(
        &self,
        rng: &mut R,
        validator: &Validator<B, O>,
        latest: &Coord,
        goal: &Coord,
        deadline: Instant,
    ) -> Result<Option<Coord>, statrs::StatsError>
    where
        R: Rng + ?Sized,
        B: Bounds + ?Sized,
        O: ObstacleIndex + ?Sized,
    {
        match self.method {
            SamplingMethod::Uniform => Ok(sample_uniform(rng, validator, deadline)),
            SamplingMethod::Gaussian { .. } => {
                sample_gaussian(rng, validator, latest, goal, self.sigma_offset).map(Some)
            }
        }
    }
}

/// Uniform sample inside the bounds that is also clear of obstacles.
pub fn sample_uniform<R, B, O>(rng: &mut R, validator: &Validator<B, O>, deadline: Instant) -> Option<Coord>
where
    R: Rng + ?Sized,
    B: Bounds + ?Sized,
    O: ObstacleIndex + ?Sized,
{
    let min = validator.bounds().min_corner();
    let max = validator.bounds().max_corner();
    let axes = [
        Uniform::new_inclusive(min.x, max.x),
        Uniform::new_inclusive(min.y, max.y),
        Uniform::new_inclusive(min.z, max.z),
    ];

    loop {
        let p = Coord::new(axes[0].sample(rng), axes[1].sample(rng), axes[2].sample(rng));
        if validator.point_valid(&p, true) {
            return Some(p);
        }

        if Instant::now() >= deadline {
            return None;
        }
    }
}

/// Element-wise mean and population standard deviation of two points, with degenerate axes
/// floored to [`DEGENERATE_SPREAD`].
pub fn gaussian_params(a: &Coord, b: &Coord) -> (Coord, na::Vector3<f64>) {
    let mean = na::center(a, b);
    let sigma = (b - a).abs() / 2.0;
    let sigma = sigma.map(|s| if s < MIN_SPREAD { DEGENERATE_SPREAD } else { s });
    (mean, sigma)
}

/// Goal-biased sample. After [`MAX_GAUSSIAN_ATTEMPTS`] rejections the next draw is returned even
/// if it is not valid; the planner will then reject it as an invalid branch.
pub fn sample_gaussian<R, B, O>(
    rng: &mut R,
    validator: &Validator<B, O>,
    latest: &Coord,
    goal: &Coord,
    sigma_offset: f64,
) -> Result<Coord, statrs::StatsError>
where
    R: Rng + ?Sized,
    B: Bounds + ?Sized,
    O: ObstacleIndex + ?Sized,
{
    let (mean, sigma) = gaussian_params(latest, goal);
    let std_dev = sigma.max() * sigma_offset;
    let axes = [
        Normal::new(mean.x, std_dev)?,
        Normal::new(mean.y, std_dev)?,
        Normal::new(mean.z, std_dev)?,
    ];

    let mut attempts = 0;
    loop {
        let p = Coord::new(axes[0].sample(rng), axes[1].sample(rng), axes[2].sample(rng));
        attempts += 1;
        if validator.point_valid(&p, true) || attempts > MAX_GAUSSIAN_ATTEMPTS {
            return Ok(p);
        }
    }
}
