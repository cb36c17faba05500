use std::f64::consts::PI;

use nalgebra as na;

use crate::Coord;

/// `n` points spread evenly over the surface of a sphere, placed along a golden angle spiral.
pub fn sphere_surface(center: Coord, radius: f64, n: usize) -> Vec<Coord> {
    let golden_angle = PI * (3.0 - 5f64.sqrt());

    (0..n)
        .map(|i| {
            // Heights are sampled at the middle of `n` equal bands.
            let z = 1.0 - (2 * i + 1) as f64 / n as f64;
            let r = (1.0 - z * z).sqrt();
            let theta = golden_angle * i as f64;
            center + na::Vector3::new(r * theta.cos(), r * theta.sin(), z) * radius
        })
        .collect()
}

/// Grid points on the six faces of an axis aligned box, no further than `spacing` apart along
/// each axis. Every corner and edge point appears once.
pub fn box_surface(corner: Coord, size: na::Vector3<f64>, spacing: f64) -> Vec<Coord> {
    let steps = size.map(|len| (len / spacing).ceil().max(1.0) as usize);
    let delta = size.component_div(&na::Vector3::new(steps.x as f64, steps.y as f64, steps.z as f64));

    let mut points = Vec::new();
    for i in 0..=steps.x {
        for j in 0..=steps.y {
            for k in 0..=steps.z {
                let on_face = i == 0 || i == steps.x || j == 0 || j == steps.y || k == 0 || k == steps.z;
                if on_face {
                    let offset = na::Vector3::new(i as f64, j as f64, k as f64).component_mul(&delta);
                    points.push(corner + offset);
                }
            }
        }
    }

    points
}
