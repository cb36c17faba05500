use log::info;
use nalgebra as na;

use rrt::{BBox, Coord, PlannerBuilder, Waypoint};

fn point3(x: f64, y: f64, z: f64) -> Coord {
    Coord::new(x, y, z)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let bounds = BBox::new(point3(0.0, 0.0, 0.0), point3(10.0, 10.0, 10.0));

    // A sphere and a wall, as a mapping pipeline would see them.
    let mut cloud = map_gen::sphere_surface(point3(5.0, 5.0, 5.0), 2.0, 2000);
    cloud.extend(map_gen::box_surface(point3(7.5, 0.0, 0.0), na::Vector3::new(0.5, 6.0, 10.0), 0.2));
    let cloud = map_gen::thin_points(cloud, 0.1);
    info!("Obstacle map has {} points.", cloud.len());
    let obstacles = map_gen::build_index(cloud);

    let start = Waypoint::with_heading(point3(0.0, 5.0, 5.0), 0.0);
    let goal = point3(10.0, 2.0, 5.0);

    let result = PlannerBuilder::new(&bounds, &obstacles)
        .with_safety_distance(0.3)
        .with_branch_size(1.0)
        .with_timeout_secs(5.0)
        .with_gaussian_sampling(1.0)
        .with_rrt_star_neighborhood(2.0)
        .with_straightening(true)
        .solve(start, goal)?;

    info!("Planning took {:?} with {} tree nodes.", result.elapsed, result.n_points);
    match result.into_parts() {
        (Some(waypoints), Some(length)) => {
            for waypoint in &waypoints {
                println!("{:.3} {:.3} {:.3}", waypoint.point.x, waypoint.point.y, waypoint.point.z);
            }
            println!("length: {:.3}", length);
        }
        _ => println!("no path found"),
    }

    Ok(())
}
