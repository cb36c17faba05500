use nalgebra as na;

use crate::obstacle::ObstacleIndex;
use crate::point::Coord;
use crate::space::Bounds;
use crate::tree::{NodeId, NodeSearch, Tree};
use crate::validation::Validator;

/// Nodes strictly closer than `radius` to `point` that can also be reached from it in a straight
/// line. Every candidate costs a full segment validation, so this is linear in the tree size
/// times the validation cost.
pub fn points_in_neighborhood<B, O>(
    tree: &Tree,
    validator: &Validator<B, O>,
    point: &Coord,
    radius: f64,
) -> Vec<NodeId>
where
    B: Bounds + ?Sized,
    O: ObstacleIndex + ?Sized,
{
    tree.within(point, radius)
        .into_iter()
        .filter(|&id| validator.validate_line_path(point, tree.point(id), true))
        .collect()
}

/// Picks the parent that reaches `point` with the lowest cost. Starts from `nearest`, and only a
/// strictly cheaper neighbor replaces the current choice.
pub fn optimal_parent(tree: &Tree, neighbors: &[NodeId], point: &Coord, nearest: NodeId) -> (NodeId, f64) {
    let mut parent = nearest;
    let mut cost = tree.cost(nearest) + na::distance(tree.point(nearest), point);

    for &neighbor in neighbors {
        let new_cost = tree.cost(neighbor) + na::distance(tree.point(neighbor), point);
        if new_cost < cost {
            parent = neighbor;
            cost = new_cost;
        }
    }

    (parent, cost)
}

///
/// Re-parents every neighbor of `node` that becomes strictly cheaper to reach through it.
///
/// NOTE: The new cost is not propagated to the descendants of a rewired neighbor, their stored
/// costs stay as they were until they get rewired themselves. Since stored costs only ever go
/// down, every node still costs strictly more than its parent, which is what keeps rewiring from
/// creating cycles.
///
pub fn rewire(tree: &mut Tree, node: NodeId, neighbors: &[NodeId]) {
    let node_cost = tree.cost(node);
    let node_point = *tree.point(node);

    for &neighbor in neighbors {
        if neighbor == node {
            continue;
        }

        let rewired_cost = node_cost + na::distance(tree.point(neighbor), &node_point);
        if rewired_cost < tree.cost(neighbor) {
            tree.rewire(neighbor, Some(node), rewired_cost);
        }
    }
}
