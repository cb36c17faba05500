use std::collections::HashMap;

use nalgebra as na;

use crate::error::TreeError;
use crate::point::{coord_key, Coord, Waypoint};

/// Handle to a node of a [`Tree`]. Handles are assigned at insertion and stay valid for the
/// lifetime of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) p: Coord,
    pub(crate) parent: Option<NodeId>,
    pub(crate) cost: f64,
}

impl Node {
    #[inline(always)]
    pub fn point(&self) -> &Coord {
        &self.p
    }

    #[inline(always)]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline(always)]
    pub fn cost(&self) -> f64 {
        self.cost
    }
}

/// Nearest neighbour queries over the nodes of a tree. Kept behind a trait so the linear scans
/// can be swapped for a spatial index.
pub trait NodeSearch {
    /// The node closest to `p`. The first node found wins ties.
    fn nearest(&self, p: &Coord) -> NodeId;

    /// Every node strictly closer than `radius` to `p`, in insertion order.
    fn within(&self, p: &Coord, radius: f64) -> Vec<NodeId>;
}

/// A rooted tree of sampled coordinates. Every node stores its parent and the accumulated cost
/// of reaching it from the root.
///
/// The tree itself never checks that a parent exists, nor that the structure stays acyclic.
/// That is up to the planner.
#[derive(Clone, Debug)]
pub struct Tree {
    nodes: Vec<Node>,
    index: HashMap<[u64; 3], NodeId>,
}

impl Tree {
    pub const ROOT: NodeId = NodeId(0);

    pub fn new(root: Coord) -> Tree {
        let mut tree = Tree {
            nodes: Vec::new(),
            index: HashMap::new(),
        };
        tree.add_node(root, None, 0.0);
        tree
    }

    /// Inserts `p`, or overwrites the entry already stored for it.
    pub fn add_node(&mut self, p: Coord, parent: Option<NodeId>, cost: f64) -> NodeId {
        let key = coord_key(&p);
        if let Some(&id) = self.index.get(&key) {
            self.rewire(id, parent, cost);
            return id;
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { p, parent, cost });
        self.index.insert(key, id);
        id
    }

    /// Changes the parent and cost of an existing node.
    pub fn rewire(&mut self, id: NodeId, parent: Option<NodeId>, cost: f64) {
        let node = &mut self.nodes[id.0];
        node.parent = parent;
        node.cost = cost;
    }

    pub fn find(&self, p: &Coord) -> Option<NodeId> {
        self.index.get(&coord_key(p)).copied()
    }

    pub fn get_parent(&self, p: &Coord) -> Result<Option<Coord>, TreeError> {
        let id = self.find(p).ok_or(TreeError::KeyNotFound(*p))?;
        Ok(self.parent(id).map(|parent| *self.point(parent)))
    }

    pub fn get_cost(&self, p: &Coord) -> Result<f64, TreeError> {
        let id = self.find(p).ok_or(TreeError::KeyNotFound(*p))?;
        Ok(self.cost(id))
    }

    #[inline(always)]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    #[inline(always)]
    pub fn point(&self, id: NodeId) -> &Coord {
        &self.nodes[id.0].p
    }

    #[inline(always)]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    #[inline(always)]
    pub fn cost(&self, id: NodeId) -> f64 {
        self.nodes[id.0].cost
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, node)| (NodeId(i), node))
    }

    /// Path from the root to `end`. Only the root waypoint gets `start_heading`.
    pub fn find_path(&self, end: &Coord, start_heading: Option<f64>) -> Result<Vec<Waypoint>, TreeError> {
        let end = self.find(end).ok_or(TreeError::KeyNotFound(*end))?;
        self.path_to(end, start_heading)
    }

    pub fn path_to(&self, end: NodeId, start_heading: Option<f64>) -> Result<Vec<Waypoint>, TreeError> {
        let mut waypoints = Vec::new();
        let mut curr = end;

        // A walk longer than the number of nodes has necessarily visited some node twice.
        loop {
            if waypoints.len() >= self.len() {
                return Err(TreeError::CycleOrMissingRoot);
            }

            let node = self.nodes.get(curr.0).ok_or(TreeError::CycleOrMissingRoot)?;
            match node.parent {
                Some(parent) => {
                    waypoints.push(Waypoint::new(node.p));
                    curr = parent;
                }
                None => {
                    waypoints.push(Waypoint {
                        point: node.p,
                        heading: start_heading,
                    });
                    break;
                }
            }
        }

        waypoints.reverse();
        Ok(waypoints)
    }
}

impl NodeSearch for Tree {
    fn nearest(&self, p: &Coord) -> NodeId {
        let mut nearest = Tree::ROOT;
        let mut min_dist = f64::INFINITY;

        for (id, node) in self.iter() {
            let dist = na::distance(&node.p, p);
            if dist < min_dist {
                min_dist = dist;
                nearest = id;
            }
        }

        nearest
    }

    fn within(&self, p: &Coord, radius: f64) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, node)| na::distance(&node.p, p) < radius)
            .map(|(id, _)| id)
            .collect()
    }
}
