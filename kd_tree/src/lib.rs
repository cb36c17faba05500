pub mod visitor;

use std::borrow::Borrow;
use std::cmp::Ordering;

use nalgebra as na;

pub use visitor::Visitor;

// TODO: Should have some kind of `entry()` just like `BTreeMap`.

pub trait HasCoords<const N: usize> {
    fn coords(&self) -> [f64; N];

    fn point(&self) -> na::Point<f64, N> {
        self.coords().into()
    }

    fn get_coord(&self, axis: usize) -> f64 {
        self.coords()[axis]
    }
}

impl<const N: usize> HasCoords<N> for na::Point<f64, N> {
    #[inline]
    fn coords(&self) -> [f64; N] {
        let mut array = [0.0; N];
        array.copy_from_slice(self.coords.as_slice());
        array
    }

    #[inline]
    fn point(&self) -> na::Point<f64, N> {
        *self
    }

    #[inline]
    fn get_coord(&self, axis: usize) -> f64 {
        self[axis]
    }
}

///
/// A simple K-D Tree whose nodes live in a single vector and refer to each other by index.
/// Incremental insertion may generate very unbalanced trees which would result in
/// inefficient queries. Prefer building from a batch of points (`from_vec`), or call
/// `rebuild` after many insertions.
///
#[derive(Debug, Clone)]
pub struct KDTree<P, const N: usize> {
    nodes: Vec<Node<P>>,
    root: Option<usize>,
}

#[derive(Debug, Clone)]
struct Node<P> {
    data: P,
    left: Option<usize>,
    right: Option<usize>,
}

impl<P> Node<P> {
    fn new(data: P) -> Self {
        Node {
            data,
            left: None,
            right: None,
        }
    }
}

impl<P, const N: usize> Default for KDTree<P, N> {
    fn default() -> Self {
        KDTree {
            nodes: Vec::new(),
            root: None,
        }
    }
}

impl<P, const N: usize> KDTree<P, N>
where
    P: HasCoords<N>,
{
    #[inline]
    pub fn new() -> KDTree<P, N> {
        KDTree::default()
    }

    /// Builds a balanced tree out of `points`.
    pub fn from_vec(points: Vec<P>) -> KDTree<P, N> {
        let mut tree = KDTree::new();
        tree.extend_vec(points);
        tree
    }

    /// Inserts a point into the KD-Tree, returning its index. Indices are stable, even across
    /// `rebuild`.
    pub fn insert(&mut self, p: P) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(Node::new(p));

        let Some(mut curr) = self.root else {
            self.root = Some(idx);
            return idx;
        };

        let mut depth = 0;
        loop {
            let axis = depth % N;
            let goes_left =
                self.nodes[idx].data.get_coord(axis) <= self.nodes[curr].data.get_coord(axis);

            let child = if goes_left {
                &mut self.nodes[curr].left
            } else {
                &mut self.nodes[curr].right
            };

            match *child {
                Some(next) => curr = next,
                None => {
                    *child = Some(idx);
                    return idx;
                }
            }
            depth += 1;
        }
    }

    /// Adds every point of `points` and rebalances the whole tree.
    pub fn extend_vec(&mut self, points: Vec<P>) {
        self.nodes.extend(points.into_iter().map(Node::new));
        self.rebuild();
    }

    pub fn query<'a, V, Q>(&'a self, p: &Q, mut vis: V) -> V::Result
    where
        Q: HasCoords<N> + ?Sized,
        P: Borrow<Q>,
        V: Visitor<'a, P>,
    {
        if let Some(root) = self.root {
            self.query_node(root, &mut vis, p, 0);
        }
        vis.result()
    }

    fn query_node<'a, V, Q>(&'a self, idx: usize, visitor: &mut V, p: &Q, depth: usize)
    where
        Q: HasCoords<N> + ?Sized,
        P: Borrow<Q>,
        V: Visitor<'a, P>,
    {
        let node = &self.nodes[idx];
        let axis = depth % N;

        let p_ax = p.get_coord(axis);
        let m_ax = node.data.get_coord(axis);

        // We first follow the axis comparison to get a first candidate of nearest point.
        let (fst, snd) = if p_ax <= m_ax {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(child) = fst {
            self.query_node(child, visitor, p, depth + 1);
        }

        if na::distance_squared(&node.data.point(), &p.point()) <= visitor.radius_sq(p) {
            visitor.accept(&node.data, p);
        }

        // Both subtrees may hold points on the splitting plane.
        if visitor.radius_sq(p) >= (p_ax - m_ax).powi(2) {
            if let Some(child) = snd {
                self.query_node(child, visitor, p, depth + 1);
            }
        }
    }

    #[inline(always)]
    pub fn iter(&self) -> impl Iterator<Item = &P> {
        self.nodes.iter().map(|node| &node.data)
    }

    pub fn get_point(&self, idx: usize) -> Option<&P> {
        self.nodes.get(idx).map(|node| &node.data)
    }

    pub fn depth(&self) -> usize {
        let Some(root) = self.root else { return 0 };

        let mut max_depth = 0;
        let mut stack = vec![(root, 0)];
        while let Some((idx, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            let node = &self.nodes[idx];
            stack.extend(node.left.into_iter().chain(node.right).map(|c| (c, depth + 1)));
        }
        max_depth
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Rebuilds the KD-Tree into a balanced tree. Point indices are preserved, only the links
    /// between nodes change.
    pub fn rebuild(&mut self) {
        fn rec_rebuild<P: HasCoords<N>, const N: usize>(
            nodes: &mut [Node<P>],
            order: &mut [usize],
            depth: usize,
        ) -> Option<usize> {
            if order.is_empty() {
                return None;
            }

            // Points equal to the median on `axis` may end up on either side, which keeps the
            // split balanced even when the whole slice shares a coordinate.
            let axis = depth % N;
            let mid = order.len() / 2;
            order.select_nth_unstable_by(mid, |&a, &b| {
                let a = nodes[a].data.get_coord(axis);
                let b = nodes[b].data.get_coord(axis);
                a.partial_cmp(&b).unwrap_or(Ordering::Equal)
            });

            let (left, right) = order.split_at_mut(mid);
            let (&mut median, right) = right.split_first_mut()?;

            let left = rec_rebuild(nodes, left, depth + 1);
            let right = rec_rebuild(nodes, right, depth + 1);
            nodes[median].left = left;
            nodes[median].right = right;

            Some(median)
        }

        let mut order: Vec<usize> = (0..self.nodes.len()).collect();
        self.root = rec_rebuild(&mut self.nodes, &mut order, 0);
    }
}

impl<P: HasCoords<N>, const N: usize> FromIterator<P> for KDTree<P, N> {
    fn from_iter<T: IntoIterator<Item = P>>(iter: T) -> Self {
        KDTree::from_vec(iter.into_iter().collect())
    }
}
