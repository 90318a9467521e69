//! Patrol graph: nodes, neighbor links and per-node search bookkeeping
//!
//! Nodes are created once (from tagged markers or a spawner) and never
//! removed. Links are undirected: [`PatrolGraph::connect`] always writes both
//! directions, so neighbor lists stay symmetric.

use glam::Vec3;
use hecs::Entity;
use smallvec::SmallVec;

use crate::ecs::World;

/// Index of a node inside its [`PatrolGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A navigable point in the world
#[derive(Debug, Clone)]
pub struct PatrolNode {
    pub id: NodeId,
    pub position: Vec3,
    /// Marker entity this node was discovered from, if any
    pub entity: Option<Entity>,
    neighbors: SmallVec<[NodeId; 8]>,
}

impl PatrolNode {
    /// Linked nodes in insertion order
    #[must_use]
    pub fn neighbors(&self) -> &[NodeId] {
        &self.neighbors
    }
}

/// A* bookkeeping for one node.
///
/// `total_cost == cost_from_start + heuristic_cost` after every [`setup`](Self::setup).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchState {
    /// G: cost of the best known path from the start
    pub cost_from_start: f32,
    /// H: estimated cost to the goal
    pub heuristic_cost: f32,
    /// F: G + H, the queue priority
    pub total_cost: f32,
    /// Node that produced the current G
    pub predecessor: Option<NodeId>,
}

impl SearchState {
    pub fn setup(&mut self, cost_from_start: f32, heuristic_cost: f32, predecessor: Option<NodeId>) {
        self.cost_from_start = cost_from_start;
        self.heuristic_cost = heuristic_cost;
        self.total_cost = cost_from_start + heuristic_cost;
        self.predecessor = predecessor;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            cost_from_start: 0.0,
            heuristic_cost: 0.0,
            total_cost: 0.0,
            predecessor: None,
        }
    }
}

/// All patrol nodes of one level
#[derive(Debug, Clone, Default)]
pub struct PatrolGraph {
    nodes: Vec<PatrolNode>,
}

impl PatrolGraph {
    /// Create an empty graph
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create unlinked nodes at the given positions
    #[must_use]
    pub fn from_positions(positions: impl IntoIterator<Item = Vec3>) -> Self {
        let mut graph = Self::new();
        for position in positions {
            graph.add_node(position);
        }
        graph
    }

    /// Create unlinked nodes from every entity tagged as a patrol point
    #[must_use]
    pub fn from_world(world: &World) -> Self {
        let mut graph = Self::new();
        for (entity, position) in world.patrol_points() {
            let id = graph.add_node(position);
            graph.nodes[id.0].entity = Some(entity);
        }
        log::debug!("Discovered {} patrol points", graph.len());
        graph
    }

    /// Append a node with no links
    pub fn add_node(&mut self, position: Vec3) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(PatrolNode {
            id,
            position,
            entity: None,
            neighbors: SmallVec::new(),
        });
        id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&PatrolNode> {
        self.nodes.get(id.0)
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &PatrolNode> {
        self.nodes.iter()
    }

    /// Position of a node, if it exists
    #[must_use]
    pub fn position(&self, id: NodeId) -> Option<Vec3> {
        self.node(id).map(|node| node.position)
    }

    /// Neighbors of a node (empty for unknown ids)
    #[must_use]
    pub fn neighbors(&self, id: NodeId) -> &[NodeId] {
        match self.node(id) {
            Some(node) => &node.neighbors,
            None => &[],
        }
    }

    /// Check whether `a` lists `b`
    #[must_use]
    pub fn are_linked(&self, a: NodeId, b: NodeId) -> bool {
        self.neighbors(a).contains(&b)
    }

    /// Link two nodes in both directions. Self links and repeats are ignored.
    ///
    /// Returns `true` when a new link was created.
    pub fn connect(&mut self, a: NodeId, b: NodeId) -> bool {
        if a == b || !self.contains(a) || !self.contains(b) || self.are_linked(a, b) {
            return false;
        }
        self.nodes[a.0].neighbors.push(b);
        if !self.nodes[b.0].neighbors.contains(&a) {
            self.nodes[b.0].neighbors.push(a);
        }
        true
    }

    /// Remove every link, keeping the nodes
    pub fn clear_links(&mut self) {
        for node in &mut self.nodes {
            node.neighbors.clear();
        }
    }

    /// Number of undirected links
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.neighbors.len()).sum::<usize>() / 2
    }

    /// Every link is listed from both ends
    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        self.nodes
            .iter()
            .all(|node| node.neighbors.iter().all(|&n| self.are_linked(n, node.id)))
    }

    /// Nodes without any neighbor
    #[must_use]
    pub fn isolated(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|node| node.neighbors.is_empty())
            .map(|node| node.id)
            .collect()
    }

    /// Node closest to `point`
    #[must_use]
    pub fn nearest(&self, point: Vec3) -> Option<NodeId> {
        self.nodes
            .iter()
            .min_by(|a, b| {
                a.position
                    .distance_squared(point)
                    .total_cmp(&b.position.distance_squared(point))
            })
            .map(|node| node.id)
    }

    /// Up to `count` nodes closest to `point`, nearest first
    #[must_use]
    pub fn nearest_n(&self, point: Vec3, count: usize) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.iter().map(|node| node.id).collect();
        ids.sort_by(|a, b| {
            self.nodes[a.0]
                .position
                .distance_squared(point)
                .total_cmp(&self.nodes[b.0].position.distance_squared(point))
        });
        ids.truncate(count);
        ids
    }

    /// Nodes within `radius` of `point`, in id order
    #[must_use]
    pub fn within_radius(&self, point: Vec3, radius: f32) -> Vec<NodeId> {
        let radius_sq = radius * radius;
        self.nodes
            .iter()
            .filter(|node| node.position.distance_squared(point) <= radius_sq)
            .map(|node| node.id)
            .collect()
    }

    /// World positions for a node sequence (unknown ids are skipped)
    #[must_use]
    pub fn positions_of(&self, path: &[NodeId]) -> Vec<Vec3> {
        path.iter().filter_map(|&id| self.position(id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_graph() -> PatrolGraph {
        PatrolGraph::from_positions((0..4).map(|i| Vec3::new(i as f32 * 2.0, 0.0, 0.0)))
    }

    #[test]
    fn test_connect_is_symmetric() {
        let mut graph = line_graph();
        assert!(graph.connect(NodeId(0), NodeId(1)));
        assert!(graph.are_linked(NodeId(0), NodeId(1)));
        assert!(graph.are_linked(NodeId(1), NodeId(0)));
        assert!(graph.is_symmetric());
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_connect_ignores_self_and_duplicates() {
        let mut graph = line_graph();
        assert!(!graph.connect(NodeId(2), NodeId(2)));
        assert!(graph.connect(NodeId(2), NodeId(3)));
        assert!(!graph.connect(NodeId(3), NodeId(2)));
        assert!(!graph.connect(NodeId(0), NodeId(99)));
        assert_eq!(graph.neighbors(NodeId(2)), &[NodeId(3)]);
        assert_eq!(graph.neighbors(NodeId(3)), &[NodeId(2)]);
    }

    #[test]
    fn test_clear_links_and_isolated() {
        let mut graph = line_graph();
        graph.connect(NodeId(0), NodeId(1));
        assert_eq!(graph.isolated(), vec![NodeId(2), NodeId(3)]);

        graph.clear_links();
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.isolated().len(), 4);
    }

    #[test]
    fn test_nearest_queries() {
        let graph = line_graph();
        assert_eq!(graph.nearest(Vec3::new(4.4, 0.0, 1.0)), Some(NodeId(2)));
        assert_eq!(
            graph.nearest_n(Vec3::new(6.5, 0.0, 0.0), 2),
            vec![NodeId(3), NodeId(2)]
        );
        assert_eq!(
            graph.within_radius(Vec3::ZERO, 2.0),
            vec![NodeId(0), NodeId(1)]
        );
        assert!(PatrolGraph::new().nearest(Vec3::ZERO).is_none());
    }

    #[test]
    fn test_search_state_setup_keeps_total() {
        let mut state = SearchState::default();
        state.setup(3.0, 4.5, Some(NodeId(1)));
        assert_eq!(state.total_cost, 7.5);
        assert_eq!(state.predecessor, Some(NodeId(1)));

        state.reset();
        assert_eq!(state, SearchState::default());
    }

    #[test]
    fn test_from_world_keeps_marker_entities() {
        let mut world = World::new();
        let marker = world.spawn_patrol_point(Vec3::new(1.0, 0.0, 2.0));

        let graph = PatrolGraph::from_world(&world);
        assert_eq!(graph.len(), 1);
        let node = graph.node(NodeId(0)).unwrap();
        assert_eq!(node.entity, Some(marker));
        assert_eq!(node.position, Vec3::new(1.0, 0.0, 2.0));
    }
}
