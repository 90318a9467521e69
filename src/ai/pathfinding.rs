//! A* pathfinding over the patrol graph
//!
//! The graph itself is immutable and shared; each [`PathPlanner`] owns the
//! per-node search state (G/H/F/predecessor) in a table parallel to the node
//! list. Only nodes touched by the previous search are reset before the next
//! one, so repeated roam requests stay cheap on large graphs.

use glam::Vec3;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::graph::{NodeId, PatrolGraph, SearchState};
use super::priority_queue::PriorityQueue;

/// How edge costs and the heuristic are measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CostMetric {
    /// Straight-line distance. Admissible, yields shortest paths.
    #[default]
    Euclidean,
    /// Squared distance. Cheaper, favours many short hops over one long one.
    Squared,
}

impl CostMetric {
    #[inline]
    #[must_use]
    pub fn measure(self, a: Vec3, b: Vec3) -> f32 {
        match self {
            Self::Euclidean => a.distance(b),
            Self::Squared => a.distance_squared(b),
        }
    }
}

/// Why a path could not be produced
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("no path from {start} to {goal}")]
    PathNotFound { start: NodeId, goal: NodeId },
    #[error("node {0} is not part of the graph")]
    UnknownNode(NodeId),
    #[error("patrol graph has no nodes")]
    EmptyGraph,
}

/// Result of pathfinding
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathResult {
    /// Nodes from start to goal inclusive
    pub nodes: Vec<NodeId>,
    /// Waypoints in world coordinates
    pub waypoints: Vec<Vec3>,
    /// Total path length in world units
    pub length: f32,
}

impl PathResult {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A* search with reusable scratch state
#[derive(Debug, Clone, Default)]
pub struct PathPlanner {
    metric: CostMetric,
    search: Vec<SearchState>,
    touched: FxHashSet<NodeId>,
    open: PriorityQueue<NodeId>,
    open_set: FxHashSet<NodeId>,
    closed: FxHashSet<NodeId>,
}

impl PathPlanner {
    #[must_use]
    pub fn new(metric: CostMetric) -> Self {
        Self {
            metric,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn metric(&self) -> CostMetric {
        self.metric
    }

    /// Search state left by the last query for `id`
    #[must_use]
    pub fn search_state(&self, id: NodeId) -> Option<&SearchState> {
        self.search.get(id.0)
    }

    /// Nodes whose search state is currently dirty
    #[must_use]
    pub fn touched_count(&self) -> usize {
        self.touched.len()
    }

    /// Restore default search state on every node the last query touched.
    pub fn reset_search(&mut self) {
        for id in self.touched.drain() {
            if let Some(state) = self.search.get_mut(id.0) {
                state.reset();
            }
        }
    }

    fn touch(&mut self, id: NodeId) -> &mut SearchState {
        self.touched.insert(id);
        &mut self.search[id.0]
    }

    /// Find the cheapest node sequence from `start` to `goal`.
    ///
    /// # Errors
    ///
    /// [`PathError::UnknownNode`] for ids outside the graph and
    /// [`PathError::PathNotFound`] once the open set runs dry.
    pub fn find_path(
        &mut self,
        graph: &PatrolGraph,
        start: NodeId,
        goal: NodeId,
    ) -> Result<PathResult, PathError> {
        let (Some(start_pos), Some(goal_pos)) = (graph.position(start), graph.position(goal))
        else {
            let unknown = if graph.contains(start) { goal } else { start };
            return Err(PathError::UnknownNode(unknown));
        };

        if self.search.len() < graph.len() {
            self.search.resize(graph.len(), SearchState::default());
        }
        self.reset_search();
        self.open.clear();
        self.open_set.clear();
        self.closed.clear();

        let heuristic = self.metric.measure(start_pos, goal_pos);
        let state = self.touch(start);
        state.setup(0.0, heuristic, None);
        let priority = state.total_cost;
        self.open.enqueue(start, priority);
        self.open_set.insert(start);

        while let Ok(current) = self.open.dequeue() {
            // Stale duplicate of an already expanded node
            if !self.closed.insert(current) {
                continue;
            }
            self.open_set.remove(&current);

            if current == goal {
                return Ok(self.reconstruct(graph, goal));
            }

            let Some(current_pos) = graph.position(current) else {
                continue;
            };
            let current_cost = self.search[current.0].cost_from_start;

            for &neighbor in graph.neighbors(current) {
                if self.closed.contains(&neighbor) {
                    continue;
                }
                let Some(neighbor_pos) = graph.position(neighbor) else {
                    continue;
                };

                let tentative = current_cost + self.metric.measure(current_pos, neighbor_pos);
                let is_new = !self.open_set.contains(&neighbor);
                if is_new || tentative < self.search[neighbor.0].cost_from_start {
                    let heuristic = self.metric.measure(neighbor_pos, goal_pos);
                    let state = self.touch(neighbor);
                    state.setup(tentative, heuristic, Some(current));
                    let priority = state.total_cost;
                    self.open.enqueue(neighbor, priority);
                    self.open_set.insert(neighbor);
                }
            }
        }

        log::warn!("No patrol path from {start} to {goal}");
        Err(PathError::PathNotFound { start, goal })
    }

    /// Path between the nodes nearest to two world points
    ///
    /// # Errors
    ///
    /// [`PathError::EmptyGraph`] when there are no nodes, otherwise as
    /// [`find_path`](Self::find_path).
    pub fn find_path_between(
        &mut self,
        graph: &PatrolGraph,
        from: Vec3,
        to: Vec3,
    ) -> Result<PathResult, PathError> {
        let (Some(start), Some(goal)) = (graph.nearest(from), graph.nearest(to)) else {
            return Err(PathError::EmptyGraph);
        };
        self.find_path(graph, start, goal)
    }

    fn reconstruct(&self, graph: &PatrolGraph, goal: NodeId) -> PathResult {
        let mut nodes = vec![goal];
        let mut current = goal;

        // Predecessor chains are acyclic; the bound only guards corrupt state
        while let Some(previous) = self.search[current.0].predecessor {
            if nodes.len() > graph.len() {
                break;
            }
            nodes.push(previous);
            current = previous;
        }
        nodes.reverse();

        let waypoints = graph.positions_of(&nodes);
        let length = calculate_path_length(&waypoints);
        PathResult {
            nodes,
            waypoints,
            length,
        }
    }
}

/// Calculate total path length
fn calculate_path_length(waypoints: &[Vec3]) -> f32 {
    waypoints.windows(2).map(|pair| pair[0].distance(pair[1])).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::builder::PatrolGraphBuilder;
    use crate::physics::OpenSpace;

    fn assert_valid_path(graph: &PatrolGraph, path: &PathResult, start: NodeId, goal: NodeId) {
        assert_eq!(path.nodes.first(), Some(&start));
        assert_eq!(path.nodes.last(), Some(&goal));
        for pair in path.nodes.windows(2) {
            assert!(graph.are_linked(pair[0], pair[1]), "{} -> {} is not a link", pair[0], pair[1]);
        }
    }

    /// Two 3x3 grids far apart with no link between them
    fn two_islands() -> PatrolGraph {
        let mut graph = PatrolGraph::new();
        for offset in [0.0, 500.0] {
            for i in 0..9 {
                graph.add_node(Vec3::new(offset + (i % 3) as f32 * 2.0, 0.0, (i / 3) as f32 * 2.0));
            }
        }
        PatrolGraphBuilder::default().build(&mut graph, &OpenSpace);
        graph
    }

    #[test]
    fn test_triangle_takes_direct_link() {
        let mut graph = PatrolGraph::from_positions([
            Vec3::ZERO,
            Vec3::new(4.0, 0.0, 3.0),
            Vec3::new(6.0, 0.0, 0.0),
        ]);
        PatrolGraphBuilder::default().build(&mut graph, &OpenSpace);
        assert!(graph.are_linked(NodeId(0), NodeId(2)));

        let path = PathPlanner::default()
            .find_path(&graph, NodeId(0), NodeId(2))
            .unwrap();
        assert_eq!(path.nodes, vec![NodeId(0), NodeId(2)]);
        assert!((path.length - 6.0).abs() < 1e-5);
    }

    #[test]
    fn test_triangle_without_direct_link_goes_around() {
        let mut graph = PatrolGraph::from_positions([
            Vec3::ZERO,
            Vec3::new(4.0, 0.0, 3.0),
            Vec3::new(6.0, 0.0, 0.0),
        ]);
        graph.connect(NodeId(0), NodeId(1));
        graph.connect(NodeId(1), NodeId(2));

        let path = PathPlanner::default()
            .find_path(&graph, NodeId(0), NodeId(2))
            .unwrap();
        assert_eq!(path.nodes, vec![NodeId(0), NodeId(1), NodeId(2)]);
    }

    #[test]
    fn test_path_follows_links_across_grid() {
        let mut graph = PatrolGraph::from_positions(
            (0..36).map(|i| Vec3::new((i % 6) as f32 * 3.0, 0.0, (i / 6) as f32 * 3.0)),
        );
        PatrolGraphBuilder::default().build(&mut graph, &OpenSpace);

        let mut planner = PathPlanner::default();
        let path = planner.find_path(&graph, NodeId(0), NodeId(35)).unwrap();
        assert_valid_path(&graph, &path, NodeId(0), NodeId(35));

        // Reverse direction on the same planner, no stale costs leaking in
        let back = planner.find_path(&graph, NodeId(35), NodeId(0)).unwrap();
        assert_valid_path(&graph, &back, NodeId(35), NodeId(0));
        assert!((back.length - path.length).abs() < 1e-3);
    }

    #[test]
    fn test_disconnected_components_fail() {
        let graph = two_islands();
        let mut planner = PathPlanner::default();

        let result = planner.find_path(&graph, NodeId(0), NodeId(17));
        assert_eq!(
            result,
            Err(PathError::PathNotFound {
                start: NodeId(0),
                goal: NodeId(17)
            })
        );

        // Still usable afterwards
        let path = planner.find_path(&graph, NodeId(9), NodeId(17)).unwrap();
        assert_valid_path(&graph, &path, NodeId(9), NodeId(17));
    }

    #[test]
    fn test_isolated_goal_fails() {
        let mut graph = PatrolGraph::from_positions([Vec3::ZERO, Vec3::X]);
        graph.add_node(Vec3::new(900.0, 0.0, 0.0));
        graph.connect(NodeId(0), NodeId(1));

        let result = PathPlanner::default().find_path(&graph, NodeId(0), NodeId(2));
        assert!(matches!(result, Err(PathError::PathNotFound { .. })));
    }

    #[test]
    fn test_start_equals_goal() {
        let graph = PatrolGraph::from_positions([Vec3::ZERO]);
        let path = PathPlanner::default()
            .find_path(&graph, NodeId(0), NodeId(0))
            .unwrap();

        assert_eq!(path.nodes, vec![NodeId(0)]);
        assert_eq!(path.length, 0.0);
    }

    #[test]
    fn test_unknown_nodes_rejected() {
        let graph = PatrolGraph::from_positions([Vec3::ZERO]);
        let mut planner = PathPlanner::default();

        assert_eq!(
            planner.find_path(&graph, NodeId(0), NodeId(4)),
            Err(PathError::UnknownNode(NodeId(4)))
        );
        assert_eq!(
            planner.find_path(&graph, NodeId(3), NodeId(0)),
            Err(PathError::UnknownNode(NodeId(3)))
        );
        assert_eq!(
            planner.find_path_between(&PatrolGraph::new(), Vec3::ZERO, Vec3::ONE),
            Err(PathError::EmptyGraph)
        );
    }

    #[test]
    fn test_reset_is_idempotent() {
        let graph = two_islands();
        let mut planner = PathPlanner::default();

        planner.reset_search();
        planner.reset_search();
        assert_eq!(planner.touched_count(), 0);

        planner.find_path(&graph, NodeId(0), NodeId(8)).unwrap();
        assert!(planner.touched_count() > 0);
        assert!(planner.search_state(NodeId(8)).unwrap().predecessor.is_some());

        planner.reset_search();
        planner.reset_search();
        assert_eq!(planner.touched_count(), 0);
        for node in graph.nodes() {
            if let Some(state) = planner.search_state(node.id) {
                assert_eq!(*state, SearchState::default());
            }
        }
    }

    #[test]
    fn test_squared_metric_prefers_short_hops() {
        let mut graph = PatrolGraph::from_positions([
            Vec3::ZERO,
            Vec3::new(5.0, 0.0, 1.0),
            Vec3::new(10.0, 0.0, 0.0),
        ]);
        graph.connect(NodeId(0), NodeId(1));
        graph.connect(NodeId(1), NodeId(2));
        graph.connect(NodeId(0), NodeId(2));

        let direct = PathPlanner::new(CostMetric::Euclidean)
            .find_path(&graph, NodeId(0), NodeId(2))
            .unwrap();
        assert_eq!(direct.nodes, vec![NodeId(0), NodeId(2)]);

        let hops = PathPlanner::new(CostMetric::Squared)
            .find_path(&graph, NodeId(0), NodeId(2))
            .unwrap();
        assert_eq!(hops.nodes, vec![NodeId(0), NodeId(1), NodeId(2)]);
    }

    #[test]
    fn test_find_path_between_points() {
        let graph = two_islands();
        let path = PathPlanner::default()
            .find_path_between(&graph, Vec3::new(-1.0, 0.0, -1.0), Vec3::new(4.5, 0.0, 4.5))
            .unwrap();

        assert_valid_path(&graph, &path, NodeId(0), NodeId(8));
        assert_eq!(path.waypoints.len(), path.nodes.len());
    }
}
