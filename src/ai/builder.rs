//! Patrol graph construction
//!
//! [`PatrolGraphBuilder`] links every node to a few nearby nodes it can see,
//! growing the search radius only until something visible turns up.
//! [`spawn_grid`] lays out candidate node positions over an area.

use glam::{UVec2, Vec3};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::graph::{NodeId, PatrolGraph};
use crate::physics::{LayerMask, SpatialQuery};

/// Neighbor discovery settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphBuilderConfig {
    /// Links accepted per node during discovery
    pub max_neighbors: usize,
    /// First search radius
    pub initial_radius: f32,
    /// Radius growth when nothing usable was found
    pub radius_step: f32,
    /// Largest radius tried
    pub max_radius: f32,
    /// Height added to both ends of a line-of-sight probe
    pub clearance: f32,
    /// Layers that block a link
    pub obstacle_mask: LayerMask,
}

impl Default for GraphBuilderConfig {
    fn default() -> Self {
        Self {
            max_neighbors: 4,
            initial_radius: 8.0,
            radius_step: 8.0,
            max_radius: 64.0,
            clearance: 0.25,
            obstacle_mask: LayerMask::OBSTACLE,
        }
    }
}

/// Summary of a build pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub nodes: usize,
    pub edges: usize,
    /// Nodes left without any link
    pub isolated: Vec<NodeId>,
}

/// Builds the k-nearest visibility graph over all patrol nodes
#[derive(Debug, Clone, Default)]
pub struct PatrolGraphBuilder {
    config: GraphBuilderConfig,
}

impl PatrolGraphBuilder {
    #[must_use]
    pub fn new(config: GraphBuilderConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &GraphBuilderConfig {
        &self.config
    }

    /// Rebuild every link of `graph` from scratch.
    pub fn build(&self, graph: &mut PatrolGraph, space: &impl SpatialQuery) -> BuildReport {
        graph.clear_links();

        let discovered: Vec<(NodeId, Vec<NodeId>)> = graph
            .nodes()
            .map(|node| (node.id, self.discover(graph, node.id, space)))
            .collect();

        for (from, targets) in discovered {
            for to in targets {
                graph.connect(from, to);
            }
        }

        let report = BuildReport {
            nodes: graph.len(),
            edges: graph.edge_count(),
            isolated: graph.isolated(),
        };
        log::info!(
            "Patrol graph built: {} nodes, {} links",
            report.nodes,
            report.edges
        );
        if !report.isolated.is_empty() {
            log::debug!("{} patrol nodes are isolated", report.isolated.len());
        }
        report
    }

    /// Visible neighbors of one node, nearest first
    fn discover(&self, graph: &PatrolGraph, from: NodeId, space: &impl SpatialQuery) -> Vec<NodeId> {
        let Some(origin) = graph.position(from) else {
            return Vec::new();
        };
        let lift = Vec3::Y * self.config.clearance;
        let mut blocked: FxHashSet<NodeId> = FxHashSet::default();
        let mut accepted = Vec::with_capacity(self.config.max_neighbors);
        let mut radius = self.config.initial_radius;

        while radius <= self.config.max_radius {
            let radius_sq = radius * radius;
            let mut candidates: Vec<(NodeId, f32)> = graph
                .nodes()
                .filter(|node| node.id != from)
                .map(|node| (node.id, node.position.distance_squared(origin)))
                .filter(|&(_, distance_sq)| distance_sq <= radius_sq)
                .collect();
            candidates.sort_by(|a, b| a.1.total_cmp(&b.1));

            for (candidate, _) in candidates {
                if accepted.len() >= self.config.max_neighbors {
                    break;
                }
                if blocked.contains(&candidate) {
                    continue;
                }
                let Some(target) = graph.position(candidate) else {
                    continue;
                };
                if space.is_blocked(origin + lift, target + lift, self.config.obstacle_mask) {
                    blocked.insert(candidate);
                } else {
                    accepted.push(candidate);
                }
            }

            if !accepted.is_empty() || self.config.radius_step <= 0.0 {
                break;
            }
            radius += self.config.radius_step;
        }

        accepted
    }
}

/// Grid layout for generated patrol points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    /// Centre of the covered area
    pub center: Vec3,
    /// Size of the covered area (Y is ignored)
    pub extent: Vec3,
    /// Points along X and Z
    pub resolution: UVec2,
    /// Height above a grid point the ground probe starts from
    pub probe_height: f32,
    /// Maximum length of the ground probe
    pub probe_depth: f32,
    /// Points whose sphere of this radius touches an obstacle are dropped
    pub clearance_radius: f32,
    pub obstacle_mask: LayerMask,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            extent: Vec3::new(50.0, 0.0, 50.0),
            resolution: UVec2::new(10, 10),
            probe_height: 10.0,
            probe_depth: 50.0,
            clearance_radius: 0.5,
            obstacle_mask: LayerMask::OBSTACLE,
        }
    }
}

/// Offsets of `count` evenly spaced samples across `extent`, centred on 0
fn axis_offsets(extent: f32, count: u32) -> Vec<f32> {
    match count {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => {
            let step = extent / (count - 1) as f32;
            (0..count).map(|i| i as f32 * step - extent / 2.0).collect()
        }
    }
}

/// Generate patrol point positions on a ground-snapped grid, skipping any
/// point that sits inside an obstacle.
#[must_use]
pub fn spawn_grid(config: &SpawnerConfig, space: &impl SpatialQuery) -> Vec<Vec3> {
    let xs = axis_offsets(config.extent.x, config.resolution.x);
    let zs = axis_offsets(config.extent.z, config.resolution.y);
    let mut points = Vec::with_capacity(xs.len() * zs.len());

    for &x in &xs {
        for &z in &zs {
            let mut point = config.center + Vec3::new(x, 0.0, z);
            point.y = space
                .ground_below(point + Vec3::Y * config.probe_height, config.probe_depth)
                .map_or(config.center.y, |hit| hit.y);

            if space.sphere_blocked(point, config.clearance_radius, config.obstacle_mask) {
                continue;
            }
            points.push(point);
        }
    }

    log::debug!("Spawned {} patrol points", points.len());
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::OpenSpace;

    /// Infinite wall in the plane x = `x`, blocking every segment crossing it.
    struct WallAt {
        x: f32,
    }

    impl SpatialQuery for WallAt {
        fn is_blocked(&self, from: Vec3, to: Vec3, _mask: LayerMask) -> bool {
            (from.x - self.x) * (to.x - self.x) < 0.0
        }

        fn sphere_blocked(&self, center: Vec3, radius: f32, _mask: LayerMask) -> bool {
            (center.x - self.x).abs() < radius
        }
    }

    /// Flat ground at a fixed height
    struct Floor {
        height: f32,
    }

    impl SpatialQuery for Floor {
        fn is_blocked(&self, _from: Vec3, _to: Vec3, _mask: LayerMask) -> bool {
            false
        }

        fn ground_below(&self, origin: Vec3, max_distance: f32) -> Option<Vec3> {
            (origin.y - self.height <= max_distance)
                .then(|| Vec3::new(origin.x, self.height, origin.z))
        }
    }

    fn grid_graph(size: usize, spacing: f32) -> PatrolGraph {
        PatrolGraph::from_positions((0..size * size).map(|i| {
            Vec3::new((i % size) as f32 * spacing, 0.0, (i / size) as f32 * spacing)
        }))
    }

    #[test]
    fn test_build_is_symmetric() {
        let mut graph = grid_graph(5, 3.0);
        let report = PatrolGraphBuilder::default().build(&mut graph, &OpenSpace);

        assert!(graph.is_symmetric());
        assert!(report.isolated.is_empty());
        assert_eq!(report.nodes, 25);
        assert_eq!(report.edges, graph.edge_count());
    }

    #[test]
    fn test_discovery_caps_neighbors() {
        let mut graph = grid_graph(5, 1.0);
        let builder = PatrolGraphBuilder::default();

        // Every node sees the whole grid within the first radius
        let found = builder.discover(&graph, NodeId(12), &OpenSpace);
        assert_eq!(found.len(), 4);
        let centre = graph.position(NodeId(12)).unwrap();
        for id in &found {
            let distance = graph.position(*id).unwrap().distance(centre);
            assert!((distance - 1.0).abs() < 1e-5, "centre should link to adjacent nodes");
        }

        builder.build(&mut graph, &OpenSpace);
        assert!(graph.is_symmetric());
    }

    #[test]
    fn test_radius_grows_for_sparse_nodes() {
        let mut graph = PatrolGraph::from_positions([Vec3::ZERO, Vec3::new(30.0, 0.0, 0.0)]);
        PatrolGraphBuilder::default().build(&mut graph, &OpenSpace);

        assert!(graph.are_linked(NodeId(0), NodeId(1)));
    }

    #[test]
    fn test_beyond_max_radius_stays_isolated() {
        let mut graph = PatrolGraph::from_positions([Vec3::ZERO, Vec3::new(100.0, 0.0, 0.0)]);
        let report = PatrolGraphBuilder::default().build(&mut graph, &OpenSpace);

        assert_eq!(report.edges, 0);
        assert_eq!(report.isolated, vec![NodeId(0), NodeId(1)]);
    }

    #[test]
    fn test_wall_splits_graph() {
        // Two clusters on either side of x = 5
        let mut graph = PatrolGraph::from_positions([
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(8.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
        ]);
        PatrolGraphBuilder::default().build(&mut graph, &WallAt { x: 5.0 });

        assert!(graph.are_linked(NodeId(0), NodeId(1)));
        assert!(graph.are_linked(NodeId(2), NodeId(3)));
        assert!(!graph.are_linked(NodeId(1), NodeId(2)));
        assert!(graph.is_symmetric());
    }

    #[test]
    fn test_nearby_hits_stop_radius_growth() {
        // Node 1 is visible at the first radius, so the far node 2 is never tried
        let graph = PatrolGraph::from_positions([
            Vec3::ZERO,
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(12.0, 0.0, 0.0),
        ]);
        let builder = PatrolGraphBuilder::default();

        assert_eq!(builder.discover(&graph, NodeId(0), &OpenSpace), vec![NodeId(1)]);
        // Node 2 finds nothing at 8 and picks up both others at 16
        assert_eq!(
            builder.discover(&graph, NodeId(2), &OpenSpace),
            vec![NodeId(1), NodeId(0)]
        );
    }

    #[test]
    fn test_rebuild_clears_stale_links() {
        let mut graph = grid_graph(3, 2.0);
        let builder = PatrolGraphBuilder::default();

        builder.build(&mut graph, &OpenSpace);
        let first = graph.edge_count();
        graph.connect(NodeId(0), NodeId(8));

        builder.build(&mut graph, &OpenSpace);
        assert_eq!(graph.edge_count(), first);
        assert!(!graph.are_linked(NodeId(0), NodeId(8)));
    }

    #[test]
    fn test_spawn_grid_snaps_and_skips_obstacles() {
        let config = SpawnerConfig {
            extent: Vec3::new(10.0, 0.0, 10.0),
            resolution: UVec2::new(3, 3),
            ..Default::default()
        };

        let points = spawn_grid(&config, &Floor { height: 1.5 });
        assert_eq!(points.len(), 9);
        assert!(points.iter().all(|p| p.y == 1.5));
        assert!(points.contains(&Vec3::new(-5.0, 1.5, -5.0)));

        // The wall at x = 0 removes the middle column
        let points = spawn_grid(&config, &WallAt { x: 0.0 });
        assert_eq!(points.len(), 6);
        assert!(points.iter().all(|p| p.x != 0.0 && p.y == 0.0));
    }

    #[test]
    fn test_spawn_grid_single_row() {
        let config = SpawnerConfig {
            resolution: UVec2::new(1, 4),
            ..Default::default()
        };
        let points = spawn_grid(&config, &OpenSpace);

        assert_eq!(points.len(), 4);
        assert!(points.iter().all(|p| p.x == 0.0));
    }
}
