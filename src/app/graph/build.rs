use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};

use crate::kg::{GraphSnapshot, VisibleGraph};
use crate::util::stable_pair;

use super::super::render_utils::node_size;
use super::{RenderEdge, RenderGraph, RenderNode};

const SEED_RING: f32 = 220.0;
const OWNER_JITTER: f32 = 36.0;

struct PriorLayout {
    world_pos: Vec2,
    velocity: Vec2,
    pinned: bool,
}

fn jitter_direction(id: &str, index: usize) -> Vec2 {
    let (jx, jy) = stable_pair(id);
    let direction = vec2(jx, jy);
    if direction.length_sq() > 0.0001 {
        return direction.normalized();
    }
    let angle = ((index as f32) * 0.618_034 + 0.11) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

/// Rebuilds the render graph for `visible`, carrying positions over from
/// `previous` by node id. Newly shown nodes start next to an already placed
/// owner when there is one, otherwise on a ring around the origin.
pub(in crate::app) fn sync_render_graph(
    previous: Option<RenderGraph>,
    snapshot: &GraphSnapshot,
    visible: &VisibleGraph,
    min_size: f32,
    max_size: f32,
) -> RenderGraph {
    let (mut prior, scratch) = match previous {
        Some(graph) => {
            let prior = graph
                .nodes
                .into_iter()
                .map(|node| {
                    (
                        node.id,
                        PriorLayout {
                            world_pos: node.world_pos,
                            velocity: node.velocity,
                            pinned: node.pinned,
                        },
                    )
                })
                .collect::<HashMap<_, _>>();
            (prior, Some((graph.physics_scratch, graph.view_scratch)))
        }
        None => (HashMap::new(), None),
    };

    let mut nodes = Vec::with_capacity(visible.nodes().len());
    let mut placed: HashMap<usize, Vec2> = HashMap::new();
    let mut fresh = Vec::new();

    for &snapshot_index in visible.nodes() {
        let Some(graph_node) = snapshot.node(snapshot_index) else {
            continue;
        };
        let radius = node_size(graph_node.degree, min_size, max_size, false);
        let mut node = RenderNode {
            id: graph_node.id.clone(),
            snapshot_index,
            kind: graph_node.effective_kind(),
            world_pos: Vec2::ZERO,
            velocity: Vec2::ZERO,
            radius,
            pinned: false,
        };

        if let Some(layout) = prior.remove(&graph_node.id) {
            node.world_pos = layout.world_pos;
            node.velocity = layout.velocity;
            node.pinned = layout.pinned;
            placed.insert(snapshot_index, layout.world_pos);
        } else {
            fresh.push(nodes.len());
        }
        nodes.push(node);
    }

    // Snapshot order lists owners first, so one pass places children beside
    // owners seeded earlier in the same rebuild.
    for &index in &fresh {
        let node = &nodes[index];
        let direction = jitter_direction(&node.id, index);
        let anchor = snapshot
            .owners(node.snapshot_index)
            .iter()
            .find_map(|owner| placed.get(owner).copied());

        let (world_pos, speed) = match anchor {
            Some(anchor) => (anchor + direction * OWNER_JITTER, 0.6),
            None => {
                let ring = SEED_RING * (1.0 + (nodes.len() as f32).sqrt() * 0.05);
                (direction * ring * (0.35 + 0.65 * stable_pair(&node.id).0.abs()), 1.15)
            }
        };

        let snapshot_index = node.snapshot_index;
        let node = &mut nodes[index];
        node.world_pos = world_pos;
        node.velocity = direction * speed;
        placed.insert(snapshot_index, world_pos);
    }

    let index_by_snapshot = nodes
        .iter()
        .enumerate()
        .map(|(index, node)| (node.snapshot_index, index))
        .collect::<HashMap<_, _>>();

    let edges = visible
        .edges()
        .iter()
        .filter_map(|&edge| {
            let (source, target) = snapshot.endpoints(edge)?;
            Some(RenderEdge {
                source: *index_by_snapshot.get(&source)?,
                target: *index_by_snapshot.get(&target)?,
                edge,
                relation: snapshot.edge(edge)?.relation,
            })
        })
        .collect();

    let mut graph = RenderGraph::from_parts(nodes, edges);
    if let Some((physics_scratch, view_scratch)) = scratch {
        graph.physics_scratch = physics_scratch;
        graph.view_scratch = view_scratch;
    }
    tracing::debug!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        seeded = fresh.len(),
        "render graph rebuilt"
    );
    graph
}
