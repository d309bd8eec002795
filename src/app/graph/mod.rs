mod build;
mod interaction;
mod view;

use std::collections::HashMap;

use eframe::egui::{Pos2, Vec2};

use crate::kg::{NodeKind, RelationKind};

pub(in crate::app) use build::sync_render_graph;

/// Laid-out copy of the visible graph. Positions persist across rebuilds by
/// node id.
pub(in crate::app) struct RenderGraph {
    pub(in crate::app) nodes: Vec<RenderNode>,
    pub(in crate::app) edges: Vec<RenderEdge>,
    pub(in crate::app) index_by_snapshot: HashMap<usize, usize>,
    pub(in crate::app) physics_scratch: PhysicsScratch,
    pub(in crate::app) view_scratch: ViewScratch,
}

pub(in crate::app) struct RenderNode {
    pub(in crate::app) id: String,
    pub(in crate::app) snapshot_index: usize,
    pub(in crate::app) kind: NodeKind,
    pub(in crate::app) world_pos: Vec2,
    pub(in crate::app) velocity: Vec2,
    pub(in crate::app) radius: f32,
    pub(in crate::app) pinned: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) struct RenderEdge {
    pub(in crate::app) source: usize,
    pub(in crate::app) target: usize,
    /// Snapshot edge index.
    pub(in crate::app) edge: usize,
    pub(in crate::app) relation: RelationKind,
}

#[derive(Default)]
pub(in crate::app) struct PhysicsScratch {
    pub(in crate::app) forces: Vec<Vec2>,
    pub(in crate::app) positions: Vec<Vec2>,
    pub(in crate::app) radii: Vec<f32>,
}

#[derive(Default)]
pub(in crate::app) struct ViewScratch {
    pub(in crate::app) screen_positions: Vec<Pos2>,
    pub(in crate::app) screen_radii: Vec<f32>,
    pub(in crate::app) on_screen: Vec<bool>,
}

impl RenderGraph {
    pub(in crate::app) fn from_parts(nodes: Vec<RenderNode>, edges: Vec<RenderEdge>) -> Self {
        let index_by_snapshot = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.snapshot_index, index))
            .collect();
        Self {
            nodes,
            edges,
            index_by_snapshot,
            physics_scratch: PhysicsScratch::default(),
            view_scratch: ViewScratch::default(),
        }
    }

    pub(in crate::app) fn render_index(&self, snapshot_index: usize) -> Option<usize> {
        self.index_by_snapshot.get(&snapshot_index).copied()
    }

    pub(in crate::app) fn world_position(&self, snapshot_index: usize) -> Option<Vec2> {
        self.render_index(snapshot_index)
            .map(|index| self.nodes[index].world_pos)
    }
}
