mod forces;
mod quadtree;

use eframe::egui::Vec2;

use super::graph::RenderGraph;
use forces::{CollisionParams, accumulate_collision_pairs, accumulate_repulsion_for_node};
use quadtree::QuadNode;

const BARNES_HUT_THETA: f32 = 0.72;

/// Tunables exposed in the physics panel; scales are multipliers on the
/// built-in force constants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct PhysicsConfig {
    pub(in crate::app) intensity: f32,
    pub(in crate::app) repulsion_scale: f32,
    pub(in crate::app) link_scale: f32,
    pub(in crate::app) collision_scale: f32,
    pub(in crate::app) velocity_damping: f32,
    pub(in crate::app) delta_seconds: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            intensity: 1.0,
            repulsion_scale: 1.0,
            link_scale: 1.0,
            collision_scale: 1.0,
            velocity_damping: 0.88,
            delta_seconds: 1.0 / 60.0,
        }
    }
}

/// One integration step over the render graph. Returns true while any node
/// is still moving.
pub(in crate::app) fn step_physics(graph: &mut RenderGraph, config: PhysicsConfig) -> bool {
    let node_count = graph.nodes.len();
    if node_count < 2 {
        return false;
    }

    let scratch = &mut graph.physics_scratch;
    scratch.forces.clear();
    scratch.forces.resize(node_count, Vec2::ZERO);
    scratch.positions.clear();
    scratch.radii.clear();
    let mut max_radius = 0.0_f32;
    for node in &graph.nodes {
        scratch.positions.push(node.world_pos);
        scratch.radii.push(node.radius);
        max_radius = max_radius.max(node.radius);
    }

    let forces = &mut scratch.forces;
    let positions = &scratch.positions;
    let radii = &scratch.radii;

    let intensity = config.intensity.clamp(0.2, 2.5);
    let repulsion_strength = 24_000.0 * intensity * config.repulsion_scale.clamp(0.25, 2.6);
    let link_strength = 0.03 * intensity * config.link_scale.clamp(0.2, 2.2);
    let link_damping = 0.2;
    let collision_strength = 1.4 * intensity * config.collision_scale.clamp(0.2, 2.0);
    let center_pull = 0.0015 * intensity;
    let damping = config.velocity_damping.clamp(0.7, 0.97);
    let softening = 400.0;
    let time_step_scale = (config.delta_seconds * 60.0).clamp(0.25, 3.0);
    let damping_factor = damping.powf(time_step_scale);

    if let Some(quadtree) = QuadNode::build(positions) {
        for (index, force) in forces.iter_mut().enumerate() {
            accumulate_repulsion_for_node(
                &quadtree,
                index,
                positions,
                repulsion_strength,
                softening,
                BARNES_HUT_THETA,
                force,
            );
        }

        let max_collision_distance = max_radius * 2.0 * forces::COLLISION_PADDING;
        if max_collision_distance > 0.0 {
            accumulate_collision_pairs(
                &quadtree,
                &quadtree,
                true,
                positions,
                radii,
                CollisionParams {
                    collision_strength,
                    max_collision_distance_sq: max_collision_distance * max_collision_distance,
                },
                forces,
            );
        }
    }

    for edge in &graph.edges {
        let (from, to) = (edge.source, edge.target);
        if from >= node_count || to >= node_count || from == to {
            continue;
        }

        let delta = graph.nodes[from].world_pos - graph.nodes[to].world_pos;
        let distance = delta.length();
        if distance <= 0.0001 {
            continue;
        }
        let direction = delta / distance;

        let preferred = 48.0 + (graph.nodes[from].radius + graph.nodes[to].radius) * 2.5;
        let spring = (distance - preferred) * link_strength;
        let relative_velocity = graph.nodes[from].velocity - graph.nodes[to].velocity;
        let correction = direction * (spring + relative_velocity.dot(direction) * link_damping);

        forces[from] -= correction;
        forces[to] += correction;
    }

    let max_force = 140.0 + (intensity * 80.0);
    let max_speed = 10.0 + (intensity * 14.0);
    let mut any_motion = false;
    for (node, force) in graph.nodes.iter_mut().zip(forces.iter()) {
        let mut force = *force - node.world_pos * center_pull;
        let force_sq = force.length_sq();
        if force_sq > max_force * max_force {
            force *= max_force / force_sq.sqrt();
        }

        if node.pinned {
            node.velocity = Vec2::ZERO;
            continue;
        }

        let mut velocity = (node.velocity + force * (0.055 * time_step_scale)) * damping_factor;
        let speed_sq = velocity.length_sq();
        if speed_sq > max_speed * max_speed {
            velocity *= max_speed / speed_sq.sqrt();
        }
        if velocity.length_sq() < 0.02 * 0.02 && force_sq < 0.08 * 0.08 {
            velocity = Vec2::ZERO;
        }

        node.velocity = velocity;
        node.world_pos += velocity * time_step_scale;
        any_motion |= velocity.length_sq() > 0.000_001;
    }

    any_motion
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;
    use crate::app::graph::{RenderEdge, RenderNode};
    use crate::kg::{NodeKind, RelationKind};

    fn node(id: &str, index: usize, position: Vec2) -> RenderNode {
        RenderNode {
            id: id.to_owned(),
            snapshot_index: index,
            kind: NodeKind::Entity,
            world_pos: position,
            velocity: Vec2::ZERO,
            radius: 8.0,
            pinned: false,
        }
    }

    #[test]
    fn overlapping_nodes_are_pushed_apart() {
        let mut graph = RenderGraph::from_parts(
            vec![node("a", 0, vec2(0.0, 0.0)), node("b", 1, vec2(1.0, 0.0))],
            Vec::new(),
        );

        for _ in 0..30 {
            step_physics(&mut graph, PhysicsConfig::default());
        }

        let gap = graph.nodes[0].world_pos.to_pos2().distance(graph.nodes[1].world_pos.to_pos2());
        assert!(gap > 16.0, "nodes still overlap at distance {gap}");
    }

    #[test]
    fn linked_nodes_settle_closer_than_unlinked_ones() {
        let far = [vec2(-300.0, 0.0), vec2(300.0, 0.0)];
        let linked_edge = RenderEdge {
            source: 0,
            target: 1,
            edge: 0,
            relation: RelationKind::Generic,
        };
        let mut linked = RenderGraph::from_parts(
            vec![node("a", 0, far[0]), node("b", 1, far[1])],
            vec![linked_edge],
        );
        let mut unlinked =
            RenderGraph::from_parts(vec![node("a", 0, far[0]), node("b", 1, far[1])], Vec::new());

        for _ in 0..400 {
            step_physics(&mut linked, PhysicsConfig::default());
            step_physics(&mut unlinked, PhysicsConfig::default());
        }

        let linked_gap = linked.nodes[0].world_pos.to_pos2().distance(linked.nodes[1].world_pos.to_pos2());
        let unlinked_gap = unlinked.nodes[0].world_pos.to_pos2().distance(unlinked.nodes[1].world_pos.to_pos2());
        assert!(linked_gap < unlinked_gap);
    }

    #[test]
    fn pinned_nodes_do_not_move() {
        let mut pinned = node("a", 0, vec2(5.0, 5.0));
        pinned.pinned = true;
        let mut graph = RenderGraph::from_parts(vec![pinned, node("b", 1, vec2(6.0, 5.0))], Vec::new());

        step_physics(&mut graph, PhysicsConfig::default());

        assert_eq!(graph.nodes[0].world_pos, vec2(5.0, 5.0));
    }
}
