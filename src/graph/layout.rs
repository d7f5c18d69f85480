//! Force-directed relaxation for nodes the server did not place.
//!
//! - Repulsion between all nodes via Barnes-Hut
//! - Spring attraction along edges
//! - Weak pull toward the centre
//!
//! Pinned nodes push and pull others but never move.

use super::quadtree::Quadtree;
use super::state::GraphState;
use egui::{Pos2, Vec2};

pub struct ForceLayout {
    pub repulsion: f32,
    pub attraction: f32,
    pub centering: f32,
    /// Velocity kept between steps (0.0 - 1.0)
    pub damping: f32,
    pub min_distance: f32,
    pub max_velocity: f32,
    pub ideal_length: f32,
    pub theta: f32,
}

impl Default for ForceLayout {
    fn default() -> Self {
        Self {
            repulsion: 12000.0,
            attraction: 0.08,
            centering: 0.0005,
            damping: 0.88,
            min_distance: 30.0,
            max_velocity: 50.0,
            ideal_length: 120.0,
            theta: 1.0,
        }
    }
}

impl ForceLayout {
    /// Advance the simulation by one step
    pub fn step(&self, state: &mut GraphState, center: Pos2) {
        let n = state.positions.len();
        if !state.physics_enabled || n == 0 {
            return;
        }

        // Mass follows display size so hubs hold their ground
        let masses: Vec<f32> = state
            .graph
            .nodes()
            .map(|node| 1.0 + node.display_size / 7.0)
            .collect();

        let bodies: Vec<(Pos2, f32)> = state
            .positions
            .iter()
            .copied()
            .zip(masses.iter().copied())
            .collect();
        let tree = Quadtree::build(&bodies, self.theta);

        let mut forces: Vec<Vec2> = state
            .positions
            .iter()
            .map(|&pos| {
                tree.repulsion(pos, self.repulsion, self.min_distance)
                    + (center - pos) * self.centering
            })
            .collect();

        for (a, b) in state.graph.edge_endpoints() {
            if a == b {
                continue;
            }
            let delta = state.positions[b] - state.positions[a];
            let distance = delta.length().max(self.min_distance);
            let stretch = distance - self.ideal_length;
            let pull = (delta / distance) * (self.attraction * stretch);
            forces[a] += pull;
            forces[b] -= pull;
        }

        for i in 0..n {
            if state.pinned[i] {
                continue;
            }
            let mut vel = (state.velocities[i] + forces[i] / masses[i]) * self.damping;
            if !vel.x.is_finite() || !vel.y.is_finite() {
                vel = Vec2::ZERO;
            }
            if vel.length() > self.max_velocity {
                vel = vel.normalized() * self.max_velocity;
            }
            state.velocities[i] = vel;
            state.positions[i] += vel;
        }
    }

    /// Average speed of the moving nodes is below the rest threshold
    pub fn is_settled(&self, state: &GraphState) -> bool {
        let (total, count) = state
            .velocities
            .iter()
            .zip(&state.pinned)
            .filter(|(_, pinned)| !**pinned)
            .fold((0.0, 0usize), |(sum, cnt), (v, _)| (sum + v.length(), cnt + 1));
        total / (count.max(1) as f32) < 0.5
    }
}
