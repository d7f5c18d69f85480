//! Barnes-Hut quadtree for the community layout repulsion pass.
//!
//! Cells live in a flat arena. Distant cells are approximated by their centre
//! of mass so one repulsion pass costs O(n log n).

use egui::{Pos2, Rect, Vec2};

/// Depth cap for coincident bodies
const MAX_DEPTH: u32 = 40;

#[derive(Debug, Clone, Copy)]
enum Cell {
    Empty,
    Body { pos: Pos2, mass: f32 },
    /// Index of the first of four consecutive children (NW, NE, SW, SE)
    Split {
        first_child: usize,
        center_of_mass: Pos2,
        total_mass: f32,
    },
}

pub struct Quadtree {
    cells: Vec<Cell>,
    bounds: Vec<Rect>,
    theta: f32,
}

fn quadrant(bounds: Rect, pos: Pos2) -> usize {
    let c = bounds.center();
    match (pos.y >= c.y, pos.x >= c.x) {
        (false, false) => 0,
        (false, true) => 1,
        (true, false) => 2,
        (true, true) => 3,
    }
}

fn child_rect(bounds: Rect, quadrant: usize) -> Rect {
    let c = bounds.center();
    match quadrant {
        0 => Rect::from_min_max(bounds.min, c),
        1 => Rect::from_min_max(Pos2::new(c.x, bounds.min.y), Pos2::new(bounds.max.x, c.y)),
        2 => Rect::from_min_max(Pos2::new(bounds.min.x, c.y), Pos2::new(c.x, bounds.max.y)),
        _ => Rect::from_min_max(c, bounds.max),
    }
}

fn merge(a: Pos2, a_mass: f32, b: Pos2, b_mass: f32) -> (Pos2, f32) {
    let total = a_mass + b_mass;
    if total <= 0.0 {
        return (a, 0.0);
    }
    let com = Pos2::new(
        (a.x * a_mass + b.x * b_mass) / total,
        (a.y * a_mass + b.y * b_mass) / total,
    );
    (com, total)
}

impl Quadtree {
    /// Build from `(position, mass)` bodies. `theta` trades accuracy for speed.
    pub fn build(bodies: &[(Pos2, f32)], theta: f32) -> Self {
        let mut tree = Self {
            cells: vec![Cell::Empty],
            bounds: vec![Rect::NOTHING],
            theta,
        };

        let finite = bodies.iter().filter(|(p, _)| p.x.is_finite() && p.y.is_finite());
        let mut extent = Rect::NOTHING;
        for (pos, _) in finite.clone() {
            extent.extend_with(*pos);
        }
        if extent.min.x > extent.max.x {
            return tree;
        }

        let side = extent.width().max(extent.height()) + 200.0;
        tree.bounds[0] = Rect::from_min_size(extent.min - Vec2::splat(100.0), Vec2::splat(side));

        for &(pos, mass) in finite {
            tree.insert(0, pos, mass, 0);
        }
        tree
    }

    fn insert(&mut self, cell: usize, pos: Pos2, mass: f32, depth: u32) {
        match self.cells[cell] {
            Cell::Empty => self.cells[cell] = Cell::Body { pos, mass },
            Cell::Body { pos: old, mass: old_mass } => {
                if depth >= MAX_DEPTH {
                    let (com, total) = merge(old, old_mass, pos, mass);
                    self.cells[cell] = Cell::Body { pos: com, mass: total };
                    return;
                }
                let first_child = self.split(cell);
                let (com, total) = merge(old, old_mass, pos, mass);
                self.cells[cell] = Cell::Split {
                    first_child,
                    center_of_mass: com,
                    total_mass: total,
                };
                let b = self.bounds[cell];
                self.insert(first_child + quadrant(b, old), old, old_mass, depth + 1);
                self.insert(first_child + quadrant(b, pos), pos, mass, depth + 1);
            }
            Cell::Split {
                first_child,
                center_of_mass,
                total_mass,
            } => {
                let (com, total) = merge(center_of_mass, total_mass, pos, mass);
                self.cells[cell] = Cell::Split {
                    first_child,
                    center_of_mass: com,
                    total_mass: total,
                };
                let q = quadrant(self.bounds[cell], pos);
                self.insert(first_child + q, pos, mass, depth + 1);
            }
        }
    }

    fn split(&mut self, cell: usize) -> usize {
        let first = self.cells.len();
        let b = self.bounds[cell];
        for q in 0..4 {
            self.cells.push(Cell::Empty);
            self.bounds.push(child_rect(b, q));
        }
        first
    }

    /// Total mass held by the tree
    pub fn total_mass(&self) -> f32 {
        match self.cells[0] {
            Cell::Empty => 0.0,
            Cell::Body { mass, .. } => mass,
            Cell::Split { total_mass, .. } => total_mass,
        }
    }

    /// Repulsion felt by a body at `pos`. Bodies at the same spot are skipped.
    pub fn repulsion(&self, pos: Pos2, strength: f32, min_distance: f32) -> Vec2 {
        let mut force = Vec2::ZERO;
        let mut stack = vec![0usize];

        while let Some(cell) = stack.pop() {
            match self.cells[cell] {
                Cell::Empty => {}
                Cell::Body { pos: other, mass } => {
                    let delta = pos - other;
                    if delta.length() < 0.01 {
                        continue;
                    }
                    force += push(delta, mass, strength, min_distance);
                }
                Cell::Split {
                    first_child,
                    center_of_mass,
                    total_mass,
                } => {
                    let delta = pos - center_of_mass;
                    let distance = delta.length().max(min_distance);
                    let size = self.bounds[cell].width();
                    if size / distance < self.theta {
                        force += push(delta, total_mass, strength, min_distance);
                    } else {
                        stack.extend(first_child..first_child + 4);
                    }
                }
            }
        }

        force
    }
}

/// Inverse-square push away from a mass at `-delta`
fn push(delta: Vec2, mass: f32, strength: f32, min_distance: f32) -> Vec2 {
    let distance = delta.length().max(min_distance);
    if delta.length() < f32::EPSILON {
        return Vec2::ZERO;
    }
    (delta / delta.length()) * (strength * mass / (distance * distance))
}
