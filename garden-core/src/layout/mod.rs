// Simulation state for the garden.
//
// A `Layout` is an ordered list of per-node entries (position, velocity, and
// the bits of the node the physics and hit-testing need), plus an id index.
// Order follows the graph payload and is the "layout order" hit-testing
// resolves ties with.
//
// Submodules:
// - reconcile: merge a refreshed graph into the previous layout
// - physics: one simulation tick
// - spatial_grid: neighbour lookup for pairwise repulsion

use std::collections::HashMap;

use serde::Serialize;

use crate::config::CanvasSize;
use crate::model::NodeKind;

mod physics;
mod reconcile;
mod spatial_grid;

pub use physics::step;
pub use reconcile::reconcile;

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct PointF {
    pub x: f64,
    pub y: f64,
}

impl PointF {
    pub fn distance(&self, other: &PointF) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// The box nodes must stay in: `[margin, size - margin]` on both axes.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
}

impl Bounds {
    pub fn new(width: f64, height: f64, margin: f64) -> Self {
        Self { width, height, margin }
    }

    pub fn from_canvas(canvas: &CanvasSize, margin: f64) -> Self {
        Self::new(canvas.width, canvas.height, margin)
    }

    pub fn center(&self) -> PointF {
        PointF { x: self.width / 2.0, y: self.height / 2.0 }
    }

    pub fn clamp_x(&self, x: f64) -> f64 {
        clamp_axis(x, self.width, self.margin)
    }

    pub fn clamp_y(&self, y: f64) -> f64 {
        clamp_axis(y, self.height, self.margin)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x == self.clamp_x(x) && y == self.clamp_y(y)
    }
}

/// Clamp into `[margin, size - margin]`; a range narrower than nothing
/// collapses to the midpoint.
fn clamp_axis(v: f64, size: f64, margin: f64) -> f64 {
    let lo = margin;
    let hi = size - margin;
    if hi < lo {
        return size / 2.0;
    }
    v.clamp(lo, hi)
}

#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize)]
pub struct NodeState {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
}

impl NodeState {
    pub fn at(x: f64, y: f64) -> Self {
        Self { x, y, vx: 0.0, vy: 0.0 }
    }

    pub fn position(&self) -> PointF {
        PointF { x: self.x, y: self.y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.vx.is_finite() && self.vy.is_finite()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutEntry {
    pub id: String,
    pub kind: NodeKind,
    /// Draw radius before pulsing.
    pub radius: f64,
    pub state: NodeState,
}

impl LayoutEntry {
    pub fn is_hub(&self) -> bool {
        self.kind == NodeKind::Category
    }
}

#[derive(Debug, Clone, Default)]
pub struct Layout {
    entries: Vec<LayoutEntry>,
    index: HashMap<String, usize>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. An id already present is replaced in place.
    pub fn insert(&mut self, entry: LayoutEntry) {
        match self.index.get(&entry.id) {
            Some(&i) => self.entries[i] = entry,
            None => {
                self.index.insert(entry.id.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LayoutEntry] {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [LayoutEntry] {
        &mut self.entries
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&LayoutEntry> {
        self.index_of(id).map(|i| &self.entries[i])
    }

    pub fn state(&self, id: &str) -> Option<NodeState> {
        self.get(id).map(|e| e.state)
    }

    pub fn position(&self, id: &str) -> Option<PointF> {
        self.get(id).map(|e| e.state.position())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Move a node and zero its velocity. Returns false for unknown ids.
    pub fn set_position(&mut self, id: &str, x: f64, y: f64) -> bool {
        match self.index_of(id) {
            Some(i) => {
                self.entries[i].state = NodeState::at(x, y);
                true
            }
            None => false,
        }
    }

    /// Sum of `0.5 * |v|^2` over all nodes (unit mass).
    pub fn kinetic_energy(&self) -> f64 {
        self.entries
            .iter()
            .map(|e| 0.5 * (e.state.vx * e.state.vx + e.state.vy * e.state.vy))
            .sum()
    }
}
