// Merge a refreshed graph into the existing layout.
//
// Ids seen before keep their position and velocity untouched so the garden
// does not jump on refresh. New ids are seeded on a ring around the canvas
// center (small ring for hubs, wider jittered ring for facts). Ids that are
// gone are dropped.

use std::f64::consts::TAU;

use rand::Rng;

use super::{Bounds, Layout, LayoutEntry, NodeState};
use crate::config::SeedConfig;
use crate::model::{GraphData, GraphNode};

/// Build the layout for `data`, carrying over state from `previous`.
///
/// The RNG is only consulted for facts that are new in this refresh.
pub fn reconcile<R: Rng + ?Sized>(
    previous: &Layout,
    data: &GraphData,
    bounds: &Bounds,
    seed: &SeedConfig,
    rng: &mut R,
) -> Layout {
    let count = data.nodes.len();
    let mut layout = Layout::new();
    let mut carried = 0usize;

    for (i, node) in data.nodes.iter().enumerate() {
        let state = match previous.state(&node.id) {
            Some(state) => {
                carried += 1;
                state
            }
            None => seed_state(node, i, count, bounds, seed, rng),
        };
        layout.insert(LayoutEntry {
            id: node.id.clone(),
            kind: node.kind,
            radius: node.radius(),
            state,
        });
    }

    log::debug!(
        "reconciled {} nodes ({} carried, {} seeded, {} dropped)",
        count,
        carried,
        count - carried,
        previous.len().saturating_sub(carried)
    );
    layout
}

fn seed_state<R: Rng + ?Sized>(
    node: &GraphNode,
    index: usize,
    count: usize,
    bounds: &Bounds,
    seed: &SeedConfig,
    rng: &mut R,
) -> NodeState {
    let angle = TAU * index as f64 / count.max(1) as f64;
    let radius = if node.is_hub() {
        seed.hub_radius
    } else if seed.fact_radius_jitter > 0.0 {
        seed.fact_radius_min + rng.gen_range(0.0..seed.fact_radius_jitter)
    } else {
        seed.fact_radius_min
    };
    let center = bounds.center();
    NodeState::at(
        bounds.clamp_x(center.x + angle.cos() * radius),
        bounds.clamp_y(center.y + angle.sin() * radius),
    )
}
