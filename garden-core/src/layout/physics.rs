// One tick of the garden simulation.
//
// Forces are accumulated from the positions at the start of the tick and
// applied afterwards, so the result does not depend on node order:
// 1. centering pull toward the canvas middle
// 2. pairwise repulsion inside a minimum distance (wider around hubs)
// 3. springs along links toward a rest length
// 4. damping
// 5. integration, then clamping into the bounds
//
// No randomness here: the same layout, links and bounds always produce the
// same next layout.

use super::spatial_grid::SpatialGrid;
use super::{Bounds, Layout, PointF};
use crate::config::PhysicsConfig;
use crate::model::Link;

/// Below this, two nodes count as coincident.
const EPSILON: f64 = 1e-6;
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Advance `layout` by one tick.
///
/// Links whose endpoints are not in the layout are skipped. An empty layout
/// is left alone.
pub fn step(layout: &mut Layout, links: &[Link], bounds: &Bounds, cfg: &PhysicsConfig) {
    if layout.is_empty() {
        return;
    }
    let center = bounds.center();

    // Anything non-finite restarts from the middle with no velocity.
    for entry in layout.entries_mut() {
        if !entry.state.is_finite() {
            log::warn!("resetting non-finite state of node '{}'", entry.id);
            entry.state.x = center.x;
            entry.state.y = center.y;
            entry.state.vx = 0.0;
            entry.state.vy = 0.0;
        }
    }

    let positions: Vec<PointF> = layout.entries().iter().map(|e| e.state.position()).collect();
    let hubs: Vec<bool> = layout.entries().iter().map(|e| e.is_hub()).collect();
    let mut forces: Vec<(f64, f64)> = vec![(0.0, 0.0); positions.len()];

    // Centering
    for (force, p) in forces.iter_mut().zip(&positions) {
        force.0 += (center.x - p.x) * cfg.center_strength;
        force.1 += (center.y - p.y) * cfg.center_strength;
    }

    // Repulsion
    let grid = SpatialGrid::from_points(&positions, cfg.max_min_distance());
    for i in 0..positions.len() {
        for j in grid.query(&positions[i]) {
            if j <= i {
                continue;
            }
            let min_dist = if hubs[i] || hubs[j] { cfg.hub_min_distance } else { cfg.min_distance };
            let (dx, dy, dist) = separation(&positions[i], &positions[j], i, j);
            if dist < min_dist {
                let f = (min_dist - dist) / dist * cfg.repulsion;
                forces[i].0 += dx * f;
                forces[i].1 += dy * f;
                forces[j].0 -= dx * f;
                forces[j].1 -= dy * f;
            }
        }
    }

    // Springs
    for link in links {
        let (Some(s), Some(t)) = (layout.index_of(&link.source), layout.index_of(&link.target)) else {
            continue;
        };
        if s == t {
            continue;
        }
        let dx = positions[t].x - positions[s].x;
        let dy = positions[t].y - positions[s].y;
        let dist = dx.hypot(dy);
        let dist = if dist < EPSILON { 1.0 } else { dist };
        let f = (dist - cfg.link_distance) / dist * cfg.link_strength;
        forces[s].0 += dx * f;
        forces[s].1 += dy * f;
        forces[t].0 -= dx * f;
        forces[t].1 -= dy * f;
    }

    // Damping, integration, containment
    for (entry, force) in layout.entries_mut().iter_mut().zip(&forces) {
        let state = &mut entry.state;
        state.vx = (state.vx + force.0) * cfg.damping;
        state.vy = (state.vy + force.1) * cfg.damping;
        if !state.vx.is_finite() || !state.vy.is_finite() {
            state.vx = 0.0;
            state.vy = 0.0;
        }

        state.x += state.vx;
        state.y += state.vy;
        if !state.x.is_finite() || !state.y.is_finite() {
            state.x = center.x;
            state.y = center.y;
        }
        state.x = bounds.clamp_x(state.x);
        state.y = bounds.clamp_y(state.y);
    }
}

/// Vector from `b` to `a` and its length. Coincident points get a fixed unit
/// direction derived from their indices, with length 1.
fn separation(a: &PointF, b: &PointF, i: usize, j: usize) -> (f64, f64, f64) {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    if dx.abs() < EPSILON && dy.abs() < EPSILON {
        let angle = (i * 31 + j * 17 + 1) as f64 * GOLDEN_ANGLE;
        return (angle.cos(), angle.sin(), 1.0);
    }
    let dist = dx.hypot(dy);
    (dx, dy, dist.max(EPSILON))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeedConfig;
    use crate::layout::{LayoutEntry, NodeState, reconcile};
    use crate::model::{Category, GraphData, GraphNode, NodeKind, Sentiment};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn bounds() -> Bounds {
        Bounds::new(1200.0, 700.0, 30.0)
    }

    fn fact(id: &str, x: f64, y: f64) -> LayoutEntry {
        LayoutEntry { id: id.to_string(), kind: NodeKind::Fact, radius: 10.0, state: NodeState::at(x, y) }
    }

    fn assert_healthy(layout: &Layout, b: &Bounds) {
        for e in layout.entries() {
            assert!(e.state.is_finite(), "node {} not finite: {:?}", e.id, e.state);
            assert!(b.contains(e.state.x, e.state.y), "node {} out of bounds: {:?}", e.id, e.state);
        }
    }

    #[test]
    fn test_hub_and_fact_settle_near_rest_length() {
        let data = GraphData::new(
            vec![
                GraphNode::hub(Category::Feeling),
                GraphNode::fact("m1", "calm", Category::Feeling, Sentiment::Joy),
            ],
            vec![Link::new("cat-feeling", "m1")],
        );
        let cfg = PhysicsConfig::default();
        let b = bounds();
        let mut layout = reconcile(&Layout::new(), &data, &b, &SeedConfig::default(), &mut StdRng::seed_from_u64(11));

        for _ in 0..200 {
            step(&mut layout, &data.links, &b, &cfg);
        }

        let d = layout.position("cat-feeling").unwrap().distance(&layout.position("m1").unwrap());
        assert!(d > 96.0 && d < 144.0, "distance {} not near 120", d);
        assert_healthy(&layout, &b);
    }

    #[test]
    fn test_coincident_facts_separate() {
        let mut layout = Layout::new();
        layout.insert(fact("a", 400.0, 300.0));
        layout.insert(fact("b", 400.0, 300.0));

        step(&mut layout, &[], &bounds(), &PhysicsConfig::default());

        let d = layout.position("a").unwrap().distance(&layout.position("b").unwrap());
        assert!(d > 0.0);
        assert_healthy(&layout, &bounds());
    }

    #[test]
    fn test_coincident_in_corner_still_separate() {
        let b = bounds();
        let mut layout = Layout::new();
        layout.insert(fact("a", 30.0, 30.0));
        layout.insert(fact("b", 30.0, 30.0));

        step(&mut layout, &[], &b, &PhysicsConfig::default());

        let d = layout.position("a").unwrap().distance(&layout.position("b").unwrap());
        assert!(d > 0.0);
        assert_healthy(&layout, &b);
    }

    #[test]
    fn test_boundedness_and_finiteness_over_many_steps() {
        let mut rng = StdRng::seed_from_u64(42);
        let b = bounds();
        let mut layout = Layout::new();
        let mut links = Vec::new();
        layout.insert(LayoutEntry {
            id: "hub".to_string(),
            kind: NodeKind::Category,
            radius: 28.0,
            state: NodeState::at(600.0, 350.0),
        });
        for i in 0..80 {
            let id = format!("m{}", i);
            // Start some nodes far outside the canvas with wild velocities.
            let mut state = NodeState::at(rng.gen_range(-500.0..1700.0), rng.gen_range(-500.0..1200.0));
            state.vx = rng.gen_range(-300.0..300.0);
            state.vy = rng.gen_range(-300.0..300.0);
            layout.insert(LayoutEntry { id: id.clone(), kind: NodeKind::Fact, radius: 10.0, state });
            links.push(Link::new("hub", &id));
        }

        let cfg = PhysicsConfig::default();
        for _ in 0..500 {
            step(&mut layout, &links, &b, &cfg);
            assert_healthy(&layout, &b);
        }
    }

    #[test]
    fn test_unknown_link_does_not_change_trajectories() {
        let b = bounds();
        let cfg = PhysicsConfig::default();
        let mut clean = Layout::new();
        clean.insert(fact("a", 500.0, 300.0));
        clean.insert(fact("b", 700.0, 420.0));
        let mut noisy = clean.clone();

        let links = vec![Link::new("a", "b")];
        let noisy_links = vec![Link::new("a", "b"), Link::new("a", "ghost"), Link::new("ghost", "b"), Link::new("", "")];

        for _ in 0..50 {
            step(&mut clean, &links, &b, &cfg);
            step(&mut noisy, &noisy_links, &b, &cfg);
        }
        for id in ["a", "b"] {
            assert_eq!(clean.state(id), noisy.state(id));
        }
    }

    #[test]
    fn test_step_is_deterministic() {
        let data = GraphData::new(
            vec![
                GraphNode::hub(Category::Person),
                GraphNode::fact("p1", "Ana", Category::Person, Sentiment::Love),
                GraphNode::fact("p2", "Ben", Category::Person, Sentiment::Joy),
            ],
            vec![Link::new("cat-person", "p1"), Link::new("cat-person", "p2")],
        );
        let b = bounds();
        let start = reconcile(&Layout::new(), &data, &b, &SeedConfig::default(), &mut StdRng::seed_from_u64(3));
        let mut x = start.clone();
        let mut y = start;
        for _ in 0..30 {
            step(&mut x, &data.links, &b, &PhysicsConfig::default());
            step(&mut y, &data.links, &b, &PhysicsConfig::default());
        }
        for e in x.entries() {
            assert_eq!(Some(e.state), y.state(&e.id));
        }
    }

    #[test]
    fn test_hubs_keep_wider_spacing() {
        let b = bounds();
        let cfg = PhysicsConfig::default();

        // 75 apart: inside the hub spacing, outside the fact spacing.
        let mut with_hub = Layout::new();
        with_hub.insert(LayoutEntry {
            id: "hub".to_string(),
            kind: NodeKind::Category,
            radius: 28.0,
            state: NodeState::at(562.5, 350.0),
        });
        with_hub.insert(fact("a", 637.5, 350.0));

        let mut facts_only = Layout::new();
        facts_only.insert(fact("x", 562.5, 350.0));
        facts_only.insert(fact("y", 637.5, 350.0));

        step(&mut with_hub, &[], &b, &cfg);
        step(&mut facts_only, &[], &b, &cfg);

        let hub_gap = with_hub.position("hub").unwrap().distance(&with_hub.position("a").unwrap());
        let fact_gap = facts_only.position("x").unwrap().distance(&facts_only.position("y").unwrap());
        assert!(hub_gap > 75.0);
        assert!(fact_gap < 75.0);
    }

    #[test]
    fn test_settles_over_time() {
        let data = GraphData::new(
            vec![
                GraphNode::hub(Category::Event),
                GraphNode::fact("e1", "trip", Category::Event, Sentiment::Joy),
                GraphNode::fact("e2", "exam", Category::Event, Sentiment::Sadness),
                GraphNode::fact("e3", "party", Category::Event, Sentiment::Joy),
            ],
            vec![Link::new("cat-event", "e1"), Link::new("cat-event", "e2"), Link::new("cat-event", "e3")],
        );
        let b = bounds();
        let cfg = PhysicsConfig::default();
        let mut layout = reconcile(&Layout::new(), &data, &b, &SeedConfig::default(), &mut StdRng::seed_from_u64(8));

        step(&mut layout, &data.links, &b, &cfg);
        let early = layout.kinetic_energy();
        // The cluster can rearrange once before it calms down, so give it time.
        for _ in 0..3000 {
            step(&mut layout, &data.links, &b, &cfg);
        }
        assert!(layout.kinetic_energy() < early);
        assert!(layout.kinetic_energy() < 1e-6);
    }

    #[test]
    fn test_non_finite_state_is_reset() {
        let b = bounds();
        let mut layout = Layout::new();
        let mut bad = fact("a", f64::NAN, 100.0);
        bad.state.vx = f64::INFINITY;
        layout.insert(bad);

        step(&mut layout, &[], &b, &PhysicsConfig::default());
        assert_healthy(&layout, &b);
    }

    #[test]
    fn test_empty_layout_is_noop() {
        let mut layout = Layout::new();
        step(&mut layout, &[Link::new("a", "b")], &bounds(), &PhysicsConfig::default());
        assert!(layout.is_empty());
    }
}
