//! The orchestrator: owns every piece of garden state and wires data
//! refreshes, simulation, rendering and pointer input together.
//!
//! All calls are synchronous and run on the host's single thread. A refresh
//! replaces the data immediately; the next `frame` steps and draws it.

use std::cell::RefCell;
use std::rc::Rc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::{CanvasSize, GardenConfig};
use crate::error::{GardenError, Result};
use crate::filter::{FilterIndex, FilterState};
use crate::interaction::{ClickOutcome, CursorHint, InteractionController, SelectionState};
use crate::layout::{self, Bounds, Layout};
use crate::model::{GraphData, MemoryItem, parse_graph_body, parse_memories_body};
use crate::output::{FilteredMemoryOutput, GardenSnapshot, MemoryRow, NodeOutput, SelectionDetail};
use crate::render::{ERROR_MESSAGE, RenderPipeline, Scene, Surface};

/// Notifications for the host. Every method defaults to doing nothing.
pub trait GardenEvents {
    fn on_node_selected(&mut self, _id: Option<&str>) {}
    fn on_refresh_requested(&mut self) {}
    fn on_filter_changed(&mut self, _filter: &FilterState) {}
}

/// Ignores every event.
#[derive(Debug, Default)]
pub struct NoEvents;

impl GardenEvents for NoEvents {}

#[derive(Debug, Clone, PartialEq)]
pub enum GardenEvent {
    NodeSelected(Option<String>),
    RefreshRequested,
    FilterChanged(FilterState),
}

/// Collects events so the host can deliver them after the controller call
/// that raised them has returned.
#[derive(Debug, Clone, Default)]
pub struct EventQueue(Rc<RefCell<Vec<GardenEvent>>>);

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<GardenEvent> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

impl GardenEvents for EventQueue {
    fn on_node_selected(&mut self, id: Option<&str>) {
        self.0.borrow_mut().push(GardenEvent::NodeSelected(id.map(str::to_string)));
    }

    fn on_refresh_requested(&mut self) {
        self.0.borrow_mut().push(GardenEvent::RefreshRequested);
    }

    fn on_filter_changed(&mut self, filter: &FilterState) {
        self.0.borrow_mut().push(GardenEvent::FilterChanged(filter.clone()));
    }
}

pub struct GraphController<S: Surface> {
    config: GardenConfig,
    data: GraphData,
    layout: Layout,
    memories: FilterIndex,
    filter: FilterState,
    interaction: InteractionController,
    renderer: RenderPipeline<S>,
    events: Box<dyn GardenEvents>,
    rng: StdRng,
    refresh_pending: bool,
    last_error: Option<String>,
}

impl<S: Surface> GraphController<S> {
    pub fn new(surface: S, config: GardenConfig, events: Box<dyn GardenEvents>) -> Self {
        let rng = StdRng::seed_from_u64(config.seed.seed);
        let interaction = InteractionController::new(config.interaction.hit_multiplier);
        let renderer = RenderPipeline::new(surface, config.render.clone());
        Self {
            config,
            data: GraphData::default(),
            layout: Layout::new(),
            memories: FilterIndex::default(),
            filter: FilterState::default(),
            interaction,
            renderer,
            events,
            rng,
            refresh_pending: false,
            last_error: None,
        }
    }

    fn bounds(&self) -> Bounds {
        Bounds::from_canvas(&self.config.canvas, self.config.physics.margin)
    }

    // Data

    /// Replace the graph. Layout state survives for ids present in both.
    pub fn apply_graph(&mut self, data: GraphData) {
        let bounds = self.bounds();
        self.layout = layout::reconcile(&self.layout, &data, &bounds, &self.config.seed, &mut self.rng);
        self.data = data;
        self.refresh_pending = false;
        self.last_error = None;

        if self.interaction.retain(&self.layout) {
            self.events.on_node_selected(None);
        }
        log::info!(
            "garden refreshed: {} nodes, {} links",
            self.data.nodes.len(),
            self.data.links.len()
        );
    }

    /// Parse and apply a graph response body. On error the previous graph
    /// stays in place and keeps animating.
    pub fn apply_graph_json(&mut self, body: &str) -> Result<()> {
        match parse_graph_body(body) {
            Ok(payload) => {
                self.apply_graph(GraphData::from_payload(payload));
                Ok(())
            }
            Err(e) => Err(self.record_failure(e)),
        }
    }

    pub fn apply_memories(&mut self, memories: Vec<MemoryItem>) {
        log::debug!("memory list: {} items", memories.len());
        self.memories = FilterIndex::new(memories);
    }

    pub fn apply_memories_json(&mut self, body: &str) -> Result<()> {
        match parse_memories_body(body) {
            Ok(memories) => {
                self.apply_memories(memories);
                Ok(())
            }
            Err(e) => Err(self.record_failure(e)),
        }
    }

    /// The host's fetch failed outright.
    pub fn fetch_failed(&mut self, message: &str) {
        self.record_failure(GardenError::fetch(message));
    }

    fn record_failure(&mut self, err: GardenError) -> GardenError {
        log::warn!("garden data not updated: {}", err);
        self.last_error = Some(err.to_string());
        self.refresh_pending = false;
        err
    }

    /// Ask the host for fresh data. While a request is outstanding further
    /// calls are absorbed; returns whether the event was emitted.
    pub fn request_refresh(&mut self) -> bool {
        if self.refresh_pending {
            return false;
        }
        self.refresh_pending = true;
        self.events.on_refresh_requested();
        true
    }

    // Frame

    /// Advance the simulation one tick. No-op on an empty garden.
    pub fn step(&mut self) {
        if self.layout.is_empty() {
            return;
        }
        let bounds = self.bounds();
        layout::step(&mut self.layout, &self.data.links, &bounds, &self.config.physics);
    }

    /// One animation frame: step, then draw.
    pub fn frame(&mut self, time_ms: f64) {
        self.step();
        self.render(time_ms);
    }

    pub fn render(&mut self, time_ms: f64) {
        let notice = match (&self.last_error, self.data.is_empty()) {
            (Some(_), true) => Some(ERROR_MESSAGE),
            _ => None,
        };
        self.renderer.render(&Scene {
            layout: &self.layout,
            data: &self.data,
            selection: self.interaction.state(),
            canvas: self.config.canvas,
            time_ms,
            notice,
        });
    }

    /// Change the canvas size. Nodes outside the new bounds are pulled in.
    pub fn resize(&mut self, width: f64, height: f64) {
        if !(width.is_finite() && height.is_finite()) {
            return;
        }
        self.config.canvas = CanvasSize { width: width.max(0.0), height: height.max(0.0) };
        let bounds = self.bounds();
        for entry in self.layout.entries_mut() {
            entry.state.x = bounds.clamp_x(entry.state.x);
            entry.state.y = bounds.clamp_y(entry.state.y);
        }
    }

    // Pointer

    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        self.interaction.on_move(x, y, &self.layout)
    }

    pub fn pointer_click(&mut self, x: f64, y: f64) -> ClickOutcome {
        let outcome = self.interaction.on_click(x, y, &self.layout);
        match &outcome {
            ClickOutcome::Select(id) => self.events.on_node_selected(Some(id)),
            ClickOutcome::Deselect => self.events.on_node_selected(None),
            ClickOutcome::Ignore => {}
        }
        outcome
    }

    pub fn pointer_leave(&mut self) -> bool {
        self.interaction.on_leave()
    }

    pub fn cursor(&self) -> CursorHint {
        self.interaction.cursor()
    }

    // Selection and filter

    /// Select a fact by id, or clear with `None`. Unknown ids and hubs are
    /// rejected and leave the selection as it was.
    pub fn select_node(&mut self, id: Option<&str>) -> Result<()> {
        if let Some(id) = id {
            match self.layout.get(id) {
                None => return Err(GardenError::unknown_node(id)),
                Some(entry) if entry.is_hub() => return Err(GardenError::NotSelectable(id.to_string())),
                Some(_) => {}
            }
        }
        if self.interaction.set_selected(id.map(str::to_string)) {
            self.events.on_node_selected(id);
        }
        Ok(())
    }

    /// Select the node behind a side-panel row.
    pub fn select_memory(&mut self, id: &str) -> Result<()> {
        self.select_node(Some(id))
    }

    pub fn clear_selection(&mut self) -> bool {
        if self.interaction.set_selected(None) {
            self.events.on_node_selected(None);
            return true;
        }
        false
    }

    pub fn set_filter(&mut self, filter: FilterState) {
        if filter == self.filter {
            return;
        }
        self.filter = filter;
        self.events.on_filter_changed(&self.filter);
    }

    pub fn filtered_memories(&self) -> FilteredMemoryOutput {
        let selected = self.interaction.selected();
        let items = self
            .memories
            .apply(&self.filter)
            .into_iter()
            .map(|m| MemoryRow {
                memory: m.clone(),
                glyph: m.category.glyph(),
                selected: selected == Some(m.id.as_str()),
            })
            .collect();
        FilteredMemoryOutput {
            filter: self.filter.clone(),
            total: self.memories.len(),
            items,
            category_counts: self.memories.category_counts(),
        }
    }

    // Output

    pub fn selection_detail(&self) -> Option<SelectionDetail> {
        let id = self.interaction.selected()?;
        let node = self.data.get(id)?;
        let content = match self.memories.get(id) {
            Some(m) if !m.content.is_empty() => m.content.clone(),
            _ if !node.full_content.is_empty() => node.full_content.clone(),
            _ => node.label.clone(),
        };
        let linked = self
            .data
            .links
            .iter()
            .filter_map(|l| match (l.source == id, l.target == id) {
                (true, _) => Some(l.target.clone()),
                (_, true) => Some(l.source.clone()),
                _ => None,
            })
            .filter(|other| self.data.contains(other))
            .collect();
        Some(SelectionDetail {
            id: node.id.clone(),
            label: node.label.clone(),
            content,
            category: node.category,
            sentiment: node.sentiment,
            timestamp: node.timestamp.map(|t| t.to_rfc3339()),
            linked,
        })
    }

    pub fn snapshot(&self) -> GardenSnapshot {
        let nodes = self
            .layout
            .entries()
            .iter()
            .filter_map(|e| {
                let node = self.data.get(&e.id)?;
                Some(NodeOutput {
                    id: e.id.clone(),
                    label: node.label.clone(),
                    kind: node.kind,
                    category: node.category,
                    sentiment: node.sentiment,
                    x: e.state.x,
                    y: e.state.y,
                    radius: e.radius,
                })
            })
            .collect();
        GardenSnapshot {
            nodes,
            link_count: self.data.resolved_links().count(),
            fact_count: self.data.fact_count(),
            selected: self.selection_detail(),
            hovered: self.interaction.hovered().map(str::to_string),
            cursor: self.cursor(),
            refresh_pending: self.refresh_pending,
            error: self.last_error.clone(),
        }
    }

    pub fn config(&self) -> &GardenConfig {
        &self.config
    }

    pub fn data(&self) -> &GraphData {
        &self.data
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn selection(&self) -> &SelectionState {
        self.interaction.state()
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn refresh_pending(&self) -> bool {
        self.refresh_pending
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn surface(&self) -> &S {
        self.renderer.surface()
    }

    pub fn surface_mut(&mut self) -> &mut S {
        self.renderer.surface_mut()
    }
}
