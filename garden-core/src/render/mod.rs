//! Per-frame drawing of the garden.
//!
//! Back to front: background, grid, links, hubs, fact flowers, selection and
//! hover callouts, node-count badge. A frame only reads the layout, graph and
//! selection; nothing carries over between frames except what the surface
//! itself shows.

use std::f64::consts::TAU;
use std::hash::{DefaultHasher, Hash, Hasher};

use crate::config::{CanvasSize, RenderConfig};
use crate::interaction::SelectionState;
use crate::layout::{Layout, LayoutEntry, PointF};
use crate::model::{Category, GraphData, GraphNode, Link, Sentiment};

mod canvas;
mod surface;

pub use canvas::CanvasSurface;
pub use surface::{DrawCommand, RecordingSurface, Rgba, Surface, TextAlign, TextStyle};

pub const BACKGROUND: Rgba = Rgba::hex(0x090505);
pub const GRID: Rgba = Rgba { r: 163, g: 88, b: 88, a: 0.05 };
pub const TEXT: Rgba = Rgba::hex(0xF2F0F0);
pub const TEXT_MUTED: Rgba = Rgba::hex(0xA49898);
pub const SELECTED_CORE: Rgba = Rgba::hex(0xF2F0F0);
const CALLOUT_BG: Rgba = Rgba { r: 24, g: 14, b: 14, a: 0.88 };

pub const EMPTY_MESSAGE: &str = "Start a conversation to grow your memory garden";
pub const ERROR_MESSAGE: &str = "Could not load memory garden";

pub fn sentiment_color(sentiment: Sentiment) -> Rgba {
    match sentiment {
        Sentiment::Love => Rgba::hex(0xC8102E),
        Sentiment::Joy => Rgba::hex(0xF0A500),
        Sentiment::Sadness => Rgba::hex(0x60A5FA),
        Sentiment::Curiosity => Rgba::hex(0xE8927C),
        Sentiment::Neutral => Rgba::hex(0x635858),
    }
}

fn petal_count(category: Option<Category>) -> usize {
    match category {
        Some(Category::Person) | Some(Category::Preference) => 5,
        Some(Category::Event) => 4,
        Some(Category::Feeling) => 6,
        Some(Category::Thought) | None => 8,
    }
}

/// Everything one frame reads.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub layout: &'a Layout,
    pub data: &'a GraphData,
    pub selection: &'a SelectionState,
    pub canvas: CanvasSize,
    /// Wall-clock milliseconds; drives pulsing and petal rotation.
    pub time_ms: f64,
    /// Shown instead of the empty-garden message when nothing is loaded.
    pub notice: Option<&'a str>,
}

/// Owns the raster surface and draws a `Scene` onto it.
pub struct RenderPipeline<S: Surface> {
    surface: S,
    config: RenderConfig,
}

impl<S: Surface> RenderPipeline<S> {
    pub fn new(surface: S, config: RenderConfig) -> Self {
        Self { surface, config }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn render(&mut self, scene: &Scene<'_>) {
        let CanvasSize { width, height } = scene.canvas;
        self.surface.begin_frame(width, height);
        self.surface.fill_rect(0.0, 0.0, width, height, BACKGROUND);
        self.draw_grid(width, height);

        if scene.layout.is_empty() {
            self.draw_placeholder(scene);
            return;
        }

        self.draw_links(scene);
        for entry in scene.layout.entries().iter().filter(|e| e.is_hub()) {
            if let Some(node) = scene.data.get(&entry.id) {
                self.draw_hub(entry, node, scene.time_ms);
            }
        }
        for entry in scene.layout.entries().iter().filter(|e| !e.is_hub()) {
            if let Some(node) = scene.data.get(&entry.id) {
                let selected = scene.selection.selected.as_deref() == Some(entry.id.as_str());
                self.draw_flower(entry, node, selected, scene.time_ms);
            }
        }
        self.draw_focus(scene);
        self.draw_badge(scene.data.fact_count());
    }

    fn draw_grid(&mut self, width: f64, height: f64) {
        let spacing = self.config.grid_spacing;
        if !(spacing.is_finite() && spacing >= 4.0) {
            return;
        }
        let mut x = spacing;
        while x < width {
            self.surface.stroke_line(PointF { x, y: 0.0 }, PointF { x, y: height }, GRID, 1.0);
            x += spacing;
        }
        let mut y = spacing;
        while y < height {
            self.surface.stroke_line(PointF { x: 0.0, y }, PointF { x: width, y }, GRID, 1.0);
            y += spacing;
        }
    }

    fn draw_placeholder(&mut self, scene: &Scene<'_>) {
        let center = PointF { x: scene.canvas.width / 2.0, y: scene.canvas.height / 2.0 };
        self.surface.fill_text(
            "◎",
            PointF { x: center.x, y: center.y - 24.0 },
            TextStyle::new(36.0, sentiment_color(Sentiment::Neutral)).centered(),
        );
        self.surface.fill_text(
            scene.notice.unwrap_or(EMPTY_MESSAGE),
            PointF { x: center.x, y: center.y + 16.0 },
            TextStyle::new(14.0, TEXT_MUTED).centered(),
        );
    }

    fn draw_links(&mut self, scene: &Scene<'_>) {
        let selected = scene.selection.selected.as_deref();
        for link in &scene.data.links {
            let (Some(src), Some(tgt)) = (scene.layout.position(&link.source), scene.layout.position(&link.target))
            else {
                continue;
            };
            let sentiment = scene.data.get(&link.target).map(|n| n.sentiment).unwrap_or_default();
            let touches_selection = selected == Some(link.source.as_str()) || selected == Some(link.target.as_str());
            let color = sentiment_color(sentiment).with_alpha(if touches_selection { 0.55 } else { 0.2 });

            let bow = link_bow(link, self.config.link_curvature);
            let (dx, dy) = (tgt.x - src.x, tgt.y - src.y);
            if bow == 0.0 || dx.hypot(dy) < 1.0 {
                self.surface.stroke_line(src, tgt, color, 1.0);
                continue;
            }
            // Perpendicular offset of the midpoint, proportional to length.
            let control = PointF { x: (src.x + tgt.x) / 2.0 - dy * bow, y: (src.y + tgt.y) / 2.0 + dx * bow };
            self.surface.stroke_curve(src, control, tgt, color, 1.0);
        }
    }

    fn pulse(&self, state: PointF, time_ms: f64) -> f64 {
        let phase = state.x * 0.05 + state.y * 0.03;
        1.0 + (time_ms / 1000.0 + phase).sin() * self.config.pulse_amplitude
    }

    fn draw_hub(&mut self, entry: &LayoutEntry, node: &GraphNode, time_ms: f64) {
        let pos = entry.state.position();
        let pulse = self.pulse(pos, time_ms);
        let r = entry.radius * pulse;
        let color = node.category.map(category_tint).unwrap_or_else(|| sentiment_color(node.sentiment));

        self.surface.fill_glow(pos, r * 2.2, color.with_alpha(0.25), Rgba::TRANSPARENT);
        self.surface.stroke_circle(pos, r * 1.5, color.with_alpha(0.45), 2.0);
        self.surface.fill_circle(pos, r, color.with_alpha(0.85));
        self.surface.fill_text(&node.label, pos, TextStyle::new(11.0, TEXT).centered().bold());
    }

    fn draw_flower(&mut self, entry: &LayoutEntry, node: &GraphNode, selected: bool, time_ms: f64) {
        let pos = entry.state.position();
        let pulse = self.pulse(pos, time_ms);
        let r = entry.radius * pulse;
        let color = sentiment_color(node.sentiment);

        self.surface.fill_glow(pos, r * 2.5, color.with_alpha(0.33), Rgba::TRANSPARENT);
        self.surface.fill_glow(pos, r * 1.6, color.with_alpha(0.2), Rgba::TRANSPARENT);

        let petals = petal_count(node.category);
        let spin = time_ms / 1000.0 * 0.2 + (pos.x + pos.y) * 0.01;
        for k in 0..petals {
            let angle = spin + TAU * k as f64 / petals as f64;
            let center = PointF { x: pos.x + angle.cos() * r * 0.9, y: pos.y + angle.sin() * r * 0.9 };
            self.surface.fill_ellipse(center, r * 0.75, r * 0.4, angle, color.with_alpha(0.7));
        }

        self.surface.fill_circle(pos, r * 0.55, if selected { SELECTED_CORE } else { color });
        self.surface.fill_circle(
            PointF { x: pos.x - r * 0.2, y: pos.y - r * 0.2 },
            r * 0.18,
            Rgba::hex(0xFFFFFF).with_alpha(0.6),
        );
        self.surface.fill_text(
            &truncate_label(&node.label, self.config.label_chars),
            PointF { x: pos.x, y: pos.y + r * 1.6 + 10.0 },
            TextStyle::new(9.0, TEXT.with_alpha(0.7)).centered(),
        );
    }

    /// Rings and callouts for the hovered and selected nodes. The selected one
    /// is drawn last so it sits on top.
    fn draw_focus(&mut self, scene: &Scene<'_>) {
        let selected = scene.selection.selected.as_deref();
        if let Some(hovered) = scene.selection.hovered.as_deref() {
            if Some(hovered) != selected {
                self.draw_callout(scene, hovered, false);
            }
        }
        if let Some(selected) = selected {
            self.draw_callout(scene, selected, true);
        }
    }

    fn draw_callout(&mut self, scene: &Scene<'_>, id: &str, selected: bool) {
        let (Some(entry), Some(node)) = (scene.layout.get(id), scene.data.get(id)) else {
            return;
        };
        let pos = entry.state.position();
        let r = entry.radius * self.pulse(pos, scene.time_ms);
        let ring = if selected { TEXT.with_alpha(0.9) } else { TEXT.with_alpha(0.45) };
        self.surface.stroke_circle(pos, r * 1.9, ring, if selected { 2.0 } else { 1.0 });

        let title = match node.category {
            Some(category) => format!("{} {}", category.glyph(), category.key()),
            None => node.label.clone(),
        };
        let mut lines = vec![title, truncate_label(&node.label, 40)];
        if let Some(ts) = node.timestamp {
            lines.push(ts.format("%b %-d, %Y").to_string());
        }

        let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as f64;
        let w = 16.0 + longest * 6.5;
        let h = 10.0 + lines.len() as f64 * 16.0;
        let mut x = pos.x + r * 2.0 + 8.0;
        if x + w > scene.canvas.width {
            x = pos.x - r * 2.0 - 8.0 - w;
        }
        let x = x.max(0.0);
        let y = (pos.y - h / 2.0).clamp(0.0, (scene.canvas.height - h).max(0.0));

        self.surface.fill_rect(x, y, w, h, CALLOUT_BG);
        for (i, line) in lines.iter().enumerate() {
            let style = match i {
                0 => TextStyle::new(10.0, sentiment_color(node.sentiment).with_alpha(1.0)),
                1 => TextStyle::new(12.0, TEXT).bold(),
                _ => TextStyle::new(10.0, TEXT_MUTED),
            };
            self.surface.fill_text(line, PointF { x: x + 8.0, y: y + 18.0 + i as f64 * 16.0 }, style);
        }
    }

    fn draw_badge(&mut self, facts: usize) {
        self.surface.fill_text(
            &format!("{} memories blooming", facts),
            PointF { x: 16.0, y: 24.0 },
            TextStyle::new(12.0, TEXT_MUTED),
        );
    }
}

/// Hubs are tinted by the category they gather.
fn category_tint(category: Category) -> Rgba {
    match category {
        Category::Person => Rgba::hex(0xB07CC6),
        Category::Event => Rgba::hex(0xE0A458),
        Category::Feeling => Rgba::hex(0xE8927C),
        Category::Preference => Rgba::hex(0x7CC6A4),
        Category::Thought => Rgba::hex(0x8A9BD8),
    }
}

/// Signed bow in `[-max, max]` for a link, fixed for a given pair of ids.
pub fn link_bow(link: &Link, max: f64) -> f64 {
    if !(max.is_finite() && max > 0.0) {
        return 0.0;
    }
    let mut hasher = DefaultHasher::new();
    link.source.hash(&mut hasher);
    link.target.hash(&mut hasher);
    let unit = (hasher.finish() % 10_001) as f64 / 10_000.0;
    (unit * 2.0 - 1.0) * max
}

/// Keep the first `max_chars` characters, adding an ellipsis when cut.
pub fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let mut out: String = label.chars().take(max_chars).collect();
    out.push('…');
    out
}
