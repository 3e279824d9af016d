//! Drawing primitives the pipeline needs from a raster surface.
//!
//! `CanvasSurface` (in `canvas`) implements them on an HTML canvas;
//! `RecordingSurface` keeps a list of commands so frames can be inspected
//! without a display.

use serde::Serialize;

use crate::layout::PointF;

/// sRGB colour with alpha in `[0, 1]`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba { r: 0, g: 0, b: 0, a: 0.0 };

    /// `0xRRGGBB`, fully opaque.
    pub const fn hex(rgb: u32) -> Self {
        Self { r: ((rgb >> 16) & 0xff) as u8, g: ((rgb >> 8) & 0xff) as u8, b: (rgb & 0xff) as u8, a: 1.0 }
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self { a: a.clamp(0.0, 1.0), ..self }
    }

    pub fn to_css(self) -> String {
        format!("rgba({},{},{},{:.3})", self.r, self.g, self.b, self.a)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct TextStyle {
    pub size: f64,
    pub color: Rgba,
    pub align: TextAlign,
    pub bold: bool,
}

impl TextStyle {
    pub fn new(size: f64, color: Rgba) -> Self {
        Self { size, color, align: TextAlign::Left, bold: false }
    }

    pub fn centered(self) -> Self {
        Self { align: TextAlign::Center, ..self }
    }

    pub fn bold(self) -> Self {
        Self { bold: true, ..self }
    }
}

pub trait Surface {
    /// Start a new frame covering `width x height`.
    fn begin_frame(&mut self, width: f64, height: f64);
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgba);
    fn stroke_line(&mut self, from: PointF, to: PointF, color: Rgba, width: f64);
    /// Quadratic Bézier from `from` to `to` bending toward `control`.
    fn stroke_curve(&mut self, from: PointF, control: PointF, to: PointF, color: Rgba, width: f64);
    fn fill_circle(&mut self, center: PointF, radius: f64, color: Rgba);
    fn stroke_circle(&mut self, center: PointF, radius: f64, color: Rgba, width: f64);
    /// Radial gradient disc fading from `inner` at the center to `outer` at `radius`.
    fn fill_glow(&mut self, center: PointF, radius: f64, inner: Rgba, outer: Rgba);
    fn fill_ellipse(&mut self, center: PointF, rx: f64, ry: f64, rotation: f64, color: Rgba);
    fn fill_text(&mut self, text: &str, at: PointF, style: TextStyle);
}

/// One recorded call on a `RecordingSurface`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    BeginFrame { width: f64, height: f64 },
    FillRect { x: f64, y: f64, w: f64, h: f64, color: Rgba },
    Line { from: PointF, to: PointF, color: Rgba, width: f64 },
    Curve { from: PointF, control: PointF, to: PointF, color: Rgba, width: f64 },
    FillCircle { center: PointF, radius: f64, color: Rgba },
    StrokeCircle { center: PointF, radius: f64, color: Rgba, width: f64 },
    Glow { center: PointF, radius: f64, inner: Rgba, outer: Rgba },
    Ellipse { center: PointF, rx: f64, ry: f64, rotation: f64, color: Rgba },
    Text { text: String, at: PointF, style: TextStyle },
}

/// Keeps the commands of the current frame. `begin_frame` starts over.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pub commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&DrawCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }

    /// Index of the first command matching `pred`.
    pub fn position(&self, pred: impl Fn(&DrawCommand) -> bool) -> Option<usize> {
        self.commands.iter().position(pred)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.commands).unwrap_or_else(|_| "[]".to_string())
    }
}

impl Surface for RecordingSurface {
    fn begin_frame(&mut self, width: f64, height: f64) {
        self.commands.clear();
        self.commands.push(DrawCommand::BeginFrame { width, height });
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgba) {
        self.commands.push(DrawCommand::FillRect { x, y, w, h, color });
    }

    fn stroke_line(&mut self, from: PointF, to: PointF, color: Rgba, width: f64) {
        self.commands.push(DrawCommand::Line { from, to, color, width });
    }

    fn stroke_curve(&mut self, from: PointF, control: PointF, to: PointF, color: Rgba, width: f64) {
        self.commands.push(DrawCommand::Curve { from, control, to, color, width });
    }

    fn fill_circle(&mut self, center: PointF, radius: f64, color: Rgba) {
        self.commands.push(DrawCommand::FillCircle { center, radius, color });
    }

    fn stroke_circle(&mut self, center: PointF, radius: f64, color: Rgba, width: f64) {
        self.commands.push(DrawCommand::StrokeCircle { center, radius, color, width });
    }

    fn fill_glow(&mut self, center: PointF, radius: f64, inner: Rgba, outer: Rgba) {
        self.commands.push(DrawCommand::Glow { center, radius, inner, outer });
    }

    fn fill_ellipse(&mut self, center: PointF, rx: f64, ry: f64, rotation: f64, color: Rgba) {
        self.commands.push(DrawCommand::Ellipse { center, rx, ry, rotation, color });
    }

    fn fill_text(&mut self, text: &str, at: PointF, style: TextStyle) {
        self.commands.push(DrawCommand::Text { text: text.to_string(), at, style });
    }
}
