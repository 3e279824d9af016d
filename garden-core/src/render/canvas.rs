//! `Surface` backed by a browser 2D canvas context.

use std::f64::consts::TAU;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::surface::{Rgba, Surface, TextAlign, TextStyle};
use crate::error::{GardenError, Result};
use crate::layout::PointF;

const FONT_FAMILY: &str = "ui-sans-serif, system-ui, sans-serif";

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| GardenError::canvas(format!("{:?}", e)))?
            .ok_or_else(|| GardenError::canvas("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| GardenError::canvas("context is not a CanvasRenderingContext2d"))?;
        Ok(Self { canvas, ctx })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Canvas calls that can throw only do so for invalid geometry; a bad
    /// primitive is skipped rather than aborting the frame.
    fn check(op: &str, res: std::result::Result<(), JsValue>) {
        if let Err(e) = res {
            log::debug!("canvas {} failed: {:?}", op, e);
        }
    }
}

impl Surface for CanvasSurface {
    fn begin_frame(&mut self, width: f64, height: f64) {
        let (w, h) = (width.max(0.0) as u32, height.max(0.0) as u32);
        if self.canvas.width() != w {
            self.canvas.set_width(w);
        }
        if self.canvas.height() != h {
            self.canvas.set_height(h);
        }
        self.ctx.clear_rect(0.0, 0.0, width, height);
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgba) {
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.fill_rect(x, y, w, h);
    }

    fn stroke_line(&mut self, from: PointF, to: PointF, color: Rgba, width: f64) {
        self.ctx.set_stroke_style_str(&color.to_css());
        self.ctx.set_line_width(width);
        self.ctx.begin_path();
        self.ctx.move_to(from.x, from.y);
        self.ctx.line_to(to.x, to.y);
        self.ctx.stroke();
    }

    fn stroke_curve(&mut self, from: PointF, control: PointF, to: PointF, color: Rgba, width: f64) {
        self.ctx.set_stroke_style_str(&color.to_css());
        self.ctx.set_line_width(width);
        self.ctx.begin_path();
        self.ctx.move_to(from.x, from.y);
        self.ctx.quadratic_curve_to(control.x, control.y, to.x, to.y);
        self.ctx.stroke();
    }

    fn fill_circle(&mut self, center: PointF, radius: f64, color: Rgba) {
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.begin_path();
        Self::check("arc", self.ctx.arc(center.x, center.y, radius.max(0.0), 0.0, TAU));
        self.ctx.fill();
    }

    fn stroke_circle(&mut self, center: PointF, radius: f64, color: Rgba, width: f64) {
        self.ctx.set_stroke_style_str(&color.to_css());
        self.ctx.set_line_width(width);
        self.ctx.begin_path();
        Self::check("arc", self.ctx.arc(center.x, center.y, radius.max(0.0), 0.0, TAU));
        self.ctx.stroke();
    }

    fn fill_glow(&mut self, center: PointF, radius: f64, inner: Rgba, outer: Rgba) {
        let radius = radius.max(0.0);
        let gradient = match self.ctx.create_radial_gradient(center.x, center.y, 0.0, center.x, center.y, radius) {
            Ok(g) => g,
            Err(e) => {
                log::debug!("canvas gradient failed: {:?}", e);
                return;
            }
        };
        Self::check("color stop", gradient.add_color_stop(0.0, &inner.to_css()));
        Self::check("color stop", gradient.add_color_stop(1.0, &outer.to_css()));
        self.ctx.set_fill_style_canvas_gradient(&gradient);
        self.ctx.begin_path();
        Self::check("arc", self.ctx.arc(center.x, center.y, radius, 0.0, TAU));
        self.ctx.fill();
    }

    fn fill_ellipse(&mut self, center: PointF, rx: f64, ry: f64, rotation: f64, color: Rgba) {
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.begin_path();
        Self::check(
            "ellipse",
            self.ctx.ellipse(center.x, center.y, rx.max(0.0), ry.max(0.0), rotation, 0.0, TAU),
        );
        self.ctx.fill();
    }

    fn fill_text(&mut self, text: &str, at: PointF, style: TextStyle) {
        let weight = if style.bold { "600 " } else { "" };
        self.ctx.set_font(&format!("{}{}px {}", weight, style.size, FONT_FAMILY));
        self.ctx.set_text_align(match style.align {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
        });
        self.ctx.set_text_baseline("middle");
        self.ctx.set_fill_style_str(&style.color.to_css());
        Self::check("text", self.ctx.fill_text(text, at.x, at.y));
    }
}
