//! Tunable constants for the garden.
//!
//! Every struct deserializes with `#[serde(default)]`, so a host can pass a
//! partial JSON object and keep the defaults for everything it leaves out.

use serde::{Deserialize, Serialize};

/// Canvas dimensions in CSS pixels.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self { width: 1200.0, height: 700.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Pull toward the canvas center, per pixel of offset.
    pub center_strength: f64,
    /// Minimum spacing between two fact nodes.
    pub min_distance: f64,
    /// Minimum spacing when either node is a category hub.
    pub hub_min_distance: f64,
    /// Scale of the push applied to pairs closer than their minimum spacing.
    pub repulsion: f64,
    /// Rest length of a membership link.
    pub link_distance: f64,
    /// Spring constant for links.
    pub link_strength: f64,
    /// Velocity multiplier applied every step.
    pub damping: f64,
    /// Distance kept between node centers and the canvas edge.
    pub margin: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            center_strength: 0.002,
            min_distance: 60.0,
            hub_min_distance: 90.0,
            repulsion: 0.5,
            link_distance: 120.0,
            link_strength: 0.03,
            damping: 0.85,
            margin: 30.0,
        }
    }
}

impl PhysicsConfig {
    /// Largest spacing any pair can ask for. Used as the spatial grid cell size.
    pub fn max_min_distance(&self) -> f64 {
        self.min_distance.max(self.hub_min_distance)
    }
}

/// Where freshly appearing nodes are placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Ring radius for category hubs.
    pub hub_radius: f64,
    /// Inner radius of the fact ring.
    pub fact_radius_min: f64,
    /// Random spread added on top of `fact_radius_min`.
    pub fact_radius_jitter: f64,
    /// Seed for the placement RNG.
    pub seed: u64,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            hub_radius: 80.0,
            fact_radius_min: 120.0,
            fact_radius_jitter: 100.0,
            seed: 0x6d65_6d6f,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Hit radius as a multiple of the node's draw radius.
    pub hit_multiplier: f64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self { hit_multiplier: 2.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Spacing of the background grid.
    pub grid_spacing: f64,
    /// Pulse amplitude as a fraction of the radius.
    pub pulse_amplitude: f64,
    /// Max perpendicular bow of a link as a fraction of its length.
    pub link_curvature: f64,
    /// Characters of a fact label shown next to the node.
    pub label_chars: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            grid_spacing: 48.0,
            pulse_amplitude: 0.08,
            link_curvature: 0.15,
            label_chars: 18,
        }
    }
}

/// Top-level configuration handed to the controller at construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GardenConfig {
    pub canvas: CanvasSize,
    pub physics: PhysicsConfig,
    pub seed: SeedConfig,
    pub interaction: InteractionConfig,
    pub render: RenderConfig,
}

impl GardenConfig {
    /// Parse a (possibly partial) JSON config. An empty string yields defaults.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg = GardenConfig::from_json(r#"{"physics": {"damping": 0.82}, "canvas": {"width": 800}}"#).unwrap();
        assert_eq!(cfg.physics.damping, 0.82);
        assert_eq!(cfg.physics.margin, 30.0);
        assert_eq!(cfg.canvas.width, 800.0);
        assert_eq!(cfg.canvas.height, 700.0);
        assert_eq!(cfg.interaction.hit_multiplier, 2.0);
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(GardenConfig::from_json("  ").unwrap(), GardenConfig::default());
    }

    #[test]
    fn test_bad_json_is_error() {
        assert!(GardenConfig::from_json("{nope").is_err());
    }
}
