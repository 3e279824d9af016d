//! Memory Garden: a force-directed view of a user's stored memories.
//!
//! Facts cluster around category hubs, animated by a small damped physics
//! simulation and drawn to a 2D surface every frame. `GraphController` is the
//! native entry point; `wasm::GardenHandle` wraps it for the browser.

pub mod config;
pub mod controller;
pub mod error;
pub mod filter;
pub mod frame_loop;
pub mod interaction;
pub mod layout;
pub mod logger;
pub mod model;
pub mod output;
pub mod render;
pub mod wasm;

pub use config::GardenConfig;
pub use controller::{EventQueue, GardenEvent, GardenEvents, GraphController, NoEvents};
pub use error::{GardenError, Result};
pub use filter::{FilterIndex, FilterState};
pub use interaction::{ClickOutcome, CursorHint, SelectionState};
pub use model::{Category, GraphData, GraphNode, Link, MemoryItem, NodeKind, Sentiment};
pub use render::{RecordingSurface, RenderPipeline, Surface};
