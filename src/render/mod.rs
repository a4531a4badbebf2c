//! Rendering - Turn a graph snapshot into an embeddable visualization
//!
//! The core hands a [`GraphSnapshot`] to a [`GraphRenderer`] and embeds
//! whatever document comes back. The renderer owns layout and interaction.

pub mod vis;

use crate::Result;
use crate::graph::GraphSnapshot;

pub use vis::VisNetworkRenderer;

/// Layout and control options shared by renderers
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Height of the graph view in pixels
    pub height: u32,
    /// Run the physics-based layout
    pub physics: bool,
    /// Show the interactive physics control panel
    pub physics_controls: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            height: 1000,
            physics: true,
            physics_controls: true,
        }
    }
}

/// Produces a standalone HTML document for a snapshot
pub trait GraphRenderer: Send + Sync {
    fn render(&self, snapshot: &GraphSnapshot, options: &RenderOptions) -> Result<String>;
}
