//! Terminal UI module using ratatui.
//!
//! - `render`: main frame rendering, layout, and overlays
//! - `input`: keyboard event handling
//! - `styles`: color schemes and text styling
//! - `tabs`: per-screen table rendering

pub mod input;
pub mod render;
pub mod styles;
pub mod tabs;
