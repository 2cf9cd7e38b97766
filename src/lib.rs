//! Falling-sand engine for low-resolution pixel displays.
//!
//! The core ([`grid`], [`particle`], [`physics`], [`simulation`], [`render`])
//! has no terminal or file dependencies. The remaining modules make up the
//! terminal front-end that stands in for an LED matrix and an accelerometer.

pub mod app;
pub mod color;
pub mod config;
pub mod framebuffer;
pub mod gate;
pub mod grid;
pub mod halfblock;
pub mod particle;
pub mod physics;
pub mod presets;
pub mod render;
pub mod settings;
pub mod simulation;
pub mod tilt;
pub mod ui;

pub use color::{ColorScheme, Rgb};
pub use framebuffer::FrameBuffer;
pub use render::PixelSink;
pub use settings::{RenderMode, SeedPattern, SimulationSettings};
pub use simulation::{Simulation, StepStats, World};
