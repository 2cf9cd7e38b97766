use crate::physics::{DEFAULT_MAX_SPEED, SUBCELL_SCALE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Largest supported display edge in pixels; seed geometry is clamped to it too
pub const MAX_DISPLAY_SIZE: usize = 1024;

/// How the simulation grid maps onto display pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RenderMode {
    /// One simulation cell per display pixel, fixed colour per particle kind
    #[default]
    Direct,
    /// Supersampled grid; pixel brightness follows sub-cell occupancy
    Density,
}

impl RenderMode {
    pub fn name(&self) -> &str {
        match self {
            RenderMode::Direct => "Direct",
            RenderMode::Density => "Density",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            RenderMode::Direct => RenderMode::Density,
            RenderMode::Density => RenderMode::Direct,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "direct" | "1:1" => Some(RenderMode::Direct),
            "density" | "supersampled" | "ss" => Some(RenderMode::Density),
            _ => None,
        }
    }
}

/// Initial particle layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SeedPattern {
    /// Square block of sand at the seed origin
    #[default]
    Block,
    /// Top part of the grid filled with sand
    Fill,
    /// Funnel walls with the upper chamber full of sand
    Hourglass,
    /// Reproducible random sprinkle over the top half
    Scatter,
}

impl SeedPattern {
    pub fn name(&self) -> &str {
        match self {
            SeedPattern::Block => "Block",
            SeedPattern::Fill => "Fill",
            SeedPattern::Hourglass => "Hourglass",
            SeedPattern::Scatter => "Scatter",
        }
    }

    pub fn next(&self) -> SeedPattern {
        match self {
            SeedPattern::Block => SeedPattern::Fill,
            SeedPattern::Fill => SeedPattern::Hourglass,
            SeedPattern::Hourglass => SeedPattern::Scatter,
            SeedPattern::Scatter => SeedPattern::Block,
        }
    }

    pub fn prev(&self) -> SeedPattern {
        match self {
            SeedPattern::Block => SeedPattern::Scatter,
            SeedPattern::Fill => SeedPattern::Block,
            SeedPattern::Hourglass => SeedPattern::Fill,
            SeedPattern::Scatter => SeedPattern::Hourglass,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "block" => Some(SeedPattern::Block),
            "fill" | "filled" => Some(SeedPattern::Fill),
            "hourglass" | "timer" => Some(SeedPattern::Hourglass),
            "scatter" | "random" => Some(SeedPattern::Scatter),
            _ => None,
        }
    }
}

/// All simulation settings consolidated into one struct
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSettings {
    // === Timing ===
    /// Physics/render steps per second (1-120)
    pub frame_rate: u32,

    // === Rendering ===
    pub render_mode: RenderMode,
    /// Simulation cells per display pixel along each axis in density mode (2-4)
    pub supersample: usize,

    // === Physics ===
    /// Speed limit in sub-cell units per step (32-256)
    pub max_speed: i32,
    /// Gravity magnitude in sub-cell units per step (16-1024)
    pub gravity_scale: f32,
    /// Sensor reports y pointing up; flip it into grid space
    pub invert_y: bool,

    // === Seeding (display pixels) ===
    pub seed_pattern: SeedPattern,
    pub seed_x: i32,
    pub seed_y: i32,
    /// Side length of the block seed (1-32)
    pub seed_size: i32,
    /// Optional single obstacle
    pub obstacle: Option<(i32, i32)>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            frame_rate: 60,
            render_mode: RenderMode::default(),
            supersample: 2,
            max_speed: DEFAULT_MAX_SPEED,
            gravity_scale: SUBCELL_SCALE as f32,
            invert_y: false,
            seed_pattern: SeedPattern::default(),
            seed_x: 12,
            seed_y: 12,
            seed_size: 5,
            obstacle: None,
        }
    }
}

impl SimulationSettings {
    /// Simulation cells per display pixel for the active render mode
    pub fn scale(&self) -> usize {
        match self.render_mode {
            RenderMode::Direct => 1,
            RenderMode::Density => self.supersample.clamp(2, 4),
        }
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.frame_rate.clamp(1, 120)
    }

    /// Whether switching from `other` to `self` needs a fresh world
    pub fn requires_reinit(&self, other: &SimulationSettings) -> bool {
        self.scale() != other.scale()
            || self.seed_pattern != other.seed_pattern
            || self.seed_x != other.seed_x
            || self.seed_y != other.seed_y
            || self.seed_size != other.seed_size
            || self.obstacle != other.obstacle
    }

    /// Clamp every field into its supported range
    pub fn sanitized(mut self) -> Self {
        self.frame_rate = self.frame_rate.clamp(1, 120);
        self.supersample = self.supersample.clamp(2, 4);
        self.max_speed = self.max_speed.clamp(32, SUBCELL_SCALE);
        self.gravity_scale = if self.gravity_scale.is_finite() {
            self.gravity_scale.clamp(16.0, 1024.0)
        } else {
            SUBCELL_SCALE as f32
        };
        self.seed_size = self.seed_size.clamp(1, 32);
        let edge = MAX_DISPLAY_SIZE as i32;
        self.seed_x = self.seed_x.clamp(0, edge);
        self.seed_y = self.seed_y.clamp(0, edge);
        self.obstacle = self
            .obstacle
            .map(|(x, y)| (x.clamp(0, edge), y.clamp(0, edge)));
        self
    }

    /// Adjust frame rate within bounds
    pub fn adjust_frame_rate(&mut self, delta: i32) {
        self.frame_rate = (self.frame_rate as i32 + delta).clamp(1, 120) as u32;
    }

    /// Adjust supersampling factor within bounds
    pub fn adjust_supersample(&mut self, delta: i32) {
        self.supersample = (self.supersample as i32 + delta).clamp(2, 4) as usize;
    }

    /// Adjust speed limit within bounds
    pub fn adjust_max_speed(&mut self, delta: i32) {
        self.max_speed = (self.max_speed + delta).clamp(32, SUBCELL_SCALE);
    }

    /// Adjust gravity strength within bounds
    pub fn adjust_gravity_scale(&mut self, delta: f32) {
        self.gravity_scale = (self.gravity_scale + delta).clamp(16.0, 1024.0);
    }

    /// Adjust block seed size within bounds
    pub fn adjust_seed_size(&mut self, delta: i32) {
        self.seed_size = (self.seed_size + delta).clamp(1, 32);
    }

    pub fn cycle_render_mode(&mut self) {
        self.render_mode = self.render_mode.next();
    }

    pub fn toggle_invert_y(&mut self) {
        self.invert_y = !self.invert_y;
    }
}
