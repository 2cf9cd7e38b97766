use crate::color::ColorScheme;
use crate::config::{AppConfig, ConfigError, CONFIG_VERSION};
use crate::framebuffer::FrameBuffer;
use crate::halfblock;
use crate::settings::{SeedPattern, SimulationSettings};
use crate::simulation::Simulation;
use crate::tilt::Tilt;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Focus state for parameter editing in the sidebar
/// Alphabetically ordered for consistent UI display
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Focus {
    #[default]
    None,
    ColorScheme,
    FrameRate,
    Gravity,
    MaxSpeed,
    Mode,
    Seed,
    Supersample,
    Tilt,
    // Controls box (not a param)
    Controls,
}

impl Focus {
    /// Tab cycles through parameters in alphabetical order
    pub fn next(&self) -> Focus {
        match self {
            Focus::None | Focus::Controls => Focus::ColorScheme,
            Focus::ColorScheme => Focus::FrameRate,
            Focus::FrameRate => Focus::Gravity,
            Focus::Gravity => Focus::MaxSpeed,
            Focus::MaxSpeed => Focus::Mode,
            Focus::Mode => Focus::Seed,
            Focus::Seed => Focus::Supersample,
            Focus::Supersample => Focus::Tilt,
            Focus::Tilt => Focus::ColorScheme,
        }
    }

    pub fn prev(&self) -> Focus {
        match self {
            Focus::None | Focus::Controls => Focus::Tilt,
            Focus::ColorScheme => Focus::Tilt,
            Focus::FrameRate => Focus::ColorScheme,
            Focus::Gravity => Focus::FrameRate,
            Focus::MaxSpeed => Focus::Gravity,
            Focus::Mode => Focus::MaxSpeed,
            Focus::Seed => Focus::Mode,
            Focus::Supersample => Focus::Seed,
            Focus::Tilt => Focus::Supersample,
        }
    }

    /// Line index in the parameters box
    pub fn line_index(&self) -> u16 {
        match self {
            Focus::None | Focus::Controls => 0,
            Focus::ColorScheme => 0,
            Focus::FrameRate => 1,
            Focus::Gravity => 2,
            Focus::MaxSpeed => 3,
            Focus::Mode => 4,
            Focus::Seed => 5,
            Focus::Supersample => 6,
            Focus::Tilt => 7,
        }
    }

    pub fn is_param(&self) -> bool {
        !matches!(self, Focus::None | Focus::Controls)
    }
}

/// Main application state
pub struct App {
    pub simulation: Simulation,
    pub frame: FrameBuffer,
    pub tilt: Tilt,
    /// Degrees per tilt key press
    pub tilt_step: f32,
    pub paused: bool,
    pub focus: Focus,
    pub fullscreen_mode: bool,
    pub show_help: bool,
    pub help_scroll: u16,
    /// Track the terminal size instead of a fixed display
    pub fit: bool,
    /// Last user-facing message (snapshot saved, config error, ...)
    pub status: Option<String>,
    pub config_path: PathBuf,
}

impl App {
    pub fn new(config: AppConfig, fit: bool, config_path: PathBuf) -> Self {
        let mut simulation = Simulation::new(config.settings, config.color_scheme);
        simulation.init(config.width, config.height);
        let mut app = Self {
            simulation,
            frame: FrameBuffer::new(config.width, config.height),
            tilt: Tilt::default(),
            tilt_step: config.tilt_step,
            paused: false,
            focus: Focus::Controls,
            fullscreen_mode: false,
            show_help: false,
            help_scroll: 0,
            fit,
            status: None,
            config_path,
        };
        app.redraw();
        app
    }

    /// Advance the simulation if the frame gate allows; returns whether a frame was drawn
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.paused {
            return false;
        }
        self.simulation
            .update_and_draw(now, &mut self.frame, self.tilt.gravity())
    }

    /// Redraw the current world without stepping
    fn redraw(&mut self) {
        let (width, height) = self.simulation.display_size();
        self.frame.resize(width, height);
        self.simulation.draw(&mut self.frame);
    }

    fn update_settings(&mut self, change: impl FnOnce(&mut SimulationSettings)) {
        let mut settings = self.simulation.settings().clone();
        change(&mut settings);
        self.simulation.apply_settings(settings);
        self.redraw();
    }

    pub fn adjust_focused_up(&mut self) {
        match self.focus {
            Focus::None | Focus::Controls => {}
            Focus::ColorScheme => self.set_color_scheme(self.simulation.color_scheme().next()),
            Focus::FrameRate => self.adjust_frame_rate(5),
            Focus::Gravity => self.update_settings(|s| s.adjust_gravity_scale(32.0)),
            Focus::MaxSpeed => self.update_settings(|s| s.adjust_max_speed(16)),
            Focus::Mode => self.cycle_render_mode(),
            Focus::Seed => {
                let next = self.simulation.settings().seed_pattern.next();
                self.set_seed_pattern(next);
            }
            Focus::Supersample => self.update_settings(|s| s.adjust_supersample(1)),
            Focus::Tilt => self.tilt.rotate(self.tilt_step),
        }
    }

    pub fn adjust_focused_down(&mut self) {
        match self.focus {
            Focus::None | Focus::Controls => {}
            Focus::ColorScheme => self.set_color_scheme(self.simulation.color_scheme().prev()),
            Focus::FrameRate => self.adjust_frame_rate(-5),
            Focus::Gravity => self.update_settings(|s| s.adjust_gravity_scale(-32.0)),
            Focus::MaxSpeed => self.update_settings(|s| s.adjust_max_speed(-16)),
            Focus::Mode => self.cycle_render_mode(),
            Focus::Seed => {
                let prev = self.simulation.settings().seed_pattern.prev();
                self.set_seed_pattern(prev);
            }
            Focus::Supersample => self.update_settings(|s| s.adjust_supersample(-1)),
            Focus::Tilt => self.tilt.rotate(-self.tilt_step),
        }
    }

    pub fn next_focus(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn prev_focus(&mut self) {
        self.focus = self.focus.prev();
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Re-seed the world at the current size
    pub fn reset(&mut self) {
        self.simulation.reset();
        self.redraw();
    }

    /// Set seed pattern directly (1-4 keys); always re-seeds
    pub fn set_seed_pattern(&mut self, pattern: SeedPattern) {
        if self.simulation.settings().seed_pattern == pattern {
            self.reset();
        } else {
            self.update_settings(|s| s.seed_pattern = pattern);
        }
    }

    pub fn set_color_scheme(&mut self, scheme: ColorScheme) {
        self.simulation.set_color_scheme(scheme);
        self.redraw();
    }

    pub fn cycle_color_scheme(&mut self) {
        self.set_color_scheme(self.simulation.color_scheme().next());
    }

    pub fn cycle_render_mode(&mut self) {
        self.update_settings(|s| s.cycle_render_mode());
    }

    pub fn toggle_invert_y(&mut self) {
        self.update_settings(|s| s.toggle_invert_y());
    }

    pub fn adjust_frame_rate(&mut self, delta: i32) {
        self.update_settings(|s| s.adjust_frame_rate(delta));
    }

    pub fn tilt_left(&mut self) {
        self.tilt.rotate(-self.tilt_step);
    }

    pub fn tilt_right(&mut self) {
        self.tilt.rotate(self.tilt_step);
    }

    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen_mode = !self.fullscreen_mode;
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        if self.show_help {
            self.help_scroll = 0;
        }
    }

    pub fn scroll_help_up(&mut self) {
        self.help_scroll = self.help_scroll.saturating_sub(1);
    }

    pub fn scroll_help_down(&mut self, max_scroll: u16) {
        self.help_scroll = (self.help_scroll + 1).min(max_scroll);
    }

    /// Follow the canvas size when fitting; re-seeds only if the display changes
    pub fn resize(&mut self, canvas_width: u16, canvas_height: u16) {
        if !self.fit {
            return;
        }
        let (width, height) = halfblock::fit_display_size(canvas_width, canvas_height);
        if (width, height) != self.simulation.display_size() {
            self.simulation.init(width, height);
            self.redraw();
        }
    }

    /// Snapshot of the current state as a saveable config
    pub fn to_config(&self) -> AppConfig {
        let (width, height) = self.simulation.display_size();
        AppConfig {
            version: CONFIG_VERSION,
            settings: self.simulation.settings().clone(),
            color_scheme: self.simulation.color_scheme(),
            tilt_step: self.tilt_step,
            width,
            height,
        }
    }

    pub fn save_config(&mut self) -> Result<(), ConfigError> {
        let result = self.to_config().save_to_file(&self.config_path);
        match &result {
            Ok(()) => {
                info!("Saved config to {}", self.config_path.display());
                self.status = Some(format!("Saved {}", self.config_path.display()));
            }
            Err(e) => {
                warn!("Saving config failed: {}", e);
                self.status = Some(format!("Save failed: {}", e));
            }
        }
        result
    }

    /// Write the current frame as a PNG into `dir`
    pub fn snapshot(&mut self, dir: &Path) -> image::ImageResult<PathBuf> {
        let path = dir.join(format!("sand-timer-{:05}.png", self.simulation.frames()));
        match self.frame.save_png(&path) {
            Ok(()) => {
                info!("Snapshot written to {}", path.display());
                self.status = Some(format!("Snapshot {}", path.display()));
                Ok(path)
            }
            Err(e) => {
                warn!("Snapshot failed: {}", e);
                self.status = Some(format!("Snapshot failed: {}", e));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::RenderMode;
    use std::time::Duration;
    use tempfile::TempDir;

    fn test_app() -> App {
        App::new(AppConfig::default(), false, PathBuf::from("unused.json"))
    }

    #[test]
    fn test_focus_cycle_round_trips() {
        let mut focus = Focus::Controls;
        let mut seen = Vec::new();
        for _ in 0..8 {
            focus = focus.next();
            seen.push(focus.line_index());
        }
        assert_eq!(seen, (0..8).collect::<Vec<u16>>());
        assert_eq!(focus.next(), Focus::ColorScheme);
        assert_eq!(Focus::ColorScheme.prev(), Focus::Tilt);
        assert!(!Focus::Controls.is_param());
    }

    #[test]
    fn test_initial_frame_is_drawn() {
        let app = test_app();
        assert_eq!((app.frame.width(), app.frame.height()), (64, 32));
        assert_eq!(app.frame.pixel(12, 12), ColorScheme::Classic.palette().sand);
    }

    #[test]
    fn test_pause_stops_ticks() {
        let mut app = test_app();
        let now = Instant::now();
        assert!(app.tick(now));

        app.toggle_pause();
        assert!(!app.tick(now + Duration::from_secs(1)));
        assert_eq!(app.simulation.frames(), 1);
    }

    #[test]
    fn test_adjust_focused_frame_rate() {
        let mut app = test_app();
        app.focus = Focus::FrameRate;
        app.adjust_focused_down();
        assert_eq!(app.simulation.settings().frame_rate, 55);
        app.adjust_focused_up();
        app.adjust_focused_up();
        assert_eq!(app.simulation.settings().frame_rate, 65);
    }

    #[test]
    fn test_mode_switch_keeps_display_size() {
        let mut app = test_app();
        app.cycle_render_mode();
        assert_eq!(app.simulation.settings().render_mode, RenderMode::Density);
        assert_eq!(app.simulation.display_size(), (64, 32));
        assert_eq!((app.frame.width(), app.frame.height()), (64, 32));
    }

    #[test]
    fn test_seed_pattern_reseeds() {
        let mut app = test_app();
        app.tick(Instant::now());
        app.set_seed_pattern(SeedPattern::Fill);
        assert_eq!(app.simulation.frames(), 0);
        let world = app.simulation.world().unwrap();
        assert_eq!(world.granular_count(), 64 * 12);
    }

    #[test]
    fn test_tilt_keys() {
        let mut app = test_app();
        app.tilt_right();
        assert_eq!(app.tilt.angle_deg, 15.0);
        app.tilt_left();
        app.tilt_left();
        assert_eq!(app.tilt.angle_deg, 345.0);
    }

    #[test]
    fn test_resize_only_when_fitting() {
        let mut app = test_app();
        app.resize(100, 30);
        assert_eq!(app.simulation.display_size(), (64, 32));

        app.fit = true;
        app.resize(100, 30);
        assert_eq!(app.simulation.display_size(), (100, 60));
        assert_eq!(app.frame.width(), 100);
    }

    #[test]
    fn test_save_config_and_snapshot() {
        let dir = TempDir::new().unwrap();
        let mut app = App::new(AppConfig::default(), false, dir.path().join("config.json"));
        app.set_color_scheme(ColorScheme::Ocean);

        app.save_config().unwrap();
        let loaded = AppConfig::load_from_file(&app.config_path).unwrap();
        assert_eq!(loaded, app.to_config());
        assert_eq!(loaded.color_scheme, ColorScheme::Ocean);

        let png = app.snapshot(dir.path()).unwrap();
        assert!(png.exists());
        assert!(app.status.unwrap().starts_with("Snapshot"));
    }

    #[test]
    fn test_failed_save_is_reported_in_status() {
        let blocker = tempfile::NamedTempFile::new().unwrap();
        // Parent of the target is a regular file, so the directory cannot be created
        let mut app = App::new(
            AppConfig::default(),
            false,
            blocker.path().join("config.json"),
        );

        assert!(app.save_config().is_err());
        assert!(app.status.as_deref().unwrap().starts_with("Save failed"));

        assert!(app.snapshot(&blocker.path().join("shots")).is_err());
        assert!(app.status.as_deref().unwrap().starts_with("Snapshot failed"));
    }

    #[test]
    fn test_save_config_creates_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut app = App::new(AppConfig::default(), false, path.clone());
        app.save_config().unwrap();
        assert!(path.exists());
    }
}
