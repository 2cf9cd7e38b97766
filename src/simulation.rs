use crate::color::ColorScheme;
use crate::gate::FrameGate;
use crate::grid::Grid;
use crate::particle::Particle;
use crate::physics::{Gravity, StepOutcome};
use crate::render::{PixelSink, Renderer};
use crate::settings::{SeedPattern, SimulationSettings};
use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

/// Fixed seed so the scatter layout is the same on every run
const SCATTER_SEED: u64 = 0x5A4D_7131;
const SCATTER_DENSITY: f64 = 0.25;

/// Tally of particle outcomes for one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepStats {
    pub moved: usize,
    pub slid: usize,
    pub blocked: usize,
    pub resting: usize,
    pub rejected: usize,
}

impl StepStats {
    fn record(&mut self, outcome: StepOutcome) {
        match outcome {
            StepOutcome::Moved => self.moved += 1,
            StepOutcome::Slid => self.slid += 1,
            StepOutcome::Blocked => self.blocked += 1,
            StepOutcome::Resting => self.resting += 1,
            StepOutcome::Rejected => self.rejected += 1,
        }
    }

    /// Particles that changed cell this step
    pub fn active(&self) -> usize {
        self.moved + self.slid
    }
}

/// Grid plus the ordered particle collection that owns it
#[derive(Debug, Clone)]
pub struct World {
    grid: Grid,
    particles: Vec<Particle>,
    /// Clear and rebuild occupancy at the start of every step (density variant)
    rebuild_each_step: bool,
}

impl World {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            grid: Grid::new(width, height),
            particles: Vec::new(),
            rebuild_each_step: false,
        }
    }

    /// Rebuild occupancy from the particle list before every step
    pub fn with_rebuild(mut self, rebuild: bool) -> Self {
        self.rebuild_each_step = rebuild;
        self
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn granular_count(&self) -> usize {
        self.particles.iter().filter(|p| !p.is_static()).count()
    }

    /// Add a particle if its cell is inside the grid and empty
    pub fn spawn(&mut self, particle: Particle) -> bool {
        if !self.grid.is_free(particle.x, particle.y) {
            return false;
        }
        self.grid.occupy(particle.x, particle.y, particle.occupant());
        self.particles.push(particle);
        true
    }

    /// Recompute occupancy from particle positions
    pub fn rebuild_grid(&mut self) {
        self.grid.clear();
        for p in &self.particles {
            self.grid.occupy(p.x, p.y, p.occupant());
        }
    }

    /// Whether the grid exactly reflects the particle positions
    pub fn is_consistent(&self) -> bool {
        let mut expected = Grid::new(self.grid.width(), self.grid.height());
        for p in &self.particles {
            expected.occupy(p.x, p.y, p.occupant());
        }
        expected == self.grid
    }

    /// Advance every particle once, in order, patching occupancy as they move
    pub fn step(&mut self, gravity: Gravity, max_speed: i32) -> StepStats {
        if self.rebuild_each_step {
            self.rebuild_grid();
        }

        let mut stats = StepStats::default();
        for particle in self.particles.iter_mut() {
            let (ox, oy) = particle.position();
            let outcome = particle.update(&self.grid, gravity, max_speed);
            stats.record(outcome);

            if particle.position() != (ox, oy) {
                let occupant = particle.occupant();
                self.grid.vacate(ox, oy, occupant);
                self.grid.occupy(particle.x, particle.y, occupant);
            }
        }
        stats
    }

    /// Populate according to the settings; geometry is in display pixels
    /// and scaled by `scale` onto the simulation grid.
    pub fn seed(&mut self, settings: &SimulationSettings, scale: usize) {
        let s = scale.max(1) as i32;

        if let Some((ox, oy)) = settings.obstacle {
            if !self.spawn(Particle::wall(ox.saturating_mul(s), oy.saturating_mul(s))) {
                debug!("Obstacle at ({}, {}) is off-grid or taken", ox, oy);
            }
        }

        match settings.seed_pattern {
            SeedPattern::Block => self.seed_block(
                settings.seed_x.saturating_mul(s),
                settings.seed_y.saturating_mul(s),
                settings.seed_size.saturating_mul(s),
            ),
            SeedPattern::Fill => self.seed_fill(),
            SeedPattern::Hourglass => self.seed_hourglass(s),
            SeedPattern::Scatter => self.seed_scatter(),
        }
    }

    /// Square of sand with its top-left corner at (x0, y0), clipped to the grid
    fn seed_block(&mut self, x0: i32, y0: i32, size: i32) {
        let x_end = x0.saturating_add(size).min(self.grid.width() as i32);
        let y_end = y0.saturating_add(size).min(self.grid.height() as i32);
        for y in y0.max(0)..y_end {
            for x in x0.max(0)..x_end {
                self.spawn(Particle::granular(x, y));
            }
        }
    }

    /// Top 40% of the grid
    fn seed_fill(&mut self) {
        let rows = (self.grid.height() * 2 / 5) as i32;
        let width = self.grid.width() as i32;
        for y in 0..rows {
            for x in 0..width {
                self.spawn(Particle::granular(x, y));
            }
        }
    }

    /// Solid walls around two chambers joined by a neck `2 * neck` cells wide
    fn seed_hourglass(&mut self, neck: i32) {
        let width = self.grid.width() as i32;
        let height = self.grid.height() as i32;
        if width < 4 || height < 4 {
            self.seed_fill();
            return;
        }

        let cx = width / 2;
        let cy = height / 2;
        let neck = neck.min(cx);
        let span = (cy - 1).max(1);
        let half_width = |y: i32| {
            let d = if y < cy { cy - 1 - y } else { y - cy };
            neck + d * (cx - neck) / span
        };

        for y in 0..height {
            let hw = half_width(y);
            for x in 0..width {
                if x < cx - hw || x >= cx + hw {
                    self.spawn(Particle::wall(x, y));
                }
            }
        }

        // Upper chamber, leaving headroom above the neck
        let sand_rows = cy * 3 / 4;
        for y in 0..sand_rows {
            for x in 0..width {
                self.spawn(Particle::granular(x, y));
            }
        }
    }

    /// Reproducible random sprinkle over the top half
    fn seed_scatter(&mut self) {
        let mut rng = StdRng::seed_from_u64(SCATTER_SEED);
        let width = self.grid.width() as i32;
        let rows = (self.grid.height() / 2) as i32;
        for y in 0..rows {
            for x in 0..width {
                if rng.gen_bool(SCATTER_DENSITY) {
                    self.spawn(Particle::granular(x, y));
                }
            }
        }
    }
}

/// Frame-gated sand simulation: owns the world, the rate gate and the renderer.
///
/// Starts uninitialised; [`Simulation::init`] must be called before frames
/// are produced.
#[derive(Debug, Clone)]
pub struct Simulation {
    settings: SimulationSettings,
    world: Option<World>,
    gate: FrameGate,
    renderer: Renderer,
    display: (usize, usize),
    frames: u64,
    last_stats: StepStats,
    warned_uninit: bool,
}

impl Simulation {
    pub fn new(settings: SimulationSettings, scheme: ColorScheme) -> Self {
        let settings = settings.sanitized();
        Self {
            gate: FrameGate::new(settings.frame_interval()),
            renderer: Renderer::new(scheme, settings.scale()),
            settings,
            world: None,
            display: (0, 0),
            frames: 0,
            last_stats: StepStats::default(),
            warned_uninit: false,
        }
    }

    /// (Re)allocate and seed the world for a `width x height` display
    pub fn init(&mut self, width: usize, height: usize) {
        let scale = self.settings.scale();
        let rebuild = scale > 1;
        let mut world = World::new(width * scale, height * scale).with_rebuild(rebuild);
        world.seed(&self.settings, scale);

        info!(
            "Initialised {}x{} display ({} mode, {}x{} grid) with {} grains, {} obstacles",
            width,
            height,
            self.settings.render_mode.name(),
            world.grid().width(),
            world.grid().height(),
            world.granular_count(),
            world.particles().len() - world.granular_count(),
        );

        self.renderer.set_scale(scale);
        self.gate.set_interval(self.settings.frame_interval());
        self.gate.reset();
        self.display = (width, height);
        self.world = Some(world);
        self.frames = 0;
        self.last_stats = StepStats::default();
        self.warned_uninit = false;
    }

    /// Re-run [`Simulation::init`] at the current display size
    pub fn reset(&mut self) {
        let (width, height) = self.display;
        self.init(width, height);
    }

    pub fn is_ready(&self) -> bool {
        self.world.is_some()
    }

    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    pub fn color_scheme(&self) -> ColorScheme {
        self.renderer.scheme()
    }

    pub fn display_size(&self) -> (usize, usize) {
        self.display
    }

    /// Physics steps taken since the last init
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_stats(&self) -> StepStats {
        self.last_stats
    }

    pub fn set_color_scheme(&mut self, scheme: ColorScheme) {
        self.renderer.set_scheme(scheme);
    }

    /// Replace the settings, re-seeding only when geometry or seeding changed
    pub fn apply_settings(&mut self, settings: SimulationSettings) {
        let settings = settings.sanitized();
        let reinit = settings.requires_reinit(&self.settings);
        debug!("Applying settings (reinit: {}): {:?}", reinit, settings);

        self.settings = settings;
        self.gate.set_interval(self.settings.frame_interval());
        if reinit && self.is_ready() {
            self.reset();
        } else {
            self.renderer.set_scale(self.settings.scale());
        }
    }

    /// One physics step with no rate gate. Returns `None` before init.
    pub fn step_once(&mut self, gravity: [f32; 3]) -> Option<StepStats> {
        let world = self.world.as_mut()?;
        let g = Gravity::from_vector(gravity, self.settings.gravity_scale, self.settings.invert_y);
        let stats = world.step(g, self.settings.max_speed);

        self.frames += 1;
        self.last_stats = stats;
        trace!("Frame {} gravity {:?}: {:?}", self.frames, g, stats);
        Some(stats)
    }

    /// Render the current world into `sink` and publish the frame
    pub fn draw<S: PixelSink + ?Sized>(&self, sink: &mut S) {
        if let Some(world) = &self.world {
            self.renderer.render(world.grid(), self.settings.render_mode, sink);
        }
    }

    /// Advance at most one frame and draw it, if a frame interval has elapsed
    /// since the last accepted call. Returns whether a frame was produced.
    pub fn update_and_draw<S: PixelSink + ?Sized>(
        &mut self,
        now: Instant,
        sink: &mut S,
        gravity: [f32; 3],
    ) -> bool {
        if self.world.is_none() {
            if !self.warned_uninit {
                warn!("update_and_draw called before init; ignoring");
                self.warned_uninit = true;
            }
            return false;
        }
        if !self.gate.ready(now) {
            return false;
        }

        self.step_once(gravity);
        self.draw(sink);
        true
    }
}
