use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::info;
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use sand_timer::app::{App, Focus};
use sand_timer::color::ColorScheme;
use sand_timer::config::{AppConfig, ConfigError};
use sand_timer::framebuffer::FrameBuffer;
use sand_timer::presets::{Preset, PresetManager};
use sand_timer::settings::{RenderMode, SeedPattern, MAX_DISPLAY_SIZE};
use sand_timer::simulation::Simulation;
use sand_timer::tilt::Tilt;
use sand_timer::{halfblock, ui};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "sand-timer")]
#[command(about = "Tilt-driven falling sand simulation in the terminal")]
struct Args {
    // === Display ===
    /// Display width in pixels
    #[arg(long)]
    width: Option<usize>,

    /// Display height in pixels
    #[arg(long)]
    height: Option<usize>,

    /// Size the display to the terminal and follow resizes
    #[arg(long)]
    fit: bool,

    /// Render mode (direct, density)
    #[arg(long, value_parser = parse_mode)]
    mode: Option<RenderMode>,

    /// Supersampling factor for density mode (2-4)
    #[arg(long)]
    scale: Option<usize>,

    /// Frame rate (1-120)
    #[arg(long)]
    fps: Option<u32>,

    /// Color scheme (classic, desert, ocean, mono, ember)
    #[arg(long, value_parser = parse_color)]
    color: Option<ColorScheme>,

    // === Physics ===
    /// Initial seed pattern (block, fill, hourglass, scatter)
    #[arg(long, value_parser = parse_seed)]
    seed: Option<SeedPattern>,

    /// Speed limit in sub-cell units per step (32-256)
    #[arg(long = "max-speed")]
    max_speed: Option<i32>,

    /// Gravity strength in sub-cell units per step (16-1024)
    #[arg(long = "gravity-scale")]
    gravity_scale: Option<f32>,

    /// Treat the gravity source as y-up
    #[arg(long = "invert-y")]
    invert_y: bool,

    // === Files ===
    /// Start from a built-in or saved preset
    #[arg(long)]
    preset: Option<String>,

    /// List presets and exit
    #[arg(long = "list-presets")]
    list_presets: bool,

    /// Store the resolved settings as a user preset and exit
    #[arg(long = "save-preset", value_name = "NAME")]
    save_preset: Option<String>,

    /// Remove a user preset and exit
    #[arg(long = "delete-preset", value_name = "NAME")]
    delete_preset: Option<String>,

    /// Load configuration from a JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the resolved configuration to this file (also the target of the S key)
    #[arg(long = "save-config")]
    save_config: Option<PathBuf>,

    /// Write logs to this file (level from RUST_LOG, default info)
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,

    /// Run this many frames without a terminal UI and print the result
    #[arg(long)]
    headless: Option<u64>,
}

fn parse_mode(s: &str) -> Result<RenderMode, String> {
    RenderMode::parse(s).ok_or_else(|| format!("unknown render mode '{}'", s))
}

fn parse_seed(s: &str) -> Result<SeedPattern, String> {
    SeedPattern::parse(s).ok_or_else(|| format!("unknown seed pattern '{}'", s))
}

fn parse_color(s: &str) -> Result<ColorScheme, String> {
    ColorScheme::parse(s).ok_or_else(|| format!("unknown color scheme '{}'", s))
}

/// Logs go to a file when asked, or to stderr in headless mode; never over the TUI
fn init_logging(log_file: Option<&Path>, headless: bool) -> io::Result<()> {
    let env = env_logger::Env::default().default_filter_or("info");
    match log_file {
        Some(path) => {
            let file = File::create(path)?;
            env_logger::Builder::from_env(env)
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init();
        }
        None if headless => env_logger::Builder::from_env(env).init(),
        None => {}
    }
    Ok(())
}

/// Config file, then preset, then individual flags
fn resolve_config(args: &Args) -> Result<AppConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::default(),
    };

    if let Some(name) = &args.preset {
        let presets = PresetManager::new();
        let preset = presets
            .find(name)
            .ok_or_else(|| ConfigError::UnknownPreset(name.clone()))?;
        config.settings = preset.settings.clone();
    }

    let s = &mut config.settings;
    if let Some(mode) = args.mode {
        s.render_mode = mode;
    }
    if let Some(scale) = args.scale {
        s.supersample = scale;
    }
    if let Some(fps) = args.fps {
        s.frame_rate = fps;
    }
    if let Some(seed) = args.seed {
        s.seed_pattern = seed;
    }
    if let Some(max_speed) = args.max_speed {
        s.max_speed = max_speed;
    }
    if let Some(gravity_scale) = args.gravity_scale {
        s.gravity_scale = gravity_scale;
    }
    if args.invert_y {
        s.invert_y = true;
    }
    config.settings = config.settings.sanitized();

    if let Some(color) = args.color {
        config.color_scheme = color;
    }
    if let Some(width) = args.width {
        config.width = width.clamp(1, MAX_DISPLAY_SIZE);
    }
    if let Some(height) = args.height {
        config.height = height.clamp(1, MAX_DISPLAY_SIZE);
    }
    Ok(config)
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|p| p.join("sand-timer").join("config.json"))
        .unwrap_or_else(|| PathBuf::from("sand-timer.json"))
}

fn run_headless(config: &AppConfig, frames: u64) {
    let mut simulation = Simulation::new(config.settings.clone(), config.color_scheme);
    simulation.init(config.width, config.height);
    let mut frame = FrameBuffer::new(config.width, config.height);

    let gravity = Tilt::default().gravity();
    for _ in 0..frames {
        simulation.step_once(gravity);
    }
    simulation.draw(&mut frame);

    print!("{}", frame.to_ascii());
    let stats = simulation.last_stats();
    println!(
        "frames: {}  grains: {}  moved: {}  slid: {}  blocked: {}  resting: {}  rejected: {}",
        simulation.frames(),
        simulation.world().map_or(0, |w| w.granular_count()),
        stats.moved,
        stats.slid,
        stats.blocked,
        stats.resting,
        stats.rejected,
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.list_presets {
        for preset in PresetManager::new().all_presets() {
            println!("{:<14} {}", preset.name, preset.description);
        }
        return Ok(());
    }

    init_logging(args.log_file.as_deref(), args.headless.is_some())?;
    let mut config = resolve_config(&args)?;

    if let Some(name) = &args.delete_preset {
        PresetManager::new().delete_preset(name)?;
        println!("Deleted preset {}", name);
        return Ok(());
    }
    if let Some(name) = &args.save_preset {
        let preset = Preset::new(
            name.clone(),
            "Saved from the command line",
            config.settings.clone(),
        );
        let path = PresetManager::new().save_preset(preset)?;
        println!("Saved preset {} to {}", name, path.display());
        return Ok(());
    }

    if let Some(path) = &args.save_config {
        config.save_to_file(path)?;
        info!("Wrote config to {}", path.display());
    }

    if let Some(frames) = args.headless {
        run_headless(&config, frames);
        return Ok(());
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    if args.fit {
        let size = terminal.size()?;
        let (canvas_width, canvas_height) =
            ui::get_canvas_size(Rect::new(0, 0, size.width, size.height), false);
        (config.width, config.height) = halfblock::fit_display_size(canvas_width, canvas_height);
    }

    let config_path = args
        .save_config
        .clone()
        .or_else(|| args.config.clone())
        .unwrap_or_else(default_config_path);
    let mut app = App::new(config, args.fit, config_path);

    let res = run_app(&mut terminal, &mut app);

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    // Short enough that the frame gate, not input polling, sets the pace
    const POLL_TIMEOUT: Duration = Duration::from_millis(4);

    let mut dirty = true;
    loop {
        if dirty {
            terminal.draw(|frame| ui::render(frame, app))?;
            dirty = false;
        }

        if event::poll(POLL_TIMEOUT)? {
            dirty = true;
            match event::read()? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }

                    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                        return Ok(());
                    }

                    match key.code {
                        // System controls
                        KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                        KeyCode::Char(' ') => app.toggle_pause(),
                        KeyCode::Char('r') | KeyCode::Char('R') => app.reset(),
                        KeyCode::Char('v') | KeyCode::Char('V') => app.toggle_fullscreen(),
                        KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => {
                            app.toggle_help()
                        }

                        // Tilt
                        KeyCode::Left => app.tilt_left(),
                        KeyCode::Right => app.tilt_right(),
                        KeyCode::Char('f') | KeyCode::Char('F') => app.tilt.flip(),
                        KeyCode::Char('0') => app.tilt.toggle_flat(),

                        KeyCode::Char('1') => app.set_seed_pattern(SeedPattern::Block),
                        KeyCode::Char('2') => app.set_seed_pattern(SeedPattern::Fill),
                        KeyCode::Char('3') => app.set_seed_pattern(SeedPattern::Hourglass),
                        KeyCode::Char('4') => app.set_seed_pattern(SeedPattern::Scatter),
                        KeyCode::Char('+') | KeyCode::Char('=') => {
                            app.adjust_frame_rate(5);
                            app.focus = Focus::FrameRate;
                        }
                        KeyCode::Char('-') | KeyCode::Char('_') => {
                            app.adjust_frame_rate(-5);
                            app.focus = Focus::FrameRate;
                        }
                        KeyCode::Char('c') | KeyCode::Char('C') => {
                            app.cycle_color_scheme();
                            app.focus = Focus::ColorScheme;
                        }
                        KeyCode::Char('m') | KeyCode::Char('M') => {
                            app.cycle_render_mode();
                            app.focus = Focus::Mode;
                        }
                        KeyCode::Char('i') | KeyCode::Char('I') => app.toggle_invert_y(),
                        KeyCode::Char('p') | KeyCode::Char('P') => {
                            // Failures land in the status line
                            let _ = app.snapshot(Path::new("."));
                        }
                        KeyCode::Char('s') | KeyCode::Char('S') => {
                            let _ = app.save_config();
                        }

                        // Navigation
                        KeyCode::Tab => app.next_focus(),
                        KeyCode::BackTab => app.prev_focus(),
                        KeyCode::Up => {
                            if app.show_help {
                                app.scroll_help_up();
                            } else {
                                app.adjust_focused_up();
                            }
                        }
                        KeyCode::Down => {
                            if app.show_help {
                                app.scroll_help_down(ui::HELP_CONTENT_LINES);
                            } else {
                                app.adjust_focused_down();
                            }
                        }
                        KeyCode::Esc => {
                            if app.show_help {
                                app.toggle_help();
                            } else if app.focus.is_param() {
                                app.focus = Focus::Controls;
                            }
                        }
                        KeyCode::Char('j') | KeyCode::Char('J') => {
                            if app.show_help {
                                app.scroll_help_down(ui::HELP_CONTENT_LINES);
                            }
                        }
                        KeyCode::Char('k') | KeyCode::Char('K') => {
                            if app.show_help {
                                app.scroll_help_up();
                            }
                        }
                        _ => {}
                    }
                }
                Event::Resize(width, height) => {
                    let (canvas_width, canvas_height) =
                        ui::get_canvas_size(Rect::new(0, 0, width, height), app.fullscreen_mode);
                    app.resize(canvas_width, canvas_height);
                }
                _ => {}
            }
        }

        if app.tick(Instant::now()) {
            dirty = true;
        }
    }
}
