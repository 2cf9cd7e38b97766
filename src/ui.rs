use crate::app::{App, Focus};
use crate::halfblock;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const SIDEBAR_WIDTH: u16 = 24;

/// Max scroll for help content (generous to account for text wrapping on small screens)
pub const HELP_CONTENT_LINES: u16 = 40;

// UI color scheme
const BORDER_COLOR: Color = Color::Cyan;
const HIGHLIGHT_COLOR: Color = Color::Yellow;
const TEXT_COLOR: Color = Color::White;
const DIM_TEXT_COLOR: Color = Color::Gray;

/// Creates a standard styled block with rounded borders
fn styled_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_COLOR))
        .title(title)
}

pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if app.fullscreen_mode {
        render_canvas(frame, area, app);
    } else {
        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(area);

        render_sidebar(frame, layout[0], app);
        render_canvas(frame, layout[1], app);
    }

    if app.show_help {
        render_help_overlay(frame, area, app);
    }
}

/// Calculate the canvas size (excluding borders)
pub fn get_canvas_size(frame_area: Rect, fullscreen: bool) -> (u16, u16) {
    if fullscreen {
        (frame_area.width.saturating_sub(2), frame_area.height.saturating_sub(2))
    } else {
        let canvas_width = frame_area.width.saturating_sub(SIDEBAR_WIDTH + 2);
        let canvas_height = frame_area.height.saturating_sub(2);
        (canvas_width, canvas_height)
    }
}

fn render_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),  // Status
            Constraint::Length(10), // Parameters
            Constraint::Min(8),     // Controls
        ])
        .split(area);

    render_status_box(frame, sections[0], app);
    render_params_box(frame, sections[1], app);
    render_controls_box(frame, sections[2], app);
}

fn render_status_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Sand Timer ");
    let sim = &app.simulation;
    let stats = sim.last_stats();
    let grains = sim.world().map_or(0, |w| w.granular_count());

    let (status_text, status_color) = if app.paused {
        ("PAUSED", HIGHLIGHT_COLOR)
    } else if stats.active() == 0 && sim.frames() > 0 {
        ("SETTLED", Color::Green)
    } else {
        ("RUNNING", BORDER_COLOR)
    };

    let (width, height) = sim.display_size();
    let mut content = vec![
        Line::from(Span::styled(
            format!("{} grains  {}x{}", grains, width, height),
            Style::default().fg(TEXT_COLOR),
        )),
        Line::from(Span::styled(
            format!("frame {}  moving {}", sim.frames(), stats.active()),
            Style::default().fg(DIM_TEXT_COLOR),
        )),
        Line::from(Span::styled(status_text, Style::default().fg(status_color))),
    ];
    if let Some(status) = &app.status {
        content.push(Line::from(Span::styled(
            status.clone(),
            Style::default().fg(DIM_TEXT_COLOR),
        )));
    }

    let paragraph = Paragraph::new(content).block(block);
    frame.render_widget(paragraph, area);
}

fn render_params_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Parameters ");

    let make_line = |label: &str, value: String, focused: bool| {
        let prefix = if focused { "> " } else { "  " };
        let style = if focused {
            Style::default().fg(HIGHLIGHT_COLOR)
        } else {
            Style::default().fg(TEXT_COLOR)
        };
        Line::from(Span::styled(format!("{}{}: {}", prefix, label, value), style))
    };

    let settings = app.simulation.settings();

    let content = vec![
        make_line(
            "Color",
            app.simulation.color_scheme().name().to_string(),
            app.focus == Focus::ColorScheme,
        ),
        make_line(
            "FPS",
            settings.frame_rate.to_string(),
            app.focus == Focus::FrameRate,
        ),
        make_line(
            "Gravity",
            format!("{:.0}", settings.gravity_scale),
            app.focus == Focus::Gravity,
        ),
        make_line(
            "Max speed",
            settings.max_speed.to_string(),
            app.focus == Focus::MaxSpeed,
        ),
        make_line(
            "Mode",
            settings.render_mode.name().to_string(),
            app.focus == Focus::Mode,
        ),
        make_line(
            "Seed",
            settings.seed_pattern.name().to_string(),
            app.focus == Focus::Seed,
        ),
        make_line(
            "Supersample",
            format!("{}x", settings.supersample),
            app.focus == Focus::Supersample,
        ),
        make_line("Tilt", app.tilt.label(), app.focus == Focus::Tilt),
    ];

    // Keep the focused line visible
    let focus_line = app.focus.line_index();
    let visible_height = area.height.saturating_sub(2);
    let content_height = content.len() as u16;

    let scroll = if visible_height == 0 || visible_height >= content_height {
        0
    } else if focus_line >= visible_height {
        focus_line.saturating_sub(visible_height - 1)
    } else {
        0
    };

    let paragraph = Paragraph::new(content).block(block).scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_controls_box(frame: &mut Frame, area: Rect, app: &App) {
    let key_style = Style::default().fg(HIGHLIGHT_COLOR);
    let desc_style = Style::default().fg(DIM_TEXT_COLOR);

    let make_control = |key: &str, desc: String| -> Line<'_> {
        Line::from(vec![
            Span::styled(format!("{:>5}", key), key_style),
            Span::styled(format!(" {}", desc), desc_style),
        ])
    };

    let invert = if app.simulation.settings().invert_y { "on" } else { "off" };
    let content = vec![
        make_control("←/→", "tilt".to_string()),
        make_control("F", "flip".to_string()),
        make_control("0", "lay flat".to_string()),
        make_control("Space", "pause/resume".to_string()),
        make_control("R", "reset".to_string()),
        make_control("1-4", "seed patterns".to_string()),
        make_control("M", "render mode".to_string()),
        make_control("C", "color scheme".to_string()),
        make_control("I", format!("invert y: {}", invert)),
        make_control("P", "PNG snapshot".to_string()),
        make_control("S", "save config".to_string()),
        make_control("V", "fullscreen".to_string()),
        make_control("+/-", "frame rate".to_string()),
        make_control("H/?", "help".to_string()),
        make_control("Q", "quit".to_string()),
    ];

    let content_height = content.len() as u16;
    let visible_height = area.height.saturating_sub(2);
    let title = if content_height > visible_height {
        " Controls (H) "
    } else {
        " Controls "
    };

    let paragraph = Paragraph::new(content).block(styled_block(title));
    frame.render_widget(paragraph, area);
}

fn render_canvas(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block("");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let cells = halfblock::render_to_halfblocks(&app.frame, inner.width, inner.height);
    let buf = frame.buffer_mut();
    for cell in cells {
        let x = inner.x + cell.x;
        let y = inner.y + cell.y;
        if let Some(target) = buf.cell_mut((x, y)) {
            target
                .set_char(cell.char)
                .set_style(Style::default().fg(cell.fg).bg(cell.bg));
        }
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect, app: &App) {
    // Centre the dialog over the canvas
    let canvas_x = if app.fullscreen_mode { 0 } else { SIDEBAR_WIDTH };
    let canvas_width = if app.fullscreen_mode {
        area.width
    } else {
        area.width.saturating_sub(SIDEBAR_WIDTH)
    };

    let help_width = 56.min(canvas_width.saturating_sub(4));
    let help_height = area.height.saturating_sub(4).min(30);
    let x = canvas_x + (canvas_width.saturating_sub(help_width)) / 2;
    let y = (area.height.saturating_sub(help_height)) / 2;

    let help_area = Rect {
        x: area.x + x,
        y: area.y + y,
        width: help_width,
        height: help_height,
    };

    frame.render_widget(Clear, help_area);

    let heading = |text: &'static str| Line::from(Span::styled(text, Style::default().fg(HIGHLIGHT_COLOR)));
    let content = vec![
        Line::from(""),
        Line::from(Span::styled("SAND TIMER", Style::default().fg(BORDER_COLOR))),
        Line::from(""),
        Line::from("Grains fall under a tilt-controlled gravity vector. Each grain moves at most one cell per step and slides diagonally around anything in its way."),
        Line::from(""),
        heading("TILT:"),
        Line::from("Left/Right rotate gravity, F flips the timer over, 0 lays it flat (no in-plane pull)."),
        Line::from(""),
        heading("SEED PATTERNS (1-4):"),
        Line::from("1=Block, 2=Fill, 3=Hourglass, 4=Scatter"),
        Line::from(""),
        heading("RENDER MODES (M):"),
        Line::from("Direct: one grain per pixel. Density: a supersampled grid, each pixel shaded by how many grains it holds."),
        Line::from(""),
        heading("PARAMETERS:"),
        Line::from("Tab/Shift+Tab select, Up/Down adjust. Supersample applies in Density mode."),
        Line::from(""),
        heading("FILES:"),
        Line::from("P writes a PNG of the current frame, S saves the config."),
        Line::from(""),
    ];

    let content_height = content.len() as u16;
    let visible_height = help_height.saturating_sub(2);
    let title = if content_height > visible_height {
        " Help (J/K scroll, H to close) "
    } else {
        " Help (H to close) "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(HIGHLIGHT_COLOR))
        .title(title);

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.help_scroll, 0));

    frame.render_widget(paragraph, help_area);
}
