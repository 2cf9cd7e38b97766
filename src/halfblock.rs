use crate::color::Rgb;
use crate::framebuffer::FrameBuffer;
use ratatui::style::Color;

/// Upper half block: foreground paints the top pixel, background the bottom one.
/// Each terminal cell therefore shows a 1x2 column of display pixels.
pub const HALF_BLOCK: char = '\u{2580}';

/// A single rendered terminal cell with position and colours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalfBlockCell {
    pub x: u16,
    pub y: u16,
    pub char: char,
    pub fg: Color,
    pub bg: Color,
}

pub fn to_color(c: Rgb) -> Color {
    Color::Rgb(c.r, c.g, c.b)
}

/// Map the published frame onto terminal cells, clipped to the canvas
pub fn render_to_halfblocks(
    frame: &FrameBuffer,
    canvas_width: u16,
    canvas_height: u16,
) -> Vec<HalfBlockCell> {
    let (cols, rows) = canvas_size_for(frame.width(), frame.height());
    let cols = cols.min(canvas_width);
    let rows = rows.min(canvas_height);

    let mut cells = Vec::with_capacity(cols as usize * rows as usize);
    for cy in 0..rows {
        let top = cy as usize * 2;
        for cx in 0..cols {
            let x = cx as usize;
            // An odd-height frame leaves the last bottom half blank
            let bottom = if top + 1 < frame.height() {
                frame.pixel(x, top + 1)
            } else {
                Rgb::BLACK
            };
            cells.push(HalfBlockCell {
                x: cx,
                y: cy,
                char: HALF_BLOCK,
                fg: to_color(frame.pixel(x, top)),
                bg: to_color(bottom),
            });
        }
    }
    cells
}

/// Terminal cells needed to show a `width x height` frame
pub fn canvas_size_for(width: usize, height: usize) -> (u16, u16) {
    let cols = width.min(u16::MAX as usize) as u16;
    let rows = height.div_ceil(2).min(u16::MAX as usize) as u16;
    (cols, rows)
}

/// Largest display that fits the canvas, for `--fit`
pub fn fit_display_size(canvas_width: u16, canvas_height: u16) -> (usize, usize) {
    (
        (canvas_width as usize).max(8),
        (canvas_height as usize * 2).max(8),
    )
}
