//! Grid-to-pixel rendering.
//!
//! Both policies draw every display pixel of the frame into the sink's back
//! buffer and finish with [`PixelSink::swap_buffers`], so the display only
//! ever presents complete frames.

use crate::color::{ColorLut, ColorScheme, Palette, Rgb};
use crate::grid::{Cell, Grid};
use crate::settings::RenderMode;

/// Display-side consumer of rendered frames
pub trait PixelSink {
    fn draw_pixel(&mut self, x: usize, y: usize, color: Rgb);
    fn swap_buffers(&mut self);
}

/// Occupancy of the sub-cells behind one display pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DensitySample {
    /// Granular particles summed over the block
    pub granular: usize,
    /// Any sub-cell holds an obstacle
    pub has_static: bool,
}

impl DensitySample {
    /// Brightness level in `0..=capacity`; obstacles read as full
    pub fn level(&self, capacity: usize) -> usize {
        if self.has_static {
            capacity
        } else {
            self.granular.min(capacity)
        }
    }
}

/// Sum the `scale x scale` block of sub-cells behind display pixel (px, py)
pub fn sample_density(grid: &Grid, px: usize, py: usize, scale: usize) -> DensitySample {
    let mut sample = DensitySample::default();
    for sy in 0..scale {
        for sx in 0..scale {
            let x = (px * scale + sx) as i32;
            let y = (py * scale + sy) as i32;
            match grid.get(x, y) {
                Cell::Static => sample.has_static = true,
                Cell::Granular(n) => sample.granular += n as usize,
                Cell::Empty => {}
            }
        }
    }
    sample
}

/// Renders a grid according to a colour scheme
#[derive(Debug, Clone)]
pub struct Renderer {
    scheme: ColorScheme,
    palette: Palette,
    lut: ColorLut,
    scale: usize,
}

impl Renderer {
    pub fn new(scheme: ColorScheme, scale: usize) -> Self {
        let scale = scale.max(1);
        Self {
            scheme,
            palette: scheme.palette(),
            lut: scheme.build_lut(scale * scale),
            scale,
        }
    }

    pub fn scheme(&self) -> ColorScheme {
        self.scheme
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn lut(&self) -> &ColorLut {
        &self.lut
    }

    pub fn set_scheme(&mut self, scheme: ColorScheme) {
        *self = Renderer::new(scheme, self.scale);
    }

    pub fn set_scale(&mut self, scale: usize) {
        if scale.max(1) != self.scale {
            *self = Renderer::new(self.scheme, scale);
        }
    }

    /// Draw a full frame and publish it
    pub fn render<S: PixelSink + ?Sized>(&self, grid: &Grid, mode: RenderMode, sink: &mut S) {
        match mode {
            RenderMode::Direct => self.render_direct(grid, sink),
            RenderMode::Density => self.render_density(grid, sink),
        }
        sink.swap_buffers();
    }

    fn render_direct<S: PixelSink + ?Sized>(&self, grid: &Grid, sink: &mut S) {
        let width = grid.width();
        for (idx, cell) in grid.cells().iter().enumerate() {
            let color = match cell {
                Cell::Empty => self.palette.background,
                Cell::Granular(_) => self.palette.sand,
                Cell::Static => self.palette.wall,
            };
            sink.draw_pixel(idx % width, idx / width, color);
        }
    }

    fn render_density<S: PixelSink + ?Sized>(&self, grid: &Grid, sink: &mut S) {
        let capacity = self.scale * self.scale;
        let display_width = grid.width() / self.scale;
        let display_height = grid.height() / self.scale;

        for py in 0..display_height {
            for px in 0..display_width {
                let level = sample_density(grid, px, py, self.scale).level(capacity);
                sink.draw_pixel(px, py, self.lut.get(level));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Occupant;

    /// Records draw calls so frames can be inspected
    #[derive(Default)]
    struct RecordingSink {
        pixels: Vec<(usize, usize, Rgb)>,
        swaps: usize,
    }

    impl RecordingSink {
        fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
            self.pixels
                .iter()
                .rev()
                .find(|(px, py, _)| *px == x && *py == y)
                .map(|(_, _, c)| *c)
        }
    }

    impl PixelSink for RecordingSink {
        fn draw_pixel(&mut self, x: usize, y: usize, color: Rgb) {
            self.pixels.push((x, y, color));
        }

        fn swap_buffers(&mut self) {
            self.swaps += 1;
        }
    }

    #[test]
    fn test_direct_colours_per_kind() {
        let mut grid = Grid::new(3, 2);
        grid.occupy(0, 0, Occupant::Granular);
        grid.occupy(2, 1, Occupant::Static);

        let renderer = Renderer::new(ColorScheme::Classic, 1);
        let mut sink = RecordingSink::default();
        renderer.render(&grid, RenderMode::Direct, &mut sink);

        let palette = ColorScheme::Classic.palette();
        assert_eq!(sink.pixels.len(), 6);
        assert_eq!(sink.swaps, 1);
        assert_eq!(sink.pixel(0, 0), Some(palette.sand));
        assert_eq!(sink.pixel(2, 1), Some(palette.wall));
        assert_eq!(sink.pixel(1, 1), Some(palette.background));
    }

    #[test]
    fn test_density_covers_display_resolution() {
        let grid = Grid::new(8, 4);
        let renderer = Renderer::new(ColorScheme::Mono, 2);
        let mut sink = RecordingSink::default();
        renderer.render(&grid, RenderMode::Density, &mut sink);

        assert_eq!(sink.pixels.len(), 4 * 2);
        assert_eq!(sink.swaps, 1);
        assert!(sink.pixels.iter().all(|(_, _, c)| *c == Rgb::BLACK));
    }

    #[test]
    fn test_density_brightness_is_monotonic() {
        let scale = 2;
        let renderer = Renderer::new(ColorScheme::Classic, scale);
        let mut grid = Grid::new(2, 2);
        let mut previous = -1.0;

        for (x, y) in [(0, 0), (1, 0), (0, 1), (1, 1), (1, 1)] {
            grid.occupy(x, y, Occupant::Granular);
            let mut sink = RecordingSink::default();
            renderer.render(&grid, RenderMode::Density, &mut sink);
            let luma = sink.pixel(0, 0).unwrap().luma();
            assert!(luma >= previous);
            previous = luma;
        }
        assert_eq!(
            sample_density(&grid, 0, 0, scale).level(scale * scale),
            scale * scale
        );
    }

    #[test]
    fn test_static_sub_cell_forces_full_brightness() {
        let renderer = Renderer::new(ColorScheme::Desert, 3);
        let mut grid = Grid::new(3, 3);
        grid.occupy(2, 2, Occupant::Static);

        let mut sink = RecordingSink::default();
        renderer.render(&grid, RenderMode::Density, &mut sink);
        assert_eq!(sink.pixel(0, 0), Some(renderer.lut().max()));

        // Adding sand next to the obstacle cannot make it brighter or darker
        grid.occupy(0, 0, Occupant::Granular);
        let mut sink = RecordingSink::default();
        renderer.render(&grid, RenderMode::Density, &mut sink);
        assert_eq!(sink.pixel(0, 0), Some(renderer.lut().max()));
    }

    #[test]
    fn test_sample_counts_overlap() {
        let mut grid = Grid::new(2, 2);
        grid.occupy(0, 0, Occupant::Granular);
        grid.occupy(0, 0, Occupant::Granular);
        grid.occupy(1, 1, Occupant::Granular);
        let sample = sample_density(&grid, 0, 0, 2);
        assert_eq!(sample.granular, 3);
        assert!(!sample.has_static);
    }

    #[test]
    fn test_set_scale_rebuilds_lut() {
        let mut renderer = Renderer::new(ColorScheme::Classic, 2);
        assert_eq!(renderer.lut().levels(), 4);
        renderer.set_scale(3);
        assert_eq!(renderer.lut().levels(), 9);
        renderer.set_scheme(ColorScheme::Ocean);
        assert_eq!(renderer.scheme(), ColorScheme::Ocean);
        assert_eq!(renderer.lut().levels(), 9);
    }
}
