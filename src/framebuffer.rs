use crate::color::Rgb;
use crate::render::PixelSink;
use std::path::Path;

/// Double-buffered RGB frame.
///
/// Drawing goes to the back buffer; [`PixelSink::swap_buffers`] publishes it
/// so readers of [`FrameBuffer::front`] never observe a half-drawn frame.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    front: Vec<Rgb>,
    back: Vec<Rgb>,
    frames: u64,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            front: vec![Rgb::BLACK; width * height],
            back: vec![Rgb::BLACK; width * height],
            frames: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of frames published so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Last published frame, row-major
    pub fn front(&self) -> &[Rgb] {
        &self.front
    }

    /// Published pixel at (x, y), black outside the buffer
    pub fn pixel(&self, x: usize, y: usize) -> Rgb {
        if x < self.width && y < self.height {
            self.front[y * self.width + x]
        } else {
            Rgb::BLACK
        }
    }

    /// Reallocate for a new display size, discarding both buffers
    pub fn resize(&mut self, width: usize, height: usize) {
        if width != self.width || height != self.height {
            *self = FrameBuffer {
                frames: self.frames,
                ..FrameBuffer::new(width, height)
            };
        }
    }

    /// Write the published frame as a PNG
    pub fn save_png(&self, path: &Path) -> image::ImageResult<()> {
        let mut img = image::RgbImage::new(self.width as u32, self.height as u32);
        for (x, y, px) in img.enumerate_pixels_mut() {
            let c = self.pixel(x as usize, y as usize);
            *px = image::Rgb([c.r, c.g, c.b]);
        }
        img.save(path)
    }

    /// Coarse text rendering of the published frame, one character per pixel
    pub fn to_ascii(&self) -> String {
        const RAMP: &[u8] = b" .:-=+*#%@";
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for row in self.front.chunks(self.width.max(1)) {
            for c in row {
                let idx = (c.luma() / 256.0 * RAMP.len() as f32) as usize;
                out.push(RAMP[idx.min(RAMP.len() - 1)] as char);
            }
            out.push('\n');
        }
        out
    }
}

impl PixelSink for FrameBuffer {
    fn draw_pixel(&mut self, x: usize, y: usize, color: Rgb) {
        if x < self.width && y < self.height {
            self.back[y * self.width + x] = color;
        }
    }

    fn swap_buffers(&mut self) {
        std::mem::swap(&mut self.front, &mut self.back);
        self.frames += 1;
    }
}
