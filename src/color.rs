use serde::{Deserialize, Serialize};

/// 24-bit colour as sent to the display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Linear blend: `t = 0` gives `self`, `t = 1` gives `other`
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }

    /// Perceived brightness (Rec. 601 weights), used for ordering tests and ASCII output
    pub fn luma(self) -> f32 {
        0.299 * self.r as f32 + 0.587 * self.g as f32 + 0.114 * self.b as f32
    }
}

/// Colours for each cell kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Rgb,
    pub sand: Rgb,
    pub wall: Rgb,
}

/// Named palettes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorScheme {
    /// Dark red background, grey sand, green walls
    #[default]
    Classic,
    Desert,
    Ocean,
    Mono,
    Ember,
}

impl ColorScheme {
    pub fn name(&self) -> &str {
        match self {
            ColorScheme::Classic => "Classic",
            ColorScheme::Desert => "Desert",
            ColorScheme::Ocean => "Ocean",
            ColorScheme::Mono => "Mono",
            ColorScheme::Ember => "Ember",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            ColorScheme::Classic => ColorScheme::Desert,
            ColorScheme::Desert => ColorScheme::Ocean,
            ColorScheme::Ocean => ColorScheme::Mono,
            ColorScheme::Mono => ColorScheme::Ember,
            ColorScheme::Ember => ColorScheme::Classic,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            ColorScheme::Classic => ColorScheme::Ember,
            ColorScheme::Desert => ColorScheme::Classic,
            ColorScheme::Ocean => ColorScheme::Desert,
            ColorScheme::Mono => ColorScheme::Ocean,
            ColorScheme::Ember => ColorScheme::Mono,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "classic" => Some(ColorScheme::Classic),
            "desert" | "sand" => Some(ColorScheme::Desert),
            "ocean" | "blue" => Some(ColorScheme::Ocean),
            "mono" | "grey" | "gray" => Some(ColorScheme::Mono),
            "ember" | "fire" => Some(ColorScheme::Ember),
            _ => None,
        }
    }

    pub fn palette(&self) -> Palette {
        match self {
            ColorScheme::Classic => Palette {
                background: Rgb::new(0x40, 0, 0),
                sand: Rgb::new(192, 192, 192),
                wall: Rgb::new(0, 192, 0),
            },
            ColorScheme::Desert => Palette {
                background: Rgb::new(20, 24, 48),
                sand: Rgb::new(237, 201, 120),
                wall: Rgb::new(150, 90, 50),
            },
            ColorScheme::Ocean => Palette {
                background: Rgb::new(0, 16, 40),
                sand: Rgb::new(120, 220, 255),
                wall: Rgb::new(255, 255, 255),
            },
            ColorScheme::Mono => Palette {
                background: Rgb::BLACK,
                sand: Rgb::new(255, 255, 255),
                wall: Rgb::new(128, 128, 128),
            },
            ColorScheme::Ember => Palette {
                background: Rgb::new(10, 0, 0),
                sand: Rgb::new(255, 140, 0),
                wall: Rgb::new(255, 40, 40),
            },
        }
    }

    /// Brightness ramp for density rendering with `levels` steps above background
    pub fn build_lut(&self, levels: usize) -> ColorLut {
        ColorLut::new(self.palette(), levels)
    }
}

/// Precomputed background-to-sand ramp indexed by occupancy count
#[derive(Debug, Clone, PartialEq)]
pub struct ColorLut {
    entries: Vec<Rgb>,
}

impl ColorLut {
    pub fn new(palette: Palette, levels: usize) -> Self {
        let levels = levels.max(1);
        let entries = (0..=levels)
            .map(|i| palette.background.lerp(palette.sand, i as f32 / levels as f32))
            .collect();
        Self { entries }
    }

    /// Highest count that maps to a distinct colour
    pub fn levels(&self) -> usize {
        self.entries.len() - 1
    }

    /// Colour for `count` occupied sub-cells; counts past the top saturate
    pub fn get(&self, count: usize) -> Rgb {
        self.entries[count.min(self.levels())]
    }

    /// Brightest entry
    pub fn max(&self) -> Rgb {
        self.entries[self.levels()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_endpoints() {
        let a = Rgb::new(0, 100, 200);
        let b = Rgb::new(200, 100, 0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Rgb::new(100, 100, 100));
        assert_eq!(a.lerp(b, 7.0), b);
    }

    #[test]
    fn test_classic_palette_colours() {
        let p = ColorScheme::Classic.palette();
        assert_eq!(p.background, Rgb::new(0x40, 0, 0));
        assert_eq!(p.sand, Rgb::new(192, 192, 192));
        assert_eq!(p.wall, Rgb::new(0, 192, 0));
    }

    #[test]
    fn test_scheme_cycle_round_trips() {
        let mut scheme = ColorScheme::default();
        for _ in 0..5 {
            scheme = scheme.next();
        }
        assert_eq!(scheme, ColorScheme::Classic);
        assert_eq!(ColorScheme::Ocean.next().prev(), ColorScheme::Ocean);
    }

    #[test]
    fn test_lut_is_monotonic() {
        for scheme in [ColorScheme::Classic, ColorScheme::Desert, ColorScheme::Ember] {
            let lut = scheme.build_lut(4);
            assert_eq!(lut.levels(), 4);
            assert_eq!(lut.get(0), scheme.palette().background);
            assert_eq!(lut.max(), scheme.palette().sand);
            for count in 1..=6 {
                assert!(lut.get(count).luma() >= lut.get(count - 1).luma());
            }
        }
    }

    #[test]
    fn test_parse_scheme() {
        assert_eq!(ColorScheme::parse("FIRE"), Some(ColorScheme::Ember));
        assert_eq!(ColorScheme::parse("nope"), None);
    }
}
