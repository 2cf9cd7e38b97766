/// Keyboard-driven stand-in for an accelerometer.
///
/// Angle 0 points straight down the screen; positive angles tip gravity
/// towards +x. Lying flat the pull is entirely along z, which the engine
/// treats as no in-plane gravity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Tilt {
    pub angle_deg: f32,
    pub flat: bool,
}

impl Tilt {
    /// Unit gravity vector in grid space (y down)
    pub fn gravity(&self) -> [f32; 3] {
        if self.flat {
            return [0.0, 0.0, 1.0];
        }
        let (sin, cos) = self.angle_deg.to_radians().sin_cos();
        [sin, cos, 0.0]
    }

    pub fn rotate(&mut self, delta_deg: f32) {
        self.angle_deg = (self.angle_deg + delta_deg).rem_euclid(360.0);
    }

    /// Turn the device upside down
    pub fn flip(&mut self) {
        self.rotate(180.0);
    }

    pub fn toggle_flat(&mut self) {
        self.flat = !self.flat;
    }

    pub fn label(&self) -> String {
        if self.flat {
            "flat".to_string()
        } else {
            format!("{:.0}°", self.angle_deg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn test_default_points_down() {
        assert!(close(Tilt::default().gravity(), [0.0, 1.0, 0.0]));
    }

    #[test]
    fn test_rotation_and_flip() {
        let mut tilt = Tilt::default();
        tilt.rotate(90.0);
        assert!(close(tilt.gravity(), [1.0, 0.0, 0.0]));

        tilt.flip();
        assert_eq!(tilt.angle_deg, 270.0);
        assert!(close(tilt.gravity(), [-1.0, 0.0, 0.0]));

        tilt.rotate(-300.0);
        assert_eq!(tilt.angle_deg, 330.0);
    }

    #[test]
    fn test_flat_has_no_in_plane_pull() {
        let mut tilt = Tilt::default();
        tilt.toggle_flat();
        assert_eq!(tilt.gravity(), [0.0, 0.0, 1.0]);
        assert_eq!(tilt.label(), "flat");
    }
}
