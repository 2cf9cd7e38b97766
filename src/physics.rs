//! Fixed-point integration and collision resolution for granular particles.
//!
//! Positions are tracked twice: as an integer grid cell and as a sub-cell
//! accumulator with [`SUBCELL_SCALE`] units per cell. Velocities are in
//! sub-cell units per step.

use crate::grid::Grid;

/// Sub-cell accumulator units per grid cell
pub const SUBCELL_SCALE: i32 = 256;

/// Default speed limit: one cell per step
pub const DEFAULT_MAX_SPEED: i32 = SUBCELL_SCALE;

/// Alternative offsets tried when the direct move is blocked, indexed by
/// `(dy + 1) * 3 + (dx + 1)`. The order inside each pair is the tie-break.
const SLIDE_TABLE: [[(i32, i32); 2]; 9] = [
    [(0, -1), (-1, 0)],  // (-1,-1)
    [(-1, -1), (1, -1)], // ( 0,-1)
    [(0, -1), (1, 0)],   // ( 1,-1)
    [(-1, -1), (-1, 1)], // (-1, 0)
    [(0, 0), (0, 0)],    // ( 0, 0) never consulted
    [(1, -1), (1, 1)],   // ( 1, 0)
    [(-1, 0), (0, 1)],   // (-1, 1)
    [(-1, 1), (1, 1)],   // ( 0, 1)
    [(0, 1), (1, 0)],    // ( 1, 1)
];

/// Per-frame gravity in sub-cell units per step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Gravity {
    pub x: i32,
    pub y: i32,
}

impl Gravity {
    pub const ZERO: Gravity = Gravity { x: 0, y: 0 };

    /// Normalise a 3-axis reading and scale it to engine units.
    ///
    /// Any finite magnitude is accepted. The z axis only contributes to the
    /// magnitude: a device lying flat produces no in-plane pull. Zero or
    /// non-finite readings yield [`Gravity::ZERO`].
    pub fn from_vector(v: [f32; 3], scale: f32, invert_y: bool) -> Self {
        if !scale.is_finite() || v.iter().any(|c| !c.is_finite()) {
            return Gravity::ZERO;
        }
        // Divide by the largest component first so squaring cannot overflow or underflow
        let peak = v.iter().fold(0.0f64, |m, c| m.max((*c as f64).abs()));
        if peak == 0.0 {
            return Gravity::ZERO;
        }
        let [ux, uy, uz] = v.map(|c| c as f64 / peak);
        let len = (ux * ux + uy * uy + uz * uz).sqrt();
        let scale = scale as f64;

        let x = (ux / len * scale) as i32;
        let y = (uy / len * scale) as i32;
        Gravity {
            x,
            y: if invert_y { -y } else { y },
        }
    }
}

/// Velocity and sub-cell position of a granular particle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Motion {
    pub tx: i32,
    pub ty: i32,
    pub vx: i32,
    pub vy: i32,
}

impl Motion {
    /// Motion at rest, anchored to the top-left corner of cell (x, y)
    pub fn at_cell(x: i32, y: i32) -> Self {
        Self {
            tx: x * SUBCELL_SCALE,
            ty: y * SUBCELL_SCALE,
            vx: 0,
            vy: 0,
        }
    }

    pub fn speed_squared(&self) -> i64 {
        let vx = self.vx as i64;
        let vy = self.vy as i64;
        vx * vx + vy * vy
    }
}

/// What happened to a particle during one update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Moved straight to the integrated cell
    Moved,
    /// Direct cell was taken; moved to one of the slide alternatives
    Slid,
    /// Direct cell and both alternatives were taken
    Blocked,
    /// Integrated cell is the current cell
    Resting,
    /// Displacement of more than one cell; move abandoned for this frame
    Rejected,
}

/// Add gravity to the velocity and clamp the speed, keeping the heading.
pub fn accelerate(motion: &mut Motion, gravity: Gravity, max_speed: i32) {
    motion.vx += gravity.x;
    motion.vy += gravity.y;

    let max = max_speed.max(0) as i64;
    let v2 = motion.speed_squared();
    if v2 > max * max {
        let v = (v2 as f64).sqrt();
        motion.vx = (max as f64 * motion.vx as f64 / v) as i32;
        motion.vy = (max as f64 * motion.vy as f64 / v) as i32;
    }
}

/// Clamp one axis of a candidate cell to `[0, limit)`.
/// Hitting a wall is inelastic: the accumulator is pinned and the velocity dropped.
fn clamp_axis(cell: i32, limit: i32, t: &mut i32, v: &mut i32) -> i32 {
    if cell < 0 {
        *t = 0;
        *v = 0;
        0
    } else if cell > limit - 1 {
        let edge = limit - 1;
        *t = edge * SUBCELL_SCALE;
        *v = 0;
        edge
    } else {
        cell
    }
}

/// Integrate the accumulator by one step and return the in-bounds candidate cell.
pub fn advance(motion: &mut Motion, grid: &Grid) -> (i32, i32) {
    motion.tx += motion.vx;
    motion.ty += motion.vy;

    let nx = motion.tx.div_euclid(SUBCELL_SCALE);
    let ny = motion.ty.div_euclid(SUBCELL_SCALE);

    let nx = clamp_axis(nx, grid.width() as i32, &mut motion.tx, &mut motion.vx);
    let ny = clamp_axis(ny, grid.height() as i32, &mut motion.ty, &mut motion.vy);
    (nx, ny)
}

/// Slide alternatives for a one-cell displacement, or `None` for anything else
pub fn slide_offsets(dx: i32, dy: i32) -> Option<[(i32, i32); 2]> {
    if (dx, dy) == (0, 0) || dx.abs() > 1 || dy.abs() > 1 {
        return None;
    }
    Some(SLIDE_TABLE[((dy + 1) * 3 + (dx + 1)) as usize])
}

/// Resolve a move from `from` towards the occupied cell `to`.
///
/// Returns the cell the particle ends up in. Multi-cell displacements are
/// rejected outright and leave the motion untouched.
pub fn resolve_collision(
    grid: &Grid,
    from: (i32, i32),
    to: (i32, i32),
    motion: &mut Motion,
) -> ((i32, i32), StepOutcome) {
    let (x, y) = from;
    let dx = to.0 - x;
    let dy = to.1 - y;

    if dx == 0 && dy == 0 {
        return (from, StepOutcome::Resting);
    }

    // Known limitation: accumulators that drift more than a cell away from the
    // particle (after repeated slides) are not reconciled here.
    let Some(alternatives) = slide_offsets(dx, dy) else {
        return (from, StepOutcome::Rejected);
    };

    for (ox, oy) in alternatives {
        let (ax, ay) = (x + ox, y + oy);
        if grid.is_free(ax, ay) {
            return ((ax, ay), StepOutcome::Slid);
        }
    }

    if dx != 0 {
        motion.tx = x * SUBCELL_SCALE;
        motion.vx = 0;
    }
    if dy != 0 {
        motion.ty = y * SUBCELL_SCALE;
        motion.vy = 0;
    }
    (from, StepOutcome::Blocked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Cell, Occupant};

    #[test]
    fn test_gravity_normalisation() {
        let g = Gravity::from_vector([0.0, 9.81, 0.0], 256.0, false);
        assert_eq!(g, Gravity { x: 0, y: 256 });

        let g = Gravity::from_vector([3.0, 4.0, 0.0], 100.0, false);
        assert_eq!(g, Gravity { x: 60, y: 80 });
    }

    #[test]
    fn test_gravity_invert_y() {
        let g = Gravity::from_vector([0.0, 1.0, 0.0], 256.0, true);
        assert_eq!(g, Gravity { x: 0, y: -256 });
    }

    #[test]
    fn test_gravity_flat_device_has_no_pull() {
        let g = Gravity::from_vector([0.0, 0.0, 1.0], 256.0, false);
        assert_eq!(g, Gravity::ZERO);
    }

    #[test]
    fn test_degenerate_gravity_is_zero() {
        assert_eq!(Gravity::from_vector([0.0; 3], 256.0, false), Gravity::ZERO);
        assert_eq!(
            Gravity::from_vector([f32::NAN, 1.0, 0.0], 256.0, false),
            Gravity::ZERO
        );
        assert_eq!(
            Gravity::from_vector([f32::INFINITY, 0.0, 0.0], 256.0, false),
            Gravity::ZERO
        );
    }

    #[test]
    fn test_gravity_accepts_extreme_magnitudes() {
        assert_eq!(
            Gravity::from_vector([1.0e20, 0.0, 0.0], 256.0, false),
            Gravity { x: 256, y: 0 }
        );
        assert_eq!(
            Gravity::from_vector([0.0, 1.0e-8, 0.0], 256.0, false),
            Gravity { x: 0, y: 256 }
        );
        assert_eq!(
            Gravity::from_vector([f32::MAX, f32::MAX, 0.0], 256.0, false),
            Gravity { x: 181, y: 181 }
        );
    }

    #[test]
    fn test_accelerate_clamps_and_keeps_heading() {
        let mut m = Motion::default();
        accelerate(&mut m, Gravity { x: 300, y: 400 }, 256);
        assert!(m.speed_squared() <= 256 * 256);
        // 3:4 heading survives the rescale
        assert_eq!(m.vx, 153);
        assert_eq!(m.vy, 204);
    }

    #[test]
    fn test_accelerate_below_limit_untouched() {
        let mut m = Motion::default();
        accelerate(&mut m, Gravity { x: 0, y: 256 }, 256);
        assert_eq!((m.vx, m.vy), (0, 256));
    }

    #[test]
    fn test_advance_clamps_at_edges() {
        let grid = Grid::new(3, 3);

        let mut m = Motion { tx: 0, ty: 2 * SUBCELL_SCALE, vx: -100, vy: 256 };
        let cell = advance(&mut m, &grid);
        assert_eq!(cell, (0, 2));
        assert_eq!((m.tx, m.vx), (0, 0));
        assert_eq!((m.ty, m.vy), (2 * SUBCELL_SCALE, 0));
    }

    #[test]
    fn test_slide_table_lookup() {
        assert_eq!(slide_offsets(0, 1), Some([(-1, 1), (1, 1)]));
        assert_eq!(slide_offsets(1, 1), Some([(0, 1), (1, 0)]));
        assert_eq!(slide_offsets(-1, 0), Some([(-1, -1), (-1, 1)]));
        assert_eq!(slide_offsets(0, 0), None);
        assert_eq!(slide_offsets(2, 0), None);
        assert_eq!(slide_offsets(0, -2), None);
    }

    #[test]
    fn test_resolve_prefers_first_alternative() {
        let mut grid = Grid::new(3, 3);
        grid.occupy(1, 0, Occupant::Granular);
        grid.occupy(1, 1, Occupant::Static);
        let mut m = Motion::at_cell(1, 1);

        let (cell, outcome) = resolve_collision(&grid, (1, 0), (1, 1), &mut m);
        assert_eq!(cell, (0, 1));
        assert_eq!(outcome, StepOutcome::Slid);
    }

    #[test]
    fn test_resolve_falls_back_to_second_alternative() {
        let mut grid = Grid::new(3, 3);
        grid.set(1, 1, Cell::Static);
        grid.set(0, 1, Cell::Static);
        let mut m = Motion::at_cell(1, 1);

        let (cell, outcome) = resolve_collision(&grid, (1, 0), (1, 1), &mut m);
        assert_eq!(cell, (2, 1));
        assert_eq!(outcome, StepOutcome::Slid);
    }

    #[test]
    fn test_resolve_never_slides_off_grid() {
        let mut grid = Grid::new(3, 3);
        grid.set(0, 1, Cell::Static);
        grid.set(1, 1, Cell::Static);
        let mut m = Motion { tx: 0, ty: 256, vx: 0, vy: 256 };

        // (-1, 1) is outside, (1, 1) is taken
        let (cell, outcome) = resolve_collision(&grid, (0, 0), (0, 1), &mut m);
        assert_eq!(cell, (0, 0));
        assert_eq!(outcome, StepOutcome::Blocked);
        assert_eq!((m.ty, m.vy), (0, 0));
    }

    #[test]
    fn test_blocked_zeroes_only_moving_axes() {
        let mut grid = Grid::new(3, 3);
        for (x, y) in [(2, 1), (2, 0), (2, 2)] {
            grid.set(x, y, Cell::Static);
        }
        let mut m = Motion { tx: 2 * 256, ty: 256 + 40, vx: 200, vy: 40 };

        let (cell, outcome) = resolve_collision(&grid, (1, 1), (2, 1), &mut m);
        assert_eq!(cell, (1, 1));
        assert_eq!(outcome, StepOutcome::Blocked);
        assert_eq!((m.tx, m.vx), (256, 0));
        assert_eq!((m.ty, m.vy), (256 + 40, 40));
    }

    #[test]
    fn test_multi_cell_displacement_rejected() {
        let mut grid = Grid::new(5, 5);
        grid.set(3, 0, Cell::Static);
        let before = Motion { tx: 3 * 256, ty: 0, vx: 256, vy: 0 };
        let mut m = before;

        let (cell, outcome) = resolve_collision(&grid, (1, 0), (3, 0), &mut m);
        assert_eq!(cell, (1, 0));
        assert_eq!(outcome, StepOutcome::Rejected);
        assert_eq!(m, before);
    }
}
