use crate::grid::{Grid, Occupant};
use crate::physics::{self, Gravity, Motion, StepOutcome};

/// Behaviour of a particle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleKind {
    /// Immovable obstacle
    Static,
    /// Sand grain driven by gravity
    Granular(Motion),
}

/// A single simulation particle. Particles never reference each other;
/// they only interact through the occupancy grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Particle {
    pub x: i32,
    pub y: i32,
    pub kind: ParticleKind,
}

impl Particle {
    /// Sand grain at rest in cell (x, y)
    pub fn granular(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            kind: ParticleKind::Granular(Motion::at_cell(x, y)),
        }
    }

    /// Obstacle occupying cell (x, y)
    pub fn wall(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            kind: ParticleKind::Static,
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self.kind, ParticleKind::Static)
    }

    pub fn occupant(&self) -> Occupant {
        match self.kind {
            ParticleKind::Static => Occupant::Static,
            ParticleKind::Granular(_) => Occupant::Granular,
        }
    }

    pub fn motion(&self) -> Option<&Motion> {
        match &self.kind {
            ParticleKind::Granular(motion) => Some(motion),
            ParticleKind::Static => None,
        }
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Advance the particle by one step against the current grid state.
    /// The grid itself is not modified; the caller patches occupancy.
    pub fn update(&mut self, grid: &Grid, gravity: Gravity, max_speed: i32) -> StepOutcome {
        let ParticleKind::Granular(motion) = &mut self.kind else {
            return StepOutcome::Resting;
        };

        physics::accelerate(motion, gravity, max_speed);
        let (nx, ny) = physics::advance(motion, grid);

        if grid.is_free(nx, ny) {
            self.x = nx;
            self.y = ny;
            return StepOutcome::Moved;
        }

        let ((x, y), outcome) = physics::resolve_collision(grid, (self.x, self.y), (nx, ny), motion);
        self.x = x;
        self.y = y;
        outcome
    }
}
