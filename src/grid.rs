/// State of a single simulation cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    /// Number of granular particles sharing the cell (always >= 1)
    Granular(u8),
    /// Immovable obstacle
    Static,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Granular particle count for density rendering
    pub fn granular_count(&self) -> u8 {
        match self {
            Cell::Granular(n) => *n,
            _ => 0,
        }
    }
}

/// What kind of particle is being added to or removed from a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupant {
    Granular,
    Static,
}

/// Fixed-size occupancy grid.
///
/// Every accessor is bounds-checked: collision probing near the edges routinely
/// asks about cells outside the grid, so out-of-range reads return
/// [`Cell::Empty`] and out-of-range writes are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::Empty; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if self.in_bounds(x, y) {
            Some(y as usize * self.width + x as usize)
        } else {
            None
        }
    }

    /// Cell at (x, y), or `Empty` outside the grid
    pub fn get(&self, x: i32, y: i32) -> Cell {
        self.index(x, y).map_or(Cell::Empty, |idx| self.cells[idx])
    }

    pub fn set(&mut self, x: i32, y: i32, cell: Cell) {
        if let Some(idx) = self.index(x, y) {
            self.cells[idx] = cell;
        }
    }

    /// True only for in-bounds empty cells
    pub fn is_free(&self, x: i32, y: i32) -> bool {
        self.in_bounds(x, y) && self.get(x, y).is_empty()
    }

    /// Add an occupant. Granular occupants are summed; static always wins.
    pub fn occupy(&mut self, x: i32, y: i32, occupant: Occupant) {
        let Some(idx) = self.index(x, y) else {
            return;
        };
        let cell = &mut self.cells[idx];
        *cell = match (occupant, *cell) {
            (Occupant::Static, _) | (_, Cell::Static) => Cell::Static,
            (Occupant::Granular, Cell::Empty) => Cell::Granular(1),
            (Occupant::Granular, Cell::Granular(n)) => Cell::Granular(n.saturating_add(1)),
        };
    }

    /// Remove an occupant previously added with [`Grid::occupy`]
    pub fn vacate(&mut self, x: i32, y: i32, occupant: Occupant) {
        let Some(idx) = self.index(x, y) else {
            return;
        };
        let cell = &mut self.cells[idx];
        *cell = match (occupant, *cell) {
            (Occupant::Granular, Cell::Granular(n)) if n > 1 => Cell::Granular(n - 1),
            (Occupant::Granular, Cell::Granular(_)) => Cell::Empty,
            (Occupant::Static, Cell::Static) => Cell::Empty,
            (_, other) => other,
        };
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::Empty);
    }

    /// Row-major view of all cells
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Number of granular particles stored in the grid
    pub fn granular_total(&self) -> usize {
        self.cells.iter().map(|c| c.granular_count() as usize).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_grid_is_empty() {
        let grid = Grid::new(4, 3);
        assert_eq!(grid.width(), 4);
        assert_eq!(grid.height(), 3);
        assert!(grid.cells().iter().all(Cell::is_empty));
    }

    #[test]
    fn test_set_and_get() {
        let mut grid = Grid::new(4, 3);
        grid.set(3, 2, Cell::Static);
        grid.set(0, 0, Cell::Granular(1));
        assert_eq!(grid.get(3, 2), Cell::Static);
        assert_eq!(grid.get(0, 0), Cell::Granular(1));
        assert_eq!(grid.get(1, 1), Cell::Empty);
    }

    #[test]
    fn test_clear() {
        let mut grid = Grid::new(2, 2);
        grid.set(1, 1, Cell::Static);
        grid.occupy(0, 1, Occupant::Granular);
        grid.clear();
        assert!(grid.cells().iter().all(Cell::is_empty));
    }

    #[test]
    fn test_occupy_sums_granular() {
        let mut grid = Grid::new(2, 2);
        grid.occupy(0, 0, Occupant::Granular);
        grid.occupy(0, 0, Occupant::Granular);
        assert_eq!(grid.get(0, 0), Cell::Granular(2));

        grid.vacate(0, 0, Occupant::Granular);
        assert_eq!(grid.get(0, 0), Cell::Granular(1));
        grid.vacate(0, 0, Occupant::Granular);
        assert_eq!(grid.get(0, 0), Cell::Empty);
    }

    #[test]
    fn test_static_dominates() {
        let mut grid = Grid::new(2, 2);
        grid.occupy(1, 0, Occupant::Granular);
        grid.occupy(1, 0, Occupant::Static);
        assert_eq!(grid.get(1, 0), Cell::Static);

        // Granular traffic never erases an obstacle
        grid.occupy(1, 0, Occupant::Granular);
        grid.vacate(1, 0, Occupant::Granular);
        assert_eq!(grid.get(1, 0), Cell::Static);
    }

    #[test]
    fn test_is_free_requires_bounds() {
        let grid = Grid::new(3, 3);
        assert!(grid.is_free(1, 1));
        assert!(!grid.is_free(-1, 1));
        assert!(!grid.is_free(3, 0));
        // Reads outside still report Empty
        assert_eq!(grid.get(-1, 1), Cell::Empty);
    }

    proptest! {
        #[test]
        fn out_of_bounds_access_is_absorbed(x in -20i32..20, y in -20i32..20) {
            let mut grid = Grid::new(5, 4);
            grid.set(2, 2, Cell::Static);
            let before = grid.clone();

            if !grid.in_bounds(x, y) {
                prop_assert_eq!(grid.get(x, y), Cell::Empty);
                grid.set(x, y, Cell::Granular(1));
                grid.occupy(x, y, Occupant::Static);
                grid.vacate(x, y, Occupant::Static);
                prop_assert_eq!(&grid, &before);
            }
        }
    }
}
