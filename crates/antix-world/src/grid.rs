//! Uniform toroidal grid indexing robots and pucks by cell.

use antix_core::{PuckId, RobotId, Torus};

/// Members of one grid cell
#[derive(Debug, Clone, Default)]
pub struct Cell {
    pub robots: Vec<RobotId>,
    pub pucks: Vec<PuckId>,
}

/// Axis-aligned box in unwrapped world coordinates; may extend past the seam
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Aabb {
    pub fn point(x: f64, y: f64) -> Self {
        Self {
            x_min: x,
            x_max: x,
            y_min: y,
            y_max: y,
        }
    }

    pub fn grow(&mut self, x: f64, y: f64) {
        self.x_min = self.x_min.min(x);
        self.x_max = self.x_max.max(x);
        self.y_min = self.y_min.min(y);
        self.y_max = self.y_max.max(y);
    }

    pub fn pad(&mut self, margin: f64) {
        self.x_min -= margin;
        self.x_max += margin;
        self.y_min -= margin;
        self.y_max += margin;
    }
}

/// A `width × width` partition of the torus.
///
/// Every robot and every puck that is not being carried is a member of
/// exactly one cell: the one returned by [`Grid::cell_of`] for its position.
#[derive(Debug, Clone)]
pub struct Grid {
    width: usize,
    cell_size: f64,
    torus: Torus,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(torus: Torus, width: usize) -> Self {
        assert!(width > 0, "grid needs at least one cell per side");
        Self {
            width,
            cell_size: torus.size() / width as f64,
            torus,
            cells: vec![Cell::default(); width * width],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Column or row of a wrapped coordinate
    fn axis_cell(&self, v: f64) -> usize {
        let v = self.torus.normalize_distance(v);
        ((v / self.cell_size) as usize).min(self.width - 1)
    }

    /// Cell index `cx + cy·width` of a (wrapped) position
    pub fn cell_of(&self, x: f64, y: f64) -> usize {
        self.axis_cell(x) + self.axis_cell(y) * self.width
    }

    /// Get a cell. Panics on an out-of-range index: that means the
    /// cell/world size relationship is broken.
    pub fn cell(&self, index: usize) -> &Cell {
        assert!(
            index < self.cells.len(),
            "cell index {index} out of range for {w}x{w} grid",
            w = self.width
        );
        &self.cells[index]
    }

    fn cell_mut(&mut self, index: usize) -> &mut Cell {
        assert!(
            index < self.cells.len(),
            "cell index {index} out of range for {w}x{w} grid",
            w = self.width
        );
        &mut self.cells[index]
    }

    pub fn cells(&self) -> impl Iterator<Item = (usize, &Cell)> + '_ {
        self.cells.iter().enumerate()
    }

    pub fn insert_robot(&mut self, cell: usize, robot: RobotId) {
        let members = &mut self.cell_mut(cell).robots;
        debug_assert!(!members.contains(&robot), "{robot} already in cell {cell}");
        members.push(robot);
    }

    pub fn remove_robot(&mut self, cell: usize, robot: RobotId) -> bool {
        remove_member(&mut self.cell_mut(cell).robots, robot)
    }

    /// Move a robot between cells. Returns false (and does nothing) when
    /// the cell is unchanged.
    pub fn relocate_robot(&mut self, robot: RobotId, from: usize, to: usize) -> bool {
        if from == to {
            return false;
        }
        let removed = self.remove_robot(from, robot);
        debug_assert!(removed, "{robot} was not in cell {from}");
        self.insert_robot(to, robot);
        true
    }

    pub fn insert_puck(&mut self, cell: usize, puck: PuckId) {
        let members = &mut self.cell_mut(cell).pucks;
        debug_assert!(!members.contains(&puck), "{puck} already in cell {cell}");
        members.push(puck);
    }

    pub fn remove_puck(&mut self, cell: usize, puck: PuckId) -> bool {
        remove_member(&mut self.cell_mut(cell).pucks, puck)
    }

    pub fn relocate_puck(&mut self, puck: PuckId, from: usize, to: usize) -> bool {
        if from == to {
            return false;
        }
        let removed = self.remove_puck(from, puck);
        debug_assert!(removed, "{puck} was not in cell {from}");
        self.insert_puck(to, puck);
        true
    }

    /// Indices of every cell overlapping `bbox`, each at most once, with
    /// cell coordinates wrapped around the torus.
    pub fn cells_overlapping(&self, bbox: &Aabb) -> Vec<usize> {
        let columns = self.wrapped_span(bbox.x_min, bbox.x_max);
        let rows = self.wrapped_span(bbox.y_min, bbox.y_max);

        let mut indices = Vec::with_capacity(columns.len() * rows.len());
        for &cy in &rows {
            for &cx in &columns {
                indices.push(cx + cy * self.width);
            }
        }
        indices
    }

    fn wrapped_span(&self, min: f64, max: f64) -> Vec<usize> {
        let first = (min / self.cell_size).floor() as i64;
        let last = (max / self.cell_size).floor() as i64;
        let count = ((last - first + 1).max(1) as usize).min(self.width);
        let width = self.width as i64;
        (0..count as i64)
            .map(|offset| (first + offset).rem_euclid(width) as usize)
            .collect()
    }
}

fn remove_member<T: PartialEq + Copy>(members: &mut Vec<T>, item: T) -> bool {
    match members.iter().position(|m| *m == item) {
        Some(pos) => {
            members.swap_remove(pos);
            true
        }
        None => false,
    }
}
