use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single container. Grid cells exclusively own the container they hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub weight: f64,
    pub container_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("Position out of bounds")]
    OutOfBounds,
    #[error("Position already occupied")]
    SlotOccupied,
    #[error("No supporting container below")]
    NoSupport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RemovalError {
    #[error("Position empty")]
    Empty,
    #[error("Position not accessible")]
    NotAccessible,
}

/// The loading grid: one transverse slice of the ship, `height_slots` rows
/// by `width_slots` columns, `y = 0` at the bottom. Slot center coordinates
/// are fixed at construction, symmetric about the centerline.
#[derive(Debug, Clone)]
pub struct LoadingGrid {
    width_slots: usize,
    height_slots: usize,
    cells: Vec<Option<Container>>,
    x_coords: Vec<f64>,
    y_coords: Vec<f64>,
}

fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    if count <= 1 {
        return vec![start];
    }
    let step = (end - start) / (count as f64 - 1.0);
    (0..count).map(|i| start + step * i as f64).collect()
}

impl LoadingGrid {
    pub fn new(
        width_slots: usize,
        height_slots: usize,
        container_width: f64,
        container_height: f64,
    ) -> Self {
        let total_width = width_slots as f64 * container_width;
        let total_height = height_slots as f64 * container_height;
        Self {
            width_slots,
            height_slots,
            cells: vec![None; width_slots * height_slots],
            x_coords: linspace(
                -(total_width / 2.0) + container_width / 2.0,
                (total_width / 2.0) - container_width / 2.0,
                width_slots,
            ),
            y_coords: linspace(
                container_height / 2.0,
                total_height - container_height / 2.0,
                height_slots,
            ),
        }
    }

    fn index(&self, y: usize, x: usize) -> usize {
        y * self.width_slots + x
    }

    pub fn width_slots(&self) -> usize {
        self.width_slots
    }

    pub fn height_slots(&self) -> usize {
        self.height_slots
    }

    pub fn x_coord(&self, x: usize) -> f64 {
        self.x_coords[x]
    }

    pub fn y_coord(&self, y: usize) -> f64 {
        self.y_coords[y]
    }

    pub fn get(&self, y: usize, x: usize) -> Option<&Container> {
        if y >= self.height_slots || x >= self.width_slots {
            return None;
        }
        self.cells[self.index(y, x)].as_ref()
    }

    /// Placement rules: in bounds, empty, and either on the bottom row or
    /// directly on top of another container.
    pub fn validate_placement(&self, x: usize, y: usize) -> Result<(), PlacementError> {
        if x >= self.width_slots || y >= self.height_slots {
            return Err(PlacementError::OutOfBounds);
        }
        if self.cells[self.index(y, x)].is_some() {
            return Err(PlacementError::SlotOccupied);
        }
        if y == 0 {
            return Ok(());
        }
        if self.cells[self.index(y - 1, x)].is_none() {
            return Err(PlacementError::NoSupport);
        }
        Ok(())
    }

    /// Whether `(y, x)` is the topmost occupied slot of its column. Assumes
    /// the caller already checked the slot itself is occupied.
    pub fn is_highest_on_column(&self, y: usize, x: usize) -> bool {
        y == self.height_slots - 1 || self.cells[self.index(y + 1, x)].is_none()
    }

    /// First stackable row in column `x`, bottom up. `None` if the column is
    /// full or out of range.
    pub fn find_next_valid_position(&self, x: usize) -> Option<usize> {
        (0..self.height_slots).find(|&y| self.validate_placement(x, y).is_ok())
    }

    pub fn place(&mut self, container: Container, x: usize, y: usize) -> Result<(), PlacementError> {
        self.validate_placement(x, y)?;
        let index = self.index(y, x);
        self.cells[index] = Some(container);
        Ok(())
    }

    pub fn remove(&mut self, x: usize, y: usize) -> Result<Container, RemovalError> {
        if x >= self.width_slots || y >= self.height_slots {
            return Err(RemovalError::Empty);
        }
        if self.cells[self.index(y, x)].is_none() {
            return Err(RemovalError::Empty);
        }
        if !self.is_highest_on_column(y, x) {
            return Err(RemovalError::NotAccessible);
        }
        let index = self.index(y, x);
        self.cells[index].take().ok_or(RemovalError::Empty)
    }

    /// Occupied cells as `(y, x, container)` in row-major order.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize, &Container)> + '_ {
        self.cells.iter().enumerate().filter_map(move |(i, cell)| {
            cell.as_ref()
                .map(|container| (i / self.width_slots, i % self.width_slots, container))
        })
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Nested `[y][x]` copy of the grid for state dumps.
    pub fn rows(&self) -> Vec<Vec<Option<Container>>> {
        (0..self.height_slots)
            .map(|y| {
                (0..self.width_slots)
                    .map(|x| self.cells[self.index(y, x)].clone())
                    .collect()
            })
            .collect()
    }

    /// No floating containers: every occupied cell above the bottom row must
    /// rest on an occupied cell.
    pub fn stacking_invariant_holds(&self) -> bool {
        self.occupied()
            .all(|(y, x, _)| y == 0 || self.get(y - 1, x).is_some())
    }
}
