//! Static occupancy map the simulation runs on.
//!
//! Maps are rectangular grids of cells where `#` marks a wall and any other
//! character is free space. Each cell spans [`GRID_SCALE`] world units along
//! both axes. World `y` grows upwards while map rows grow downwards, so the
//! row lookup is inverted; everything outside the backing array is a wall.

use crate::{GRID_SCALE, NO_HIT, RAY_MAX_DISTANCE, RAY_STEP};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapFormatError {
    #[error("failed to read map: {0}")]
    Io(#[from] std::io::Error),

    #[error("map contains no rows")]
    Empty,

    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupancy {
    Free,
    Wall,
}

/// Immutable occupancy grid. Replace the whole instance to change maps.
#[derive(Debug, Clone)]
pub struct GridWorld {
    cells: Vec<Occupancy>,
    rows: usize,
    cols: usize,
    scale: f32,
}

impl GridWorld {
    /// Reads and parses a map file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MapFormatError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parses map text.
    ///
    /// Lines containing commas are treated as CSV rows (cells trimmed, a
    /// single trailing empty cell dropped); other lines use one character
    /// per cell. Blank lines are ignored.
    pub fn parse(content: &str) -> Result<Self, MapFormatError> {
        let mut cells = Vec::new();
        let mut cols = None;
        let mut rows = 0;

        for line in content.lines() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            let row: Vec<Occupancy> = if line.contains(',') {
                let mut fields: Vec<&str> = line.split(',').map(str::trim).collect();
                if fields.last().is_some_and(|f| f.is_empty()) {
                    fields.pop();
                }
                fields.into_iter().map(Self::classify).collect()
            } else {
                line.chars()
                    .map(|c| if c == '#' { Occupancy::Wall } else { Occupancy::Free })
                    .collect()
            };

            match cols {
                None => cols = Some(row.len()),
                Some(expected) if expected != row.len() => {
                    return Err(MapFormatError::Ragged {
                        row: rows,
                        expected,
                        found: row.len(),
                    });
                }
                Some(_) => {}
            }

            cells.extend(row);
            rows += 1;
        }

        match cols {
            Some(cols) if cols > 0 => Ok(Self {
                cells,
                rows,
                cols,
                scale: GRID_SCALE,
            }),
            _ => Err(MapFormatError::Empty),
        }
    }

    fn classify(field: &str) -> Occupancy {
        if field == "#" {
            Occupancy::Wall
        } else {
            Occupancy::Free
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Extent along the world x axis.
    pub fn width(&self) -> f32 {
        self.cols as f32 * self.scale
    }

    /// Extent along the world y axis.
    pub fn length(&self) -> f32 {
        self.rows as f32 * self.scale
    }

    /// Occupancy of the cell at `(row, col)`; anything out of range is a wall.
    pub fn cell(&self, row: i64, col: i64) -> Occupancy {
        if row < 0 || col < 0 || row >= self.rows as i64 || col >= self.cols as i64 {
            return Occupancy::Wall;
        }
        self.cells[row as usize * self.cols + col as usize]
    }

    /// Occupancy at a continuous world coordinate.
    pub fn occupancy(&self, x: f32, y: f32) -> Occupancy {
        if !x.is_finite() || !y.is_finite() {
            return Occupancy::Wall;
        }
        let col = (x / self.scale).floor();
        let row = ((self.length() - y - 1.0) / self.scale).floor();
        self.cell(row as i64, col as i64)
    }

    pub fn is_wall(&self, x: f32, y: f32) -> bool {
        self.occupancy(x, y) == Occupancy::Wall
    }

    /// Distance to the first wall along `angle_degrees`, or [`NO_HIT`].
    ///
    /// Samples the ray every `step` units starting at the origin itself,
    /// stopping before `max_distance`.
    pub fn ray_cast(&self, origin: (f32, f32), angle_degrees: f32, max_distance: f32, step: f32) -> f32 {
        if step <= 0.0 {
            return NO_HIT;
        }
        let (sin, cos) = angle_degrees.to_radians().sin_cos();
        let mut i = 0u32;
        loop {
            let distance = i as f32 * step;
            if distance >= max_distance {
                return NO_HIT;
            }
            if self.is_wall(origin.0 + cos * distance, origin.1 + sin * distance) {
                return distance;
            }
            i += 1;
        }
    }

    /// [`ray_cast`](Self::ray_cast) with the default range and step.
    pub fn ray_cast_default(&self, origin: (f32, f32), angle_degrees: f32) -> f32 {
        self.ray_cast(origin, angle_degrees, RAY_MAX_DISTANCE, RAY_STEP)
    }
}
