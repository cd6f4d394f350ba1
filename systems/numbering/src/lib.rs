#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Human-readable cell labels layered over a grid.

use mapgrid_core::{CellIndex, GridError, Point, Region};
use mapgrid_system_geometry::{BoardGrid, GeometricGrid};
use serde::{Deserialize, Serialize};

mod label;
mod regular;

pub use regular::{AxisNumbering, AxisOrder, AxisType, RegularGridNumbering};

/// Grid together with its optional numbering scheme.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NumberedGrid {
    /// Cell geometry.
    #[serde(flatten)]
    pub grid: BoardGrid,
    /// Labelling scheme; locations cannot be named without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numbering: Option<RegularGridNumbering>,
}

impl NumberedGrid {
    /// Pairs a grid with a numbering scheme.
    #[must_use]
    pub fn new(grid: impl Into<BoardGrid>, numbering: Option<RegularGridNumbering>) -> Self {
        Self {
            grid: grid.into(),
            numbering,
        }
    }

    /// Nearest legal location to `point`.
    #[must_use]
    pub fn snap_to(&self, point: Point) -> Point {
        self.grid.snap_to(point)
    }

    /// Distance between two points in whole cells.
    #[must_use]
    pub fn range(&self, from: Point, to: Point) -> u32 {
        self.grid.range(from, to)
    }

    /// Union of the cells within `range` of `center`.
    #[must_use]
    pub fn shape_within_range(&self, center: Point, range: u32) -> Region {
        self.grid.shape_within_range(center, range)
    }

    /// Label of `cell`, when numbering is attached.
    #[must_use]
    pub fn label(&self, cell: CellIndex) -> Option<String> {
        self.numbering
            .as_ref()
            .map(|numbering| numbering.label(&self.grid, cell))
    }

    /// Label of the cell covering `point`, when numbering is attached.
    #[must_use]
    pub fn location_name(&self, point: Point) -> Option<String> {
        self.label(self.grid.cell_at(point))
    }

    /// Pixel centre of the cell named `name`.
    pub fn location(&self, name: &str) -> Result<Point, GridError> {
        match &self.numbering {
            Some(numbering) => numbering.location(&self.grid, name),
            None => Err(GridError::BadCoordinate(name.to_owned())),
        }
    }
}
