#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Grid geometry: mapping between pixel space and cell addressing.
//!
//! A grid answers four kinds of question about a board: which cell covers a
//! pixel, where the nearest legal location to a pixel lies, how many cells
//! apart two pixels are, and which area lies within a number of cells of a
//! point. [`SquareGrid`] and [`HexGrid`] implement [`GeometricGrid`];
//! [`BoardGrid`] is the closed set of grids a board may carry.

use std::{fmt, str::FromStr};

use mapgrid_core::{
    attributes::{AttributeError, AttributeMap, Configurable, UnknownChoice},
    Axis, CellIndex, GridError, Point, Region, Revision, Rgb, Shape,
};
use serde::{Deserialize, Serialize};

mod cache;
mod hex;
mod square;

pub use hex::{HexGrid, HexGridConfig};
pub use square::{SquareGrid, SquareGridConfig};

/// Geometry queries shared by every grid kind.
pub trait GeometricGrid {
    /// Nearest legal location to `point`.
    fn snap_to(&self, point: Point) -> Point;

    /// Distance between two points in whole cells.
    fn range(&self, from: Point, to: Point) -> u32;

    /// Union of the cells within `range` of `center`.
    fn shape_within_range(&self, center: Point, range: u32) -> Region;

    /// Cell covering `point`.
    fn cell_at(&self, point: Point) -> CellIndex;

    /// Pixel centre of `cell`.
    fn cell_center(&self, cell: CellIndex) -> Point;

    /// Outline of `cell`.
    fn cell_shape(&self, cell: CellIndex) -> Shape;

    /// Axis whose labels shift by one on `cell` when numbering is staggered.
    ///
    /// Only grids that offset alternate lines by half a cell return an axis,
    /// and only for cells on the offset lines.
    fn stagger_axis(&self, _cell: CellIndex) -> Option<Axis> {
        None
    }
}

/// How square grids count the distance between cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangePolicy {
    /// Largest per-axis cell delta; diagonal steps count as one.
    #[default]
    Metric,
    /// Sum of the per-axis cell deltas.
    Manhattan,
}

impl RangePolicy {
    /// Attribute strings accepted for the policy.
    pub const NAMES: &'static [&'static str] = &["Metric", "Manhattan"];
}

impl fmt::Display for RangePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Metric => "Metric",
            Self::Manhattan => "Manhattan",
        })
    }
}

impl FromStr for RangePolicy {
    type Err = UnknownChoice;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Metric" => Ok(Self::Metric),
            "Manhattan" => Ok(Self::Manhattan),
            _ => Err(UnknownChoice::new(value, Self::NAMES)),
        }
    }
}

/// Errors raised while rebuilding a grid from attributes.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum GridConfigError {
    /// The attributes did not match the grid schema.
    #[error(transparent)]
    Attribute(#[from] AttributeError),
    /// The attributes decoded but describe an invalid grid.
    #[error(transparent)]
    Grid(#[from] GridError),
    /// The grid kind is not one of `square` or `hex`.
    #[error("unknown grid kind `{0}`")]
    UnknownKind(String),
}

/// Grid attached to a board or zone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BoardGrid {
    /// Rectangular cells.
    Square(SquareGrid),
    /// Hexagonal cells.
    Hex(HexGrid),
}

impl BoardGrid {
    /// Name used for the grid kind in board files and attribute exports.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Square(_) => "square",
            Self::Hex(_) => "hex",
        }
    }

    /// Whether grid lines are drawn.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        match self {
            Self::Square(grid) => grid.config().visible,
            Self::Hex(grid) => grid.config().visible,
        }
    }

    /// Whether centre dots are drawn.
    #[must_use]
    pub fn dots_visible(&self) -> bool {
        match self {
            Self::Square(grid) => grid.config().dots_visible,
            Self::Hex(grid) => grid.config().dots_visible,
        }
    }

    /// Colour of grid lines and dots.
    #[must_use]
    pub fn color(&self) -> Rgb {
        match self {
            Self::Square(grid) => grid.config().color,
            Self::Hex(grid) => grid.config().color,
        }
    }

    /// Configuration revision of the underlying grid.
    #[must_use]
    pub fn revision(&self) -> Revision {
        match self {
            Self::Square(grid) => grid.revision(),
            Self::Hex(grid) => grid.revision(),
        }
    }

    /// Flattens the grid configuration into attributes.
    #[must_use]
    pub fn to_attributes(&self) -> AttributeMap {
        match self {
            Self::Square(grid) => grid.config().to_attributes(),
            Self::Hex(grid) => grid.config().to_attributes(),
        }
    }

    /// Rebuilds a grid of the named kind from attributes.
    pub fn from_attributes(kind: &str, map: &AttributeMap) -> Result<Self, GridConfigError> {
        match kind {
            "square" => Ok(Self::Square(SquareGrid::new(
                SquareGridConfig::from_attributes(map)?,
            )?)),
            "hex" => Ok(Self::Hex(HexGrid::new(HexGridConfig::from_attributes(
                map,
            )?)?)),
            other => Err(GridConfigError::UnknownKind(other.to_owned())),
        }
    }

    fn geometry(&self) -> &dyn GeometricGrid {
        match self {
            Self::Square(grid) => grid,
            Self::Hex(grid) => grid,
        }
    }
}

impl From<SquareGrid> for BoardGrid {
    fn from(grid: SquareGrid) -> Self {
        Self::Square(grid)
    }
}

impl From<HexGrid> for BoardGrid {
    fn from(grid: HexGrid) -> Self {
        Self::Hex(grid)
    }
}

impl GeometricGrid for BoardGrid {
    fn snap_to(&self, point: Point) -> Point {
        self.geometry().snap_to(point)
    }

    fn range(&self, from: Point, to: Point) -> u32 {
        self.geometry().range(from, to)
    }

    fn shape_within_range(&self, center: Point, range: u32) -> Region {
        self.geometry().shape_within_range(center, range)
    }

    fn cell_at(&self, point: Point) -> CellIndex {
        self.geometry().cell_at(point)
    }

    fn cell_center(&self, cell: CellIndex) -> Point {
        self.geometry().cell_center(cell)
    }

    fn cell_shape(&self, cell: CellIndex) -> Shape {
        self.geometry().cell_shape(cell)
    }

    fn stagger_axis(&self, cell: CellIndex) -> Option<Axis> {
        self.geometry().stagger_axis(cell)
    }
}

fn validate_dimension(name: &'static str, value: f64) -> Result<(), GridError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(GridError::InvalidDimension { name, value })
    }
}
