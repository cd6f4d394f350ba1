#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the mapgrid workspace.
//!
//! This crate defines the vocabulary every other crate speaks: pixel points
//! (re-exported from `glam`), signed [`CellIndex`] values addressing grid
//! cells, integer [`Polygon`] boundaries, floating point [`Shape`] and
//! [`Region`] outlines, the [`Revision`] counter used to stamp caches, the
//! attribute boundary used for persistence, and the error and bad-data
//! reporting taxonomy.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub mod attributes;
mod geometry;
mod report;

pub use geometry::{PathError, Polygon, Rect, Region, Shape};
pub use glam::{DVec2, IVec2};
pub use report::{BadDataLog, BadDataReport};

/// Pixel location on a board, measured from the board's upper-left corner.
pub type Point = IVec2;

/// Errors raised by grid and numbering queries.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum GridError {
    /// A location name could not be resolved under the current numbering
    /// scheme, or no numbering scheme is attached.
    #[error("bad coordinate `{0}`")]
    BadCoordinate(String),
    /// A grid dimension was zero, negative or not finite.
    #[error("{name} must be a positive finite number (received {value})")]
    InvalidDimension {
        /// Name of the rejected dimension.
        name: &'static str,
        /// Value that failed validation.
        value: f64,
    },
}

/// Location of a single grid cell expressed as signed column and row indices.
///
/// Cell `(0, 0)` is the cell centred on the grid origin; indices grow to the
/// right and downwards and may be negative.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CellIndex {
    column: i32,
    row: i32,
}

impl CellIndex {
    /// Creates a new cell index.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Column index of the cell.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Row index of the cell.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Index value along the requested axis.
    #[must_use]
    pub const fn along(&self, axis: Axis) -> i32 {
        match axis {
            Axis::Column => self.column,
            Axis::Row => self.row,
        }
    }

    /// Returns a copy of the index with the value along `axis` replaced.
    #[must_use]
    pub const fn with(self, axis: Axis, value: i32) -> Self {
        match axis {
            Axis::Column => Self::new(value, self.row),
            Axis::Row => Self::new(self.column, value),
        }
    }

    /// Computes the Manhattan distance between two cell indices.
    #[must_use]
    pub fn manhattan_distance(self, other: CellIndex) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }
}

impl fmt::Display for CellIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// One of the two addressing axes of a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Horizontal addressing axis.
    Column,
    /// Vertical addressing axis.
    Row,
}

impl Axis {
    /// The other axis.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Column => Self::Row,
            Self::Row => Self::Column,
        }
    }
}

/// Monotonic configuration version used to stamp derived caches.
///
/// Every mutation of a configuration bumps its revision. Cache entries store
/// the revision they were computed under and are recomputed once stale.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Revision(u64);

impl Revision {
    /// Revision assigned to freshly constructed configurations.
    #[must_use]
    pub const fn initial() -> Self {
        Self(0)
    }

    /// Advances the revision after a mutation.
    pub fn bump(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }

    /// Numeric value of the revision.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Opaque RGB colour as persisted in board definitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    red: u8,
    green: u8,
    blue: u8,
}

impl Rgb {
    /// Pure black, the fallback colour for grid lines.
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// Pure white.
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// Creates a colour from byte RGB components.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the colour.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the colour.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the colour.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.red, self.green, self.blue)
    }
}

/// Error returned when a colour string is not of the form `r,g,b`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("colour `{0}` is not of the form r,g,b")]
pub struct ParseRgbError(String);

impl FromStr for Rgb {
    type Err = ParseRgbError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut channels = value.split(',').map(|part| part.trim().parse::<u8>());
        let mut next = || {
            channels
                .next()
                .and_then(Result::ok)
                .ok_or_else(|| ParseRgbError(value.to_owned()))
        };
        let red = next()?;
        let green = next()?;
        let blue = next()?;
        if channels.next().is_some() {
            return Err(ParseRgbError(value.to_owned()));
        }
        Ok(Self::new(red, green, blue))
    }
}

impl TryFrom<String> for Rgb {
    type Error = ParseRgbError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

/// Rounds to the nearest integer with ties away from zero and saturates into `i32`.
#[must_use]
pub fn round_to_i32(value: f64) -> i32 {
    value.round() as i32
}
