#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Boards: a named map area together with its background grid and zones.
//!
//! A [`Board`] is the unit that is saved and shared. It persists three ways:
//! as a versioned TOML board file, as sectioned attribute text mirroring the
//! per-component schemas, and as a single-line share string suitable for
//! pasting into chat.

use mapgrid_core::{IVec2, Point};
use mapgrid_system_adc2_layout::{BoardLayout, LayoutError};
use mapgrid_system_zones::{ZoneError, ZonedGrid};

mod export;
mod file;
mod share;

pub use export::ExportError;
pub use file::{BoardFileError, FORMAT_VERSION};
pub use share::{ShareStringError, SHARE_HEADER};

/// Errors raised while assembling a board.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum BoardError {
    /// Boards must cover a positive area.
    #[error("board size must be positive (received {width}x{height})")]
    InvalidSize {
        /// Rejected width.
        width: i32,
        /// Rejected height.
        height: i32,
    },
    /// Zones could not be registered.
    #[error(transparent)]
    Zone(#[from] ZoneError),
    /// An ADC2 layout could not be converted.
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Named map area with its grid and zones.
#[derive(Clone, Debug, PartialEq)]
pub struct Board {
    name: String,
    size: IVec2,
    grid: ZonedGrid,
}

impl Board {
    /// Creates an empty board of `size` pixels.
    pub fn new(name: impl Into<String>, size: IVec2) -> Result<Self, BoardError> {
        if size.x <= 0 || size.y <= 0 {
            return Err(BoardError::InvalidSize {
                width: size.x,
                height: size.y,
            });
        }
        Ok(Self {
            name: name.into(),
            size,
            grid: ZonedGrid::default(),
        })
    }

    /// Builds a board from an ADC2 layout, one zone per map sheet.
    pub fn from_layout(name: impl Into<String>, layout: &BoardLayout) -> Result<Self, BoardError> {
        let mut board = Self::new(name, layout.layout.board_size())?;
        board.grid = layout.zoned_grid()?;
        Ok(board)
    }

    /// Board name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Board size in pixels.
    #[must_use]
    pub fn size(&self) -> IVec2 {
        self.size
    }

    /// Background grid and zones.
    #[must_use]
    pub fn grid(&self) -> &ZonedGrid {
        &self.grid
    }

    /// Mutable access to the background grid and zones.
    pub fn grid_mut(&mut self) -> &mut ZonedGrid {
        &mut self.grid
    }

    /// Whether `point` lies on the board image.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.cmpge(IVec2::ZERO).all() && point.cmplt(self.size).all()
    }
}
